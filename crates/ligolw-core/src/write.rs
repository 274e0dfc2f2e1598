//! Serialization of a [`Document`] to LIGO Light Weight text.

use std::io::{self, Write};

use indextree::NodeId;
use quick_xml::escape::{escape, partial_escape};
use tracing::debug;

use crate::document::Document;
use crate::element::{Element, ElementKind};
use crate::LigoLwError;

/// XML declaration and DOCTYPE written at the top of every document.
pub const HEADER: &str = "<?xml version='1.0' encoding='utf-8'?>\n<!DOCTYPE LIGO_LW SYSTEM \"http://ldas-sw.ligo.caltech.edu/doc/ligolwAPI/html/ligolw_dtd.txt\">";

/// Conventional indentation unit.
pub const INDENT: &str = "\t";

/// Serializer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOptions {
    /// Added once per nesting level.
    pub indent: String,
    /// Stylesheet referenced by an `xml-stylesheet` instruction.
    pub xsl: Option<String>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            indent: INDENT.to_string(),
            xsl: None,
        }
    }
}

impl WriteOptions {
    pub fn with_indent(mut self, indent: impl Into<String>) -> Self {
        self.indent = indent.into();
        self
    }

    pub fn with_xsl(mut self, xsl: impl Into<String>) -> Self {
        self.xsl = Some(xsl.into());
        self
    }
}

fn start_tag(element: &Element) -> String {
    let mut tag = format!("<{}", element.tag_name());
    for (name, value) in element.attributes().iter() {
        tag.push_str(&format!(" {name}=\"{}\"", escape(value)));
    }
    tag
}

impl Document {
    /// Write the header, the optional stylesheet reference and the tree.
    pub fn write<W: Write>(&self, sink: &mut W, options: &WriteOptions) -> Result<(), LigoLwError> {
        writeln!(sink, "{HEADER}")?;
        if let Some(xsl) = &options.xsl {
            writeln!(
                sink,
                "<?xml-stylesheet type=\"text/xsl\" href=\"{}\" ?>",
                escape(xsl.as_str())
            )?;
        }
        self.write_node(self.root, sink, options)?;
        debug!("document written");
        Ok(())
    }

    /// Write one subtree, without header, at nesting level zero. Writing the
    /// root writes its children.
    pub fn write_node<W: Write>(
        &self,
        id: NodeId,
        sink: &mut W,
        options: &WriteOptions,
    ) -> Result<(), LigoLwError> {
        let element = self.element(id).ok_or(LigoLwError::UnknownNode)?;
        if element.kind() == ElementKind::Document {
            self.write_children(id, element, sink, options, 0)
        } else {
            self.write_element(id, sink, options, 0)
        }
    }

    /// Serialize the whole document into a string.
    pub fn to_xml_string(&self, options: &WriteOptions) -> Result<String, LigoLwError> {
        let mut buf = Vec::new();
        self.write(&mut buf, options)?;
        String::from_utf8(buf)
            .map_err(|err| LigoLwError::Io(io::Error::new(io::ErrorKind::InvalidData, err)))
    }

    fn write_children<W: Write>(
        &self,
        id: NodeId,
        element: &Element,
        sink: &mut W,
        options: &WriteOptions,
        level: usize,
    ) -> Result<(), LigoLwError> {
        self.check_children(id, element)?;
        for child in self.children(id) {
            self.write_element(child, sink, options, level)?;
        }
        Ok(())
    }

    fn check_children(&self, id: NodeId, element: &Element) -> Result<(), LigoLwError> {
        for child in self.children(id) {
            let kind = self.kind(child).ok_or(LigoLwError::UnknownNode)?;
            if !element.kind().allows_child(kind) {
                return Err(LigoLwError::InvalidChild {
                    parent: element.tag_name(),
                    child: kind.tag_name(),
                });
            }
        }
        Ok(())
    }

    fn write_element<W: Write>(
        &self,
        id: NodeId,
        sink: &mut W,
        options: &WriteOptions,
        level: usize,
    ) -> Result<(), LigoLwError> {
        let element = self.element(id).ok_or(LigoLwError::UnknownNode)?;
        let pad = options.indent.repeat(level);
        let text = element.text().filter(|text| !text.is_empty());
        match element.kind() {
            ElementKind::Column => {
                self.check_children(id, element)?;
                writeln!(sink, "{pad}{}/>", start_tag(element))?;
            }
            ElementKind::Comment | ElementKind::Dim | ElementKind::Time => {
                self.check_children(id, element)?;
                write!(sink, "{pad}{}>", start_tag(element))?;
                if let Some(text) = text {
                    write!(sink, "{}", partial_escape(text))?;
                }
                writeln!(sink, "</{}>", element.tag_name())?;
            }
            _ => {
                writeln!(sink, "{pad}{}>", start_tag(element))?;
                self.write_children(id, element, sink, options, level + 1)?;
                if let Some(text) = text {
                    writeln!(sink, "{}", partial_escape(text))?;
                }
                writeln!(sink, "{pad}</{}>", element.tag_name())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementKind::{Array, Column, Comment, Dim, LigoLw, Param, Stream, Table, Time};

    const EXPECTED: &str = "<?xml version='1.0' encoding='utf-8'?>
<!DOCTYPE LIGO_LW SYSTEM \"http://ldas-sw.ligo.caltech.edu/doc/ligolwAPI/html/ligolw_dtd.txt\">
<LIGO_LW>
\t<Table Name=\"process:table\">
\t\t<Comment>a &amp; b</Comment>
\t\t<Column Name=\"process:program\" Type=\"lstring\"/>
\t\t<Column Name=\"process:process_id\" Type=\"int_8s\"/>
\t\t<Stream Name=\"process:table\" Type=\"Local\" Delimiter=\",\">
\"inspiral\",0,
\"coinc\",1
\t\t</Stream>
\t</Table>
\t<Time Name=\"start\" Type=\"GPS\">1000000000</Time>
\t<Param Name=\"ifos\" Type=\"lstring\">
H1&lt;L1
\t</Param>
</LIGO_LW>
";

    fn add(doc: &mut Document, parent: NodeId, kind: ElementKind, attrs: &[(&str, &str)]) -> NodeId {
        let id = doc
            .create_element(kind, attrs.iter().copied())
            .expect("element");
        doc.append_child(parent, id).expect("child");
        id
    }

    fn sample() -> Document {
        let mut doc = Document::new();
        let root = doc.root();
        let ligo_lw = add(&mut doc, root, LigoLw, &[]);
        let table = add(&mut doc, ligo_lw, Table, &[("Name", "process:table")]);
        let comment = add(&mut doc, table, Comment, &[]);
        doc.append_data(comment, "a & b").unwrap();
        add(&mut doc, table, Column, &[("Name", "process:program"), ("Type", "lstring")]);
        add(&mut doc, table, Column, &[("Name", "process:process_id"), ("Type", "int_8s")]);
        let stream = add(
            &mut doc,
            table,
            Stream,
            &[("Name", "process:table"), ("Type", "Local"), ("Delimiter", ",")],
        );
        doc.append_data(stream, "\"inspiral\",0,\n\"coinc\",1").unwrap();
        let time = add(&mut doc, ligo_lw, Time, &[("Name", "start"), ("Type", "GPS")]);
        doc.append_data(time, "1000000000").unwrap();
        let param = add(&mut doc, ligo_lw, Param, &[("Name", "ifos"), ("Type", "lstring")]);
        doc.append_data(param, "H1<L1").unwrap();
        doc
    }

    #[test]
    fn writes_the_conventional_layout() {
        let text = sample().to_xml_string(&WriteOptions::default()).unwrap();
        assert_eq!(text, EXPECTED);
    }

    #[test]
    fn stylesheet_follows_the_header() {
        let options = WriteOptions::default().with_xsl("ligolw.xsl");
        let text = sample().to_xml_string(&options).unwrap();
        let lines: Vec<_> = text.lines().take(4).collect();
        assert_eq!(lines[2], "<?xml-stylesheet type=\"text/xsl\" href=\"ligolw.xsl\" ?>");
        assert_eq!(lines[3], "<LIGO_LW>");
    }

    #[test]
    fn stylesheet_href_is_escaped() {
        let options = WriteOptions::default().with_xsl("a\"b&c.xsl");
        let text = sample().to_xml_string(&options).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(
            lines[2],
            "<?xml-stylesheet type=\"text/xsl\" href=\"a&quot;b&amp;c.xsl\" ?>"
        );
    }

    #[test]
    fn indentation_unit_is_configurable() {
        let options = WriteOptions::default().with_indent("  ");
        let text = sample().to_xml_string(&options).unwrap();
        assert!(text.contains("\n    <Column Name=\"process:program\" Type=\"lstring\"/>\n"));
        assert!(text.contains("\n  </Table>\n"));
    }

    #[test]
    fn empty_inline_elements_keep_both_tags() {
        let mut doc = Document::new();
        let root = doc.root();
        let ligo_lw = add(&mut doc, root, LigoLw, &[]);
        let array = add(&mut doc, ligo_lw, Array, &[("Name", "x"), ("Type", "real_8")]);
        add(&mut doc, array, Dim, &[("Name", "t")]);
        add(&mut doc, ligo_lw, Comment, &[]);
        let mut out = Vec::new();
        doc.write_node(ligo_lw, &mut out, &WriteOptions::default()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "<LIGO_LW>\n\t<Array Name=\"x\" Type=\"real_8\">\n\t\t<Dim Name=\"t\"></Dim>\n\t</Array>\n\t<Comment></Comment>\n</LIGO_LW>\n"
        );
    }

    #[test]
    fn attribute_values_are_escaped() {
        let mut doc = Document::new();
        let root = doc.root();
        add(&mut doc, root, LigoLw, &[("Name", "say \"hi\" & <go>")]);
        let text = doc.to_xml_string(&WriteOptions::default()).unwrap();
        assert!(text.contains("<LIGO_LW Name=\"say &quot;hi&quot; &amp; &lt;go&gt;\">"));
    }

    #[test]
    fn children_are_validated_for_every_kind() {
        let mut doc = Document::new();
        let root = doc.root();
        let ligo_lw = add(&mut doc, root, LigoLw, &[]);
        add(&mut doc, ligo_lw, Column, &[("Name", "stray")]);
        let err = doc.to_xml_string(&WriteOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            LigoLwError::InvalidChild {
                parent: "LIGO_LW",
                child: "Column"
            }
        ));

        let mut doc = Document::new();
        let root = doc.root();
        add(&mut doc, root, Table, &[]);
        assert!(matches!(
            doc.to_xml_string(&WriteOptions::default()),
            Err(LigoLwError::InvalidChild {
                parent: "Document",
                ..
            })
        ));
    }
}
