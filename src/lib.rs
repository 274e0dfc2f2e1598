#![cfg_attr(docsrs, feature(doc_cfg))]
//! LIGO Light Weight XML facade re-exporting the workspace crates with a few
//! loading and writing shortcuts.
//!
//! ```rust
//! use ligolw::{load_str, write_string, ElementKind};
//!
//! let doc = load_str(r#"<LIGO_LW><Param Name="f" Type="real_8">60</Param></LIGO_LW>"#)?;
//! let params = doc.get_elements_by_tag_name(doc.root(), ElementKind::Param.tag_name());
//! assert_eq!(doc.text(params[0]), Some("60"));
//! assert!(write_string(&doc)?.ends_with("\t<Param Name=\"f\" Type=\"real_8\">\n60\n\t</Param>\n</LIGO_LW>\n"));
//! # Ok::<(), ligolw::LigoLwError>(())
//! ```

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tracing::info;

pub use ligolw_core as dom;
pub use ligolw_types as types;
pub use ligolw_xml as xml;

pub use ligolw_core::{
    attributes, ContentHandler, Document, Element, ElementKind, LigoLwError, NodeId, WriteOptions,
};

/// Parse a document held in memory.
pub fn load_str(xml: &str) -> Result<Document, LigoLwError> {
    xml.parse()
}

/// Parse a document from disk.
pub fn load_file(path: impl AsRef<Path>) -> Result<Document, LigoLwError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let document = Document::load(BufReader::new(file))?;
    info!(path = %path.display(), "loaded document");
    Ok(document)
}

/// Drive any content handler, such as a builder with custom start
/// handlers, over a document held in memory.
pub fn load_str_with<H>(xml: &str, handler: &mut H) -> Result<(), H::Error>
where
    H: ContentHandler,
{
    ligolw_xml::parse_str(xml, handler)
}

/// Serialize with the default options.
pub fn write_string(document: &Document) -> Result<String, LigoLwError> {
    document.to_xml_string(&WriteOptions::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ligolw_core::LigoLwContentHandler;

    #[test]
    fn load_file_reports_missing_files() {
        let err = load_file("/nonexistent/ligolw.xml").unwrap_err();
        assert!(matches!(err, LigoLwError::Io(_)));
    }

    #[test]
    fn load_file_reads_from_disk() {
        let path = std::env::temp_dir().join(format!("ligolw-facade-{}.xml", std::process::id()));
        std::fs::write(&path, "<LIGO_LW><Comment>on disk</Comment></LIGO_LW>").unwrap();
        let doc = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();
        let comments = doc.get_elements_by_tag_name(doc.root(), "Comment");
        assert_eq!(doc.text(comments[0]), Some("on disk"));
    }

    #[test]
    fn custom_handlers_run_through_load_str_with() {
        let mut doc = Document::new();
        let mut comments = 0;
        {
            let mut handler = LigoLwContentHandler::new(&mut doc).with_start_handler(
                "Comment",
                |doc: &mut Document, _parent: NodeId, attrs| {
                    comments += 1;
                    doc.create_element(ElementKind::Comment, attrs)
                },
            );
            load_str_with("<LIGO_LW><Comment>a</Comment><Comment/></LIGO_LW>", &mut handler)
                .unwrap();
        }
        assert_eq!(comments, 2);
        let ligo_lw = doc.children(doc.root()).next().unwrap();
        assert_eq!(doc.children(ligo_lw).count(), 2);
    }

    #[test]
    fn write_string_round_trips() {
        let doc = load_str("<LIGO_LW><Time Type=\"GPS\">0</Time></LIGO_LW>").unwrap();
        let text = write_string(&doc).unwrap();
        assert_eq!(load_str(&text).unwrap().to_xml_string(&WriteOptions::default()).unwrap(), text);
    }
}
