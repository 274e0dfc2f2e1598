//! Event source for LIGO Light Weight XML documents built on quick-xml.
//!
//! The reader resolves namespaces, unescapes text and attribute values and
//! pushes start/text/end callbacks into a [`ContentHandler`]. Declarations,
//! DOCTYPE, comments and processing instructions are not forwarded.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use thiserror::Error;
use tracing::trace;

/// URL of the LIGO_LW DTD, used as the namespace of un-namespaced elements.
pub const NAMESPACE: &str = "http://ldas-sw.ligo.caltech.edu/doc/ligolwAPI/html/ligolw_dtd.txt";

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("xml: {0}")]
    Xml(String),
    #[error("invalid utf-8 in {0}")]
    Utf8(&'static str),
    #[error("unbound namespace prefix: {0}")]
    UnknownPrefix(String),
    #[error("document ended with {0} element(s) still open")]
    UnexpectedEof(usize),
    #[error("junk after document element: <{0}>")]
    TrailingElement(String),
}

/// Namespace-qualified element name as delivered to a [`ContentHandler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QName<'a> {
    /// Resolved namespace URI, `None` for un-namespaced elements.
    pub namespace: Option<&'a str>,
    /// Local part of the tag name.
    pub local_name: &'a str,
}

impl<'a> QName<'a> {
    /// Un-namespaced name.
    pub const fn local(local_name: &'a str) -> Self {
        Self {
            namespace: None,
            local_name,
        }
    }
}

/// Attributes of a start tag, in document order, keyed by qualified name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes(Vec<(String, String)>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of the attribute called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set `name` to `value`, replacing an earlier value in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(key, _)| *key == name) {
            Some(slot) => slot.1 = value,
            None => self.0.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attributes::new();
        for (key, value) in iter {
            attrs.insert(key, value);
        }
        attrs
    }
}

impl IntoIterator for Attributes {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Receiver of document events.
///
/// Events arrive in document order; every `start_element` is matched by one
/// `end_element`. Text is already unescaped and may be split across calls.
pub trait ContentHandler {
    type Error: From<XmlError>;

    fn start_element(&mut self, name: QName<'_>, attrs: Attributes) -> Result<(), Self::Error>;

    fn end_element(&mut self, name: QName<'_>) -> Result<(), Self::Error>;

    fn characters(&mut self, content: &str) -> Result<(), Self::Error>;
}

/// Parse a document held in memory.
pub fn parse_str<H: ContentHandler>(xml: &str, handler: &mut H) -> Result<(), H::Error> {
    parse_reader(xml.as_bytes(), handler)
}

/// Parse a document from any buffered source, driving `handler`.
pub fn parse_reader<R: BufRead, H: ContentHandler>(
    source: R,
    handler: &mut H,
) -> Result<(), H::Error> {
    let mut reader = NsReader::from_reader(source);
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut seen_root = false;

    loop {
        let (resolved, event) = reader
            .read_resolved_event_into(&mut buf)
            .map_err(|err| XmlError::Xml(err.to_string()))?;
        let namespace = resolve_namespace(resolved)?;
        match event {
            Event::Start(e) => {
                let local = local_name(&e)?;
                check_root(&mut seen_root, depth, &local)?;
                let attrs = read_attributes(&e)?;
                trace!(name = %local, depth, "start element");
                handler.start_element(qname(&namespace, &local), attrs)?;
                depth += 1;
            }
            Event::Empty(e) => {
                let local = local_name(&e)?;
                check_root(&mut seen_root, depth, &local)?;
                let attrs = read_attributes(&e)?;
                trace!(name = %local, depth, "empty element");
                handler.start_element(qname(&namespace, &local), attrs)?;
                handler.end_element(qname(&namespace, &local))?;
            }
            Event::End(e) => {
                let local = std::str::from_utf8(e.local_name().as_ref())
                    .map_err(|_| XmlError::Utf8("end tag"))?
                    .to_string();
                depth = depth.saturating_sub(1);
                trace!(name = %local, depth, "end element");
                handler.end_element(qname(&namespace, &local))?;
            }
            Event::Text(e) if depth > 0 => {
                let text = e
                    .unescape()
                    .map_err(|err| XmlError::Xml(err.to_string()))?;
                handler.characters(&text)?;
            }
            Event::CData(e) if depth > 0 => {
                let bytes = e.into_inner();
                let text = std::str::from_utf8(&bytes).map_err(|_| XmlError::Utf8("CDATA"))?;
                handler.characters(text)?;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if depth > 0 {
        return Err(XmlError::UnexpectedEof(depth).into());
    }
    Ok(())
}

/// A well-formed document has exactly one top-level element.
fn check_root(seen_root: &mut bool, depth: usize, local: &str) -> Result<(), XmlError> {
    if depth == 0 {
        if *seen_root {
            return Err(XmlError::TrailingElement(local.to_string()));
        }
        *seen_root = true;
    }
    Ok(())
}

fn qname<'a>(namespace: &'a Option<String>, local_name: &'a str) -> QName<'a> {
    QName {
        namespace: namespace.as_deref(),
        local_name,
    }
}

fn resolve_namespace(resolved: ResolveResult<'_>) -> Result<Option<String>, XmlError> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.as_ref()).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(XmlError::UnknownPrefix(
            String::from_utf8_lossy(&prefix).into_owned(),
        )),
    }
}

fn local_name(event: &BytesStart<'_>) -> Result<String, XmlError> {
    std::str::from_utf8(event.local_name().as_ref())
        .map(str::to_string)
        .map_err(|_| XmlError::Utf8("start tag"))
}

fn read_attributes(event: &BytesStart<'_>) -> Result<Attributes, XmlError> {
    let mut attrs = Attributes::new();
    for attr in event.attributes() {
        let attr = attr.map_err(|err| XmlError::Xml(err.to_string()))?;
        let key = std::str::from_utf8(attr.key.as_ref()).map_err(|_| XmlError::Utf8("attribute name"))?;
        if key == "xmlns" || key.starts_with("xmlns:") {
            continue;
        }
        let value = attr
            .unescape_value()
            .map_err(|err| XmlError::Xml(err.to_string()))?;
        attrs.insert(key, value.into_owned());
    }
    Ok(attrs)
}
