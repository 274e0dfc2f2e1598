//! Element kinds of the LIGO Light Weight format and their grammar.

use core::fmt;

use ligolw_types::TIME_TYPES;
use ligolw_xml::Attributes;

use crate::attributes::{stream, time};
use crate::LigoLwError;

/// Values accepted by the `Type` attribute of `Stream` elements.
pub const STREAM_TYPES: [&str; 2] = ["Remote", "Local"];

/// The closed set of element kinds, one per tag name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// Document root; never produced by a start tag.
    Document,
    /// `LIGO_LW` grouping container.
    LigoLw,
    Comment,
    /// Scalar parameter.
    Param,
    Table,
    Column,
    Array,
    /// Array dimension.
    Dim,
    Stream,
    IgwdFrame,
    Detector,
    AdcData,
    AdcInterval,
    Time,
}

use ElementKind::*;

impl ElementKind {
    /// Every kind that a start tag can resolve to.
    pub const TAGGED: [ElementKind; 13] = [
        LigoLw,
        Comment,
        Param,
        Table,
        Column,
        Array,
        Dim,
        Stream,
        IgwdFrame,
        Detector,
        AdcData,
        AdcInterval,
        Time,
    ];

    pub const fn tag_name(self) -> &'static str {
        match self {
            Document => "Document",
            LigoLw => "LIGO_LW",
            Comment => "Comment",
            Param => "Param",
            Table => "Table",
            Column => "Column",
            Array => "Array",
            Dim => "Dim",
            Stream => "Stream",
            IgwdFrame => "IGWDFrame",
            Detector => "Detector",
            AdcData => "AdcData",
            AdcInterval => "AdcInterval",
            Time => "Time",
        }
    }

    /// Resolve a tag name (case sensitive) to its kind.
    pub fn from_tag_name(name: &str) -> Option<Self> {
        Self::TAGGED.into_iter().find(|kind| kind.tag_name() == name)
    }

    pub const fn valid_attributes(self) -> &'static [&'static str] {
        match self {
            Document | Comment => &[],
            LigoLw | Table => &["Name", "Type"],
            Param => &["DataUnit", "Name", "Scale", "Start", "Type", "Unit"],
            Column | Array => &["Name", "Type", "Unit"],
            Dim => &["Name", "Scale", "Start", "Unit"],
            Stream => &["Content", "Delimiter", "Encoding", "Name", "Type"],
            IgwdFrame | Detector | AdcData => &["Name"],
            AdcInterval => &["DeltaT", "Name", "StartTime"],
            Time => &["Name", "Type"],
        }
    }

    pub const fn valid_children(self) -> &'static [ElementKind] {
        match self {
            Document => &[LigoLw],
            LigoLw => &[
                LigoLw,
                Comment,
                Param,
                Table,
                Array,
                Stream,
                IgwdFrame,
                AdcData,
                AdcInterval,
                Time,
                Detector,
            ],
            Param => &[Comment],
            Table => &[Comment, Column, Stream],
            Array => &[Dim, Stream],
            IgwdFrame => &[
                Comment, Param, Time, Detector, AdcData, LigoLw, Stream, Array, IgwdFrame,
            ],
            Detector => &[Comment, Param, LigoLw],
            AdcData => &[AdcData, Comment, Param, Time, LigoLw, Array],
            AdcInterval => &[AdcData, Comment, Time],
            Comment | Column | Dim | Stream | Time => &[],
        }
    }

    /// Whether character data inside this element is kept.
    pub const fn accepts_text(self) -> bool {
        matches!(self, Comment | Dim | Param | Stream | Time)
    }

    pub fn allows_attribute(self, name: &str) -> bool {
        self.valid_attributes().contains(&name)
    }

    pub fn allows_child(self, child: ElementKind) -> bool {
        self.valid_children().contains(&child)
    }

    /// Check the order/arity rules of a (prospective) child list.
    ///
    /// `Table`, `Array` and the document root constrain their children at
    /// mutation time; every other kind is checked when written.
    pub(crate) fn verify_children(self, children: &[ElementKind]) -> Result<(), LigoLwError> {
        match self {
            Table => verify_table(children),
            Array => verify_array(children),
            Document if children.len() > 1 => {
                Err(order_error(Document, "only one LIGO_LW allowed"))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name())
    }
}

fn order_error(parent: ElementKind, reason: &'static str) -> LigoLwError {
    LigoLwError::ChildOrder {
        parent: parent.tag_name(),
        reason,
    }
}

fn verify_table(children: &[ElementKind]) -> Result<(), LigoLwError> {
    let mut ncomment = 0;
    let mut ncolumn = 0;
    let mut nstream = 0;
    for &child in children {
        match child {
            Comment => {
                if ncomment > 0 {
                    return Err(order_error(Table, "only one Comment allowed"));
                }
                if ncolumn > 0 || nstream > 0 {
                    return Err(order_error(
                        Table,
                        "Comment must come before Column(s) and Stream",
                    ));
                }
                ncomment += 1;
            }
            Column => {
                if nstream > 0 {
                    return Err(order_error(Table, "Column(s) must come before Stream"));
                }
                ncolumn += 1;
            }
            Stream => {
                if nstream > 0 {
                    return Err(order_error(Table, "only one Stream allowed"));
                }
                nstream += 1;
            }
            other => {
                return Err(LigoLwError::InvalidChild {
                    parent: Table.tag_name(),
                    child: other.tag_name(),
                })
            }
        }
    }
    Ok(())
}

fn verify_array(children: &[ElementKind]) -> Result<(), LigoLwError> {
    let mut nstream = 0;
    for &child in children {
        match child {
            Dim => {
                if nstream > 0 {
                    return Err(order_error(Array, "Dim(s) must come before Stream"));
                }
            }
            Stream => {
                if nstream > 0 {
                    return Err(order_error(Array, "only one Stream allowed"));
                }
                nstream += 1;
            }
            other => {
                return Err(LigoLwError::InvalidChild {
                    parent: Array.tag_name(),
                    child: other.tag_name(),
                })
            }
        }
    }
    Ok(())
}

/// Data held by one tree node: kind, attributes and character data.
///
/// Children and the parent link live in the owning [`crate::Document`].
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    kind: ElementKind,
    attributes: Attributes,
    pcdata: Option<String>,
}

impl Element {
    /// An element with no attributes.
    ///
    /// `Stream` and `Time` are valid without attributes since their `Type`
    /// falls back to a default.
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            attributes: Attributes::new(),
            pcdata: None,
        }
    }

    /// Construct an element, checking the attribute names against the
    /// kind's declared set and the enumerated attributes against their
    /// allowed values.
    pub fn with_attributes<I, K, V>(kind: ElementKind, attrs: I) -> Result<Self, LigoLwError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let attributes: Attributes = attrs.into_iter().collect();
        let mut invalid: Vec<String> = attributes
            .iter()
            .filter(|(name, _)| !kind.allows_attribute(name))
            .map(|(name, _)| name.to_string())
            .collect();
        if !invalid.is_empty() {
            invalid.sort();
            return Err(LigoLwError::InvalidAttributes {
                tag: kind.tag_name(),
                names: invalid,
            });
        }
        let element = Self {
            kind,
            attributes,
            pcdata: None,
        };
        element.verify_enumerations()?;
        Ok(element)
    }

    fn verify_enumerations(&self) -> Result<(), LigoLwError> {
        let (proxy, allowed): (_, &[&str]) = match self.kind {
            Stream => (&stream::TYPE, &STREAM_TYPES[..]),
            Time => (&time::TYPE, &TIME_TYPES[..]),
            _ => return Ok(()),
        };
        let value = proxy.get(self)?;
        if !allowed.contains(&value.as_str()) {
            return Err(LigoLwError::InvalidAttributeValue {
                tag: self.kind.tag_name(),
                attribute: proxy.name(),
                value,
            });
        }
        Ok(())
    }

    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    pub fn tag_name(&self) -> &'static str {
        self.kind.tag_name()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.get(name).is_some()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name)
    }

    /// Set a raw attribute value. The name must be declared for this kind;
    /// on enumerated attributes the value must be allowed, otherwise the
    /// previous value is kept.
    pub fn set_attribute(
        &mut self,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), LigoLwError> {
        if !self.kind.allows_attribute(name) {
            return Err(LigoLwError::InvalidAttributes {
                tag: self.kind.tag_name(),
                names: vec![name.to_string()],
            });
        }
        let previous = self.attributes.get(name).map(str::to_string);
        self.attributes.insert(name, value);
        if let Err(err) = self.verify_enumerations() {
            match previous {
                Some(previous) => self.attributes.insert(name, previous),
                None => {
                    self.remove_attribute(name);
                }
            }
            return Err(err);
        }
        Ok(())
    }

    /// Remove an attribute, returning its value. Removing an absent
    /// attribute is not an error.
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let mut removed = None;
        self.attributes = std::mem::take(&mut self.attributes)
            .into_iter()
            .filter_map(|(key, value)| {
                if key == name {
                    removed = Some(value);
                    None
                } else {
                    Some((key, value))
                }
            })
            .collect();
        removed
    }

    /// Accumulated character data.
    pub fn text(&self) -> Option<&str> {
        self.pcdata.as_deref()
    }

    pub fn set_text(&mut self, text: Option<String>) {
        self.pcdata = text;
    }

    /// Append character data to the element.
    pub fn append_data(&mut self, content: &str) {
        match &mut self.pcdata {
            Some(pcdata) => pcdata.push_str(content),
            None => self.pcdata = Some(content.to_string()),
        }
    }

    /// Hook run by the builder when the element's end tag is seen.
    ///
    /// `Param` and `Stream` are written with their text on its own lines, so
    /// the surrounding whitespace is layout and is trimmed here.
    pub fn end_element(&mut self) {
        if !matches!(self.kind, Param | Stream) {
            return;
        }
        if let Some(text) = self.pcdata.take() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                self.pcdata = Some(if trimmed.len() == text.len() {
                    text
                } else {
                    trimmed.to_string()
                });
            }
        }
    }
}
