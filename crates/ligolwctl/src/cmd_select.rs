//! `extract` and `strip`: selective loads re-emitted to stdout.

use std::path::Path;

use anyhow::{Context, Result};
use ligolw::xml::Attributes;
use ligolw::{Document, WriteOptions};
use tracing::info;

use crate::common::{self, Selector};

/// Keep only the selected elements (inside the outermost element).
pub fn extract_document(path: &Path, selector: &Selector) -> Result<Document> {
    let source = common::open_source(path)?;
    Document::load_partial(source, |tag: &str, attrs: &Attributes| selector.matches(tag, attrs))
        .with_context(|| format!("extract {} from {}", selector.tag, path.display()))
}

/// Drop the selected elements.
pub fn strip_document(path: &Path, selector: &Selector) -> Result<Document> {
    let source = common::open_source(path)?;
    Document::load_filtered(source, |tag: &str, attrs: &Attributes| selector.matches(tag, attrs))
        .with_context(|| format!("strip {} from {}", selector.tag, path.display()))
}

pub fn extract(path: &Path, selector: &Selector, options: &WriteOptions) -> Result<()> {
    let document = extract_document(path, selector)?;
    let kept = document.walk_children(document.root()).count();
    info!(tag = %selector.tag, name = ?selector.name, kept, "extracted");
    common::write_document(&document, options)
}

pub fn strip(path: &Path, selector: &Selector, options: &WriteOptions) -> Result<()> {
    let document = strip_document(path, selector)?;
    let kept = document.walk_children(document.root()).count();
    info!(tag = %selector.tag, name = ?selector.name, kept, "stripped");
    common::write_document(&document, options)
}
