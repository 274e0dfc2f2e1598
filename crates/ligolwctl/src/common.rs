use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use ligolw::xml::Attributes;
use ligolw::{Document, WriteOptions};
use serde::Serialize;

/// Suffixes carried by table and array names in most files.
const NAME_SUFFIXES: [&str; 2] = [":table", ":array"];

pub fn open_source(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    Ok(BufReader::new(file))
}

pub fn load_document(path: &Path) -> Result<Document> {
    let source = open_source(path)?;
    Document::load(source).with_context(|| format!("parse {}", path.display()))
}

pub fn write_options(xsl: Option<String>, spaces: Option<usize>) -> WriteOptions {
    let mut options = WriteOptions::default();
    if let Some(width) = spaces {
        options = options.with_indent(" ".repeat(width));
    }
    if let Some(xsl) = xsl {
        options = options.with_xsl(xsl);
    }
    options
}

pub fn write_document(document: &Document, options: &WriteOptions) -> Result<()> {
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    document
        .write(&mut out, options)
        .context("serialise document")?;
    out.flush().context("flush output")?;
    Ok(())
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("serialise JSON output")?;
    println!("{text}");
    Ok(())
}

/// Name without its `:table` / `:array` suffix.
pub fn base_name(name: &str) -> &str {
    NAME_SUFFIXES
        .iter()
        .find_map(|suffix| name.strip_suffix(suffix))
        .unwrap_or(name)
}

/// Element selection from the command line: a tag and an optional `Name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub tag: String,
    pub name: Option<String>,
}

impl Selector {
    pub fn new(tag: impl Into<String>, name: Option<String>) -> Self {
        Self {
            tag: tag.into(),
            name,
        }
    }

    pub fn matches(&self, tag: &str, attrs: &Attributes) -> bool {
        if tag != self.tag {
            return false;
        }
        match &self.name {
            Some(wanted) => attrs
                .get("Name")
                .is_some_and(|name| base_name(name) == base_name(wanted)),
            None => true,
        }
    }
}
