use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::common;

pub fn run(path: &Path, xsl: Option<String>, spaces: Option<usize>) -> Result<()> {
    let document = common::load_document(path)?;
    info!(path = %path.display(), "re-emitting document");
    common::write_document(&document, &common::write_options(xsl, spaces))
}
