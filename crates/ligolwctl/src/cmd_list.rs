use std::path::Path;

use anyhow::Result;
use ligolw::{Document, ElementKind, NodeId};
use serde::Serialize;
use tracing::info;

use crate::common;

#[derive(Debug, Serialize, PartialEq)]
pub struct ContainerEntry {
    pub kind: &'static str,
    pub name: Option<String>,
    /// Columns of a table, dimensions of an array.
    pub fields: usize,
    pub stream: bool,
}

/// Tables and arrays of `document` in document order.
pub fn containers(document: &Document) -> Vec<ContainerEntry> {
    document
        .walk_children(document.root())
        .filter_map(|id| entry(document, id))
        .collect()
}

fn entry(document: &Document, id: NodeId) -> Option<ContainerEntry> {
    let kind = document.kind(id)?;
    let field_kind = match kind {
        ElementKind::Table => ElementKind::Column,
        ElementKind::Array => ElementKind::Dim,
        _ => return None,
    };
    let children: Vec<ElementKind> = document
        .children(id)
        .filter_map(|child| document.kind(child))
        .collect();
    Some(ContainerEntry {
        kind: kind.tag_name(),
        name: document.attribute(id, "Name").map(str::to_string),
        fields: children.iter().filter(|&&k| k == field_kind).count(),
        stream: children.contains(&ElementKind::Stream),
    })
}

pub fn run(path: &Path, json: bool) -> Result<()> {
    let document = common::load_document(path)?;
    let entries = containers(&document);
    info!(count = entries.len(), "found tables and arrays");

    if json {
        common::print_json(&entries)?;
        return Ok(());
    }

    if entries.is_empty() {
        println!("No tables or arrays.");
        return Ok(());
    }

    println!("{:<6} {:<32} {:<7} {}", "KIND", "NAME", "FIELDS", "STREAM");
    for entry in &entries {
        println!(
            "{:<6} {:<32} {:<7} {}",
            entry.kind,
            entry.name.as_deref().unwrap_or("-"),
            entry.fields,
            if entry.stream { "yes" } else { "no" },
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_tables_and_arrays_in_order() {
        let document: Document = r#"<LIGO_LW>
            <Table Name="process:table"><Column Name="a"/><Column Name="b"/><Stream/></Table>
            <LIGO_LW><Array Name="psd:array"><Dim/></Array></LIGO_LW>
            <Param Name="p"/>
        </LIGO_LW>"#
            .parse()
            .expect("document");
        assert_eq!(
            containers(&document),
            vec![
                ContainerEntry {
                    kind: "Table",
                    name: Some("process:table".into()),
                    fields: 2,
                    stream: true,
                },
                ContainerEntry {
                    kind: "Array",
                    name: Some("psd:array".into()),
                    fields: 1,
                    stream: false,
                },
            ]
        );
    }
}
