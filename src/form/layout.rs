//! Ordering and grouping of property paths.

use crate::core::document::Document;
use crate::core::property_path::{PropertyPath, SEPARATOR};
use crate::core::value::Value;
use crate::inspector::Inspector;

/// One entry of a renderer level, with paths relative to that level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutEntry {
    Field(PropertyPath),
    Group {
        /// Group prefix including the trailing separator.
        head: PropertyPath,
        /// Paths relative to `head`. Empty for a bare `head` marker, whose
        /// children come from the document slice.
        children: Vec<PropertyPath>,
    },
}

/// Visible paths of `document`, stably sorted by the inspector's order.
pub fn derive_paths(inspector: &dyn Inspector, document: &Document) -> Vec<PropertyPath> {
    let mut paths = inspector.list_visible_properties(document);
    paths.sort_by_key(|path| inspector.order_of(path, document));
    paths
}

/// Groups paths at their first separator, keeping discovery order. Each
/// level strips exactly one segment, so nesting terminates.
pub fn group_paths(paths: &[PropertyPath]) -> Vec<LayoutEntry> {
    let mut out: Vec<LayoutEntry> = Vec::new();
    for path in paths {
        let Some((head, rest)) = path.split_group() else {
            if !out.iter().any(|entry| matches!(entry, LayoutEntry::Field(p) if p == path)) {
                out.push(LayoutEntry::Field(path.clone()));
            }
            continue;
        };
        let existing = out.iter_mut().find_map(|entry| match entry {
            LayoutEntry::Group { head: h, children } if *h == head => Some(children),
            _ => None,
        });
        match existing {
            Some(children) => {
                if !rest.is_empty() && !children.contains(&rest) {
                    children.push(rest);
                }
            }
            None => out.push(LayoutEntry::Group {
                head,
                children: if rest.is_empty() { Vec::new() } else { vec![rest] },
            }),
        }
    }
    out
}

/// Relative child paths of a bare group marker: the keys of the nested
/// object, with nested objects becoming markers themselves.
pub fn slice_paths(slice: &Document) -> Vec<PropertyPath> {
    slice
        .fields()
        .iter()
        .map(|(key, value)| match value {
            Value::Object(nested) if !nested.is_empty() => PropertyPath::new(format!("{key}{SEPARATOR}")),
            _ => PropertyPath::new(key.clone()),
        })
        .collect()
}

/// Every scalar path reachable from `paths`, with markers expanded through
/// `document`.
pub fn leaf_paths(paths: &[PropertyPath], document: &Document) -> Vec<PropertyPath> {
    let mut out = Vec::new();
    for path in paths {
        if !path.is_group_marker() {
            out.push(path.clone());
            continue;
        }
        for relative in document.slice(path).leaf_paths() {
            out.push(PropertyPath::join(path, &relative));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{LayoutEntry, derive_paths, group_paths, leaf_paths, slice_paths};
    use crate::core::document::Document;
    use crate::core::property_path::PropertyPath;
    use crate::inspector::builtin::schema_inspector;
    use crate::inspector::{DocumentKind, Inspector};

    fn paths(raw: &[&str]) -> Vec<PropertyPath> {
        raw.iter().map(|p| PropertyPath::from(*p)).collect()
    }

    #[test]
    fn nested_prefix_becomes_one_group() {
        let layout = group_paths(&paths(&["A/x", "A/y", "B"]));
        assert_eq!(
            layout,
            vec![
                LayoutEntry::Group {
                    head: PropertyPath::from("A/"),
                    children: paths(&["x", "y"]),
                },
                LayoutEntry::Field(PropertyPath::from("B")),
            ]
        );
    }

    #[test]
    fn deeper_paths_recurse_one_segment_at_a_time() {
        let layout = group_paths(&paths(&["A/B/x", "A/y"]));
        let LayoutEntry::Group { children, .. } = &layout[0] else {
            panic!("expected group");
        };
        assert_eq!(children, &paths(&["B/x", "y"]));
        assert!(matches!(
            &group_paths(children)[0],
            LayoutEntry::Group { head, .. } if head == "B/"
        ));
    }

    #[test]
    fn bare_marker_reads_children_from_slice() {
        let layout = group_paths(&paths(&["stats/"]));
        assert_eq!(
            layout,
            vec![LayoutEntry::Group {
                head: PropertyPath::from("stats/"),
                children: Vec::new(),
            }]
        );
        let doc = Document::new().with("stats/max", 3.0).with("stats/limits/hard", 9.0);
        assert_eq!(slice_paths(&doc.slice(&PropertyPath::from("stats/"))), paths(&["max", "limits/"]));
        assert_eq!(
            leaf_paths(&paths(&["stats/", "title"]), &doc),
            paths(&["stats/max", "stats/limits/hard", "title"])
        );
    }

    #[test]
    fn order_sort_is_stable() {
        let inspector = schema_inspector(DocumentKind::Project).expect("schema");
        let derived = derive_paths(&inspector, &inspector.create_default());
        let position = |p: &str| derived.iter().position(|d| d == p).expect("present");
        assert!(position("title") < position("summary"));
        assert!(position("tags") < position("players/min"));
        assert!(position("players/min") < position("players/max"));
    }
}
