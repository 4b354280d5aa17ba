//! C4 — Tree Flattener/Nester. See `spec.md` §4.4.

use serde_json::Value;

use crate::models::{self, Record, FIELD_CHILDREN, FIELD_ORIGINAL_ID, FIELD_PARENT_ID};

/// Depth-first pre-order flattening of a forest into a flat list, setting
/// each child's `parent_id` to its parent's `_original_id` and dropping
/// `children`.
pub fn flatten(forest: Vec<Record>) -> Vec<Record> {
    let mut out = Vec::new();
    for root in forest {
        flatten_into(root, None, &mut out);
    }
    out
}

fn flatten_into(mut node: Record, parent_original_id: Option<Value>, out: &mut Vec<Record>) {
    let children = node.remove(FIELD_CHILDREN);

    if let Some(parent_id) = parent_original_id {
        node.insert(FIELD_PARENT_ID.to_string(), parent_id);
    }

    let this_original_id = node.get(FIELD_ORIGINAL_ID).cloned();
    out.push(node);

    if let Some(Value::Array(children)) = children {
        for child in children {
            if let Value::Object(child) = child {
                flatten_into(child, this_original_id.clone(), out);
            }
        }
    }
}

/// Groups a flat list by `parent_id`, attaching a `children` array to each
/// record and returning the roots (records whose `parent_id` is null or
/// refers to an id absent from the list). Sibling order follows input
/// order. Returns the input unchanged (signaling ambiguity) if a cycle is
/// detected among the records.
pub fn nest(flat: Vec<Record>) -> Result<Vec<Record>, Vec<Record>> {
    use std::collections::{HashMap, HashSet};

    let ids: HashSet<String> = flat
        .iter()
        .filter_map(|r| r.get(FIELD_ORIGINAL_ID).and_then(Value::as_str))
        .map(str::to_string)
        .collect();

    if has_cycle(&flat, &ids) {
        return Err(flat);
    }

    // Index records by their position, so we can build parent -> [child
    // positions] without needing to clone until the final assembly pass.
    let mut children_of: HashMap<String, Vec<usize>> = HashMap::new();
    let mut roots: Vec<usize> = Vec::new();

    for (i, r) in flat.iter().enumerate() {
        match models::parent_ref(r) {
            Some(parent) if ids.contains(&parent) => {
                children_of.entry(parent).or_default().push(i);
            }
            _ => roots.push(i),
        }
    }

    let mut nodes: Vec<Option<Record>> = flat.into_iter().map(Some).collect();

    fn build(
        idx: usize,
        nodes: &mut [Option<Record>],
        children_of: &HashMap<String, Vec<usize>>,
    ) -> Record {
        let mut record = nodes[idx].take().expect("each node built exactly once");
        let original_id = record.get(FIELD_ORIGINAL_ID).and_then(Value::as_str).map(str::to_string);

        let mut children = Vec::new();
        if let Some(original_id) = original_id {
            if let Some(child_idxs) = children_of.get(&original_id) {
                for &child_idx in child_idxs {
                    children.push(Value::Object(build(child_idx, nodes, children_of)));
                }
            }
        }
        record.insert(FIELD_CHILDREN.to_string(), Value::Array(children));
        record
    }

    Ok(roots
        .into_iter()
        .map(|idx| build(idx, &mut nodes, &children_of))
        .collect())
}

/// Detects whether the parent-pointer graph over `flat` contains a cycle,
/// using a white/gray/black DFS coloring.
fn has_cycle(flat: &[Record], ids: &std::collections::HashSet<String>) -> bool {
    use std::collections::HashMap;

    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let by_id: HashMap<String, usize> = flat
        .iter()
        .enumerate()
        .filter_map(|(i, r)| r.get(FIELD_ORIGINAL_ID).and_then(Value::as_str).map(|id| (id.to_string(), i)))
        .collect();

    let mut colors = vec![Color::White; flat.len()];

    fn visit(
        idx: usize,
        flat: &[Record],
        ids: &std::collections::HashSet<String>,
        by_id: &HashMap<String, usize>,
        colors: &mut [Color],
    ) -> bool {
        match colors[idx] {
            Color::Gray => return true,
            Color::Black => return false,
            Color::White => {}
        }
        colors[idx] = Color::Gray;

        if let Some(parent) = models::parent_ref(&flat[idx]) {
            if ids.contains(&parent) {
                let parent_idx = by_id[&parent];
                if visit(parent_idx, flat, ids, by_id, colors) {
                    return true;
                }
            }
        }

        colors[idx] = Color::Black;
        false
    }

    (0..flat.len()).any(|i| visit(i, flat, ids, &by_id, &mut colors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(original_id: &str, parent: Option<&str>) -> Record {
        let mut r = Record::new();
        r.insert(FIELD_ORIGINAL_ID.to_string(), json!(original_id));
        if let Some(p) = parent {
            r.insert(FIELD_PARENT_ID.to_string(), json!(p));
        } else {
            r.insert(FIELD_PARENT_ID.to_string(), Value::Null);
        }
        r
    }

    #[test]
    fn nest_then_flatten_round_trips_by_depth_first_order() {
        let flat = vec![
            rec("c1", None),
            rec("c2", Some("c1")),
            rec("c3", Some("c1")),
            rec("c4", Some("c2")),
        ];

        let nested = nest(flat.clone()).expect("no cycles");
        let flattened_again = flatten(nested);

        let ids: Vec<_> = flattened_again
            .iter()
            .map(|r| r[FIELD_ORIGINAL_ID].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["c1", "c2", "c4", "c3"]);
    }

    #[test]
    fn nest_detects_cycle_and_returns_input_unchanged() {
        let flat = vec![rec("a", Some("b")), rec("b", Some("a"))];
        let result = nest(flat.clone());
        assert!(result.is_err());
    }

    #[test]
    fn nest_treats_dangling_parent_as_root() {
        let flat = vec![rec("c2", Some("ghost"))];
        let nested = nest(flat).expect("no cycles");
        assert_eq!(nested.len(), 1);
    }

    #[test]
    fn nest_reads_parent_uuid_interchangeably_with_parent_id() {
        let mut root = Record::new();
        root.insert(FIELD_ORIGINAL_ID.to_string(), json!("root"));
        let mut child = Record::new();
        child.insert(FIELD_ORIGINAL_ID.to_string(), json!("child"));
        child.insert(crate::models::FIELD_PARENT_UUID.to_string(), json!("root"));

        let nested = nest(vec![root, child]).expect("no cycles");
        assert_eq!(nested.len(), 1);
        let children = nested[0][FIELD_CHILDREN].as_array().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0][FIELD_ORIGINAL_ID], json!("child"));
    }
}
