//! C5 — Topological Sorter. Kahn's algorithm over `_original_id` /
//! `parent_id`/`parent_uuid` edges. See `spec.md` §4.5.

use std::collections::{HashMap, HashSet, VecDeque};

use serde_json::Value;

use crate::models::{self, Record, FIELD_ORIGINAL_ID, FIELD_PARENT_ID};

/// The set of `_original_id`s that could not be fully ordered because they
/// participate in a parent-pointer cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub cyclic_ids: Vec<String>,
}

impl CycleReport {
    pub fn is_empty(&self) -> bool {
        self.cyclic_ids.is_empty()
    }
}

/// Orders `records` so parents precede children. Ties among equal-depth
/// siblings preserve input order (stable, testable property 6). When
/// `detect_cycles` is false, records are returned in input order
/// unchanged.
pub fn topo_sort(records: Vec<Record>, detect_cycles: bool) -> (Vec<Record>, CycleReport) {
    if !detect_cycles {
        return (records, CycleReport::default());
    }

    let n = records.len();
    let ids: Vec<Option<String>> = records
        .iter()
        .map(|r| r.get(FIELD_ORIGINAL_ID).and_then(Value::as_str).map(str::to_string))
        .collect();
    let id_known: HashSet<&str> = ids.iter().flatten().map(String::as_str).collect();

    let index_of: HashMap<&str, usize> = ids
        .iter()
        .enumerate()
        .filter_map(|(i, id)| id.as_deref().map(|id| (id, i)))
        .collect();

    // child index -> parent index, only when the parent is present in the
    // batch; otherwise the record is a root.
    let mut parent_of: Vec<Option<usize>> = vec![None; n];
    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree: Vec<usize> = vec![0; n];

    for (i, record) in records.iter().enumerate() {
        if let Some(parent_id) = models::parent_ref(record) {
            if id_known.contains(parent_id.as_str()) {
                let parent_idx = index_of[parent_id.as_str()];
                parent_of[i] = Some(parent_idx);
                children_of[parent_idx].push(i);
                in_degree[i] = 1;
            }
        }
    }

    // Kahn's algorithm: seed the queue with roots in input order, then
    // repeatedly peel off nodes whose single incoming edge has been
    // consumed, preserving input order among ties via a FIFO queue.
    let mut queue: VecDeque<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    let mut visited = vec![false; n];

    while let Some(idx) = queue.pop_front() {
        if visited[idx] {
            continue;
        }
        visited[idx] = true;
        order.push(idx);

        for &child in &children_of[idx] {
            if in_degree[child] > 0 {
                in_degree[child] -= 1;
                if in_degree[child] == 0 {
                    queue.push_back(child);
                }
            }
        }
    }

    let cyclic_ids: Vec<String> = (0..n)
        .filter(|&i| !visited[i])
        .filter_map(|i| ids[i].clone())
        .collect();

    // Acyclic prefix in topological order, followed by the cyclic
    // remainder in original input order.
    for i in 0..n {
        if !visited[i] {
            order.push(i);
        }
    }

    let mut records: Vec<Option<Record>> = records.into_iter().map(Some).collect();
    let ordered = order
        .into_iter()
        .map(|i| records[i].take().expect("each index used exactly once"))
        .collect();

    (ordered, CycleReport { cyclic_ids })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rec(original_id: &str, parent: Option<&str>) -> Record {
        let mut r = Record::new();
        r.insert(FIELD_ORIGINAL_ID.to_string(), json!(original_id));
        r.insert(FIELD_PARENT_ID.to_string(), parent.map(Value::from).unwrap_or(Value::Null));
        r
    }

    fn ids(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .map(|r| r[FIELD_ORIGINAL_ID].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn s2_tree_sorts_parents_before_children() {
        let records = vec![
            rec("c1", None),
            rec("c2", Some("c1")),
            rec("c3", Some("c1")),
            rec("c4", Some("c2")),
        ];
        let (ordered, report) = topo_sort(records, true);
        assert!(report.is_empty());
        assert_eq!(ids(&ordered), vec!["c1", "c2", "c3", "c4"]);
    }

    #[test]
    fn s5_cycle_is_reported_and_degrades_to_input_order() {
        let records = vec![rec("a", Some("b")), rec("b", Some("a"))];
        let (ordered, report) = topo_sort(records, true);
        assert_eq!(report.cyclic_ids.len(), 2);
        assert_eq!(ids(&ordered), vec!["a", "b"]);
    }

    #[test]
    fn stable_among_siblings_under_permutation() {
        let records = vec![
            rec("root", None),
            rec("z", Some("root")),
            rec("a", Some("root")),
            rec("m", Some("root")),
        ];
        let (ordered, _) = topo_sort(records, true);
        assert_eq!(ids(&ordered), vec!["root", "z", "a", "m"]);
    }

    #[test]
    fn detect_cycles_false_preserves_input_order() {
        let records = vec![rec("b", Some("a")), rec("a", None)];
        let (ordered, report) = topo_sort(records, false);
        assert!(report.is_empty());
        assert_eq!(ids(&ordered), vec!["b", "a"]);
    }

    #[test]
    fn parent_uuid_batches_sort_the_same_as_parent_id_batches() {
        let mut child = Record::new();
        child.insert(FIELD_ORIGINAL_ID.to_string(), json!("c"));
        child.insert(crate::models::FIELD_PARENT_UUID.to_string(), json!("p"));
        let mut parent = Record::new();
        parent.insert(FIELD_ORIGINAL_ID.to_string(), json!("p"));

        let (ordered, report) = topo_sort(vec![child, parent], true);
        assert!(report.is_empty());
        assert_eq!(ids(&ordered), vec!["p", "c"]);
    }
}
