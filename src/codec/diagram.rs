//! C6 — Diagram Codec. Emits and parses a Mermaid-like textual diagram in
//! three dialects (flowchart, graph, mindmap). See `spec.md` §4.6.

use chrono::Utc;
use serde_json::Value;

use crate::codec::{CodecError, RecordCodec};
use crate::domain::lookup;
use crate::models::query::{DiagramDialect, LookupConfig};
use crate::models::{self, Record, FIELD_ORIGINAL_ID, FIELD_PARENT_ID};

pub struct DiagramCodec {
    pub dialect: DiagramDialect,
    pub resource_type: String,
    pub lookup_config: LookupConfig,
}

impl RecordCodec for DiagramCodec {
    fn encode(&self, records: &[Record]) -> Result<Vec<u8>, CodecError> {
        Ok(emit(records, self.dialect, &self.resource_type, &self.lookup_config).into_bytes())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<Record>, CodecError> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| CodecError::Other(format!("diagram body is not valid utf8: {e}")))?;
        Ok(parse(text))
    }

    fn media_type(&self) -> &'static str {
        "text/vnd.mermaid"
    }

    fn extension(&self) -> &'static str {
        "mmd"
    }
}

fn dialect_token(dialect: DiagramDialect) -> &'static str {
    match dialect {
        DiagramDialect::Flowchart => "flowchart TD",
        DiagramDialect::Graph => "graph TD",
        DiagramDialect::Mindmap => "mindmap",
    }
}

/// Strips non-alphanumeric characters from a source id to produce a safe
/// diagram node identifier.
fn safe_id(original_id: &str) -> String {
    let stripped: String = original_id.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    if stripped.is_empty() {
        "n".to_string()
    } else {
        stripped
    }
}

fn effective_original_id(record: &Record) -> String {
    crate::models::original_id(record)
        .or_else(|| crate::models::record_id(record))
        .unwrap_or_default()
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn label_for(record: &Record, resource_type: &str, lookup_config: &LookupConfig, original_id: &str) -> String {
    let name = lookup::first_non_null_field(resource_type, lookup_config, record)
        .map(|(_, value)| display_value(value))
        .unwrap_or_else(|| original_id.to_string());

    format!("{name}<br/>_original_id: {original_id}")
}

struct Node {
    safe_id: String,
    label: String,
    parent_safe_id: Option<String>,
    depth: usize,
}

/// Depth-first pre-order over the parent/child graph implied by
/// `parent_id`/`parent_uuid`, with any cyclic or unreachable records
/// appended as extra roots so every input record is emitted exactly once.
fn traversal_order(records: &[Record]) -> Vec<(usize, usize, Option<usize>)> {
    use std::collections::HashMap;

    let original_ids: Vec<String> = records.iter().map(effective_original_id).collect();
    let index_of: HashMap<&str, usize> = original_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();

    let mut children_of: Vec<Vec<usize>> = vec![Vec::new(); records.len()];
    let mut has_parent_in_batch = vec![false; records.len()];

    for (i, record) in records.iter().enumerate() {
        if let Some(parent) = models::parent_ref(record) {
            if let Some(&parent_idx) = index_of.get(parent.as_str()) {
                children_of[parent_idx].push(i);
                has_parent_in_batch[i] = true;
            }
        }
    }

    let mut visited = vec![false; records.len()];
    let mut order = Vec::with_capacity(records.len());

    fn visit(
        idx: usize,
        depth: usize,
        parent: Option<usize>,
        children_of: &[Vec<usize>],
        visited: &mut [bool],
        order: &mut Vec<(usize, usize, Option<usize>)>,
    ) {
        if visited[idx] {
            return;
        }
        visited[idx] = true;
        order.push((idx, depth, parent));
        for &child in &children_of[idx] {
            visit(child, depth + 1, Some(idx), children_of, visited, order);
        }
    }

    for i in 0..records.len() {
        if !has_parent_in_batch[i] {
            visit(i, 0, None, &children_of, &mut visited, &mut order);
        }
    }
    // Anything left unreached is part of a cycle; flush as extra roots so
    // no record is dropped.
    for i in 0..records.len() {
        if !visited[i] {
            visit(i, 0, None, &children_of, &mut visited, &mut order);
        }
    }

    order
}

fn emit(records: &[Record], dialect: DiagramDialect, resource_type: &str, lookup_config: &LookupConfig) -> String {
    let order = traversal_order(records);
    let original_ids: Vec<String> = records.iter().map(effective_original_id).collect();
    let safe_ids: Vec<String> = original_ids.iter().map(|id| safe_id(id)).collect();

    let nodes: Vec<Node> = order
        .iter()
        .map(|&(idx, depth, parent)| Node {
            safe_id: safe_ids[idx].clone(),
            label: label_for(&records[idx], resource_type, lookup_config, &original_ids[idx]),
            parent_safe_id: parent.map(|p| safe_ids[p].clone()),
            depth,
        })
        .collect();

    let mut out = String::new();
    out.push_str("%%{init: {'theme': 'base'}}%%\n");
    out.push_str(dialect_token(dialect));
    out.push('\n');
    out.push_str(&format!("%% exported: {}\n", Utc::now().to_rfc3339()));
    out.push_str(&format!("%% resource_type: {resource_type}\n"));

    match dialect {
        DiagramDialect::Mindmap => {
            for node in &nodes {
                out.push_str(&"  ".repeat(node.depth));
                out.push_str(&format!("{}({})\n", node.safe_id, node.label));
            }
        }
        DiagramDialect::Flowchart | DiagramDialect::Graph => {
            for node in &nodes {
                out.push_str(&format!("{}[\"{}\"]\n", node.safe_id, node.label));
            }
            for node in &nodes {
                if let Some(parent) = &node.parent_safe_id {
                    out.push_str(&format!("{parent} --> {}\n", node.safe_id));
                }
            }
        }
    }

    out
}

struct ParsedNode {
    label: String,
    original_id: String,
}

fn parse(text: &str) -> Vec<Record> {
    use std::collections::HashMap;

    let mut nodes: HashMap<String, ParsedNode> = HashMap::new();
    let mut node_order: Vec<String> = Vec::new();
    let mut parent_of: HashMap<String, String> = HashMap::new();
    // Stack of (depth, safe_id), used to resolve mindmap indentation into
    // parent relationships.
    let mut depth_stack: Vec<(usize, String)> = Vec::new();

    for raw_line in text.lines() {
        let trimmed = raw_line.trim();
        if trimmed.is_empty() || trimmed.starts_with("%%") {
            continue;
        }
        if is_dialect_token(trimmed) {
            continue;
        }

        if let Some((src, dst)) = trimmed.split_once("-->") {
            parent_of.insert(safe_token(dst.trim()), safe_token(src.trim()));
            continue;
        }

        if let Some((safe, label)) = parse_node_decl(raw_line) {
            let indent = raw_line.len() - raw_line.trim_start().len();
            let depth = indent / 2;

            if !nodes.contains_key(&safe) {
                node_order.push(safe.clone());
            }
            nodes.insert(safe.clone(), parse_label(&label, &safe));

            // Mindmap hierarchy is indentation-derived; flowchart/graph
            // hierarchy comes from `-->` edges parsed above.
            depth_stack.retain(|(d, _)| *d < depth);
            if let Some((_, parent_safe)) = depth_stack.last() {
                parent_of.entry(safe.clone()).or_insert_with(|| parent_safe.clone());
            }
            depth_stack.push((depth, safe));
        }
    }

    node_order
        .into_iter()
        .map(|safe| {
            let parsed = nodes.remove(&safe).expect("collected during the same pass");
            let mut record = Record::new();
            record.insert(FIELD_ORIGINAL_ID.to_string(), Value::String(parsed.original_id));
            record.insert("name".to_string(), Value::String(first_segment(&parsed.label)));
            let parent_value = parent_of
                .get(&safe)
                .map(|p| Value::String(p.clone()))
                .unwrap_or(Value::Null);
            record.insert(FIELD_PARENT_ID.to_string(), parent_value);
            record
        })
        .collect()
}

fn is_dialect_token(line: &str) -> bool {
    line == "flowchart TD"
        || line == "graph TD"
        || line == "mindmap"
        || line.starts_with("flowchart")
        || line.starts_with("graph ")
        || line.starts_with("%%{")
}

/// Parses a node declaration line, lenient about the delimiter shape
/// (`[...]`, `(...)`, `{...}`) and surrounding whitespace.
fn parse_node_decl(line: &str) -> Option<(String, String)> {
    let trimmed = line.trim_start();
    let open_idx = trimmed.find(['[', '(', '{'])?;
    let (id_part, rest) = trimmed.split_at(open_idx);
    let id_part = id_part.trim();
    if id_part.is_empty() || id_part.contains("-->") {
        return None;
    }

    let open = rest.chars().next()?;
    let close = match open {
        '[' => ']',
        '(' => ')',
        '{' => '}',
        _ => return None,
    };
    let inner = rest.strip_prefix(open)?;
    let close_idx = inner.rfind(close)?;
    let mut label = inner[..close_idx].to_string();
    if label.starts_with('"') && label.ends_with('"') && label.len() >= 2 {
        label = label[1..label.len() - 1].to_string();
    }

    Some((id_part.to_string(), label))
}

fn safe_token(s: &str) -> String {
    s.trim().to_string()
}

fn parse_label(label: &str, safe: &str) -> ParsedNode {
    let segments: Vec<&str> = label.split("<br/>").collect();
    let original_id = segments
        .iter()
        .find_map(|seg| seg.trim().strip_prefix("_original_id:").map(|v| v.trim().to_string()))
        .unwrap_or_else(|| safe.to_string());

    ParsedNode {
        label: label.to_string(),
        original_id,
    }
}

fn first_segment(label: &str) -> String {
    label.split("<br/>").next().unwrap_or(label).trim().to_string()
}
