use std::collections::HashMap;

use serde::Deserialize;

/// `GET /export` query parameters, per `spec.md` §6.
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    pub url: String,
    #[serde(default)]
    pub r#type: ExportFormat,
    #[serde(default = "default_true")]
    pub enrich: bool,
    #[serde(default)]
    pub tree: bool,
    #[serde(default)]
    pub diagram_type: DiagramDialect,
    pub lookup_config: Option<String>,
}

/// `POST /import` query parameters, per `spec.md` §6. `on_ambiguous`,
/// `on_missing` and `detect_cycles` are left unset when the caller omits
/// them, so the controller can fall back to `config::settings().resolution`
/// rather than a hardcoded default.
#[derive(Debug, Deserialize)]
pub struct ImportParams {
    pub url: String,
    #[serde(default)]
    pub r#type: ExportFormat,
    pub on_ambiguous: Option<ResolutionPolicy>,
    pub on_missing: Option<ResolutionPolicy>,
    pub detect_cycles: Option<bool>,
    pub lookup_config: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
    Mermaid,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
            ExportFormat::Mermaid => "mmd",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Mermaid => "text/vnd.mermaid",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramDialect {
    #[default]
    Flowchart,
    Graph,
    Mindmap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPolicy {
    #[default]
    Skip,
    Fail,
}

/// `lookup_config` query text, parsed into `resource_type -> ordered fields`.
/// Used by C2 (`spec.md` §4.2).
pub type LookupConfig = HashMap<String, Vec<String>>;

pub fn parse_lookup_config(raw: Option<&str>) -> anyhow::Result<LookupConfig> {
    match raw {
        Some(text) if !text.trim().is_empty() => {
            Ok(serde_json::from_str(text).map_err(|e| {
                anyhow::anyhow!("invalid lookup_config: {e}")
            })?)
        }
        _ => Ok(LookupConfig::new()),
    }
}
