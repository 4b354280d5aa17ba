//! HTTP collaborator client for source/target REST endpoints (`spec.md`
//! §6's collaborator contracts). Grounded in the teacher workspace's
//! `flowctl::client::Client` (bearer-token forwarding, builder/execute,
//! status-checked response parsing).

use reqwest::Client as HttpClient;
use serde_json::Value;
use url::Url;

use crate::models::Record;

/// The caller's credential, forwarded verbatim on every outbound call per
/// `spec.md` §6's authentication collaborator contract.
#[derive(Debug, Clone, Default)]
pub struct Credential(Option<String>);

impl Credential {
    pub fn none() -> Self {
        Self(None)
    }

    pub fn from_header_value(value: Option<&str>) -> Self {
        Self(value.map(str::to_string))
    }
}

#[derive(Clone)]
pub struct ResourceClient {
    http: HttpClient,
}

impl ResourceClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    fn authed(&self, builder: reqwest::RequestBuilder, credential: &Credential) -> reqwest::RequestBuilder {
        match &credential.0 {
            Some(token) => builder.header(reqwest::header::AUTHORIZATION, token),
            None => builder,
        }
    }

    /// `GET <base>` — the full record list.
    pub async fn list(&self, base: &str, credential: &Credential) -> anyhow::Result<Vec<Record>> {
        let request = self.authed(self.http.get(base), credential);
        let response = request.send().await?;
        parse_record_list(response).await
    }

    /// `GET <base>/<id>` — a single record, or `None` on a 404.
    pub async fn get_by_id(&self, base: &str, id: &str, credential: &Credential) -> anyhow::Result<Option<Record>> {
        let url = format!("{}/{}", base.trim_end_matches('/'), id);
        let request = self.authed(self.http.get(&url), credential);
        let response = request.send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(parse_record(response).await?))
    }

    /// `GET <base>?<field>=<value>` — a filtered list, used by the
    /// per-record resolver's S1 lookup (`spec.md` §4.10).
    pub async fn query(
        &self,
        base: &str,
        field: &str,
        value: &Value,
        credential: &Credential,
    ) -> anyhow::Result<Vec<Record>> {
        let request = self.authed(self.http.get(base).query(&[(field, display(value))]), credential);
        let response = request.send().await?;
        parse_record_list(response).await
    }

    /// `POST <base>` — creates a record, returning it (the caller reads its
    /// new `id` off the result).
    pub async fn create(&self, base: &str, body: &Record, credential: &Credential) -> anyhow::Result<Record> {
        let request = self.authed(self.http.post(base).json(body), credential);
        let response = request.send().await?;
        parse_record(response).await
    }
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

async fn parse_record_list(response: reqwest::Response) -> anyhow::Result<Vec<Record>> {
    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("upstream rejected request with status {status}");
    }
    let value: Value = response.json().await?;
    match value {
        Value::Array(items) => Ok(items.into_iter().filter_map(|v| v.as_object().cloned()).collect()),
        Value::Object(single) => Ok(vec![single]),
        _ => Ok(Vec::new()),
    }
}

async fn parse_record(response: reqwest::Response) -> anyhow::Result<Record> {
    let status = response.status();
    if !status.is_success() {
        anyhow::bail!("upstream rejected request with status {status}");
    }
    let value: Value = response.json().await?;
    value
        .as_object()
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("expected the upstream to return a JSON object"))
}

/// Swaps the last path segment of a collection URL (e.g. `.../tasks`) for
/// `resource_type`, used to reach a sibling collection at the same API root
/// when resolving external FKs (`spec.md` §4.3/§4.9).
pub fn sibling_collection_url(collection_url: &str, resource_type: &str) -> anyhow::Result<String> {
    let mut url = Url::parse(collection_url)?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|_| anyhow::anyhow!("collection url cannot be a base"))?;
        segments.pop_if_empty().pop();
        segments.push(resource_type);
    }
    Ok(url.to_string())
}

/// Derives the last path segment of a collection URL, used as the exported
/// resource's name (`spec.md` §4.9's `<resource_name>_export.<ext>`).
pub fn resource_name(collection_url: &str) -> String {
    Url::parse(collection_url)
        .ok()
        .and_then(|url| url.path_segments().and_then(|mut s| s.next_back().map(str::to_string)))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "export".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_collection_url_swaps_last_segment() {
        let sibling = sibling_collection_url("https://api.example.com/v1/tasks", "users").unwrap();
        assert_eq!(sibling, "https://api.example.com/v1/users");
    }

    #[test]
    fn resource_name_reads_last_path_segment() {
        assert_eq!(resource_name("https://api.example.com/v1/tasks"), "tasks");
        assert_eq!(resource_name("https://api.example.com/v1/tasks/"), "tasks");
    }
}
