use std::path::PathBuf;

use once_cell::sync::OnceCell;
use serde::Deserialize;

mod app_env;

pub use app_env::app_env;

use crate::models::query::ResolutionPolicy;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub application: ApplicationSettings,
    #[serde(default)]
    pub resolution: ResolutionSettings,
    #[serde(default)]
    pub cors: CorsSettings,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Request-overridable defaults (`spec.md` §6's query params fall back to
/// these when absent).
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ResolutionSettings {
    pub fanout_width: usize,
    pub on_ambiguous: ResolutionPolicy,
    pub on_missing: ResolutionPolicy,
    pub detect_cycles: bool,
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            fanout_width: crate::domain::enrich::MAX_FANOUT,
            on_ambiguous: ResolutionPolicy::Skip,
            on_missing: ResolutionPolicy::Skip,
            detect_cycles: true,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CorsSettings {
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

pub fn settings() -> &'static Settings {
    static SETTINGS: OnceCell<Settings> = OnceCell::new();

    SETTINGS.get_or_init(|| load_settings(None).expect("failed to load settings"))
}

/// Loads layered settings from `config/base`, `config/<app_env>`, then
/// `MIGRATE_PROXY_`-namespaced environment variables, in that precedence
/// order (teacher convention, `control/src/config.rs`). `config_path`
/// overrides the base config directory, for the `serve --config-dir` CLI
/// flag.
pub fn load_settings(config_path: Option<PathBuf>) -> Result<Settings, config::ConfigError> {
    let config_dir = config_path.unwrap_or_else(|| {
        std::env::current_dir()
            .expect("the current directory to be available")
            .join("config")
    });

    let builder = config::Config::builder()
        .add_source(config::File::from(config_dir.join("base")).required(false))
        .add_source(config::File::from(config_dir.join(app_env().as_str())).required(false))
        .add_source(
            config::Environment::with_prefix("MIGRATE_PROXY")
                .separator("__")
                .try_parsing(true),
        )
        .set_default("application.host", "0.0.0.0")?
        .set_default("application.port", 8080)?;

    builder.build()?.try_deserialize()
}
