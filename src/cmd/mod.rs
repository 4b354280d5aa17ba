//! CLI argument groups shared across subcommands. No teacher source for
//! this file was retrieved (only `cmd/serve.rs` survived the retrieval
//! pack); authored fresh, inferred from `serve.rs`'s usage.

use std::path::PathBuf;

pub mod serve;

/// Shared config-loading flags, flattened into each subcommand's `Args`.
#[derive(clap::Args, Debug)]
pub struct ConfigArgs {
    /// Directory containing `base.{toml,yaml,...}` and `<env>.{toml,...}`
    /// config files. Defaults to `./config`.
    #[clap(long = "config-dir")]
    pub config_path: Option<PathBuf>,
}

/// Builds the multi-threaded tokio runtime each subcommand blocks on.
pub fn async_runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}
