use clap::Parser;

#[derive(Debug, Parser)]
#[clap(name = "migrate-proxy", version)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Subcommand)]
enum Command {
    /// Runs the HTTP migration proxy server.
    Serve(migrate_proxy::cmd::serve::Args),
}

fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Command::Serve(args) => migrate_proxy::cmd::serve::run(args),
    }
}
