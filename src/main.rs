use clap::Parser;
use tracing_subscriber::EnvFilter;

use windborne::cli::{self, Cli};

fn main() {
    // Diagnostics go to stderr so piped stdout stays machine-readable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = cli::run(cli) {
        eprintln!("{err}");
        std::process::exit(err.exit_code());
    }
}
