use clap::Parser;
use tracing_subscriber::EnvFilter;

use crush::{meta_report, run, Cli};

fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug for verbose logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let rendered = run(&cli)?;
    print!("{}", rendered.output);
    if cli.meta {
        eprint!("{}", meta_report(&rendered.meta, console::colors_enabled_stderr()));
    }
    Ok(())
}
