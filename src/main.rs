use clap::{command, Parser};
use qif_import::commands;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "qif-import")]
#[command(version = "0.1.0")]
#[command(about = "Import Quicken Interchange Format (QIF) files.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: commands::Commands,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = cli.command.run() {
        println!("{e}");
        std::process::exit(1)
    };
}
