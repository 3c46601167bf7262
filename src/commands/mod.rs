use clap::Subcommand;

mod check;
mod import;
mod parse;

#[derive(Subcommand)]
pub enum Commands {
    Check(check::Command),
    Parse(parse::Command),
    Import(import::Command),
}

impl Commands {
    pub fn run(&self) -> Result<(), Box<dyn std::error::Error>> {
        match self {
            Commands::Check(command) => command.run(),
            Commands::Parse(command) => command.run(),
            Commands::Import(command) => command.run(),
        }
    }
}
