use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "drxbot")]
#[command(author, version, about = "Telegram bot front-end for the DRX Mining web game", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (long polling)
    Run,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
