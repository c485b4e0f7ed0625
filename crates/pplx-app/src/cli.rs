use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// pplx: streaming answers from the terminal.
#[derive(Parser, Debug)]
#[command(name = "pplx", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level override (debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Interactive chat (the default).
    Chat {
        /// Continue an existing conversation.
        #[arg(long)]
        conversation: Option<String>,
    },
    /// Ask one question and print the answer.
    Ask {
        text: String,
        #[arg(long)]
        conversation: Option<String>,
    },
    /// List conversations, most recent first.
    List,
    /// Print every message of a conversation.
    Show { id: String },
    Delete { id: String },
    /// Delete every conversation.
    Clear,
    /// Authenticate and store the session.
    Login,
    /// Forget the stored session.
    Logout,
}

impl Args {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Chat { conversation: None })
    }
}

pub fn parse() -> Args {
    Args::parse()
}
