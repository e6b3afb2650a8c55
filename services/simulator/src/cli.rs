use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "safeclass-simulator")]
#[command(version)]
#[command(about = "Practice de-escalating classroom conflicts against simulated students")]
pub struct Args {
    /// Root URL of a running Safe Class API server (e.g. http://localhost:3000).
    /// Without it the simulator calls the completion provider directly.
    #[arg(long)]
    pub server_url: Option<String>,

    /// JSON file with an array of scenarios to use instead of the built-in one
    #[arg(long)]
    pub scenarios: Option<PathBuf>,

    /// Index of the scenario to start with
    #[arg(long, default_value_t = 0)]
    pub scenario: usize,

    /// Pause between feedback and the students' reply, in milliseconds
    #[arg(long, default_value_t = 1000)]
    pub reply_delay_ms: u64,

    /// Request timeout for relay mode, in seconds
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

/// A line typed at the prompt.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Hint,
    Next,
    Restart,
    Summary,
    Help,
    Quit,
    Respond(&'a str),
    Unknown(&'a str),
}

impl<'a> Command<'a> {
    pub fn parse(line: &'a str) -> Self {
        let line = line.trim();
        match line {
            "/hint" => Command::Hint,
            "/next" => Command::Next,
            "/restart" => Command::Restart,
            "/summary" => Command::Summary,
            "/help" => Command::Help,
            "/quit" | "/exit" => Command::Quit,
            other if other.starts_with('/') => Command::Unknown(other),
            other => Command::Respond(other),
        }
    }
}

pub const HELP: &str = "Type your response to the class and press Enter.
Commands: /hint  /next  /restart  /summary  /help  /quit";
