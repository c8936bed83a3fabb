use std::path::PathBuf;

use clap::Parser;

/// Rivulet chat client
#[derive(Debug, Parser)]
#[command(name = "rivulet", about = "Streaming chat client with thinking, search, and tool channels")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "rivulet.toml", env = "RIVULET_CONFIG")]
    pub config: PathBuf,

    /// Override the configured model
    #[arg(long, env = "RIVULET_MODEL")]
    pub model: Option<String>,

    /// System prompt prepended to the conversation
    #[arg(long)]
    pub system: Option<String>,

    /// Disable streaming and print the full answer at once
    #[arg(long)]
    pub no_stream: bool,

    /// Echo thinking text to stderr as it streams
    #[arg(long)]
    pub show_thinking: bool,

    /// The user prompt
    pub prompt: String,
}
