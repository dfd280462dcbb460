//! ResearchPress CLI: research a topic and turn the findings into an article.
//!
//! Searches several content categories for recent sources, generates a
//! cited Markdown article from the selected ones, and converts it to
//! block-editor markup.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
