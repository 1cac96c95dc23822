use anyhow::{Context, Result};
use clap::Args;
use snug_social::SocialAction;
use std::io::Read;
use std::path::PathBuf;

use crate::examples::ExampleGroup;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Batches",
    commands: &[
        "snug-social run actions.jsonl                # one JSON action per line",
        "snug-social --memory run actions.jsonl       # replay against a throwaway store",
        "cat actions.jsonl | snug-social run -",
    ],
}];

#[derive(Args)]
pub struct RunArgs {
    /// JSON-lines file of actions, or `-` for stdin
    pub file: PathBuf,

    /// Keep going after a failed action
    #[arg(long)]
    pub keep_going: bool,
}

/// Reads the action script; blank lines and `#` comments are skipped
pub fn load_actions(args: &RunArgs) -> Result<Vec<SocialAction>> {
    let content = if args.file.as_os_str() == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read actions from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(&args.file).with_context(|| format!("Failed to read {}", args.file.display()))?
    };
    parse_actions(&content)
}

pub fn parse_actions(content: &str) -> Result<Vec<SocialAction>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line).with_context(|| format!("Invalid action on line {}", index + 1))
        })
        .collect()
}
