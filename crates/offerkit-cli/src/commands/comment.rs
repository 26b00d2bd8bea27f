use chrono::Utc;
use clap::Subcommand;
use offerkit_core::records::{self, time_ago};
use offerkit_core::CommentForm;

use crate::common::{CliResult, Context};

#[derive(Subcommand)]
pub enum CommentAction {
    /// Post a comment
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        text: String,
    },
    /// List comments, newest first
    List {
        #[arg(long)]
        json: bool,
    },
}

pub fn run(action: CommentAction, ctx: &Context) -> CliResult {
    match action {
        CommentAction::Add { name, text } => {
            let comment = CommentForm { name, text }.validate(Utc::now())?;
            if !records::submit_comment(&ctx.store, comment.clone()) {
                eprintln!("warning: comment was not persisted");
            }
            println!("{}", serde_json::to_string_pretty(&comment)?);
        }
        CommentAction::List { json } => {
            let comments = records::comments(&ctx.store);
            if json {
                println!("{}", serde_json::to_string_pretty(&comments)?);
                return Ok(());
            }
            let now = Utc::now();
            println!("{} comments", comments.len());
            for comment in &comments {
                println!(
                    "- {} ({}): {}",
                    comment.name,
                    time_ago(comment.date, now),
                    comment.text
                );
            }
        }
    }
    Ok(())
}
