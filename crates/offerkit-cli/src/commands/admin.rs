use clap::Subcommand;
use offerkit_core::admin;

use crate::common::{CliResult, Context};

#[derive(Subcommand)]
pub enum AdminAction {
    /// Print every persisted key as JSON
    Dump,
    /// List the keys present in the store
    Keys,
    /// Delete the countdown, stock, leads and comments
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(action: AdminAction, ctx: &Context) -> CliResult {
    match action {
        AdminAction::Dump => {
            println!("{}", admin::export_json(&ctx.store)?);
        }
        AdminAction::Keys => {
            for key in ctx.store.keys() {
                println!("{key}");
            }
        }
        AdminAction::Reset { yes } => {
            if !yes {
                return Err("refusing to reset all data without --yes".into());
            }
            admin::clear_all(&ctx.store);
            println!("all data cleared");
        }
    }
    Ok(())
}
