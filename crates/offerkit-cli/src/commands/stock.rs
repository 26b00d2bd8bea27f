use clap::Args;
use offerkit_core::tick::STOCK_TICK;
use offerkit_core::StockEngine;

use crate::common::{watch, CliResult, Context};

#[derive(Args)]
pub struct StockArgs {
    /// Keep printing the stock once per minute
    #[arg(long)]
    watch: bool,
    /// Stop watching after this many updates
    #[arg(long, requires = "watch")]
    limit: Option<usize>,
}

pub fn run(args: StockArgs, ctx: &Context) -> CliResult {
    let config = ctx.config.stock_config()?;
    let engine = StockEngine::new(ctx.store.clone());

    if args.watch {
        return watch(
            STOCK_TICK,
            move || engine.read(&config),
            args.limit,
            |stock| println!("{stock}"),
        );
    }

    let stock = engine.read(&config);
    let json = serde_json::json!({
        "stock": stock,
        "initial": config.initial_stock(),
        "min_floor": config.min_floor(),
    });
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
