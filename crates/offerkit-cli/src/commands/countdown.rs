use clap::Args;
use offerkit_core::tick::COUNTDOWN_TICK;
use offerkit_core::{CountdownEngine, DisplayTime};
use serde::Serialize;

use crate::common::{watch, CliResult, Context};

#[derive(Args)]
pub struct CountdownArgs {
    /// Keep printing the remaining time once per second
    #[arg(long)]
    watch: bool,
    /// Stop watching after this many updates
    #[arg(long, requires = "watch")]
    limit: Option<usize>,
}

#[derive(Serialize)]
struct CountdownView {
    #[serde(flatten)]
    time: DisplayTime,
    time_left: String,
    progress_pct: u8,
}

pub fn run(args: CountdownArgs, ctx: &Context) -> CliResult {
    let window = ctx.config.countdown_window()?;
    let engine = CountdownEngine::new(ctx.store.clone());

    if args.watch {
        return watch(
            COUNTDOWN_TICK,
            move || engine.read(window),
            args.limit,
            |left| println!("{}", left.formatted()),
        );
    }

    let time = engine.read(window);
    let view = CountdownView {
        time,
        time_left: time.formatted(),
        progress_pct: time.progress_pct(window),
    };
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}
