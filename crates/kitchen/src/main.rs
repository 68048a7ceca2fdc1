use std::time::Duration;

use clap::Parser;
use rush_hour_kitchen::{Kitchen, KitchenConfig, KitchenSnapshot, OrderState};
use tokio::time::{interval, sleep};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Run the kitchen simulation from the command line.
#[derive(Parser, Debug)]
#[command(name = "rush-hour")]
struct Opts {
    /// Number of chefs (units of the worker gate)
    #[arg(long, default_value_t = 3)]
    workers: usize,

    /// How long a tool request may wait before the station jams
    #[arg(long, default_value_t = 10_000)]
    jam_timeout_ms: u64,

    /// Time spent picking up each tool
    #[arg(long, default_value_t = 300)]
    pickup_delay_ms: u64,

    /// Random orders to place at startup
    #[arg(long, default_value_t = 6)]
    orders: usize,

    /// Chance that a random order is VIP, between 0 and 1
    #[arg(long, default_value_t = 0.2)]
    vip_chance: f64,

    /// Let the assistant dispatch orders as chefs free up
    #[arg(long)]
    auto: bool,

    /// Trigger the circular-wait scenario after placing the orders
    #[arg(long)]
    rush_hour: bool,

    /// Stop after this many seconds
    #[arg(long, default_value_t = 30)]
    run_secs: u64,

    /// Interval between status lines
    #[arg(long, default_value_t = 1000)]
    report_ms: u64,

    /// Print the final snapshot as JSON
    #[arg(long)]
    json: bool,
}

fn report(snapshot: &KitchenSnapshot) {
    let gates: Vec<String> = snapshot
        .gates
        .iter()
        .map(|g| format!("{} {}/{}", g.name, g.in_use(), g.capacity))
        .collect();
    let ready = snapshot.orders.iter().filter(|o| o.state == OrderState::Ready).count();
    let jammed = snapshot.orders.iter().filter(|o| o.jammed).count();
    info!(
        "{:?} | {} | {} queued, {} jammed | served {} earned ${}",
        snapshot.busy,
        gates.join(", "),
        ready,
        jammed,
        snapshot.served,
        snapshot.earnings
    );
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let opts = Opts::parse();
    if opts.workers == 0 {
        anyhow::bail!("--workers must be at least 1");
    }

    let config = KitchenConfig {
        workers: opts.workers,
        jam_timeout: Duration::from_millis(opts.jam_timeout_ms),
        pickup_delay: Duration::from_millis(opts.pickup_delay_ms),
        ..KitchenConfig::default()
    };
    let kitchen = Kitchen::new(config);

    let menu: Vec<String> = kitchen.config().menu.iter().map(|r| r.name.clone()).collect();
    let vip_chance = opts.vip_chance.clamp(0.0, 1.0);
    for _ in 0..opts.orders {
        let recipe = &menu[rand::random_range(0..menu.len())];
        kitchen.create_order(recipe, rand::random_bool(vip_chance))?;
    }

    if opts.auto {
        kitchen.toggle_auto_mode();
    } else {
        for order in kitchen.queue() {
            kitchen.dispatch(order.id())?;
        }
    }

    if opts.rush_hour {
        kitchen.trigger_contention_scenario()?;
    }

    let mut ticker = interval(Duration::from_millis(opts.report_ms.max(1)));
    let deadline = sleep(Duration::from_secs(opts.run_secs));
    tokio::pin!(deadline);
    loop {
        tokio::select! {
            _ = ticker.tick() => report(&kitchen.snapshot()),
            _ = &mut deadline => break,
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    error!("failed to listen for ctrl_c: {}", e);
                }
                break;
            }
        }
    }

    kitchen.shutdown();
    let snapshot = kitchen.snapshot();
    if opts.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        report(&snapshot);
        for event in &snapshot.events {
            println!("{:>7}ms  {}", event.at_ms, event.message);
        }
    }

    Ok(())
}
