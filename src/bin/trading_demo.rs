//! Simulated live-trading run
//!
//! Submits a few orders against the order simulator on a tokio runtime, cancels one,
//! and prints notifications as they arrive.
//!
//! Usage: cargo run --bin trading_demo -- [--config sim.json] [--seed 42]

use anyhow::{Context, Result};
use clap::Parser;
use invest_core::orders::{
    CallbackListener, Notification, Order, OrderAction, OrderSimulator, OrderStatus, RandomSource,
    RngSource, SimulatorConfig, TokioClock,
};
use invest_core::session::{JsonFileStore, Session};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

#[derive(Debug, Parser)]
#[command(name = "trading_demo", about = "Run the simulated order lifecycle")]
struct Args {
    /// JSON simulator config; missing fields use the defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for reproducible outcomes
    #[arg(long)]
    seed: Option<u64>,

    /// Directory used to persist the order list
    #[arg(long)]
    session_dir: Option<PathBuf>,
}

enum Event {
    Resolved(Order),
    Notified(Notification),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SimulatorConfig::from_json_path(path)
            .with_context(|| format!("Failed to load simulator config from {:?}", path))?,
        None => SimulatorConfig::default(),
    };
    let random: Arc<dyn RandomSource> = match args.seed {
        Some(seed) => Arc::new(RngSource::seeded(seed)),
        None => Arc::new(RngSource::new()),
    };
    let mut session = match &args.session_dir {
        Some(dir) => Session::load_from(&JsonFileStore::open(dir)?)?,
        None => Session::new(),
    };

    // Continue numbering after orders saved by earlier runs
    let clock = Arc::new(TokioClock::new(Handle::current()));
    let simulator = OrderSimulator::with_first_id(config, clock, random, session.next_order_id())?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let notify_tx = tx.clone();
    simulator.add_listener(Arc::new(CallbackListener::new(
        move |order| {
            let _ = tx.send(Event::Resolved(order.clone()));
        },
        move |notification| {
            let _ = notify_tx.send(Event::Notified(notification.clone()));
        },
    )));

    let drafts = [
        ("RELIANCE", OrderAction::Buy, 10, 2450.0),
        ("TCS", OrderAction::Sell, 5, 3520.5),
        ("INFY", OrderAction::Buy, 20, 1480.25),
        ("HDFCBANK", OrderAction::Buy, 8, 1625.0),
    ];

    let mut placed = Vec::new();
    for (symbol, action, quantity, price) in drafts {
        let order = simulator.place(symbol, action, quantity, price)?;
        println!(
            "Placed {} {} {} {} @ {:.2}",
            order.id(), order.action(), order.quantity(), order.symbol(), order.requested_price()
        );
        session.upsert_order(order.clone());
        placed.push(order);
    }

    // Change of heart on the last order; with very short delays it may already be settled
    let mut outstanding = placed.len();
    if let Some(last) = placed.last() {
        match simulator.cancel(last.id()) {
            Ok(cancelled) => {
                println!("Cancelled {} ({})", cancelled.id(), cancelled.symbol());
                session.upsert_order(cancelled);
                outstanding -= 1;
            }
            Err(e) => println!("Could not cancel {}: {}", last.id(), e),
        }
    }

    // Each automatic resolution ends with exactly one notification
    while outstanding > 0 {
        match rx.recv().await {
            Some(Event::Resolved(order)) => session.upsert_order(order),
            Some(Event::Notified(notification)) => {
                let marker = if notification.is_success() { "OK " } else { "ERR" };
                println!("[{}] {}", marker, notification.message());
                outstanding -= 1;
            }
            None => break,
        }
    }

    println!("\nOrder Book:");
    println!(
        "{:>10} {:>10} {:>5} {:>5} {:>10} {:>10} {}",
        "Id", "Symbol", "Side", "Qty", "Requested", "Executed", "Status"
    );
    println!("{}", "-".repeat(72));
    for order in simulator.orders() {
        let executed = order
            .executed_price()
            .map(|price| format!("{:.2}", price))
            .unwrap_or_else(|| "-".to_string());
        let status = match (order.status(), order.rejection_reason()) {
            (OrderStatus::Rejected, Some(reason)) => format!("{} ({})", order.status(), reason),
            _ => order.status().to_string(),
        };
        println!(
            "{:>10} {:>10} {:>5} {:>5} {:>10.2} {:>10} {}",
            order.id().to_string(),
            order.symbol(),
            order.action().to_string(),
            order.quantity(),
            order.requested_price(),
            executed,
            status
        );
    }

    if let Some(dir) = &args.session_dir {
        session.save_to(&JsonFileStore::open(dir)?)?;
        println!("\nSession saved to: {:?}", dir);
    }

    Ok(())
}
