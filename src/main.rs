// ===============================
// src/main.rs
// ===============================
/*
=============================================================================
Project : mm_bot_rust — crypto market-making simulation stack in Rust
Version : 0.5.0
License : MIT (see LICENSE)

Summary : Streams market data (mock random walk or CSV replay), maintains
          per-venue limit order books with price-time matching, routes
          through a fee/latency-aware smart order router, quotes two-sided
          with inventory skew and risk limits, simulates fills, tracks
          PnL/sharpe/drawdown, exposes Prometheus metrics, and records
          JSONL events.
=============================================================================
*/
mod domain;
mod config;
mod metrics;
mod recorder;
mod book;      // limit order book + matching engine
mod venue;     // venue capability + simulated venues
mod router;    // smart order router (SOR)
mod quoter;    // inventory-aware quoting engine
mod fix;       // FIX 4.4 tag-value codec
mod feed;      // market data adapters (mock / CSV replay)
mod backtest;  // simulation driver
mod posttrade;

use tokio::{
    select,
    sync::{broadcast, mpsc},
    time::Duration,
};
use tracing::{error, info};

use crate::domain::{Event, MarketUpdate, TradeRecord};

#[tokio::main]
async fn main() {
    // ---- Logging ----
    tracing_subscriber::fmt().with_env_filter("info").init();

    // ---- Load config ----
    let (args, params) = config::load();
    let venues = config::venue_specs();

    // ---- Metrics ----
    metrics::init();
    tokio::spawn(metrics::serve_metrics(args.metrics_port));

    info!(
        symbol = %args.symbol,
        feed_mode = %args.feed_mode.as_str(),
        venues = venues.len(),
        consider_fees = args.consider_fees,
        consider_latency = args.consider_latency,
        adaptive_quoter = args.adaptive_quoter,
        "startup config"
    );

    // ---- Buses ----
    let (md_tx, _md_rx) = broadcast::channel::<MarketUpdate>(4096);
    let (rec_tx, rec_rx) = mpsc::channel::<Event>(8192);
    let (fill_tx, fill_rx) = mpsc::channel::<TradeRecord>(2048);

    // ---- Recorder (optional) ----
    if let Some(path) = args.record_file.clone() {
        let rec_cfg = recorder::RecorderCfg {
            path,
            flush_ms: args.record_flush_ms,
            batch_events: args.record_batch_events,
        };
        tokio::spawn(recorder::run(rec_rx, rec_cfg));
    } else {
        // Drain so senders never block on an unused bus
        tokio::spawn(async move {
            let mut rx = rec_rx;
            while rx.recv().await.is_some() {}
        });
    }

    // ---- FEED (Market Data) ----
    match args.feed_mode {
        config::FeedMode::Mock => {
            tokio::spawn(feed::run_mock(md_tx.clone(), args.symbol.clone()));
        }
        config::FeedMode::Replay => {
            let Some(path) = args.replay_file.clone() else {
                error!("FEED_MODE=replay requires REPLAY_FILE");
                return;
            };
            tokio::spawn(feed::run_replay(md_tx.clone(), path, 1));
        }
    }

    // ---- FIX order journal (optional bootstrap) ----
    let fix_journal = match &args.fix_bootstrap {
        Some(path) => match tokio::fs::read_to_string(path).await {
            Ok(raw) => Some(raw),
            Err(e) => {
                error!(?e, %path, "fix bootstrap read failed, ignored");
                None
            }
        },
        None => None,
    };

    // ---- Backtest driver: books -> SOR -> quoter -> fills ----
    let bt_cfg = backtest::BacktestCfg {
        symbol: args.symbol.clone(),
        venues,
        router: router::RouterCfg {
            consider_fees: args.consider_fees,
            consider_latency: args.consider_latency,
        },
        params,
        adaptive_quoter: args.adaptive_quoter,
        disabled_venues: args.disabled_venues.clone(),
        initial_base_inventory: args.initial_base_inventory,
        initial_quote_inventory: args.initial_quote_inventory,
        market_impact_factor: args.market_impact_factor,
        base_latency_us: args.base_latency_us,
    };
    tokio::spawn(backtest::run(
        bt_cfg,
        fix_journal,
        md_tx.subscribe(),
        rec_tx.clone(),
        fill_tx,
    ));

    // ---- Post-Trade ----
    tokio::spawn(posttrade::run(fill_rx));

    // ---- Heartbeat + record MD ----
    let mut md_rx_main = md_tx.subscribe();
    let mut tick_count: u64 = 0;

    loop {
        select! {
            Ok(upd) = md_rx_main.recv() => {
                tick_count += 1;
                let _ = rec_tx.try_send(Event::Md(upd));
            },
            _ = tokio::time::sleep(Duration::from_secs(1)) => {
                info!(ticks = tick_count, "heartbeat");
                tick_count = 0;
            }
        }
    }
}
