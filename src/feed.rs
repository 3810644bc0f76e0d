// ===============================
// src/feed.rs
// ===============================
//
// Market Data adapters:
// - run_mock   : random-walk two-sided quote generator (~200 updates/s)
// - run_replay : CSV replay of recorded market updates
//                timestamp,symbol,bid,ask,bid_size,ask_size,last_price,volume[,signal_position]
//
// Parsing lives here; the core only ever sees structured MarketUpdate values.
//
use chrono::Utc;
use rand::Rng;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::domain::MarketUpdate;
use crate::metrics::TICKS;

/// Mock market data generator (random walk) ~200 updates/s
pub async fn run_mock(md_tx: broadcast::Sender<MarketUpdate>, symbol: String) {
    let mut mid: f64 = 45_000.0;
    let mut volume: f64 = 0.0;
    loop {
        // don't hold ThreadRng across .await
        let (step, half_spread, bid_size, ask_size, traded) = {
            let mut rng = rand::thread_rng();
            (
                rng.gen_range(-5.0..=5.0),
                rng.gen_range(0.25..=1.25),
                rng.gen_range(0.5..=5.0),
                rng.gen_range(0.5..=5.0),
                rng.gen_range(0.0..=0.2),
            )
        };
        mid = (mid + step).max(1_000.0);
        volume += traded;
        let update = MarketUpdate {
            ts_ms: Utc::now().timestamp_millis(),
            symbol: symbol.clone(),
            bid: round2(mid - half_spread),
            ask: round2(mid + half_spread),
            bid_size,
            ask_size,
            last_price: round2(mid),
            volume,
            signal_position: None,
        };
        let _ = md_tx.send(update);
        TICKS.inc();
        sleep(Duration::from_millis(5)).await; // ~200 updates/s
    }
}

fn round2(px: f64) -> f64 {
    (px * 100.0).round() / 100.0
}

/// Parse one CSV line into a MarketUpdate. Returns None on malformed input.
pub fn parse_line(line: &str) -> Option<MarketUpdate> {
    let mut fields = line.split(',').map(str::trim);
    let ts_ms = fields.next()?.parse().ok()?;
    let symbol = fields.next()?.to_string();
    let bid = fields.next()?.parse().ok()?;
    let ask = fields.next()?.parse().ok()?;
    let bid_size = fields.next()?.parse().ok()?;
    let ask_size = fields.next()?.parse().ok()?;
    let last_price = fields.next()?.parse().ok()?;
    let volume = fields.next()?.parse().ok()?;
    let signal_position = fields.next().and_then(|s| s.parse().ok());
    Some(MarketUpdate {
        ts_ms,
        symbol,
        bid,
        ask,
        bid_size,
        ask_size,
        last_price,
        volume,
        signal_position,
    })
}

/// Replay a recorded CSV file. Lines starting with '#' and malformed rows
/// are skipped; pacing is a fixed inter-update delay, not wall-clock.
pub async fn run_replay(md_tx: broadcast::Sender<MarketUpdate>, path: String, pace_ms: u64) {
    let file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) => {
            error!(?e, %path, "replay: open failed");
            return;
        }
    };
    info!(%path, "replay: started");

    let mut lines = BufReader::new(file).lines();
    let mut replayed: u64 = 0;
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_line(&line) {
            Some(update) => {
                let _ = md_tx.send(update);
                TICKS.inc();
                replayed += 1;
            }
            None => warn!(%line, "replay: malformed line, skipped"),
        }
        if pace_ms > 0 {
            sleep(Duration::from_millis(pace_ms)).await;
        }
    }
    info!(replayed, "replay: finished");
}
