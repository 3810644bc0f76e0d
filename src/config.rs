// ===============================
// src/config.rs
// ===============================
use std::env;

use dotenvy::dotenv;

use crate::quoter::QuoterParams;
use crate::venue::{FeeSchedule, VenueId, VenueMetrics};

/// Market data source for the driver
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedMode {
    Mock,
    Replay,
}

impl FeedMode {
    pub fn from_env(key: &str, default_mode: FeedMode) -> FeedMode {
        match env::var(key).unwrap_or_default().to_ascii_lowercase().as_str() {
            "mock" => FeedMode::Mock,
            "replay" => FeedMode::Replay,
            _ => default_mode,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedMode::Mock => "mock",
            FeedMode::Replay => "replay",
        }
    }
}

/// Static per-venue configuration used to build the simulated venue set.
#[derive(Clone, Debug)]
pub struct VenueSpec {
    pub id: VenueId,
    pub name: &'static str,
    pub fees: FeeSchedule,
    pub metrics: VenueMetrics,
}

/// Default venue table: four majors with indicative fee/latency profiles.
pub fn venue_specs() -> Vec<VenueSpec> {
    vec![
        VenueSpec {
            id: VenueId::Binance,
            name: "Binance",
            fees: FeeSchedule { maker_rate: 0.0010, taker_rate: 0.0015 },
            metrics: VenueMetrics { avg_latency_ms: 5, fill_rate: 0.97, uptime: 0.999 },
        },
        VenueSpec {
            id: VenueId::Coinbase,
            name: "Coinbase",
            fees: FeeSchedule { maker_rate: 0.0015, taker_rate: 0.0025 },
            metrics: VenueMetrics { avg_latency_ms: 10, fill_rate: 0.95, uptime: 0.998 },
        },
        VenueSpec {
            id: VenueId::Kraken,
            name: "Kraken",
            fees: FeeSchedule { maker_rate: 0.0016, taker_rate: 0.0026 },
            metrics: VenueMetrics { avg_latency_ms: 15, fill_rate: 0.94, uptime: 0.997 },
        },
        VenueSpec {
            id: VenueId::Ftx,
            name: "FTX",
            fees: FeeSchedule { maker_rate: 0.0010, taker_rate: 0.0020 },
            metrics: VenueMetrics { avg_latency_ms: 8, fill_rate: 0.96, uptime: 0.995 },
        },
    ]
}

#[derive(Clone, Debug)]
pub struct Args {
    pub symbol: String,

    // files/metrics
    pub record_file: Option<String>,
    pub record_flush_ms: u64,
    pub record_batch_events: usize,
    pub metrics_port: u16,

    // feed
    pub feed_mode: FeedMode,
    pub replay_file: Option<String>,
    pub fix_bootstrap: Option<String>,

    // router / quoter toggles
    pub consider_fees: bool,
    pub consider_latency: bool,
    pub adaptive_quoter: bool,
    pub disabled_venues: Vec<VenueId>,

    // backtest
    pub initial_base_inventory: f64,
    pub initial_quote_inventory: f64,
    pub market_impact_factor: f64,
    pub base_latency_us: f64,
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(default)
}

pub fn load() -> (Args, QuoterParams) {
    // Make sure .env is read (RECORD_FILE, REPLAY_FILE, etc.)
    let _ = dotenv();

    let symbol = env::var("SYMBOL").unwrap_or_else(|_| "BTCUSD".to_string());

    let record_file = env::var("RECORD_FILE").ok();
    let record_flush_ms = env::var("RECORD_FLUSH_MS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(1_000);
    let record_batch_events = env::var("RECORD_BATCH_EVENTS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(256);
    let metrics_port = env::var("METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(9898);

    let feed_mode = FeedMode::from_env("FEED_MODE", FeedMode::Mock);
    let replay_file = env::var("REPLAY_FILE").ok();
    let fix_bootstrap = env::var("FIX_BOOTSTRAP").ok();

    let args = Args {
        symbol,
        record_file,
        record_flush_ms,
        record_batch_events,
        metrics_port,
        feed_mode,
        replay_file,
        fix_bootstrap,
        consider_fees: env_bool("CONSIDER_FEES", true),
        consider_latency: env_bool("CONSIDER_LATENCY", true),
        adaptive_quoter: env_bool("ADAPTIVE_QUOTER", false),
        // DISABLED_VENUES=Kraken,FTX
        disabled_venues: env::var("DISABLED_VENUES")
            .map(|s| s.split(',').filter_map(VenueId::parse_one).collect())
            .unwrap_or_default(),
        initial_base_inventory: env_f64("INITIAL_BASE_INVENTORY", 1.0),
        initial_quote_inventory: env_f64("INITIAL_QUOTE_INVENTORY", 10_000.0),
        market_impact_factor: env_f64("MARKET_IMPACT_FACTOR", 0.0001),
        base_latency_us: env_f64("BASE_LATENCY_US", 100.0),
    };

    // Quoter parameters, all overridable per key
    let defaults = QuoterParams::default();
    let params = QuoterParams {
        base_spread_bps: env_f64("BASE_SPREAD_BPS", defaults.base_spread_bps),
        min_spread_bps: env_f64("MIN_SPREAD_BPS", defaults.min_spread_bps),
        max_spread_bps: env_f64("MAX_SPREAD_BPS", defaults.max_spread_bps),
        max_base_inventory: env_f64("MAX_BASE_INVENTORY", defaults.max_base_inventory),
        max_quote_inventory: env_f64("MAX_QUOTE_INVENTORY", defaults.max_quote_inventory),
        target_base_inventory: env_f64("TARGET_BASE_INVENTORY", defaults.target_base_inventory),
        inventory_skew_factor: env_f64("INVENTORY_SKEW_FACTOR", defaults.inventory_skew_factor),
        volatility_adjustment: env_f64("VOLATILITY_ADJUSTMENT", defaults.volatility_adjustment),
        base_quote_size: env_f64("BASE_QUOTE_SIZE", defaults.base_quote_size),
        min_quote_size: env_f64("MIN_QUOTE_SIZE", defaults.min_quote_size),
        max_quote_size: env_f64("MAX_QUOTE_SIZE", defaults.max_quote_size),
    };

    (args, params)
}
