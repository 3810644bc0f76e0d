// ===============================
// src/domain.rs
// ===============================
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side { Buy, Sell }
impl Side {
    pub fn sign(&self) -> f64 { match self { Side::Buy => 1.0, Side::Sell => -1.0 } }
}

/// One market update as consumed from the feed (mock or CSV replay).
/// `signal_position` is the optional trailing column of signal-annotated files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketUpdate {
    pub ts_ms: i64,
    pub symbol: String,
    pub bid: f64,
    pub ask: f64,
    pub bid_size: f64,
    pub ask_size: f64,
    pub last_price: f64,
    pub volume: f64,
    pub signal_position: Option<f64>,
}

/// Per-fill record emitted by the backtest driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub ts_ms: i64,
    pub symbol: String,
    pub trade_id: u64,
    pub side: Side,
    pub price: f64,
    pub quantity: f64, // base units
    pub buy_order_id: i64,
    pub sell_order_id: i64, // -1 marks the anonymous market side
    pub fee: f64,
    pub slippage: f64,
    pub latency_us: i64,
}

/// Periodic quoter/portfolio state record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateRecord {
    pub ts_ms: i64,
    pub base_inv: f64,
    pub quote_inv: f64,
    pub total_pnl: f64,
    pub realized_pnl: f64,
    pub unrealized_pnl: f64,
    pub sharpe: f64,
    pub max_drawdown: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event { Md(MarketUpdate), Fill(TradeRecord), State(StateRecord), Note(String) }
