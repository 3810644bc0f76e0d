// ===============================
// src/posttrade.rs
// ===============================
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::domain::{Side, TradeRecord};
use crate::fix;

/// Post-trade task: log every simulated fill and emit a FIX drop-copy of the
/// executed order at debug level.
pub async fn run(mut fill_rx: mpsc::Receiver<TradeRecord>) {
    while let Some(tr) = fill_rx.recv().await {
        match tr.side {
            Side::Buy => info!(
                trade_id = tr.trade_id,
                px = tr.price,
                qty = tr.quantity,
                fee = tr.fee,
                slippage = tr.slippage,
                "FILLED BUY"
            ),
            Side::Sell => info!(
                trade_id = tr.trade_id,
                px = tr.price,
                qty = tr.quantity,
                fee = tr.fee,
                slippage = tr.slippage,
                "FILLED SELL"
            ),
        }

        let drop_copy = fix::new_order_single(
            &tr.trade_id.to_string(),
            &tr.symbol,
            tr.side,
            (tr.quantity * 100.0).round() as u32,
            tr.price,
        );
        debug!(fix = %drop_copy.replace('\x01', "|"), "drop-copy");
    }
}
