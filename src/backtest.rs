// ===============================
// src/backtest.rs (simulation driver)
// ===============================
//
// Drives the core pipeline per market update:
//   seed venue books -> quoter cycle -> crossing quotes fill -> on_fill ->
//   risk check -> pnl/sharpe/drawdown -> trade + state records.
// Fills are simulated against the update's touch with market impact and a
// jittered latency; the quoter never learns it is being simulated.
//
use rand::Rng;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, trace, warn};

use crate::book::Book;
use crate::config::VenueSpec;
use crate::domain::{Event, MarketUpdate, Side, StateRecord, TradeRecord};
use crate::fix::{self, MsgType};
use crate::metrics::{FILLS, PNL_TOTAL, RISK_BREACHES};
use crate::quoter::{Quote, QuotePair, Quoter, QuoterParams};
use crate::router::{Router, RouterCfg};
use crate::venue::{SimVenue, VenueId};

// Synthetic depth: 5 levels, 50-cent spacing, 70% size decay per level.
const DEPTH_LEVELS: usize = 5;
const DEPTH_DECAY: f64 = 0.7;
const LEVEL_STEP: f64 = 0.50;

// Reserved order-id ranges for seeded depth (books are rebuilt per update).
const BID_SEED_ID: u64 = 1_000;
const ASK_SEED_ID: u64 = 2_000;

#[derive(Clone, Debug)]
pub struct BacktestCfg {
    pub symbol: String,
    pub venues: Vec<VenueSpec>,
    pub router: RouterCfg,
    pub params: QuoterParams,
    pub adaptive_quoter: bool,
    pub disabled_venues: Vec<VenueId>,
    pub initial_base_inventory: f64,
    pub initial_quote_inventory: f64,
    pub market_impact_factor: f64,
    pub base_latency_us: f64,
}

pub struct Backtester {
    cfg: BacktestCfg,
    sor: Router,
    quoter: Quoter,
    // Quotes from the previous cycle, live against the next update.
    live: Option<QuotePair>,
    next_order_id: i64,
    next_trade_id: u64,
    pnl_curve: Vec<f64>,
    pnl_peak: f64,
    max_drawdown: f64,
    sharpe: f64,
}

impl Backtester {
    pub fn new(cfg: BacktestCfg) -> Self {
        let mut sor = Router::new(cfg.router);
        for spec in &cfg.venues {
            sor.add_venue(Box::new(SimVenue::new(spec.id, spec.name, spec.metrics)), spec.fees);
        }
        for id in &cfg.disabled_venues {
            sor.set_active(*id, false);
        }

        let mut quoter = Quoter::new(cfg.params.clone());
        quoter.set_adaptive(cfg.adaptive_quoter);
        quoter.initialize(cfg.initial_base_inventory, cfg.initial_quote_inventory);
        info!(symbol = %cfg.symbol, venues = cfg.venues.len(), "backtester ready");

        Backtester {
            cfg,
            sor,
            quoter,
            live: None,
            next_order_id: 1_000_000,
            next_trade_id: 0,
            pnl_curve: Vec::new(),
            pnl_peak: 0.0,
            max_drawdown: 0.0,
            sharpe: 0.0,
        }
    }

    /// Replay a FIX order journal through the first venue's book: 35=D adds,
    /// 35=F cancels by OrigClOrdID. ClOrdID must be numeric. Runs before any
    /// market update; the resulting resting state is overwritten once depth
    /// seeding starts.
    pub fn apply_fix_journal(&mut self, raw: &str) -> Vec<Event> {
        let mut events = Vec::new();
        let Some(book) = self.sor.books_mut().next() else { return events };

        for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
            // Lines carrying a checksum trailer must pass it.
            if let Some(idx) = line.rfind("10=") {
                let (covered, trailer) = line.split_at(idx);
                let cs = trailer.trim_start_matches("10=").trim_end_matches('\x01');
                if !fix::validate_checksum(covered, cs) {
                    warn!(%line, "fix journal: bad checksum, skipped");
                    continue;
                }
            }
            let msg = fix::parse(line);
            match msg.msg_type {
                MsgType::NewOrderSingle => {
                    let (Some(id), Some(price), Some(qty)) = (
                        msg.cl_ord_id().and_then(|s| s.parse::<u64>().ok()),
                        msg.price(),
                        msg.quantity(),
                    ) else {
                        warn!(%line, "fix journal: incomplete NewOrderSingle, skipped");
                        continue;
                    };
                    let side = if msg.is_buy() { Side::Buy } else { Side::Sell };
                    match book.add(id, price, qty, side) {
                        Ok(trades) => {
                            for t in &trades {
                                events.push(Event::Note(format!(
                                    "fix journal trade #{}: {} @ {} (buy {}, sell {})",
                                    t.trade_id, t.quantity, t.price, t.buy_order_id, t.sell_order_id
                                )));
                            }
                            if let Some(rem) = book.remaining_qty(id) {
                                debug!(id, rem, "fix journal: order resting");
                            }
                        }
                        Err(e) => warn!(%line, ?e, "fix journal: order rejected"),
                    }
                }
                MsgType::OrderCancelRequest => {
                    let cancelled = msg
                        .get(fix::tags::ORIG_CL_ORD_ID)
                        .and_then(|s| s.parse::<u64>().ok())
                        .map(|id| book.cancel(id))
                        .unwrap_or(false);
                    if !cancelled {
                        warn!(%line, "fix journal: cancel had no effect");
                    }
                }
                MsgType::Unknown => warn!(%line, "fix journal: unknown message type, skipped"),
            }
        }
        events
    }

    // Rebuild every venue book from the update's touch with synthetic depth.
    // Sizes arrive in base units and are stored as smallest-unit lots (x100),
    // the unit the book and router speak.
    fn seed_depth(&mut self, upd: &MarketUpdate) {
        for book in self.sor.books_mut() {
            *book = Book::new();
            for i in 0..DEPTH_LEVELS {
                let decay = DEPTH_DECAY.powi(i as i32);
                let bid_px = upd.bid - i as f64 * LEVEL_STEP;
                let ask_px = upd.ask + i as f64 * LEVEL_STEP;
                let bid_qty = (upd.bid_size * decay * 100.0).round() as u32;
                let ask_qty = (upd.ask_size * decay * 100.0).round() as u32;
                if bid_px > 0.0 && bid_qty > 0 {
                    let _ = book.add(BID_SEED_ID + i as u64, bid_px, bid_qty, Side::Buy);
                }
                if ask_qty > 0 {
                    let _ = book.add(ASK_SEED_ID + i as u64, ask_px, ask_qty, Side::Sell);
                }
            }
        }
    }

    fn simulate_fill(&mut self, upd: &MarketUpdate, quote: &Quote) -> TradeRecord {
        let qty_base = quote.size as f64 / 100.0;
        let touch = match quote.side {
            Side::Buy => upd.ask,
            Side::Sell => upd.bid,
        };

        // Market impact moves the execution against us; latency is jittered
        // around the configured base.
        let impact = qty_base * self.cfg.market_impact_factor;
        let (price, slippage) = match quote.side {
            Side::Buy => (touch * (1.0 + impact), touch * impact),
            Side::Sell => (touch * (1.0 - impact), touch * impact),
        };
        let latency_us =
            (self.cfg.base_latency_us * (1.0 + rand::thread_rng().gen_range(0.0..0.2))) as i64;

        let taker_rate = self
            .cfg
            .venues
            .iter()
            .find(|v| v.id == quote.venue)
            .map(|v| v.fees.taker_rate)
            .unwrap_or(0.0015);
        let fee = price * qty_base * taker_rate;

        self.quoter.on_fill(quote, price, quote.size);
        FILLS
            .with_label_values(&[
                match quote.side { Side::Buy => "buy", Side::Sell => "sell" },
                &quote.venue.to_string(),
            ])
            .inc();

        self.next_order_id += 1;
        self.next_trade_id += 1;
        let (buy_order_id, sell_order_id) = match quote.side {
            Side::Buy => (self.next_order_id, -1),
            Side::Sell => (-1, self.next_order_id),
        };

        TradeRecord {
            ts_ms: upd.ts_ms,
            symbol: upd.symbol.clone(),
            trade_id: self.next_trade_id,
            side: quote.side,
            price,
            quantity: qty_base,
            buy_order_id,
            sell_order_id,
            fee,
            slippage,
            latency_us,
        }
    }

    fn update_performance(&mut self, ts_ms: i64) -> StateRecord {
        let pos = self.quoter.inventory();
        let total_pnl = pos.pnl;
        self.pnl_curve.push(total_pnl);
        PNL_TOTAL.set(total_pnl);

        if total_pnl > self.pnl_peak {
            self.pnl_peak = total_pnl;
        }
        if self.pnl_peak > 0.0 {
            let drawdown = (self.pnl_peak - total_pnl) / self.pnl_peak;
            if drawdown > self.max_drawdown {
                self.max_drawdown = drawdown;
            }
        }

        if self.pnl_curve.len() > 2 {
            let returns: Vec<f64> =
                self.pnl_curve.windows(2).map(|w| w[1] - w[0]).collect();
            let mean = returns.iter().sum::<f64>() / returns.len() as f64;
            let variance =
                returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / returns.len() as f64;
            if variance > 0.0 {
                self.sharpe = mean / variance.sqrt() * (252.0f64).sqrt();
            }
        }

        debug!(
            imbalance = self.quoter.imbalance(),
            base_value = pos.base_value,
            total_value = pos.total_value,
            "marked to mid"
        );

        let realized = self.quoter.realized_pnl();
        StateRecord {
            ts_ms,
            base_inv: pos.base,
            quote_inv: pos.quote,
            total_pnl,
            realized_pnl: realized,
            unrealized_pnl: total_pnl - realized,
            sharpe: self.sharpe,
            max_drawdown: self.max_drawdown,
        }
    }

    /// One full simulation step. Returns the events to record.
    pub fn on_update(&mut self, upd: &MarketUpdate) -> Vec<Event> {
        let mut events = Vec::new();

        // Live quotes from the previous cycle fill when the new market
        // crosses them; anything unfilled is superseded below.
        if let Some(pair) = self.live.take() {
            if pair.bid.size > 0 && pair.bid.price >= upd.ask {
                let record = self.simulate_fill(upd, &pair.bid);
                events.push(Event::Fill(record));
            }
            if pair.ask.size > 0 && pair.ask.price <= upd.bid {
                let record = self.simulate_fill(upd, &pair.ask);
                events.push(Event::Fill(record));
            }
        }

        self.seed_depth(upd);
        self.live = Some(self.quoter.update_quotes(&self.sor));
        if self.cfg.adaptive_quoter {
            trace!(regime = ?self.quoter.regime(), "quoting regime");
        }

        if !self.quoter.within_risk_limits() {
            RISK_BREACHES.inc();
            self.quoter.adjust_for_risk();

            // Advisory unwind plan for the operator: where excess inventory
            // could be worked off across venues, top-of-book sized.
            let excess = self.quoter.inventory().base - self.cfg.params.target_base_inventory;
            if excess > 0.0 {
                self.next_order_id += 1;
                let pieces = self.sor.route_split(
                    self.next_order_id as u64,
                    upd.bid,
                    (excess * 100.0).round() as u32,
                    Side::Sell,
                );
                for piece in &pieces {
                    events.push(Event::Note(format!(
                        "risk unwind plan: sell {} on {} near {} (est fee {:.4})",
                        piece.quantity, piece.venue, piece.expected_price, piece.expected_fee
                    )));
                }
            }
        }

        events.push(Event::State(self.update_performance(upd.ts_ms)));
        events
    }

    pub fn quoter(&self) -> &Quoter {
        &self.quoter
    }
}

/// Task wrapper: consume market updates, forward fill and state events.
pub async fn run(
    cfg: BacktestCfg,
    fix_journal: Option<String>,
    mut md_rx: broadcast::Receiver<MarketUpdate>,
    rec_tx: mpsc::Sender<Event>,
    fill_tx: mpsc::Sender<TradeRecord>,
) {
    let mut bt = Backtester::new(cfg);

    if let Some(raw) = fix_journal {
        for ev in bt.apply_fix_journal(&raw) {
            let _ = rec_tx.try_send(ev);
        }
    }

    loop {
        match md_rx.recv().await {
            Ok(upd) => {
                for ev in bt.on_update(&upd) {
                    if let Event::Fill(record) = &ev {
                        let _ = fill_tx.send(record.clone()).await;
                    }
                    let _ = rec_tx.try_send(ev);
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(missed = n, "backtest lagging behind the feed");
            }
            Err(broadcast::error::RecvError::Closed) => {
                let pos = bt.quoter().inventory();
                info!(
                    base = pos.base,
                    quote = pos.quote,
                    pnl = pos.pnl,
                    fill_rate = bt.quoter().fill_rate(),
                    volume = bt.quoter().total_volume() / 100.0,
                    "feed closed, final state"
                );
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::venue_specs;

    fn test_cfg() -> BacktestCfg {
        BacktestCfg {
            symbol: "BTCUSD".to_string(),
            venues: venue_specs(),
            router: RouterCfg { consider_fees: true, consider_latency: true },
            params: QuoterParams { target_base_inventory: 1.0, ..QuoterParams::default() },
            adaptive_quoter: false,
            disabled_venues: Vec::new(),
            initial_base_inventory: 1.0,
            initial_quote_inventory: 10_000.0,
            market_impact_factor: 0.0001,
            base_latency_us: 100.0,
        }
    }

    fn update(bid: f64, ask: f64) -> MarketUpdate {
        MarketUpdate {
            ts_ms: 1_700_000_000_000,
            symbol: "BTCUSD".to_string(),
            bid,
            ask,
            bid_size: 2.0,
            ask_size: 2.0,
            last_price: (bid + ask) / 2.0,
            volume: 0.0,
            signal_position: None,
        }
    }

    #[test]
    fn passive_quotes_do_not_fill() {
        let mut bt = Backtester::new(test_cfg());
        // Wide market, tight default spread: quotes stay inside the touch.
        let events = bt.on_update(&update(44_000.0, 46_000.0));
        assert!(events.iter().all(|e| !matches!(e, Event::Fill(_))));
        assert_eq!(bt.quoter().inventory().base, 1.0);
    }

    #[test]
    fn crossing_quote_fills_and_moves_inventory() {
        let cfg = test_cfg();
        let mut bt = Backtester::new(cfg);
        // Establish a midpoint around 45000 first.
        bt.on_update(&update(44_990.0, 45_010.0));
        // Market gaps down: our resting-style bid is now above the ask.
        let events = bt.on_update(&update(44_000.0, 44_900.0));
        let fills: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::Fill(record) => Some(record),
                _ => None,
            })
            .collect();
        assert_eq!(fills.len(), 1);
        assert_eq!(fills[0].side, Side::Buy);
        assert!(fills[0].price >= 44_900.0); // touch plus impact
        assert!(fills[0].fee > 0.0);
        assert!(bt.quoter().inventory().base > 1.0);
    }

    #[test]
    fn state_record_follows_every_update() {
        let mut bt = Backtester::new(test_cfg());
        let events = bt.on_update(&update(44_990.0, 45_010.0));
        let state = events.iter().rev().find_map(|e| match e {
            Event::State(s) => Some(s),
            _ => None,
        });
        let state = state.expect("state record present");
        assert_eq!(state.base_inv, 1.0);
        assert_eq!(state.quote_inv, 10_000.0);
        assert_eq!(state.total_pnl, 0.0);
    }

    #[test]
    fn disabled_venues_never_win_routing() {
        let mut cfg = test_cfg();
        cfg.router = RouterCfg { consider_fees: false, consider_latency: false };
        // Only Kraken left standing.
        cfg.disabled_venues =
            vec![VenueId::Binance, VenueId::Coinbase, VenueId::Ftx];
        let mut bt = Backtester::new(cfg);
        bt.on_update(&update(44_990.0, 45_010.0));
        let pair = bt.live.as_ref().expect("live quotes");
        assert_eq!(pair.bid.venue, VenueId::Kraken);
        assert_eq!(pair.ask.venue, VenueId::Kraken);
    }

    #[test]
    fn corrupted_journal_lines_are_rejected() {
        let mut bt = Backtester::new(test_cfg());
        let good = fix::new_order_single("1", "BTCUSD", Side::Buy, 10, 44_000.0);
        let tampered = good.replace("38=10", "38=99");
        let events = bt.apply_fix_journal(&tampered);
        assert!(events.is_empty());
        // The order never reached the book, so a crossing sell just rests.
        let sweep = fix::new_order_single("2", "BTCUSD", Side::Sell, 10, 43_000.0);
        assert!(bt.apply_fix_journal(&sweep).is_empty());
    }

    #[test]
    fn fix_journal_replays_through_the_book() {
        let mut bt = Backtester::new(test_cfg());
        let journal = [
            fix::new_order_single("1", "BTCUSD", Side::Buy, 10, 44_000.0),
            fix::new_order_single("2", "BTCUSD", Side::Sell, 4, 44_000.0),
            fix::order_cancel_request("3", "1", "BTCUSD", Side::Buy, 10),
        ]
        .join("\n");
        let events = bt.apply_fix_journal(&journal);
        // The sell crossed the resting buy before the cancel.
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], Event::Note(n) if n.contains("trade #1")));
    }
}
