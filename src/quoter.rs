// ===============================
// src/quoter.rs (inventory-aware quoting engine)
// ===============================
//
// Produces a two-sided quote each cycle from the SOR's aggregated touch:
// midpoint -> spread (volatility- and inventory-widened, clamped) -> skewed
// bid/ask -> inventory-scaled sizes -> per-side venue via the SOR.
// Sizes are in smallest units (1/100 of the base asset); fills convert back
// at the boundary. Never raises on missing market data: a zeroed pair comes
// back and inventory is untouched.
//
use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::domain::Side;
use crate::metrics::{INV_BASE, INV_QUOTE, PNL_REALIZED, QUOTES, QUOTE_EDGE, SPREAD_BPS};
use crate::router::Router;
use crate::venue::VenueId;

#[derive(Debug, Clone)]
pub struct QuoterParams {
    pub base_spread_bps: f64,
    pub min_spread_bps: f64,
    pub max_spread_bps: f64,

    pub max_base_inventory: f64,
    pub max_quote_inventory: f64,
    pub target_base_inventory: f64,

    pub inventory_skew_factor: f64,
    pub volatility_adjustment: f64,

    // Sizes in base units; quotes carry size * 100 (smallest unit).
    pub base_quote_size: f64,
    pub min_quote_size: f64,
    pub max_quote_size: f64,
}

impl Default for QuoterParams {
    fn default() -> Self {
        QuoterParams {
            base_spread_bps: 10.0,
            min_spread_bps: 5.0,
            max_spread_bps: 50.0,
            max_base_inventory: 10.0,
            max_quote_inventory: 500_000.0,
            target_base_inventory: 5.0,
            inventory_skew_factor: 0.1,
            volatility_adjustment: 1.0,
            base_quote_size: 0.1,
            min_quote_size: 0.01,
            max_quote_size: 1.0,
        }
    }
}

/// One side of a quote cycle. `size` is in smallest units.
#[derive(Debug, Clone)]
pub struct Quote {
    pub price: f64,
    pub size: u32,
    pub side: Side,
    pub venue: VenueId,
}

impl Quote {
    fn zeroed(side: Side) -> Self {
        Quote { price: 0.0, size: 0, side, venue: VenueId::Unknown }
    }
}

#[derive(Debug, Clone)]
pub struct QuotePair {
    pub bid: Quote,
    pub ask: Quote,
    /// (ask - bid) - (buy fee + sell fee): round-trip profit if both fill.
    pub edge: f64,
}

#[derive(Debug, Clone)]
pub struct InventoryPosition {
    pub base: f64,
    pub quote: f64,
    pub base_value: f64,
    pub total_value: f64,
    pub pnl: f64,
}

/// Quoting regime for the adaptive profile. Selection is a pure function of
/// the rolling mean of recent relative spreads and the impact estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Regime { Aggressive, Neutral, Defensive }

impl Regime {
    // Thresholds: tight books (< 5 bps average spread) with little of our
    // own impact let us quote tighter and bigger; wide books (> 20 bps) or a
    // high impact estimate push us defensive.
    pub fn select(avg_spread_bps: f64, impact_estimate: f64) -> Regime {
        if avg_spread_bps > 20.0 || impact_estimate > 0.2 {
            Regime::Defensive
        } else if avg_spread_bps < 5.0 && impact_estimate < 0.05 {
            Regime::Aggressive
        } else {
            Regime::Neutral
        }
    }

    fn multipliers(&self) -> (f64, f64) {
        // (spread scale, size scale)
        match self {
            Regime::Aggressive => (0.8, 1.25),
            Regime::Neutral => (1.0, 1.0),
            Regime::Defensive => (1.5, 0.5),
        }
    }
}

const RECENT_SPREAD_WINDOW: usize = 100;

pub struct Quoter {
    params: QuoterParams,

    base_inventory: f64,
    quote_inventory: f64,
    initial_base: f64,
    initial_quote: f64,

    last_midpoint: f64,
    volatility_estimate: f64,

    quotes_placed: u32,
    quotes_filled: u32,
    total_volume: f64,
    realized_pnl: f64,

    // Adaptive profile state; inert unless enabled.
    adaptive: bool,
    regime: Regime,
    recent_spreads_bps: VecDeque<f64>,
    impact_estimate: f64,
}

impl Quoter {
    pub fn new(params: QuoterParams) -> Self {
        Quoter {
            params,
            base_inventory: 0.0,
            quote_inventory: 0.0,
            initial_base: 0.0,
            initial_quote: 0.0,
            last_midpoint: 0.0,
            volatility_estimate: 0.001,
            quotes_placed: 0,
            quotes_filled: 0,
            total_volume: 0.0,
            realized_pnl: 0.0,
            adaptive: false,
            regime: Regime::Neutral,
            recent_spreads_bps: VecDeque::with_capacity(RECENT_SPREAD_WINDOW),
            impact_estimate: 0.0,
        }
    }

    /// Enable the regime-switching profile. Contract is otherwise identical.
    pub fn set_adaptive(&mut self, adaptive: bool) {
        self.adaptive = adaptive;
    }

    pub fn initialize(&mut self, base_inventory: f64, quote_inventory: f64) {
        self.base_inventory = base_inventory;
        self.quote_inventory = quote_inventory;
        self.initial_base = base_inventory;
        self.initial_quote = quote_inventory;
        debug!(base_inventory, quote_inventory, "quoter initialized");
    }

    // Midpoint from the aggregated touch; one-sided or empty markets fall
    // back to the last good midpoint.
    fn refresh_midpoint(&mut self, sor: &Router) -> f64 {
        let top = sor.aggregated();
        trace!(
            bid = top.best_bid,
            ask = top.best_ask,
            bid_qty = top.bid_qty,
            ask_qty = top.ask_qty,
            bid_venue = %top.best_bid_venue,
            ask_venue = %top.best_ask_venue,
            "aggregated touch"
        );
        if top.best_bid <= 0.0 || !top.best_ask.is_finite() {
            return self.last_midpoint;
        }
        self.last_midpoint = (top.best_bid + top.best_ask) / 2.0;

        // EMA of the relative spread doubles as the volatility proxy.
        let rel_spread = (top.best_ask - top.best_bid) / top.best_bid;
        self.volatility_estimate = self.volatility_estimate * 0.9 + rel_spread * 0.1;

        if self.adaptive {
            if self.recent_spreads_bps.len() == RECENT_SPREAD_WINDOW {
                self.recent_spreads_bps.pop_front();
            }
            self.recent_spreads_bps.push_back(rel_spread * 10_000.0);
        }

        self.last_midpoint
    }

    // Positive when long vs target: push both quotes toward selling.
    fn inventory_skew(&self) -> f64 {
        if self.params.target_base_inventory <= 0.0 {
            return 0.0;
        }
        (self.base_inventory / self.params.target_base_inventory - 1.0) * self.params.inventory_skew_factor
    }

    fn spread_fraction(&self, spread_scale: f64) -> f64 {
        let mut spread_bps = self.params.base_spread_bps * spread_scale;
        spread_bps *= 1.0 + self.volatility_estimate * self.params.volatility_adjustment;
        spread_bps *= 1.0 + self.inventory_skew().abs() * 0.5;
        spread_bps = spread_bps.clamp(self.params.min_spread_bps, self.params.max_spread_bps);
        SPREAD_BPS.set(spread_bps);
        spread_bps / 10_000.0
    }

    fn quote_prices(&self, midpoint: f64, spread: f64) -> (f64, f64) {
        let half = spread / 2.0;
        let skew = self.inventory_skew();
        let bid = midpoint * (1.0 - half - skew * half);
        let ask = midpoint * (1.0 + half + skew * half);
        (bid, ask)
    }

    // Size in smallest units, inventory-scaled and clamped.
    fn quote_size(&self, side: Side, size_scale: f64) -> u32 {
        let mut size = self.params.base_quote_size * size_scale;
        match side {
            Side::Buy => {
                // The longer we are, the less we bid for.
                size *= 1.0 - self.base_inventory / self.params.max_base_inventory * 0.5;
            }
            Side::Sell => {
                // Can only offer what we hold relative to target.
                if self.params.target_base_inventory > 0.0 {
                    size *= (self.base_inventory / self.params.target_base_inventory).min(1.0);
                }
            }
        }
        let qty = (size * 100.0) as u32;
        qty.max((self.params.min_quote_size * 100.0) as u32)
            .min((self.params.max_quote_size * 100.0) as u32)
    }

    fn regime_multipliers(&mut self) -> (f64, f64) {
        if !self.adaptive {
            return (1.0, 1.0);
        }
        let avg = if self.recent_spreads_bps.is_empty() {
            0.0
        } else {
            self.recent_spreads_bps.iter().sum::<f64>() / self.recent_spreads_bps.len() as f64
        };
        let regime = Regime::select(avg, self.impact_estimate);
        if regime != self.regime {
            debug!(?regime, avg_spread_bps = avg, impact = self.impact_estimate, "regime switch");
            self.regime = regime;
        }
        regime.multipliers()
    }

    /// One quoting cycle. Borrows the SOR only for the duration of the call.
    pub fn update_quotes(&mut self, sor: &Router) -> QuotePair {
        let midpoint = self.refresh_midpoint(sor);
        if midpoint <= 0.0 {
            warn!("no midpoint available, quoting suppressed");
            return QuotePair { bid: Quote::zeroed(Side::Buy), ask: Quote::zeroed(Side::Sell), edge: 0.0 };
        }

        let (spread_scale, size_scale) = self.regime_multipliers();
        let spread = self.spread_fraction(spread_scale);
        let (bid_price, ask_price) = self.quote_prices(midpoint, spread);
        let buy_size = self.quote_size(Side::Buy, size_scale);
        let sell_size = self.quote_size(Side::Sell, size_scale);

        self.quotes_placed += 1;
        let buy_routing = sor.route(self.quotes_placed as u64, bid_price, buy_size, Side::Buy);
        self.quotes_placed += 1;
        let sell_routing = sor.route(self.quotes_placed as u64, ask_price, sell_size, Side::Sell);
        QUOTES.inc_by(2);

        let edge = (ask_price - bid_price) - (buy_routing.expected_fee + sell_routing.expected_fee);
        QUOTE_EDGE.set(edge);
        debug!(
            bid = bid_price,
            ask = ask_price,
            buy_venue = %buy_routing.venue,
            buy_maker = buy_routing.is_maker,
            sell_venue = %sell_routing.venue,
            sell_maker = sell_routing.is_maker,
            edge,
            "quote cycle"
        );

        QuotePair {
            bid: Quote { price: bid_price, size: buy_size, side: Side::Buy, venue: buy_routing.venue },
            ask: Quote { price: ask_price, size: sell_size, side: Side::Sell, venue: sell_routing.venue },
            edge,
        }
    }

    /// Apply a fill. `fill_size` is in smallest units and converts to base
    /// at the boundary.
    pub fn on_fill(&mut self, quote: &Quote, fill_price: f64, fill_size: u32) {
        self.quotes_filled += 1;
        self.total_volume += fill_size as f64;

        let size = fill_size as f64 / 100.0;
        let signed = quote.side.sign() * size;
        self.base_inventory += signed;
        self.quote_inventory -= fill_price * signed;

        if self.adaptive {
            // Rough own-impact proxy: how big our fills run vs the book we
            // are allowed to hold.
            let pressure = if self.params.max_base_inventory > 0.0 {
                size / self.params.max_base_inventory
            } else {
                0.0
            };
            self.impact_estimate = self.impact_estimate * 0.9 + pressure * 0.1;
        }

        // Mark both legs to the current midpoint.
        let mid = self.last_midpoint;
        let position_value = self.base_inventory * mid + self.quote_inventory;
        let initial_value = self.initial_base * mid + self.initial_quote;
        self.realized_pnl = position_value - initial_value;

        INV_BASE.set(self.base_inventory);
        INV_QUOTE.set(self.quote_inventory);
        PNL_REALIZED.set(self.realized_pnl);
        debug!(side = ?quote.side, fill_price, size, pnl = self.realized_pnl, "quote filled");
    }

    pub fn inventory(&self) -> InventoryPosition {
        let mid = self.last_midpoint;
        let base_value = self.base_inventory * mid;
        let total_value = base_value + self.quote_inventory;
        let initial_value = self.initial_base * mid + self.initial_quote;
        InventoryPosition {
            base: self.base_inventory,
            quote: self.quote_inventory,
            base_value,
            total_value,
            pnl: total_value - initial_value,
        }
    }

    /// Signed deviation from the inventory target, 0 when no target is set.
    pub fn imbalance(&self) -> f64 {
        if self.params.target_base_inventory <= 0.0 {
            return 0.0;
        }
        (self.base_inventory - self.params.target_base_inventory) / self.params.target_base_inventory
    }

    pub fn fill_rate(&self) -> f64 {
        if self.quotes_placed == 0 {
            return 0.0;
        }
        self.quotes_filled as f64 / self.quotes_placed as f64
    }

    pub fn within_risk_limits(&self) -> bool {
        if self.base_inventory > self.params.max_base_inventory || self.base_inventory < 0.0 {
            return false;
        }
        // Quote currency may dip slightly negative while both legs work.
        if self.quote_inventory > self.params.max_quote_inventory
            || self.quote_inventory < -self.params.max_quote_inventory * 0.1
        {
            return false;
        }
        let position_value = (self.base_inventory * self.last_midpoint).abs();
        let max_position_value = self.params.max_base_inventory * self.last_midpoint;
        position_value <= max_position_value * 1.1
    }

    /// Widen out: 1.5x the base spread, half the base size.
    pub fn adjust_for_risk(&mut self) {
        self.params.base_spread_bps *= 1.5;
        self.params.base_quote_size *= 0.5;
        warn!(
            base_spread_bps = self.params.base_spread_bps,
            base_quote_size = self.params.base_quote_size,
            "risk limits breached, widening parameters"
        );
    }

    pub fn update_params(&mut self, params: QuoterParams) {
        self.params = params;
    }

    pub fn params(&self) -> &QuoterParams {
        &self.params
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    /// Lifetime traded volume in smallest units.
    pub fn total_volume(&self) -> f64 {
        self.total_volume
    }

    pub fn regime(&self) -> Regime {
        self.regime
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::RouterCfg;
    use crate::venue::{FeeSchedule, SimVenue, Venue, VenueMetrics};

    // One venue quoting 44955 / 45045 around a 45000 midpoint.
    fn sor_with_market(bid: f64, ask: f64, qty: u32) -> Router {
        let mut sor = Router::new(RouterCfg { consider_fees: true, consider_latency: false });
        let mut v = SimVenue::new(VenueId::Binance, "Binance", VenueMetrics::default());
        v.book_mut().add(1, bid, qty, Side::Buy).unwrap();
        v.book_mut().add(2, ask, qty, Side::Sell).unwrap();
        sor.add_venue(Box::new(v), FeeSchedule { maker_rate: 0.001, taker_rate: 0.002 });
        sor
    }

    fn scenario_params() -> QuoterParams {
        QuoterParams {
            base_spread_bps: 20.0,
            min_spread_bps: 5.0,
            max_spread_bps: 50.0,
            target_base_inventory: 5.0,
            inventory_skew_factor: 0.2,
            volatility_adjustment: 0.0,
            base_quote_size: 0.5,
            ..QuoterParams::default()
        }
    }

    #[test]
    fn balanced_inventory_quotes_symmetrically() {
        let sor = sor_with_market(44955.0, 45045.0, 100);
        let mut quoter = Quoter::new(scenario_params());
        quoter.initialize(5.0, 250_000.0);

        let pair = quoter.update_quotes(&sor);
        let mid = 45000.0;
        // 20 bps spread, zero skew: +-0.1% around the midpoint.
        assert!((pair.bid.price - mid * (1.0 - 0.001)).abs() < 1e-6);
        assert!((pair.ask.price - mid * (1.0 + 0.001)).abs() < 1e-6);
        assert_eq!(quoter.imbalance(), 0.0);
    }

    #[test]
    fn long_inventory_skews_both_quotes_down_and_up() {
        let sor = sor_with_market(44955.0, 45045.0, 100);

        let mut balanced = Quoter::new(scenario_params());
        balanced.initialize(5.0, 250_000.0);
        let base_pair = balanced.update_quotes(&sor);

        let mut long = Quoter::new(scenario_params());
        long.initialize(7.0, 250_000.0);
        let long_pair = long.update_quotes(&sor);

        // Long 2 over target: bid never rises, ask never falls.
        assert!(long_pair.bid.price < base_pair.bid.price);
        assert!(long_pair.ask.price > base_pair.ask.price);
        assert!((long.imbalance() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn spread_is_clamped_to_bounds() {
        let sor = sor_with_market(44955.0, 45045.0, 100);
        let mut params = scenario_params();
        params.base_spread_bps = 1.0; // below min
        let mut quoter = Quoter::new(params);
        quoter.initialize(5.0, 250_000.0);
        let pair = quoter.update_quotes(&sor);
        let spread_bps = (pair.ask.price - pair.bid.price) / 45000.0 * 10_000.0;
        assert!((spread_bps - 5.0).abs() < 1e-9);

        let mut params = scenario_params();
        params.base_spread_bps = 500.0; // above max
        params.volatility_adjustment = 1.0;
        let mut quoter = Quoter::new(params);
        quoter.initialize(5.0, 250_000.0); // zero skew keeps width == s
        let pair = quoter.update_quotes(&sor);
        let spread_bps = (pair.ask.price - pair.bid.price) / 45000.0 * 10_000.0;
        assert!((spread_bps - 50.0).abs() < 1e-9);
    }

    #[test]
    fn sizes_scale_with_inventory_and_clamp() {
        let sor = sor_with_market(44955.0, 45045.0, 100);
        let mut quoter = Quoter::new(scenario_params());
        quoter.initialize(5.0, 250_000.0);
        let pair = quoter.update_quotes(&sor);
        // Buy: 0.5 * (1 - 5/10 * 0.5) = 0.375 -> 37; sell: 0.5 * min(1, 1) -> 50.
        assert_eq!(pair.bid.size, 37);
        assert_eq!(pair.ask.size, 50);

        // Empty inventory: sell size collapses to the minimum.
        let mut flat = Quoter::new(scenario_params());
        flat.initialize(0.0, 250_000.0);
        let pair = flat.update_quotes(&sor);
        assert_eq!(pair.ask.size, 1); // min_quote_size 0.01 * 100
    }

    #[test]
    fn missing_market_yields_zeroed_quotes_and_keeps_inventory() {
        let sor = Router::new(RouterCfg::default());
        let mut quoter = Quoter::new(QuoterParams::default());
        quoter.initialize(5.0, 250_000.0);
        let pair = quoter.update_quotes(&sor);
        assert_eq!(pair.bid.price, 0.0);
        assert_eq!(pair.bid.size, 0);
        assert_eq!(pair.bid.venue, VenueId::Unknown);
        assert_eq!(pair.edge, 0.0);
        assert_eq!(quoter.inventory().base, 5.0);
        assert_eq!(quoter.inventory().quote, 250_000.0);
    }

    #[test]
    fn one_sided_market_reuses_last_midpoint() {
        let mut sor = sor_with_market(44955.0, 45045.0, 100);
        let mut quoter = Quoter::new(scenario_params());
        quoter.initialize(5.0, 250_000.0);
        quoter.update_quotes(&sor);

        // Drop the ask side everywhere; quoting continues off the cached mid.
        for book in sor.books_mut() {
            book.cancel(2);
        }
        let pair = quoter.update_quotes(&sor);
        assert!(((pair.bid.price + pair.ask.price) / 2.0 - 45000.0).abs() < 1e-6);
        assert!(pair.bid.price > 0.0);
    }

    #[test]
    fn fill_accounting_is_signed_and_conserving() {
        let sor = sor_with_market(44955.0, 45045.0, 100);
        let mut quoter = Quoter::new(scenario_params());
        quoter.initialize(5.0, 250_000.0);
        let pair = quoter.update_quotes(&sor);

        quoter.on_fill(&pair.bid, 44955.0, 40); // buy 0.4 base
        quoter.on_fill(&pair.ask, 45045.0, 30); // sell 0.3 base

        let pos = quoter.inventory();
        assert!((pos.base - (5.0 + 0.4 - 0.3)).abs() < 1e-9);
        let expected_quote = 250_000.0 - 44955.0 * 0.4 + 45045.0 * 0.3;
        assert!((pos.quote - expected_quote).abs() < 1e-6);
        assert!((quoter.fill_rate() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn quote_counter_increments_twice_per_cycle() {
        let sor = sor_with_market(44955.0, 45045.0, 100);
        let mut quoter = Quoter::new(scenario_params());
        quoter.initialize(5.0, 250_000.0);
        quoter.update_quotes(&sor);
        quoter.update_quotes(&sor);
        quoter.on_fill(&Quote { price: 44955.0, size: 10, side: Side::Buy, venue: VenueId::Binance }, 44955.0, 10);
        assert!((quoter.fill_rate() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn risk_breach_widens_parameters() {
        let mut quoter = Quoter::new(QuoterParams::default());
        quoter.initialize(11.0, 250_000.0);
        assert!(!quoter.within_risk_limits());
        let old_spread = quoter.params().base_spread_bps;
        let old_size = quoter.params().base_quote_size;
        quoter.adjust_for_risk();
        assert_eq!(quoter.params().base_spread_bps, old_spread * 1.5);
        assert_eq!(quoter.params().base_quote_size, old_size * 0.5);
    }

    #[test]
    fn risk_envelope_checks_both_currencies() {
        let mut quoter = Quoter::new(QuoterParams::default());
        quoter.initialize(5.0, 250_000.0);
        assert!(quoter.within_risk_limits());

        let mut over_quote = Quoter::new(QuoterParams::default());
        over_quote.initialize(5.0, 600_000.0);
        assert!(!over_quote.within_risk_limits());

        let mut negative_base = Quoter::new(QuoterParams::default());
        negative_base.initialize(5.0, 250_000.0);
        let sell = Quote { price: 100.0, size: 0, side: Side::Sell, venue: VenueId::Unknown };
        negative_base.on_fill(&sell, 100.0, 600); // sell 6 base -> -1
        assert!(!negative_base.within_risk_limits());
    }

    #[test]
    fn edge_subtracts_both_fees() {
        let sor = sor_with_market(44955.0, 45045.0, 100);
        let mut quoter = Quoter::new(scenario_params());
        quoter.initialize(5.0, 250_000.0);
        let pair = quoter.update_quotes(&sor);
        // Both quotes are inside the market, so both route as maker (10 bps).
        let buy_fee = 45045.0 * pair.bid.size.min(100) as f64 * 0.001;
        let sell_fee = 44955.0 * pair.ask.size.min(100) as f64 * 0.001;
        let expected = (pair.ask.price - pair.bid.price) - (buy_fee + sell_fee);
        assert!((pair.edge - expected).abs() < 1e-6);
    }

    #[test]
    fn params_update_wholesale() {
        let sor = sor_with_market(44955.0, 45045.0, 100);
        let mut quoter = Quoter::new(scenario_params());
        quoter.initialize(5.0, 250_000.0);
        quoter.update_quotes(&sor);

        let mut wider = scenario_params();
        wider.base_spread_bps = 40.0;
        quoter.update_params(wider);
        assert_eq!(quoter.params().base_spread_bps, 40.0);
        let pair = quoter.update_quotes(&sor);
        let spread_bps = (pair.ask.price - pair.bid.price) / 45000.0 * 10_000.0;
        assert!((spread_bps - 40.0).abs() < 1e-9);
    }

    #[test]
    fn regime_selector_is_pure_and_thresholded() {
        assert_eq!(Regime::select(3.0, 0.01), Regime::Aggressive);
        assert_eq!(Regime::select(10.0, 0.01), Regime::Neutral);
        assert_eq!(Regime::select(25.0, 0.01), Regime::Defensive);
        assert_eq!(Regime::select(3.0, 0.5), Regime::Defensive);
    }

    #[test]
    fn adaptive_profile_widens_in_wide_markets() {
        // 45 bps wide market: adaptive quoter goes defensive and quotes a
        // wider spread than the plain quoter, sizes halved.
        let sor = sor_with_market(44900.0, 45100.0, 100);
        let params = QuoterParams { volatility_adjustment: 0.0, ..scenario_params() };

        let mut plain = Quoter::new(params.clone());
        plain.initialize(5.0, 250_000.0);
        let plain_pair = plain.update_quotes(&sor);

        let mut adaptive = Quoter::new(params);
        adaptive.set_adaptive(true);
        adaptive.initialize(5.0, 250_000.0);
        let adaptive_pair = adaptive.update_quotes(&sor);

        assert_eq!(adaptive.regime(), Regime::Defensive);
        assert!(adaptive_pair.ask.price - adaptive_pair.bid.price > plain_pair.ask.price - plain_pair.bid.price);
        assert!(adaptive_pair.bid.size < plain_pair.bid.size);
    }
}
