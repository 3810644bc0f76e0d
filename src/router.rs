// ===============================
// src/router.rs (SOR: multi-venue routing + aggregation)
// ===============================
//
// Scores eligible venues per order and picks the best one, or splits a parent
// order across venues. Buys minimize fee- and latency-adjusted cost, sells
// maximize the adjusted proceeds. Ties keep the first-registered venue.
//
use tracing::{debug, trace};

use crate::book::Book;
use crate::domain::Side;
use crate::metrics::VENUE_SCORE;
use crate::venue::{FeeSchedule, Venue, VenueId};

#[derive(Debug, Clone, Copy)]
pub struct RouterCfg {
    pub consider_fees: bool,
    pub consider_latency: bool,
}

impl Default for RouterCfg {
    fn default() -> Self {
        RouterCfg { consider_fees: true, consider_latency: true }
    }
}

/// Outcome of routing one order. `venue == Unknown` means no eligible venue;
/// all numeric fields are zero in that case. `score` is total cost for buys
/// and net proceeds for sells.
#[derive(Debug, Clone)]
pub struct RoutingDecision {
    pub venue: VenueId,
    pub expected_price: f64,
    pub expected_fee: f64,
    pub score: f64,
    pub available_qty: u32,
    pub is_maker: bool,
}

impl Default for RoutingDecision {
    fn default() -> Self {
        RoutingDecision {
            venue: VenueId::Unknown,
            expected_price: 0.0,
            expected_fee: 0.0,
            score: 0.0,
            available_qty: 0,
            is_maker: false,
        }
    }
}

/// One child order of a split parent.
#[derive(Debug, Clone)]
pub struct SplitPiece {
    pub venue: VenueId,
    pub quantity: u32,
    pub expected_price: f64,
    pub expected_fee: f64,
}

/// Cross-venue touch with attribution. Sentinels match the book's
/// (-inf bid / +inf ask when a side is empty everywhere).
#[derive(Debug, Clone)]
pub struct AggTop {
    pub best_bid: f64,
    pub best_ask: f64,
    pub bid_qty: u32,
    pub ask_qty: u32,
    pub best_bid_venue: VenueId,
    pub best_ask_venue: VenueId,
}

struct Slot {
    venue: Box<dyn Venue>,
    fees: FeeSchedule,
    active: bool,
}

pub struct Router {
    slots: Vec<Slot>,
    cfg: RouterCfg,
}

impl Router {
    pub fn new(cfg: RouterCfg) -> Self {
        Router { slots: Vec::new(), cfg }
    }

    /// Register a venue; registration order is the tie-break order.
    pub fn add_venue(&mut self, venue: Box<dyn Venue>, fees: FeeSchedule) {
        let m = venue.metrics();
        debug!(
            venue = %venue.id(),
            venue_id = venue.id().as_u8(),
            maker = fees.maker_rate,
            taker = fees.taker_rate,
            latency_ms = m.avg_latency_ms,
            fill_rate = m.fill_rate,
            uptime = m.uptime,
            "venue registered"
        );
        self.slots.push(Slot { venue, fees, active: true });
    }

    pub fn set_active(&mut self, id: VenueId, active: bool) {
        for slot in &mut self.slots {
            if slot.venue.id() == id {
                slot.active = active;
                break;
            }
        }
    }

    /// Mutable access to every venue book, in registration order. The driver
    /// uses this to apply market updates; never call while a routing decision
    /// is being computed.
    pub fn books_mut(&mut self) -> impl Iterator<Item = &mut Book> {
        self.slots.iter_mut().map(|s| s.venue.book_mut())
    }

    // A buy rests (maker) when its limit is below the venue's best ask; the
    // +inf/-inf sentinels make the empty-side case fall out naturally.
    fn would_be_maker(book: &Book, price: f64, side: Side) -> bool {
        match side {
            Side::Buy => price < book.best_ask(),
            Side::Sell => price > book.best_bid(),
        }
    }

    /// Pick the single best eligible venue for a marketable order capped at
    /// `price`. Eligible = active, available, and quoting the opposite side.
    pub fn route(&self, order_id: u64, price: f64, quantity: u32, side: Side) -> RoutingDecision {
        let mut best = RoutingDecision::default();
        let mut best_score = match side {
            Side::Buy => f64::MAX,
            Side::Sell => f64::MIN,
        };

        for slot in &self.slots {
            if !slot.active || !slot.venue.available() {
                continue;
            }
            let book = slot.venue.book();
            let (touch, touch_qty) = match side {
                Side::Buy => {
                    let ask = book.best_ask();
                    if !ask.is_finite() {
                        continue;
                    }
                    (ask, book.quantity_at(ask, Side::Sell))
                }
                Side::Sell => {
                    let bid = book.best_bid();
                    if !bid.is_finite() {
                        continue;
                    }
                    (bid, book.quantity_at(bid, Side::Buy))
                }
            };
            if touch_qty == 0 {
                continue;
            }

            let is_maker = Self::would_be_maker(book, price, side);
            let fee_rate = if is_maker { slot.fees.maker_rate } else { slot.fees.taker_rate };
            let fill_qty = quantity.min(touch_qty);
            let notional = touch * fill_qty as f64;

            let mut score = if self.cfg.consider_fees {
                match side {
                    Side::Buy => notional * (1.0 + fee_rate),
                    Side::Sell => notional * (1.0 - fee_rate),
                }
            } else {
                notional
            };
            if self.cfg.consider_latency {
                let lat = slot.venue.metrics().avg_latency_ms as f64 / 10_000.0;
                score *= match side {
                    Side::Buy => 1.0 + lat,
                    Side::Sell => 1.0 - lat,
                };
            }
            VENUE_SCORE.with_label_values(&[slot.venue.name()]).set(score);

            let wins = match side {
                Side::Buy => score < best_score,
                Side::Sell => score > best_score,
            };
            if wins {
                best_score = score;
                best = RoutingDecision {
                    venue: slot.venue.id(),
                    expected_price: touch,
                    expected_fee: if self.cfg.consider_fees { notional * fee_rate } else { 0.0 },
                    score,
                    available_qty: touch_qty,
                    is_maker,
                };
            }
        }

        trace!(order_id, ?side, price, quantity, venue = %best.venue, score = best.score, "routed");
        best
    }

    /// Allocate a parent order across venues, each piece capped by the chosen
    /// venue's touch quantity. Depth consumption between iterations is not
    /// simulated, so the piece count is bounded by the venue count.
    pub fn route_split(&self, order_id: u64, price: f64, total_quantity: u32, side: Side) -> Vec<SplitPiece> {
        let mut pieces = Vec::new();
        let mut remaining = total_quantity;

        while remaining > 0 {
            let decision = self.route(order_id, price, remaining, side);
            if decision.venue == VenueId::Unknown {
                break;
            }
            let fill = remaining.min(decision.available_qty);
            pieces.push(SplitPiece {
                venue: decision.venue,
                quantity: fill,
                expected_price: decision.expected_price,
                expected_fee: decision.expected_fee * fill as f64 / decision.available_qty as f64,
            });
            remaining -= fill;
            if pieces.len() >= self.slots.len() {
                break;
            }
        }

        pieces
    }

    /// Cross-venue touch. Each side's quantity is the sum over eligible
    /// venues of the size at that venue's own touch price.
    pub fn aggregated(&self) -> AggTop {
        let mut top = AggTop {
            best_bid: f64::NEG_INFINITY,
            best_ask: f64::INFINITY,
            bid_qty: 0,
            ask_qty: 0,
            best_bid_venue: VenueId::Unknown,
            best_ask_venue: VenueId::Unknown,
        };

        for slot in &self.slots {
            if !slot.active || !slot.venue.available() {
                continue;
            }
            let book = slot.venue.book();

            let bid = book.best_bid();
            if bid.is_finite() {
                if bid > top.best_bid {
                    top.best_bid = bid;
                    top.best_bid_venue = slot.venue.id();
                }
                top.bid_qty += book.quantity_at(bid, Side::Buy);
            }

            let ask = book.best_ask();
            if ask.is_finite() {
                if ask < top.best_ask {
                    top.best_ask = ask;
                    top.best_ask_venue = slot.venue.id();
                }
                top.ask_qty += book.quantity_at(ask, Side::Sell);
            }
        }

        top
    }
}
