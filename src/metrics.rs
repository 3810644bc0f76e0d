// ===============================
// src/metrics.rs
// ===============================
use axum::{routing::get, Router};
use once_cell::sync::Lazy;
use prometheus::{Gauge, GaugeVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::net::SocketAddr;
use tracing::{error, info};

// Single custom registry (we register everything here)
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

// -------- Market data / quoting --------
pub static TICKS: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("ticks_total", "market data updates").unwrap());

pub static QUOTES: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("quotes_total", "quotes placed (one per side)").unwrap());

pub static FILLS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fills_total", "simulated quote fills"),
        &["side", "venue"],
    )
    .unwrap()
});

pub static RISK_BREACHES: Lazy<IntCounter> =
    Lazy::new(|| IntCounter::new("risk_breaches_total", "risk envelope breaches").unwrap());

pub static SPREAD_BPS: Lazy<Gauge> =
    Lazy::new(|| Gauge::new("quoted_spread_bps", "quoted spread (bps)").unwrap());

pub static QUOTE_EDGE: Lazy<Gauge> =
    Lazy::new(|| Gauge::new("quote_edge", "theoretical round-trip edge").unwrap());

// -------- Router / venue scoring --------
pub static VENUE_SCORE: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(Opts::new("sor_venue_score", "router score"), &["venue"]).unwrap()
});

// -------- Inventory & PnL --------
pub static INV_BASE: Lazy<Gauge> =
    Lazy::new(|| Gauge::new("inventory_base", "base asset inventory").unwrap());

pub static INV_QUOTE: Lazy<Gauge> =
    Lazy::new(|| Gauge::new("inventory_quote", "quote currency inventory").unwrap());

pub static PNL_REALIZED: Lazy<Gauge> =
    Lazy::new(|| Gauge::new("pnl_realized", "realized PnL (quote currency)").unwrap());

pub static PNL_TOTAL: Lazy<Gauge> =
    Lazy::new(|| Gauge::new("pnl_total", "marked-to-mid total PnL").unwrap());

// -------- Recorder --------
pub static RECORDED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("events_recorded_total", "events written to or dropped from the record file"),
        &["outcome"],
    )
    .unwrap()
});

pub fn init() {
    // Register all metrics to the custom registry
    for m in [
        REGISTRY.register(Box::new(TICKS.clone())),
        REGISTRY.register(Box::new(QUOTES.clone())),
        REGISTRY.register(Box::new(FILLS.clone())),
        REGISTRY.register(Box::new(RISK_BREACHES.clone())),
        REGISTRY.register(Box::new(SPREAD_BPS.clone())),
        REGISTRY.register(Box::new(QUOTE_EDGE.clone())),
        REGISTRY.register(Box::new(VENUE_SCORE.clone())),
        REGISTRY.register(Box::new(INV_BASE.clone())),
        REGISTRY.register(Box::new(INV_QUOTE.clone())),
        REGISTRY.register(Box::new(PNL_REALIZED.clone())),
        REGISTRY.register(Box::new(PNL_TOTAL.clone())),
        REGISTRY.register(Box::new(RECORDED.clone())),
    ] {
        let _ = m;
    }
}

async fn render_metrics() -> String {
    let mut body = String::new();
    let encoder = TextEncoder::new();
    if encoder.encode_utf8(&REGISTRY.gather(), &mut body).is_err() || body.is_empty() {
        body.push_str("# no metrics\n");
    }
    body
}

async fn healthz() -> &'static str {
    "ok"
}

/// Expose /metrics (Prometheus text format) and /healthz on the given port.
pub async fn serve_metrics(port: u16) {
    let app = Router::new()
        .route("/metrics", get(render_metrics))
        .route("/healthz", get(healthz));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(?e, %addr, "metrics: bind failed, exporter disabled");
            return;
        }
    };
    info!(%addr, "metrics exporter listening");

    if let Err(e) = axum::serve(listener, app).await {
        error!(?e, "metrics: server error");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn render_includes_registered_families() {
        init();
        TICKS.inc();
        RECORDED.with_label_values(&["written"]).inc_by(3);
        let body = render_metrics().await;
        assert!(body.contains("ticks_total"));
        assert!(body.contains("events_recorded_total"));
    }
}
