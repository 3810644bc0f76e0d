// ===============================
// src/fix.rs (FIX 4.4 tag-value codec)
// ===============================
//
// Thin codec for the order-entry boundary: SOH-delimited tag=value parsing,
// checksum (sum of bytes mod 256, 3 digits), and builders for the two
// message types the stack speaks. Transport faults stay out here; nothing
// in this module reaches the book or router directly.
//
use ahash::AHashMap as HashMap;
use chrono::Utc;

use crate::domain::Side;

pub const SOH: char = '\x01';

pub mod tags {
    pub const BEGIN_STRING: u32 = 8;
    pub const BODY_LENGTH: u32 = 9;
    pub const CHECK_SUM: u32 = 10;
    pub const CL_ORD_ID: u32 = 11;
    pub const MSG_TYPE: u32 = 35;
    pub const ORDER_QTY: u32 = 38;
    pub const ORD_TYPE: u32 = 40;
    pub const ORIG_CL_ORD_ID: u32 = 41;
    pub const PRICE: u32 = 44;
    pub const SENDER_COMP_ID: u32 = 49;
    pub const SENDING_TIME: u32 = 52;
    pub const SIDE: u32 = 54;
    pub const SYMBOL: u32 = 55;
    pub const TARGET_COMP_ID: u32 = 56;
    pub const TIME_IN_FORCE: u32 = 59;
    pub const TRANSACT_TIME: u32 = 60;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MsgType {
    NewOrderSingle,     // 35=D
    OrderCancelRequest, // 35=F
    Unknown,
}

#[derive(Debug)]
pub struct FixMessage {
    pub msg_type: MsgType,
    fields: HashMap<u32, String>,
}

impl FixMessage {
    pub fn get(&self, tag: u32) -> Option<&str> {
        self.fields.get(&tag).map(|s| s.as_str())
    }

    pub fn price(&self) -> Option<f64> {
        self.get(tags::PRICE)?.parse().ok()
    }

    pub fn quantity(&self) -> Option<u32> {
        self.get(tags::ORDER_QTY)?.parse().ok()
    }

    pub fn cl_ord_id(&self) -> Option<&str> {
        self.get(tags::CL_ORD_ID)
    }

    pub fn is_buy(&self) -> bool {
        self.get(tags::SIDE) == Some("1")
    }
}

/// Parse a raw SOH-delimited message. Malformed fields are skipped; an
/// unrecognized or absent 35 yields `MsgType::Unknown`.
pub fn parse(raw: &str) -> FixMessage {
    let mut fields = HashMap::new();
    for field in raw.split(SOH) {
        if field.is_empty() {
            continue;
        }
        let Some((tag, value)) = field.split_once('=') else { continue };
        let Ok(tag) = tag.parse::<u32>() else { continue };
        fields.insert(tag, value.to_string());
    }

    let msg_type = match fields.get(&tags::MSG_TYPE).map(|s| s.as_str()) {
        Some("D") => MsgType::NewOrderSingle,
        Some("F") => MsgType::OrderCancelRequest,
        _ => MsgType::Unknown,
    };

    FixMessage { msg_type, fields }
}

/// FIX checksum: byte sum mod 256, left-padded to 3 digits.
pub fn checksum(message: &str) -> String {
    let sum: u32 = message.bytes().map(|b| b as u32).sum();
    format!("{:03}", sum % 256)
}

pub fn validate_checksum(message: &str, expected: &str) -> bool {
    checksum(message) == expected
}

fn side_char(side: Side) -> char {
    match side {
        Side::Buy => '1',
        Side::Sell => '2',
    }
}

fn sending_time() -> String {
    Utc::now().format("%Y%m%d-%H:%M:%S").to_string()
}

fn wrap(body: String) -> String {
    let mut msg = format!("{}=FIX.4.4{SOH}{}={}{SOH}{body}", tags::BEGIN_STRING, tags::BODY_LENGTH, body.len());
    let cs = checksum(&msg);
    msg.push_str(&format!("{}={cs}{SOH}", tags::CHECK_SUM));
    msg
}

/// Build a NewOrderSingle (35=D) limit order.
pub fn new_order_single(cl_ord_id: &str, symbol: &str, side: Side, quantity: u32, price: f64) -> String {
    let ts = sending_time();
    let body = format!(
        "{}=D{SOH}{}=CLIENT{SOH}{}=EXCHANGE{SOH}{}={ts}{SOH}{}={cl_ord_id}{SOH}{}={symbol}{SOH}{}={}{SOH}{}={quantity}{SOH}{}=2{SOH}{}={price:.2}{SOH}{}=0{SOH}{}={ts}{SOH}",
        tags::MSG_TYPE,
        tags::SENDER_COMP_ID,
        tags::TARGET_COMP_ID,
        tags::SENDING_TIME,
        tags::CL_ORD_ID,
        tags::SYMBOL,
        tags::SIDE,
        side_char(side),
        tags::ORDER_QTY,
        tags::ORD_TYPE,
        tags::PRICE,
        tags::TIME_IN_FORCE,
        tags::TRANSACT_TIME,
    );
    wrap(body)
}

/// Build an OrderCancelRequest (35=F).
pub fn order_cancel_request(cl_ord_id: &str, orig_cl_ord_id: &str, symbol: &str, side: Side, quantity: u32) -> String {
    let ts = sending_time();
    let body = format!(
        "{}=F{SOH}{}=CLIENT{SOH}{}=EXCHANGE{SOH}{}={ts}{SOH}{}={cl_ord_id}{SOH}{}={orig_cl_ord_id}{SOH}{}={symbol}{SOH}{}={}{SOH}{}={quantity}{SOH}{}={ts}{SOH}",
        tags::MSG_TYPE,
        tags::SENDER_COMP_ID,
        tags::TARGET_COMP_ID,
        tags::SENDING_TIME,
        tags::CL_ORD_ID,
        tags::ORIG_CL_ORD_ID,
        tags::SYMBOL,
        tags::SIDE,
        side_char(side),
        tags::ORDER_QTY,
        tags::TRANSACT_TIME,
    );
    wrap(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_new_order_single() {
        let raw = new_order_single("ORD-1", "BTCUSD", Side::Buy, 100, 45000.5);
        let msg = parse(&raw);
        assert_eq!(msg.msg_type, MsgType::NewOrderSingle);
        assert_eq!(msg.cl_ord_id(), Some("ORD-1"));
        assert_eq!(msg.get(tags::SYMBOL), Some("BTCUSD"));
        assert_eq!(msg.quantity(), Some(100));
        assert_eq!(msg.price(), Some(45000.50));
        assert!(msg.is_buy());
    }

    #[test]
    fn parses_cancel_request() {
        let raw = order_cancel_request("ORD-2", "ORD-1", "BTCUSD", Side::Sell, 100);
        let msg = parse(&raw);
        assert_eq!(msg.msg_type, MsgType::OrderCancelRequest);
        assert_eq!(msg.get(tags::ORIG_CL_ORD_ID), Some("ORD-1"));
        assert!(!msg.is_buy());
    }

    #[test]
    fn unknown_message_types_are_tolerated() {
        let raw = format!("8=FIX.4.4{SOH}35=8{SOH}55=BTCUSD{SOH}");
        let msg = parse(&raw);
        assert_eq!(msg.msg_type, MsgType::Unknown);
        assert_eq!(msg.get(tags::SYMBOL), Some("BTCUSD"));
        assert_eq!(parse("").msg_type, MsgType::Unknown);
    }

    #[test]
    fn malformed_fields_are_skipped() {
        let raw = format!("garbage{SOH}x=y{SOH}44=101.25{SOH}=nope{SOH}");
        let msg = parse(&raw);
        assert_eq!(msg.price(), Some(101.25));
        assert_eq!(msg.msg_type, MsgType::Unknown);
    }

    #[test]
    fn checksum_is_sum_mod_256_three_digits() {
        // "8=F" -> 56 + 61 + 70 = 187
        assert_eq!(checksum("8=F"), "187");
        assert_eq!(checksum(""), "000");
        assert!(validate_checksum("8=F", "187"));
        assert!(!validate_checksum("8=F", "186"));
    }

    #[test]
    fn built_messages_carry_a_valid_trailer() {
        let raw = new_order_single("ORD-3", "ETHUSD", Side::Sell, 25, 3200.0);
        // Checksum covers everything before the 10= field.
        let trailer_start = raw.rfind("10=").unwrap();
        let (covered, trailer) = raw.split_at(trailer_start);
        let cs = trailer.trim_start_matches("10=").trim_end_matches(SOH);
        assert!(validate_checksum(covered, cs));
    }
}
