//! Raw `@forceOrder` message parsing.

use model::{LiquidationEvent, OrderSide};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Stream envelope: `{"e":"forceOrder","E":...,"o":{...}}`.
#[derive(Debug, Deserialize)]
struct ForceOrderRaw {
    #[serde(rename = "e")]
    event_type: String,
    #[serde(rename = "E")]
    event_time_ms: i64,
    #[serde(rename = "o")]
    order: ForceOrderDetail,
}

/// The liquidated order. Only the fields the engine consumes; the payload
/// carries more (order type, status, filled quantity) that we ignore.
#[derive(Debug, Deserialize)]
struct ForceOrderDetail {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "S")]
    side: OrderSide,
    #[serde(rename = "p")]
    price: Decimal,
    #[serde(rename = "q")]
    qty: Decimal,
    #[serde(rename = "T")]
    trade_time_ms: i64,
}

#[derive(Debug)]
pub enum ParsedEvent {
    Liquidation(LiquidationEvent),
    /// Well-formed JSON that is not a forceOrder event.
    Unknown,
}

/// Parse one text frame from the per-instrument stream.
///
/// # Errors
/// Returns the serde error for frames that are not valid JSON or are missing
/// required fields. Callers drop the frame and keep the connection open.
pub fn parse_event(text: &str) -> Result<ParsedEvent, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    match value.get("e").and_then(|e| e.as_str()) {
        Some("forceOrder") => {
            let raw: ForceOrderRaw = serde_json::from_value(value)?;
            Ok(ParsedEvent::Liquidation(LiquidationEvent {
                symbol: raw.order.symbol,
                side: raw.order.side,
                price: raw.order.price,
                qty: raw.order.qty,
                event_time_ms: raw.event_time_ms,
                trade_time_ms: raw.order.trade_time_ms,
            }))
        }
        _ => Ok(ParsedEvent::Unknown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const FORCE_ORDER: &str = r#"{
        "e": "forceOrder",
        "E": 1568014460893,
        "o": {
            "s": "BTCUSDT",
            "S": "SELL",
            "o": "LIMIT",
            "f": "IOC",
            "q": "0.014",
            "p": "9910",
            "ap": "9910",
            "X": "FILLED",
            "l": "0.014",
            "z": "0.014",
            "T": 1568014460893
        }
    }"#;

    #[test]
    fn parses_force_order() {
        match parse_event(FORCE_ORDER).unwrap() {
            ParsedEvent::Liquidation(event) => {
                assert_eq!(event.symbol, "BTCUSDT");
                assert_eq!(event.side, OrderSide::Sell);
                assert_eq!(event.price, dec!(9910));
                assert_eq!(event.qty, dec!(0.014));
                assert_eq!(event.event_time_ms, 1568014460893);
                assert_eq!(event.trade_time_ms, 1568014460893);
                assert_eq!(event.notional(), Some(dec!(138.740)));
            }
            other => panic!("expected Liquidation, got {other:?}"),
        }
    }

    #[test]
    fn other_event_types_are_unknown() {
        let json = r#"{"e": "aggTrade", "E": 1568014460893, "s": "BTCUSDT"}"#;
        assert!(matches!(parse_event(json).unwrap(), ParsedEvent::Unknown));
    }

    #[test]
    fn envelope_without_event_type_is_unknown() {
        assert!(matches!(
            parse_event(r#"{"result": null, "id": 1}"#).unwrap(),
            ParsedEvent::Unknown
        ));
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(parse_event("not json at all").is_err());
    }

    #[test]
    fn missing_required_field_is_an_error() {
        // forceOrder envelope whose order lacks a price.
        let json = r#"{
            "e": "forceOrder",
            "E": 1568014460893,
            "o": {"s": "BTCUSDT", "S": "SELL", "q": "0.014", "T": 1568014460893}
        }"#;
        assert!(parse_event(json).is_err());
    }

    #[test]
    fn unparseable_numeric_field_is_an_error() {
        let json = r#"{
            "e": "forceOrder",
            "E": 1568014460893,
            "o": {"s": "BTCUSDT", "S": "SELL", "p": "not-a-price", "q": "0.014", "T": 1}
        }"#;
        assert!(parse_event(json).is_err());
    }

    #[test]
    fn unknown_side_is_an_error() {
        let json = r#"{
            "e": "forceOrder",
            "E": 1568014460893,
            "o": {"s": "BTCUSDT", "S": "HOLD", "p": "9910", "q": "0.014", "T": 1}
        }"#;
        assert!(parse_event(json).is_err());
    }
}
