use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of the order the exchange filled to close the position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    /// Direction of the position that was liquidated.
    ///
    /// The feed reports the closing order, so the mapping is inverted: a
    /// forced sell closes a long, a forced buy closes a short.
    pub fn liquidated_direction(self) -> Direction {
        match self {
            OrderSide::Sell => Direction::Long,
            OrderSide::Buy => Direction::Short,
        }
    }
}

/// Direction of a liquidated position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "Long"),
            Direction::Short => write!(f, "Short"),
        }
    }
}

/// One forced-liquidation execution from the per-instrument feed.
///
/// The per-symbol stream carries no discrete trade id; `trade_time_ms` is the
/// exchange-assigned sequence marker for the fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiquidationEvent {
    pub symbol: String,
    pub side: OrderSide,
    pub price: Decimal,
    pub qty: Decimal,
    /// Stream envelope timestamp (`E`).
    pub event_time_ms: i64,
    /// Order trade time (`T`).
    pub trade_time_ms: i64,
}

impl LiquidationEvent {
    /// Quote-currency value of the fill, `None` on overflow.
    pub fn notional(&self) -> Option<Decimal> {
        self.price.checked_mul(self.qty)
    }
}

/// A liquidation that survived filtering, ready for delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    pub symbol: String,
    pub direction: Direction,
    pub notional: Decimal,
    pub event_time_ms: i64,
    pub trade_time_ms: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn event(side: OrderSide, price: Decimal, qty: Decimal) -> LiquidationEvent {
        LiquidationEvent {
            symbol: "BTCUSDT".to_string(),
            side,
            price,
            qty,
            event_time_ms: 1_700_000_000_000,
            trade_time_ms: 1_700_000_000_001,
        }
    }

    #[test]
    fn notional_is_price_times_qty() {
        let e = event(OrderSide::Sell, dec!(2), dec!(20000));
        assert_eq!(e.notional(), Some(dec!(40000)));
    }

    #[test]
    fn notional_overflow_is_none() {
        let e = event(OrderSide::Sell, Decimal::MAX, dec!(2));
        assert_eq!(e.notional(), None);
    }

    #[test]
    fn sell_order_means_long_was_liquidated() {
        assert_eq!(OrderSide::Sell.liquidated_direction(), Direction::Long);
        assert_eq!(OrderSide::Buy.liquidated_direction(), Direction::Short);
    }

    #[test]
    fn side_parses_exchange_casing() {
        let side: OrderSide = serde_json::from_str("\"SELL\"").unwrap();
        assert_eq!(side, OrderSide::Sell);
        let side: OrderSide = serde_json::from_str("\"BUY\"").unwrap();
        assert_eq!(side, OrderSide::Buy);
    }
}
