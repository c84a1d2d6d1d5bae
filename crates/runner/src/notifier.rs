//! Operator-facing notification formatting.

use chrono::NaiveDate;
use model::{Direction, NotificationRecord};
use rust_decimal::prelude::ToPrimitive;
use std::collections::HashMap;

/// Per-symbol notification counter, reset on UTC date rollover.
pub struct DailyCounter {
    date: NaiveDate,
    counts: HashMap<String, u32>,
}

impl DailyCounter {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: today,
            counts: HashMap::new(),
        }
    }

    /// Count one notification for `symbol`, returning its total for `today`.
    pub fn bump(&mut self, symbol: &str, today: NaiveDate) -> u32 {
        if today != self.date {
            self.counts.clear();
            self.date = today;
        }
        let count = self.counts.entry(symbol.to_string()).or_insert(0);
        *count += 1;
        *count
    }
}

/// Message text for the operator channel, e.g.
/// `🟢 BTCUSDT Long 40,000$ 🔔3`.
pub fn format_notification(record: &NotificationRecord, daily_count: u32) -> String {
    let marker = match record.direction {
        Direction::Long => "🟢",
        Direction::Short => "🔴",
    };
    format!(
        "{} {} {} {}$ 🔔{}",
        marker,
        record.symbol,
        record.direction,
        group_thousands(record.notional.round().to_i128().unwrap_or(0)),
        daily_count
    )
}

fn group_thousands(n: i128) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
