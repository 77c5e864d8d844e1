use chrono::{DateTime, FixedOffset, Offset, Utc};

/// Fixed zone `utc_offset_minutes` east of UTC. `None` for a day or more.
pub fn local_zone(utc_offset_minutes: i32) -> Option<FixedOffset> {
    utc_offset_minutes.checked_mul(60).and_then(FixedOffset::east_opt)
}

/// UTC instant of an epoch-millisecond timestamp, if chrono can represent it.
pub fn utc_instant(timestamp: u64) -> Option<DateTime<Utc>> {
    i64::try_from(timestamp).ok().and_then(DateTime::from_timestamp_millis)
}

fn format_in(timestamp: u64, zone: FixedOffset, pattern: &str) -> String {
    utc_instant(timestamp)
        .map(|instant| instant.with_timezone(&zone).format(pattern).to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

/// `HH:MM:SS` for a millisecond timestamp shifted by `utc_offset_minutes`.
pub fn format_clock_label(timestamp: u64, utc_offset_minutes: i32) -> String {
    let zone = local_zone(utc_offset_minutes).unwrap_or_else(|| Utc.fix());
    format_in(timestamp, zone, "%H:%M:%S")
}

/// `HH:MM:SS.mmm` in UTC, for log lines.
pub fn format_log_time(timestamp: u64) -> String {
    format_in(timestamp, Utc.fix(), "%H:%M:%S%.3f")
}

/// Price with two decimals, as shown on the price line and crosshair.
pub fn format_price(price: f64) -> String {
    format!("{:.2}", price)
}
