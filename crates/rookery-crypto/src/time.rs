/// Returns the current time as milliseconds since the Unix epoch.
///
/// Signed so it maps straight onto SQLite `INTEGER` columns.
pub fn now_ms() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// `now_ms() + secs`, saturating.
pub fn deadline_ms(secs: u64) -> i64 {
    let delta = i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX);
    now_ms().saturating_add(delta)
}
