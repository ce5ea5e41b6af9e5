use chrono::Duration;

/// TTL used whenever a configured duration string cannot be parsed.
pub const DEFAULT_TTL: Duration = Duration::minutes(15);

/// Parses a TTL string such as `"15m"`, `"12h"`, `"7d"` or `"3600"` (seconds).
///
/// Returns `None` for anything else, including negative values and amounts
/// that overflow.
pub fn parse_ttl(raw: &str) -> Option<Duration> {
    let raw = raw.trim();

    let (digits, unit_secs): (&str, i64) = match raw.chars().last()? {
        'm' => (&raw[..raw.len() - 1], 60),
        'h' => (&raw[..raw.len() - 1], 3_600),
        'd' => (&raw[..raw.len() - 1], 86_400),
        _ => (raw, 1),
    };

    let amount: i64 = digits.parse().ok()?;
    if amount < 0 {
        return None;
    }

    let secs = amount.checked_mul(unit_secs)?;
    Duration::try_seconds(secs)
}

/// Parses a TTL string, falling back to [`DEFAULT_TTL`] when it is unusable.
///
/// The fallback keeps the service up on a bad value, so it is logged loudly
/// enough for an operator to notice the misconfiguration.
pub fn ttl_or_default(name: &str, raw: &str) -> Duration {
    match parse_ttl(raw) {
        Some(ttl) => ttl,
        None => {
            tracing::warn!(
                setting = name,
                value = raw,
                "⚠️ Unparseable TTL, falling back to {} seconds",
                DEFAULT_TTL.num_seconds()
            );
            DEFAULT_TTL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minutes_hours_days_and_seconds() {
        assert_eq!(parse_ttl("15m"), Some(Duration::seconds(900)));
        assert_eq!(parse_ttl("2h"), Some(Duration::seconds(7_200)));
        assert_eq!(parse_ttl("7d"), Some(Duration::seconds(604_800)));
        assert_eq!(parse_ttl("3600"), Some(Duration::seconds(3_600)));
        assert_eq!(parse_ttl(" 30m "), Some(Duration::seconds(1_800)));
    }

    #[test]
    fn rejects_garbage_and_negative_values() {
        assert_eq!(parse_ttl("garbage"), None);
        assert_eq!(parse_ttl(""), None);
        assert_eq!(parse_ttl("m"), None);
        assert_eq!(parse_ttl("-5m"), None);
        assert_eq!(parse_ttl("10w"), None);
        assert_eq!(parse_ttl("99999999999999999d"), None);
    }

    #[test]
    fn falls_back_to_fifteen_minutes() {
        assert_eq!(ttl_or_default("ACCESS_TOKEN_TTL", "garbage").num_seconds(), 900);
        assert_eq!(ttl_or_default("REFRESH_TOKEN_TTL", "7d").num_seconds(), 604_800);
    }
}
