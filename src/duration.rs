use std::time::Duration;

use crate::error::MonitorError;

/// Convert a number of seconds into a millisecond-precision duration.
///
/// Sub-millisecond fractions are truncated. Negative, NaN and infinite
/// values are rejected.
pub fn from_secs(secs: f64) -> Result<Duration, MonitorError> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(MonitorError::InvalidInterval(format!(
            "{} is not a non-negative number of seconds",
            secs
        )));
    }
    Ok(Duration::from_millis((secs * 1000.0) as u64))
}

/// Parse interval strings like "5", "0.5", "2.25" (seconds)
pub fn parse_secs(s: &str) -> Result<Duration, MonitorError> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|e| MonitorError::InvalidInterval(format!("{:?}: {}", s, e)))?;
    from_secs(secs)
}

/// Format an interval for display
pub fn format_interval(d: Duration) -> String {
    if d < Duration::from_secs(1) {
        format!("{}ms", d.as_millis())
    } else {
        format!("{}s", d.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_seconds() {
        assert_eq!(parse_secs("5").unwrap(), Duration::from_millis(5000));
    }

    #[test]
    fn test_parse_fraction_truncates_to_millis() {
        assert_eq!(parse_secs("0.0015").unwrap(), Duration::from_millis(1));
        assert_eq!(parse_secs(" 2.5 ").unwrap(), Duration::from_millis(2500));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_secs("abc"), Err(MonitorError::InvalidInterval(_))));
        assert!(parse_secs("-1").is_err());
        assert!(parse_secs("NaN").is_err());
        assert!(parse_secs("inf").is_err());
    }

    #[test]
    fn test_format_interval() {
        assert_eq!(format_interval(Duration::from_secs(2)), "2s");
        assert_eq!(format_interval(Duration::from_millis(2500)), "2.5s");
        assert_eq!(format_interval(Duration::from_millis(250)), "250ms");
    }
}
