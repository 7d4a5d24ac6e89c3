use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get the current time in seconds since the UNIX epoch
pub fn current_time_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Get a timestamp in seconds since the UNIX epoch
pub fn timestamp_secs() -> u64 {
    current_time_secs() as u64
}

/// Format a duration as `1d 2h 3m`, dropping leading zero units
pub fn format_uptime(uptime: Duration) -> String {
    let total_minutes = uptime.as_secs() / 60;
    let days = total_minutes / (24 * 60);
    let hours = (total_minutes / 60) % 24;
    let minutes = total_minutes % 60;

    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(Duration::from_secs(59)), "0m");
        assert_eq!(format_uptime(Duration::from_secs(3 * 3600 + 120)), "3h 2m");
        assert_eq!(format_uptime(Duration::from_secs(2 * 86_400 + 3600 + 60)), "2d 1h 1m");
    }
}
