//! Idle shutdown of the web process
//!
//! The process exits once no client is connected and the last one left at
//! least `timeout` ago.

use std::time::{Duration, Instant};

/// Shortest interval between two idle checks
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_secs(5);

/// Interval between idle checks, `max(timeout, 5s)`
pub fn check_interval(timeout: Duration) -> Duration {
    timeout.max(MIN_CHECK_INTERVAL)
}

/// Whether the process should shut down
pub fn should_exit(clients: usize, last_disconnect: Instant, now: Instant, timeout: Duration) -> bool {
    clients == 0 && now.saturating_duration_since(last_disconnect) >= timeout
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_interval() {
        assert_eq!(check_interval(Duration::from_secs(1)), Duration::from_secs(5));
        assert_eq!(check_interval(Duration::from_secs(30)), Duration::from_secs(30));
    }

    #[test]
    fn test_should_exit() {
        let start = Instant::now();
        let timeout = Duration::from_secs(10);
        assert!(!should_exit(0, start, start + Duration::from_secs(9), timeout));
        assert!(should_exit(0, start, start + Duration::from_secs(10), timeout));
        assert!(!should_exit(1, start, start + Duration::from_secs(60), timeout));
    }
}
