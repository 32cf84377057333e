use core::time::Duration;

use crate::constants::{DEFAULT_SETTLE_DELAY, DEFAULT_TIMEOUT};

/// Configuration settings for the TFMini-Plus driver.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Config {
    /// Deadline for a single frame or reply search.
    pub timeout: Duration,
    /// Time `begin` waits before probing the link for activity.
    pub settle_delay: Duration,
    /// Discard buffered input beyond one frame before searching for a header,
    /// so that a read always reflects the freshest bytes from the sensor.
    pub drain_backlog: bool,
}

impl Config {
    /// Creates a new `Config` instance with the given deadline.
    ///
    /// # Arguments
    ///
    /// * `timeout` - The deadline applied to every frame or reply search.
    ///
    /// # Returns
    ///
    /// A new `Config` instance with the default settle delay and backlog draining enabled.
    pub fn new(timeout: Duration) -> Config {
        Config {
            timeout,
            ..Config::default()
        }
    }

    /// Sets the frame/reply search deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the delay `begin` waits before probing the link.
    pub fn settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    /// Enables or disables the backlog drain performed before each frame search.
    pub fn drain_backlog(mut self, drain_backlog: bool) -> Self {
        self.drain_backlog = drain_backlog;
        self
    }
}

/// Provides default configuration values for the driver.
impl Default for Config {
    /// Returns the default configuration.
    ///
    /// The default configuration uses a one second deadline, a 200 ms settle
    /// delay and drains stale input before each frame search.
    fn default() -> Config {
        Config {
            timeout: DEFAULT_TIMEOUT,
            settle_delay: DEFAULT_SETTLE_DELAY,
            drain_backlog: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = Config::default()
            .timeout(Duration::from_millis(50))
            .settle_delay(Duration::ZERO)
            .drain_backlog(false);

        assert_eq!(config.timeout, Duration::from_millis(50));
        assert_eq!(config.settle_delay, Duration::ZERO);
        assert!(!config.drain_backlog);
    }

    #[test]
    fn new_keeps_other_defaults() {
        let config = Config::new(Duration::from_millis(250));
        assert_eq!(config.timeout, Duration::from_millis(250));
        assert_eq!(config.settle_delay, DEFAULT_SETTLE_DELAY);
        assert!(config.drain_backlog);
    }
}
