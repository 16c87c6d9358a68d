use std::time::Duration;

/// Coordinator tuning knobs, loaded from environment variables with
/// sensible defaults.
#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// How many room codes to sample before giving up with
    /// `ROOM_CODE_EXHAUSTED`. Collisions are vanishingly rare at a
    /// 32^6 code space, so this only matters under pathological load.
    pub max_room_code_attempts: u32,
    /// Default game length in seconds when the caller does not pick one.
    pub default_time_limit_secs: u32,
    /// How long the reconciliation layer waits between resubscribe
    /// attempts after a subscription drop.
    pub reconnect_backoff: Duration,
    /// Resubscribe attempts before the subscription is reported lost.
    pub max_reconnect_attempts: u32,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            max_room_code_attempts: 32,
            default_time_limit_secs: 300,
            reconnect_backoff: Duration::from_secs(3),
            max_reconnect_attempts: 5,
        }
    }
}

impl CoordinatorConfig {
    /// Load configuration from `GRIDMATES_*` environment variables.
    /// Every variable is optional; unset or unparsable values fall back
    /// to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_room_code_attempts: env_u32("GRIDMATES_ROOM_CODE_ATTEMPTS")
                .unwrap_or(defaults.max_room_code_attempts),
            default_time_limit_secs: env_u32("GRIDMATES_TIME_LIMIT_SECS")
                .unwrap_or(defaults.default_time_limit_secs),
            reconnect_backoff: env_u32("GRIDMATES_RECONNECT_BACKOFF_MS")
                .map(|ms| Duration::from_millis(ms as u64))
                .unwrap_or(defaults.reconnect_backoff),
            max_reconnect_attempts: env_u32("GRIDMATES_RECONNECT_ATTEMPTS")
                .unwrap_or(defaults.max_reconnect_attempts),
        }
    }
}

fn env_u32(name: &str) -> Option<u32> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_env_falls_back_to_defaults() {
        // None of the GRIDMATES_* variables are set in the test env.
        let config = CoordinatorConfig::from_env();
        let defaults = CoordinatorConfig::default();
        assert_eq!(config.max_room_code_attempts, defaults.max_room_code_attempts);
        assert_eq!(config.reconnect_backoff, defaults.reconnect_backoff);
    }
}
