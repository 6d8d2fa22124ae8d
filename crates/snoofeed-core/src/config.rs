//! Process configuration, loaded once from environment variables.
//!
//! Every knob has a default matching public Reddit's tolerances, so a bare
//! `Config::default()` is usable offline and in tests. Values are immutable
//! for the process lifetime.

use std::time::Duration;

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Result cache sizing and lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub capacity: usize,
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300),
            capacity: 100,
            enabled: true,
        }
    }
}

/// Outbound admission quota.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub calls_per_window: u32,
    pub window: Duration,
    pub enabled: bool,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            calls_per_window: 60,
            window: Duration::from_secs(60),
            enabled: true,
        }
    }
}

/// Exponential backoff schedule for transient failures.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    pub max_retries: u32,
    /// Random +/- 50% spread on each delay. Off by default so retry timing
    /// stays deterministic.
    pub jitter: bool,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            max_retries: 3,
            jitter: false,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (0-based), capped at `max_delay`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let scale = self.multiplier.powi(attempt as i32);
        let seconds = self.initial_delay.as_secs_f64() * scale;
        let capped = seconds.min(self.max_delay.as_secs_f64());
        let mut delay = Duration::from_secs_f64(capped);

        if self.jitter {
            let spread_ms = (delay.as_millis() as f64 * 0.5) as u64;
            if spread_ms > 0 {
                let offset = fastrand::u64(0..=(spread_ms * 2)) as i64 - spread_ms as i64;
                let total_ms = delay.as_millis() as i64 + offset;
                delay = Duration::from_millis(total_ms.max(0) as u64);
            }
        }

        delay
    }
}

/// HTTP request behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestConfig {
    pub timeout: Duration,
    pub backoff: BackoffPolicy,
    pub user_agent: String,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            backoff: BackoffPolicy::default(),
            user_agent: String::from(DEFAULT_USER_AGENT),
        }
    }
}

/// Remote endpoint parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedditConfig {
    pub base_url: String,
    pub max_items_per_request: u32,
    pub default_limit: u32,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("https://www.reddit.com"),
            max_items_per_request: 100,
            default_limit: 25,
        }
    }
}

/// Aggregate process configuration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
    pub request: RequestConfig,
    pub reddit: RedditConfig,
}

impl Config {
    /// Load configuration from `SNOOFEED_*` environment variables.
    ///
    /// Unset or unparseable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache: CacheConfig {
                ttl: Duration::from_secs(env_u64("SNOOFEED_CACHE_TTL_SECS", 300)),
                capacity: env_u64("SNOOFEED_CACHE_CAPACITY", 100) as usize,
                enabled: env_bool("SNOOFEED_CACHE_ENABLED", true),
            },
            rate_limit: RateLimitConfig {
                calls_per_window: env_u64("SNOOFEED_RATE_LIMIT_CALLS", 60) as u32,
                window: Duration::from_secs(env_u64("SNOOFEED_RATE_LIMIT_WINDOW_SECS", 60)),
                enabled: env_bool("SNOOFEED_RATE_LIMIT_ENABLED", true),
            },
            request: RequestConfig {
                timeout: Duration::from_secs(env_u64("SNOOFEED_REQUEST_TIMEOUT_SECS", 30)),
                backoff: BackoffPolicy {
                    initial_delay: Duration::from_secs_f64(env_f64("SNOOFEED_RETRY_DELAY_SECS", 1.0)),
                    max_delay: Duration::from_secs_f64(env_f64("SNOOFEED_MAX_RETRY_DELAY_SECS", 60.0)),
                    max_retries: env_u64("SNOOFEED_MAX_RETRIES", 3) as u32,
                    ..BackoffPolicy::default()
                },
                user_agent: env_string("SNOOFEED_USER_AGENT", &defaults.request.user_agent),
            },
            reddit: RedditConfig {
                base_url: env_string("SNOOFEED_BASE_URL", &defaults.reddit.base_url),
                max_items_per_request: env_u64("SNOOFEED_MAX_ITEMS", 100) as u32,
                default_limit: env_u64("SNOOFEED_DEFAULT_LIMIT", 25) as u32,
            },
        }
    }
}

fn env_u64(name: &str, default: u64) -> u64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

fn env_f64(name: &str, default: f64) -> f64 {
    std::env::var(name)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .filter(|value: &f64| value.is_finite() && *value >= 0.0)
        .unwrap_or(default)
}

fn env_bool(name: &str, default: bool) -> bool {
    match std::env::var(name) {
        Ok(value) => value.trim().eq_ignore_ascii_case("true"),
        Err(_) => default,
    }
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| String::from(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_public_reddit_tolerances() {
        let config = Config::default();

        assert_eq!(config.cache.ttl, Duration::from_secs(300));
        assert_eq!(config.cache.capacity, 100);
        assert_eq!(config.rate_limit.calls_per_window, 60);
        assert_eq!(config.rate_limit.window, Duration::from_secs(60));
        assert_eq!(config.request.backoff.max_retries, 3);
        assert_eq!(config.reddit.base_url, "https://www.reddit.com");
        assert_eq!(config.reddit.default_limit, 25);
    }

    #[test]
    fn backoff_delay_doubles_and_caps() {
        let policy = BackoffPolicy {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
            max_retries: 5,
            jitter: false,
        };

        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(3), Duration::from_secs(5));
        assert_eq!(policy.delay(10), Duration::from_secs(5));
    }

    #[test]
    fn jittered_delay_stays_within_half_spread() {
        let policy = BackoffPolicy {
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            max_retries: 3,
            jitter: true,
        };

        for _ in 0..20 {
            let millis = policy.delay(0).as_millis();
            assert!((1000..=3000).contains(&millis), "delay {millis}ms out of range");
        }
    }
}
