use std::time::Duration;

pub const DEFAULT_STORY_COUNT: usize = 4;
pub const DEFAULT_RECENT_TITLE_LIMIT: usize = 10;
pub const DEFAULT_REGION: &str = "Canada";
pub const DEFAULT_AI_AUTHOR: &str = "AI News Desk";
pub const DEFAULT_USER_LOCATION: &str = "Toronto";
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(20);
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_IMAGE_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(5);
pub const DEFAULT_BUSY_NOTICE_TTL: Duration = Duration::from_secs(3);

/// Tuning for the feed: what to ask the model for and how often.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Stories requested per refresh.
    pub story_count: usize,
    /// How many of the newest titles are sent as a "do not repeat" hint.
    pub recent_title_limit: usize,
    /// Region the model is asked about; also the location stamped on its stories.
    pub region: String,
    pub ai_author: String,
    /// Reader location used for the feed filter and for submitted stories.
    pub user_location: String,
    pub initial_delay: Duration,
    pub refresh_interval: Duration,
    /// Pause between two image requests.
    pub image_delay: Duration,
    pub notice_ttl: Duration,
    pub busy_notice_ttl: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            story_count: DEFAULT_STORY_COUNT,
            recent_title_limit: DEFAULT_RECENT_TITLE_LIMIT,
            region: DEFAULT_REGION.to_string(),
            ai_author: DEFAULT_AI_AUTHOR.to_string(),
            user_location: DEFAULT_USER_LOCATION.to_string(),
            initial_delay: DEFAULT_INITIAL_DELAY,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            image_delay: DEFAULT_IMAGE_DELAY,
            notice_ttl: DEFAULT_NOTICE_TTL,
            busy_notice_ttl: DEFAULT_BUSY_NOTICE_TTL,
        }
    }
}

impl IngestConfig {
    /// Defaults overridden by environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `MCN_STORY_COUNT` | `4` |
    /// | `MCN_RECENT_TITLES` | `10` |
    /// | `MCN_REGION` | `Canada` |
    /// | `MCN_LOCATION` | `Toronto` |
    /// | `MCN_INITIAL_DELAY_SECS` | `20` |
    /// | `MCN_REFRESH_INTERVAL_SECS` | `600` |
    /// | `MCN_IMAGE_DELAY_MS` | `2000` |
    /// | `MCN_NOTICE_TTL_MS` | `5000` |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            story_count: env_parse("MCN_STORY_COUNT").unwrap_or(defaults.story_count).max(1),
            recent_title_limit: env_parse("MCN_RECENT_TITLES").unwrap_or(defaults.recent_title_limit),
            region: std::env::var("MCN_REGION").unwrap_or(defaults.region),
            ai_author: defaults.ai_author,
            user_location: std::env::var("MCN_LOCATION").unwrap_or(defaults.user_location),
            initial_delay: env_parse("MCN_INITIAL_DELAY_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.initial_delay),
            refresh_interval: env_parse("MCN_REFRESH_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.refresh_interval),
            image_delay: env_parse("MCN_IMAGE_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.image_delay),
            notice_ttl: env_parse("MCN_NOTICE_TTL_MS")
                .map(Duration::from_millis)
                .unwrap_or(defaults.notice_ttl),
            busy_notice_ttl: defaults.busy_notice_ttl,
        }
    }

    pub fn with_user_location(mut self, location: impl Into<String>) -> Self {
        self.user_location = location.into();
        self
    }

    pub fn with_schedule(mut self, initial_delay: Duration, refresh_interval: Duration) -> Self {
        self.initial_delay = initial_delay;
        self.refresh_interval = refresh_interval;
        self
    }

    pub fn with_image_delay(mut self, delay: Duration) -> Self {
        self.image_delay = delay;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_product_behavior() {
        let config = IngestConfig::default();
        assert_eq!(config.story_count, 4);
        assert_eq!(config.recent_title_limit, 10);
        assert_eq!(config.initial_delay, Duration::from_secs(20));
        assert_eq!(config.refresh_interval, Duration::from_secs(600));
        assert_eq!(config.image_delay, Duration::from_secs(2));
        assert_eq!(config.notice_ttl, Duration::from_secs(5));
    }

    #[test]
    fn test_from_env_overrides_and_falls_back() {
        std::env::set_var("MCN_STORY_COUNT", " 6 ");
        std::env::set_var("MCN_REGION", "Ontario");
        std::env::set_var("MCN_REFRESH_INTERVAL_SECS", "soon");
        std::env::set_var("MCN_IMAGE_DELAY_MS", "-5");
        std::env::set_var("MCN_NOTICE_TTL_MS", "1500");

        let config = IngestConfig::from_env();

        for key in [
            "MCN_STORY_COUNT",
            "MCN_REGION",
            "MCN_REFRESH_INTERVAL_SECS",
            "MCN_IMAGE_DELAY_MS",
            "MCN_NOTICE_TTL_MS",
        ] {
            std::env::remove_var(key);
        }

        assert_eq!(config.story_count, 6);
        assert_eq!(config.region, "Ontario");
        assert_eq!(config.notice_ttl, Duration::from_millis(1500));
        assert_eq!(config.refresh_interval, DEFAULT_REFRESH_INTERVAL);
        assert_eq!(config.image_delay, DEFAULT_IMAGE_DELAY);
        assert_eq!(config.ai_author, DEFAULT_AI_AUTHOR);
    }

    #[test]
    fn test_builders() {
        let config = IngestConfig::default()
            .with_user_location("Ottawa")
            .with_schedule(Duration::from_secs(1), Duration::from_secs(30))
            .with_image_delay(Duration::ZERO);
        assert_eq!(config.user_location, "Ottawa");
        assert_eq!(config.refresh_interval, Duration::from_secs(30));
        assert_eq!(config.image_delay, Duration::ZERO);
    }
}
