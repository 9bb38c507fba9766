use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub backend: BackendConfig,
    pub feed: FeedConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the hosted backend project.
    pub url: String,
    /// Capacity of each realtime change channel before slow consumers lag.
    pub realtime_channel_capacity: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Rows per page in live list views.
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Bucket that holds profile avatars.
    pub avatar_bucket: String,
    /// Upload cap for avatar images, in bytes.
    pub avatar_max_bytes: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                url: "http://localhost:54321".to_string(),
                realtime_channel_capacity: 256,
            },
            feed: FeedConfig { page_size: 10 },
            storage: StorageConfig {
                avatar_bucket: "avatars".to_string(),
                avatar_max_bytes: 2 * 1024 * 1024, // 2MB
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("SHOPDESK_BACKEND_URL") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                cfg.backend.url = trimmed.to_string();
            }
        }
        if let Ok(v) = std::env::var("SHOPDESK_REALTIME_CAPACITY") {
            if let Some(value) = parse_usize(&v) {
                cfg.backend.realtime_channel_capacity = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("SHOPDESK_PAGE_SIZE") {
            if let Some(value) = parse_usize(&v) {
                cfg.feed.page_size = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("SHOPDESK_AVATAR_BUCKET") {
            let trimmed = v.trim();
            if !trimmed.is_empty() {
                cfg.storage.avatar_bucket = trimmed.to_string();
            }
        }
        if let Ok(v) = std::env::var("SHOPDESK_AVATAR_MAX_BYTES") {
            if let Some(value) = parse_usize(&v) {
                cfg.storage.avatar_max_bytes = value;
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.backend.url.is_empty() {
            return Err("Backend url must not be empty".to_string());
        }
        if self.backend.realtime_channel_capacity == 0 {
            return Err("Realtime channel capacity must be greater than 0".to_string());
        }
        if self.feed.page_size == 0 {
            return Err("Feed page_size must be greater than 0".to_string());
        }
        if self.storage.avatar_max_bytes == 0 {
            return Err("Avatar max bytes must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_page_size_rejected() {
        let mut cfg = AppConfig::default();
        cfg.feed.page_size = 0;
        assert!(cfg.validate().is_err());
    }
}
