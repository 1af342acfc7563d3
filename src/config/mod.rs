use dashmap::DashMap;
use std::env;
use std::str::FromStr;
use std::sync::Arc;

/// Environment variables with this prefix seed [`ConfigService::from_env`].
const ENV_PREFIX: &str = "MODULITH_";

/// Key/value configuration handed to modules through the module context.
#[derive(Clone, Default)]
pub struct ConfigService {
    values: Arc<DashMap<String, String>>,
}

impl ConfigService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration seeded from `MODULITH_*` environment variables.
    ///
    /// The prefix is stripped and the remainder lowercased, so
    /// `MODULITH_WORKER_COUNT=4` becomes the key `worker_count`.
    pub fn from_env() -> Self {
        let config = Self::default();
        for (key, value) in env::vars() {
            if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
                config.set(stripped.to_lowercase(), value);
            }
        }
        config
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.clone())
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    /// Parse a value into any `FromStr` type; `None` if absent or unparsable.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).map(|v| {
            matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            )
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
