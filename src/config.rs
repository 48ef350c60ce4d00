//! Server configuration from environment variables

use std::net::SocketAddr;

use crate::aggregate::DuplicatePolicy;

pub const DEFAULT_BIND: &str = "0.0.0.0:6574";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,
    /// How repeated trivia / word cloud answers are resolved
    pub duplicate_policy: DuplicatePolicy,
    /// Upper bound for a Q&A question, in characters
    pub max_question_chars: usize,
    /// Default number of Q&A questions returned by the results view
    pub qa_top_n: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 6574)),
            duplicate_policy: DuplicatePolicy::default(),
            max_question_chars: 280,
            qa_top_n: 10,
        }
    }
}

impl ServerConfig {
    /// Load config from environment variables.
    ///
    /// - `AUTOSPARK_BIND`: listen address (default `0.0.0.0:6574`)
    /// - `AUTOSPARK_DUPLICATE_POLICY`: `last`, `first` or `reject` (default `last`)
    /// - `AUTOSPARK_MAX_QUESTION_CHARS`: default 280
    /// - `AUTOSPARK_QA_TOP_N`: default 10
    ///
    /// Unparseable values fall back to the default with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = env_parsed("AUTOSPARK_BIND", |v| v.parse().ok())
            .unwrap_or(defaults.bind_addr);

        let duplicate_policy = env_parsed("AUTOSPARK_DUPLICATE_POLICY", DuplicatePolicy::parse)
            .unwrap_or(defaults.duplicate_policy);

        let max_question_chars = env_parsed("AUTOSPARK_MAX_QUESTION_CHARS", |v| {
            v.parse().ok().filter(|n: &usize| *n > 0)
        })
        .unwrap_or(defaults.max_question_chars);

        let qa_top_n = env_parsed("AUTOSPARK_QA_TOP_N", |v| {
            v.parse().ok().filter(|n: &usize| *n > 0)
        })
        .unwrap_or(defaults.qa_top_n);

        tracing::info!(
            "Config: bind={}, duplicate_policy={:?}, max_question_chars={}, qa_top_n={}",
            bind_addr,
            duplicate_policy,
            max_question_chars,
            qa_top_n
        );

        Self {
            bind_addr,
            duplicate_policy,
            max_question_chars,
            qa_top_n,
        }
    }
}

/// Read and parse an env var; `None` when unset or invalid
fn env_parsed<T>(key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    let parsed = parse(value);
    if parsed.is_none() {
        tracing::warn!("Ignoring invalid {}={:?}, using default", key, raw);
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: [&str; 4] = [
        "AUTOSPARK_BIND",
        "AUTOSPARK_DUPLICATE_POLICY",
        "AUTOSPARK_MAX_QUESTION_CHARS",
        "AUTOSPARK_QA_TOP_N",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_when_unset() {
        clear_env();
        let config = ServerConfig::from_env();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND);
        assert_eq!(config.duplicate_policy, DuplicatePolicy::LastWriteWins);
        assert_eq!(config.max_question_chars, 280);
        assert_eq!(config.qa_top_n, 10);
    }

    #[test]
    #[serial]
    fn test_reads_env() {
        clear_env();
        std::env::set_var("AUTOSPARK_BIND", "127.0.0.1:9000");
        std::env::set_var("AUTOSPARK_DUPLICATE_POLICY", "reject");
        std::env::set_var("AUTOSPARK_MAX_QUESTION_CHARS", "140");
        std::env::set_var("AUTOSPARK_QA_TOP_N", "5");

        let config = ServerConfig::from_env();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.duplicate_policy, DuplicatePolicy::Reject);
        assert_eq!(config.max_question_chars, 140);
        assert_eq!(config.qa_top_n, 5);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        std::env::set_var("AUTOSPARK_BIND", "not an address");
        std::env::set_var("AUTOSPARK_DUPLICATE_POLICY", "whatever");
        std::env::set_var("AUTOSPARK_QA_TOP_N", "0");

        let config = ServerConfig::from_env();
        let defaults = ServerConfig::default();
        assert_eq!(config.bind_addr, defaults.bind_addr);
        assert_eq!(config.duplicate_policy, defaults.duplicate_policy);
        assert_eq!(config.qa_top_n, defaults.qa_top_n);
        clear_env();
    }
}
