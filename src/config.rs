//! Configuration types.
//!
//! Everything the engine needs is passed in through [`IntakeConfig`]; only the
//! binary reads the process environment, via [`IntakeConfig::from_env`].

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Environment variable naming the completion proxy endpoint.
pub const PROXY_URL_VAR: &str = "CHATBOT_PROXY_URL";

pub const DEFAULT_MODEL: &str = "llama-3.1-70b-versatile";
pub const DEFAULT_MAX_TOKENS: u32 = 600;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_PORT: u16 = 8080;

/// Facts about the consultancy that the assistant is allowed to talk about.
#[derive(Debug, Clone)]
pub struct CompanyProfile {
    pub name: String,
    pub tagline: String,
    pub services: Vec<String>,
    pub contact_email: String,
    pub phone: String,
    pub location: String,
    pub stats: Vec<String>,
}

impl Default for CompanyProfile {
    fn default() -> Self {
        Self {
            name: "BrijTech".to_string(),
            tagline: "Bridging Technology Gaps with AI Solutions".to_string(),
            services: vec![
                "Custom Software Development".to_string(),
                "Web & Mobile Apps".to_string(),
                "Cloud & DevOps".to_string(),
                "AI/ML Solutions".to_string(),
                "UI/UX Design".to_string(),
            ],
            contact_email: "brijtech2025@gmail.com".to_string(),
            phone: "+1 (555) 123-4567".to_string(),
            location: "San Francisco, CA".to_string(),
            stats: vec![
                "500+ AI Solutions Delivered".to_string(),
                "98% Client Satisfaction".to_string(),
                "50+ Businesses Transformed".to_string(),
            ],
        }
    }
}

/// How the binary exposes the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// JSON API for the website widget.
    Server,
    /// Local stdin/stdout conversation.
    Cli,
}

/// Intake engine and service configuration.
#[derive(Debug, Clone)]
pub struct IntakeConfig {
    /// Completion proxy endpoint. `None` means every turn uses canned replies.
    pub proxy_url: Option<String>,
    /// Bearer token for proxies that require one.
    pub api_key: Option<SecretString>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Transport timeout. Unset by default; the HTTP client's own default applies.
    pub request_timeout: Option<Duration>,
    /// Sessions are pruned after this much inactivity.
    pub session_idle_timeout: Duration,
    pub company: CompanyProfile,
    pub port: u16,
    pub mode: RunMode,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            proxy_url: None,
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            request_timeout: None,
            session_idle_timeout: Duration::from_secs(30 * 60),
            company: CompanyProfile::default(),
            port: DEFAULT_PORT,
            mode: RunMode::Server,
        }
    }
}

impl IntakeConfig {
    /// Build configuration from environment variables.
    ///
    /// All variables are optional:
    /// - `CHATBOT_PROXY_URL`: completion proxy endpoint
    /// - `CHATBOT_PROXY_KEY`: bearer token for the proxy
    /// - `CHATBOT_MODEL`: default `llama-3.1-70b-versatile`
    /// - `CHATBOT_MAX_TOKENS`: default 600
    /// - `CHATBOT_TEMPERATURE`: default 0.7, must be within 0..=2
    /// - `CHATBOT_TIMEOUT_SECS`: transport timeout, unset by default
    /// - `INTAKE_SESSION_IDLE_MIN`: default 30
    /// - `INTAKE_PORT`: default 8080
    /// - `INTAKE_MODE`: `server` (default) or `cli`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();

        let temperature = match get("CHATBOT_TEMPERATURE") {
            Some(raw) => parse_value::<f32>("CHATBOT_TEMPERATURE", &raw)?,
            None => defaults.temperature,
        };
        if !(0.0..=2.0).contains(&temperature) {
            return Err(ConfigError::InvalidValue {
                key: "CHATBOT_TEMPERATURE".to_string(),
                message: format!("{temperature} is outside 0..=2"),
            });
        }

        let max_tokens = match get("CHATBOT_MAX_TOKENS") {
            Some(raw) => parse_value::<u32>("CHATBOT_MAX_TOKENS", &raw)?,
            None => defaults.max_tokens,
        };

        let request_timeout = get("CHATBOT_TIMEOUT_SECS")
            .map(|raw| parse_value::<u64>("CHATBOT_TIMEOUT_SECS", &raw))
            .transpose()?
            .map(Duration::from_secs);

        let session_idle_timeout = match get("INTAKE_SESSION_IDLE_MIN") {
            Some(raw) => parse_value::<u64>("INTAKE_SESSION_IDLE_MIN", &raw)?
                .checked_mul(60)
                .map(Duration::from_secs)
                .ok_or_else(|| ConfigError::InvalidValue {
                    key: "INTAKE_SESSION_IDLE_MIN".to_string(),
                    message: format!("'{raw}' minutes is out of range"),
                })?,
            None => defaults.session_idle_timeout,
        };

        let port = match get("INTAKE_PORT") {
            Some(raw) => parse_value::<u16>("INTAKE_PORT", &raw)?,
            None => defaults.port,
        };

        let mode = match get("INTAKE_MODE").as_deref() {
            None | Some("server") => RunMode::Server,
            Some("cli") => RunMode::Cli,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "INTAKE_MODE".to_string(),
                    message: format!("'{other}' (expected 'server' or 'cli')"),
                });
            }
        };

        Ok(Self {
            proxy_url: get(PROXY_URL_VAR),
            api_key: get("CHATBOT_PROXY_KEY").map(SecretString::from),
            model: get("CHATBOT_MODEL").unwrap_or(defaults.model),
            max_tokens,
            temperature,
            request_timeout,
            session_idle_timeout,
            company: defaults.company,
            port,
            mode,
        })
    }

    /// Whether a completion endpoint is configured.
    pub fn has_proxy(&self) -> bool {
        self.proxy_url.is_some()
    }
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{raw}': {e}"),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = IntakeConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.proxy_url.is_none());
        assert!(!config.has_proxy());
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, 600);
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
        assert!(config.request_timeout.is_none());
        assert_eq!(config.port, 8080);
        assert_eq!(config.mode, RunMode::Server);
    }

    #[test]
    fn reads_overrides() {
        let config = IntakeConfig::from_lookup(lookup(&[
            ("CHATBOT_PROXY_URL", "https://proxy.example.com/chat"),
            ("CHATBOT_MODEL", "small-model"),
            ("CHATBOT_MAX_TOKENS", "200"),
            ("CHATBOT_TEMPERATURE", "0"),
            ("CHATBOT_TIMEOUT_SECS", "15"),
            ("INTAKE_SESSION_IDLE_MIN", "5"),
            ("INTAKE_MODE", "cli"),
        ]))
        .unwrap();
        assert_eq!(
            config.proxy_url.as_deref(),
            Some("https://proxy.example.com/chat")
        );
        assert_eq!(config.model, "small-model");
        assert_eq!(config.max_tokens, 200);
        assert_eq!(config.request_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.session_idle_timeout, Duration::from_secs(300));
        assert_eq!(config.mode, RunMode::Cli);
    }

    #[test]
    fn blank_proxy_url_counts_as_unset() {
        let config = IntakeConfig::from_lookup(lookup(&[("CHATBOT_PROXY_URL", "   ")])).unwrap();
        assert!(config.proxy_url.is_none());
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = IntakeConfig::from_lookup(lookup(&[("CHATBOT_MAX_TOKENS", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "CHATBOT_MAX_TOKENS"));
    }

    #[test]
    fn rejects_out_of_range_temperature() {
        let err = IntakeConfig::from_lookup(lookup(&[("CHATBOT_TEMPERATURE", "3.5")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "CHATBOT_TEMPERATURE"));
    }

    #[test]
    fn rejects_idle_timeout_that_overflows() {
        let huge = u64::MAX.to_string();
        let err = IntakeConfig::from_lookup(lookup(&[("INTAKE_SESSION_IDLE_MIN", huge.as_str())]))
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "INTAKE_SESSION_IDLE_MIN")
        );
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(IntakeConfig::from_lookup(lookup(&[("INTAKE_MODE", "gui")])).is_err());
    }
}
