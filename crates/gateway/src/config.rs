//! Connection settings for the hosted text-generation model.

use std::time::Duration;

/// DashScope text-generation endpoint used when `QWEN_MODEL_URL` is unset.
pub const DEFAULT_MODEL_URL: &str =
    "https://dashscope.aliyuncs.com/api/v1/services/aigc/text-generation/generation";

/// Model name sent with every request when `QWEN_MODEL` is unset.
pub const DEFAULT_MODEL: &str = "qwen-turbo";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Tuning knobs for [`crate::QwenGateway`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Bearer token. `None` makes every call fail with `MissingCredential`.
    pub api_key: Option<String>,
    pub model_url: String,
    pub model: String,
    /// Sampling temperature; kept low so translations are repeatable.
    pub temperature: f32,
    pub max_tokens: u32,
    /// Upper bound on a single request, connect time included.
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model_url: DEFAULT_MODEL_URL.to_owned(),
            model: DEFAULT_MODEL.to_owned(),
            temperature: 0.1,
            max_tokens: 500,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl GatewayConfig {
    /// Read `QWEN_API_KEY`, `QWEN_MODEL_URL`, `QWEN_MODEL` and
    /// `SQLFLOW_GATEWAY_TIMEOUT_SECS` from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`GatewayConfig::from_env`] with an injectable variable source.
    /// Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        Self {
            api_key: var("QWEN_API_KEY"),
            model_url: var("QWEN_MODEL_URL").unwrap_or(defaults.model_url),
            model: var("QWEN_MODEL").unwrap_or(defaults.model),
            timeout: var("SQLFLOW_GATEWAY_TIMEOUT_SECS")
                .and_then(|secs| secs.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            ..defaults
        }
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub fn with_model_url(mut self, model_url: impl Into<String>) -> Self {
        self.model_url = model_url.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = GatewayConfig::from_lookup(lookup(&[]));
        assert_eq!(config.api_key, None);
        assert_eq!(config.model_url, DEFAULT_MODEL_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = GatewayConfig::from_lookup(lookup(&[
            ("QWEN_API_KEY", "sk-test"),
            ("QWEN_MODEL_URL", "http://localhost:9000/generate"),
            ("SQLFLOW_GATEWAY_TIMEOUT_SECS", "5"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model_url, "http://localhost:9000/generate");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = GatewayConfig::from_lookup(lookup(&[("QWEN_API_KEY", "  ")]));
        assert_eq!(config.api_key, None);
    }

    #[test]
    fn unparsable_timeout_keeps_default() {
        let config =
            GatewayConfig::from_lookup(lookup(&[("SQLFLOW_GATEWAY_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
