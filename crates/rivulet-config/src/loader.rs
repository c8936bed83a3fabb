use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        let expanded =
            crate::env::expand_env(&raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the provider configuration is invalid
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.provider.model.is_empty() {
            anyhow::bail!("provider.model must not be empty");
        }

        if self.stream.tick_interval_ms == 0 {
            anyhow::bail!("stream.tick_interval_ms must be greater than 0");
        }

        if self.stream.connect_timeout_ms == 0 || self.stream.idle_timeout_ms == 0 {
            anyhow::bail!("stream timeouts must be greater than 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;

    fn parse(raw: &str) -> anyhow::Result<Config> {
        let config: Config = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn minimal_config_parses() {
        let config = parse(
            r#"
            [provider]
            base_url = "https://api.example.com/v1"
            model = "deepseek-chat"
            "#,
        )
        .unwrap();

        assert_eq!(config.provider.model, "deepseek-chat");
        assert_eq!(config.stream.restart_delay_ms, 60);
        assert!(config.chat.temperature.is_none());
    }

    #[test]
    fn search_base_url_parses() {
        let config = parse(
            r#"
            [provider]
            base_url = "https://api.example.com/v1"
            search_base_url = "https://search.example.com/v1"
            model = "deepseek-chat"
            "#,
        )
        .unwrap();

        assert_eq!(
            config.provider.search_base_url.as_ref().map(Url::as_str),
            Some("https://search.example.com/v1"),
        );
    }

    #[test]
    fn zero_tick_interval_rejected() {
        let result = parse(
            r#"
            [provider]
            base_url = "https://api.example.com/v1"
            model = "m"

            [stream]
            tick_interval_ms = 0
            "#,
        );

        assert!(result.is_err());
    }

    #[test]
    fn unknown_fields_rejected() {
        let result = parse(
            r#"
            [provider]
            base_url = "https://api.example.com/v1"
            model = "m"
            extra = true
            "#,
        );

        assert!(result.is_err());
    }
}
