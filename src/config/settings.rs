use crate::core::ranker::RankerOptions;
use crate::domain::model::GameId;
use crate::utils::error::{GuildError, Result};
use crate::utils::retry::RetryPolicy;
use crate::utils::validation::{
    validate_non_empty_string, validate_open_range, validate_positive_number, validate_url,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://guild-ratings.example.org/api";
pub const EXPANSION_CATEGORY: &str = "Expansion for Base-game";
pub const DEFAULT_GAME_RATING: f64 = 5.5;
pub const SIGNIFICANCE_RATIO: f64 = 0.05;
/// Ten years; longer lifetimes are not meaningful for service responses.
pub const MAX_CACHE_TTL_HOURS: i64 = 24 * 365 * 10;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub service: ServiceSettings,
    pub retry: RetrySettings,
    pub filter: FilterSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub user_agent: String,
    pub concurrency: usize,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: 30,
            user_agent: format!("guild-ratings/{}", env!("CARGO_PKG_VERSION")),
            concurrency: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 500,
            max_delay_ms: 8000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSettings {
    pub ignored_games: Vec<GameId>,
    pub significance_ratio: f64,
    pub expansion_category: String,
    pub default_rating: f64,
}

impl Default for FilterSettings {
    fn default() -> Self {
        Self {
            ignored_games: Vec::new(),
            significance_ratio: SIGNIFICANCE_RATIO,
            expansion_category: EXPANSION_CATEGORY.to_string(),
            default_rating: DEFAULT_GAME_RATING,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub directory: Option<String>,
    pub ttl_hours: i64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: None,
            ttl_hours: 24,
        }
    }
}

impl Settings {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GuildError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析設定，缺少的欄位使用預設值
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| GuildError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GUILD_API_URL})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| GuildError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
            max_delay: Duration::from_millis(self.retry.max_delay_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.service.timeout_seconds)
    }

    pub fn ranker_options(&self, limit: Option<usize>) -> RankerOptions {
        RankerOptions {
            ignored_games: self.filter.ignored_games.iter().copied().collect(),
            significance_ratio: self.filter.significance_ratio,
            expansion_category: self.filter.expansion_category.clone(),
            default_rating: self.filter.default_rating,
            concurrency: self.service.concurrency,
            retry: self.retry_policy(),
            limit,
        }
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validate_url("service.base_url", &self.service.base_url)?;
        validate_non_empty_string("service.user_agent", &self.service.user_agent)?;
        validate_positive_number(
            "service.timeout_seconds",
            self.service.timeout_seconds as usize,
            1,
        )?;
        validate_positive_number("service.concurrency", self.service.concurrency, 1)?;
        validate_positive_number("retry.max_attempts", self.retry.max_attempts as usize, 1)?;
        validate_open_range(
            "filter.significance_ratio",
            self.filter.significance_ratio,
            0.0,
            1.0,
        )?;
        validate_non_empty_string("filter.expansion_category", &self.filter.expansion_category)?;
        if !self.filter.default_rating.is_finite() {
            return Err(GuildError::InvalidConfigValueError {
                field: "filter.default_rating".to_string(),
                value: self.filter.default_rating.to_string(),
                reason: "Rating must be a finite number".to_string(),
            });
        }
        if let Some(dir) = &self.cache.directory {
            crate::utils::validation::validate_path("cache.directory", dir)?;
        }
        if !(0..=MAX_CACHE_TTL_HOURS).contains(&self.cache.ttl_hours) {
            return Err(GuildError::InvalidConfigValueError {
                field: "cache.ttl_hours".to_string(),
                value: self.cache.ttl_hours.to_string(),
                reason: format!("TTL must be between 0 and {} hours", MAX_CACHE_TTL_HOURS),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_document_uses_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.filter.significance_ratio, 0.05);
        assert_eq!(settings.filter.expansion_category, "Expansion for Base-game");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_settings() {
        let toml_content = r#"
[service]
base_url = "http://localhost:9000"
concurrency = 4

[retry]
max_attempts = 2

[filter]
ignored_games = [13, 822]
"#;

        let settings = Settings::from_toml_str(toml_content).unwrap();

        assert_eq!(settings.service.base_url, "http://localhost:9000");
        assert_eq!(settings.service.concurrency, 4);
        assert_eq!(settings.service.timeout_seconds, 30);
        assert_eq!(settings.retry.max_attempts, 2);
        assert_eq!(settings.retry.initial_delay_ms, 500);
        assert_eq!(settings.filter.ignored_games, vec![13, 822]);

        let options = settings.ranker_options(Some(10));
        assert!(options.ignored_games.contains(&822));
        assert_eq!(options.concurrency, 4);
        assert_eq!(options.limit, Some(10));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("GUILD_RATINGS_TEST_URL", "https://test.api.com");

        let toml_content = r#"
[service]
base_url = "${GUILD_RATINGS_TEST_URL}"
"#;

        let settings = Settings::from_toml_str(toml_content).unwrap();
        assert_eq!(settings.service.base_url, "https://test.api.com");

        std::env::remove_var("GUILD_RATINGS_TEST_URL");
    }

    #[test]
    fn test_settings_validation() {
        let settings = Settings::from_toml_str(
            r#"
[service]
base_url = "invalid-url"
"#,
        )
        .unwrap();
        assert!(settings.validate().is_err());

        let settings = Settings::from_toml_str(
            r#"
[filter]
significance_ratio = 1.5
"#,
        )
        .unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[cache]\ndirectory = \"/tmp/guild-cache\"\nttl_hours = 6\n")
            .unwrap();

        let settings = Settings::from_file(temp_file.path()).unwrap();
        assert_eq!(settings.cache.directory.as_deref(), Some("/tmp/guild-cache"));
        assert_eq!(settings.cache.ttl_hours, 6);
    }

    #[test]
    fn test_cache_ttl_bounds() {
        let settings = Settings::from_toml_str("[cache]\nttl_hours = 9000000000000\n").unwrap();
        assert!(matches!(
            settings.validate(),
            Err(GuildError::InvalidConfigValueError { ref field, .. }) if field == "cache.ttl_hours"
        ));

        let settings = Settings::from_toml_str("[cache]\nttl_hours = -1\n").unwrap();
        assert!(settings.validate().is_err());

        let settings = Settings::from_toml_str(&format!(
            "[cache]\nttl_hours = {}\n",
            MAX_CACHE_TTL_HOURS
        ))
        .unwrap();
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = Settings::from_toml_str("[service\nbase_url = 1").unwrap_err();
        assert!(matches!(err, GuildError::ConfigValidationError { .. }));
    }
}
