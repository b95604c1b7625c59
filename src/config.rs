//! Configuration for the EXMO Sniper
//!
//! Loaded from environment variables (and `.env`) or from a TOML file.
//! CLI flags override whatever was loaded.

use eyre::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::cartographer::{DEFAULT_CACHE_TTL_SECS, DEFAULT_TIMEOUT_SECS, EXMO_BASE_URL};

// ============================================
// OUTPUT FORMAT
// ============================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Coloured table for humans
    #[default]
    Table,

    /// One JSON document per scan
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "TABLE"),
            OutputFormat::Json => write!(f, "JSON"),
        }
    }
}

// ============================================
// MAIN CONFIGURATION
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // ========== Exchange ==========
    /// EXMO API base URL
    pub api_url: String,

    /// Per-request timeout
    pub http_timeout_secs: u64,

    /// How long currency list and pair settings stay cached
    pub cache_ttl_secs: u64,

    // ========== Universe ==========
    /// Only scan these currencies (if non-empty)
    pub whitelisted_currencies: Vec<String>,

    /// Never scan these currencies
    pub blacklisted_currencies: Vec<String>,

    // ========== Output ==========
    /// Rows shown by the `top` view
    pub top_results: usize,

    /// Hide loops below this profit (percent, may be negative)
    pub min_profit_pct: Option<f64>,

    pub output: OutputFormat,

    // ========== Watch mode ==========
    /// Seconds between scans
    pub scan_interval_secs: u64,
}

impl Config {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Ok(Self {
            api_url: env::var("EXMO_API_URL").unwrap_or(defaults.api_url),
            http_timeout_secs: env_parse("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs),
            cache_ttl_secs: env_parse("CACHE_TTL_SECS", defaults.cache_ttl_secs),

            whitelisted_currencies: env_list("WHITELISTED_CURRENCIES"),
            blacklisted_currencies: env_list("BLACKLISTED_CURRENCIES"),

            top_results: env_parse("TOP_RESULTS", defaults.top_results),
            min_profit_pct: env::var("MIN_PROFIT_PCT").ok().and_then(|v| v.parse().ok()),
            output: match env::var("OUTPUT_FORMAT")
                .unwrap_or_default()
                .to_lowercase()
                .as_str()
            {
                "json" => OutputFormat::Json,
                _ => OutputFormat::Table,
            },

            scan_interval_secs: env_parse("SCAN_INTERVAL_SECS", defaults.scan_interval_secs),
        })
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(eyre::eyre!(
                "Invalid EXMO_API_URL '{}' - must be an http(s) URL",
                self.api_url
            ));
        }
        if self.http_timeout_secs == 0 {
            return Err(eyre::eyre!("HTTP_TIMEOUT_SECS must be at least 1"));
        }
        if self.top_results == 0 {
            return Err(eyre::eyre!("TOP_RESULTS must be at least 1"));
        }
        if self.scan_interval_secs == 0 {
            return Err(eyre::eyre!("SCAN_INTERVAL_SECS must be at least 1"));
        }

        let overlap: Vec<_> = self
            .whitelisted_currencies
            .iter()
            .filter(|c| {
                self.blacklisted_currencies
                    .iter()
                    .any(|b| b.eq_ignore_ascii_case(c))
            })
            .collect();
        if !overlap.is_empty() {
            return Err(eyre::eyre!(
                "Currencies both whitelisted and blacklisted: {:?}",
                overlap
            ));
        }

        Ok(())
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        let list = |codes: &[String]| {
            if codes.is_empty() {
                "-".to_string()
            } else {
                codes.join(",")
            }
        };

        println!("╔════════════════════════════════════════════════════════════╗");
        println!("║              EXMO SNIPER - CONFIGURATION                   ║");
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ API URL:           {:<40} ║", self.api_url);
        println!("║ HTTP Timeout:      {:<38}s ║", self.http_timeout_secs);
        println!("║ Cache TTL:         {:<38}s ║", self.cache_ttl_secs);
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ UNIVERSE                                                   ║");
        println!("║ • Whitelist:       {:<40} ║", list(&self.whitelisted_currencies));
        println!("║ • Blacklist:       {:<40} ║", list(&self.blacklisted_currencies));
        println!("╠════════════════════════════════════════════════════════════╣");
        println!("║ OUTPUT                                                     ║");
        println!("║ • Format:          {:<40} ║", self.output);
        println!("║ • Top Results:     {:<40} ║", self.top_results);
        println!(
            "║ • Min Profit:      {:<40} ║",
            self.min_profit_pct
                .map(|p| format!("{:.4}%", p))
                .unwrap_or_else(|| "show all".to_string())
        );
        println!("║ • Scan Interval:   {:<38}s ║", self.scan_interval_secs);
        println!("╚════════════════════════════════════════════════════════════╝");
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: EXMO_BASE_URL.to_string(),
            http_timeout_secs: DEFAULT_TIMEOUT_SECS,
            cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            whitelisted_currencies: vec![],
            blacklisted_currencies: vec![],
            top_results: 10,
            min_profit_pct: None,
            output: OutputFormat::Table,
            scan_interval_secs: 30,
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_list(key: &str) -> Vec<String> {
    env::var(key)
        .map(|s| {
            s.split(',')
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

// ============================================
// TESTS
// ============================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api_url, "https://api.exmo.com/v1");
        assert_eq!(config.cache_ttl_secs, 24 * 60 * 60);
        assert_eq!(config.top_results, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = Config {
            api_url: "ftp://exmo".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            top_results: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            whitelisted_currencies: vec!["BTC".to_string()],
            blacklisted_currencies: vec!["btc".to_string()],
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            top_results = 25
            output = "json"
            blacklisted_currencies = ["DOGE"]
            "#,
        )
        .unwrap();

        assert_eq!(config.top_results, 25);
        assert_eq!(config.output, OutputFormat::Json);
        assert_eq!(config.blacklisted_currencies, vec!["DOGE".to_string()]);
        assert_eq!(config.api_url, EXMO_BASE_URL);
    }

    #[test]
    fn test_toml_roundtrip_through_file() {
        let path = std::env::temp_dir().join(format!("exmo-sniper-{}.toml", std::process::id()));
        let config = Config {
            min_profit_pct: Some(0.25),
            ..Config::default()
        };

        config.save_to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded.min_profit_pct, Some(0.25));
        assert_eq!(loaded.scan_interval_secs, config.scan_interval_secs);
    }
}
