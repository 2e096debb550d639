//! # Sales Configuration
//!
//! Store policy for the sale engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     OPTICA_DB_PATH=/var/lib/optica/optica.db                           │
//! │     OPTICA_ALLOW_NEGATIVE_STOCK=true                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/sales/sales.toml (Linux)                                 │
//! │     ~/Library/Application Support/com.optica.sales/sales.toml (macOS)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     5% commission, 1 centavo tolerance, 30-day installments            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "optica.db"
//! max_connections = 5
//!
//! [sales]
//! default_commission_bps = 500
//! payment_tolerance_cents = 1
//! allow_negative_stock = false
//!
//! [installments]
//! default_interval_days = 30
//! max_installments = 24
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{SaleError, SaleResult};
use optica_core::{
    CommissionCalculator, Rate, DEFAULT_COMMISSION_BPS, DEFAULT_INSTALLMENT_INTERVAL_DAYS,
    MAX_INSTALLMENTS, PAYMENT_TOLERANCE_CENTS,
};
use optica_db::DbConfig;

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file path.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("optica.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Sale Policy
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalePolicy {
    /// Commission for sellers without a personal rate, in basis points.
    #[serde(default = "default_commission_bps")]
    pub default_commission_bps: u32,

    /// Allowed gap between Σ payments and the sale total, in centavos.
    #[serde(default = "default_tolerance")]
    pub payment_tolerance_cents: i64,

    /// Let stock-controlled products go below zero.
    #[serde(default)]
    pub allow_negative_stock: bool,
}

fn default_commission_bps() -> u32 {
    DEFAULT_COMMISSION_BPS
}

fn default_tolerance() -> i64 {
    PAYMENT_TOLERANCE_CENTS
}

impl Default for SalePolicy {
    fn default() -> Self {
        SalePolicy {
            default_commission_bps: default_commission_bps(),
            payment_tolerance_cents: default_tolerance(),
            allow_negative_stock: false,
        }
    }
}

// =============================================================================
// Installment Policy
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallmentPolicy {
    /// Days between due dates when the request doesn't say.
    #[serde(default = "default_interval_days")]
    pub default_interval_days: u32,

    /// Ceiling for store-credit and card installment counts.
    #[serde(default = "default_max_installments")]
    pub max_installments: u32,
}

fn default_interval_days() -> u32 {
    DEFAULT_INSTALLMENT_INTERVAL_DAYS
}

fn default_max_installments() -> u32 {
    MAX_INSTALLMENTS
}

impl Default for InstallmentPolicy {
    fn default() -> Self {
        InstallmentPolicy {
            default_interval_days: default_interval_days(),
            max_installments: default_max_installments(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete sale engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SalesConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub sales: SalePolicy,

    #[serde(default)]
    pub installments: InstallmentPolicy,
}

impl SalesConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (sales.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> SaleResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading sales config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load sales config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> SaleResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| SaleError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SaleError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| SaleError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Sales config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> SaleResult<()> {
        if self.sales.default_commission_bps > 10_000 {
            return Err(SaleError::InvalidConfig(format!(
                "default_commission_bps must be at most 10000, got {}",
                self.sales.default_commission_bps
            )));
        }

        if !(0..=100).contains(&self.sales.payment_tolerance_cents) {
            return Err(SaleError::InvalidConfig(format!(
                "payment_tolerance_cents must be between 0 and 100, got {}",
                self.sales.payment_tolerance_cents
            )));
        }

        if self.installments.default_interval_days == 0 {
            return Err(SaleError::InvalidConfig(
                "default_interval_days must be greater than 0".into(),
            ));
        }

        if !(2..=120).contains(&self.installments.max_installments) {
            return Err(SaleError::InvalidConfig(format!(
                "max_installments must be between 2 and 120, got {}",
                self.installments.max_installments
            )));
        }

        if self.database.max_connections == 0 {
            return Err(SaleError::InvalidConfig(
                "max_connections must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("OPTICA_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Ok(bps) = std::env::var("OPTICA_DEFAULT_COMMISSION_BPS") {
            match bps.parse::<u32>() {
                Ok(v) => self.sales.default_commission_bps = v,
                Err(_) => warn!(value = %bps, "Ignoring invalid OPTICA_DEFAULT_COMMISSION_BPS"),
            }
        }

        if let Ok(cents) = std::env::var("OPTICA_PAYMENT_TOLERANCE_CENTS") {
            match cents.parse::<i64>() {
                Ok(v) => self.sales.payment_tolerance_cents = v,
                Err(_) => warn!(value = %cents, "Ignoring invalid OPTICA_PAYMENT_TOLERANCE_CENTS"),
            }
        }

        if let Ok(flag) = std::env::var("OPTICA_ALLOW_NEGATIVE_STOCK") {
            match flag.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.sales.allow_negative_stock = true,
                "0" | "false" | "no" => self.sales.allow_negative_stock = false,
                _ => warn!(value = %flag, "Ignoring invalid OPTICA_ALLOW_NEGATIVE_STOCK"),
            }
        }

        if let Ok(days) = std::env::var("OPTICA_INSTALLMENT_INTERVAL_DAYS") {
            match days.parse::<u32>() {
                Ok(v) => self.installments.default_interval_days = v,
                Err(_) => warn!(value = %days, "Ignoring invalid OPTICA_INSTALLMENT_INTERVAL_DAYS"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "optica", "sales")
            .map(|dirs| dirs.config_dir().join("sales.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Pool settings for [`optica_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
    }

    pub fn commission_calculator(&self) -> CommissionCalculator {
        CommissionCalculator::new(Rate::from_bps(self.sales.default_commission_bps))
    }
}
