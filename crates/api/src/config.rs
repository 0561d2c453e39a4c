use dibs_core::fee::DEFAULT_PLATFORM_FEE_PERCENT;

use crate::auth::jwt::JwtConfig;

/// Distance within which a claimant may claim, in meters.
const DEFAULT_PROXIMITY_METERS: f64 = 200.0;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration (secret, expiry duration).
    pub jwt: JwtConfig,
    /// Claim arbitration and payment settings.
    pub claim: ClaimConfig,
}

/// Settings for the claim arbitrator and payment gate.
#[derive(Debug, Clone)]
pub struct ClaimConfig {
    /// Maximum claimant distance from the dip, in meters.
    pub proximity_threshold_meters: f64,
    /// Platform cut of the dip price, in percent.
    pub platform_fee_percent: u8,
    /// ISO currency code for processor holds, lowercase.
    pub currency: String,
}

impl Default for ClaimConfig {
    fn default() -> Self {
        Self {
            proximity_threshold_meters: DEFAULT_PROXIMITY_METERS,
            platform_fee_percent: DEFAULT_PLATFORM_FEE_PERCENT,
            currency: "usd".into(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `CLAIM_PROXIMITY_METERS` | `200`                    |
    /// | `PLATFORM_FEE_PERCENT` | `10`                       |
    /// | `PAYMENT_CURRENCY`     | `usd`                      |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let proximity_threshold_meters: f64 = std::env::var("CLAIM_PROXIMITY_METERS")
            .unwrap_or_else(|_| DEFAULT_PROXIMITY_METERS.to_string())
            .parse()
            .expect("CLAIM_PROXIMITY_METERS must be a valid f64");

        let platform_fee_percent: u8 = std::env::var("PLATFORM_FEE_PERCENT")
            .unwrap_or_else(|_| DEFAULT_PLATFORM_FEE_PERCENT.to_string())
            .parse()
            .expect("PLATFORM_FEE_PERCENT must be a valid u8");

        let currency = std::env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "usd".into());

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt,
            claim: ClaimConfig {
                proximity_threshold_meters,
                platform_fee_percent,
                currency,
            },
        }
    }
}
