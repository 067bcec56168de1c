use {
    crate::domain::money::{Currency, MoneyAmount},
    crate::domain::order::PricingRules,
    std::{env, fmt, str::FromStr, sync::Arc},
    thiserror::Error,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Printed as `****` in logs and debug output.
#[derive(Clone)]
pub struct Secret(Arc<str>);

impl Secret {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

/// Gateway credentials. Each may be absent at startup; the endpoints that
/// need one fail closed when it is.
#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: Option<String>,
    pub key_secret: Option<Secret>,
    pub webhook_secret: Option<Secret>,
    pub api_base: String,
}

impl Default for RazorpayConfig {
    fn default() -> Self {
        Self {
            key_id: None,
            key_secret: None,
            webhook_secret: None,
            api_base: "https://api.razorpay.com".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub jwt_secret: Secret,
    pub razorpay: RazorpayConfig,
    pub pricing: PricingRules,
}

fn optional(key: &'static str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    optional(key).ok_or(ConfigError::Missing(key))
}

fn parsed<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match optional(key) {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}

impl Config {
    /// Read configuration from the process environment. Call
    /// `dotenvy::dotenv()` first to pick up a local `.env`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = PricingRules::default();

        let currency = match optional("PAYMENT_CURRENCY") {
            None => defaults.currency,
            Some(raw) => Currency::try_from(raw.as_str()).map_err(|e| ConfigError::Invalid {
                key: "PAYMENT_CURRENCY",
                reason: e.to_string(),
            })?,
        };

        let pricing = PricingRules {
            shipping_fee: MoneyAmount::from_unsigned(parsed(
                "SHIPPING_FEE_MINOR",
                defaults.shipping_fee.minor_units() as u32,
            )?),
            free_shipping_above: MoneyAmount::from_unsigned(parsed(
                "FREE_SHIPPING_ABOVE_MINOR",
                defaults.free_shipping_above.minor_units() as u32,
            )?),
            tax_rate_bps: parsed("TAX_RATE_BPS", defaults.tax_rate_bps)?,
            currency,
        };

        let razorpay = RazorpayConfig {
            key_id: optional("RAZORPAY_KEY_ID"),
            key_secret: optional("RAZORPAY_KEY_SECRET").map(Secret::new),
            webhook_secret: optional("RAZORPAY_WEBHOOK_SECRET").map(Secret::new),
            api_base: optional("RAZORPAY_API_BASE")
                .unwrap_or_else(|| RazorpayConfig::default().api_base),
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            jwt_secret: Secret::new(required("JWT_SECRET")?),
            razorpay,
            pricing,
        })
    }
}
