use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

const CONFIG_PATHS: [&str; 2] = ["/etc/dispatch/bot.toml", "./bot.toml"];

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub customer_bot_token: String,
    pub driver_bot_token: String,
    pub database_url: String,
    /// Channel where completed orders are broadcast to drivers.
    pub drivers_chat_id: i64,
    #[serde(default)]
    pub driver_applications_chat_id: Option<i64>,
    pub gateway: GatewayConfig,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_order_code_prefix")]
    pub order_code_prefix: String,
    #[serde(default)]
    pub intake_listen_addr: Option<SocketAddr>,
    #[serde(default)]
    pub log_path: Option<String>,
    #[serde(skip)]
    pub loaded_from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_payments_url")]
    pub payments_url: String,
    pub shop_id: String,
    pub secret_key: String,
    #[serde(default = "default_return_url")]
    pub return_url: String,
    #[serde(default = "default_amount")]
    pub amount: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_description")]
    pub description: String,
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_order_code_prefix() -> String {
    "MOSCOW".to_string()
}

fn default_payments_url() -> String {
    "https://api.yookassa.ru/v3/payments".to_string()
}

fn default_return_url() -> String {
    "https://t.me".to_string()
}

fn default_amount() -> String {
    "500".to_string()
}

fn default_currency() -> String {
    "RUB".to_string()
}

fn default_description() -> String {
    "Ride payment".to_string()
}

impl BotConfig {
    pub fn load() -> Result<Self> {
        for path in CONFIG_PATHS {
            if let Ok(contents) = fs::read_to_string(path) {
                let mut config = Self::from_toml(&contents)
                    .with_context(|| format!("Invalid config file {}", path))?;
                config.loaded_from = path.to_string();
                return Ok(config);
            }
        }

        let mut config = Self::from_lookup(|key| std::env::var(key).ok())?;
        config.loaded_from = "environment".to_string();
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{} is not set", key))
        };
        let parsed = |key: &str| -> Result<Option<i64>> {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(|v| parse_value(key, &v))
                .transpose()
        };

        let gateway = GatewayConfig {
            payments_url: lookup("GATEWAY_PAYMENTS_URL").unwrap_or_else(default_payments_url),
            shop_id: required("GATEWAY_SHOP_ID")?,
            secret_key: required("GATEWAY_SECRET_KEY")?,
            return_url: lookup("GATEWAY_RETURN_URL").unwrap_or_else(default_return_url),
            amount: lookup("GATEWAY_AMOUNT").unwrap_or_else(default_amount),
            currency: lookup("GATEWAY_CURRENCY").unwrap_or_else(default_currency),
            description: lookup("GATEWAY_DESCRIPTION").unwrap_or_else(default_description),
        };

        let config = Self {
            customer_bot_token: required("CUSTOMER_BOT_TOKEN")?,
            driver_bot_token: required("DRIVER_BOT_TOKEN")?,
            database_url: required("DATABASE_URL")?,
            drivers_chat_id: parse_value("DRIVERS_CHAT_ID", &required("DRIVERS_CHAT_ID")?)?,
            driver_applications_chat_id: parsed("DRIVER_APPLICATIONS_CHAT_ID")?,
            gateway,
            poll_interval_secs: lookup("POLL_INTERVAL_SECS")
                .map(|v| parse_value("POLL_INTERVAL_SECS", &v))
                .transpose()?
                .unwrap_or_else(default_poll_interval_secs),
            order_code_prefix: lookup("ORDER_CODE_PREFIX")
                .unwrap_or_else(default_order_code_prefix),
            intake_listen_addr: lookup("INTAKE_LISTEN_ADDR")
                .filter(|v| !v.trim().is_empty())
                .map(|v| parse_value("INTAKE_LISTEN_ADDR", &v))
                .transpose()?,
            log_path: lookup("LOG_PATH").filter(|v| !v.trim().is_empty()),
            loaded_from: String::new(),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than zero");
        }
        if self.gateway.amount.trim().is_empty() || self.gateway.currency.trim().is_empty() {
            anyhow::bail!("gateway amount and currency must not be empty");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn applications_chat_id(&self) -> i64 {
        self.driver_applications_chat_id
            .unwrap_or(self.drivers_chat_id)
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("Invalid {} `{}`: {}", key, value, e))
}
