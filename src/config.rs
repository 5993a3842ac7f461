use crate::qr;
use log::warn;
use std::env;

pub const DEFAULT_DATABASE_URL: &str = "./lost_and_found.db";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_url: String,
    pub qr_endpoint: String,
    pub qr_size: u32,
    pub seed_demo_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            qr_endpoint: qr::DEFAULT_ENDPOINT.to_string(),
            qr_size: qr::DEFAULT_SIZE,
            seed_demo_data: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let qr_size = match lookup("QR_SIZE") {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(size) if size > 0 => size,
                _ => {
                    warn!("Ignoring invalid QR_SIZE {:?}, using {}", raw, defaults.qr_size);
                    defaults.qr_size
                }
            },
            None => defaults.qr_size,
        };
        let seed_demo_data = lookup("SEED_DEMO_DATA")
            .map(|raw| matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.seed_demo_data);

        Config {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            qr_endpoint: lookup("QR_ENDPOINT").unwrap_or(defaults.qr_endpoint),
            qr_size,
            seed_demo_data,
        }
    }
}
