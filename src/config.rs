use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub render_stagger_ms: u64,
    pub tile_url: String,
    pub tile_attribution: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            render_stagger_ms: parse_or_default("RENDER_STAGGER_MS", 25)?,
            tile_url: env::var("TILE_URL")
                .unwrap_or_else(|_| "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string()),
            tile_attribution: env::var("TILE_ATTRIBUTION")
                .unwrap_or_else(|_| "© OpenStreetMap contributors".to_string()),
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
