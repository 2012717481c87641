use secrecy::Secret;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // Directory served for every path outside the API
    pub static_dir: String,

    // Raffle numbers are zero-padded to this many digits ("07")
    pub slot_digits: usize,

    // Security
    pub admin_pass: Secret<String>,
    pub session_hours: i64,
    pub secure_cookies: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if it exists (for local development)
        let _ = dotenvy::dotenv();

        let config = config::Config::builder()
            .add_source(config::Environment::default().separator("__"))
            .build()?;

        let slot_digits: usize = config.get("slot_digits").unwrap_or(2);
        if !(1..=9).contains(&slot_digits) {
            return Err(config::ConfigError::Message(format!(
                "slot_digits must be between 1 and 9, got {}",
                slot_digits
            )));
        }

        let session_hours: i64 = config.get("session_hours").unwrap_or(8);
        if session_hours <= 0 {
            return Err(config::ConfigError::Message(format!(
                "session_hours must be positive, got {}",
                session_hours
            )));
        }

        Ok(Self {
            database_url: config
                .get("database_url")
                .unwrap_or_else(|_| "sqlite://rifa.db".to_string()),
            host: config.get("host").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: config.get("port").unwrap_or(3000),

            static_dir: config
                .get("static_dir")
                .unwrap_or_else(|_| "public".to_string()),

            slot_digits,

            admin_pass: Secret::new(config.get("admin_pass")?),
            session_hours,
            secure_cookies: config.get("secure_cookies").unwrap_or(false),
        })
    }
}
