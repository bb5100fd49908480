use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub keys_dir: PathBuf,
    pub max_email_length: usize,
    pub version: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            keys_dir: env::var("KEYS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("keys")),
            max_email_length: env::var("MAX_EMAIL_LENGTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(254),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
