use std::env;

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: String,
    pub host: String,
    pub port: u16,
    pub static_dir: String,
}

impl Config {
    /// Read configuration from the environment. The signing secret has no
    /// default: a process without `QUILL_JWT_SECRET` must not come up.
    pub fn from_env() -> Result<Self> {
        let jwt_secret =
            env::var("QUILL_JWT_SECRET").context("QUILL_JWT_SECRET must be set")?;
        let db_path = env::var("QUILL_DB_PATH").unwrap_or_else(|_| "quill.db".into());
        let host = env::var("QUILL_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env::var("QUILL_PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .context("QUILL_PORT must be a port number")?;
        let static_dir = env::var("QUILL_STATIC_DIR").unwrap_or_else(|_| "frontend".into());

        Ok(Config {
            jwt_secret,
            db_path,
            host,
            port,
            static_dir,
        })
    }
}
