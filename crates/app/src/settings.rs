//! Settings for the `shoplist` binary.
//!
//! Values come from an optional TOML file (`shoplist.toml` unless `--config`
//! says otherwise) and from `SHOPLIST__*` environment variables, e.g.
//! `SHOPLIST__APP__LEVEL=debug`.

use std::path::PathBuf;

use chrono_tz::Tz;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::error::{AppError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "shoplist.toml";

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

/// `database = "memory"` or `database = { sqlite = "shoplist.db" }`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Blobs {
    pub root: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct Report {
    /// IANA name used to bucket lists by month.
    pub timezone: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    /// A `shoplist.db` file in the working directory when unset.
    pub database: Option<Database>,
    pub blobs: Blobs,
    pub report: Report,
}

impl Settings {
    pub fn new(path: Option<&str>) -> std::result::Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("blobs.root", "blobs")?
            .set_default("report.timezone", "UTC")?
            .add_source(File::with_name(path.unwrap_or(DEFAULT_CONFIG_PATH)).required(false))
            .add_source(Environment::with_prefix("SHOPLIST").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    pub fn database(&self) -> Database {
        self.database
            .clone()
            .unwrap_or_else(|| Database::Sqlite("shoplist.db".to_string()))
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.report
            .timezone
            .parse()
            .map_err(|_| AppError::Invalid(format!("unknown time zone: {}", self.report.timezone)))
    }
}
