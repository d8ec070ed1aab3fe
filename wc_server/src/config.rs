//! Server settings read from the environment.

use std::{
    env,
    net::{IpAddr, Ipv4Addr},
    path::PathBuf,
};

use anyhow::{Context, Result};

use crate::theme::Theme;

static DEFAULT_PORT: u16 = 5000;
static DEFAULT_STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Raise the default log level to debug.
    pub debug: bool,
    /// A fixed theme replacing the seasonal one.
    pub theme: Option<Theme>,
    pub static_dir: PathBuf,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| env::var(name).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = match var("HOST") {
            Some(host) => host.parse::<IpAddr>().context("HOST must be an IP address")?,
            None => IpAddr::V4(Ipv4Addr::UNSPECIFIED),
        };
        let port = match var("PORT") {
            Some(port) => port.parse::<u16>().context("PORT must be a valid number")?,
            None => DEFAULT_PORT,
        };
        let debug = var("DEBUG")
            .map(|debug| matches!(debug.to_lowercase().as_str(), "true" | "1" | "t"))
            .unwrap_or(false);
        let theme = var("THEME")
            .filter(|theme| !theme.trim().is_empty())
            .map(|theme| theme.parse::<Theme>())
            .transpose()
            .context("THEME must name a known theme")?;
        let static_dir = var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));
        Ok(ServerConfig {
            host,
            port,
            debug,
            theme,
            static_dir,
        })
    }
}
