use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

const DEFAULT_MPD_HOST: &str = "127.0.0.1";
const DEFAULT_MPD_PORT: u16 = 6600;
const DEFAULT_WEB_PORT: u16 = 8080;
const DEFAULT_REALM: &str = "umpd";

#[derive(Deserialize, Default, Debug)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub webport: Option<String>,
    pub user: Option<String>,
    pub htpasswd: Option<PathBuf>,
    pub realm: Option<String>,
}

#[derive(Debug)]
pub struct Config {
    /// MPD endpoint.
    pub host: String,
    pub port: u16,
    /// Web server listen address.
    pub web_bind: SocketAddr,
    /// Drop privileges to this user once the listen socket is bound.
    pub run_as_user: Option<String>,
    /// Digest credential file; auth is enforced iff this is set.
    pub htpasswd: Option<PathBuf>,
    pub realm: String,
}

impl Config {
    pub fn resolve(file: Option<FileConfig>, args: &crate::cli::Args) -> Result<Self, ConfigError> {
        let file = file.unwrap_or_default();
        let web_bind = match args.webport.clone().or(file.webport) {
            Some(spec) => parse_bind_spec(&spec)?,
            None => SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_WEB_PORT)),
        };
        Ok(Config {
            host: args
                .host
                .clone()
                .or(file.host)
                .unwrap_or_else(|| DEFAULT_MPD_HOST.to_string()),
            port: args.port.or(file.port).unwrap_or(DEFAULT_MPD_PORT),
            web_bind,
            run_as_user: args.user.clone().or(file.user),
            htpasswd: file.htpasswd,
            realm: file.realm.unwrap_or_else(|| DEFAULT_REALM.to_string()),
        })
    }
}

/// Parse a "[ip:]port" listen spec; a bare port binds every interface.
pub fn parse_bind_spec(spec: &str) -> Result<SocketAddr, ConfigError> {
    let invalid = || ConfigError::BindSpec(spec.to_string());
    match spec.rsplit_once(':') {
        Some((ip, port)) => {
            let ip: IpAddr = ip.parse().map_err(|_| invalid())?;
            let port: u16 = port.parse().map_err(|_| invalid())?;
            Ok(SocketAddr::from((ip, port)))
        }
        None => {
            let port: u16 = spec.parse().map_err(|_| invalid())?;
            Ok(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
        }
    }
}

pub fn find_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_owned());
    }
    let cwd_config = PathBuf::from("umpd.toml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }
    if let Some(config_dir) = dirs::config_dir() {
        let xdg_config = config_dir.join("umpd").join("config.toml");
        if xdg_config.exists() {
            return Some(xdg_config);
        }
    }
    None
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid webport spec \"{0}\" (expected \"[ip:]port\")")]
    BindSpec(String),
}

pub fn load_config(path: &Path) -> Result<FileConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&content)?;
    Ok(config)
}
