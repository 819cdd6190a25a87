use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Listener settings shared by every service in the workspace.
/// Service-specific configuration (secrets, TTLs, provider settings)
/// layers on top in each service's own `config` module; this struct
/// only answers "where do we bind".
///
/// Values come from an optional `configuration.*` file and from
/// `APP__`-prefixed environment variables, with the environment
/// winning.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_bind_all_interfaces_on_8080() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn host_and_port_deserialize_from_strings() {
        let config: Config =
            serde_json::from_str(r#"{"host": "127.0.0.1", "port": 9090}"#).unwrap();
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9090");
    }
}
