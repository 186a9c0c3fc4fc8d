//! Configuration management
//!
//! Configuration is read once at startup and handed to each server as an
//! immutable value. Precedence, lowest first:
//!
//! 1. built-in defaults
//! 2. optional YAML file
//! 3. `CLINIC_GATEWAY_<SECTION>__<KEY>` environment variables
//! 4. the well-known service variables (`JWT_SECRET`, `LOGIN_SERVICE_URL`, ...)

use std::{
    collections::BTreeMap,
    env,
    net::{IpAddr, SocketAddr},
    path::Path,
    time::Duration,
};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A backend service reachable through the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceRoute {
    /// Key under `routes` in the configuration
    pub name: &'static str,
    /// Path prefix handled by the service
    pub prefix: &'static str,
    /// Environment variable holding the service base URL
    pub env_var: &'static str,
}

/// The gateway's route table. Order is the match order.
pub const SERVICE_ROUTES: &[ServiceRoute] = &[
    ServiceRoute {
        name: "login",
        prefix: "/login",
        env_var: "LOGIN_SERVICE_URL",
    },
    ServiceRoute {
        name: "prescripciones",
        prefix: "/prescripciones",
        env_var: "PRESCRIPCION_SERVICE_URL",
    },
    ServiceRoute {
        name: "pacientes",
        prefix: "/pacientes",
        env_var: "PACIENTES_SERVICE_URL",
    },
    ServiceRoute {
        name: "reservas",
        prefix: "/reservas",
        env_var: "RESERVAS_SERVICE_URL",
    },
    ServiceRoute {
        name: "medicamentos",
        prefix: "/medicamentos",
        env_var: "MEDICAMENTOS_SERVICE_URL",
    },
];

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Environment files to load before the well-known variables are read.
    /// Paths support ~ expansion. Missing files are skipped.
    pub env_files: Vec<String>,
    /// Gateway listener and CORS settings
    pub gateway: GatewayConfig,
    /// Backend base URLs keyed by service name (see [`SERVICE_ROUTES`])
    pub routes: BTreeMap<String, String>,
    /// Token settings shared by both services
    pub auth: AuthConfig,
    /// Login service settings
    pub login: LoginConfig,
}

/// Gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// The single origin allowed to make credentialed cross-origin requests
    pub cors_origin: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            cors_origin: "http://localhost:5173".to_string(),
        }
    }
}

/// Token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC signing secret (`JWT_SECRET`)
    pub jwt_secret: Option<String>,
    /// Lifetime of issued tokens
    #[serde(with = "humantime_serde")]
    pub token_ttl: Duration,
    /// Clock skew tolerated when checking `exp`
    #[serde(with = "humantime_serde")]
    pub leeway: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl: Duration::from_secs(30 * 60),
            leeway: Duration::ZERO,
        }
    }
}

/// How stored secrets are compared with submitted ones
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PasswordScheme {
    /// Stored value is a bcrypt hash
    #[default]
    Bcrypt,
    /// Stored value is the secret itself (legacy stores only)
    Plaintext,
}

/// Login service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Postgres URL. When unset the standard `PG*` variables are used.
    pub database_url: Option<String>,
    /// Pool size
    pub max_connections: u32,
    /// Secret comparison scheme
    pub password_scheme: PasswordScheme,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database_url: None,
            max_connections: 10,
            password_scheme: PasswordScheme::default(),
        }
    }
}

impl GatewayConfig {
    /// Address to bind
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        socket_addr(&self.host, self.port)
    }
}

impl LoginConfig {
    /// Address to bind
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        socket_addr(&self.host, self.port)
    }
}

fn socket_addr(host: &str, port: u16) -> Result<SocketAddr> {
    let ip: IpAddr = host
        .parse()
        .map_err(|e| Error::Config(format!("Invalid host '{host}': {e}")))?;
    Ok(SocketAddr::new(ip, port))
}

impl Config {
    /// Load configuration from file and environment
    ///
    /// # Errors
    ///
    /// Returns an error if the config file does not exist or cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new();

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed("CLINIC_GATEWAY_").split("__"));

        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.load_env_files();
        config.apply_service_env(|name| env::var(name).ok());

        Ok(config)
    }

    /// Load environment files into the process environment.
    fn load_env_files(&self) {
        for path_str in &self.env_files {
            let expanded = if path_str.starts_with('~') {
                if let Some(home) = dirs::home_dir() {
                    path_str.replacen('~', &home.display().to_string(), 1)
                } else {
                    path_str.clone()
                }
            } else {
                path_str.clone()
            };

            let path = Path::new(&expanded);
            if path.exists() {
                match dotenvy::from_path(path) {
                    Ok(()) => tracing::info!("Loaded env file: {expanded}"),
                    Err(e) => tracing::warn!("Failed to load env file {expanded}: {e}"),
                }
            } else {
                tracing::debug!("Env file not found (skipped): {expanded}");
            }
        }
    }

    /// Overlay the well-known service variables.
    ///
    /// Values are taken verbatim, so a numeric `JWT_SECRET` stays a string.
    pub fn apply_service_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for route in SERVICE_ROUTES {
            if let Some(url) = lookup(route.env_var) {
                self.routes.insert(route.name.to_string(), url);
            }
        }
        if let Some(secret) = lookup("JWT_SECRET") {
            self.auth.jwt_secret = Some(secret);
        }
        if let Some(url) = lookup("DATABASE_URL") {
            self.login.database_url = Some(url);
        }
        if let Some(origin) = lookup("CORS_ORIGIN") {
            self.gateway.cors_origin = origin;
        }
    }

    /// The signing secret shared by both services.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the secret is unset or blank.
    pub fn jwt_secret(&self) -> Result<&str> {
        match self.auth.jwt_secret.as_deref() {
            Some(secret) if !secret.trim().is_empty() => Ok(secret),
            _ => Err(Error::Config(
                "JWT_SECRET must be set to a non-empty value".to_string(),
            )),
        }
    }
}

/// Serde adapter for durations written as `30s`, `5m`, `1h` or `100ms`
pub mod humantime_serde {
    use std::time::Duration;

    use serde::{self, Deserialize, Deserializer, Serializer};

    /// Serialize a Duration as whole seconds (e.g. "1800s")
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the serializer fails.
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}s", duration.as_secs()))
    }

    /// Deserialize a human-readable duration
    ///
    /// # Errors
    ///
    /// Returns a deserialization error if the string cannot be parsed as a duration.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    /// Parse `"30s"`, `"5m"`, `"1h"`, `"100ms"` or a bare number of seconds
    pub fn parse(s: &str) -> Result<Duration, std::num::ParseIntError> {
        let s = s.trim();
        // "ms" before "s"
        if let Some(ms) = s.strip_suffix("ms") {
            ms.parse::<u64>().map(Duration::from_millis)
        } else if let Some(secs) = s.strip_suffix('s') {
            secs.parse::<u64>().map(Duration::from_secs)
        } else if let Some(mins) = s.strip_suffix('m') {
            mins.parse::<u64>().map(|m| Duration::from_secs(m * 60))
        } else if let Some(hours) = s.strip_suffix('h') {
            hours.parse::<u64>().map(|h| Duration::from_secs(h * 3600))
        } else {
            s.parse::<u64>().map(Duration::from_secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.gateway.port, 8080);
        assert_eq!(config.login.port, 3000);
        assert_eq!(config.gateway.cors_origin, "http://localhost:5173");
        assert_eq!(config.auth.token_ttl, Duration::from_secs(1800));
        assert_eq!(config.auth.leeway, Duration::ZERO);
        assert_eq!(config.login.password_scheme, PasswordScheme::Bcrypt);
    }

    #[test]
    fn test_service_env_overrides() {
        let mut config = Config::default();
        config.apply_service_env(lookup(&[
            ("LOGIN_SERVICE_URL", "http://login:3000"),
            ("PRESCRIPCION_SERVICE_URL", "http://prescripciones:8000"),
            ("JWT_SECRET", "12345"),
            ("DATABASE_URL", "postgres://u:p@db/clinica"),
        ]));

        assert_eq!(config.routes["login"], "http://login:3000");
        assert_eq!(config.routes["prescripciones"], "http://prescripciones:8000");
        assert!(!config.routes.contains_key("pacientes"));
        assert_eq!(config.jwt_secret().unwrap(), "12345");
        assert_eq!(
            config.login.database_url.as_deref(),
            Some("postgres://u:p@db/clinica")
        );
    }

    #[test]
    fn test_missing_jwt_secret_is_config_error() {
        let config = Config::default();
        assert!(matches!(config.jwt_secret(), Err(Error::Config(_))));

        let mut blank = Config::default();
        blank.auth.jwt_secret = Some("   ".to_string());
        assert!(blank.jwt_secret().is_err());
    }

    #[test]
    fn test_invalid_host_rejected() {
        let gateway = GatewayConfig {
            host: "not-an-ip".to_string(),
            ..GatewayConfig::default()
        };
        assert!(gateway.socket_addr().is_err());
        assert_eq!(
            LoginConfig::default().socket_addr().unwrap().to_string(),
            "0.0.0.0:3000"
        );
    }

    #[test]
    fn test_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clinic.yaml");
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            r#"
gateway:
  port: 9090
  cors_origin: "https://app.example.cl"
routes:
  pacientes: "http://pacientes:8001"
auth:
  token_ttl: 15m
  leeway: 30s
login:
  password_scheme: plaintext
"#
        )
        .unwrap();
        drop(f);

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.gateway.port, 9090);
        assert_eq!(config.gateway.cors_origin, "https://app.example.cl");
        assert_eq!(config.routes["pacientes"], "http://pacientes:8001");
        assert_eq!(config.auth.token_ttl, Duration::from_secs(900));
        assert_eq!(config.auth.leeway, Duration::from_secs(30));
        assert_eq!(config.login.password_scheme, PasswordScheme::Plaintext);
    }

    #[test]
    fn test_missing_config_file() {
        let err = Config::load(Some(Path::new("/nonexistent/clinic.yaml"))).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_duration_parsing() {
        assert_eq!(humantime_serde::parse("100ms").unwrap(), Duration::from_millis(100));
        assert_eq!(humantime_serde::parse("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(humantime_serde::parse("30m").unwrap(), Duration::from_secs(1800));
        assert_eq!(humantime_serde::parse("1h").unwrap(), Duration::from_secs(3600));
        assert_eq!(humantime_serde::parse("45").unwrap(), Duration::from_secs(45));
        assert!(humantime_serde::parse("soon").is_err());
    }

    #[test]
    fn test_route_table_is_static() {
        let prefixes: Vec<&str> = SERVICE_ROUTES.iter().map(|r| r.prefix).collect();
        assert_eq!(
            prefixes,
            vec!["/login", "/prescripciones", "/pacientes", "/reservas", "/medicamentos"]
        );
    }
}
