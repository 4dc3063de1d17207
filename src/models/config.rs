use std::env;

use super::Error;

pub const DEFAULT_HTTP_PORT: u16 = 8102;
pub const DEFAULT_MAX_CONNECTIONS: u32 = 16;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: Option<String>,
    pub http_port: u16,
    pub max_connections: u32,
    pub otel_stdout: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database_url: None,
            http_port: DEFAULT_HTTP_PORT,
            max_connections: DEFAULT_MAX_CONNECTIONS,
            otel_stdout: false,
        }
    }
}

impl Config {
    /// Reads `.env` (if any) and then the process environment.
    pub fn from_env() -> Result<Config, Error> {
        dotenv::dotenv().ok();
        Config::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, Error> {
        let http_port = match lookup("HTTP_PORT") {
            Some(s) => s
                .parse()
                .map_err(|_| Error::Config(format!("HTTP_PORT is not a port: {s}")))?,
            None => DEFAULT_HTTP_PORT,
        };
        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(s) => s
                .parse()
                .map_err(|_| Error::Config(format!("DB_MAX_CONNECTIONS is not a number: {s}")))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };
        let otel_stdout = matches!(lookup("OTEL_STDOUT").as_deref(), Some("1" | "true"));
        Ok(Config {
            database_url: lookup("DATABASE_URL").filter(|s| !s.is_empty()),
            http_port,
            max_connections,
            otel_stdout,
        })
    }

    pub fn database_url(&self) -> Result<&str, Error> {
        self.database_url
            .as_deref()
            .ok_or_else(|| Error::Config("DATABASE_URL must be set".into()))
    }
}

#[tokio::test]
async fn config_defaults() -> anyhow::Result<()> {
    // act
    let config = Config::from_lookup(|_| None)?;

    // assert
    assert_eq!(DEFAULT_HTTP_PORT, config.http_port);
    assert_eq!(DEFAULT_MAX_CONNECTIONS, config.max_connections);
    assert!(!config.otel_stdout);
    assert!(config.database_url().is_err());
    Ok(())
}

#[tokio::test]
async fn config_from_lookup() -> anyhow::Result<()> {
    // arrange
    let lookup = |key: &str| match key {
        "DATABASE_URL" => Some("postgres://localhost/eva".to_owned()),
        "HTTP_PORT" => Some("9000".to_owned()),
        "OTEL_STDOUT" => Some("1".to_owned()),
        _ => None,
    };

    // act
    let config = Config::from_lookup(lookup)?;

    // assert
    assert_eq!(9000, config.http_port);
    assert!(config.otel_stdout);
    assert_eq!("postgres://localhost/eva", config.database_url()?);
    Ok(())
}

#[tokio::test]
async fn config_bad_port() -> anyhow::Result<()> {
    // act
    let config = Config::from_lookup(|key| (key == "HTTP_PORT").then(|| "port".to_owned()));

    // assert
    assert!(matches!(config, Err(Error::Config(_))));
    Ok(())
}
