use crate::domain::{Decimal, InstrumentSpec};
use crate::engine::InstrumentRegistry;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Equity-curve starting balance when a request does not carry one.
    pub starting_balance: Decimal,
    pub instruments: InstrumentRegistry,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let starting_balance = match env_map.get("STARTING_BALANCE") {
            Some(s) => Decimal::from_str_canonical(s)
                .ok()
                .filter(Decimal::within_amount_limit)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "STARTING_BALANCE".to_string(),
                        format!("must be a decimal number within +/-1e18, got {}", s),
                    )
                })?,
            None => Decimal::zero(),
        };

        let instruments = parse_instruments_from_map(&env_map)?;

        Ok(Config {
            port,
            starting_balance,
            instruments,
        })
    }
}

/// `INSTRUMENTS` (inline) wins over `INSTRUMENTS_FILE`; with neither the
/// built-in ES/GC table is used.
fn parse_instruments_from_map(
    env_map: &HashMap<String, String>,
) -> Result<InstrumentRegistry, ConfigError> {
    if let Some(table) = env_map.get("INSTRUMENTS") {
        let entries = parse_inline_instruments(table)?;
        InstrumentRegistry::new(entries)
            .map_err(|e| ConfigError::InvalidValue("INSTRUMENTS".to_string(), e.to_string()))
    } else if let Some(file_path) = env_map.get("INSTRUMENTS_FILE") {
        let content = std::fs::read_to_string(file_path).map_err(|_| {
            ConfigError::InvalidValue(
                "INSTRUMENTS_FILE".to_string(),
                "file not found or unreadable".to_string(),
            )
        })?;
        let entries: BTreeMap<String, InstrumentSpec> =
            serde_json::from_str(&content).map_err(|e| {
                ConfigError::InvalidValue("INSTRUMENTS_FILE".to_string(), e.to_string())
            })?;
        InstrumentRegistry::new(entries)
            .map_err(|e| ConfigError::InvalidValue("INSTRUMENTS_FILE".to_string(), e.to_string()))
    } else {
        Ok(InstrumentRegistry::with_defaults())
    }
}

/// `SYMBOL=tickSize:tickValue` pairs separated by commas.
fn parse_inline_instruments(table: &str) -> Result<Vec<(String, InstrumentSpec)>, ConfigError> {
    let invalid = |entry: &str| {
        ConfigError::InvalidValue(
            "INSTRUMENTS".to_string(),
            format!("expected SYMBOL=tickSize:tickValue, got {}", entry),
        )
    };

    table
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let (symbol, spec) = entry.split_once('=').ok_or_else(|| invalid(entry))?;
            let (size, value) = spec.split_once(':').ok_or_else(|| invalid(entry))?;
            let tick_size = Decimal::from_str_canonical(size).map_err(|_| invalid(entry))?;
            let tick_value = Decimal::from_str_canonical(value).map_err(|_| invalid(entry))?;
            Ok((symbol.trim().to_string(), InstrumentSpec::new(tick_size, tick_value)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(HashMap::new()).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.starting_balance.is_zero());
        assert_eq!(config.instruments, InstrumentRegistry::with_defaults());
        assert_eq!(
            config.instruments.lookup("es"),
            Some(InstrumentSpec::new(d("0.25"), d("12.5")))
        );
    }

    #[test]
    fn test_invalid_port() {
        let mut env_map = HashMap::new();
        env_map.insert("PORT".to_string(), "not_a_number".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "PORT"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_starting_balance() {
        let mut env_map = HashMap::new();
        env_map.insert("STARTING_BALANCE".to_string(), "25000.50".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.starting_balance, d("25000.50"));

        for bad in ["lots", "79228162514264337593543950335"] {
            let mut env_map = HashMap::new();
            env_map.insert("STARTING_BALANCE".to_string(), bad.to_string());
            match Config::from_env_map(env_map) {
                Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "STARTING_BALANCE"),
                other => panic!("Expected InvalidValue error for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_inline_instruments_replace_defaults() {
        let mut env_map = HashMap::new();
        env_map.insert("INSTRUMENTS".to_string(), "NQ=0.25:5, cl=0.01:10".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.instruments.len(), 2);
        assert_eq!(config.instruments.lookup("CL"), Some(InstrumentSpec::new(d("0.01"), d("10"))));
        assert_eq!(config.instruments.lookup("ES"), None);
    }

    #[test]
    fn test_invalid_inline_instruments() {
        for table in ["NQ", "NQ=0.25", "NQ=abc:5", "NQ=0:5", "=0.25:5"] {
            let mut env_map = HashMap::new();
            env_map.insert("INSTRUMENTS".to_string(), table.to_string());
            match Config::from_env_map(env_map) {
                Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "INSTRUMENTS"),
                other => panic!("Expected InvalidValue error for {table}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_instruments_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"MES": {{"tickSize": 0.25, "tickValue": 1.25}}}}"#).unwrap();

        let mut env_map = HashMap::new();
        env_map.insert(
            "INSTRUMENTS_FILE".to_string(),
            file.path().to_string_lossy().to_string(),
        );
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(
            config.instruments.lookup("MES"),
            Some(InstrumentSpec::new(d("0.25"), d("1.25")))
        );
    }

    #[test]
    fn test_missing_instruments_file() {
        let mut env_map = HashMap::new();
        env_map.insert("INSTRUMENTS_FILE".to_string(), "/nonexistent/instruments.json".to_string());
        match Config::from_env_map(env_map) {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "INSTRUMENTS_FILE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}
