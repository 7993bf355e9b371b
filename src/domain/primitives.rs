//! Domain primitives: Ticker, TagId, Direction.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Instrument symbol (e.g., "ES", "AAPL").
///
/// Symbols are case-insensitive; the stored form is trimmed and upper-cased
/// so equality and hashing match regardless of how the journal typed them.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String")]
pub struct Ticker(String);

impl Ticker {
    /// Create a Ticker, normalizing case and surrounding whitespace.
    pub fn new(symbol: &str) -> Self {
        Ticker(symbol.trim().to_ascii_uppercase())
    }

    /// Get the normalized symbol.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Ticker {
    fn from(symbol: String) -> Self {
        Ticker::new(&symbol)
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque tag identifier. Only used for filter matching and breakdowns.
///
/// The journal uses numeric tag ids; both numbers and strings are accepted.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct TagId(pub String);

impl<'de> Deserialize<'de> for TagId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(i64),
        }

        Ok(match Repr::deserialize(deserializer)? {
            Repr::Text(s) => TagId(s),
            Repr::Number(n) => TagId(n.to_string()),
        })
    }
}

impl TagId {
    pub fn new(id: impl Into<String>) -> Self {
        TagId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Trade direction: Long or Short.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// Profits when price rises.
    Long,
    /// Profits when price falls.
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LONG" | "BUY" => Ok(Direction::Long),
            "SHORT" | "SELL" => Ok(Direction::Short),
            _ => Err(s.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_is_case_insensitive() {
        assert_eq!(Ticker::new("es"), Ticker::new("ES"));
        assert_eq!(Ticker::new(" gc ").as_str(), "GC");
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!("long".parse::<Direction>(), Ok(Direction::Long));
        assert_eq!(" SHORT ".parse::<Direction>(), Ok(Direction::Short));
        assert_eq!("buy".parse::<Direction>(), Ok(Direction::Long));
        assert_eq!("sell".parse::<Direction>(), Ok(Direction::Short));
        assert!("sideways".parse::<Direction>().is_err());
    }

    #[test]
    fn test_direction_serialization() {
        let json = serde_json::to_string(&Direction::Long).unwrap();
        assert_eq!(json, "\"LONG\"");
        let json = serde_json::to_string(&Direction::Short).unwrap();
        assert_eq!(json, "\"SHORT\"");
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(TagId::new("7").to_string(), "7");
    }

    #[test]
    fn test_tag_deserializes_from_number_or_string() {
        let numeric: TagId = serde_json::from_str("7").unwrap();
        let text: TagId = serde_json::from_str("\"7\"").unwrap();
        assert_eq!(numeric, text);
    }
}
