//! Instrument registry: ticker -> tick semantics.
//!
//! Built once from configuration and read-only afterwards. Tickers that are
//! not registered price linearly.

use crate::domain::{Decimal, InstrumentSpec, Pricing, Ticker};
use rust_decimal::Decimal as RustDecimal;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("instrument symbol must not be empty")]
    EmptySymbol,
    #[error("instrument {0}: tick size and tick value must be positive")]
    InvalidSpec(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentRegistry {
    specs: BTreeMap<Ticker, InstrumentSpec>,
}

impl InstrumentRegistry {
    /// Build a registry from `(symbol, spec)` pairs.
    ///
    /// Symbols are matched case-insensitively; a later duplicate replaces an
    /// earlier one.
    pub fn new<I, S>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = (S, InstrumentSpec)>,
        S: AsRef<str>,
    {
        let mut specs = BTreeMap::new();
        for (symbol, spec) in entries {
            let ticker = Ticker::new(symbol.as_ref());
            if ticker.as_str().is_empty() {
                return Err(RegistryError::EmptySymbol);
            }
            if !spec.is_valid() {
                return Err(RegistryError::InvalidSpec(ticker.to_string()));
            }
            specs.insert(ticker, spec);
        }
        Ok(Self { specs })
    }

    /// A registry where every ticker prices linearly.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The journal's stock table: E-mini S&P 500 and gold futures.
    pub fn with_defaults() -> Self {
        let mut specs = BTreeMap::new();
        specs.insert(
            Ticker::new("ES"),
            InstrumentSpec::new(
                Decimal::new(RustDecimal::new(25, 2)),
                Decimal::new(RustDecimal::new(1250, 2)),
            ),
        );
        specs.insert(
            Ticker::new("GC"),
            InstrumentSpec::new(
                Decimal::new(RustDecimal::new(1, 1)),
                Decimal::new(RustDecimal::new(10, 0)),
            ),
        );
        Self { specs }
    }

    /// Tick semantics for `ticker`, if it is a quantized instrument.
    pub fn lookup(&self, ticker: &str) -> Option<InstrumentSpec> {
        self.specs.get(&Ticker::new(ticker)).copied()
    }

    /// How P&L is computed for `ticker`.
    pub fn pricing(&self, ticker: &Ticker) -> Pricing {
        match self.specs.get(ticker) {
            Some(spec) => Pricing::TickQuantized(*spec),
            None => Pricing::Linear,
        }
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Registered instruments in symbol order.
    pub fn iter(&self) -> impl Iterator<Item = (&Ticker, &InstrumentSpec)> {
        self.specs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = InstrumentRegistry::with_defaults();
        let es = registry.lookup("es").unwrap();
        assert_eq!(es.tick_size, d("0.25"));
        assert_eq!(es.tick_value, d("12.50"));
        assert_eq!(registry.lookup("Gc").unwrap().tick_size, d("0.1"));
    }

    #[test]
    fn test_unknown_ticker_is_linear() {
        let registry = InstrumentRegistry::with_defaults();
        assert_eq!(registry.lookup("AAPL"), None);
        assert_eq!(registry.pricing(&Ticker::new("AAPL")), Pricing::Linear);
        assert!(registry.pricing(&Ticker::new("es")).is_quantized());
    }

    #[test]
    fn test_injected_synthetic_instrument() {
        let registry =
            InstrumentRegistry::new([("nq", InstrumentSpec::new(d("0.25"), d("5")))]).unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("NQ").unwrap().tick_value, d("5"));
        assert_eq!(registry.lookup("ES"), None);
    }

    #[test]
    fn test_rejects_invalid_specs() {
        let err = InstrumentRegistry::new([("CL", InstrumentSpec::new(d("0"), d("10")))])
            .unwrap_err();
        assert_eq!(err, RegistryError::InvalidSpec("CL".to_string()));

        let err = InstrumentRegistry::new([("  ", InstrumentSpec::new(d("1"), d("1")))])
            .unwrap_err();
        assert_eq!(err, RegistryError::EmptySymbol);
    }

    #[test]
    fn test_empty_registry() {
        let registry = InstrumentRegistry::empty();
        assert!(registry.is_empty());
        assert_eq!(registry.lookup("ES"), None);
    }
}
