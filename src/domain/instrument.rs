//! Tick semantics for quantized (futures-style) instruments.

use crate::domain::Decimal;
use serde::{Deserialize, Serialize};

/// Tick size and tick value of a quantized instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentSpec {
    /// Minimum price increment.
    pub tick_size: Decimal,
    /// Currency amount per one tick of movement, per contract.
    pub tick_value: Decimal,
}

impl InstrumentSpec {
    pub fn new(tick_size: Decimal, tick_value: Decimal) -> Self {
        Self {
            tick_size,
            tick_value,
        }
    }

    /// Both tick size and tick value are strictly positive.
    pub fn is_valid(&self) -> bool {
        self.tick_size.is_positive() && self.tick_value.is_positive()
    }
}

/// How a ticker's price movement turns into money.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pricing {
    /// Found in the registry: movement is settled in whole ticks.
    TickQuantized(InstrumentSpec),
    /// Unknown ticker: raw price delta times quantity.
    Linear,
}

impl Pricing {
    /// Value a per-unit price movement for `quantity` units.
    ///
    /// Quantized instruments round the movement to whole ticks (midpoint away
    /// from zero) before multiplying, which is the settlement convention.
    /// `None` when the result overflows.
    pub fn value_movement(&self, movement: Decimal, quantity: Decimal) -> Option<Decimal> {
        match self {
            Pricing::TickQuantized(spec) => self
                .ticks(movement)?
                .checked_mul(spec.tick_value)?
                .checked_mul(quantity),
            Pricing::Linear => movement.checked_mul(quantity),
        }
    }

    /// Whole ticks in `movement`; `None` for linear pricing or on overflow.
    pub fn ticks(&self, movement: Decimal) -> Option<Decimal> {
        match self {
            Pricing::TickQuantized(spec) => movement
                .checked_div(spec.tick_size)
                .map(|t| t.round_half_away_from_zero()),
            Pricing::Linear => None,
        }
    }

    pub fn is_quantized(&self) -> bool {
        matches!(self, Pricing::TickQuantized(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        Decimal::from_str_canonical(s).unwrap()
    }

    fn es() -> Pricing {
        Pricing::TickQuantized(InstrumentSpec::new(d("0.25"), d("12.50")))
    }

    #[test]
    fn test_quantized_movement_is_whole_ticks() {
        assert_eq!(es().ticks(d("1.00")), Some(d("4")));
        assert_eq!(es().value_movement(d("1.00"), d("2")), Some(d("100")));
    }

    #[test]
    fn test_quantized_movement_rounds_half_away_from_zero() {
        // 0.125 is half a tick
        assert_eq!(es().ticks(d("0.125")), Some(d("1")));
        assert_eq!(es().ticks(d("-0.125")), Some(d("-1")));
        assert_eq!(es().ticks(d("0.1")), Some(d("0")));
        assert_eq!(es().value_movement(d("0.1"), d("3")), Some(Decimal::zero()));
    }

    #[test]
    fn test_linear_movement() {
        assert_eq!(Pricing::Linear.ticks(d("1")), None);
        assert_eq!(Pricing::Linear.value_movement(d("10"), d("3")), Some(d("30")));
        assert_eq!(Pricing::Linear.value_movement(d("-0.37"), d("100")), Some(d("-37")));
    }

    #[test]
    fn test_overflowing_movement_is_none() {
        let huge = d("79228162514264337593543950335");
        assert_eq!(Pricing::Linear.value_movement(huge, d("2")), None);

        let fine = Pricing::TickQuantized(InstrumentSpec::new(d("0.0000000001"), d("1000")));
        assert_eq!(fine.ticks(huge), None);
        assert_eq!(fine.value_movement(huge, Decimal::one()), None);
    }

    #[test]
    fn test_spec_validity() {
        assert!(InstrumentSpec::new(d("0.1"), d("10")).is_valid());
        assert!(!InstrumentSpec::new(Decimal::zero(), d("10")).is_valid());
        assert!(!InstrumentSpec::new(d("0.25"), d("-1")).is_valid());
    }

    #[test]
    fn test_spec_json_shape() {
        let spec: InstrumentSpec =
            serde_json::from_str(r#"{"tickSize": 0.25, "tickValue": 12.5}"#).unwrap();
        assert_eq!(spec, InstrumentSpec::new(d("0.25"), d("12.5")));
    }
}
