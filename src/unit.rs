//! # Unit Conversion Module
//!
//! ## Aim
//! This module handles every physical quantity the tool works with: parsing strings
//! like "300mM" or "50µL" into a magnitude and a unit symbol, converting between
//! units of the same family, and rendering a computed quantity back into a
//! human-readable string with an auto-scaled unit (0.0001 g becomes "100.0µg").
//!
//! ## Main Data Structures and Logic
//! - `UnitEntry`: one rung of a ladder, holding the symbols that share a scale
//!   factor (synonyms such as "µL" and "uL") and index links to its neighbors
//! - `UnitLadder`: the sorted rungs of one unit family plus a symbol lookup table;
//!   entries live in a `Vec` and reference each other by index, so the
//!   doubly-linked hierarchy carries no ownership cycles
//! - `split_unit_quantity()`: splits a raw string into magnitude and symbol
//! - `scale_and_round_quantity()`: walks a quantity up or down its ladder until the
//!   magnitude lands in [1, 1000), then rounds to two decimals for display
//!
//! Three ladders are built on first use and never change: volume (base litre),
//! mass (base gram) and molar concentration (base molar). The "%" token is valid
//! in recipes but belongs to no ladder; callers turn percentages into an absolute
//! volume before formatting.

use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;
use thiserror::Error;

/// Error types for unit lookups and ladder traversal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("Unit symbol not found: '{0}' is not in unit ladder")]
    UnknownUnit(String),
    #[error("No greater unit: '{0}' does not have a unit greater than it in the ladder")]
    NoGreaterUnit(String),
    #[error("No lesser unit: '{0}' does not have a unit lesser than it in the ladder")]
    NoLesserUnit(String),
    #[error("Invalid unit: '{0}' is not in any unit ladder")]
    InvalidUnit(String),
}

/// The unit family a symbol belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitFamily {
    Volume,
    Mass,
    Concentration,
    Percent,
}

/// One rung of a unit ladder: all symbols sharing one scale factor, with index
/// links to the adjacent rungs. `greater`/`lesser` are indices into the owning
/// ladder's entry vector, `None` at the ladder's extremes.
#[derive(Debug, Clone)]
pub struct UnitEntry {
    pub symbols: Vec<String>,
    pub scale_factor: f64,
    pub greater: Option<usize>,
    pub lesser: Option<usize>,
}

// Compares the symbol set, the scale factor and the greater link only; checking
// lesser as well would make two adjacent rungs compare each other forever.
impl PartialEq for UnitEntry {
    fn eq(&self, other: &Self) -> bool {
        let own: HashSet<&str> = self.symbols.iter().map(String::as_str).collect();
        let theirs: HashSet<&str> = other.symbols.iter().map(String::as_str).collect();
        own == theirs && self.scale_factor == other.scale_factor && self.greater == other.greater
    }
}

/// An ordered hierarchy of unit entries for one physical-quantity family.
///
/// Built once from a symbol → scale-factor table. Symbols with identical factors
/// collapse into one entry, entries are sorted ascending by factor and chained
/// both ways through their vector indices. Read-only after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitLadder {
    entries: Vec<UnitEntry>,
    symbol_to_entry: HashMap<String, usize>,
    symbols: Vec<String>,
}

impl UnitLadder {
    pub fn new(units: &[(&str, f64)]) -> Self {
        let mut entries: Vec<UnitEntry> = Vec::new();
        let mut symbols = Vec::new();

        for &(symbol, scale_factor) in units {
            symbols.push(symbol.to_string());
            match entries.iter_mut().find(|e| e.scale_factor == scale_factor) {
                Some(entry) => entry.symbols.push(symbol.to_string()),
                None => entries.push(UnitEntry {
                    symbols: vec![symbol.to_string()],
                    scale_factor,
                    greater: None,
                    lesser: None,
                }),
            }
        }

        entries.sort_by(|a, b| a.scale_factor.total_cmp(&b.scale_factor));

        for index in 1..entries.len() {
            entries[index].lesser = Some(index - 1);
            entries[index - 1].greater = Some(index);
        }

        let mut symbol_to_entry = HashMap::new();
        for (index, entry) in entries.iter().enumerate() {
            for symbol in &entry.symbols {
                symbol_to_entry.insert(symbol.clone(), index);
            }
        }

        UnitLadder {
            entries,
            symbol_to_entry,
            symbols,
        }
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbol_to_entry.contains_key(symbol)
    }

    /// Every symbol registered in this ladder, synonyms included, in
    /// registration order.
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// The entries of this ladder, ascending by scale factor.
    pub fn entries(&self) -> &[UnitEntry] {
        &self.entries
    }

    fn entry_index(&self, symbol: &str) -> Result<usize, UnitError> {
        self.symbol_to_entry
            .get(symbol)
            .copied()
            .ok_or_else(|| UnitError::UnknownUnit(symbol.to_string()))
    }

    pub fn entry(&self, symbol: &str) -> Result<&UnitEntry, UnitError> {
        Ok(&self.entries[self.entry_index(symbol)?])
    }

    /// The multiplier converting one `symbol` into the family's base unit.
    pub fn scale_factor(&self, symbol: &str) -> Result<f64, UnitError> {
        Ok(self.entry(symbol)?.scale_factor)
    }

    pub fn can_scale_up(&self, symbol: &str) -> Result<bool, UnitError> {
        Ok(self.entry(symbol)?.greater.is_some())
    }

    pub fn can_scale_down(&self, symbol: &str) -> Result<bool, UnitError> {
        Ok(self.entry(symbol)?.lesser.is_some())
    }

    /// Returns the representative symbol of the next-larger entry and the ratio
    /// to multiply a magnitude by to re-express it in that unit.
    ///
    /// The ratio is current factor / greater factor: quantities are stored as
    /// base-unit-per-symbol, so going from unit x to unit y multiplies by
    /// (base / x) and divides by (base / y).
    pub fn scale_up(&self, symbol: &str) -> Result<(&str, f64), UnitError> {
        let entry = self.entry(symbol)?;
        match entry.greater {
            Some(index) => {
                let greater = &self.entries[index];
                Ok((
                    greater.symbols[0].as_str(),
                    entry.scale_factor / greater.scale_factor,
                ))
            }
            None => Err(UnitError::NoGreaterUnit(symbol.to_string())),
        }
    }

    pub fn scale_down(&self, symbol: &str) -> Result<(&str, f64), UnitError> {
        let entry = self.entry(symbol)?;
        match entry.lesser {
            Some(index) => {
                let lesser = &self.entries[index];
                Ok((
                    lesser.symbols[0].as_str(),
                    entry.scale_factor / lesser.scale_factor,
                ))
            }
            None => Err(UnitError::NoLesserUnit(symbol.to_string())),
        }
    }
}

// Standardised to litres.
pub static VOLUME_UNITS: LazyLock<UnitLadder> =
    LazyLock::new(|| UnitLadder::new(&[("L", 1.0), ("mL", 1e-3), ("µL", 1e-6), ("uL", 1e-6)]));

// Standardised to grams.
pub static MASS_UNITS: LazyLock<UnitLadder> = LazyLock::new(|| {
    UnitLadder::new(&[
        ("kg", 1000.0),
        ("g", 1.0),
        ("mg", 1e-3),
        ("µg", 1e-6),
        ("ug", 1e-6),
    ])
});

// Standardised to molar.
pub static CONCENTRATION_UNITS: LazyLock<UnitLadder> =
    LazyLock::new(|| UnitLadder::new(&[("M", 1.0), ("mM", 1e-3), ("µM", 1e-6), ("uM", 1e-6)]));

/// Percentage of total volume. Valid in recipes, but not part of any ladder.
pub const PERCENT: &str = "%";

/// All unit symbols recognized in a recipe concentration, across the three
/// ladders plus "%".
pub fn valid_units() -> Vec<String> {
    let mut units: Vec<String> = Vec::new();
    units.extend_from_slice(VOLUME_UNITS.symbols());
    units.extend_from_slice(MASS_UNITS.symbols());
    units.extend_from_slice(CONCENTRATION_UNITS.symbols());
    units.push(PERCENT.to_string());
    units
}

/// Determines which family a symbol belongs to: volume, then mass, then
/// concentration, then the "%" token. First match wins.
pub fn classify_unit(symbol: &str) -> Result<UnitFamily, UnitError> {
    if VOLUME_UNITS.contains(symbol) {
        Ok(UnitFamily::Volume)
    } else if MASS_UNITS.contains(symbol) {
        Ok(UnitFamily::Mass)
    } else if CONCENTRATION_UNITS.contains(symbol) {
        Ok(UnitFamily::Concentration)
    } else if symbol == PERCENT {
        Ok(UnitFamily::Percent)
    } else {
        Err(UnitError::InvalidUnit(symbol.to_string()))
    }
}

fn ladder_for_symbol(symbol: &str) -> Result<&'static UnitLadder, UnitError> {
    if VOLUME_UNITS.contains(symbol) {
        Ok(&VOLUME_UNITS)
    } else if MASS_UNITS.contains(symbol) {
        Ok(&MASS_UNITS)
    } else if CONCENTRATION_UNITS.contains(symbol) {
        Ok(&CONCENTRATION_UNITS)
    } else {
        Err(UnitError::InvalidUnit(symbol.to_string()))
    }
}

pub fn volume_unit_to_litres(symbol: &str) -> Result<f64, UnitError> {
    VOLUME_UNITS.scale_factor(symbol)
}

pub fn mass_unit_to_grams(symbol: &str) -> Result<f64, UnitError> {
    MASS_UNITS.scale_factor(symbol)
}

pub fn concentration_unit_to_molar(symbol: &str) -> Result<f64, UnitError> {
    CONCENTRATION_UNITS.scale_factor(symbol)
}

/// Splits a raw string like "300mM" into its magnitude and unit substrings.
///
/// The magnitude is the leading run of ASCII digits and '.'; everything after it
/// is the symbol. No validation happens here: "1.2.3" or an empty magnitude is
/// passed through, and the caller decides whether the magnitude parses to a
/// positive number and whether the symbol is a known unit.
pub fn split_unit_quantity(text: &str) -> (&str, &str) {
    let boundary = text
        .char_indices()
        .find(|&(_, character)| !(character.is_ascii_digit() || character == '.'))
        .map(|(index, _)| index)
        .unwrap_or(text.len());
    text.split_at(boundary)
}

/// Re-expresses a quantity in larger units, one ladder step at a time, until its
/// magnitude drops below 1000 or the ladder runs out.
pub fn scale_up_quantity(magnitude: f64, symbol: &str) -> Result<(f64, String), UnitError> {
    let ladder = ladder_for_symbol(symbol)?;
    let mut magnitude = magnitude;
    let mut symbol = symbol.to_string();

    while magnitude >= 1000.0 && ladder.can_scale_up(&symbol)? {
        let (next_symbol, ratio) = ladder.scale_up(&symbol)?;
        magnitude *= ratio;
        symbol = next_symbol.to_string();
    }

    Ok((magnitude, symbol))
}

/// Re-expresses a quantity in smaller units until its magnitude reaches 1 or the
/// ladder runs out.
pub fn scale_down_quantity(magnitude: f64, symbol: &str) -> Result<(f64, String), UnitError> {
    let ladder = ladder_for_symbol(symbol)?;
    let mut magnitude = magnitude;
    let mut symbol = symbol.to_string();

    while magnitude < 1.0 && ladder.can_scale_down(&symbol)? {
        let (next_symbol, ratio) = ladder.scale_down(&symbol)?;
        magnitude *= ratio;
        symbol = next_symbol.to_string();
    }

    Ok((magnitude, symbol))
}

/// Renders a quantity for display: rescales the magnitude into [1, 1000) where
/// the ladder permits, rounds to two decimal places and appends the symbol.
///
/// A single conversion may not suffice (2000000 µL crosses two rungs to reach
/// "2.0L"), so scaling iterates one rung at a time, which keeps each ratio exact
/// per hop and halts at either the display band or a ladder boundary. At a
/// boundary the magnitude stays as is: 50000 L renders as "50000.0L".
pub fn scale_and_round_quantity(magnitude: f64, symbol: &str) -> Result<String, UnitError> {
    ladder_for_symbol(symbol)?;

    let (magnitude, symbol) = if magnitude >= 1000.0 {
        scale_up_quantity(magnitude, symbol)?
    } else if magnitude < 1.0 {
        scale_down_quantity(magnitude, symbol)?
    } else {
        (magnitude, symbol.to_string())
    };

    Ok(format!("{}{}", round_for_display(magnitude), symbol))
}

// Two decimal places, keeping at least one decimal digit: 100.0 not 100.00,
// 10.09 untouched. Rounding happens only here, after scaling, so a value like
// 999.996 renders as "1000.0" without being rescaled again.
fn round_for_display(magnitude: f64) -> String {
    let mut rounded = format!("{:.2}", magnitude);
    if rounded.ends_with('0') && !rounded.ends_with(".0") {
        rounded.pop();
    }
    rounded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_ladder() -> UnitLadder {
        UnitLadder::new(&[("uL", 1e-6), ("µL", 1e-6), ("mL", 1e-3), ("L", 1.0)])
    }

    #[test]
    fn test_ladder_assembly() {
        let ladder = test_ladder();

        let expected = vec![
            UnitEntry {
                symbols: vec!["µL".to_string(), "uL".to_string()],
                scale_factor: 1e-6,
                greater: Some(1),
                lesser: None,
            },
            UnitEntry {
                symbols: vec!["mL".to_string()],
                scale_factor: 1e-3,
                greater: Some(2),
                lesser: Some(0),
            },
            UnitEntry {
                symbols: vec!["L".to_string()],
                scale_factor: 1.0,
                greater: None,
                lesser: Some(1),
            },
        ];

        assert_eq!(ladder.entries(), &expected[..]);
    }

    #[test]
    fn test_synonyms_share_one_entry() {
        let ladder = test_ladder();
        assert!(std::ptr::eq(
            ladder.entry("uL").unwrap(),
            ladder.entry("µL").unwrap()
        ));
        assert_eq!(ladder.symbols().len(), 4);
    }

    #[test]
    fn test_scale_factors_survive_assembly() {
        for (ladder, table) in [
            (&*VOLUME_UNITS, &[("L", 1.0), ("mL", 1e-3), ("µL", 1e-6), ("uL", 1e-6)][..]),
            (
                &*MASS_UNITS,
                &[
                    ("kg", 1000.0),
                    ("g", 1.0),
                    ("mg", 1e-3),
                    ("µg", 1e-6),
                    ("ug", 1e-6),
                ][..],
            ),
            (
                &*CONCENTRATION_UNITS,
                &[("M", 1.0), ("mM", 1e-3), ("µM", 1e-6), ("uM", 1e-6)][..],
            ),
        ] {
            for &(symbol, factor) in table {
                assert_eq!(ladder.scale_factor(symbol).unwrap(), factor);
            }
        }
    }

    #[test]
    fn test_scale_checking() {
        let ladder = test_ladder();

        assert!(ladder.can_scale_up("mL").unwrap());
        assert!(ladder.can_scale_down("mL").unwrap());

        assert!(!ladder.can_scale_up("L").unwrap());
        assert!(ladder.can_scale_down("L").unwrap());

        assert!(ladder.can_scale_up("µL").unwrap());
        assert!(!ladder.can_scale_down("uL").unwrap());

        assert_eq!(
            ladder.can_scale_up("xyz"),
            Err(UnitError::UnknownUnit("xyz".to_string()))
        );
    }

    #[test]
    fn test_correct_scale() {
        let ladder = test_ladder();

        // Intentional switching between µL and uL.
        assert_eq!(ladder.scale_up("uL").unwrap(), ("mL", 1e-6 / 1e-3));
        assert_eq!(ladder.scale_up("µL").unwrap(), ("mL", 1e-6 / 1e-3));
        assert_eq!(ladder.scale_down("L").unwrap(), ("mL", 1.0 / 1e-3));

        assert_eq!(
            ladder.scale_down("µL"),
            Err(UnitError::NoLesserUnit("µL".to_string()))
        );
        assert_eq!(
            ladder.scale_up("L"),
            Err(UnitError::NoGreaterUnit("L".to_string()))
        );
    }

    #[test]
    fn test_scale_round_trip() {
        // Re-expressing a magnitude one rung up and converting back must land on
        // the same value.
        let magnitude = 250.0;
        let (symbol, ratio) = MASS_UNITS.scale_up("mg").unwrap();
        let converted = magnitude * ratio;
        let back = converted * MASS_UNITS.scale_factor(symbol).unwrap()
            / MASS_UNITS.scale_factor("mg").unwrap();
        assert!((back - magnitude).abs() < 1e-9);
    }

    #[test]
    fn test_conversion_functions() {
        for symbol in VOLUME_UNITS.symbols() {
            assert_eq!(
                volume_unit_to_litres(symbol).unwrap(),
                VOLUME_UNITS.scale_factor(symbol).unwrap()
            );
        }
        for symbol in MASS_UNITS.symbols() {
            assert_eq!(
                mass_unit_to_grams(symbol).unwrap(),
                MASS_UNITS.scale_factor(symbol).unwrap()
            );
        }
        for symbol in CONCENTRATION_UNITS.symbols() {
            assert_eq!(
                concentration_unit_to_molar(symbol).unwrap(),
                CONCENTRATION_UNITS.scale_factor(symbol).unwrap()
            );
        }

        assert!(volume_unit_to_litres("g").is_err());
    }

    #[test]
    fn test_classify_unit() {
        assert_eq!(classify_unit("mL").unwrap(), UnitFamily::Volume);
        assert_eq!(classify_unit("kg").unwrap(), UnitFamily::Mass);
        assert_eq!(classify_unit("µM").unwrap(), UnitFamily::Concentration);
        assert_eq!(classify_unit("%").unwrap(), UnitFamily::Percent);
        assert_eq!(
            classify_unit("furlong"),
            Err(UnitError::InvalidUnit("furlong".to_string()))
        );
    }

    #[test]
    fn test_valid_units() {
        let units = valid_units();
        for symbol in [
            "L", "mL", "µL", "uL", "kg", "g", "mg", "µg", "ug", "M", "mM", "µM", "uM", "%",
        ] {
            assert!(units.contains(&symbol.to_string()), "missing {symbol}");
        }
        assert_eq!(units.len(), 14);
    }

    #[test]
    fn test_split_unit_quantity() {
        for magnitude in ["100", "1.0", "2343.5", ".1", "10.", "0", ""] {
            for symbol in ["M", "L", "mM", "µL", ""] {
                let text = format!("{}{}", magnitude, symbol);
                assert_eq!(split_unit_quantity(&text), (magnitude, symbol));
            }
        }

        assert_eq!(split_unit_quantity(""), ("", ""));
        assert_eq!(split_unit_quantity("300"), ("300", ""));
        assert_eq!(split_unit_quantity(".L"), (".", "L"));
    }

    #[test]
    fn test_scaling() {
        assert_eq!(scale_and_round_quantity(0.1, "L").unwrap(), "100.0mL");
        assert_eq!(scale_and_round_quantity(10.0 * 1e-6, "M").unwrap(), "10.0µM");
        assert_eq!(scale_and_round_quantity(1000.0, "mg").unwrap(), "1.0g");

        assert_eq!(scale_and_round_quantity(1.0, "mg").unwrap(), "1.0mg");
        assert_eq!(scale_and_round_quantity(4.0, "g").unwrap(), "4.0g");
    }

    #[test]
    fn test_rounding() {
        assert_eq!(scale_and_round_quantity(123.456, "L").unwrap(), "123.46L");
        assert_eq!(scale_and_round_quantity(0.123456, "L").unwrap(), "123.46mL");
        assert_eq!(scale_and_round_quantity(10089.0, "µL").unwrap(), "10.09mL");
    }

    #[test]
    fn test_scaling_crosses_multiple_rungs() {
        assert_eq!(scale_and_round_quantity(2_000_000.0, "µL").unwrap(), "2.0L");
        assert_eq!(scale_and_round_quantity(5e-7, "M").unwrap(), "0.5µM");
    }

    #[test]
    fn test_ladder_boundaries_stop_scaling() {
        // No unit above the litre, none below the microlitre.
        assert_eq!(scale_and_round_quantity(50000.0, "L").unwrap(), "50000.0L");
        assert_eq!(scale_and_round_quantity(0.05, "µL").unwrap(), "0.05µL");
    }

    #[test]
    fn test_rounding_may_leave_display_band() {
        // Rounding happens after scaling, never before, so a value that rounds
        // up to 1000 is not rescaled again.
        assert_eq!(scale_and_round_quantity(999.996, "L").unwrap(), "1000.0L");
    }

    #[test]
    fn test_invalid_symbols_rejected() {
        assert_eq!(
            scale_and_round_quantity(1.0, "parsec"),
            Err(UnitError::InvalidUnit("parsec".to_string()))
        );
        // Percent is outside every ladder; callers convert it before formatting.
        assert_eq!(
            scale_and_round_quantity(10.0, "%"),
            Err(UnitError::InvalidUnit("%".to_string()))
        );
    }
}
