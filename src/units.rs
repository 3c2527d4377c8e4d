//! Unit registry and base-unit normalisation.
//!
//! Every numeric value that carries a unit is stored in the base unit of its
//! category. Formulas therefore always operate on base-unit numbers and only
//! display boundaries convert back.

use crate::error::UnitError;
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitCategory {
    Length,
    Area,
    Volume,
    Weight,
    Percentage,
    Count,
}

impl UnitCategory {
    pub const ALL: [UnitCategory; 6] = [
        UnitCategory::Length,
        UnitCategory::Area,
        UnitCategory::Volume,
        UnitCategory::Weight,
        UnitCategory::Percentage,
        UnitCategory::Count,
    ];

    /// Symbol of the canonical unit all values of this category are stored in.
    pub fn base_unit(self) -> &'static str {
        match self {
            UnitCategory::Length => "m",
            UnitCategory::Area => "m2",
            UnitCategory::Volume => "m3",
            UnitCategory::Weight => "kg",
            UnitCategory::Percentage => "ratio",
            UnitCategory::Count => "ea",
        }
    }
}

impl fmt::Display for UnitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnitCategory::Length => "length",
            UnitCategory::Area => "area",
            UnitCategory::Volume => "volume",
            UnitCategory::Weight => "weight",
            UnitCategory::Percentage => "percentage",
            UnitCategory::Count => "count",
        };
        f.write_str(name)
    }
}

/// A single unit: `base_value = display_value * to_base`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Unit {
    pub symbol: &'static str,
    pub name: &'static str,
    pub category: UnitCategory,
    pub to_base: f64,
}

const INCH: f64 = 0.0254;
const FOOT: f64 = 0.3048;
const YARD: f64 = 0.9144;
const US_GALLON: f64 = 0.003_785_411_784;

static UNITS: &[Unit] = &[
    // Length
    unit("mm", "millimeter", UnitCategory::Length, 0.001),
    unit("cm", "centimeter", UnitCategory::Length, 0.01),
    unit("m", "meter", UnitCategory::Length, 1.0),
    unit("km", "kilometer", UnitCategory::Length, 1000.0),
    unit("in", "inch", UnitCategory::Length, INCH),
    unit("ft", "foot", UnitCategory::Length, FOOT),
    unit("yd", "yard", UnitCategory::Length, YARD),
    unit("mi", "mile", UnitCategory::Length, 1609.344),
    // Area
    unit("mm2", "square millimeter", UnitCategory::Area, 1e-6),
    unit("cm2", "square centimeter", UnitCategory::Area, 1e-4),
    unit("m2", "square meter", UnitCategory::Area, 1.0),
    unit("ha", "hectare", UnitCategory::Area, 10_000.0),
    unit("in2", "square inch", UnitCategory::Area, INCH * INCH),
    unit("ft2", "square foot", UnitCategory::Area, FOOT * FOOT),
    unit("yd2", "square yard", UnitCategory::Area, YARD * YARD),
    unit("acre", "acre", UnitCategory::Area, 4046.856_422_4),
    // Volume
    unit("ml", "milliliter", UnitCategory::Volume, 1e-6),
    unit("l", "liter", UnitCategory::Volume, 0.001),
    unit("cm3", "cubic centimeter", UnitCategory::Volume, 1e-6),
    unit("m3", "cubic meter", UnitCategory::Volume, 1.0),
    unit("in3", "cubic inch", UnitCategory::Volume, INCH * INCH * INCH),
    unit("ft3", "cubic foot", UnitCategory::Volume, FOOT * FOOT * FOOT),
    unit("yd3", "cubic yard", UnitCategory::Volume, YARD * YARD * YARD),
    unit("gal", "US gallon", UnitCategory::Volume, US_GALLON),
    unit("qt", "US quart", UnitCategory::Volume, US_GALLON / 4.0),
    // Weight
    unit("g", "gram", UnitCategory::Weight, 0.001),
    unit("kg", "kilogram", UnitCategory::Weight, 1.0),
    unit("t", "metric ton", UnitCategory::Weight, 1000.0),
    unit("oz", "ounce", UnitCategory::Weight, 0.028_349_523_125),
    unit("lb", "pound", UnitCategory::Weight, 0.453_592_37),
    unit("ton", "short ton", UnitCategory::Weight, 907.184_74),
    // Percentage
    unit("%", "percent", UnitCategory::Percentage, 0.01),
    unit("ratio", "ratio", UnitCategory::Percentage, 1.0),
    // Count
    unit("ea", "each", UnitCategory::Count, 1.0),
    unit("pcs", "pieces", UnitCategory::Count, 1.0),
    unit("dozen", "dozen", UnitCategory::Count, 12.0),
];

static ALIASES: &[(&str, &str)] = &[
    ("L", "l"),
    ("mL", "ml"),
    ("sqm", "m2"),
    ("sqft", "ft2"),
    ("pc", "pcs"),
];

const fn unit(
    symbol: &'static str,
    name: &'static str,
    category: UnitCategory,
    to_base: f64,
) -> Unit {
    Unit {
        symbol,
        name,
        category,
        to_base,
    }
}

fn registry() -> &'static AHashMap<&'static str, &'static Unit> {
    static REGISTRY: OnceLock<AHashMap<&'static str, &'static Unit>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut map: AHashMap<&'static str, &'static Unit> =
            UNITS.iter().map(|u| (u.symbol, u)).collect();
        for (alias, canonical) in ALIASES {
            if let Some(unit) = map.get(canonical).copied() {
                map.insert(*alias, unit);
            }
        }
        map
    })
}

/// Looks up a unit by symbol or alias.
pub fn lookup(symbol: &str) -> Result<&'static Unit, UnitError> {
    registry()
        .get(symbol.trim())
        .copied()
        .ok_or_else(|| UnitError::UnknownUnit(symbol.to_string()))
}

pub fn get_unit_category(symbol: &str) -> Option<UnitCategory> {
    lookup(symbol).ok().map(|u| u.category)
}

/// Converts a display value to its category's base unit.
pub fn normalize_to_base(value: f64, symbol: &str) -> Result<f64, UnitError> {
    Ok(value * lookup(symbol)?.to_base)
}

/// Inverse of [`normalize_to_base`].
pub fn convert_from_base(base_value: f64, symbol: &str) -> Result<f64, UnitError> {
    Ok(base_value / lookup(symbol)?.to_base)
}

/// Converts a value between two units of the same category.
pub fn convert(value: f64, from: &str, to: &str) -> Result<f64, UnitError> {
    let from_unit = lookup(from)?;
    let to_unit = lookup(to)?;
    if from_unit.category != to_unit.category {
        return Err(UnitError::CategoryMismatch {
            from: from.to_string(),
            from_category: from_unit.category.to_string(),
            to: to.to_string(),
            to_category: to_unit.category.to_string(),
        });
    }
    Ok(value * from_unit.to_base / to_unit.to_base)
}

/// All canonical units of a category, in registry order.
pub fn units_in_category(category: UnitCategory) -> Vec<&'static Unit> {
    UNITS.iter().filter(|u| u.category == category).collect()
}

/// Checks that an optional unit symbol exists, returning its category.
pub(crate) fn validate_symbol(symbol: Option<&str>) -> Result<Option<UnitCategory>, UnitError> {
    symbol.map(|s| lookup(s).map(|u| u.category)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_its_base_unit_at_factor_one() {
        for category in UnitCategory::ALL {
            let base = lookup(category.base_unit()).unwrap();
            assert_eq!(base.category, category);
            assert_eq!(base.to_base, 1.0);
        }
    }

    #[test]
    fn symbols_are_unique() {
        assert_eq!(registry().len(), UNITS.len() + ALIASES.len());
    }

    #[test]
    fn aliases_resolve_to_canonical_units() {
        assert_eq!(lookup("L").unwrap().symbol, "l");
        assert_eq!(lookup("sqft").unwrap().symbol, "ft2");
    }
}
