//! Volume pricing tiers.
//!
//! Products are priced by quantity bands: a tier maps a quantity range such
//! as `"1-9"` or `"50+"` to a unit price. Tiers are evaluated in the order
//! the catalog lists them and the first matching tier wins.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Errors that can occur when parsing or resolving [`PriceTier`]s.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TierError {
    /// The tier list is empty. Callers must provide at least one tier.
    #[error("price tier list is empty")]
    Empty,
    /// The quantity range string could not be parsed.
    #[error("invalid quantity range: {0:?}")]
    InvalidRange(String),
    /// The price string could not be parsed.
    #[error("invalid price: {0:?}")]
    InvalidPrice(String),
}

/// A quantity range, either closed (`"1-9"`) or open-ended (`"50+"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TierRange {
    /// An inclusive `min-max` band.
    Closed {
        /// Lower bound (inclusive).
        min: u32,
        /// Upper bound (inclusive).
        max: u32,
    },
    /// A `min+` band with no upper bound.
    Open {
        /// Lower bound (inclusive).
        min: u32,
    },
}

impl TierRange {
    /// Returns `true` if `quantity` falls within this range.
    #[must_use]
    pub const fn contains(self, quantity: u32) -> bool {
        match self {
            Self::Closed { min, max } => quantity >= min && quantity <= max,
            Self::Open { min } => quantity >= min,
        }
    }

    /// Lower bound of the range.
    #[must_use]
    pub const fn min(self) -> u32 {
        match self {
            Self::Closed { min, .. } | Self::Open { min } => min,
        }
    }
}

impl fmt::Display for TierRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed { min, max } => write!(f, "{min}-{max}"),
            Self::Open { min } => write!(f, "{min}+"),
        }
    }
}

impl FromStr for TierRange {
    type Err = TierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TierError::InvalidRange(s.to_owned());

        if let Some(min) = s.strip_suffix('+') {
            let min = min.trim().parse::<u32>().map_err(|_| invalid())?;
            return Ok(Self::Open { min });
        }

        let (min, max) = s.split_once('-').ok_or_else(invalid)?;
        let min = min.trim().parse::<u32>().map_err(|_| invalid())?;
        let max = max.trim().parse::<u32>().map_err(|_| invalid())?;
        if min > max {
            return Err(invalid());
        }
        Ok(Self::Closed { min, max })
    }
}

impl Serialize for TierRange {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TierRange {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A volume-pricing rule: a quantity range mapped to a unit price.
///
/// Wire format (as served by the catalog API and as persisted in the cart):
///
/// ```json
/// { "quantity": "1-9", "price": "$150.00" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTier {
    /// Quantity band this tier applies to.
    pub quantity: TierRange,
    /// Unit price within the band.
    #[serde(rename = "price", with = "dollar_amount")]
    pub unit_price: Decimal,
}

impl PriceTier {
    /// Create a new price tier.
    #[must_use]
    pub const fn new(quantity: TierRange, unit_price: Decimal) -> Self {
        Self {
            quantity,
            unit_price,
        }
    }

    /// Parse a tier from its wire strings, e.g. `("1-9", "$150.00")`.
    ///
    /// # Errors
    ///
    /// Returns `TierError::InvalidRange` or `TierError::InvalidPrice` if
    /// either component is malformed.
    pub fn parse(quantity: &str, price: &str) -> Result<Self, TierError> {
        Ok(Self {
            quantity: quantity.parse()?,
            unit_price: parse_price(price)?,
        })
    }
}

/// Parse a price string, tolerating a leading `$`.
fn parse_price(s: &str) -> Result<Decimal, TierError> {
    let trimmed = s.trim().trim_start_matches('$');
    Decimal::from_str(trimmed).map_err(|_| TierError::InvalidPrice(s.to_owned()))
}

/// Serde adapter for `"$150.00"`-style price strings.
mod dollar_amount {
    use super::{Decimal, parse_price};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&format_args!("${amount:.2}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_price(&s).map_err(serde::de::Error::custom)
    }
}

/// Resolve the unit price for `quantity` against an ordered tier list.
///
/// Tiers are scanned in order and the first matching tier wins. If no tier
/// matches, the first tier's price is returned as a fallback so a total can
/// always be computed; callers must not rely on the fallback indicating an
/// explicit match.
///
/// # Errors
///
/// Returns `TierError::Empty` if `tiers` is empty.
pub fn resolve_unit_price(tiers: &[PriceTier], quantity: u32) -> Result<Decimal, TierError> {
    let first = tiers.first().ok_or(TierError::Empty)?;
    for tier in tiers {
        if tier.quantity.contains(quantity) {
            return Ok(tier.unit_price);
        }
    }
    Ok(first.unit_price)
}
