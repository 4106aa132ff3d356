//! Domain enums used across the platform
//!
//! Stored as text in the database; the serialized form matches the wire and
//! storage representation exactly (SCREAMING_SNAKE_CASE).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How a product's quantity is counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuantityType {
    /// Discrete items; ledger quantities must be whole numbers
    #[default]
    Unit,
    /// Weighed or measured goods (kg, liters); fractional quantities allowed
    WeightVolume,
}

impl QuantityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuantityType::Unit => "UNIT",
            QuantityType::WeightVolume => "WEIGHT_VOLUME",
        }
    }
}

impl FromStr for QuantityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNIT" => Ok(QuantityType::Unit),
            "WEIGHT_VOLUME" => Ok(QuantityType::WeightVolume),
            other => Err(format!("unknown quantity type: {}", other)),
        }
    }
}

impl fmt::Display for QuantityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quality classification for shop products
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityType {
    Genuine,
    Used,
    Fake,
    Refurbished,
}

impl QualityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityType::Genuine => "GENUINE",
            QualityType::Used => "USED",
            QualityType::Fake => "FAKE",
            QualityType::Refurbished => "REFURBISHED",
        }
    }
}

impl FromStr for QualityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GENUINE" => Ok(QualityType::Genuine),
            "USED" => Ok(QualityType::Used),
            "FAKE" => Ok(QualityType::Fake),
            "REFURBISHED" => Ok(QualityType::Refurbished),
            other => Err(format!("unknown quality type: {}", other)),
        }
    }
}

/// Review lifecycle of a shop product
///
/// Products created on the fly during stock entry start as `PendingReview`;
/// linking to a catalog entry moves them to `Linked`, and managers can set
/// `Reviewed` or `Archived` explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductStatus {
    #[default]
    PendingReview,
    Reviewed,
    Linked,
    Archived,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::PendingReview => "PENDING_REVIEW",
            ProductStatus::Reviewed => "REVIEWED",
            ProductStatus::Linked => "LINKED",
            ProductStatus::Archived => "ARCHIVED",
        }
    }
}

impl FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING_REVIEW" => Ok(ProductStatus::PendingReview),
            "REVIEWED" => Ok(ProductStatus::Reviewed),
            "LINKED" => Ok(ProductStatus::Linked),
            "ARCHIVED" => Ok(ProductStatus::Archived),
            other => Err(format!("unknown product status: {}", other)),
        }
    }
}

impl fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_type_round_trip() {
        for qt in [QuantityType::Unit, QuantityType::WeightVolume] {
            assert_eq!(qt.as_str().parse::<QuantityType>().unwrap(), qt);
        }
    }

    #[test]
    fn test_quantity_type_default_is_unit() {
        assert_eq!(QuantityType::default(), QuantityType::Unit);
    }

    #[test]
    fn test_product_status_round_trip() {
        for st in [
            ProductStatus::PendingReview,
            ProductStatus::Reviewed,
            ProductStatus::Linked,
            ProductStatus::Archived,
        ] {
            assert_eq!(st.as_str().parse::<ProductStatus>().unwrap(), st);
        }
    }

    #[test]
    fn test_unknown_values_rejected() {
        assert!("UNITS".parse::<QuantityType>().is_err());
        assert!("".parse::<ProductStatus>().is_err());
        assert!("genuine".parse::<QualityType>().is_err());
    }

    #[test]
    fn test_serde_representation() {
        let json = serde_json::to_string(&QuantityType::WeightVolume).unwrap();
        assert_eq!(json, "\"WEIGHT_VOLUME\"");
        let json = serde_json::to_string(&ProductStatus::PendingReview).unwrap();
        assert_eq!(json, "\"PENDING_REVIEW\"");
    }
}
