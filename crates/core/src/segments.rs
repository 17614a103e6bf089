// crates/core/src/segments.rs
//! Classification rules: customer RFM segments, product quadrants,
//! benchmark price position, and the health/insight thresholds.

use crate::stats::median;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

// ============================================================================
// Customer segments
// ============================================================================

/// RFM segment. Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub enum CustomerSegment {
    Vip,
    Frequent,
    HighSpender,
    Occasional,
}

impl CustomerSegment {
    pub const ALL: [CustomerSegment; 4] = [
        CustomerSegment::Vip,
        CustomerSegment::Frequent,
        CustomerSegment::HighSpender,
        CustomerSegment::Occasional,
    ];

    pub fn label(self) -> &'static str {
        match self {
            CustomerSegment::Vip => "VIP Customers",
            CustomerSegment::Frequent => "Frequent Buyers",
            CustomerSegment::HighSpender => "High Spenders",
            CustomerSegment::Occasional => "Occasional Buyers",
        }
    }
}

impl fmt::Display for CustomerSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for CustomerSegment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vip" | "vip customers" => Ok(CustomerSegment::Vip),
            "frequent" | "frequent buyers" => Ok(CustomerSegment::Frequent),
            "highspender" | "high-spender" | "high spenders" => Ok(CustomerSegment::HighSpender),
            "occasional" | "occasional buyers" => Ok(CustomerSegment::Occasional),
            other => Err(format!("unknown customer segment: {other}")),
        }
    }
}

/// Population medians that split customers into segments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct SegmentThresholds {
    pub frequency_median: f64,
    pub spend_median: f64,
}

impl SegmentThresholds {
    /// Medians over `(frequency, spend)` pairs; `None` for an empty population.
    pub fn from_population(customers: &[(f64, f64)]) -> Option<Self> {
        let freqs: Vec<f64> = customers.iter().map(|c| c.0).collect();
        let spends: Vec<f64> = customers.iter().map(|c| c.1).collect();
        Some(Self {
            frequency_median: median(&freqs)?,
            spend_median: median(&spends)?,
        })
    }

    /// Equality with a median counts as qualifying.
    pub fn classify(&self, frequency: f64, spend: f64) -> CustomerSegment {
        let frequent = frequency >= self.frequency_median;
        let big_spender = spend >= self.spend_median;
        match (frequent, big_spender) {
            (true, true) => CustomerSegment::Vip,
            (true, false) => CustomerSegment::Frequent,
            (false, true) => CustomerSegment::HighSpender,
            (false, false) => CustomerSegment::Occasional,
        }
    }
}

// ============================================================================
// Product quadrants
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub enum ProductQuadrant {
    /// High revenue, high volume.
    Star,
    /// High revenue, low volume.
    Premium,
    /// Low revenue, high volume.
    Volume,
    QuestionMark,
}

impl ProductQuadrant {
    pub const ALL: [ProductQuadrant; 4] = [
        ProductQuadrant::Star,
        ProductQuadrant::Premium,
        ProductQuadrant::Volume,
        ProductQuadrant::QuestionMark,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ProductQuadrant::Star => "Stars",
            ProductQuadrant::Premium => "Premium",
            ProductQuadrant::Volume => "Volume",
            ProductQuadrant::QuestionMark => "Question Marks",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct QuadrantThresholds {
    pub revenue_median: f64,
    pub units_median: f64,
}

impl QuadrantThresholds {
    /// Medians over `(revenue, units)` pairs.
    pub fn from_population(products: &[(f64, f64)]) -> Option<Self> {
        let revenue: Vec<f64> = products.iter().map(|p| p.0).collect();
        let units: Vec<f64> = products.iter().map(|p| p.1).collect();
        Some(Self {
            revenue_median: median(&revenue)?,
            units_median: median(&units)?,
        })
    }

    pub fn classify(&self, revenue: f64, units: f64) -> ProductQuadrant {
        match (revenue >= self.revenue_median, units >= self.units_median) {
            (true, true) => ProductQuadrant::Star,
            (true, false) => ProductQuadrant::Premium,
            (false, true) => ProductQuadrant::Volume,
            (false, false) => ProductQuadrant::QuestionMark,
        }
    }
}

// ============================================================================
// Benchmark price position
// ============================================================================

/// Our price relative to a competitor's site price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub enum PricePosition {
    Above,
    Below,
    At,
}

impl PricePosition {
    /// Prices are compared in whole cents so float noise never flips "At".
    pub fn classify(our_price: f64, competitor_price: f64) -> Self {
        let ours = (our_price * 100.0).round() as i64;
        let theirs = (competitor_price * 100.0).round() as i64;
        match ours.cmp(&theirs) {
            std::cmp::Ordering::Greater => PricePosition::Above,
            std::cmp::Ordering::Less => PricePosition::Below,
            std::cmp::Ordering::Equal => PricePosition::At,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PricePosition::Above => "Above",
            PricePosition::Below => "Below",
            PricePosition::At => "At",
        }
    }

    /// Parse the comparison selector; "All" and blank mean no filter.
    pub fn from_param(param: Option<&str>) -> Result<Option<Self>, String> {
        match param.map(str::trim) {
            None | Some("") | Some("All") | Some("all") => Ok(None),
            Some(s) => s.parse().map(Some),
        }
    }
}

impl FromStr for PricePosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "above" => Ok(PricePosition::Above),
            "below" => Ok(PricePosition::Below),
            "at" => Ok(PricePosition::At),
            other => Err(format!("unknown price position: {other}")),
        }
    }
}

/// Mean percentage gap beyond which pricing is called out.
pub const PRICING_INSIGHT_THRESHOLD_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub enum PricingInsight {
    Overpriced,
    Competitive,
    Aligned,
}

impl PricingInsight {
    pub fn from_mean_difference_pct(mean_pct: f64) -> Self {
        if mean_pct > PRICING_INSIGHT_THRESHOLD_PCT {
            PricingInsight::Overpriced
        } else if mean_pct < -PRICING_INSIGHT_THRESHOLD_PCT {
            PricingInsight::Competitive
        } else {
            PricingInsight::Aligned
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            PricingInsight::Overpriced => {
                "Prices are higher than competitors on average; consider price optimization"
            }
            PricingInsight::Competitive => "Prices are more competitive than benchmarks",
            PricingInsight::Aligned => "Prices are closely aligned with market benchmarks",
        }
    }
}

// ============================================================================
// Stock health
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub enum StockHealth {
    Excellent,
    Good,
    NeedsAttention,
}

impl StockHealth {
    /// In-stock percentage: ≥90 excellent, ≥75 good.
    pub fn from_stock_rate(rate_pct: f64) -> Self {
        if rate_pct >= 90.0 {
            StockHealth::Excellent
        } else if rate_pct >= 75.0 {
            StockHealth::Good
        } else {
            StockHealth::NeedsAttention
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rfm_worked_example() {
        let population = [(1.0, 10.0), (2.0, 20.0), (3.0, 30.0), (4.0, 40.0)];
        let t = SegmentThresholds::from_population(&population).unwrap();
        assert_eq!(t.frequency_median, 2.5);
        assert_eq!(t.spend_median, 25.0);

        assert_eq!(t.classify(4.0, 40.0), CustomerSegment::Vip);
        assert_eq!(t.classify(1.0, 10.0), CustomerSegment::Occasional);
        assert_eq!(t.classify(4.0, 10.0), CustomerSegment::Frequent);
        assert_eq!(t.classify(1.0, 40.0), CustomerSegment::HighSpender);
    }

    #[test]
    fn test_rfm_ties_qualify() {
        let t = SegmentThresholds {
            frequency_median: 2.0,
            spend_median: 20.0,
        };
        assert_eq!(t.classify(2.0, 20.0), CustomerSegment::Vip);
        assert_eq!(t.classify(2.0, 19.99), CustomerSegment::Frequent);
        assert_eq!(t.classify(1.0, 20.0), CustomerSegment::HighSpender);
    }

    #[test]
    fn test_rfm_empty_population() {
        assert!(SegmentThresholds::from_population(&[]).is_none());
    }

    #[test]
    fn test_segment_parse() {
        assert_eq!("vip".parse::<CustomerSegment>(), Ok(CustomerSegment::Vip));
        assert_eq!(
            "High Spenders".parse::<CustomerSegment>(),
            Ok(CustomerSegment::HighSpender)
        );
        assert!("whales".parse::<CustomerSegment>().is_err());
        assert_eq!(
            serde_json::to_string(&CustomerSegment::HighSpender).unwrap(),
            "\"highSpender\""
        );
    }

    #[test]
    fn test_quadrants() {
        let t = QuadrantThresholds {
            revenue_median: 100.0,
            units_median: 10.0,
        };
        assert_eq!(t.classify(100.0, 10.0), ProductQuadrant::Star);
        assert_eq!(t.classify(500.0, 2.0), ProductQuadrant::Premium);
        assert_eq!(t.classify(50.0, 40.0), ProductQuadrant::Volume);
        assert_eq!(t.classify(50.0, 2.0), ProductQuadrant::QuestionMark);
    }

    #[test]
    fn test_price_position() {
        assert_eq!(PricePosition::classify(10.0, 9.99), PricePosition::Above);
        assert_eq!(PricePosition::classify(9.5, 10.0), PricePosition::Below);
        assert_eq!(PricePosition::classify(0.1 + 0.2, 0.3), PricePosition::At);
        assert_eq!(PricePosition::from_param(Some("All")), Ok(None));
        assert_eq!(
            PricePosition::from_param(Some("below")),
            Ok(Some(PricePosition::Below))
        );
        assert!(PricePosition::from_param(Some("sideways")).is_err());
    }

    #[test]
    fn test_pricing_insight_thresholds() {
        assert_eq!(
            PricingInsight::from_mean_difference_pct(5.01),
            PricingInsight::Overpriced
        );
        assert_eq!(
            PricingInsight::from_mean_difference_pct(5.0),
            PricingInsight::Aligned
        );
        assert_eq!(
            PricingInsight::from_mean_difference_pct(-7.0),
            PricingInsight::Competitive
        );
    }

    #[test]
    fn test_stock_health() {
        assert_eq!(StockHealth::from_stock_rate(90.0), StockHealth::Excellent);
        assert_eq!(StockHealth::from_stock_rate(75.0), StockHealth::Good);
        assert_eq!(StockHealth::from_stock_rate(74.9), StockHealth::NeedsAttention);
    }
}
