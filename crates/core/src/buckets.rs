// crates/core/src/buckets.rs
//! Chart bucketing: price bands, rating bands, fixed-width histograms.
//!
//! Bands are right-inclusive: `(lower, upper]`.

use serde::Serialize;
use ts_rs::TS;

/// Label + count for one band, in band order (zero counts included).
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct BandCount {
    pub label: String,
    #[ts(type = "number")]
    pub count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceBand {
    Budget,
    MidRange,
    Premium,
    Luxury,
}

impl PriceBand {
    pub const ALL: [PriceBand; 4] = [
        PriceBand::Budget,
        PriceBand::MidRange,
        PriceBand::Premium,
        PriceBand::Luxury,
    ];

    /// Bands over `(0, 50]`, `(50, 100]`, `(100, 200]`, `(200, ∞)`.
    /// Non-positive prices fall outside every band.
    pub fn classify(price: f64) -> Option<Self> {
        if !(price > 0.0) {
            None
        } else if price <= 50.0 {
            Some(PriceBand::Budget)
        } else if price <= 100.0 {
            Some(PriceBand::MidRange)
        } else if price <= 200.0 {
            Some(PriceBand::Premium)
        } else {
            Some(PriceBand::Luxury)
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PriceBand::Budget => "Budget (<$50)",
            PriceBand::MidRange => "Mid-range ($50-100)",
            PriceBand::Premium => "Premium ($100-200)",
            PriceBand::Luxury => "Luxury (>$200)",
        }
    }

    pub fn counts(prices: impl IntoIterator<Item = f64>) -> Vec<BandCount> {
        let mut counts = [0u64; 4];
        for p in prices {
            if let Some(band) = Self::classify(p) {
                counts[band as usize] += 1;
            }
        }
        Self::ALL
            .iter()
            .map(|b| BandCount {
                label: b.label().to_string(),
                count: counts[*b as usize],
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RatingBand {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl RatingBand {
    pub const ALL: [RatingBand; 4] = [
        RatingBand::Poor,
        RatingBand::Fair,
        RatingBand::Good,
        RatingBand::Excellent,
    ];

    /// Bands over `(0, 2]`, `(2, 3]`, `(3, 4]`, `(4, 5]`.
    pub fn classify(rating: f64) -> Option<Self> {
        if !(rating > 0.0) || rating > 5.0 {
            None
        } else if rating <= 2.0 {
            Some(RatingBand::Poor)
        } else if rating <= 3.0 {
            Some(RatingBand::Fair)
        } else if rating <= 4.0 {
            Some(RatingBand::Good)
        } else {
            Some(RatingBand::Excellent)
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RatingBand::Poor => "Poor (0-2)",
            RatingBand::Fair => "Fair (2-3)",
            RatingBand::Good => "Good (3-4)",
            RatingBand::Excellent => "Excellent (4-5)",
        }
    }

    pub fn counts(ratings: impl IntoIterator<Item = f64>) -> Vec<BandCount> {
        let mut counts = [0u64; 4];
        for r in ratings {
            if let Some(band) = Self::classify(r) {
                counts[band as usize] += 1;
            }
        }
        Self::ALL
            .iter()
            .map(|b| BandCount {
                label: b.label().to_string(),
                count: counts[*b as usize],
            })
            .collect()
    }
}

/// Bin count used by the price distribution chart.
pub const HISTOGRAM_BINS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    #[ts(type = "number")]
    pub count: u64,
}

/// Equal-width histogram over `[min, max]`; the last bin is closed on both
/// sides. A constant series is spread over `[v - 0.5, v + 0.5]`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() || bins == 0 {
        return Vec::new();
    }
    let mut lo = finite.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut counts = vec![0u64; bins];
    for v in &finite {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + width * i as f64,
            upper: lo + width * (i + 1) as f64,
            count,
        })
        .collect()
}
