// crates/core/src/pages.rs
//! Dashboard navigation: the page set, their slugs and theme tokens.

use serde::Serialize;
use std::str::FromStr;
use ts_rs::TS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub enum Page {
    #[default]
    Sales,
    Products,
    Benchmarking,
    Customers,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../../../src/types/generated/")]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: Page,
    pub slug: String,
    pub title: String,
    pub icon: String,
    pub theme: Theme,
}

impl Page {
    /// Navigation order.
    pub const ALL: [Page; 5] = [
        Page::Sales,
        Page::Products,
        Page::Benchmarking,
        Page::Customers,
        Page::Assistant,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Page::Sales => "sales",
            Page::Products => "products",
            Page::Benchmarking => "benchmarking",
            Page::Customers => "customers",
            Page::Assistant => "assistant",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Sales => "Sales Performance",
            Page::Products => "Product Analytics",
            Page::Benchmarking => "Benchmarking & Insights",
            Page::Customers => "Customer Insights",
            Page::Assistant => "AI Assistant",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Page::Sales => "graph-up-arrow",
            Page::Products => "box-seam",
            Page::Benchmarking => "bar-chart-line",
            Page::Customers => "people",
            Page::Assistant => "robot",
        }
    }

    /// (primary, secondary, accent) colour tokens.
    fn colors(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Page::Sales => ("#10b981", "#059669", "#86efac"),
            Page::Products => ("#3b82f6", "#2563eb", "#93c5fd"),
            // Customer insights share the benchmarking palette.
            Page::Benchmarking | Page::Customers => ("#8b5cf6", "#7c3aed", "#c4b5fd"),
            Page::Assistant => ("#f59e0b", "#d97706", "#fcd34d"),
        }
    }

    pub fn info(self) -> PageInfo {
        let (primary, secondary, accent) = self.colors();
        PageInfo {
            page: self,
            slug: self.slug().to_string(),
            title: self.title().to_string(),
            icon: self.icon().to_string(),
            theme: Theme {
                primary: primary.to_string(),
                secondary: secondary.to_string(),
                accent: accent.to_string(),
            },
        }
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Page::ALL
            .into_iter()
            .find(|p| p.slug().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown page: {s}"))
    }
}
