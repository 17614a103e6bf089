// crates/core/src/lib.rs
pub mod analyst;
pub mod buckets;
pub mod chat;
pub mod filters;
pub mod pages;
pub mod reports;
pub mod segments;
pub mod stats;
pub mod table;

pub use filters::{BindValue, Choice, Column, DateRange, FilterError, FilterSet, MultiSelect, Predicate};
pub use pages::{Page, PageInfo};
pub use reports::{Comparison, Section};
pub use segments::{CustomerSegment, PricePosition, ProductQuadrant};
pub use table::Table;
