//! Core module - the cost estimation engine and its supporting pieces

pub mod catalog;
pub mod clock;
pub mod config;
pub mod engine;
pub mod export;
pub mod overrides;
pub mod project;
pub mod rates;
pub mod units;

pub use catalog::{
    CatalogCache, CatalogError, CatalogProvider, CatalogSnapshot, CatalogSource, CatalogTable,
    EndpointSource, FetchError, TableStatus,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use engine::{CostEngine, EngineError, RateKind, UnresolvedPolicy};
pub use export::{flatten, ExportRow, FlatTable, FlatValue};
pub use overrides::{LineItemOverride, OverrideError, OverrideField, OverrideStore, PartOverrides};
pub use project::{Project, ProjectError};
pub use rates::RateResolver;
pub use units::UnitSystem;
