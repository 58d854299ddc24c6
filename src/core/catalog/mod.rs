//! Catalog cache - time-bounded snapshots of the materials and processes tables
//!
//! Each table is cached independently as an immutable [`CatalogSnapshot`]
//! with the time it was fetched. A snapshot younger than the freshness window
//! is served as-is. An older one triggers a fetch; when that fetch fails the
//! old snapshot is served anyway ("stale-serve"), and only a table that has
//! never been fetched successfully reports [`CatalogError::Unavailable`].
//!
//! The cache uses `RefCell` internally and is not `Sync`: one cache belongs
//! to one session.

mod parse;
mod source;

pub use parse::{parse_materials, parse_processes};
pub use source::{CatalogSource, EndpointSource, FetchError};

use chrono::{DateTime, Duration, Utc};
use miette::Diagnostic;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

use crate::core::clock::{Clock, SystemClock};
use crate::entities::material::MaterialRate;
use crate::entities::process::ProcessRate;

/// Default freshness window
pub const DEFAULT_REFRESH_MINUTES: u64 = 15;

/// Largest window chrono can represent
const MAX_REFRESH_MINUTES: i64 = i64::MAX / 60_000;

/// The two catalog tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogTable {
    Materials,
    Processes,
}

impl std::fmt::Display for CatalogTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogTable::Materials => write!(f, "materials"),
            CatalogTable::Processes => write!(f, "processes"),
        }
    }
}

/// Catalog access errors surfaced to callers
#[derive(Debug, Error, Diagnostic)]
pub enum CatalogError {
    #[error("{table} catalog unavailable: {source}")]
    #[diagnostic(
        code(qf::catalog::unavailable),
        help("Check the catalog endpoints with `qf config show`; no cached copy exists to fall back on")
    )]
    Unavailable {
        table: CatalogTable,
        #[source]
        source: FetchError,
    },
}

/// An immutable copy of one catalog table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CatalogSnapshot<T> {
    pub rows: Vec<T>,
    pub fetched_at: DateTime<Utc>,
}

impl<T> CatalogSnapshot<T> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.rows.iter()
    }
}

/// Cache state of one table, for reporting
#[derive(Debug, Clone, Serialize)]
pub struct TableStatus {
    pub table: CatalogTable,
    pub rows: Option<usize>,
    pub fetched_at: Option<DateTime<Utc>>,
    pub fresh: bool,
}

/// Read access to the current catalog tables
pub trait CatalogProvider {
    fn get_materials(&self) -> Result<Rc<CatalogSnapshot<MaterialRate>>, CatalogError>;
    fn get_processes(&self) -> Result<Rc<CatalogSnapshot<ProcessRate>>, CatalogError>;
}

type Slot<T> = RefCell<Option<Rc<CatalogSnapshot<T>>>>;

/// Time-cached catalog with stale-serve fallback
pub struct CatalogCache<S, C = SystemClock> {
    source: S,
    clock: C,
    freshness: Duration,
    materials: Slot<MaterialRate>,
    processes: Slot<ProcessRate>,
}

impl<S: CatalogSource> CatalogCache<S, SystemClock> {
    pub fn new(source: S, refresh_minutes: u64) -> Self {
        Self::with_clock(source, SystemClock, refresh_minutes)
    }
}

impl<S: CatalogSource, C: Clock> CatalogCache<S, C> {
    pub fn with_clock(source: S, clock: C, refresh_minutes: u64) -> Self {
        Self {
            source,
            clock,
            freshness: Duration::minutes(
                i64::try_from(refresh_minutes)
                    .unwrap_or(i64::MAX)
                    .min(MAX_REFRESH_MINUTES),
            ),
            materials: RefCell::new(None),
            processes: RefCell::new(None),
        }
    }

    pub fn freshness(&self) -> Duration {
        self.freshness
    }

    /// Cache state for both tables
    pub fn status(&self) -> Vec<TableStatus> {
        vec![
            self.slot_status(CatalogTable::Materials, &self.materials),
            self.slot_status(CatalogTable::Processes, &self.processes),
        ]
    }

    fn slot_status<T>(&self, table: CatalogTable, slot: &Slot<T>) -> TableStatus {
        let now = self.clock.now();
        match slot.borrow().as_ref() {
            Some(snapshot) => TableStatus {
                table,
                rows: Some(snapshot.len()),
                fetched_at: Some(snapshot.fetched_at),
                fresh: now - snapshot.fetched_at < self.freshness,
            },
            None => TableStatus {
                table,
                rows: None,
                fetched_at: None,
                fresh: false,
            },
        }
    }

    fn get_table<T>(
        &self,
        table: CatalogTable,
        slot: &Slot<T>,
        parse: fn(&str) -> Result<Vec<T>, FetchError>,
    ) -> Result<Rc<CatalogSnapshot<T>>, CatalogError> {
        let now = self.clock.now();

        if let Some(cached) = slot.borrow().as_ref() {
            let age = now - cached.fetched_at;
            if age < self.freshness {
                tracing::debug!(%table, age_secs = age.num_seconds(), "using cached catalog");
                return Ok(Rc::clone(cached));
            }
        }

        tracing::info!(%table, "fetching catalog");
        let fetched = self
            .source
            .fetch(table)
            .and_then(|text| parse(&text));

        match fetched {
            Ok(rows) => {
                tracing::info!(%table, rows = rows.len(), "catalog loaded");
                let snapshot = Rc::new(CatalogSnapshot {
                    rows,
                    fetched_at: now,
                });
                *slot.borrow_mut() = Some(Rc::clone(&snapshot));
                Ok(snapshot)
            }
            Err(err) => match slot.borrow().as_ref() {
                Some(stale) => {
                    tracing::warn!(
                        %table,
                        error = %err,
                        age_secs = (now - stale.fetched_at).num_seconds(),
                        "catalog fetch failed, serving stale copy"
                    );
                    Ok(Rc::clone(stale))
                }
                None => {
                    tracing::error!(%table, error = %err, "catalog fetch failed with no cached copy");
                    Err(CatalogError::Unavailable { table, source: err })
                }
            },
        }
    }
}

impl<S: CatalogSource, C: Clock> CatalogProvider for CatalogCache<S, C> {
    fn get_materials(&self) -> Result<Rc<CatalogSnapshot<MaterialRate>>, CatalogError> {
        self.get_table(CatalogTable::Materials, &self.materials, parse_materials)
    }

    fn get_processes(&self) -> Result<Rc<CatalogSnapshot<ProcessRate>>, CatalogError> {
        self.get_table(CatalogTable::Processes, &self.processes, parse_processes)
    }
}
