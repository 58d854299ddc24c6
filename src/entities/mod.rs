//! Entity type definitions
//!
//! **Catalog rows:**
//! - [`MaterialRate`] - density and cost per unit mass of a material
//! - [`ProcessRate`] - setup time, run time and hourly rate of a process
//!
//! **Quoting:**
//! - [`PartConfig`] - material and process selections for one part
//! - [`PartCostResult`] - ordered cost breakdown and totals
//! - [`QuoteSession`] - the parts of one quote, loaded from YAML

pub mod breakdown;
pub mod material;
pub mod part;
pub mod process;
pub mod session;

pub use breakdown::{CostLineItem, PartCostResult, RateUnit};
pub use material::MaterialRate;
pub use part::{PartConfig, ProcessFlag};
pub use process::{ProcessCategory, ProcessRate};
pub use session::{PartEntry, QuoteSession, SessionError};
