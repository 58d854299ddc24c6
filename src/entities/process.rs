//! Process catalog rows - manufacturing process rates

use serde::{Deserialize, Serialize};

/// Run time used when the catalog does not carry a `run_time_mins` value
pub const DEFAULT_RUN_TIME_MINUTES: f64 = 60.0;

/// Process category as published in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ProcessCategory {
    Cutting,
    Machining,
    Fabrication,
    Finishing,
    /// Any other catalog value, kept verbatim
    Other(String),
}

impl ProcessCategory {
    /// Map a catalog cell to a category; unknown values are preserved
    pub fn from_catalog(value: &str) -> Self {
        value
            .parse()
            .unwrap_or_else(|_| ProcessCategory::Other(value.trim().to_string()))
    }
}

impl From<String> for ProcessCategory {
    fn from(value: String) -> Self {
        ProcessCategory::from_catalog(&value)
    }
}

impl From<ProcessCategory> for String {
    fn from(value: ProcessCategory) -> Self {
        value.to_string()
    }
}

impl std::fmt::Display for ProcessCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessCategory::Cutting => write!(f, "Cutting"),
            ProcessCategory::Machining => write!(f, "Machining"),
            ProcessCategory::Fabrication => write!(f, "Fabrication"),
            ProcessCategory::Finishing => write!(f, "Finishing"),
            ProcessCategory::Other(s) => write!(f, "{}", s),
        }
    }
}

impl std::str::FromStr for ProcessCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cutting" => Ok(ProcessCategory::Cutting),
            "machining" => Ok(ProcessCategory::Machining),
            "fabrication" => Ok(ProcessCategory::Fabrication),
            "finishing" => Ok(ProcessCategory::Finishing),
            _ => Err(format!(
                "Invalid process category: {}. Use cutting, machining, fabrication, or finishing",
                s
            )),
        }
    }
}

/// One row of the processes catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRate {
    /// Display name, also the override key for this process
    pub name: String,

    pub category: ProcessCategory,

    /// Setup time charged once per batch
    pub setup_time_minutes: f64,

    /// Machine/labor rate in $/hr
    pub hourly_rate: f64,

    /// Run time per part, [`DEFAULT_RUN_TIME_MINUTES`] when not published
    #[serde(default = "default_run_time")]
    pub run_time_minutes: f64,
}

fn default_run_time() -> f64 {
    DEFAULT_RUN_TIME_MINUTES
}

impl ProcessRate {
    pub fn new(
        name: impl Into<String>,
        category: ProcessCategory,
        setup_time_minutes: f64,
        hourly_rate: f64,
        run_time_minutes: Option<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            setup_time_minutes,
            hourly_rate,
            run_time_minutes: run_time_minutes.unwrap_or(DEFAULT_RUN_TIME_MINUTES),
        }
    }

    /// The catalog tuple consumed by the cost engine
    pub fn rates(&self) -> (f64, f64, f64) {
        (self.setup_time_minutes, self.hourly_rate, self.run_time_minutes)
    }
}
