//! Catalog transport - where the CSV tables come from

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use super::CatalogTable;

/// Why a single fetch attempt failed
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("cannot read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("required column '{column}' not found")]
    MissingColumn { column: &'static str },

    #[error("no endpoint configured for the {0} catalog")]
    NotConfigured(CatalogTable),
}

/// Something that can produce the raw CSV text of a catalog table
pub trait CatalogSource {
    fn fetch(&self, table: CatalogTable) -> Result<String, FetchError>;
}

impl<S: CatalogSource + ?Sized> CatalogSource for Box<S> {
    fn fetch(&self, table: CatalogTable) -> Result<String, FetchError> {
        (**self).fetch(table)
    }
}

/// Production source: one address per table
///
/// `http://` and `https://` addresses are fetched with a blocking HTTP
/// client. Anything else is a local file path, optionally written as a
/// `file://` URL.
pub struct EndpointSource {
    materials: Option<String>,
    processes: Option<String>,
    client: reqwest::blocking::Client,
}

impl EndpointSource {
    pub fn new(
        materials: Option<String>,
        processes: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, FetchError> {
        let mut builder = reqwest::blocking::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            materials,
            processes,
            client: builder.build()?,
        })
    }

    fn endpoint(&self, table: CatalogTable) -> Option<&str> {
        match table {
            CatalogTable::Materials => self.materials.as_deref(),
            CatalogTable::Processes => self.processes.as_deref(),
        }
    }

    fn fetch_http(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send()?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response.text()?)
    }
}

impl CatalogSource for EndpointSource {
    fn fetch(&self, table: CatalogTable) -> Result<String, FetchError> {
        let endpoint = self
            .endpoint(table)
            .ok_or(FetchError::NotConfigured(table))?;

        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return self.fetch_http(endpoint);
        }

        let path = PathBuf::from(endpoint.strip_prefix("file://").unwrap_or(endpoint));
        std::fs::read_to_string(&path).map_err(|source| FetchError::Io { path, source })
    }
}

impl std::fmt::Debug for EndpointSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointSource")
            .field("materials", &self.materials)
            .field("processes", &self.processes)
            .finish()
    }
}
