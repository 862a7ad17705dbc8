use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Rendered addresses kept by the decode cache.
    pub cache_capacity: usize,
    /// Items requested per page.
    pub page_size: usize,
    /// Column at which an instruction is placed next to its annotation.
    pub spacing: usize,
    /// Bytes per `DB` line before a data span wraps.
    pub data_columns: usize,
    pub diagnostics: Diagnostics,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_capacity: 100,
            page_size: 40,
            spacing: 22,
            data_columns: 16,
            diagnostics: Diagnostics::default(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        crate::error::read_toml(path.as_ref())
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|source| Error::Parse {
            path: "<inline>".into(),
            source,
        })
    }
}

/// Soft limits after which page builds are reported.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Diagnostics {
    pub page_trip_ms: u64,
    pub data_page_trip_ms: u64,
    pub query_trip_ms: u64,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self {
            page_trip_ms: 300,
            data_page_trip_ms: 200,
            query_trip_ms: 100,
        }
    }
}

impl Diagnostics {
    pub fn page_trip(&self) -> Duration {
        Duration::from_millis(self.page_trip_ms)
    }

    pub fn data_page_trip(&self) -> Duration {
        Duration::from_millis(self.data_page_trip_ms)
    }

    pub fn query_trip(&self) -> Duration {
        Duration::from_millis(self.query_trip_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn partial_override() {
        let config = Config::from_toml(
            "page_size = 10\n\
             [diagnostics]\n\
             query_trip_ms = 5\n",
        )
        .unwrap();
        assert_eq!(config.page_size, 10);
        assert_eq!(config.cache_capacity, 100);
        assert_eq!(config.diagnostics.query_trip(), Duration::from_millis(5));
        assert_eq!(config.diagnostics.page_trip_ms, 300);
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(matches!(
            Config::from_toml("page_size = \"many\""),
            Err(Error::Parse { .. })
        ));
    }
}
