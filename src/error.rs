use crate::{addr_space::Location, store::StoreError};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Address {:06X} not mapped", .0.address)]
    NotMapped(Location),
    #[error("no function contains {0}")]
    NoFunction(Location),
    #[error("no edit in progress")]
    NoEdit,
    #[error("failed to access `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML in `{}`: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("failed to write TOML: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

pub(crate) fn read_toml<T: serde::de::DeserializeOwned>(path: &std::path::Path) -> Result<T> {
    let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_owned(),
        source,
    })?;
    toml::from_str(&text).map_err(|source| Error::Parse {
        path: path.to_owned(),
        source,
    })
}
