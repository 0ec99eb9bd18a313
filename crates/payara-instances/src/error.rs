use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid server config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize server config: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialize_error_converts_from_serde_json() {
        let raw = serde_json::from_str::<u32>("x").unwrap_err();
        let err = RegistryError::from(raw);
        assert!(matches!(err, RegistryError::Serialize { .. }));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().starts_with("failed to serialize server config:"));
    }
}
