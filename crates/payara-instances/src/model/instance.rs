//! Host-facing server instance descriptors.

use std::path::{Path, PathBuf};

/// Read accessors the registry needs from a host-supplied descriptor.
///
/// Identity is by [`name`](ServerInstance::name); the registry never looks at
/// `path` or `domain_name` beyond copying them into the persisted record.
pub trait ServerInstance: Send + Sync {
    fn name(&self) -> &str;
    /// Stored in `servers.json` as a UTF-8 string; bytes that are not valid
    /// UTF-8 are replaced with U+FFFD, so such paths do not survive a reload.
    fn path(&self) -> &Path;
    fn domain_name(&self) -> &str;
}

/// A Payara Server installation with its active domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayaraServerInstance {
    name: String,
    path: PathBuf,
    domain_name: String,
}

impl PayaraServerInstance {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        domain_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            domain_name: domain_name.into(),
        }
    }
}

impl ServerInstance for PayaraServerInstance {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn domain_name(&self) -> &str {
        &self.domain_name
    }
}
