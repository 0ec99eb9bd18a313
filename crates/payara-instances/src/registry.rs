//! In-memory registry of server instances mirrored to `servers.json`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::Result;
use crate::model::{PayaraServerInstance, ServerInstance, ServerRecord};
use crate::persist::{ConfigWriter, PendingWrite, read_records};
use crate::storage::servers_config_path;

/// Ordered set of server instances, unique by name.
///
/// Every mutation starts a background write of the whole list. The returned
/// [`PendingWrite`] can be awaited when the caller needs the file to be up to
/// date; write failures are logged and never returned.
pub struct InstanceRegistry<S = PayaraServerInstance> {
    servers: Vec<Arc<S>>,
    writer: Arc<ConfigWriter>,
}

impl<S: ServerInstance> InstanceRegistry<S> {
    /// Empty registry persisting under the host storage dir, or the temp
    /// fallback when the host has none.
    pub fn new(storage_dir: Option<&Path>) -> Self {
        Self::with_config_path(servers_config_path(storage_dir))
    }

    pub fn with_config_path(path: impl Into<PathBuf>) -> Self {
        Self {
            servers: Vec::new(),
            writer: Arc::new(ConfigWriter::new(path.into())),
        }
    }

    pub fn config_path(&self) -> &Path {
        self.writer.path()
    }

    pub fn servers(&self) -> &[Arc<S>] {
        &self.servers
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Exact, case-sensitive lookup.
    pub fn server_by_name(&self, name: &str) -> Option<Arc<S>> {
        self.servers.iter().find(|s| s.name() == name).cloned()
    }

    /// Add `instance`, replacing any entry with the same name. The new entry
    /// always ends up last.
    pub fn add_server(&mut self, instance: Arc<S>) -> PendingWrite {
        tracing::debug!("adding server '{}'", instance.name());
        self.insert(instance);
        self.update_server_config()
    }

    /// Remove the entry named like `instance`. Returns false, without writing,
    /// when no such entry exists. The write started on removal is reached
    /// through [`flush`](Self::flush).
    pub fn remove_server(&mut self, instance: &S) -> bool {
        if self.remove_by_name(instance.name()) {
            tracing::debug!("removed server '{}'", instance.name());
            let _ = self.update_server_config();
            true
        } else {
            tracing::debug!("remove: no server named '{}'", instance.name());
            false
        }
    }

    /// Write the current list to disk in the background.
    pub fn update_server_config(&self) -> PendingWrite {
        let records = self
            .servers
            .iter()
            .map(|s| ServerRecord::from_instance(s.as_ref()))
            .collect();
        self.writer.submit(records)
    }

    /// Completion of the most recent write issued by this registry.
    pub fn flush(&self) -> PendingWrite {
        self.writer.flush()
    }

    /// Read the persisted file as it is on disk right now.
    pub fn read_server_config(&self) -> Result<Vec<ServerRecord>> {
        read_records(self.config_path())
    }

    fn insert(&mut self, instance: Arc<S>) {
        self.remove_by_name(instance.name());
        self.servers.push(instance);
    }

    fn remove_by_name(&mut self, name: &str) -> bool {
        match self.servers.iter().position(|s| s.name() == name) {
            Some(idx) => {
                self.servers.remove(idx);
                true
            }
            None => false,
        }
    }
}

impl InstanceRegistry<PayaraServerInstance> {
    /// Registry restored from a previous session's file. A missing file gives
    /// an empty registry; an unreadable or malformed one is an error.
    pub fn load(storage_dir: Option<&Path>) -> Result<Self> {
        Self::load_from(servers_config_path(storage_dir))
    }

    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let mut registry = Self::with_config_path(path);
        if !registry.config_path().exists() {
            tracing::info!(
                "no server config at {}; starting empty",
                registry.config_path().display()
            );
            return Ok(registry);
        }
        for record in registry.read_server_config()? {
            registry.insert(Arc::new(record.into()));
        }
        tracing::info!(
            "loaded {} server(s) from {}",
            registry.len(),
            registry.config_path().display()
        );
        Ok(registry)
    }
}
