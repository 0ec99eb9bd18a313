//! Registry of configured Payara server instances, persisted as JSON.
//!
//! The host owns one [`InstanceRegistry`] per session. Mutations update the
//! in-memory list immediately and hand back a [`PendingWrite`] for the
//! background write of `servers.json`.

pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod persist;
pub mod registry;
pub mod storage;

pub use error::RegistryError;
pub use model::{PayaraServerInstance, ServerInstance, ServerRecord};
pub use persist::PendingWrite;
pub use registry::InstanceRegistry;
pub use storage::servers_config_path;
