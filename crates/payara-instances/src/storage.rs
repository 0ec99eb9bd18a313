//! Resolve where `servers.json` lives.

use std::path::{Path, PathBuf};

/// File name of the persisted registry.
pub const SERVERS_FILE: &str = "servers.json";

/// Directory under the system temp dir used when the host has no storage.
pub const FALLBACK_DIR: &str = "payara_vscode";

/// Path of the registry file for an optional host storage directory.
///
/// Does not touch the filesystem; the writer creates missing directories.
pub fn servers_config_path(storage_dir: Option<&Path>) -> PathBuf {
    let dir = match storage_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::temp_dir().join(FALLBACK_DIR),
    };
    dir.join(SERVERS_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_host_storage_dir() {
        let p = servers_config_path(Some(Path::new("/var/lib/host/ws1")));
        assert_eq!(p, PathBuf::from("/var/lib/host/ws1/servers.json"));
    }

    #[test]
    fn falls_back_to_temp_dir() {
        let p = servers_config_path(None);
        assert_eq!(
            p,
            std::env::temp_dir().join("payara_vscode").join("servers.json")
        );
    }
}
