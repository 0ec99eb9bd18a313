use serde::{Deserialize, Serialize};

use super::{PayaraServerInstance, ServerInstance};

/// One element of the `servers.json` array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRecord {
    pub name: String,
    pub path: String,
    pub domain_name: String,
}

impl ServerRecord {
    /// Snapshot a descriptor's accessor values.
    pub fn from_instance<S: ServerInstance + ?Sized>(instance: &S) -> Self {
        Self {
            name: instance.name().to_string(),
            path: instance.path().to_string_lossy().into_owned(),
            domain_name: instance.domain_name().to_string(),
        }
    }
}

impl From<ServerRecord> for PayaraServerInstance {
    fn from(r: ServerRecord) -> Self {
        PayaraServerInstance::new(r.name, r.path, r.domain_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uses_camel_case_domain_name_key() {
        let inst = PayaraServerInstance::new("srv1", "/opt/p1", "domain1");
        let json = serde_json::to_string(&ServerRecord::from_instance(&inst)).unwrap();
        assert_eq!(
            json,
            r#"{"name":"srv1","path":"/opt/p1","domainName":"domain1"}"#
        );
    }

    #[test]
    fn record_converts_back_to_instance() {
        let rec: ServerRecord =
            serde_json::from_str(r#"{"name":"a","path":"/x","domainName":"d"}"#).unwrap();
        let inst = PayaraServerInstance::from(rec);
        assert_eq!(inst.name(), "a");
        assert_eq!(inst.path(), std::path::Path::new("/x"));
        assert_eq!(inst.domain_name(), "d");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_path_is_replaced_lossily() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = std::path::PathBuf::from(OsStr::from_bytes(b"/opt/\xffp"));
        let inst = PayaraServerInstance::new("srv1", path, "domain1");
        let rec = ServerRecord::from_instance(&inst);
        assert_eq!(rec.path, "/opt/\u{fffd}p");
    }
}
