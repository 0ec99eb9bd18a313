//! Background writes of `servers.json`.
//!
//! Each write carries the sequence number it was issued with. Writes may land
//! out of order on a multi-threaded runtime, so the writer remembers the newest
//! sequence it has written and drops anything older. Completion is published on
//! a `watch` channel that [`PendingWrite`] waits on.

use std::ffi::OsString;
use std::future::{Future, IntoFuture};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{Mutex, watch};

use crate::error::{RegistryError, Result};
use crate::model::ServerRecord;

pub(crate) struct ConfigWriter {
    path: PathBuf,
    issued: AtomicU64,
    last_written: Mutex<u64>,
    settled: watch::Sender<u64>,
}

impl ConfigWriter {
    pub(crate) fn new(path: PathBuf) -> Self {
        let (settled, _) = watch::channel(0);
        Self {
            path,
            issued: AtomicU64::new(0),
            last_written: Mutex::new(0),
            settled,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Start writing `records`. Runs on the current tokio runtime if there is
    /// one, otherwise writes inline before returning.
    pub(crate) fn submit(self: &Arc<Self>, records: Vec<ServerRecord>) -> PendingWrite {
        let seq = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let writer = Arc::clone(self);
                handle.spawn(async move { writer.write_async(seq, records).await });
            }
            Err(_) => {
                tracing::debug!("no tokio runtime; writing {} inline", self.path.display());
                self.write_blocking(seq, &records);
            }
        }
        self.pending(seq)
    }

    /// Handle for the newest write issued so far.
    pub(crate) fn flush(&self) -> PendingWrite {
        self.pending(self.issued.load(Ordering::SeqCst))
    }

    fn pending(&self, seq: u64) -> PendingWrite {
        PendingWrite {
            seq,
            settled: self.settled.subscribe(),
        }
    }

    async fn write_async(&self, seq: u64, records: Vec<ServerRecord>) {
        let mut last = self.last_written.lock().await;
        if seq > *last {
            let res = write_records(&self.path, &records).await;
            self.log_outcome(seq, records.len(), res);
            *last = seq;
        } else {
            tracing::debug!("skipping stale server config snapshot #{} (#{} written)", seq, *last);
        }
        drop(last);
        self.settle(seq);
    }

    fn write_blocking(&self, seq: u64, records: &[ServerRecord]) {
        let mut last = self.last_written.blocking_lock();
        if seq > *last {
            let res = write_records_blocking(&self.path, records);
            self.log_outcome(seq, records.len(), res);
            *last = seq;
        }
        drop(last);
        self.settle(seq);
    }

    fn log_outcome(&self, seq: u64, count: usize, res: Result<()>) {
        match res {
            Ok(()) => tracing::debug!(
                "wrote {} server(s) to {} (#{})",
                count,
                self.path.display(),
                seq
            ),
            Err(e) => tracing::error!("failed to persist server config: {}", e),
        }
    }

    fn settle(&self, seq: u64) {
        self.settled.send_modify(|s| {
            if seq > *s {
                *s = seq;
            }
        });
    }
}

/// Completion of a background write of `servers.json`.
///
/// Resolves once a write at least as new as this one has finished, whether it
/// succeeded or failed (failures are only logged). Dropping it does not cancel
/// the write.
#[derive(Debug)]
pub struct PendingWrite {
    seq: u64,
    settled: watch::Receiver<u64>,
}

impl PendingWrite {
    pub fn is_settled(&self) -> bool {
        *self.settled.borrow() >= self.seq
    }

    pub async fn wait(mut self) {
        let seq = self.seq;
        if self.settled.wait_for(|s| *s >= seq).await.is_err() {
            tracing::debug!("server config writer dropped before write #{} settled", seq);
        }
    }
}

impl IntoFuture for PendingWrite {
    type Output = ();
    type IntoFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}

/// Read and parse the registry file.
pub fn read_records(path: &Path) -> Result<Vec<ServerRecord>> {
    let data = std::fs::read(path).map_err(|source| RegistryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&data).map_err(|source| RegistryError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut s = OsString::from(path.as_os_str());
    s.push(".tmp");
    PathBuf::from(s)
}

fn write_err(path: &Path) -> impl FnOnce(std::io::Error) -> RegistryError + '_ {
    move |source| RegistryError::Write {
        path: path.to_path_buf(),
        source,
    }
}

// Written to a sibling file and renamed so readers never see a partial document.
async fn write_records(path: &Path, records: &[ServerRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir).await.map_err(write_err(dir))?;
    }
    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, json).await.map_err(write_err(&tmp))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(write_err(path)(e));
    }
    Ok(())
}

fn write_records_blocking(path: &Path, records: &[ServerRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(write_err(dir))?;
    }
    let tmp = tmp_path(path);
    std::fs::write(&tmp, json).map_err(write_err(&tmp))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(write_err(path)(e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str) -> ServerRecord {
        ServerRecord {
            name: name.into(),
            path: format!("/opt/{name}"),
            domain_name: "domain1".into(),
        }
    }

    #[tokio::test]
    async fn stale_snapshot_does_not_overwrite_newer() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ConfigWriter::new(dir.path().join("servers.json"));

        writer.write_async(2, vec![rec("new")]).await;
        writer.write_async(1, vec![rec("old")]).await;

        let got = read_records(writer.path()).unwrap();
        assert_eq!(got, vec![rec("new")]);
    }

    #[tokio::test]
    async fn pending_write_settles_after_newer_write() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Arc::new(ConfigWriter::new(dir.path().join("a/b/servers.json")));

        let first = writer.submit(vec![rec("one")]);
        let second = writer.submit(vec![rec("one"), rec("two")]);
        second.await;
        assert!(first.is_settled());

        let got = read_records(writer.path()).unwrap();
        assert_eq!(got, vec![rec("one"), rec("two")]);
        assert!(!tmp_path(writer.path()).exists());
    }

    #[tokio::test]
    async fn flush_with_nothing_issued_is_settled() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ConfigWriter::new(dir.path().join("servers.json"));
        let pending = writer.flush();
        assert!(pending.is_settled());
        pending.await;
        assert!(!writer.path().exists());
    }

    #[test]
    fn writes_inline_without_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let writer = Arc::new(ConfigWriter::new(dir.path().join("servers.json")));
        let pending = writer.submit(vec![rec("srv1")]);
        assert!(pending.is_settled());
        assert_eq!(read_records(writer.path()).unwrap(), vec![rec("srv1")]);
    }

    #[test]
    fn pretty_prints_with_two_space_indent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servers.json");
        write_records_blocking(&path, &[rec("srv1")]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n  {\n    \"name\": \"srv1\""));
    }

    #[test]
    fn read_reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servers.json");
        assert!(matches!(
            read_records(&path),
            Err(RegistryError::Read { .. })
        ));

        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            read_records(&path),
            Err(RegistryError::Parse { .. })
        ));
    }
}
