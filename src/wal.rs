//! The write-ahead log: an append-only, newline-delimited-JSON journal of
//! logical SET/DELETE operations, replayed on startup to reconstruct
//! mutations not yet folded into a snapshot.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::tree::Tree;
use crate::value::Value;

/// One logical mutation as it appears on disk: a single line of UTF-8 JSON
/// terminated by `\n`. `value` is carried as a raw [`serde_json::Value`]
/// rather than our typed [`Value`] so that a malformed or unsupported
/// literal (e.g. `null`, an array) still parses as *JSON* — it is rejected
/// at replay time with `invalid-format` when [`Tree::set_internal`] applies
/// type inference, not at the WAL's own parsing layer.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "op")]
enum Record {
    #[serde(rename = "SET")]
    Set {
        path: String,
        value: serde_json::Value,
        ts: i64,
    },
    #[serde(rename = "DELETE")]
    Delete { path: String, ts: i64 },
}

/// An append-only log of SET/DELETE records, one per line.
pub struct Wal {
    path: PathBuf,
}

impl Wal {
    /// Open (creating if absent) the WAL file at `path`, creating its parent
    /// directory on demand.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| Error::io(&path, e))?;
            }
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| Error::io(&path, e))?;
        Ok(Wal { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a SET record, then flush and fsync before returning — the
    /// durability contract every `before_set` call relies on.
    pub fn log_set(&self, path: &str, value: &Value) -> Result<(), Error> {
        self.append(&Record::Set {
            path: path.to_string(),
            value: value.clone().into(),
            ts: now_unix_seconds(),
        })
    }

    /// Append a DELETE record, with the same durability contract.
    pub fn log_delete(&self, path: &str) -> Result<(), Error> {
        self.append(&Record::Delete {
            path: path.to_string(),
            ts: now_unix_seconds(),
        })
    }

    fn append(&self, record: &Record) -> Result<(), Error> {
        let line = serde_json::to_string(record).map_err(|e| Error::InvalidFormat {
            reason: format!("failed to encode WAL record: {e}"),
        })?;

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::io(&self.path, e))?;
        file.write_all(line.as_bytes()).map_err(|e| Error::io(&self.path, e))?;
        file.write_all(b"\n").map_err(|e| Error::io(&self.path, e))?;
        file.flush().map_err(|e| Error::io(&self.path, e))?;
        file.sync_data().map_err(|e| Error::io(&self.path, e))?;

        log::trace!("wal: appended record to {}", self.path.display());
        Ok(())
    }

    /// Replay every record in file order against `tree`, strictly
    /// sequentially, via `Tree`'s internal (non-logging) entry points.
    /// Blank lines are skipped; an unrecognized `op` fails with
    /// `invalid-format`.
    pub fn replay(&self, tree: &mut Tree) -> Result<(), Error> {
        let file = File::open(&self.path).map_err(|e| Error::io(&self.path, e))?;
        let reader = BufReader::new(file);

        let mut applied = 0usize;
        for line in reader.lines() {
            let line = line.map_err(|e| Error::io(&self.path, e))?;
            if line.trim().is_empty() {
                continue;
            }

            let record: Record = serde_json::from_str(&line).map_err(|e| Error::InvalidFormat {
                reason: format!("malformed WAL record: {e}"),
            })?;

            match record {
                Record::Set { path, value, .. } => {
                    let value = Value::try_from(value)?;
                    tree.set_internal(&path, value)?;
                }
                Record::Delete { path, .. } => {
                    tree.delete_internal(&path)?;
                }
            }
            applied += 1;
        }

        log::debug!("wal: replayed {applied} record(s) from {}", self.path.display());
        Ok(())
    }

    /// Truncate the log to zero bytes. Only ever called by the runtime at
    /// checkpoint time.
    pub fn clear(&self) -> Result<(), Error> {
        File::create(&self.path).map_err(|e| Error::io(&self.path, e))?;
        log::debug!("wal: cleared {}", self.path.display());
        Ok(())
    }
}

fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_replay() {
        let dir = tempfile::tempdir().unwrap();
        let wal = Wal::new(dir.path().join("state.wal")).unwrap();

        wal.log_set("app.ui.theme", &Value::Str("dark".into())).unwrap();
        wal.log_set("app.ui.fontSize", &Value::Int(14)).unwrap();

        let mut tree = Tree::new();
        wal.replay(&mut tree).unwrap();

        assert_eq!(tree.get("app.ui.theme").unwrap(), serde_json::json!("dark"));
        assert_eq!(tree.get("app.ui.fontSize").unwrap(), serde_json::json!(14));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.wal");
        let wal = Wal::new(&path).unwrap();
        wal.log_set("x", &Value::Int(1)).unwrap();

        let mut contents = fs::read_to_string(&path).unwrap();
        contents.push('\n');
        contents.push_str("   \n");
        fs::write(&path, contents).unwrap();

        let mut tree = Tree::new();
        wal.replay(&mut tree).unwrap();
        assert_eq!(tree.get("x").unwrap(), serde_json::json!(1));
    }

    #[test]
    fn unknown_op_is_invalid_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.wal");
        let wal = Wal::new(&path).unwrap();
        fs::write(&path, "{\"op\":\"RENAME\",\"path\":\"x\",\"ts\":0}\n").unwrap();

        let mut tree = Tree::new();
        assert!(matches!(wal.replay(&mut tree), Err(Error::InvalidFormat { .. })));
    }

    #[test]
    fn clear_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.wal");
        let wal = Wal::new(&path).unwrap();
        wal.log_set("x", &Value::Int(1)).unwrap();
        wal.clear().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "");
    }
}
