//! The storage runtime: coordinates startup recovery, write-ahead logging,
//! checkpointing, and shutdown for a [`Tree`].
//!
//! Scheduling model is single-threaded and cooperative (spec.md §5) — the
//! only interior mutability this type needs is the `logging_enabled` flag,
//! which is why a `Cell<bool>` rather than a lock is enough to let
//! `StorageRuntime` implement [`MutationHook`] via `&self` while also
//! exposing `&self` lifecycle methods to the owner that drives them.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::Error;
use crate::snapshot;
use crate::tree::{MutationHook, Tree};
use crate::value::Value;
use crate::wal::Wal;

/// Coordinates persistence for a [`Tree`]: snapshot + WAL recovery on
/// `start`, durable append-only logging via [`MutationHook`], and
/// checkpoint/shutdown (snapshot write, then WAL truncate — in that order,
/// so a crash between the two steps leaves the WAL merely redundant rather
/// than lost).
pub struct StorageRuntime {
    snapshot_path: PathBuf,
    wal: Wal,
    logging_enabled: Cell<bool>,
}

impl StorageRuntime {
    /// Construct a runtime for the given snapshot/WAL paths. Ensures the WAL
    /// file exists (creating its parent directory if needed); does not
    /// touch the snapshot path until `start`/`checkpoint` is called.
    ///
    /// Wrap the result in `Rc` and share it with [`Tree::attach_hook`] so
    /// both halves observe the same `logging_enabled` state:
    ///
    /// ```no_run
    /// # use configx::{Tree, StorageRuntime};
    /// # use std::rc::Rc;
    /// let runtime = Rc::new(StorageRuntime::new("state.cfgx", "state.wal").unwrap());
    /// let mut tree = Tree::new();
    /// tree.attach_hook(runtime.clone());
    /// runtime.start(&mut tree).unwrap();
    /// ```
    pub fn new(snapshot_path: impl AsRef<Path>, wal_path: impl AsRef<Path>) -> Result<Self, Error> {
        let wal = Wal::new(wal_path)?;
        Ok(StorageRuntime {
            snapshot_path: snapshot_path.as_ref().to_path_buf(),
            wal,
            logging_enabled: Cell::new(true),
        })
    }

    /// Construct a runtime from a resolved [`crate::config::RuntimeConfig`].
    #[cfg(feature = "figment_config")]
    pub fn from_config(config: &crate::config::RuntimeConfig) -> Result<Self, Error> {
        Self::new(config.snapshot_path.clone(), config.wal_path.clone())
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn wal_path(&self) -> &Path {
        self.wal.path()
    }

    /// Recover state: disable logging, load the snapshot if one exists,
    /// replay the WAL, then re-enable logging. Disabling logging during
    /// replay is what keeps recovery idempotent — without it, replayed
    /// `set`/`delete` calls would re-enter the WAL and grow it unboundedly.
    pub fn start(&self, tree: &mut Tree) -> Result<(), Error> {
        self.logging_enabled.set(false);
        log::info!("runtime: recovery starting");

        if self.snapshot_path.exists() {
            snapshot::load(tree, &self.snapshot_path)?;
        } else {
            log::debug!("runtime: no snapshot at {}, starting from WAL only", self.snapshot_path.display());
        }

        self.wal.replay(tree)?;

        self.logging_enabled.set(true);
        log::info!("runtime: recovery complete");
        Ok(())
    }

    /// Write a fresh snapshot, then truncate the WAL. Order matters: if the
    /// process dies between the two steps, the next `start` simply replays
    /// a WAL that is already reflected in the snapshot (redundant, not
    /// lossy).
    pub fn checkpoint(&self, tree: &Tree) -> Result<(), Error> {
        snapshot::save(tree, &self.snapshot_path)?;
        self.wal.clear()?;
        log::info!("runtime: checkpoint complete");
        Ok(())
    }

    /// Equivalent to [`Self::checkpoint`].
    pub fn shutdown(&self, tree: &Tree) -> Result<(), Error> {
        self.checkpoint(tree)
    }
}

impl MutationHook for StorageRuntime {
    fn before_set(&self, path: &str, value: &Value) -> Result<(), Error> {
        if self.logging_enabled.get() {
            self.wal.log_set(path, value)?;
        }
        Ok(())
    }

    fn before_delete(&self, path: &str) -> Result<(), Error> {
        if self.logging_enabled.get() {
            self.wal.log_delete(path)?;
        }
        Ok(())
    }
}

/// Convenience: build a runtime, attach it to a fresh tree, and run
/// recovery in one call. Most callers that don't need to keep the `Rc`
/// handle around for later (e.g. they'll call `checkpoint` via the same
/// variable) will want [`StorageRuntime::new`] plus [`Tree::attach_hook`]
/// directly instead, to retain that handle.
pub fn open(snapshot_path: impl Into<PathBuf>, wal_path: impl Into<PathBuf>) -> Result<(Rc<StorageRuntime>, Tree), Error> {
    let runtime = Rc::new(StorageRuntime::new(snapshot_path, wal_path)?);
    let mut tree = Tree::new();
    tree.attach_hook(runtime.clone());
    runtime.start(&mut tree)?;
    Ok((runtime, tree))
}
