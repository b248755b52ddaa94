//! Bootstrap configuration for [`crate::runtime::StorageRuntime`] itself —
//! where its snapshot and WAL files live, and what strict mode a fresh
//! [`crate::tree::Tree`] should start in. This is deliberately *not* the
//! "high-level configuration file importer" Non-goal from spec.md §1: that
//! Non-goal is about ingesting a caller's own application data as tree
//! content (still only reachable through [`crate::tree::Tree::load_dict`]).
//! `RuntimeConfig` instead configures the storage runtime's own bootstrap
//! parameters, mirroring the teacher's `figment`-backed configuration of its
//! own storage stack rather than of user data.
//!
//! Feature-gated behind `figment_config`, matching the teacher's identically
//! named feature.

use std::path::PathBuf;

use figment::providers::{Env, Format, Json, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Resolved bootstrap parameters for a [`crate::runtime::StorageRuntime`].
///
/// Defaults place both files under `./configx-data/`; callers normally
/// override at least `snapshot_path`/`wal_path` via environment variables
/// (`CONFIGX_SNAPSHOT_PATH`, `CONFIGX_WAL_PATH`, `CONFIGX_STRICT_MODE`) or a
/// JSON config file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuntimeConfig {
    pub snapshot_path: PathBuf,
    pub wal_path: PathBuf,
    /// Whether a [`crate::tree::Tree`] built from this config should start
    /// in strict mode (see spec.md §4.1's `set_strict_mode`).
    pub strict_mode: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            snapshot_path: PathBuf::from("configx-data/state.cfgx"),
            wal_path: PathBuf::from("configx-data/state.wal"),
            strict_mode: false,
        }
    }
}

impl RuntimeConfig {
    /// Resolve configuration from (in increasing precedence) built-in
    /// defaults, an optional JSON file at `path`, and `CONFIGX_*` environment
    /// variables. The JSON file is optional: a missing file is not an error,
    /// it simply contributes nothing.
    pub fn from_env_and_file(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        let figment = Figment::from(Serialized::defaults(RuntimeConfig::default()))
            .merge(Json::file(&path))
            .merge(Env::prefixed("CONFIGX_"));

        figment.extract().map_err(|e| Error::InvalidFormat {
            reason: format!("failed to resolve runtime configuration: {e}"),
        })
    }

    /// Resolve configuration from defaults plus `CONFIGX_*` environment
    /// variables only, skipping any file lookup.
    pub fn from_env() -> Result<Self, Error> {
        let figment = Figment::from(Serialized::defaults(RuntimeConfig::default()))
            .merge(Env::prefixed("CONFIGX_"));

        figment.extract().map_err(|e| Error::InvalidFormat {
            reason: format!("failed to resolve runtime configuration: {e}"),
        })
    }
}
