//! ConfigX: an embedded, durable, hierarchical configuration store.
//!
//! A process-local [`Tree`] manipulates a tree of named nodes through
//! dotted-path `get`/`set`/`delete` operations. Durability is layered on
//! top by [`StorageRuntime`], which coordinates a binary snapshot
//! ([`snapshot`]) and an append-only write-ahead log ([`wal`]) so that
//! committed mutations survive process crashes.
//!
//! ```no_run
//! use configx::{StorageRuntime, Tree};
//! use std::rc::Rc;
//!
//! let runtime = Rc::new(StorageRuntime::new("state.cfgx", "state.wal")?);
//! let mut tree = Tree::new();
//! tree.attach_hook(runtime.clone());
//! runtime.start(&mut tree)?;
//!
//! tree.set("app.ui.theme", "dark")?;
//! assert_eq!(tree.get("app.ui.theme")?, serde_json::json!("dark"));
//!
//! runtime.shutdown(&tree)?;
//! # Ok::<(), configx::Error>(())
//! ```

#[cfg(feature = "figment_config")]
pub mod config;
pub mod error;
pub mod node;
pub mod runtime;
pub mod snapshot;
pub mod tree;
pub mod value;
pub mod wal;

#[cfg(feature = "figment_config")]
pub use config::RuntimeConfig;
pub use error::Error;
pub use node::Node;
pub use runtime::StorageRuntime;
pub use tree::{MutationHook, Tree};
pub use value::{TypeTag, Value};

/// Initialize the `env_logger` backend from the `RUST_LOG` environment
/// variable. Intended for binaries and tests that embed this crate and want
/// its `log` records surfaced; the library itself never calls this on its
/// own. A no-op if a logger is already installed.
#[cfg(feature = "init_env_logger")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env().try_init();
}
