//! Asset storage for meshdrop.
//!
//! A directory-per-identifier store on the local filesystem. Each generated
//! asset lives in its own `<id>_out/` tree, mirroring the output layout of
//! the upstream generation pipeline so downstream tooling can consume either
//! interchangeably.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use assetvault::{AssetId, AssetStore, FileVault, VaultConfig};
//!
//! // Create from environment (reads MESHDROP_VAULT_PATH)
//! let config = VaultConfig::from_env().unwrap();
//! let vault = FileVault::new(config).unwrap();
//!
//! // Or at a specific path
//! let vault = FileVault::at_path("/srv/meshdrop").unwrap();
//!
//! // Store a copy of the source asset under a fresh identifier
//! let id = AssetId::new();
//! let stored = vault.stash(&id).unwrap();
//! println!("Stored at: {}", stored.display());
//!
//! // Retrieve it later by identifier
//! if let Some(path) = vault.find(&id).unwrap() {
//!     println!("Found at: {}", path.display());
//! }
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `MESHDROP_VAULT_PATH`: Base path for storage (default: `~/.meshdrop/vault`)
//! - `MESHDROP_SOURCE_FILE`: Source asset filename under `models/` (default: `coin.glb`)
//!
//! # Layout
//!
//! Stored directories are write-once: created in a single request, read many
//! times, never mutated afterwards. Nothing is ever deleted by this crate.

pub mod config;
pub mod id;
pub mod store;

// Re-exports for convenience
pub use config::VaultConfig;
pub use id::{AssetId, IdError};
pub use store::{AssetStore, FilePattern, FileVault, LOOKUP_ORDER};
