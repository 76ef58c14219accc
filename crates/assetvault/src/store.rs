//! FileVault: filesystem-backed asset storage.
//!
//! Implements the AssetStore trait using a directory-per-identifier layout.
//!
//! Layout:
//! ```text
//! {base_path}/
//! ├── models/
//! │   └── coin.glb             # Source asset (read-only fixed input)
//! └── temp_assets/
//!     ├── ab12..._out/
//!     │   └── 0/
//!     │       └── mesh.glb     # One copy per generated identifier
//!     └── cd34..._out/
//!         └── 0/
//!             └── mesh.glb
//! ```
//!
//! The `<id>_out/0/` shape mirrors the output tree of the upstream
//! generation pipeline and must be preserved byte-for-byte for
//! compatibility, even though only the single `0/mesh.glb` path is
//! ever populated here.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::config::VaultConfig;
use crate::id::AssetId;

/// Filename written into every stored asset directory.
pub const STORED_FILE: &str = "mesh.glb";

/// Suffix appended to the identifier to form the stored directory name.
const OUT_SUFFIX: &str = "_out";

/// Numbered subdirectory inside the stored directory. The upstream layout
/// allows several, but only `0` is ever populated.
const OUT_SLOT: &str = "0";

/// A filename pattern used during lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilePattern {
    /// Matches the filename exactly.
    Exact(&'static str),
    /// Matches `{prefix}*{suffix}`, e.g. `mesh_rigged*.glb`.
    Wildcard {
        prefix: &'static str,
        suffix: &'static str,
    },
}

impl FilePattern {
    /// Check whether a filename matches this pattern.
    pub fn matches(&self, name: &str) -> bool {
        match self {
            FilePattern::Exact(exact) => name == *exact,
            FilePattern::Wildcard { prefix, suffix } => {
                name.len() >= prefix.len() + suffix.len()
                    && name.starts_with(prefix)
                    && name.ends_with(suffix)
            }
        }
    }
}

/// Ordered lookup patterns. All matches of an earlier pattern win over any
/// match of a later one; the patterns overlap on purpose and matches are
/// never deduplicated, so callers that store both `mesh.glb` and a rigged
/// variant always get the unrigged mesh back first.
pub const LOOKUP_ORDER: &[FilePattern] = &[
    FilePattern::Exact("mesh.glb"),
    FilePattern::Exact("mesh_rigged.glb"),
    FilePattern::Wildcard {
        prefix: "mesh_rigged",
        suffix: ".glb",
    },
];

/// Trait for asset storage backends.
///
/// This allows for alternative implementations (e.g., in-memory for testing,
/// remote storage).
pub trait AssetStore: Send + Sync {
    /// Check whether the source asset is present.
    fn source_exists(&self) -> bool;

    /// Copy the source asset into a fresh stored directory for `id`,
    /// returning the path of the stored file.
    ///
    /// Creates `<id>_out/0/` (parents included). Fails if the source asset
    /// is missing or any filesystem operation fails.
    fn stash(&self, id: &AssetId) -> Result<PathBuf>;

    /// Find a stored file for `id` by searching its directory recursively
    /// with the ordered lookup patterns.
    ///
    /// Returns `Ok(None)` if the identifier has no directory or nothing
    /// under it matches any pattern.
    fn find(&self, id: &AssetId) -> Result<Option<PathBuf>>;

    /// Check whether a stored directory exists for `id`.
    fn exists(&self, id: &AssetId) -> bool;
}

/// Filesystem-backed asset vault.
#[derive(Debug, Clone)]
pub struct FileVault {
    config: VaultConfig,
}

impl FileVault {
    /// Create a new FileVault with the given configuration.
    ///
    /// Creates the models and temp_assets directories if they don't exist.
    pub fn new(config: VaultConfig) -> Result<Self> {
        fs::create_dir_all(config.models_dir())
            .context("failed to create vault models directory")?;
        fs::create_dir_all(config.assets_dir())
            .context("failed to create vault temp_assets directory")?;

        Ok(Self { config })
    }

    /// Create a FileVault at a specific path.
    pub fn at_path(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(VaultConfig::with_base_path(path))
    }

    /// Get the configuration.
    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Get the stored directory for an identifier (`<id>_out`).
    pub fn out_dir(&self, id: &AssetId) -> PathBuf {
        self.config
            .assets_dir()
            .join(format!("{}{}", id.as_str(), OUT_SUFFIX))
    }

    /// Get the path where the stored file for an identifier is written.
    fn stored_path(&self, id: &AssetId) -> PathBuf {
        self.out_dir(id).join(OUT_SLOT).join(STORED_FILE)
    }
}

impl AssetStore for FileVault {
    fn source_exists(&self) -> bool {
        self.config.source_path().is_file()
    }

    fn stash(&self, id: &AssetId) -> Result<PathBuf> {
        let source = self.config.source_path();
        if !source.is_file() {
            anyhow::bail!("source asset missing: {}", source.display());
        }

        let dest = self.stored_path(id);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).context("failed to create stored asset directory")?;
        }

        fs::copy(&source, &dest).with_context(|| {
            format!(
                "failed to copy source asset to {}",
                dest.display()
            )
        })?;

        Ok(dest)
    }

    fn find(&self, id: &AssetId) -> Result<Option<PathBuf>> {
        let dir = self.out_dir(id);
        if !dir.is_dir() {
            return Ok(None);
        }

        // Patterns are evaluated strictly in order: every file is checked
        // against pattern N before any file is checked against pattern N+1.
        for pattern in LOOKUP_ORDER {
            for entry in WalkDir::new(&dir) {
                let entry = entry.context("failed to walk stored asset directory")?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let name = entry.file_name().to_string_lossy();
                if pattern.matches(&name) {
                    return Ok(Some(entry.into_path()));
                }
            }
        }

        Ok(None)
    }

    fn exists(&self, id: &AssetId) -> bool {
        self.out_dir(id).is_dir()
    }
}
