//! Versioned static asset manifest.
//!
//! The manifest names every path that must be fetchable at install time. Its
//! generation identifier and the listed assets must be bumped together
//! whenever any asset's content changes; Stale-While-Revalidate only updates
//! entries that were actually requested, never proactively.

/// The application shell's fixed asset list: entry page, stylesheet,
/// scripts, web manifest, icons.
pub const SHELL_ASSETS: &[&str] = &[
    "/",
    "/index.html",
    "/styles.css",
    "/app.js",
    "/manifest.json",
    "/icons/icon192.png",
    "/icons/icon512.png",
];

/// A versioned snapshot of the static asset set.
#[derive(Debug, Clone)]
pub struct AssetManifest {
    /// Cache generation identifier, e.g. "stash-v2".
    pub generation: String,
    /// Absolute paths, resolved against the application origin at install.
    pub paths: Vec<String>,
}

impl AssetManifest {
    pub fn new(generation: impl Into<String>, paths: Vec<String>) -> Self {
        Self { generation: generation.into(), paths }
    }

    /// The default shell manifest under the given generation.
    pub fn shell(generation: impl Into<String>) -> Self {
        Self::new(generation, SHELL_ASSETS.iter().map(|p| (*p).to_string()).collect())
    }
}
