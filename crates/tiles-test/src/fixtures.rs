//! Test fixtures for manifests and tile directories.

use std::path::Path;

use tempfile::TempDir;
use tiles_loader::{MANIFEST_FILE_NAME, Manifest};
use tracing_subscriber::EnvFilter;

/// Title used by [`test_manifest`].
pub const TEST_TITLE: &str = "Test Tile";

/// Icons used by [`test_manifest`], in manifest order.
pub const TEST_ICONS: [&str; 2] = ["/icons/primary.png", "/icons/secondary.png"];

/// A manifest with a title and two icons.
#[must_use]
pub fn test_manifest() -> Manifest {
    Manifest::new()
        .with_name(TEST_TITLE)
        .with_icon(TEST_ICONS[0])
        .with_icon(TEST_ICONS[1])
}

/// A manifest with a title and no icons.
#[must_use]
pub fn test_manifest_titled(title: impl Into<String>) -> Manifest {
    Manifest::new().with_name(title)
}

/// A manifest without title or icons.
#[must_use]
pub fn test_manifest_bare() -> Manifest {
    Manifest::new()
}

/// Create a temporary tile directory.
///
/// Holds a manifest matching [`test_manifest`], an `index.html`, the primary
/// icon, and `app.js`.
///
/// # Panics
///
/// Panics if the directory cannot be written.
#[must_use]
#[allow(clippy::expect_used)]
pub fn test_tile_dir() -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    write_tile(dir.path());
    dir
}

#[allow(clippy::expect_used)]
fn write_tile(root: &Path) {
    let manifest = serde_json::json!({
        "name": TEST_TITLE,
        "icons": [
            {"src": TEST_ICONS[0], "sizes": "48x48", "type": "image/png"},
            {"src": TEST_ICONS[1]},
        ],
    });
    std::fs::write(root.join(MANIFEST_FILE_NAME), manifest.to_string()).expect("write manifest");
    std::fs::write(root.join("index.html"), "<!doctype html><h1>test tile</h1>")
        .expect("write index");
    std::fs::write(root.join("app.js"), "console.log('tile');").expect("write app.js");
    std::fs::create_dir_all(root.join("icons")).expect("create icons dir");
    std::fs::write(root.join("icons").join("primary.png"), [0x89, b'P', b'N', b'G'])
        .expect("write icon");
}

/// Install a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
