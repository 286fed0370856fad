//! Atomic whole-file replace.

use std::path::Path;

use postforge_core::Result;

/// Write `content` to `path` via a sibling temp file and rename, so readers
/// never observe a partially written document.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
