use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use regex::Regex;
use tracing::debug;

use crate::{error::FinishError, plan::SourcePatch};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The block was inserted; the original content lives at `backup`.
    Applied { backup: PathBuf },
    /// The marker was already present, nothing was written.
    AlreadyApplied,
}

/// Sibling path holding the pre-patch content, e.g. `server.js.backup_auto`.
pub fn backup_path(target: &Path, suffix: &str) -> PathBuf {
    let mut name = target
        .file_name()
        .map(OsString::from)
        .unwrap_or_default();
    name.push(suffix);
    target.with_file_name(name)
}

/// Insert `patch.insertion` right after the first line matching `patch.anchor`.
///
/// The file is read completely, transformed in memory and written back in one
/// go. The unmodified content is saved next to it before the overwrite.
pub fn apply_patch<P: AsRef<Path>>(
    target: P,
    patch: &SourcePatch,
) -> Result<PatchOutcome, FinishError> {
    let target = target.as_ref();
    if !target.is_file() {
        return Err(FinishError::NotFound(target.to_path_buf()));
    }
    let content = fs::read_to_string(target).map_err(|e| FinishError::io(target, e))?;

    if content.contains(&patch.marker) {
        return Ok(PatchOutcome::AlreadyApplied);
    }

    let anchor = Regex::new(&patch.anchor)?;
    let Some(found) = anchor.find(&content) else {
        return Err(FinishError::AnchorMissing(target.to_path_buf()));
    };
    debug!(offset = found.end(), "anchor matched");

    let mut patched = String::with_capacity(content.len() + patch.insertion.len());
    patched.push_str(&content[..found.end()]);
    patched.push_str(&patch.insertion);
    patched.push_str(&content[found.end()..]);

    let backup = backup_path(target, &patch.backup_suffix);
    fs::write(&backup, &content).map_err(|e| FinishError::io(&backup, e))?;
    fs::write(target, patched).map_err(|e| FinishError::io(target, e))?;
    Ok(PatchOutcome::Applied { backup })
}
