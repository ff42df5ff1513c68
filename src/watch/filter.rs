//! Extension filtering of raw filesystem notifications.

use std::path::{Path, PathBuf};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};

/// E-book formats the monitor acts on. Matched case-sensitively.
pub const MONITORED_EXTENSIONS: [&str; 5] = [".azw", ".azw3", ".epub", ".mobi", ".pdf"];

/// What happened to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrivalKind {
    Created,
    Modified,
}

/// One filesystem change worth resolving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileArrivalEvent {
    pub path: PathBuf,
    pub kind: ArrivalKind,
}

/// Extension of a file name including the leading dot (`"book.epub"` -> `".epub"`).
///
/// A leading-dot name such as `".pdf"` is all extension.
fn extension_of(path: &Path) -> Option<&str> {
    let name = path.file_name()?.to_str()?;
    let dot = name.rfind('.')?;
    let ext = &name[dot..];
    if ext.len() > 1 {
        Some(ext)
    } else {
        None
    }
}

/// Whether a path has one of the monitored extensions.
pub fn is_monitored(path: &Path) -> bool {
    extension_of(path).is_some_and(|ext| MONITORED_EXTENSIONS.contains(&ext))
}

fn arrival_kind(kind: &EventKind) -> Option<ArrivalKind> {
    match kind {
        EventKind::Create(_) => Some(ArrivalKind::Created),
        // The source side of a rename no longer exists in the directory.
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => None,
        EventKind::Modify(_) => Some(ArrivalKind::Modified),
        _ => None,
    }
}

/// Turn a raw notification into arrival events for monitored files.
///
/// Everything else is dropped silently.
pub fn arrival_events(event: Event) -> Vec<FileArrivalEvent> {
    let Some(kind) = arrival_kind(&event.kind) else {
        return Vec::new();
    };

    let rename_pair = matches!(event.kind, EventKind::Modify(ModifyKind::Name(RenameMode::Both)));
    let path_count = event.paths.len();

    event
        .paths
        .into_iter()
        .enumerate()
        // For a rename pair, only the destination (last path) arrived.
        .filter(|(i, _)| !rename_pair || *i + 1 == path_count)
        .map(|(_, path)| path)
        .filter(|path| is_monitored(path))
        .map(|path| FileArrivalEvent { path, kind })
        .collect()
}
