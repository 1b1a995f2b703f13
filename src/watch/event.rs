//! Arrival events, decoupled from `notify`'s event taxonomy.

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Event, EventKind};
use std::path::PathBuf;

/// A path that appeared in the watch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsEvent {
    pub path: PathBuf,
    pub is_dir: bool,
}

impl FsEvent {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: false,
        }
    }

    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_dir: true,
        }
    }

    /// Arrivals carried by a `notify` event.
    ///
    /// Creations count, and so do renames *into* a path: browsers write
    /// `name.pdf.part` and rename it when the download completes. Everything
    /// else (data writes, removals, metadata) yields nothing.
    pub fn from_notify(event: &Event) -> Vec<FsEvent> {
        match event.kind {
            EventKind::Create(CreateKind::Folder) => {
                event.paths.iter().cloned().map(FsEvent::dir).collect()
            }
            EventKind::Create(CreateKind::File) => {
                event.paths.iter().cloned().map(FsEvent::file).collect()
            }
            EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                event.paths.iter().map(|p| from_disk(p.clone())).collect()
            }
            // `[from, to]`
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                event.paths.last().cloned().map(from_disk).into_iter().collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Build an event for a path whose kind the platform did not report.
fn from_disk(path: PathBuf) -> FsEvent {
    let is_dir = path.is_dir();
    FsEvent { path, is_dir }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{DataChange, RemoveKind};

    #[test]
    fn create_file_is_an_arrival() {
        let event = Event::new(EventKind::Create(CreateKind::File)).add_path("/w/a.pdf".into());
        assert_eq!(FsEvent::from_notify(&event), vec![FsEvent::file("/w/a.pdf")]);
    }

    #[test]
    fn create_folder_is_flagged_as_dir() {
        let event = Event::new(EventKind::Create(CreateKind::Folder)).add_path("/w/x.pdf".into());
        assert_eq!(FsEvent::from_notify(&event), vec![FsEvent::dir("/w/x.pdf")]);
    }

    #[test]
    fn rename_both_reports_destination() {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path("/nonexistent/a.pdf.part".into())
            .add_path("/nonexistent/a.pdf".into());
        assert_eq!(FsEvent::from_notify(&event), vec![FsEvent::file("/nonexistent/a.pdf")]);
    }

    #[test]
    fn writes_and_removals_are_ignored() {
        let write = Event::new(EventKind::Modify(ModifyKind::Data(DataChange::Content)))
            .add_path("/w/a.pdf".into());
        let remove = Event::new(EventKind::Remove(RemoveKind::File)).add_path("/w/a.pdf".into());
        let rename_from = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
            .add_path("/w/a.pdf".into());
        assert!(FsEvent::from_notify(&write).is_empty());
        assert!(FsEvent::from_notify(&remove).is_empty());
        assert!(FsEvent::from_notify(&rename_from).is_empty());
    }
}
