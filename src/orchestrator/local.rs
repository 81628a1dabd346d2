//! Dispatch of saved descriptor files.

use std::path::{Path, PathBuf};

use crate::item::{ItemDescriptor, Post, StoryItem};

/// What to do with a loaded descriptor file.
#[derive(Debug, Clone, PartialEq)]
pub enum LocalDispatch {
    /// Download the post into `target_dir`
    Post { post: Post, target_dir: PathBuf },
    /// Download the story item into `target_dir`
    StoryItem {
        item: StoryItem,
        target_dir: PathBuf,
    },
    /// Not downloadable from a file; the reason is user-facing
    Rejected(String),
}

/// Decides how a descriptor loaded from `path` is handled.
///
/// Profiles are never downloaded from a file: the user is pointed at the
/// plain account name instead.
#[must_use]
pub fn dispatch(descriptor: ItemDescriptor, path: &Path) -> LocalDispatch {
    let target_dir = descriptor_dir(path);
    match descriptor {
        ItemDescriptor::Post(post) => LocalDispatch::Post { post, target_dir },
        ItemDescriptor::StoryItem(item) => LocalDispatch::StoryItem { item, target_dir },
        ItemDescriptor::Profile(profile) => LocalDispatch::Rejected(format!(
            "Profile JSON are ignored. Pass \"{}\" to download that profile",
            profile.username
        )),
        ItemDescriptor::Other { node_type } => {
            LocalDispatch::Rejected(format!("{node_type} JSON file not supported as target"))
        }
    }
}

/// Items from a file are saved next to it.
fn descriptor_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
