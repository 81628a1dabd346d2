//! Item descriptors: posts, story items and profiles.
//!
//! Descriptors are produced by the retrieval service or loaded from saved
//! metadata files. The orchestrator only needs their kind and a read-only view
//! of their named attributes, which the filter evaluator consumes through
//! [`Attributes`].

mod loader;
mod post;
mod profile;
mod story;

pub use loader::{DescriptorLoader, JsonDescriptorLoader, LoadError, SavedDescriptor};
pub use post::Post;
pub use profile::Profile;
pub use story::{StoryItem, mediaid_to_shortcode};

use std::fmt;

use crate::filter::Value;

/// Discriminant of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// A feed post (one or more pictures/videos)
    Post,
    /// A single story item
    StoryItem,
    /// An account profile
    Profile,
}

impl ItemKind {
    /// Attribute names a filter compiled for this kind may reference.
    #[must_use]
    pub fn attribute_names(self) -> &'static [&'static str] {
        match self {
            Self::Post => Post::ATTRIBUTES,
            Self::StoryItem => StoryItem::ATTRIBUTES,
            Self::Profile => Profile::ATTRIBUTES,
        }
    }

    /// Returns true if `name` is a declared attribute of this kind.
    #[must_use]
    pub fn has_attribute(self, name: &str) -> bool {
        self.attribute_names().contains(&name)
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Post => write!(f, "Post"),
            Self::StoryItem => write!(f, "StoryItem"),
            Self::Profile => write!(f, "Profile"),
        }
    }
}

/// Read-only attribute access used by filter evaluation.
pub trait Attributes {
    /// Kind of the item.
    fn kind(&self) -> ItemKind;

    /// Value of a declared attribute, `None` if `name` is not declared.
    fn attribute(&self, name: &str) -> Option<Value>;
}

/// A descriptor loaded from a saved metadata file.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemDescriptor {
    /// Saved post
    Post(Post),
    /// Saved story item
    StoryItem(StoryItem),
    /// Saved profile
    Profile(Profile),
    /// Any other node type the loader recognised but the core cannot download
    Other {
        /// Node type as written in the file
        node_type: String,
    },
}

impl ItemDescriptor {
    /// Name of the descriptor's node type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Post(_) => "Post",
            Self::StoryItem(_) => "StoryItem",
            Self::Profile(_) => "Profile",
            Self::Other { node_type } => node_type,
        }
    }
}
