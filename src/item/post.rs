//! Post descriptor.

use std::fmt;
use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::filter::Value;

use super::{Attributes, ItemKind};

#[allow(clippy::expect_used)]
static HASHTAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^&])#(\w+)").expect("hashtag regex is valid") // Static pattern, safe to panic
});

#[allow(clippy::expect_used)]
static MENTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^\w])@(\w(?:[\w.]{0,28}\w)?)").expect("mention regex is valid") // Static pattern, safe to panic
});

/// A post as described by the retrieval service or a saved metadata file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Short code identifying the post in URLs
    pub shortcode: String,
    /// Numeric media id
    #[serde(default)]
    pub mediaid: i64,
    /// Owner account name
    pub owner_username: String,
    /// Owner account id, when known
    #[serde(default)]
    pub owner_id: Option<i64>,
    /// Creation timestamp (UTC)
    pub date_utc: NaiveDateTime,
    /// Creation timestamp in the viewer's local time, when known
    #[serde(default)]
    pub date_local: Option<NaiveDateTime>,
    /// Service type name (`GraphImage`, `GraphVideo`, `GraphSidecar`)
    #[serde(default = "default_typename")]
    pub typename: String,
    /// Number of media in the post
    #[serde(default = "default_mediacount")]
    pub mediacount: i64,
    /// Caption text
    #[serde(default)]
    pub caption: Option<String>,
    /// Accounts tagged in the media
    #[serde(default)]
    pub tagged_users: Vec<String>,
    #[serde(default)]
    pub is_video: bool,
    #[serde(default)]
    pub video_view_count: Option<i64>,
    /// Video length in seconds
    #[serde(default)]
    pub video_duration: Option<f64>,
    #[serde(default)]
    pub viewer_has_liked: bool,
    #[serde(default)]
    pub likes: i64,
    #[serde(default)]
    pub comments: i64,
    #[serde(default)]
    pub is_sponsored: bool,
    /// Location name
    #[serde(default)]
    pub location: Option<String>,
}

fn default_typename() -> String {
    "GraphImage".to_string()
}

fn default_mediacount() -> i64 {
    1
}

impl Post {
    /// Attribute names readable by post filters.
    pub const ATTRIBUTES: &'static [&'static str] = &[
        "shortcode",
        "mediaid",
        "owner_username",
        "owner_id",
        "date_utc",
        "date_local",
        "date",
        "typename",
        "mediacount",
        "caption",
        "caption_hashtags",
        "caption_mentions",
        "tagged_users",
        "is_video",
        "video_view_count",
        "video_duration",
        "viewer_has_liked",
        "likes",
        "comments",
        "is_sponsored",
        "location",
    ];

    /// Creates a post with default values for everything but its identity.
    #[must_use]
    pub fn new(
        shortcode: impl Into<String>,
        owner_username: impl Into<String>,
        date_utc: NaiveDateTime,
    ) -> Self {
        Self {
            shortcode: shortcode.into(),
            mediaid: 0,
            owner_username: owner_username.into(),
            owner_id: None,
            date_utc,
            date_local: None,
            typename: default_typename(),
            mediacount: default_mediacount(),
            caption: None,
            tagged_users: Vec::new(),
            is_video: false,
            video_view_count: None,
            video_duration: None,
            viewer_has_liked: false,
            likes: 0,
            comments: 0,
            is_sponsored: false,
            location: None,
        }
    }

    /// Local timestamp, falling back to UTC.
    #[must_use]
    pub fn date(&self) -> NaiveDateTime {
        self.date_local.unwrap_or(self.date_utc)
    }

    /// Lower-cased hashtags used in the caption, without `#`.
    #[must_use]
    pub fn caption_hashtags(&self) -> Vec<String> {
        capture_all(&HASHTAG_PATTERN, self.caption.as_deref())
    }

    /// Lower-cased account names mentioned in the caption, without `@`.
    #[must_use]
    pub fn caption_mentions(&self) -> Vec<String> {
        capture_all(&MENTION_PATTERN, self.caption.as_deref())
    }
}

fn capture_all(pattern: &Regex, text: Option<&str>) -> Vec<String> {
    let Some(text) = text else {
        return Vec::new();
    };
    pattern
        .captures_iter(text)
        .filter_map(|captures| captures.get(1))
        .map(|found| found.as_str().to_lowercase())
        .collect()
}

impl Attributes for Post {
    fn kind(&self) -> ItemKind {
        ItemKind::Post
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        let value = match name {
            "shortcode" => Value::from(self.shortcode.as_str()),
            "mediaid" => Value::Int(self.mediaid),
            "owner_username" => Value::from(self.owner_username.as_str()),
            "owner_id" => Value::from(self.owner_id),
            "date_utc" => Value::DateTime(self.date_utc),
            "date_local" => Value::DateTime(self.date()),
            "date" => Value::DateTime(self.date()),
            "typename" => Value::from(self.typename.as_str()),
            "mediacount" => Value::Int(self.mediacount),
            "caption" => Value::from(self.caption.clone()),
            "caption_hashtags" => Value::from(self.caption_hashtags().as_slice()),
            "caption_mentions" => Value::from(self.caption_mentions().as_slice()),
            "tagged_users" => Value::from(self.tagged_users.as_slice()),
            "is_video" => Value::Bool(self.is_video),
            "video_view_count" => Value::from(self.video_view_count),
            "video_duration" => Value::from(self.video_duration),
            "viewer_has_liked" => Value::Bool(self.viewer_has_liked),
            "likes" => Value::Int(self.likes),
            "comments" => Value::Int(self.comments),
            "is_sponsored" => Value::Bool(self.is_sponsored),
            "location" => Value::from(self.location.clone()),
            _ => return None,
        };
        Some(value)
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Post {}>", self.shortcode)
    }
}
