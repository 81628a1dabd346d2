//! Story item descriptor.

use std::fmt;

use chrono::{NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize};

use crate::filter::Value;

use super::{Attributes, ItemKind};

const SHORTCODE_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

/// Story items expire one day after being posted.
const STORY_LIFETIME_HOURS: i64 = 24;

/// A single story item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryItem {
    pub mediaid: i64,
    /// Short code; derived from `mediaid` when the source omits it
    #[serde(default)]
    pub shortcode: Option<String>,
    pub owner_username: String,
    #[serde(default)]
    pub owner_id: Option<i64>,
    pub date_utc: NaiveDateTime,
    #[serde(default)]
    pub date_local: Option<NaiveDateTime>,
    /// Expiry timestamp (UTC); one day after `date_utc` when omitted
    #[serde(default)]
    pub expiring_utc: Option<NaiveDateTime>,
    #[serde(default = "default_typename")]
    pub typename: String,
    #[serde(default)]
    pub is_video: bool,
}

fn default_typename() -> String {
    "GraphStoryImage".to_string()
}

impl StoryItem {
    /// Attribute names readable by story item filters.
    pub const ATTRIBUTES: &'static [&'static str] = &[
        "mediaid",
        "shortcode",
        "owner_username",
        "owner_id",
        "date_utc",
        "date_local",
        "date",
        "expiring_utc",
        "typename",
        "is_video",
    ];

    #[must_use]
    pub fn new(mediaid: i64, owner_username: impl Into<String>, date_utc: NaiveDateTime) -> Self {
        Self {
            mediaid,
            shortcode: None,
            owner_username: owner_username.into(),
            owner_id: None,
            date_utc,
            date_local: None,
            expiring_utc: None,
            typename: default_typename(),
            is_video: false,
        }
    }

    /// Short code, derived from the media id if none was supplied.
    #[must_use]
    pub fn shortcode(&self) -> String {
        self.shortcode
            .clone()
            .unwrap_or_else(|| mediaid_to_shortcode(self.mediaid))
    }

    #[must_use]
    pub fn date(&self) -> NaiveDateTime {
        self.date_local.unwrap_or(self.date_utc)
    }

    /// Explicit expiry, else one day after posting; `None` if that is out of range.
    #[must_use]
    pub fn expiring_utc(&self) -> Option<NaiveDateTime> {
        self.expiring_utc.or_else(|| {
            self.date_utc
                .checked_add_signed(TimeDelta::hours(STORY_LIFETIME_HOURS))
        })
    }
}

/// Encodes a media id in the URL-safe base64 alphabet used for short codes.
#[must_use]
pub fn mediaid_to_shortcode(mediaid: i64) -> String {
    let mut remaining = mediaid.unsigned_abs();
    if remaining == 0 {
        return "A".to_string();
    }
    let mut digits = Vec::new();
    while remaining > 0 {
        // remaining % 64 always fits the alphabet
        #[allow(clippy::cast_possible_truncation)]
        let index = (remaining % 64) as usize;
        digits.push(SHORTCODE_ALPHABET[index]);
        remaining /= 64;
    }
    digits.iter().rev().map(|&byte| char::from(byte)).collect()
}

impl Attributes for StoryItem {
    fn kind(&self) -> ItemKind {
        ItemKind::StoryItem
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        let value = match name {
            "mediaid" => Value::Int(self.mediaid),
            "shortcode" => Value::Str(self.shortcode()),
            "owner_username" => Value::from(self.owner_username.as_str()),
            "owner_id" => Value::from(self.owner_id),
            "date_utc" => Value::DateTime(self.date_utc),
            "date_local" | "date" => Value::DateTime(self.date()),
            "expiring_utc" => Value::from(self.expiring_utc()),
            "typename" => Value::from(self.typename.as_str()),
            "is_video" => Value::Bool(self.is_video),
            _ => return None,
        };
        Some(value)
    }
}

impl fmt::Display for StoryItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<StoryItem {}>", self.mediaid)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn stamp() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2022-11-05 22:30:00", "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_every_declared_attribute_is_readable() {
        let story = StoryItem::new(42, "alice", stamp());
        for name in StoryItem::ATTRIBUTES {
            assert!(story.attribute(name).is_some(), "{name} must be readable");
        }
        assert!(story.attribute("likes").is_none());
    }

    #[test]
    fn test_expiry_defaults_to_one_day() {
        let story = StoryItem::new(42, "alice", stamp());
        let expected =
            NaiveDateTime::parse_from_str("2022-11-06 22:30:00", "%Y-%m-%d %H:%M:%S").unwrap();
        assert_eq!(story.expiring_utc(), Some(expected));
    }

    #[test]
    fn test_expiry_out_of_range_reads_as_none() {
        let story: StoryItem = serde_json::from_str(
            r#"{"mediaid": 1, "owner_username": "alice",
                "date_utc": "+262142-12-31T23:59:59"}"#,
        )
        .unwrap();
        assert_eq!(story.expiring_utc(), None);
        assert_eq!(story.attribute("expiring_utc"), Some(Value::None));

        let predicate = crate::filter::compile(
            "expiring_utc > datetime(2020, 1, 1)",
            crate::item::ItemKind::StoryItem,
        )
        .unwrap();
        assert!(predicate.evaluate(&story).is_err());
    }

    #[test]
    fn test_explicit_expiry_is_kept_near_range_end() {
        let mut story = StoryItem::new(1, "alice", NaiveDateTime::MAX);
        story.expiring_utc = Some(stamp());
        assert_eq!(story.expiring_utc(), Some(stamp()));
    }

    #[test]
    fn test_mediaid_to_shortcode() {
        assert_eq!(mediaid_to_shortcode(0), "A");
        assert_eq!(mediaid_to_shortcode(1), "B");
        assert_eq!(mediaid_to_shortcode(64), "BA");
        assert_eq!(mediaid_to_shortcode(63), "_");
    }

    #[test]
    fn test_explicit_shortcode_wins() {
        let story = StoryItem {
            shortcode: Some("Cx9".to_string()),
            ..StoryItem::new(42, "alice", stamp())
        };
        assert_eq!(story.shortcode(), "Cx9");
    }
}
