//! Profile descriptor.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::filter::Value;

use super::{Attributes, ItemKind};

/// An account profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub username: String,
    #[serde(default)]
    pub userid: Option<i64>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub followers: i64,
    #[serde(default)]
    pub followees: i64,
    #[serde(default)]
    pub mediacount: i64,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub is_verified: bool,
}

impl Profile {
    /// Attribute names of a profile.
    pub const ATTRIBUTES: &'static [&'static str] = &[
        "username",
        "userid",
        "full_name",
        "biography",
        "followers",
        "followees",
        "mediacount",
        "is_private",
        "is_verified",
    ];

    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            userid: None,
            full_name: None,
            biography: None,
            followers: 0,
            followees: 0,
            mediacount: 0,
            is_private: false,
            is_verified: false,
        }
    }
}

impl Attributes for Profile {
    fn kind(&self) -> ItemKind {
        ItemKind::Profile
    }

    fn attribute(&self, name: &str) -> Option<Value> {
        let value = match name {
            "username" => Value::from(self.username.as_str()),
            "userid" => Value::from(self.userid),
            "full_name" => Value::from(self.full_name.clone()),
            "biography" => Value::from(self.biography.clone()),
            "followers" => Value::Int(self.followers),
            "followees" => Value::Int(self.followees),
            "mediacount" => Value::Int(self.mediacount),
            "is_private" => Value::Bool(self.is_private),
            "is_verified" => Value::Bool(self.is_verified),
            _ => return None,
        };
        Some(value)
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Profile {}>", self.username)
    }
}
