//! Restricted filter expressions for `--post-filter` and `--storyitem-filter`.
//!
//! A filter is compiled once per run into a [`Predicate`] for one item kind.
//! Compilation resolves every bare name to an attribute read on the item being
//! evaluated, so an expression can only look at the item's declared
//! attributes and the `datetime(...)` constructor. Anything that would bind,
//! rebind or delete a name is rejected before parsing.
//!
//! # Example
//!
//! ```
//! use instaloader_core::filter::compile;
//! use instaloader_core::item::ItemKind;
//!
//! let predicate = compile("likes > 100 and not is_video", ItemKind::Post).unwrap();
//! assert_eq!(predicate.kind(), ItemKind::Post);
//! assert!(compile("likes = 5", ItemKind::Post).is_err());
//! ```

mod error;
mod eval;
mod lexer;
mod parser;
mod value;

pub use error::{EvalError, FilterError};
pub use value::Value;

use tracing::debug;

use crate::item::{Attributes, ItemKind};

use parser::Expr;

/// A compiled, side-effect free filter over one item kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    source: String,
    kind: ItemKind,
    root: Expr,
}

impl Predicate {
    /// The expression text this predicate was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Item kind whose attributes the predicate reads.
    #[must_use]
    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    /// Evaluates the predicate against `item`.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError`] when the item is of another kind or when the
    /// expression cannot be evaluated for this item's values (for example
    /// arithmetic on an absent attribute).
    pub fn evaluate(&self, item: &dyn Attributes) -> Result<bool, EvalError> {
        if item.kind() != self.kind {
            return Err(EvalError::KindMismatch {
                expected: self.kind,
                actual: item.kind(),
            });
        }
        eval::evaluate(&self.root, item).map(|value| value.is_truthy())
    }
}

/// Compiles `expression` into a [`Predicate`] for items of `kind`.
///
/// # Errors
///
/// - [`FilterError::Syntax`] if the text is not one well-formed expression
/// - [`FilterError::UnknownName`] if a name is not an attribute of `kind`
/// - [`FilterError::Assignment`] if the text assigns to or deletes a name
#[tracing::instrument(skip(expression), fields(expression_len = expression.len()))]
pub fn compile(expression: &str, kind: ItemKind) -> Result<Predicate, FilterError> {
    let root = parser::parse(expression, kind)?;
    debug!(%kind, "Compiled filter expression");
    Ok(Predicate {
        source: expression.to_string(),
        kind,
        root,
    })
}

/// The optional per-kind predicates of one run.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    /// Applied to every post before download
    pub post: Option<Predicate>,
    /// Applied to every story item before download
    pub storyitem: Option<Predicate>,
}

impl Filters {
    /// Compiles the optional post and story item expressions.
    ///
    /// # Errors
    ///
    /// Returns the first [`FilterError`] encountered.
    pub fn compile(
        post_filter: Option<&str>,
        storyitem_filter: Option<&str>,
    ) -> Result<Self, FilterError> {
        let post = post_filter
            .map(|expression| compile(expression, ItemKind::Post))
            .transpose()?;
        let storyitem = storyitem_filter
            .map(|expression| compile(expression, ItemKind::StoryItem))
            .transpose()?;
        Ok(Self { post, storyitem })
    }

    /// Returns true if `item` passes the predicate for its kind (or no predicate is set).
    ///
    /// # Errors
    ///
    /// Propagates [`EvalError`] from the predicate.
    pub fn accepts(&self, item: &dyn Attributes) -> Result<bool, EvalError> {
        let predicate = match item.kind() {
            ItemKind::Post => self.post.as_ref(),
            ItemKind::StoryItem => self.storyitem.as_ref(),
            ItemKind::Profile => None,
        };
        predicate.map_or(Ok(true), |predicate| predicate.evaluate(item))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::item::{Post, StoryItem};
    use chrono::NaiveDateTime;

    fn stamp(text: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn liked_post() -> Post {
        Post {
            viewer_has_liked: true,
            likes: 42,
            ..Post::new("B1", "alice", stamp("2020-03-01 12:00:00"))
        }
    }

    #[test]
    fn test_compile_accepts_declared_attribute() {
        let predicate = compile("viewer_has_liked", ItemKind::Post).unwrap();
        assert!(predicate.evaluate(&liked_post()).unwrap());
        assert_eq!(predicate.source(), "viewer_has_liked");
    }

    #[test]
    fn test_compile_rejects_assignment() {
        assert!(matches!(
            compile("x = 5", ItemKind::Post).unwrap_err(),
            FilterError::Assignment { .. }
        ));
    }

    #[test]
    fn test_compile_rejects_unknown_name() {
        assert!(matches!(
            compile("not_a_real_field", ItemKind::Post).unwrap_err(),
            FilterError::UnknownName { .. }
        ));
    }

    #[test]
    fn test_compile_is_idempotent() {
        let first = compile("likes > 10 and date_utc > datetime(2019, 1, 1)", ItemKind::Post)
            .unwrap();
        let second = compile("likes > 10 and date_utc > datetime(2019, 1, 1)", ItemKind::Post)
            .unwrap();
        assert_eq!(first, second);

        let post = liked_post();
        assert_eq!(
            first.evaluate(&post).unwrap(),
            second.evaluate(&post).unwrap()
        );
    }

    #[test]
    fn test_evaluate_rejects_other_kind() {
        let predicate = compile("is_video", ItemKind::StoryItem).unwrap();
        let err = predicate.evaluate(&liked_post()).unwrap_err();
        assert_eq!(
            err,
            EvalError::KindMismatch {
                expected: ItemKind::StoryItem,
                actual: ItemKind::Post,
            }
        );
    }

    #[test]
    fn test_filters_dispatch_by_kind() {
        let filters = Filters::compile(Some("likes > 100"), Some("not is_video")).unwrap();
        assert!(!filters.accepts(&liked_post()).unwrap());

        let story = StoryItem::new(7, "alice", stamp("2020-03-01 12:00:00"));
        assert!(filters.accepts(&story).unwrap());
    }

    #[test]
    fn test_filters_without_predicates_accept_everything() {
        let filters = Filters::default();
        assert!(filters.accepts(&liked_post()).unwrap());
    }

    #[test]
    fn test_filters_compile_reports_storyitem_error() {
        let err = Filters::compile(None, Some("caption")).unwrap_err();
        assert!(matches!(
            err,
            FilterError::UnknownName {
                kind: ItemKind::StoryItem,
                ..
            }
        ));
    }
}
