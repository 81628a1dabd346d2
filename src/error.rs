//! Errors that end a run before or after the batch loop.

use thiserror::Error;

use crate::filter::FilterError;
use crate::session::SessionError;
use crate::target::TargetError;

/// A fault that aborts the whole run with a non-zero exit.
#[derive(Debug, Error)]
pub enum FatalError {
    /// The target list contains a removed special target
    #[error(transparent)]
    Configuration(#[from] TargetError),

    /// Contradictory or incomplete command-line options
    #[error("{0}")]
    InvalidArguments(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl FatalError {
    /// Configuration faults are reported with their bare message.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::InvalidArguments(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::ItemKind;

    #[test]
    fn test_configuration_classification() {
        let removed = FatalError::from(TargetError::Removed {
            target: ":feed-all".to_string(),
        });
        assert!(removed.is_configuration());
        assert!(FatalError::InvalidArguments("x".to_string()).is_configuration());

        let filter = FatalError::from(FilterError::UnknownName {
            name: "x".to_string(),
            kind: ItemKind::Post,
        });
        assert!(!filter.is_configuration());
        assert_eq!(filter.to_string(), "Invalid filter: x not a Post attribute.");
    }
}
