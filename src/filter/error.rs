//! Error types for filter compilation and evaluation.

use thiserror::Error;

use crate::item::ItemKind;

/// Errors raised while compiling a filter expression.
///
/// All of these are fatal at startup: no target is processed with a filter
/// that failed to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// The text is not a single well-formed expression
    #[error("Invalid filter: {message} at offset {offset} in '{expression}'")]
    Syntax {
        /// Full expression text
        expression: String,
        /// Byte offset of the offending token
        offset: usize,
        /// What went wrong
        message: String,
    },

    /// A bare name is neither an attribute of the item kind nor `datetime`
    #[error("Invalid filter: {name} not a {kind} attribute.")]
    UnknownName {
        /// The offending name
        name: String,
        /// Item kind the filter was compiled for
        kind: ItemKind,
    },

    /// The expression tries to bind, rebind or delete a name
    #[error("Invalid filter: Modifying variables ({name}) not allowed.")]
    Assignment {
        /// Name that would have been modified
        name: String,
    },
}

impl FilterError {
    /// Creates a syntax error at `offset`.
    #[must_use]
    pub fn syntax(expression: &str, offset: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            expression: expression.to_string(),
            offset,
            message: message.into(),
        }
    }
}

/// Faults raised while evaluating a compiled filter against one item.
///
/// These are per-item faults: callers record them against the current target
/// and carry on with the batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// Operator applied to operand types it does not support
    #[error("unsupported operand types for {op}: '{left}' and '{right}'")]
    TypeMismatch {
        /// Operator symbol
        op: &'static str,
        /// Left operand type
        left: &'static str,
        /// Right operand type
        right: &'static str,
    },

    /// Unary operator applied to an unsupported operand type
    #[error("bad operand type for unary {op}: '{operand}'")]
    BadOperand {
        /// Operator symbol
        op: &'static str,
        /// Operand type
        operand: &'static str,
    },

    /// Division or modulo by zero
    #[error("division by zero")]
    DivisionByZero,

    /// Integer arithmetic overflowed
    #[error("integer overflow in {op}")]
    Overflow {
        /// Operator symbol
        op: &'static str,
    },

    /// `datetime(...)` received components that do not form a valid timestamp
    #[error("invalid datetime({args})")]
    InvalidDatetime {
        /// Rendered argument list
        args: String,
    },

    /// Member access on a value that does not carry that member
    #[error("'{type_name}' object has no attribute '{member}'")]
    NoMember {
        /// Value type
        type_name: &'static str,
        /// Requested member
        member: String,
    },

    /// Predicate compiled for one item kind was applied to another
    #[error("filter for {expected} applied to {actual}")]
    KindMismatch {
        /// Kind the predicate was compiled for
        expected: ItemKind,
        /// Kind of the evaluated item
        actual: ItemKind,
    },

    /// The item did not provide a declared attribute
    #[error("{kind} has no value for attribute '{name}'")]
    MissingAttribute {
        /// Item kind
        kind: ItemKind,
        /// Attribute name
        name: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_name_message_mentions_kind() {
        let err = FilterError::UnknownName {
            name: "not_a_real_field".to_string(),
            kind: ItemKind::Post,
        };
        assert_eq!(
            err.to_string(),
            "Invalid filter: not_a_real_field not a Post attribute."
        );
    }

    #[test]
    fn test_assignment_message_names_variable() {
        let err = FilterError::Assignment {
            name: "x".to_string(),
        };
        assert!(err.to_string().contains("Modifying variables (x)"));
    }

    #[test]
    fn test_syntax_message_contains_offset_and_text() {
        let err = FilterError::syntax("likes >", 7, "unexpected end of expression");
        let msg = err.to_string();
        assert!(msg.contains("offset 7"));
        assert!(msg.contains("likes >"));
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = EvalError::TypeMismatch {
            op: "+",
            left: "int",
            right: "None",
        };
        assert_eq!(
            err.to_string(),
            "unsupported operand types for +: 'int' and 'None'"
        );
    }
}
