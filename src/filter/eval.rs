//! Evaluator for compiled filter expressions.
//!
//! Evaluation only reads item attributes; there is no environment to write to.

use std::cmp::Ordering;

use chrono::{Datelike, NaiveDate, Timelike};

use crate::item::Attributes;

use super::error::EvalError;
use super::parser::{BinaryOp, CompareOp, Expr, Member, UnaryOp};
use super::value::Value;

pub(crate) fn evaluate(expr: &Expr, item: &dyn Attributes) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Attribute(name) => item
            .attribute(name)
            .ok_or_else(|| EvalError::MissingAttribute {
                kind: item.kind(),
                name: name.clone(),
            }),
        Expr::Datetime(args) => {
            let values = args
                .iter()
                .map(|arg| evaluate(arg, item))
                .collect::<Result<Vec<_>, _>>()?;
            build_datetime(&values)
        }
        Expr::List(items) => items
            .iter()
            .map(|entry| evaluate(entry, item))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Expr::Member(target, member) => read_member(&evaluate(target, item)?, *member),
        Expr::Unary(op, operand) => unary(*op, evaluate(operand, item)?),
        Expr::Binary(op, left, right) => {
            let left = evaluate(left, item)?;
            let right = evaluate(right, item)?;
            binary(*op, &left, &right)
        }
        Expr::Compare(first, rest) => {
            let mut left = evaluate(first, item)?;
            for (op, operand) in rest {
                let right = evaluate(operand, item)?;
                if !compare(*op, &left, &right)? {
                    return Ok(Value::Bool(false));
                }
                left = right;
            }
            Ok(Value::Bool(true))
        }
        Expr::And(left, right) => {
            let left = evaluate(left, item)?;
            if left.is_truthy() {
                evaluate(right, item)
            } else {
                Ok(left)
            }
        }
        Expr::Or(left, right) => {
            let left = evaluate(left, item)?;
            if left.is_truthy() {
                Ok(left)
            } else {
                evaluate(right, item)
            }
        }
    }
}

fn build_datetime(values: &[Value]) -> Result<Value, EvalError> {
    let render = || {
        values
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut parts = [0_i64, 1, 1, 0, 0, 0];
    for (slot, value) in parts.iter_mut().zip(values) {
        *slot = value.as_i64().ok_or(EvalError::TypeMismatch {
            op: "datetime",
            left: "int",
            right: value.type_name(),
        })?;
    }

    let invalid = || EvalError::InvalidDatetime { args: render() };
    let year = i32::try_from(parts[0]).map_err(|_| invalid())?;
    let [month, day, hour, minute, second] = [parts[1], parts[2], parts[3], parts[4], parts[5]]
        .map(|part| u32::try_from(part).ok());
    let (Some(month), Some(day), Some(hour), Some(minute), Some(second)) =
        (month, day, hour, minute, second)
    else {
        return Err(invalid());
    };

    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(Value::DateTime)
        .ok_or_else(invalid)
}

fn read_member(value: &Value, member: Member) -> Result<Value, EvalError> {
    let Value::DateTime(stamp) = value else {
        return Err(EvalError::NoMember {
            type_name: value.type_name(),
            member: member.name().to_string(),
        });
    };
    let number = match member {
        Member::Year => i64::from(stamp.year()),
        Member::Month => i64::from(stamp.month()),
        Member::Day => i64::from(stamp.day()),
        Member::Hour => i64::from(stamp.hour()),
        Member::Minute => i64::from(stamp.minute()),
        Member::Second => i64::from(stamp.second()),
    };
    Ok(Value::Int(number))
}

fn unary(op: UnaryOp, operand: Value) -> Result<Value, EvalError> {
    match (op, &operand) {
        (UnaryOp::Not, _) => Ok(Value::Bool(!operand.is_truthy())),
        (UnaryOp::Neg, Value::Float(number)) => Ok(Value::Float(-number)),
        (UnaryOp::Pos, Value::Float(number)) => Ok(Value::Float(*number)),
        (UnaryOp::Neg, Value::Int(_) | Value::Bool(_)) => operand
            .as_i64()
            .and_then(i64::checked_neg)
            .map(Value::Int)
            .ok_or(EvalError::Overflow { op: "-" }),
        (UnaryOp::Pos, Value::Int(_) | Value::Bool(_)) => {
            Ok(operand.as_i64().map_or(Value::None, Value::Int))
        }
        (UnaryOp::Neg, _) => Err(EvalError::BadOperand {
            op: "-",
            operand: operand.type_name(),
        }),
        (UnaryOp::Pos, _) => Err(EvalError::BadOperand {
            op: "+",
            operand: operand.type_name(),
        }),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    let mismatch = || EvalError::TypeMismatch {
        op: op.symbol(),
        left: left.type_name(),
        right: right.type_name(),
    };

    match (op, left, right) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => return Ok(Value::Str(format!("{a}{b}"))),
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            return Ok(Value::List(a.iter().chain(b).cloned().collect()));
        }
        _ => {}
    }

    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        return integer_arithmetic(op, a, b);
    }

    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return Err(mismatch());
    };
    let value = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            (a / b).floor()
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a - b * (a / b).floor()
        }
    };
    Ok(Value::Float(value))
}

#[allow(clippy::cast_precision_loss)]
fn integer_arithmetic(op: BinaryOp, a: i64, b: i64) -> Result<Value, EvalError> {
    let overflow = || EvalError::Overflow { op: op.symbol() };
    let value = match op {
        BinaryOp::Add => a.checked_add(b).ok_or_else(overflow)?,
        BinaryOp::Sub => a.checked_sub(b).ok_or_else(overflow)?,
        BinaryOp::Mul => a.checked_mul(b).ok_or_else(overflow)?,
        BinaryOp::Div => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            return Ok(Value::Float(a as f64 / b as f64));
        }
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let quotient = a.checked_div(b).ok_or_else(overflow)?;
            if a % b != 0 && ((a < 0) != (b < 0)) {
                quotient - 1
            } else {
                quotient
            }
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(EvalError::DivisionByZero);
            }
            let remainder = a.checked_rem(b).ok_or_else(overflow)?;
            if remainder != 0 && ((remainder < 0) != (b < 0)) {
                remainder + b
            } else {
                remainder
            }
        }
    };
    Ok(Value::Int(value))
}

fn compare(op: CompareOp, left: &Value, right: &Value) -> Result<bool, EvalError> {
    match op {
        CompareOp::Eq => Ok(values_equal(left, right)),
        CompareOp::NotEq => Ok(!values_equal(left, right)),
        CompareOp::Is => Ok(is_same(left, right)),
        CompareOp::IsNot => Ok(!is_same(left, right)),
        CompareOp::In => contains(right, left, op),
        CompareOp::NotIn => contains(right, left, op).map(|found| !found),
        CompareOp::Lt | CompareOp::LtEq | CompareOp::Gt | CompareOp::GtEq => {
            let ordering = order(left, right).ok_or(EvalError::TypeMismatch {
                op: op.symbol(),
                left: left.type_name(),
                right: right.type_name(),
            })?;
            Ok(match op {
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::LtEq => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::DateTime(a), Value::DateTime(b)) => a == b,
        (Value::None, Value::None) => true,
        (Value::List(a), Value::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        _ => match (left.as_i64(), right.as_i64()) {
            (Some(a), Some(b)) => a == b,
            _ => match (left.as_f64(), right.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            },
        },
    }
}

/// Identity is only observable for the singletons `None`, `True` and `False`.
fn is_same(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        _ => false,
    }
}

fn contains(container: &Value, needle: &Value, op: CompareOp) -> Result<bool, EvalError> {
    match (container, needle) {
        (Value::List(items), _) => Ok(items.iter().any(|item| values_equal(item, needle))),
        (Value::Str(haystack), Value::Str(part)) => Ok(haystack.contains(part.as_str())),
        _ => Err(EvalError::TypeMismatch {
            op: op.symbol(),
            left: needle.type_name(),
            right: container.type_name(),
        }),
    }
}

fn order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        _ => match (left.as_i64(), right.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => left.as_f64()?.partial_cmp(&right.as_f64()?),
        },
    }
}
