//! Numeric promotion and binary arithmetic dispatch.
//!
//! One `binary_numeric(op, lhs, rhs)` function replaces a per-operator
//! cascade: callers already know both operands are numeric (the VM's
//! operand validation happens before calling in), so this only handles
//! promotion and the operator itself.

use std::cmp::Ordering;

use cinder_core::value::Value;

/// One of the binary numeric opcodes. `Mod` is intentionally not valid
/// for any promoted (Real, _) pair — modulo is defined only for
/// `(Int, Int)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

fn as_f64(v: Value) -> f64 {
    match v {
        Value::Int(i) => i as f64,
        Value::Real(r) => r,
        _ => unreachable!("as_f64 called on a non-numeric Value"),
    }
}

/// Apply `op` to two already-validated-numeric operands, promoting to
/// `Real`: `(Int, Int)` stays `Int` for `+ - * /`, `Int` for `%`, but
/// always `Real` for `^`; any pair involving a `Real` promotes both
/// operands to `Real`. Returns `Err` with the runtime-error message for
/// division/modulo by zero or a modulo with a non-integer operand.
pub fn binary_numeric(op: NumOp, lhs: Value, rhs: Value) -> Result<Value, String> {
    if let (Value::Int(a), Value::Int(b)) = (lhs, rhs) {
        return match op {
            NumOp::Add => Ok(Value::Int(a.wrapping_add(b))),
            NumOp::Sub => Ok(Value::Int(a.wrapping_sub(b))),
            NumOp::Mul => Ok(Value::Int(a.wrapping_mul(b))),
            NumOp::Div => {
                if b == 0 {
                    Err("Attempt to divide by zero.".to_string())
                } else {
                    Ok(Value::Int(a / b))
                }
            }
            NumOp::Mod => {
                if b == 0 {
                    Err("Attempt to divide by zero.".to_string())
                } else {
                    Ok(Value::Int(a % b))
                }
            }
            NumOp::Pow => Ok(Value::Real((a as f64).powf(b as f64))),
        };
    }

    if op == NumOp::Mod {
        return Err("Operands to '%' must both be integers.".to_string());
    }

    let (a, b) = (as_f64(lhs), as_f64(rhs));
    match op {
        NumOp::Add => Ok(Value::Real(a + b)),
        NumOp::Sub => Ok(Value::Real(a - b)),
        NumOp::Mul => Ok(Value::Real(a * b)),
        NumOp::Div => {
            if b == 0.0 {
                Err("Attempt to divide by zero.".to_string())
            } else {
                Ok(Value::Real(a / b))
            }
        }
        NumOp::Pow => Ok(Value::Real(a.powf(b))),
        NumOp::Mod => unreachable!("handled above"),
    }
}

/// Ordering for `GREATER`/`LESS`, with the same int/real promotion.
pub fn numeric_compare(lhs: Value, rhs: Value) -> Ordering {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a.cmp(&b),
        _ => as_f64(lhs).partial_cmp(&as_f64(rhs)).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_int_stays_int_for_basic_arithmetic() {
        assert_eq!(binary_numeric(NumOp::Add, Value::Int(2), Value::Int(3)).unwrap(), Value::Int(5));
        assert_eq!(binary_numeric(NumOp::Div, Value::Int(7), Value::Int(2)).unwrap(), Value::Int(3));
    }

    #[test]
    fn power_always_promotes_to_real() {
        let result = binary_numeric(NumOp::Pow, Value::Int(2), Value::Int(10)).unwrap();
        assert_eq!(result, Value::Real(1024.0));
    }

    #[test]
    fn any_real_operand_promotes_the_pair() {
        let result = binary_numeric(NumOp::Add, Value::Int(1), Value::Real(0.5)).unwrap();
        assert_eq!(result, Value::Real(1.5));
    }

    #[test]
    fn division_by_zero_is_an_error_for_both_tags() {
        assert!(binary_numeric(NumOp::Div, Value::Int(1), Value::Int(0)).is_err());
        assert!(binary_numeric(NumOp::Div, Value::Real(1.0), Value::Real(0.0)).is_err());
    }

    #[test]
    fn modulo_rejects_real_operands() {
        assert!(binary_numeric(NumOp::Mod, Value::Real(1.0), Value::Int(2)).is_err());
    }

    #[test]
    fn numeric_compare_promotes_mixed_tags() {
        assert_eq!(numeric_compare(Value::Int(3), Value::Real(3.5)), Ordering::Less);
    }
}
