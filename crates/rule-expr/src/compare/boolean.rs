//! 布尔比较：仅定义相等与不等

use super::mismatch;
use crate::ast::CmpOp;
use crate::error::EvalError;
use crate::value::Value;

pub(super) fn compare_bool(left: bool, op: CmpOp, right: &Value) -> Result<bool, EvalError> {
    match right {
        Value::Bool(rv) => match op {
            CmpOp::Eq => Ok(left == *rv),
            CmpOp::Ne => Ok(left != *rv),
            _ => mismatch(&Value::Bool(left), op, right),
        },
        _ => mismatch(&Value::Bool(left), op, right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bool_eq_ne() {
        assert!(compare_bool(true, CmpOp::Eq, &Value::Bool(true)).unwrap());
        assert!(compare_bool(false, CmpOp::Eq, &Value::Bool(false)).unwrap());
        assert!(compare_bool(true, CmpOp::Ne, &Value::Bool(false)).unwrap());
        assert!(!compare_bool(true, CmpOp::Eq, &Value::Bool(false)).unwrap());
    }

    #[test]
    fn test_bool_ordering_undefined() {
        assert!(compare_bool(true, CmpOp::Le, &Value::Bool(false)).is_err());
    }
}
