//! 数值比较
//!
//! i64/u64/f64 任意组合的三路比较。符号域与无符号域之间先做符号
//! 判定，再统一到公共域比较；与浮点数混合时提升为 f64。比较满足
//! 对称性：cmp(x, y) 与 cmp(y, x) 相反。

use super::mismatch;
use crate::ast::CmpOp;
use crate::error::EvalError;
use crate::value::Value;
use std::cmp::Ordering;

pub(crate) fn compare_number(
    left: &Value,
    op: CmpOp,
    right: &Value,
) -> Result<bool, EvalError> {
    match cmp_number(left, right) {
        Some(ordering) => {
            if op.is_ordering() || op == CmpOp::Eq || op == CmpOp::Ne {
                Ok(ordering_matches(ordering, op))
            } else {
                // 数值不支持 contains
                mismatch(left, op, right)
            }
        }
        None => mismatch(left, op, right),
    }
}

/// 三路比较；None 表示两侧不可比（任一侧不是数值）
pub(crate) fn cmp_number(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => Some(l.cmp(r)),
        (Value::Uint(l), Value::Uint(r)) => Some(l.cmp(r)),
        (Value::Float(l), Value::Float(r)) => l.partial_cmp(r),

        (Value::Int(l), Value::Uint(r)) => Some(cmp_signed_unsigned(*l, *r)),
        (Value::Uint(l), Value::Int(r)) => Some(cmp_signed_unsigned(*r, *l).reverse()),

        (Value::Int(l), Value::Float(r)) => (*l as f64).partial_cmp(r),
        (Value::Float(l), Value::Int(r)) => l.partial_cmp(&(*r as f64)),
        (Value::Uint(l), Value::Float(r)) => (*l as f64).partial_cmp(r),
        (Value::Float(l), Value::Uint(r)) => l.partial_cmp(&(*r as f64)),

        _ => None,
    }
}

/// 负的有符号值恒小于任何无符号值，其余在 u64 域比较
fn cmp_signed_unsigned(left: i64, right: u64) -> Ordering {
    if left < 0 {
        return Ordering::Less;
    }
    (left as u64).cmp(&right)
}

fn ordering_matches(ordering: Ordering, op: CmpOp) -> bool {
    match op {
        CmpOp::Eq => ordering == Ordering::Equal,
        CmpOp::Ne => ordering != Ordering::Equal,
        CmpOp::Gt => ordering == Ordering::Greater,
        CmpOp::Ge => ordering != Ordering::Less,
        CmpOp::Lt => ordering == Ordering::Less,
        CmpOp::Le => ordering != Ordering::Greater,
        CmpOp::Contains => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> Vec<Value> {
        vec![
            Value::Int(1),
            Value::Int(-1),
            Value::Int(i64::MAX),
            Value::Int(i64::MIN),
            Value::Uint(1),
            Value::Uint(0),
            Value::Uint(u64::MAX),
            Value::Float(1.0),
            Value::Float(-1.0),
            Value::Float(f64::MAX),
            Value::Float(f64::MIN_POSITIVE),
            Value::from("1"),
        ]
    }

    /// 参考实现：两侧都转 f64 再比较
    fn reference_cmp(x: &Value, y: &Value) -> Option<Ordering> {
        let as_f64 = |v: &Value| match v {
            Value::Int(n) => Some(*n as f64),
            Value::Uint(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        };
        as_f64(x)?.partial_cmp(&as_f64(y)?)
    }

    #[test]
    fn test_symmetry_and_f64_agreement() {
        for x in matrix() {
            for y in matrix() {
                let forward = cmp_number(&x, &y);
                let backward = cmp_number(&y, &x);
                assert_eq!(
                    forward,
                    backward.map(Ordering::reverse),
                    "asymmetry for {x:?} vs {y:?}"
                );
                assert_eq!(
                    forward,
                    reference_cmp(&x, &y),
                    "disagrees with f64 reference for {x:?} vs {y:?}"
                );

                // 两侧均为数值时必须可比
                if x.is_numeric() && y.is_numeric() {
                    assert!(forward.is_some(), "numeric pair incomparable: {x:?} {y:?}");
                }
            }
        }
    }

    #[test]
    fn test_negative_signed_less_than_unsigned() {
        assert_eq!(
            cmp_number(&Value::Int(-1), &Value::Uint(0)),
            Some(Ordering::Less)
        );
        assert_eq!(
            cmp_number(&Value::Uint(0), &Value::Int(-1)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            cmp_number(&Value::Int(i64::MIN), &Value::Uint(u64::MAX)),
            Some(Ordering::Less)
        );
    }

    #[test]
    fn test_cross_domain_equality_exact() {
        assert_eq!(
            cmp_number(&Value::Int(13), &Value::Uint(13)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            cmp_number(&Value::Uint(100), &Value::Float(100.0)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            cmp_number(&Value::Int(100), &Value::Float(100.0)),
            Some(Ordering::Equal)
        );
    }

    #[test]
    fn test_compare_number_ops() {
        assert!(compare_number(&Value::Int(100), CmpOp::Gt, &Value::Int(50)).unwrap());
        assert!(compare_number(&Value::Int(100), CmpOp::Ge, &Value::Int(100)).unwrap());
        assert!(compare_number(&Value::Int(50), CmpOp::Lt, &Value::Uint(100)).unwrap());
        assert!(compare_number(&Value::Float(1.2), CmpOp::Eq, &Value::Float(1.2)).unwrap());
        assert!(compare_number(&Value::Int(1), CmpOp::Ne, &Value::Int(2)).unwrap());
    }

    #[test]
    fn test_number_vs_string_not_coerced() {
        assert!(!compare_number(&Value::Int(1), CmpOp::Eq, &Value::from("1")).unwrap());
        assert!(compare_number(&Value::Int(1), CmpOp::Gt, &Value::from("1")).is_err());
    }
}
