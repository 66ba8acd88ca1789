//! 字节串比较

use crate::ast::CmpOp;

/// 相等、不等与子串包含；其余操作返回 Err(()) 由调用方转成
/// Incomparable 错误。
pub(super) fn compare_bytes(left: &[u8], op: CmpOp, right: &[u8]) -> Result<bool, ()> {
    match op {
        CmpOp::Eq => Ok(left == right),
        CmpOp::Ne => Ok(left != right),
        CmpOp::Contains => Ok(contains_subsequence(left, right)),
        _ => Err(()),
    }
}

fn contains_subsequence(haystack: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}

/// 左值是字节串时的分派
pub(super) fn compare_bytes_left(
    left: &[u8],
    op: CmpOp,
    right: &crate::value::Value,
) -> Result<bool, crate::error::EvalError> {
    use crate::value::Value;

    let left_value = || Value::Bytes(left.to_vec());
    match right {
        Value::Bytes(rv) => {
            compare_bytes(left, op, rv).map_err(|_| super::incomparable(&left_value(), op, right))
        }
        Value::String(rv) => compare_bytes(left, op, rv.as_bytes())
            .map_err(|_| super::incomparable(&left_value(), op, right)),
        Value::Mac(rv) => compare_bytes(left, op, rv.as_bytes())
            .map_err(|_| super::incomparable(&left_value(), op, right)),
        _ => super::mismatch(&left_value(), op, right),
    }
}
