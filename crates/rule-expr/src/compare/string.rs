//! 字符串比较
//!
//! 字符串与正则按匹配处理；另一侧是 IP/CIDR/MAC 时先尽力把
//! 字符串提升为对应类型，失败则退回大小写不敏感的文本比较。

use super::{bytes, compare, mismatch};
use crate::ast::CmpOp;
use crate::error::EvalError;
use crate::value::{try_parse_typed, Value};
use regex::Regex;

pub(super) fn compare_string(
    left: &str,
    op: CmpOp,
    right: &Value,
) -> Result<bool, EvalError> {
    match right {
        Value::String(rv) => compare_string_string(left, op, rv),
        Value::Regex(rv) => compare_string_regex(left, op, rv),
        Value::Bytes(rv) => bytes::compare_bytes(left.as_bytes(), op, rv)
            .map_err(|_| super::incomparable(&Value::from(left), op, right)),
        Value::Ip(_) | Value::Cidr(_) | Value::Mac(_) => {
            // 自动类型提升
            match try_parse_typed(left) {
                Some(typed) => compare(&typed, op, right),
                None => compare_string_string(
                    &left.to_lowercase(),
                    op,
                    &right.to_string().to_lowercase(),
                ),
            }
        }
        _ => mismatch(&Value::from(left), op, right),
    }
}

fn compare_string_string(left: &str, op: CmpOp, right: &str) -> Result<bool, EvalError> {
    match op {
        CmpOp::Eq => Ok(left == right),
        CmpOp::Ne => Ok(left != right),
        CmpOp::Contains => Ok(left.contains(right)),
        _ => Err(super::incomparable(
            &Value::from(left),
            op,
            &Value::from(right),
        )),
    }
}

fn compare_string_regex(left: &str, op: CmpOp, right: &Regex) -> Result<bool, EvalError> {
    match op {
        CmpOp::Eq | CmpOp::Contains => Ok(right.is_match(left)),
        CmpOp::Ne => Ok(!right.is_match(left)),
        _ => Err(super::incomparable(
            &Value::from(left),
            op,
            &Value::Regex(right.clone()),
        )),
    }
}
