//! 硬件地址比较

use super::{bytes, compare, mismatch};
use crate::ast::CmpOp;
use crate::error::EvalError;
use crate::value::{try_parse_typed, Mac, Value};

pub(super) fn compare_mac(left: &Mac, op: CmpOp, right: &Value) -> Result<bool, EvalError> {
    match right {
        Value::Mac(rv) => bytes::compare_bytes(left.as_bytes(), op, rv.as_bytes())
            .map_err(|_| super::incomparable(&Value::Mac(left.clone()), op, right)),
        // 十六进制字面量按原始字节比较
        Value::Bytes(rv) => bytes::compare_bytes(left.as_bytes(), op, rv)
            .map_err(|_| super::incomparable(&Value::Mac(left.clone()), op, right)),
        Value::String(rv) => match try_parse_typed(rv) {
            Some(typed) => compare(&Value::Mac(left.clone()), op, &typed),
            None => compare(
                &Value::from(left.to_string().as_str()),
                op,
                &Value::from(rv.to_lowercase().as_str()),
            ),
        },
        _ => mismatch(&Value::Mac(left.clone()), op, right),
    }
}
