//! 跨类型比较内核
//!
//! `compare(left, op, right)` 是唯一入口，按左值类型分派到各子模块。
//! 数组的成员语义、字符串到 IP/CIDR/MAC 的自动提升都在这里路由。
//! 元素级比较中的类型错误按不匹配处理，只有标量间的非法排序比较
//! 才上抛 Incomparable 错误。

mod boolean;
mod bytes;
mod ip;
mod mac;
mod number;
mod string;

use crate::ast::CmpOp;
use crate::debug;
use crate::error::EvalError;
use crate::value::Value;

/// 类型感知的比较。返回 Err 仅用于标量间未定义的操作
/// （如字符串排序比较）。
pub fn compare(left: &Value, op: CmpOp, right: &Value) -> Result<bool, EvalError> {
    let result = dispatch(left, op, right);

    if debug::enabled(1) {
        match &result {
            Ok(pass) => tracing::debug!(
                target: "rule_expr::compare",
                "cmp {pass:>5}: [{}] {} {} [{}] {}",
                left.type_name(),
                left,
                op,
                right.type_name(),
                right,
            ),
            Err(err) => tracing::debug!(
                target: "rule_expr::compare",
                "cmp error: [{}] {} {} [{}] {}: {err}",
                left.type_name(),
                left,
                op,
                right.type_name(),
                right,
            ),
        }
    }

    result
}

fn dispatch(left: &Value, op: CmpOp, right: &Value) -> Result<bool, EvalError> {
    // 右侧数组：对每个元素分别比较。contains 不支持右侧数组，
    // 成员判定走 in 操作符（它会交换两侧）。
    if let Value::Array(items) = right {
        if !matches!(left, Value::Array(_)) {
            if op == CmpOp::Contains {
                return Ok(false);
            }
            return Ok(any_element(items, op, |el, op| compare(left, op, el)));
        }
    }

    match left {
        Value::String(lv) => string::compare_string(lv, op, right),
        Value::Int(_) | Value::Uint(_) | Value::Float(_) => {
            number::compare_number(left, op, right)
        }
        Value::Bool(lv) => boolean::compare_bool(*lv, op, right),
        Value::Bytes(lv) => bytes::compare_bytes_left(lv, op, right),
        Value::Ip(lv) => ip::compare_ip(lv, op, right),
        Value::Cidr(lv) => ip::compare_cidr(lv, op, right),
        Value::Mac(lv) => mac::compare_mac(lv, op, right),
        Value::Array(items) => Ok(compare_slice(items, op, right)),
        Value::Regex(_) | Value::Map(_) => mismatch(left, op, right),
    }
}

/// 左侧数组的元素级语义：
/// - `!=`：没有任何元素相等
/// - `contains`：成员判定（不递归做子串匹配）
/// - 其余操作：任一元素满足即为真
fn compare_slice(items: &[Value], op: CmpOp, right: &Value) -> bool {
    match op {
        CmpOp::Ne => !compare_slice(items, CmpOp::Eq, right),
        CmpOp::Contains => compare_slice(items, CmpOp::Eq, right),
        _ => any_element(items, op, |el, op| compare(el, op, right)),
    }
}

fn any_element(
    items: &[Value],
    op: CmpOp,
    f: impl Fn(&Value, CmpOp) -> Result<bool, EvalError>,
) -> bool {
    items.iter().any(|el| f(el, op).unwrap_or(false))
}

/// 类型不匹配时的兜底语义：等值为假、不等为真，排序比较报错
pub(crate) fn mismatch(left: &Value, op: CmpOp, right: &Value) -> Result<bool, EvalError> {
    match op {
        CmpOp::Eq | CmpOp::Contains => Ok(false),
        CmpOp::Ne => Ok(true),
        _ => Err(incomparable(left, op, right)),
    }
}

pub(crate) fn incomparable(left: &Value, op: CmpOp, right: &Value) -> EvalError {
    EvalError::Incomparable {
        left: left.to_string(),
        left_type: left.type_name(),
        right_type: right.type_name(),
        operator: op.to_string(),
    }
}
