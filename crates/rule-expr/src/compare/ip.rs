//! IP 与 CIDR 比较
//!
//! IP 对 IP 按字节相等；IP 对 CIDR 的 ==/contains 均为网段包含，
//! != 为其取反，两个方向对称。

use super::{compare, mismatch};
use crate::ast::CmpOp;
use crate::error::EvalError;
use crate::value::{try_parse_typed, Cidr, Value};
use std::net::IpAddr;

pub(super) fn compare_ip(left: &IpAddr, op: CmpOp, right: &Value) -> Result<bool, EvalError> {
    match right {
        Value::Ip(rv) => match op {
            CmpOp::Eq => Ok(left == rv),
            CmpOp::Ne => Ok(left != rv),
            _ => mismatch(&Value::Ip(*left), op, right),
        },
        Value::Cidr(rv) => match op {
            CmpOp::Eq | CmpOp::Contains => Ok(rv.contains(left)),
            CmpOp::Ne => Ok(!rv.contains(left)),
            _ => mismatch(&Value::Ip(*left), op, right),
        },
        Value::String(rv) => match try_parse_typed(rv) {
            Some(typed) => compare(&Value::Ip(*left), op, &typed),
            None => compare(
                &Value::from(left.to_string().as_str()),
                op,
                &Value::from(rv.to_lowercase().as_str()),
            ),
        },
        _ => mismatch(&Value::Ip(*left), op, right),
    }
}

pub(super) fn compare_cidr(left: &Cidr, op: CmpOp, right: &Value) -> Result<bool, EvalError> {
    match right {
        Value::Ip(rv) => match op {
            CmpOp::Eq | CmpOp::Contains => Ok(left.contains(rv)),
            CmpOp::Ne => Ok(!left.contains(rv)),
            _ => mismatch(&Value::Cidr(*left), op, right),
        },
        Value::Cidr(rv) => match op {
            CmpOp::Eq => Ok(left == rv),
            CmpOp::Ne => Ok(left != rv),
            _ => mismatch(&Value::Cidr(*left), op, right),
        },
        Value::String(rv) => match try_parse_typed(rv) {
            Some(typed) => compare(&Value::Cidr(*left), op, &typed),
            None => compare(
                &Value::from(left.to_string().as_str()),
                op,
                &Value::from(rv.to_lowercase().as_str()),
            ),
        },
        _ => mismatch(&Value::Cidr(*left), op, right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[test]
    fn test_ip_vs_ip() {
        assert!(compare_ip(&ip("192.168.1.1"), CmpOp::Eq, &Value::Ip(ip("192.168.1.1"))).unwrap());
        assert!(compare_ip(&ip("192.168.1.2"), CmpOp::Ne, &Value::Ip(ip("192.168.1.1"))).unwrap());
        assert!(compare_ip(&ip("::1"), CmpOp::Eq, &Value::Ip(ip("::1"))).unwrap());
    }

    #[test]
    fn test_ip_vs_cidr_symmetry() {
        let cidr = Cidr::parse("192.168.0.0/16").unwrap();
        assert!(compare_ip(&ip("192.168.100.1"), CmpOp::Eq, &Value::Cidr(cidr)).unwrap());
        assert!(compare_cidr(&cidr, CmpOp::Eq, &Value::Ip(ip("192.168.100.1"))).unwrap());
        assert!(compare_cidr(&cidr, CmpOp::Contains, &Value::Ip(ip("192.168.100.1"))).unwrap());
        assert!(compare_ip(&ip("172.16.0.1"), CmpOp::Ne, &Value::Cidr(cidr)).unwrap());
    }

    #[test]
    fn test_ip_vs_string() {
        assert!(
            compare_ip(&ip("192.168.1.1"), CmpOp::Eq, &Value::from("192.168.1.1")).unwrap()
        );
        assert!(!compare_ip(&ip("192.168.1.1"), CmpOp::Eq, &Value::from("10.0.0.1")).unwrap());
    }

    #[test]
    fn test_ip_ordering_undefined() {
        assert!(compare_ip(&ip("1.1.1.1"), CmpOp::Lt, &Value::Ip(ip("2.2.2.2"))).is_err());
    }
}
