//! 错误类型定义
//!
//! 解析错误带位置信息与修复建议，求值错误通过 thiserror 建模。
//! 缺失字段错误携带字段集合，在布尔组合下按并集合并。

use crate::set::Set;
use std::fmt;
use thiserror::Error;

/// 语法解析错误
///
/// 格式化输出固定为：
/// `syntax error at line L:C:` + 出错行 + 插入符 + 消息 + 可选建议。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub input: String,
    pub suggestion: Option<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let error_line = self
            .input
            .lines()
            .nth(self.line.saturating_sub(1))
            .unwrap_or("");

        write!(
            f,
            "syntax error at line {}:{}:\n{}",
            self.line, self.column, error_line
        )?;

        if !error_line.is_empty() {
            write!(f, "\n{}^", " ".repeat(self.column.saturating_sub(1)))?;
        }

        if !self.message.is_empty() {
            write!(f, "\n{}", self.message)?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nsuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ParseError {}

/// 字面量无法按声明的类型解释
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueParseError {
    /// 类型名（如 "string"、"integer"）
    pub kind: &'static str,
    pub raw: String,
    pub cause: String,
}

impl ValueParseError {
    pub fn new(kind: &'static str, raw: impl Into<String>, cause: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
            cause: cause.into(),
        }
    }

    /// 按出错的字面量类型给出修复建议
    pub fn suggestion(&self) -> Option<String> {
        let text = match self.kind {
            "string" => "string values must be properly quoted with matching quotes (e.g. \"hello\")",
            "integer" => "integer values must be valid integers without decimals (e.g. 42)",
            "float" => "floating-point numbers must be in the format 1.23",
            "boolean" => "boolean values must be either 'true' or 'false' (case insensitive)",
            "IP" => "IP addresses must be in valid IPv4 (e.g. 192.168.1.1) or IPv6 format",
            "CIDR" => "CIDR blocks must be in valid format (e.g. 192.168.1.0/24)",
            "hex string" => "hex strings must contain valid hex digits optionally separated by colons",
            "regex" => "regex patterns must be surrounded by / or | and contain valid regex syntax",
            "field" => "field names must be valid identifiers (e.g. 'field_name' or 'field.name')",
            _ => return None,
        };
        Some(text.to_string())
    }
}

impl fmt::Display for ValueParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "parsing {} value {:?}: {}",
            self.kind, self.raw, self.cause
        )
    }
}

impl std::error::Error for ValueParseError {}

/// 求值错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EvalError {
    /// 规则引用的字段在上下文中不存在
    #[error("missing fields: {0}")]
    MissingFields(Set<String>),

    /// 不兼容类型之间的比较
    #[error("incompatible types: cannot compare {left} [{left_type}] to a {right_type} value using {operator}")]
    Incomparable {
        left: String,
        left_type: &'static str,
        right_type: &'static str,
        operator: String,
    },

    /// 未注册的函数调用
    #[error("unknown function {0:?}")]
    UnknownFunction(String),

    /// 函数参数或执行错误
    #[error("{0}")]
    Function(String),

    /// Ctx::validate 检出的非法上下文
    #[error("{0}")]
    InvalidContext(String),

    /// 多个分支的错误合并
    #[error("{}", join_errors(.0))]
    Multiple(Vec<EvalError>),
}

impl EvalError {
    /// 单字段缺失
    pub fn missing_field(name: impl Into<String>) -> Self {
        Self::MissingFields(Set::from_item(name.into()))
    }

    /// 不可比较错误以左值的打印形式报告；比较内核里只知道值本身，
    /// 节点层再把左侧替换为表达式文本。
    pub(crate) fn with_left_name(self, name: &str) -> Self {
        match self {
            Self::Incomparable {
                left_type,
                right_type,
                operator,
                ..
            } => Self::Incomparable {
                left: name.to_string(),
                left_type,
                right_type,
                operator,
            },
            other => other,
        }
    }

    /// 合并两个可选错误：缺失字段按并集合并，其余错误并列保留
    pub(crate) fn coalesce(a: Option<EvalError>, b: Option<EvalError>) -> Option<EvalError> {
        let mut missing: Set<String> = Set::new();
        let mut others: Vec<EvalError> = Vec::new();

        for err in [a, b].into_iter().flatten() {
            collect(err, &mut missing, &mut others);
        }

        if !missing.is_empty() {
            others.push(EvalError::MissingFields(missing));
        }

        match others.len() {
            0 => None,
            1 => Some(others.into_iter().next().expect("len checked")),
            _ => Some(EvalError::Multiple(others)),
        }
    }
}

fn collect(err: EvalError, missing: &mut Set<String>, others: &mut Vec<EvalError>) {
    match err {
        EvalError::MissingFields(fields) => missing.merge(fields),
        EvalError::Multiple(list) => {
            for e in list {
                collect(e, missing, others);
            }
        }
        other => others.push(other),
    }
}

fn join_errors(errors: &[EvalError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_format() {
        let err = ParseError {
            line: 1,
            column: 14,
            message: "function \"starts_with\" expects 2 arguments, got 0".to_string(),
            input: "starts_with()".to_string(),
            suggestion: None,
        };

        assert_eq!(
            err.to_string(),
            "syntax error at line 1:14:\nstarts_with()\n             ^\nfunction \"starts_with\" expects 2 arguments, got 0"
        );
    }

    #[test]
    fn test_parse_error_with_suggestion() {
        let err = ParseError {
            line: 1,
            column: 1,
            message: "".to_string(),
            input: "??".to_string(),
            suggestion: Some("remove the stray symbol".to_string()),
        };

        assert_eq!(
            err.to_string(),
            "syntax error at line 1:1:\n??\n^\nsuggestion: remove the stray symbol"
        );
    }

    #[test]
    fn test_value_parse_error_display() {
        let err = ValueParseError::new("boolean", "yes", "unknown value \"yes\"");
        assert_eq!(
            err.to_string(),
            "parsing boolean value \"yes\": unknown value \"yes\""
        );
        assert!(err.suggestion().unwrap().contains("'true' or 'false'"));
    }

    #[test]
    fn test_unknown_function_display() {
        let err = EvalError::UnknownFunction("unknown_fn".to_string());
        assert_eq!(err.to_string(), "unknown function \"unknown_fn\"");
    }

    #[test]
    fn test_coalesce_missing_fields_union() {
        let a = EvalError::missing_field("user");
        let b = EvalError::missing_field("dst.port");

        match EvalError::coalesce(Some(a), Some(b)) {
            Some(EvalError::MissingFields(fields)) => {
                assert_eq!(fields.items(), vec!["dst.port".to_string(), "user".to_string()]);
            }
            other => panic!("expected merged missing fields, got {other:?}"),
        }
    }

    #[test]
    fn test_coalesce_mixed_errors() {
        let a = EvalError::missing_field("f");
        let b = EvalError::Function("index 10 out of bounds".to_string());

        match EvalError::coalesce(Some(a), Some(b)) {
            Some(EvalError::Multiple(list)) => assert_eq!(list.len(), 2),
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }

    #[test]
    fn test_coalesce_none() {
        assert_eq!(EvalError::coalesce(None, None), None);
    }
}
