//! 规则语法树
//!
//! 扁平的节点枚举，子节点用 Arc 共享：节点一经构建不可变，残差
//! 规则可以直接复用原树的子树。每个节点支持求值（eval.rs）、
//! 规范文本打印（本文件）与结构化导出（export.rs）三种操作。

use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// 比较操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
}

impl CmpOp {
    /// 规范文本形式
    pub fn symbol(&self) -> &'static str {
        match self {
            CmpOp::Eq => "==",
            CmpOp::Ne => "!=",
            CmpOp::Gt => ">",
            CmpOp::Ge => ">=",
            CmpOp::Lt => "<",
            CmpOp::Le => "<=",
            CmpOp::Contains => "contains",
        }
    }

    /// 结构化导出中的短名
    pub fn word(&self) -> &'static str {
        match self {
            CmpOp::Eq => "eq",
            CmpOp::Ne => "ne",
            CmpOp::Gt => "gt",
            CmpOp::Ge => "ge",
            CmpOp::Lt => "lt",
            CmpOp::Le => "le",
            CmpOp::Contains => "contains",
        }
    }

    pub fn is_ordering(&self) -> bool {
        matches!(self, CmpOp::Gt | CmpOp::Ge | CmpOp::Lt | CmpOp::Le)
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// 语法树节点
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    And {
        left: Arc<Node>,
        right: Arc<Node>,
    },
    Or {
        left: Arc<Node>,
        right: Arc<Node>,
    },
    Not {
        expr: Arc<Node>,
    },
    Compare {
        left: Arc<Node>,
        op: CmpOp,
        right: Arc<Node>,
    },
    /// `=~` / `matches`
    Match {
        left: Arc<Node>,
        pattern: Arc<Node>,
    },
    /// `x in arr` 语义上等于 `arr contains x`
    In {
        left: Arc<Node>,
        right: Arc<Node>,
    },
    /// 按点号路径在求值期解析
    Field {
        name: String,
    },
    /// 保留原始文本用于回打印
    Literal {
        raw: String,
        value: Value,
    },
    Array {
        elems: Vec<Arc<Node>>,
    },
    Func {
        name: String,
        args: Vec<Arc<Node>>,
    },
}

impl Node {
    pub fn is_numeric_literal(&self) -> bool {
        matches!(
            self,
            Node::Literal { value, .. } if value.is_numeric()
        )
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::And { left, right } => write!(f, "({left} and {right})"),
            Node::Or { left, right } => write!(f, "({left} or {right})"),
            Node::Not { expr } => match &**expr {
                // 取反节点尽量还原成惯用写法
                Node::Compare {
                    left,
                    op: CmpOp::Eq,
                    right,
                } => write!(f, "{left} != {right}"),
                Node::Compare {
                    left,
                    op: CmpOp::Contains,
                    right,
                } => write!(f, "{left} not contains {right}"),
                Node::Match { left, pattern } => write!(f, "{left} not =~ {pattern}"),
                Node::In { left, right } => write!(f, "{left} not in {right}"),
                Node::Field { name } => write!(f, "!{name}"),
                other => write!(f, "not ({other})"),
            },
            Node::Compare { left, op, right } => write!(f, "{left} {op} {right}"),
            Node::Match { left, pattern } => write!(f, "{left} =~ {pattern}"),
            Node::In { left, right } => write!(f, "{left} in {right}"),
            Node::Field { name } => f.write_str(name),
            Node::Literal { raw, .. } => f.write_str(raw),
            Node::Array { elems } => {
                write!(f, "[")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                write!(f, "]")
            }
            Node::Func { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// 可求值的规则：根节点的包装，打印时去掉最外层括号
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    root: Option<Arc<Node>>,
}

impl Rule {
    pub(crate) fn from_node(root: Arc<Node>) -> Self {
        Self { root: Some(root) }
    }

    /// 函数结果等场景下没有关联的规则
    pub(crate) fn empty() -> Self {
        Self { root: None }
    }

    pub fn node(&self) -> Option<&Arc<Node>> {
        self.root.as_ref()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            None => f.write_str("<empty>"),
            Some(node) => {
                let s = node.to_string();
                // 根节点不需要最外层括号
                if let Some(stripped) = s.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
                    f.write_str(stripped)
                } else {
                    f.write_str(&s)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::must_parse;

    #[test]
    fn test_root_strips_outer_parens() {
        assert_eq!(
            must_parse("a == 1 and b == 2").to_string(),
            "a == 1 and b == 2"
        );
        assert_eq!(
            must_parse("(a == 1 or b == 2) and c").to_string(),
            "(a == 1 or b == 2) and c"
        );
        assert_eq!(must_parse("port == 8080").to_string(), "port == 8080");
    }

    #[test]
    fn test_symbolic_operators_normalize_to_words() {
        assert_eq!(must_parse("a && b || c").to_string(), "(a and b) or c");
    }

    #[test]
    fn test_matches_prints_as_tilde() {
        assert_eq!(
            must_parse(r"domain matches /example\.com$/").to_string(),
            r"domain =~ /example\.com$/"
        );
    }

    #[test]
    fn test_not_specializations() {
        assert_eq!(must_parse("not (a == 1)").to_string(), "a != 1");
        assert_eq!(
            must_parse("f not contains 'x'").to_string(),
            "f not contains 'x'"
        );
        assert_eq!(must_parse("f not in [1, 2]").to_string(), "f not in [1, 2]");
        assert_eq!(must_parse("f not =~ /x/").to_string(), "f not =~ /x/");
        assert_eq!(must_parse("!field").to_string(), "!field");
        assert_eq!(must_parse("not field").to_string(), "!field");
        assert_eq!(
            must_parse("not (a == 1 and b)").to_string(),
            "not ((a == 1 and b))"
        );
    }

    #[test]
    fn test_literal_raw_preserved() {
        assert_eq!(must_parse("f == 0x1F").to_string(), "f == 0x1F");
        assert_eq!(must_parse("f == 'text'").to_string(), "f == 'text'");
        assert_eq!(
            must_parse(r#"f == [1, "str", 3]"#).to_string(),
            r#"f == [1, "str", 3]"#
        );
    }

    #[test]
    fn test_rule_is_send_sync() {
        // 解析后的规则不可变，可以跨线程共享求值
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Rule>();
        assert_send_sync::<Node>();
    }

    #[test]
    fn test_func_printing() {
        assert_eq!(
            must_parse(r#"starts_with(url, "https://")"#).to_string(),
            r#"starts_with(url, "https://")"#
        );
    }
}
