//! 结构化语法树导出
//!
//! 每个节点导出为带 `node_type` 判别字段的语言无关树，供外部
//! 工具序列化与检视。字面量节点附带 `type` 标签标识值的类型。

use crate::ast::{Node, Rule};
use crate::value::{bytes_to_hex, Value};
use serde::Serialize;
use std::sync::Arc;

/// 语言无关的语法树节点
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node_type", rename_all = "lowercase")]
pub enum AstNode {
    Operator {
        operator: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        left: Option<Box<AstNode>>,
        right: Box<AstNode>,
    },
    Field {
        name: String,
    },
    Literal {
        #[serde(rename = "type")]
        literal_type: String,
        value: serde_json::Value,
    },
    Array {
        elements: Vec<AstNode>,
    },
    Function {
        name: String,
        args: Box<AstNode>,
    },
}

impl Rule {
    /// 根节点的结构化形式；空规则返回 None
    pub fn ast_node(&self) -> Option<AstNode> {
        self.node().map(|n| n.ast_node())
    }

    /// 序列化为 JSON 文本
    pub fn ast_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.ast_node())
    }
}

impl Node {
    pub fn ast_node(&self) -> AstNode {
        match self {
            Node::And { left, right } => operator("and", Some(left), right),
            Node::Or { left, right } => operator("or", Some(left), right),
            Node::Not { expr } => AstNode::Operator {
                operator: "not".to_string(),
                left: None,
                right: Box::new(expr.ast_node()),
            },
            Node::Compare { left, op, right } => operator(op.word(), Some(left), right),
            Node::Match { left, pattern } => operator("matches", Some(left), pattern),
            Node::In { left, right } => operator("in", Some(left), right),
            Node::Field { name } => AstNode::Field { name: name.clone() },
            Node::Literal { value, .. } => AstNode::Literal {
                literal_type: literal_type(value).to_string(),
                value: value_to_json(value),
            },
            Node::Array { elems } => AstNode::Array {
                elements: elems.iter().map(|e| e.ast_node()).collect(),
            },
            Node::Func { name, args } => AstNode::Function {
                name: name.clone(),
                args: Box::new(AstNode::Array {
                    elements: args.iter().map(|a| a.ast_node()).collect(),
                }),
            },
        }
    }
}

fn operator(op: &str, left: Option<&Arc<Node>>, right: &Arc<Node>) -> AstNode {
    AstNode::Operator {
        operator: op.to_string(),
        left: left.map(|n| Box::new(n.ast_node())),
        right: Box::new(right.ast_node()),
    }
}

/// 字面量的类型标签
fn literal_type(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "bool",
        Value::Int(_) => "int64",
        Value::Uint(_) => "uint64",
        Value::Float(_) => "float64",
        Value::String(_) => "string",
        // 语法树中的字节串只来自十六进制字面量
        Value::Bytes(_) => "hexstring",
        Value::Ip(_) => "ip",
        Value::Cidr(_) => "cidr",
        Value::Mac(_) => "mac",
        Value::Regex(_) => "regex",
        Value::Array(_) => "array",
        Value::Map(_) => "unknown",
    }
}

fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Bool(v) => serde_json::Value::from(*v),
        Value::Int(v) => serde_json::Value::from(*v),
        Value::Uint(v) => serde_json::Value::from(*v),
        Value::Float(v) => serde_json::Value::from(*v),
        Value::String(v) => serde_json::Value::from(v.clone()),
        Value::Bytes(v) => serde_json::Value::from(bytes_to_hex(v)),
        Value::Ip(v) => serde_json::Value::from(v.to_string()),
        Value::Cidr(v) => serde_json::Value::from(v.to_string()),
        Value::Mac(v) => serde_json::Value::from(v.to_string()),
        Value::Regex(v) => serde_json::Value::from(v.as_str()),
        Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(value_to_json).collect())
        }
        Value::Map(kv) => serde_json::Value::Object(
            kv.iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        ),
    }
}
