//! 语法分析器
//!
//! 递归下降实现，优先级从低到高：or、and、not、比较/匹配/成员、
//! 括号。字面量在解析期完成类型化；标准库函数在解析期校验参数
//! 个数。错误携带字节偏移，渲染为 行:列 + 出错行 + 插入符。

use crate::ast::{CmpOp, Node, Rule};
use crate::error::{ParseError, ValueParseError};
use crate::functions::stdlib;
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};
use crate::value::{self, try_parse_typed, Value};
use regex::Regex;
use std::net::IpAddr;
use std::sync::Arc;

/// 解析规则表达式
pub fn parse(input: &str) -> Result<Rule, ParseError> {
    Parser::new(input).parse_rule()
}

/// 解析失败即 panic，用于静态规则串
pub fn must_parse(input: &str) -> Rule {
    match parse(input) {
        Ok(rule) => rule,
        Err(err) => panic!("{err}"),
    }
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            tokens: Lexer::new(src).tokenize(),
            pos: 0,
        }
    }

    fn parse_rule(mut self) -> Result<Rule, ParseError> {
        let root = self.parse_or()?;

        match self.current().kind {
            TokenKind::Eof => Ok(Rule::from_node(root)),
            _ => Err(self.unexpected()),
        }
    }

    fn current(&self) -> &Token {
        // 词法单元流以 Eof 或 Error 结尾，流尾等价于 Eof
        self.tokens.get(self.pos).unwrap_or_else(|| {
            self.tokens.last().expect("token stream is never empty")
        })
    }

    fn bump(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.current().kind == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    // ---- 表达式层级 ----

    fn parse_or(&mut self) -> Result<Arc<Node>, ParseError> {
        let mut left = self.parse_and()?;
        while self.eat(TokenKind::Or) {
            let right = self.parse_and()?;
            left = Arc::new(Node::Or { left, right });
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Arc<Node>, ParseError> {
        let mut left = self.parse_unary()?;
        while self.eat(TokenKind::And) {
            let right = self.parse_unary()?;
            left = Arc::new(Node::And { left, right });
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Arc<Node>, ParseError> {
        if self.eat(TokenKind::Not) {
            let expr = self.parse_unary()?;
            return Ok(Arc::new(Node::Not { expr }));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<Arc<Node>, ParseError> {
        if self.eat(TokenKind::LParen) {
            let expr = self.parse_or()?;
            if !self.eat(TokenKind::RParen) {
                return Err(self.unexpected_with(&[TokenKind::RParen]));
            }
            return Ok(expr);
        }

        let left = self.parse_atom()?;

        // `field not op value` 形式的中缀取反
        let negate = self.eat(TokenKind::Not);

        let node = match self.current().kind {
            TokenKind::Matches => {
                self.bump();
                if self.current().kind != TokenKind::Regex {
                    return Err(self.unexpected_with(&[TokenKind::Regex]));
                }
                let pattern = self.parse_atom()?;
                Arc::new(Node::Match { left, pattern })
            }
            TokenKind::In => {
                self.bump();
                let right = self.parse_atom()?;
                Arc::new(Node::In { left, right })
            }
            kind => match cmp_op(kind) {
                Some(op) => {
                    self.bump();
                    let rhs_token = self.current().clone();
                    let right = self.parse_atom()?;

                    // 排序比较至少要有一侧是数值字面量
                    if op.is_ordering()
                        && !left.is_numeric_literal()
                        && !right.is_numeric_literal()
                    {
                        return Err(self.err_at(
                            rhs_token.pos,
                            format!(
                                "syntax error: unexpected {}, expecting \"integer\" or \"float\"",
                                rhs_token.kind.describe()
                            ),
                            None,
                        ));
                    }
                    Arc::new(Node::Compare { left, op, right })
                }
                None => {
                    if negate {
                        return Err(self.unexpected());
                    }
                    return Ok(left);
                }
            },
        };

        Ok(if negate {
            Arc::new(Node::Not { expr: node })
        } else {
            node
        })
    }

    // ---- 原子 ----

    fn parse_atom(&mut self) -> Result<Arc<Node>, ParseError> {
        match self.current().kind {
            TokenKind::String
            | TokenKind::Int
            | TokenKind::Float
            | TokenKind::Bool
            | TokenKind::Ip
            | TokenKind::IpCidr
            | TokenKind::HexString
            | TokenKind::Regex => {
                let token = self.bump();
                self.literal_from_token(&token)
            }
            TokenKind::LBracket => self.parse_array(),
            TokenKind::Field => {
                let token = self.bump();
                if self.current().kind == TokenKind::LParen {
                    self.parse_func_call(token.raw)
                } else {
                    Ok(Arc::new(Node::Field { name: token.raw }))
                }
            }
            _ => Err(self.unexpected()),
        }
    }

    fn parse_array(&mut self) -> Result<Arc<Node>, ParseError> {
        self.bump(); // '['
        let mut elems = Vec::new();

        loop {
            if self.current().kind == TokenKind::LBracket {
                return Err(self.err_at(
                    self.current().pos,
                    "nested arrays are not allowed".to_string(),
                    None,
                ));
            }
            elems.push(self.parse_atom()?);

            if self.eat(TokenKind::Comma) {
                // 不允许尾随逗号
                if self.current().kind == TokenKind::RBracket {
                    return Err(self.unexpected());
                }
                continue;
            }
            if self.eat(TokenKind::RBracket) {
                return Ok(Arc::new(Node::Array { elems }));
            }
            return Err(self.unexpected_with(&[TokenKind::Comma, TokenKind::RBracket]));
        }
    }

    fn parse_func_call(&mut self, name: String) -> Result<Arc<Node>, ParseError> {
        self.bump(); // '('
        let mut args = Vec::new();

        if !self.eat(TokenKind::RParen) {
            loop {
                args.push(self.parse_atom()?);
                if self.eat(TokenKind::Comma) {
                    continue;
                }
                if self.eat(TokenKind::RParen) {
                    break;
                }
                return Err(self.unexpected_with(&[TokenKind::Comma, TokenKind::RParen]));
            }
        }

        // 标准库函数在解析期校验参数个数；未知函数留到求值期处理
        if let Some(function) = stdlib().get(name.as_str()) {
            if args.len() != function.arity() {
                return Err(self.err_at(
                    self.current().pos,
                    format!(
                        "function {name:?} expects {} arguments, got {}",
                        function.arity(),
                        args.len()
                    ),
                    None,
                ));
            }
        }

        Ok(Arc::new(Node::Func { name, args }))
    }

    /// 把值字面量词法单元转换为类型化的 Literal 节点
    fn literal_from_token(&self, token: &Token) -> Result<Arc<Node>, ParseError> {
        let raw = token.raw.clone();
        let value = match token.kind {
            TokenKind::Int => Value::parse_int(&raw).map_err(|e| self.value_err(token, e))?,
            TokenKind::Float => Value::parse_float(&raw).map_err(|e| self.value_err(token, e))?,
            TokenKind::Bool => Value::parse_bool(&raw).map_err(|e| self.value_err(token, e))?,
            TokenKind::String => {
                let unquoted =
                    value::unquote(&raw).map_err(|e| self.value_err(token, e))?;
                // 引号内的 IP/CIDR/MAC 在解析期完成类型提升
                try_parse_typed(&unquoted).unwrap_or(Value::String(unquoted))
            }
            TokenKind::Ip => raw.parse::<IpAddr>().map(Value::Ip).map_err(|_| {
                self.value_err(token, format!("invalid IP value {raw:?}"))
            })?,
            TokenKind::IpCidr => value::Cidr::parse(&raw)
                .map(Value::Cidr)
                .map_err(|e| self.value_err(token, e))?,
            TokenKind::HexString => {
                Value::parse_hex(&raw).map_err(|e| self.value_err(token, e))?
            }
            TokenKind::Regex => {
                let inner = &raw[1..raw.len() - 1];
                Regex::new(inner)
                    .map(Value::Regex)
                    .map_err(|e| self.value_err(token, e.to_string()))?
            }
            _ => return Err(self.unexpected()),
        };

        Ok(Arc::new(Node::Literal { raw, value }))
    }

    // ---- 错误构造 ----

    fn value_err(&self, token: &Token, cause: String) -> ParseError {
        let vpe = ValueParseError::new(token.kind.value_kind(), token.raw.clone(), cause);
        let suggestion = vpe.suggestion();
        self.err_at(token.pos, vpe.to_string(), suggestion)
    }

    fn unexpected(&self) -> ParseError {
        let token = self.current();
        self.err_at(
            token.pos,
            format!("syntax error: unexpected {}", token.kind.describe()),
            None,
        )
    }

    fn unexpected_with(&self, expected: &[TokenKind]) -> ParseError {
        let token = self.current();
        let expected = expected
            .iter()
            .map(|k| k.describe())
            .collect::<Vec<_>>()
            .join(" or ");
        self.err_at(
            token.pos,
            format!(
                "syntax error: unexpected {}, expecting {expected}",
                token.kind.describe()
            ),
            None,
        )
    }

    fn err_at(&self, pos: usize, message: String, suggestion: Option<String>) -> ParseError {
        let (line, column) = line_column(self.src, pos);
        ParseError {
            line,
            column,
            message,
            input: self.src.to_string(),
            suggestion,
        }
    }
}

fn cmp_op(kind: TokenKind) -> Option<CmpOp> {
    match kind {
        TokenKind::Eq => Some(CmpOp::Eq),
        TokenKind::Ne => Some(CmpOp::Ne),
        TokenKind::Gt => Some(CmpOp::Gt),
        TokenKind::Ge => Some(CmpOp::Ge),
        TokenKind::Lt => Some(CmpOp::Lt),
        TokenKind::Le => Some(CmpOp::Le),
        TokenKind::Contains => Some(CmpOp::Contains),
        _ => None,
    }
}

/// 字节偏移换算为 1 基的行列号
fn line_column(input: &str, pos: usize) -> (usize, usize) {
    let pos = pos.min(input.len());
    let before = &input[..pos];
    let line = before.matches('\n').count() + 1;
    let column = pos - before.rfind('\n').map(|i| i + 1).unwrap_or(0) + 1;
    (line, column)
}
