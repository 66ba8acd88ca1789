//! 表达式规则引擎
//!
//! 把人类可读的布尔规则解析成语法树，再针对调用方提供的 KV 上
//! 下文反复求值，用于网络/安全过滤、特性开关、日志路由等场景。
//!
//! ```
//! use rule_expr::{parse, Ctx, Kv, Value};
//!
//! let rule = parse(r#"domain matches /example\.com$/ and port == 8080"#).unwrap();
//!
//! let ctx = Ctx::new(Kv::from([
//!     ("domain", Value::from("www.example.com")),
//!     ("port", Value::from(8080i64)),
//! ]));
//! assert!(rule.eval(&ctx).pass());
//! ```
//!
//! 支持的操作符：`== != > >= < <=`（及单词形式 `eq ne gt ge lt le`）、
//! `contains`、`matches`（`=~`）、`in`，布尔组合 `and or not`
//! （`&& || !`），括号分组。值类型包括布尔、数值（i64/u64/f64）、
//! 字符串、十六进制串、IP、CIDR、MAC 与正则。
//!
//! 求值结果携带三元状态（pass / fail / 未决）与残差规则：缺失字
//! 段不会使整棵树失败，调用方可以在补充字段后拿残差继续求值。

pub mod ast;
pub mod compare;
pub mod context;
pub mod debug;
pub mod error;
pub mod eval;
pub mod export;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod set;
pub mod token;
pub mod value;

pub use ast::{CmpOp, Node, Rule};
pub use compare::compare;
pub use context::{Ctx, Kv};
pub use debug::{debug_level, set_debug_level};
pub use error::{EvalError, ParseError, ValueParseError};
pub use eval::EvalResult;
pub use export::AstNode;
pub use functions::{FnArgs, Function, FunctionArg};
pub use parser::{must_parse, parse};
pub use set::Set;
pub use value::{Cidr, Mac, Value};
