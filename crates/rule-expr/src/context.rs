//! 求值上下文
//!
//! Ctx 聚合三张表：字段 KV、宏（预解析的子规则）、用户函数。
//! KV 是语义化的 string → Value 映射，支持点号路径查找。

use crate::ast::Rule;
use crate::error::EvalError;
use crate::functions::{stdlib, Function};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;

/// 字段映射
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Kv(HashMap<String, Value>);

impl Kv {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// 字面键查找，不做路径展开
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// 点号路径查找。`a.b.c` 先按字面键匹配，未命中再从最左边的
    /// 点切开、递归进入子 Map；同层上字面键优先。
    pub fn lookup_path(&self, key: &str) -> Option<&Value> {
        let mut current = self;
        let mut rest = key;

        loop {
            if let Some(val) = current.0.get(rest) {
                return Some(val);
            }

            let idx = rest.find('.')?;
            let (head, tail) = (&rest[..idx], &rest[idx + 1..]);

            match current.0.get(head)? {
                Value::Map(sub) => {
                    current = sub;
                    rest = tail;
                }
                _ => return None,
            }
        }
    }
}

impl<const N: usize> From<[(&str, Value); N]> for Kv {
    fn from(entries: [(&str, Value); N]) -> Self {
        Self(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }
}

impl FromIterator<(String, Value)> for Kv {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<HashMap<String, Value>> for Kv {
    fn from(map: HashMap<String, Value>) -> Self {
        Self(map)
    }
}

impl fmt::Display for Kv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 键按序输出，便于日志比对
        let mut keys: Vec<&String> = self.0.keys().collect();
        keys.sort();
        write!(f, "{{")?;
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key}: {}", self.0[*key])?;
        }
        write!(f, "}}")
    }
}

/// 一次求值的完整上下文
#[derive(Debug, Clone, Default)]
pub struct Ctx {
    pub kv: Kv,
    pub macros: HashMap<String, Rule>,
    pub functions: HashMap<String, Function>,
}

impl Ctx {
    pub fn new(kv: Kv) -> Self {
        Self {
            kv,
            ..Default::default()
        }
    }

    pub fn with_macro(mut self, name: impl Into<String>, rule: Rule) -> Self {
        self.macros.insert(name.into(), rule);
        self
    }

    pub fn with_function(mut self, name: impl Into<String>, function: Function) -> Self {
        self.functions.insert(name.into(), function);
        self
    }

    /// 首次求值前的上下文合法性检查：
    /// 用户函数不得遮蔽标准库，宏不得遮蔽标准库或用户函数。
    pub fn validate(&self) -> Result<(), EvalError> {
        for name in self.functions.keys() {
            if stdlib().contains_key(name.as_str()) {
                return Err(EvalError::InvalidContext(format!(
                    "function {name:?}: name conflicts with a stdlib function"
                )));
            }
        }
        for name in self.macros.keys() {
            if stdlib().contains_key(name.as_str()) {
                return Err(EvalError::InvalidContext(format!(
                    "macro {name:?}: name conflicts with a stdlib function"
                )));
            }
            if self.functions.contains_key(name) {
                return Err(EvalError::InvalidContext(format!(
                    "macro {name:?}: name conflicts with a custom function"
                )));
            }
        }
        Ok(())
    }

    pub fn eval(&self, rule: &Rule) -> crate::eval::EvalResult {
        rule.eval(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::FnArgs;
    use crate::must_parse;

    fn nested_kv() -> Kv {
        let mut process = Kv::new();
        process.insert("name", "nginx");
        process.insert("path", "/usr/bin/nginx");

        let mut src = Kv::new();
        src.insert("trusted", true);
        src.insert("process", process);

        let mut dst = Kv::new();
        dst.insert("host", "192.168.1.1");
        dst.insert("port", 8080i64);

        let mut nested = Kv::new();
        nested.insert("part.of.the.key", "period");

        let mut kv = Kv::new();
        kv.insert("part.of.the.key", "period");
        kv.insert("nested", nested);
        kv.insert("src", src);
        kv.insert("dst", dst);
        kv
    }

    #[test]
    fn test_lookup_path() {
        let kv = nested_kv();

        for (key, want) in [
            ("part.of.the.key", Some(Value::from("period"))),
            ("nested.part.of.the.key", Some(Value::from("period"))),
            ("src.process.name", Some(Value::from("nginx"))),
            ("src.process.path", Some(Value::from("/usr/bin/nginx"))),
            ("src.process.path.idk", None),
            ("src.trusted", Some(Value::from(true))),
            ("src.trusted.idk", None),
            ("dst.host", Some(Value::from("192.168.1.1"))),
            ("dst.port", Some(Value::from(8080i64))),
            ("missing", None),
        ] {
            assert_eq!(kv.lookup_path(key), want.as_ref(), "key: {key}");
        }
    }

    #[test]
    fn test_lookup_path_returns_submap() {
        let kv = nested_kv();
        match kv.lookup_path("src.process") {
            Some(Value::Map(sub)) => assert_eq!(sub.len(), 2),
            other => panic!("expected sub-map, got {other:?}"),
        }
    }

    #[test]
    fn test_literal_key_wins_over_descent() {
        let mut inner = Kv::new();
        inner.insert("b", "nested");

        let mut kv = Kv::new();
        kv.insert("a.b", "flat");
        kv.insert("a", inner);

        assert_eq!(kv.lookup_path("a.b"), Some(&Value::from("flat")));
    }

    #[test]
    fn test_validate_function_shadows_stdlib() {
        let ctx = Ctx::default().with_function(
            "starts_with",
            Function::new(&["value"], |_: &FnArgs| crate::eval::EvalResult::value(Value::Bool(true))),
        );

        let err = ctx.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "function \"starts_with\": name conflicts with a stdlib function"
        );
    }

    #[test]
    fn test_validate_macro_shadows_stdlib() {
        let ctx = Ctx::default().with_macro("index", must_parse("1 == 1"));
        let err = ctx.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "macro \"index\": name conflicts with a stdlib function"
        );
    }

    #[test]
    fn test_validate_macro_shadows_function() {
        let ctx = Ctx::default()
            .with_function(
                "my_fn",
                Function::new(&["value"], |_: &FnArgs| {
                    crate::eval::EvalResult::value(Value::Bool(true))
                }),
            )
            .with_macro("my_fn", must_parse("1 == 1"));

        let err = ctx.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "macro \"my_fn\": name conflicts with a custom function"
        );
    }

    #[test]
    fn test_validate_ok() {
        let ctx = Ctx::default()
            .with_macro("is_admin", must_parse("uid == 0"))
            .with_function(
                "double",
                Function::new(&["n"], |args: &FnArgs| {
                    match args.int("n") {
                        Ok(n) => crate::eval::EvalResult::value(Value::Int(n * 2)),
                        Err(e) => crate::eval::EvalResult::error(e),
                    }
                }),
            );
        assert!(ctx.validate().is_ok());
    }
}
