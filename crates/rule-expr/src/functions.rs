//! 函数模型与标准库函数
//!
//! 函数按声明的参数名接收命名参数表。解析期对标准库函数做参数
//! 个数校验；用户函数与宏在求值期按 标准库 → 用户函数 → 宏 的
//! 顺序解析。

use crate::error::EvalError;
use crate::eval::EvalResult;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// 函数形参
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionArg {
    pub name: String,
}

/// 已求值的实参，按形参名索引
#[derive(Debug, Clone, Default)]
pub struct FnArgs {
    entries: Vec<(String, Value)>,
}

impl FnArgs {
    pub fn new(entries: Vec<(String, Value)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(arg, _)| arg == name)
            .map(|(_, v)| v)
    }

    /// 任意类型实参
    pub fn any(&self, name: &str) -> Result<&Value, EvalError> {
        self.get(name)
            .ok_or_else(|| EvalError::Function(format!("missing argument {name:?}")))
    }

    /// 字符串实参
    pub fn str(&self, name: &str) -> Result<&str, EvalError> {
        match self.any(name)? {
            Value::String(s) => Ok(s),
            other => Err(EvalError::Function(format!(
                "arg {name}: expected string, got {}",
                other.type_name()
            ))),
        }
    }

    /// 带符号整数实参
    pub fn int(&self, name: &str) -> Result<i64, EvalError> {
        match self.any(name)? {
            Value::Int(n) => Ok(*n),
            other => Err(EvalError::Function(format!(
                "arg {name}: expected int64, got {}",
                other.type_name()
            ))),
        }
    }
}

type FnEval = dyn Fn(&FnArgs) -> EvalResult + Send + Sync;

/// 可调用的函数：形参名列表 + 执行体
#[derive(Clone)]
pub struct Function {
    args: Vec<FunctionArg>,
    eval: Arc<FnEval>,
}

impl Function {
    pub fn new(arg_names: &[&str], eval: impl Fn(&FnArgs) -> EvalResult + Send + Sync + 'static) -> Self {
        Self {
            args: arg_names
                .iter()
                .map(|name| FunctionArg {
                    name: (*name).to_string(),
                })
                .collect(),
            eval: Arc::new(eval),
        }
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    pub fn arg_names(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(|a| a.name.as_str())
    }

    pub fn call(&self, args: &FnArgs) -> EvalResult {
        (self.eval)(args)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// 进程级标准库函数表，初始化一次后只读
static STDLIB: LazyLock<HashMap<&'static str, Function>> = LazyLock::new(|| {
    let mut funcs = HashMap::new();

    funcs.insert(
        "starts_with",
        Function::new(&["value", "prefix"], |args: &FnArgs| {
            let value = match args.any("value") {
                Ok(v) => v,
                Err(e) => return EvalResult::error(e),
            };
            let prefix = match args.any("prefix") {
                Ok(v) => v,
                Err(e) => return EvalResult::error(e),
            };

            // 非字符串参数走文本形式
            EvalResult::value(Value::Bool(
                value.to_string().starts_with(&prefix.to_string()),
            ))
        }),
    );

    funcs.insert(
        "index",
        Function::new(&["container", "key"], |args: &FnArgs| {
            let container = match args.any("container") {
                Ok(v) => v,
                Err(e) => return EvalResult::error(e),
            };

            match container {
                Value::Map(kv) => {
                    let key = match args.str("key") {
                        Ok(k) => k,
                        Err(e) => return EvalResult::error(e),
                    };
                    match kv.lookup_path(key) {
                        Some(value) => EvalResult::value(value.clone()),
                        None => EvalResult::error(EvalError::Function(format!(
                            "key {key:?} not found"
                        ))),
                    }
                }
                Value::Array(items) => {
                    let key = match args.int("key") {
                        Ok(k) => k,
                        Err(e) => return EvalResult::error(e),
                    };
                    if key < 0 || key as usize >= items.len() {
                        return EvalResult::error(EvalError::Function(format!(
                            "index {key} out of bounds"
                        )));
                    }
                    EvalResult::value(items[key as usize].clone())
                }
                _ => EvalResult::error(EvalError::Function(
                    "container must be a map or array".to_string(),
                )),
            }
        }),
    );

    funcs
});

/// 标准库函数表
pub fn stdlib() -> &'static HashMap<&'static str, Function> {
    &STDLIB
}
