//! 求值器
//!
//! 对语法树做递归遍历。每个节点返回一个 EvalResult，父节点按
//! 短路规则合并子结果；同时维护残差规则：已得出确定结论的分支被
//! 剪掉，未决的分支原样保留，调用方可以拿残差在补充过上下文后继
//! 续求值、单调推进。
//!
//! 缺失字段不会让整棵树失败：它把分支标记为未决，并在 and/or 处
//! 按并集合并；其他错误对所在分支是致命的，但兄弟分支照常求值。

use crate::ast::{CmpOp, Node, Rule};
use crate::compare::compare;
use crate::context::Ctx;
use crate::error::EvalError;
use crate::functions::{stdlib, FnArgs, Function};
use crate::set::Set;
use crate::value::Value;
use std::sync::Arc;

/// 一次求值的结果：值、错误与残差规则
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    pub value: Option<Value>,
    pub error: Option<EvalError>,
    pub evaluated_rule: Rule,
}

impl EvalResult {
    /// 求值过程没有出错
    pub fn ok(&self) -> bool {
        self.error.is_none()
    }

    /// 无错误且值非零
    pub fn pass(&self) -> bool {
        self.ok() && self.value.as_ref().is_some_and(Value::is_truthy)
    }

    /// 无错误且值为零
    pub fn fail(&self) -> bool {
        self.ok() && self.value.as_ref().is_some_and(|v| !v.is_truthy())
    }

    /// 函数体内部使用：只携带值，不关联规则
    pub fn value(value: Value) -> Self {
        Self {
            value: Some(value),
            error: None,
            evaluated_rule: Rule::empty(),
        }
    }

    /// 函数体内部使用：只携带错误
    pub fn error(error: EvalError) -> Self {
        Self {
            value: None,
            error: Some(error),
            evaluated_rule: Rule::empty(),
        }
    }

    fn node_value(value: Value, node: &Arc<Node>) -> Self {
        Self {
            value: Some(value),
            error: None,
            evaluated_rule: Rule::from_node(Arc::clone(node)),
        }
    }

    fn node_error(error: EvalError, node: &Arc<Node>) -> Self {
        Self {
            value: None,
            error: Some(error),
            evaluated_rule: Rule::from_node(Arc::clone(node)),
        }
    }

    /// 残差规则的根节点；节点求值总会填充残差
    fn residual(&self) -> Arc<Node> {
        self.evaluated_rule
            .node()
            .cloned()
            .expect("node evaluation always attaches a residual")
    }
}

impl Rule {
    /// 用上下文求值。根节点先做一次上下文合法性检查。
    pub fn eval(&self, ctx: &Ctx) -> EvalResult {
        if let Err(err) = ctx.validate() {
            return EvalResult {
                value: None,
                error: Some(err),
                evaluated_rule: self.clone(),
            };
        }

        match self.node() {
            Some(root) => eval_node(root, ctx),
            None => EvalResult {
                value: None,
                error: None,
                evaluated_rule: self.clone(),
            },
        }
    }
}

fn eval_node(node: &Arc<Node>, ctx: &Ctx) -> EvalResult {
    match &**node {
        Node::And { left, right } => {
            let rl = eval_node(left, ctx);
            // 左分支确定失败即短路
            if rl.fail() {
                return rl;
            }
            let rr = eval_node(right, ctx);
            if rr.fail() {
                return rr;
            }

            match (rl.error.is_none(), rr.error.is_none()) {
                (true, true) => EvalResult::node_value(
                    Value::Bool(true),
                    &Arc::new(Node::And {
                        left: rl.residual(),
                        right: rr.residual(),
                    }),
                ),
                // 已通过的一侧被剪掉，未决一侧原样返回
                (true, false) => rr,
                (false, true) => rl,
                (false, false) => {
                    let residual = Arc::new(Node::And {
                        left: rl.residual(),
                        right: rr.residual(),
                    });
                    EvalResult {
                        value: None,
                        error: EvalError::coalesce(rl.error, rr.error),
                        evaluated_rule: Rule::from_node(residual),
                    }
                }
            }
        }

        Node::Or { left, right } => {
            let rl = eval_node(left, ctx);
            // 左分支确定通过即短路
            if rl.pass() {
                return rl;
            }
            let rr = eval_node(right, ctx);
            if rr.pass() {
                return rr;
            }

            match (rl.error.is_none(), rr.error.is_none()) {
                (true, true) => EvalResult::node_value(
                    Value::Bool(false),
                    &Arc::new(Node::Or {
                        left: rl.residual(),
                        right: rr.residual(),
                    }),
                ),
                (true, false) => rr,
                (false, true) => rl,
                (false, false) => {
                    let residual = Arc::new(Node::Or {
                        left: rl.residual(),
                        right: rr.residual(),
                    });
                    EvalResult {
                        value: None,
                        error: EvalError::coalesce(rl.error, rr.error),
                        evaluated_rule: Rule::from_node(residual),
                    }
                }
            }
        }

        Node::Not { expr } => {
            let r = eval_node(expr, ctx);
            let residual = Arc::new(Node::Not {
                expr: r.residual(),
            });
            match r.error {
                None => {
                    let truthy = r.value.as_ref().is_some_and(Value::is_truthy);
                    EvalResult::node_value(Value::Bool(!truthy), &residual)
                }
                Some(err) => EvalResult {
                    value: None,
                    error: Some(err),
                    evaluated_rule: Rule::from_node(residual),
                },
            }
        }

        Node::Compare { left, op, right } => {
            match resolve_pair(left, right, ctx) {
                Operands::Missing(fields) => {
                    EvalResult::node_error(EvalError::MissingFields(fields), node)
                }
                Operands::Failed(err) => EvalResult::node_error(err, node),
                Operands::Values(lv, rv) => match compare(&lv, *op, &rv) {
                    Ok(pass) => EvalResult::node_value(Value::Bool(pass), node),
                    Err(err) => {
                        EvalResult::node_error(err.with_left_name(&left.to_string()), node)
                    }
                },
            }
        }

        Node::Match { left, pattern } => match resolve_pair(left, pattern, ctx) {
            Operands::Missing(fields) => {
                EvalResult::node_error(EvalError::MissingFields(fields), node)
            }
            Operands::Failed(err) => EvalResult::node_error(err, node),
            Operands::Values(lv, rv) => match compare(&lv, CmpOp::Eq, &rv) {
                Ok(pass) => EvalResult::node_value(Value::Bool(pass), node),
                Err(err) => EvalResult::node_error(err.with_left_name(&left.to_string()), node),
            },
        },

        // `x in r` 即 `r contains x`；右侧数组由比较内核按成员判定处理
        Node::In { left, right } => match resolve_pair(left, right, ctx) {
            Operands::Missing(fields) => {
                EvalResult::node_error(EvalError::MissingFields(fields), node)
            }
            Operands::Failed(err) => EvalResult::node_error(err, node),
            Operands::Values(lv, rv) => match compare(&rv, CmpOp::Contains, &lv) {
                Ok(pass) => EvalResult::node_value(Value::Bool(pass), node),
                Err(err) => EvalResult::node_error(err.with_left_name(&left.to_string()), node),
            },
        },

        // 单独出现的字段是非零测试
        Node::Field { name } => match ctx.kv.lookup_path(name) {
            Some(value) => EvalResult::node_value(Value::Bool(value.is_truthy()), node),
            None => EvalResult::node_error(EvalError::missing_field(name.clone()), node),
        },

        Node::Literal { value, .. } => EvalResult::node_value(value.clone(), node),

        Node::Array { .. } => match resolve(node, ctx) {
            Resolved::Value(value) => EvalResult::node_value(value, node),
            Resolved::Missing(fields) => {
                EvalResult::node_error(EvalError::MissingFields(fields), node)
            }
            Resolved::Failed(err) => EvalResult::node_error(err, node),
        },

        Node::Func { name, args } => eval_func(node, name, args, ctx),
    }
}

/// 函数调用：标准库 → 用户函数 → 宏
fn eval_func(node: &Arc<Node>, name: &str, args: &[Arc<Node>], ctx: &Ctx) -> EvalResult {
    if let Some(function) = stdlib().get(name) {
        return call_function(node, name, function, args, ctx);
    }
    if let Some(function) = ctx.functions.get(name) {
        return call_function(node, name, function, args, ctx);
    }
    if let Some(macro_rule) = ctx.macros.get(name) {
        if !args.is_empty() {
            return EvalResult::node_error(
                EvalError::Function(format!("macro {name:?} takes no arguments")),
                node,
            );
        }
        // 宏是预解析的子规则，用当前上下文原样求值
        let result = macro_rule.eval(ctx);
        return EvalResult {
            value: result.value,
            error: result.error,
            evaluated_rule: Rule::from_node(Arc::clone(node)),
        };
    }

    EvalResult::node_error(EvalError::UnknownFunction(name.to_string()), node)
}

fn call_function(
    node: &Arc<Node>,
    name: &str,
    function: &Function,
    args: &[Arc<Node>],
    ctx: &Ctx,
) -> EvalResult {
    if args.len() != function.arity() {
        return EvalResult::node_error(
            EvalError::Function(format!(
                "function {name:?} expects {} arguments, got {}",
                function.arity(),
                args.len()
            )),
            node,
        );
    }

    // 先求出全部实参；缺失字段跨实参取并集
    let mut values = Vec::with_capacity(args.len());
    let mut missing = Set::new();
    for arg in args {
        match resolve(arg, ctx) {
            Resolved::Value(value) => values.push(value),
            Resolved::Missing(fields) => missing.merge(fields),
            Resolved::Failed(err) => return EvalResult::node_error(err, node),
        }
    }
    if !missing.is_empty() {
        return EvalResult::node_error(EvalError::MissingFields(missing), node);
    }

    let named = FnArgs::new(
        function
            .arg_names()
            .map(str::to_string)
            .zip(values)
            .collect(),
    );

    let result = function.call(&named);
    EvalResult {
        value: result.value,
        error: result.error,
        evaluated_rule: Rule::from_node(Arc::clone(node)),
    }
}

/// 操作数求解结果
enum Resolved {
    Value(Value),
    Missing(Set<String>),
    Failed(EvalError),
}

enum Operands {
    Values(Value, Value),
    Missing(Set<String>),
    Failed(EvalError),
}

/// 求解比较两侧的操作数；缺失字段按并集合并后整体上报
fn resolve_pair(left: &Arc<Node>, right: &Arc<Node>, ctx: &Ctx) -> Operands {
    let lv = resolve(left, ctx);
    let rv = resolve(right, ctx);

    let mut missing = Set::new();
    let mut failed: Option<EvalError> = None;
    let mut values = Vec::with_capacity(2);

    for resolved in [lv, rv] {
        match resolved {
            Resolved::Value(v) => values.push(v),
            Resolved::Missing(fields) => missing.merge(fields),
            Resolved::Failed(err) => {
                failed = EvalError::coalesce(failed, Some(err));
            }
        }
    }

    if let Some(err) = failed {
        return Operands::Failed(err);
    }
    if !missing.is_empty() {
        return Operands::Missing(missing);
    }

    let mut iter = values.into_iter();
    let (Some(lv), Some(rv)) = (iter.next(), iter.next()) else {
        unreachable!("both operands resolved");
    };
    Operands::Values(lv, rv)
}

/// 把节点当作操作数求成一个值
fn resolve(node: &Arc<Node>, ctx: &Ctx) -> Resolved {
    match &**node {
        Node::Field { name } => match ctx.kv.lookup_path(name) {
            Some(value) => Resolved::Value(value.clone()),
            None => Resolved::Missing(Set::from_item(name.clone())),
        },
        Node::Literal { value, .. } => Resolved::Value(value.clone()),
        Node::Array { elems } => {
            let mut values = Vec::with_capacity(elems.len());
            let mut missing = Set::new();
            for elem in elems {
                match resolve(elem, ctx) {
                    Resolved::Value(v) => values.push(v),
                    Resolved::Missing(fields) => missing.merge(fields),
                    Resolved::Failed(err) => return Resolved::Failed(err),
                }
            }
            if !missing.is_empty() {
                return Resolved::Missing(missing);
            }
            Resolved::Value(Value::Array(values))
        }
        Node::Func { .. } => {
            let result = eval_node(node, ctx);
            match (result.value, result.error) {
                (_, Some(EvalError::MissingFields(fields))) => Resolved::Missing(fields),
                (_, Some(err)) => Resolved::Failed(err),
                (Some(value), None) => Resolved::Value(value),
                (None, None) => Resolved::Failed(EvalError::Function(
                    "function returned no value".to_string(),
                )),
            }
        }
        // 语法上不会出现；兜底按子规则求值取布尔结果
        _ => {
            let result = eval_node(node, ctx);
            match (result.value, result.error) {
                (_, Some(EvalError::MissingFields(fields))) => Resolved::Missing(fields),
                (_, Some(err)) => Resolved::Failed(err),
                (Some(value), None) => Resolved::Value(value),
                (None, None) => Resolved::Value(Value::Bool(false)),
            }
        }
    }
}
