//! Tree-walking evaluator for the host language.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use super::ast::{BinaryOp, BoolOp, CompareOp, Expr, FunctionDef, Stmt, StmtKind, UnaryOp};
use super::builtins::{iterate, Builtin};
use super::error::{HostError, HostErrorKind, HostResult};
use super::parser::{parse_expression, parse_program};
use super::value::{Number, Value};

/// Maximum depth of nested user function calls.
pub const MAX_CALL_DEPTH: usize = 64;

/// Upper bound on the length of a list or string built by `*`.
const MAX_REPEAT: usize = 10_000_000;

/// Control flow out of a statement.
enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

type Scope = BTreeMap<String, Value>;

/// A persistent execution environment.
///
/// Globals survive across calls to [`Interpreter::run`], so a document's
/// chunks can be fed in one at a time and each sees the state the previous
/// ones left behind.
#[derive(Debug, Default)]
pub struct Interpreter {
    globals: Scope,
    frames: Vec<Scope>,
    output: String,
    artifacts: Vec<PathBuf>,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// An interpreter whose globals are a copy of `bindings`.
    pub fn from_bindings(bindings: Scope) -> Self {
        Self {
            globals: bindings,
            ..Self::default()
        }
    }

    /// Parses and runs numbered source lines.
    pub fn run<'a, I>(&mut self, lines: I) -> HostResult<()>
    where
        I: IntoIterator<Item = (usize, &'a str)>,
    {
        let program = parse_program(lines)?;
        match self.exec_block(&program)? {
            Flow::Normal => Ok(()),
            Flow::Return(_) => Err(outside("'return' outside function")),
            Flow::Break => Err(outside("'break' outside loop")),
            Flow::Continue => Err(outside("'continue' not properly in loop")),
        }
    }

    /// Evaluates a single expression against the current globals.
    pub fn eval_expression(&mut self, source: &str) -> HostResult<Value> {
        let expr = parse_expression(source)?;
        self.eval(&expr)
    }

    /// A copy of the global bindings.
    pub fn bindings(&self) -> Scope {
        self.globals.clone()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    /// Output written since the last call.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Figure targets recorded by `savefig` since the last call.
    pub fn take_artifacts(&mut self) -> Vec<PathBuf> {
        std::mem::take(&mut self.artifacts)
    }

    pub(crate) fn write_output(&mut self, text: &str) {
        self.output.push_str(text);
    }

    pub(crate) fn record_artifact(&mut self, path: PathBuf) {
        self.artifacts.push(path);
    }

    fn scope_mut(&mut self) -> &mut Scope {
        match self.frames.last_mut() {
            Some(frame) => frame,
            None => &mut self.globals,
        }
    }

    fn lookup(&self, name: &str) -> HostResult<Value> {
        if let Some(value) = self.frames.last().and_then(|frame| frame.get(name)) {
            return Ok(value.clone());
        }
        if let Some(value) = self.globals.get(name) {
            return Ok(value.clone());
        }
        Builtin::lookup(name)
            .map(Value::Builtin)
            .ok_or_else(|| HostError::name(name))
    }

    fn exec_block(&mut self, body: &[Stmt]) -> HostResult<Flow> {
        for stmt in body {
            let flow = self.exec(stmt).map_err(|e| e.at_line(stmt.line))?;
            if !matches!(flow, Flow::Normal) {
                return Ok(flow);
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Stmt) -> HostResult<Flow> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                self.eval(expr)?;
            }
            StmtKind::Assign { name, value } => {
                let value = self.eval(value)?;
                self.scope_mut().insert(name.clone(), value);
            }
            StmtKind::AugAssign { name, op, value } => {
                let current = self.lookup(name)?;
                let rhs = self.eval(value)?;
                let result = binary_op(*op, &current, &rhs)?;
                self.scope_mut().insert(name.clone(), result);
            }
            StmtKind::If { branches, orelse } => {
                for (cond, body) in branches {
                    if self.eval(cond)?.is_truthy() {
                        return self.exec_block(body);
                    }
                }
                return self.exec_block(orelse);
            }
            StmtKind::While { cond, body } => {
                while self.eval(cond)?.is_truthy() {
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
            }
            StmtKind::For { var, iter, body } => {
                let items = iterate(&self.eval(iter)?)?;
                for item in items {
                    self.scope_mut().insert(var.clone(), item);
                    match self.exec_block(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }
                }
            }
            StmtKind::Def(def) => {
                self.scope_mut()
                    .insert(def.name.clone(), Value::Function(Arc::clone(def)));
            }
            StmtKind::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::None,
                };
                return Ok(Flow::Return(value));
            }
            StmtKind::Pass => {}
            StmtKind::Break => return Ok(Flow::Break),
            StmtKind::Continue => return Ok(Flow::Continue),
        }
        Ok(Flow::Normal)
    }

    fn eval(&mut self, expr: &Expr) -> HostResult<Value> {
        match expr {
            Expr::Int(n) => Ok(Value::Int(*n)),
            Expr::Float(f) => Ok(Value::Float(*f)),
            Expr::Str(s) => Ok(Value::Str(s.clone())),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::None => Ok(Value::None),
            Expr::List(items) => items
                .iter()
                .map(|item| self.eval(item))
                .collect::<HostResult<Vec<_>>>()
                .map(Value::List),
            Expr::Name(name) => self.lookup(name),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                unary_op(*op, &value)
            }
            Expr::Binary { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                binary_op(*op, &lhs, &rhs)
            }
            Expr::Compare { first, rest } => {
                let mut lhs = self.eval(first)?;
                for (op, expr) in rest {
                    let rhs = self.eval(expr)?;
                    if !compare(*op, &lhs, &rhs)? {
                        return Ok(Value::Bool(false));
                    }
                    lhs = rhs;
                }
                Ok(Value::Bool(true))
            }
            Expr::Logical { op, lhs, rhs } => {
                let lhs = self.eval(lhs)?;
                let short_circuit = match op {
                    BoolOp::And => !lhs.is_truthy(),
                    BoolOp::Or => lhs.is_truthy(),
                };
                if short_circuit {
                    Ok(lhs)
                } else {
                    self.eval(rhs)
                }
            }
            Expr::Index { target, index } => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                subscript(&target, &index)
            }
            Expr::Call { func, args, kwargs } => {
                let func = self.eval(func)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<HostResult<Vec<_>>>()?;
                let kwargs = kwargs
                    .iter()
                    .map(|(key, arg)| Ok((key.clone(), self.eval(arg)?)))
                    .collect::<HostResult<Vec<_>>>()?;
                self.call(&func, args, kwargs)
            }
        }
    }

    fn call(&mut self, func: &Value, args: Vec<Value>, kwargs: Vec<(String, Value)>) -> HostResult<Value> {
        match func {
            Value::Builtin(builtin) => builtin.call(self, args, kwargs),
            Value::Function(def) => self.call_function(def, args, kwargs),
            other => Err(HostError::type_error(format!(
                "'{}' object is not callable",
                other.type_name()
            ))),
        }
    }

    fn call_function(
        &mut self,
        def: &FunctionDef,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> HostResult<Value> {
        if self.frames.len() >= MAX_CALL_DEPTH {
            return Err(HostError::new(
                HostErrorKind::RecursionError,
                "maximum recursion depth exceeded",
            ));
        }
        if args.len() > def.params.len() {
            return Err(HostError::type_error(format!(
                "{}() takes {} positional argument(s) but {} were given",
                def.name,
                def.params.len(),
                args.len()
            )));
        }

        let mut frame: Scope = def.params.iter().cloned().zip(args).collect();
        for (key, value) in kwargs {
            if !def.params.contains(&key) {
                return Err(HostError::type_error(format!(
                    "{}() got an unexpected keyword argument '{}'",
                    def.name, key
                )));
            }
            if frame.contains_key(&key) {
                return Err(HostError::type_error(format!(
                    "{}() got multiple values for argument '{}'",
                    def.name, key
                )));
            }
            frame.insert(key, value);
        }
        if let Some(missing) = def.params.iter().find(|p| !frame.contains_key(*p)) {
            return Err(HostError::type_error(format!(
                "{}() missing required argument: '{}'",
                def.name, missing
            )));
        }

        self.frames.push(frame);
        let flow = self.exec_block(&def.body);
        self.frames.pop();
        match flow? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::None),
            Flow::Break => Err(outside("'break' outside loop")),
            Flow::Continue => Err(outside("'continue' not properly in loop")),
        }
    }
}

fn outside(message: &str) -> HostError {
    HostError::new(HostErrorKind::SyntaxError, message)
}

fn unary_op(op: UnaryOp, value: &Value) -> HostResult<Value> {
    let bad = || {
        HostError::type_error(format!(
            "bad operand type for unary {}: '{}'",
            match op {
                UnaryOp::Neg => "-",
                UnaryOp::Pos => "+",
                UnaryOp::Not => "not",
            },
            value.type_name()
        ))
    };
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.is_truthy())),
        UnaryOp::Neg => match value.as_number().ok_or_else(bad)? {
            Number::Int(n) => n.checked_neg().map(Value::Int).ok_or_else(HostError::overflow),
            Number::Float(f) => Ok(Value::Float(-f)),
        },
        UnaryOp::Pos => match value.as_number().ok_or_else(bad)? {
            Number::Int(n) => Ok(Value::Int(n)),
            Number::Float(f) => Ok(Value::Float(f)),
        },
    }
}

/// Applies a binary operator with Python semantics.
pub(crate) fn binary_op(op: BinaryOp, lhs: &Value, rhs: &Value) -> HostResult<Value> {
    match (op, lhs, rhs) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => {
            return Ok(Value::Str(format!("{}{}", a, b)))
        }
        (BinaryOp::Add, Value::List(a), Value::List(b)) => {
            return Ok(Value::List(a.iter().chain(b).cloned().collect()))
        }
        (BinaryOp::Mul, Value::Str(s), count) | (BinaryOp::Mul, count, Value::Str(s))
            if count.as_number().is_some_and(|n| matches!(n, Number::Int(_))) =>
        {
            let times = repeat_count(count, s.len())?;
            return Ok(Value::Str(s.repeat(times)));
        }
        (BinaryOp::Mul, Value::List(items), count) | (BinaryOp::Mul, count, Value::List(items))
            if count.as_number().is_some_and(|n| matches!(n, Number::Int(_))) =>
        {
            let times = repeat_count(count, items.len())?;
            let mut repeated = Vec::with_capacity(items.len() * times);
            for _ in 0..times {
                repeated.extend_from_slice(items);
            }
            return Ok(Value::List(repeated));
        }
        _ => {}
    }

    let (Some(a), Some(b)) = (lhs.as_number(), rhs.as_number()) else {
        return Err(HostError::type_error(format!(
            "unsupported operand type(s) for {}: '{}' and '{}'",
            op.symbol(),
            lhs.type_name(),
            rhs.type_name()
        )));
    };

    match (a, b) {
        (Number::Int(a), Number::Int(b)) => int_op(op, a, b),
        (a, b) => float_op(op, a.as_f64(), b.as_f64()),
    }
}

fn repeat_count(count: &Value, unit: usize) -> HostResult<usize> {
    let n = match count.as_number() {
        Some(Number::Int(n)) => n.max(0) as usize,
        _ => 0,
    };
    if unit.saturating_mul(n) > MAX_REPEAT {
        return Err(HostError::new(
            HostErrorKind::OverflowError,
            "repeated sequence is too long",
        ));
    }
    Ok(n)
}

fn int_op(op: BinaryOp, a: i64, b: i64) -> HostResult<Value> {
    let checked = |result: Option<i64>| result.map(Value::Int).ok_or_else(HostError::overflow);
    match op {
        BinaryOp::Add => checked(a.checked_add(b)),
        BinaryOp::Sub => checked(a.checked_sub(b)),
        BinaryOp::Mul => checked(a.checked_mul(b)),
        BinaryOp::Div => float_op(op, a as f64, b as f64),
        BinaryOp::FloorDiv => {
            if b == 0 {
                return Err(HostError::new(
                    HostErrorKind::ZeroDivisionError,
                    "integer division or modulo by zero",
                ));
            }
            let q = a.checked_div(b).ok_or_else(HostError::overflow)?;
            let adjust = a % b != 0 && ((a < 0) != (b < 0));
            Ok(Value::Int(if adjust { q - 1 } else { q }))
        }
        BinaryOp::Mod => {
            if b == 0 {
                return Err(HostError::new(
                    HostErrorKind::ZeroDivisionError,
                    "integer division or modulo by zero",
                ));
            }
            let r = a.checked_rem(b).unwrap_or(0);
            Ok(Value::Int(if r != 0 && ((r < 0) != (b < 0)) { r + b } else { r }))
        }
        BinaryOp::Pow => {
            if b < 0 {
                return float_op(op, a as f64, b as f64);
            }
            let exp = u32::try_from(b).map_err(|_| HostError::overflow())?;
            checked(a.checked_pow(exp))
        }
    }
}

fn float_op(op: BinaryOp, a: f64, b: f64) -> HostResult<Value> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Err(HostError::zero_division());
            }
            a / b
        }
        BinaryOp::FloorDiv => {
            if b == 0.0 {
                return Err(HostError::new(
                    HostErrorKind::ZeroDivisionError,
                    "float floor division by zero",
                ));
            }
            (a / b).floor()
        }
        BinaryOp::Mod => {
            if b == 0.0 {
                return Err(HostError::new(HostErrorKind::ZeroDivisionError, "float modulo"));
            }
            a - b * (a / b).floor()
        }
        BinaryOp::Pow => {
            if a == 0.0 && b < 0.0 {
                return Err(HostError::new(
                    HostErrorKind::ZeroDivisionError,
                    "0.0 cannot be raised to a negative power",
                ));
            }
            a.powf(b)
        }
    };
    Ok(Value::Float(result))
}

fn compare(op: CompareOp, lhs: &Value, rhs: &Value) -> HostResult<bool> {
    match op {
        CompareOp::Eq => Ok(lhs.py_eq(rhs)),
        CompareOp::Ne => Ok(!lhs.py_eq(rhs)),
        _ => {
            let Some(ordering) = lhs.py_cmp(rhs) else {
                // NaN compares false; mismatched types are an error
                if lhs.as_number().is_some() && rhs.as_number().is_some() {
                    return Ok(false);
                }
                return Err(HostError::type_error(format!(
                    "'{}' not supported between instances of '{}' and '{}'",
                    op.symbol(),
                    lhs.type_name(),
                    rhs.type_name()
                )));
            };
            Ok(match op {
                CompareOp::Lt => ordering.is_lt(),
                CompareOp::Le => ordering.is_le(),
                CompareOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            })
        }
    }
}

fn subscript(target: &Value, index: &Value) -> HostResult<Value> {
    let i = match index {
        Value::Int(n) => *n,
        Value::Bool(b) => i64::from(*b),
        other => {
            return Err(HostError::type_error(format!(
                "{} indices must be integers, not {}",
                target.type_name(),
                other.type_name()
            )))
        }
    };
    let out_of_range = || {
        HostError::new(
            HostErrorKind::IndexError,
            format!("{} index out of range", target.type_name()),
        )
    };
    let resolve = |len: usize| -> HostResult<usize> {
        let len = len as i64;
        let pos = if i < 0 { i + len } else { i };
        if (0..len).contains(&pos) {
            Ok(pos as usize)
        } else {
            Err(out_of_range())
        }
    };

    match target {
        Value::List(items) => Ok(items[resolve(items.len())?].clone()),
        Value::Str(s) => {
            let pos = resolve(s.chars().count())?;
            s.chars()
                .nth(pos)
                .map(|c| Value::Str(c.to_string()))
                .ok_or_else(out_of_range)
        }
        other => Err(HostError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}
