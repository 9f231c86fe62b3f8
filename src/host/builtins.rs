//! Built-in functions.

use std::path::PathBuf;

use super::error::{HostError, HostResult};
use super::ast::BinaryOp;
use super::interpreter::{binary_op, Interpreter};
use super::value::{Number, Value};

/// Upper bound on `range()` length.
const MAX_RANGE: i64 = 10_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Len,
    Str,
    Repr,
    Int,
    Float,
    Range,
    Abs,
    Min,
    Max,
    Sum,
    Round,
    Savefig,
}

impl Builtin {
    const ALL: [Builtin; 13] = [
        Self::Print,
        Self::Len,
        Self::Str,
        Self::Repr,
        Self::Int,
        Self::Float,
        Self::Range,
        Self::Abs,
        Self::Min,
        Self::Max,
        Self::Sum,
        Self::Round,
        Self::Savefig,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Len => "len",
            Self::Str => "str",
            Self::Repr => "repr",
            Self::Int => "int",
            Self::Float => "float",
            Self::Range => "range",
            Self::Abs => "abs",
            Self::Min => "min",
            Self::Max => "max",
            Self::Sum => "sum",
            Self::Round => "round",
            Self::Savefig => "savefig",
        }
    }

    pub fn lookup(name: &str) -> Option<Builtin> {
        Self::ALL.into_iter().find(|b| b.name() == name)
    }

    pub(crate) fn call(
        self,
        interp: &mut Interpreter,
        args: Vec<Value>,
        kwargs: Vec<(String, Value)>,
    ) -> HostResult<Value> {
        if self != Builtin::Print {
            if let Some((key, _)) = kwargs.first() {
                return Err(HostError::type_error(format!(
                    "{}() got an unexpected keyword argument '{}'",
                    self.name(),
                    key
                )));
            }
        }

        match self {
            Self::Print => print(interp, &args, kwargs),
            Self::Len => {
                let [value] = exact_args::<1>(self, args)?;
                let len = match &value {
                    Value::Str(s) => s.chars().count(),
                    Value::List(items) => items.len(),
                    other => {
                        return Err(HostError::type_error(format!(
                            "object of type '{}' has no len()",
                            other.type_name()
                        )))
                    }
                };
                Ok(Value::Int(len as i64))
            }
            Self::Str => match args.len() {
                0 => Ok(Value::Str(String::new())),
                _ => {
                    let [value] = exact_args::<1>(self, args)?;
                    Ok(Value::Str(value.to_string()))
                }
            },
            Self::Repr => {
                let [value] = exact_args::<1>(self, args)?;
                Ok(Value::Str(value.repr()))
            }
            Self::Int => {
                let [value] = exact_args::<1>(self, args)?;
                to_int(&value)
            }
            Self::Float => {
                let [value] = exact_args::<1>(self, args)?;
                to_float(&value)
            }
            Self::Range => range(args),
            Self::Abs => {
                let [value] = exact_args::<1>(self, args)?;
                match value.as_number() {
                    Some(Number::Int(n)) => {
                        n.checked_abs().map(Value::Int).ok_or_else(HostError::overflow)
                    }
                    Some(Number::Float(f)) => Ok(Value::Float(f.abs())),
                    None => Err(bad_operand(self, &value)),
                }
            }
            Self::Min | Self::Max => extremum(self, args),
            Self::Sum => {
                let (items, start) = match args.len() {
                    1 | 2 => {
                        let mut args = args.into_iter();
                        let iterable = args.next().unwrap_or(Value::None);
                        (iterate(&iterable)?, args.next().unwrap_or(Value::Int(0)))
                    }
                    n => return Err(arg_count(self, "1 or 2", n)),
                };
                items
                    .iter()
                    .try_fold(start, |acc, item| binary_op(BinaryOp::Add, &acc, item))
            }
            Self::Round => round(args),
            Self::Savefig => {
                let [target] = exact_args::<1>(self, args)?;
                match target {
                    Value::Str(path) if !path.is_empty() => {
                        interp.record_artifact(PathBuf::from(path));
                        Ok(Value::None)
                    }
                    other => Err(HostError::type_error(format!(
                        "savefig() expects a non-empty path string, got {}",
                        other.repr()
                    ))),
                }
            }
        }
    }
}

fn print(interp: &mut Interpreter, args: &[Value], kwargs: Vec<(String, Value)>) -> HostResult<Value> {
    let mut sep = " ".to_string();
    let mut end = "\n".to_string();
    for (key, value) in kwargs {
        let slot = match key.as_str() {
            "sep" => &mut sep,
            "end" => &mut end,
            other => {
                return Err(HostError::type_error(format!(
                    "print() got an unexpected keyword argument '{}'",
                    other
                )))
            }
        };
        match value {
            Value::Str(s) => *slot = s,
            Value::None => {}
            other => {
                return Err(HostError::type_error(format!(
                    "{} must be None or a string, not {}",
                    key,
                    other.type_name()
                )))
            }
        }
    }

    let text: Vec<String> = args.iter().map(|v| v.to_string()).collect();
    interp.write_output(&text.join(&sep));
    interp.write_output(&end);
    Ok(Value::None)
}

fn exact_args<const N: usize>(builtin: Builtin, args: Vec<Value>) -> HostResult<[Value; N]> {
    let count = args.len();
    args.try_into()
        .map_err(|_| arg_count(builtin, &N.to_string(), count))
}

fn arg_count(builtin: Builtin, expected: &str, got: usize) -> HostError {
    HostError::type_error(format!(
        "{}() takes {} argument(s) ({} given)",
        builtin.name(),
        expected,
        got
    ))
}

fn bad_operand(builtin: Builtin, value: &Value) -> HostError {
    HostError::type_error(format!(
        "bad operand type for {}(): '{}'",
        builtin.name(),
        value.type_name()
    ))
}

/// Items of an iterable value.
pub(crate) fn iterate(value: &Value) -> HostResult<Vec<Value>> {
    match value {
        Value::List(items) => Ok(items.clone()),
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        other => Err(HostError::type_error(format!(
            "'{}' object is not iterable",
            other.type_name()
        ))),
    }
}

fn to_int(value: &Value) -> HostResult<Value> {
    match value {
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(f) => {
            if !f.is_finite() {
                return Err(HostError::value_error(format!(
                    "cannot convert float {} to integer",
                    value
                )));
            }
            let truncated = f.trunc();
            if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
                return Err(HostError::overflow());
            }
            Ok(Value::Int(truncated as i64))
        }
        Value::Str(s) => s.trim().parse::<i64>().map(Value::Int).map_err(|_| {
            HostError::value_error(format!("invalid literal for int() with base 10: {}", value.repr()))
        }),
        other => Err(HostError::type_error(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

fn to_float(value: &Value) -> HostResult<Value> {
    match value {
        Value::Str(s) => s.trim().parse::<f64>().map(Value::Float).map_err(|_| {
            HostError::value_error(format!("could not convert string to float: {}", value.repr()))
        }),
        other => match other.as_number() {
            Some(n) => Ok(Value::Float(n.as_f64())),
            None => Err(HostError::type_error(format!(
                "float() argument must be a string or a number, not '{}'",
                other.type_name()
            ))),
        },
    }
}

fn int_arg(value: &Value) -> HostResult<i64> {
    match value {
        Value::Int(n) => Ok(*n),
        Value::Bool(b) => Ok(i64::from(*b)),
        other => Err(HostError::type_error(format!(
            "'{}' object cannot be interpreted as an integer",
            other.type_name()
        ))),
    }
}

fn range(args: Vec<Value>) -> HostResult<Value> {
    let ints = args.iter().map(int_arg).collect::<HostResult<Vec<i64>>>()?;
    let (start, stop, step) = match ints.as_slice() {
        [stop] => (0, *stop, 1),
        [start, stop] => (*start, *stop, 1),
        [start, stop, step] => (*start, *stop, *step),
        _ => return Err(arg_count(Builtin::Range, "1 to 3", ints.len())),
    };
    if step == 0 {
        return Err(HostError::value_error("range() arg 3 must not be zero"));
    }

    let span = if step > 0 {
        (stop as i128 - start as i128 + step as i128 - 1) / step as i128
    } else {
        (start as i128 - stop as i128 - step as i128 - 1) / (-(step as i128))
    };
    let len = span.max(0);
    if len > MAX_RANGE as i128 {
        return Err(HostError::value_error(format!(
            "range() of {} items exceeds the limit of {}",
            len, MAX_RANGE
        )));
    }

    let items = (0..len as i64)
        .map(|i| Value::Int(start + i * step))
        .collect();
    Ok(Value::List(items))
}

fn extremum(builtin: Builtin, args: Vec<Value>) -> HostResult<Value> {
    let items = match args.len() {
        0 => return Err(arg_count(builtin, "at least 1", 0)),
        1 => iterate(&args[0])?,
        _ => args,
    };

    let mut iter = items.into_iter();
    let Some(mut best) = iter.next() else {
        return Err(HostError::value_error(format!(
            "{}() arg is an empty sequence",
            builtin.name()
        )));
    };
    for item in iter {
        let ordering = item.py_cmp(&best).ok_or_else(|| {
            HostError::type_error(format!(
                "'<' not supported between instances of '{}' and '{}'",
                item.type_name(),
                best.type_name()
            ))
        })?;
        let better = match builtin {
            Builtin::Min => ordering.is_lt(),
            _ => ordering.is_gt(),
        };
        if better {
            best = item;
        }
    }
    Ok(best)
}

fn round(args: Vec<Value>) -> HostResult<Value> {
    let (value, digits) = match args.as_slice() {
        [value] => (value, None),
        [value, digits] => (value, Some(int_arg(digits)?)),
        _ => return Err(arg_count(Builtin::Round, "1 or 2", args.len())),
    };
    let number = value
        .as_number()
        .ok_or_else(|| bad_operand(Builtin::Round, value))?;

    match (number, digits) {
        (Number::Int(n), _) => Ok(Value::Int(n)),
        (Number::Float(f), None) => to_int(&Value::Float(round_half_even(f))),
        (Number::Float(f), Some(d)) => {
            let factor = 10f64.powi(d.clamp(-308, 308) as i32);
            Ok(Value::Float(round_half_even(f * factor) / factor))
        }
    }
}

/// Banker's rounding, as Python's `round` does.
fn round_half_even(f: f64) -> f64 {
    let rounded = f.round();
    if (f - f.trunc()).abs() == 0.5 && rounded % 2.0 != 0.0 {
        rounded - f.signum()
    } else {
        rounded
    }
}
