// Rill - a small expression language
//
// Copyright (c) 2026 Rill contributors.
//
// SPDX-License-Identifier: Apache-2.0
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE file at the
// root of this repository or at: http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Constant evaluator.
//!
//! Evaluates closed expressions (no free variables). Anything it cannot
//! evaluate, including `matches` and expressions over undeclared names,
//! is reported as an error rather than approximated; callers treat an
//! error as "no result available".

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::ast::{Expr, ExprKind, Literal, ParsedExpr};
use crate::operators;
use crate::types::Type;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Double.
    Double(f64),
    /// String.
    String(String),
    /// Byte string.
    Bytes(Vec<u8>),
    /// Boolean.
    Bool(bool),
    /// Null.
    Null,
    /// List.
    List(Vec<Value>),
    /// Map, in insertion order.
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// The type of this value.
    pub fn type_of(&self) -> Type {
        match self {
            Value::Int(_) => Type::Int,
            Value::Uint(_) => Type::Uint,
            Value::Double(_) => Type::Double,
            Value::String(_) => Type::String,
            Value::Bytes(_) => Type::Bytes,
            Value::Bool(_) => Type::Bool,
            Value::Null => Type::Null,
            Value::List(_) => Type::List,
            Value::Map(_) => Type::Map,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Uint(v) => write!(f, "{v}u"),
            Value::Double(v) => {
                if v.fract() == 0.0 && v.is_finite() {
                    write!(f, "{v:.1}")
                } else {
                    write!(f, "{v}")
                }
            }
            Value::String(v) => write!(f, "{v:?}"),
            Value::Bytes(v) => {
                write!(f, "b\"")?;
                for byte in v {
                    if byte.is_ascii_graphic() || *byte == b' ' {
                        write!(f, "{}", *byte as char)?;
                    } else {
                        write!(f, "\\x{byte:02x}")?;
                    }
                }
                write!(f, "\"")
            }
            Value::Bool(v) => write!(f, "{v}"),
            Value::Null => write!(f, "null"),
            Value::List(elements) => {
                write!(f, "[")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "]")
            }
            Value::Map(entries) => {
                write!(f, "{{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// An evaluation failure.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct EvalError(pub String);

fn err<T>(message: impl Into<String>) -> Result<T, EvalError> {
    Err(EvalError(message.into()))
}

/// Evaluate a closed expression.
pub fn eval(parsed: &ParsedExpr) -> Result<Value, EvalError> {
    let mut evaluator = Evaluator {
        bindings: Vec::new(),
    };
    evaluator.eval_expr(&parsed.root)
}

struct Evaluator {
    bindings: Vec<HashMap<String, Value>>,
}

impl Evaluator {
    fn lookup(&self, name: &str) -> Option<&Value> {
        self.bindings.iter().rev().find_map(|scope| scope.get(name))
    }

    fn eval_expr(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match &expr.kind {
            ExprKind::Ident(name) => match self.lookup(name) {
                Some(value) => Ok(value.clone()),
                None => err(format!("unknown variable '{name}'")),
            },
            ExprKind::Literal(literal) => Ok(literal_value(literal)),
            ExprKind::List { elements } => {
                let values = elements
                    .iter()
                    .map(|e| self.eval_expr(e))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Value::List(values))
            }
            ExprKind::Map { entries } => {
                let mut values = Vec::with_capacity(entries.len());
                for entry in entries {
                    let key = self.eval_expr(&entry.key)?;
                    let value = self.eval_expr(&entry.value)?;
                    values.push((key, value));
                }
                Ok(Value::Map(values))
            }
            ExprKind::Struct { type_name, .. } => {
                err(format!("cannot construct unknown type '{type_name}'"))
            }
            ExprKind::Select {
                operand,
                field,
                test_only,
            } => {
                let operand = self.eval_expr(operand)?;
                let Value::Map(entries) = operand else {
                    return err(format!(
                        "type '{}' does not support field selection",
                        operand.type_of()
                    ));
                };
                let found = entries
                    .iter()
                    .find(|(key, _)| matches!(key, Value::String(s) if s == field))
                    .map(|(_, value)| value.clone());
                if *test_only {
                    Ok(Value::Bool(found.is_some()))
                } else {
                    match found {
                        Some(value) => Ok(value),
                        None => err(format!("no such field '{field}'")),
                    }
                }
            }
            ExprKind::Call {
                function,
                target,
                args,
            } => self.eval_call(function, target.as_deref(), args),
            ExprKind::Comprehension {
                iter_var,
                iter_range,
                accu_var,
                accu_init,
                loop_condition,
                loop_step,
                result,
            } => {
                let range = self.eval_expr(iter_range)?;
                let elements: Vec<Value> = match range {
                    Value::List(elements) => elements,
                    Value::Map(entries) => entries.into_iter().map(|(key, _)| key).collect(),
                    other => {
                        return err(format!(
                            "type '{}' is not iterable",
                            other.type_of()
                        ))
                    }
                };
                let mut accu = self.eval_expr(accu_init)?;
                for element in elements {
                    let mut scope = HashMap::new();
                    scope.insert(iter_var.clone(), element);
                    scope.insert(accu_var.clone(), accu.clone());
                    self.bindings.push(scope);
                    let cont = self.eval_expr(loop_condition);
                    match cont {
                        Ok(Value::Bool(true)) => {}
                        Ok(Value::Bool(false)) => {
                            self.bindings.pop();
                            break;
                        }
                        Ok(other) => {
                            self.bindings.pop();
                            return err(format!(
                                "loop condition must be bool, found '{}'",
                                other.type_of()
                            ));
                        }
                        Err(e) => {
                            self.bindings.pop();
                            return Err(e);
                        }
                    }
                    let step = self.eval_expr(loop_step);
                    self.bindings.pop();
                    accu = step?;
                }
                let mut scope = HashMap::new();
                scope.insert(accu_var.clone(), accu);
                self.bindings.push(scope);
                let result = self.eval_expr(result);
                self.bindings.pop();
                result
            }
            ExprKind::Unspecified => err("incomplete expression"),
        }
    }

    fn eval_call(
        &mut self,
        function: &str,
        target: Option<&Expr>,
        args: &[Expr],
    ) -> Result<Value, EvalError> {
        // Logic operators and the conditional short-circuit; errors in the
        // untaken branch are absorbed.
        match function {
            operators::LOGICAL_AND if args.len() == 2 => {
                let lhs = self.eval_bool(&args[0])?;
                if !lhs {
                    return Ok(Value::Bool(false));
                }
                return Ok(Value::Bool(self.eval_bool(&args[1])?));
            }
            operators::LOGICAL_OR if args.len() == 2 => {
                let lhs = self.eval_bool(&args[0])?;
                if lhs {
                    return Ok(Value::Bool(true));
                }
                return Ok(Value::Bool(self.eval_bool(&args[1])?));
            }
            operators::CONDITIONAL if args.len() == 3 => {
                let cond = self.eval_bool(&args[0])?;
                let branch = if cond { &args[1] } else { &args[2] };
                return self.eval_expr(branch);
            }
            _ => {}
        }

        let target_value = target.map(|t| self.eval_expr(t)).transpose()?;
        let arg_values = args
            .iter()
            .map(|a| self.eval_expr(a))
            .collect::<Result<Vec<_>, _>>()?;

        match target_value {
            Some(receiver) => eval_member(function, receiver, &arg_values),
            None => eval_global(function, &arg_values),
        }
    }

    fn eval_bool(&mut self, expr: &Expr) -> Result<bool, EvalError> {
        match self.eval_expr(expr)? {
            Value::Bool(v) => Ok(v),
            other => err(format!("expected bool, found '{}'", other.type_of())),
        }
    }
}

fn literal_value(literal: &Literal) -> Value {
    match literal {
        Literal::Int(v) => Value::Int(*v),
        Literal::Uint(v) => Value::Uint(*v),
        Literal::Double(v) => Value::Double(*v),
        Literal::String(v) => Value::String(v.clone()),
        Literal::Bytes(v) => Value::Bytes(v.clone()),
        Literal::Bool(v) => Value::Bool(*v),
        Literal::Null => Value::Null,
    }
}

fn no_overload(function: &str, args: &[Value]) -> EvalError {
    let types = args
        .iter()
        .map(|v| v.type_of().name())
        .collect::<Vec<_>>()
        .join(", ");
    EvalError(format!(
        "found no matching overload for '{function}' applied to ({types})"
    ))
}

fn eval_global(function: &str, args: &[Value]) -> Result<Value, EvalError> {
    match (function, args) {
        (op, [lhs, rhs]) if operators::is_operator(op) => eval_binary(op, lhs, rhs),
        (operators::LOGICAL_NOT, [Value::Bool(v)]) => Ok(Value::Bool(!v)),
        (operators::NEGATE, [Value::Int(v)]) => match v.checked_neg() {
            Some(v) => Ok(Value::Int(v)),
            None => err("integer overflow"),
        },
        (operators::NEGATE, [Value::Double(v)]) => Ok(Value::Double(-v)),
        ("size", [value]) => value_size(value),
        ("string", [value]) => convert_string(value),
        ("int", [value]) => convert_int(value),
        ("uint", [value]) => convert_uint(value),
        ("double", [value]) => convert_double(value),
        ("bytes", [Value::String(v)]) => Ok(Value::Bytes(v.clone().into_bytes())),
        ("bytes", [Value::Bytes(v)]) => Ok(Value::Bytes(v.clone())),
        ("bool", [Value::Bool(v)]) => Ok(Value::Bool(*v)),
        ("bool", [Value::String(v)]) => match v.as_str() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => err(format!("cannot convert '{v}' to bool")),
        },
        _ => Err(no_overload(function, args)),
    }
}

fn eval_member(function: &str, receiver: Value, args: &[Value]) -> Result<Value, EvalError> {
    match (function, &receiver, args) {
        ("size", receiver, []) => value_size(receiver),
        ("contains", Value::String(s), [Value::String(sub)]) => {
            Ok(Value::Bool(s.contains(sub.as_str())))
        }
        ("startsWith", Value::String(s), [Value::String(prefix)]) => {
            Ok(Value::Bool(s.starts_with(prefix.as_str())))
        }
        ("endsWith", Value::String(s), [Value::String(suffix)]) => {
            Ok(Value::Bool(s.ends_with(suffix.as_str())))
        }
        ("matches", _, _) => err("'matches' is not supported in constant evaluation"),
        _ => {
            let mut all = vec![receiver];
            all.extend_from_slice(args);
            Err(no_overload(function, &all))
        }
    }
}

fn eval_binary(function: &str, lhs: &Value, rhs: &Value) -> Result<Value, EvalError> {
    use Value::{Bytes, Double, Int, List, Map, Uint};
    match function {
        operators::EQUALS => Ok(Value::Bool(values_equal(lhs, rhs))),
        operators::NOT_EQUALS => Ok(Value::Bool(!values_equal(lhs, rhs))),
        operators::ADD => match (lhs, rhs) {
            (Int(a), Int(b)) => checked_int(a.checked_add(*b)),
            (Uint(a), Uint(b)) => checked_uint(a.checked_add(*b)),
            (Double(a), Double(b)) => Ok(Double(a + b)),
            (Value::String(a), Value::String(b)) => Ok(Value::String(format!("{a}{b}"))),
            (Bytes(a), Bytes(b)) => {
                let mut out = a.clone();
                out.extend_from_slice(b);
                Ok(Bytes(out))
            }
            (List(a), List(b)) => {
                let mut out = a.clone();
                out.extend_from_slice(b);
                Ok(List(out))
            }
            _ => Err(no_overload(function, &[lhs.clone(), rhs.clone()])),
        },
        operators::SUBTRACT => match (lhs, rhs) {
            (Int(a), Int(b)) => checked_int(a.checked_sub(*b)),
            (Uint(a), Uint(b)) => checked_uint(a.checked_sub(*b)),
            (Double(a), Double(b)) => Ok(Double(a - b)),
            _ => Err(no_overload(function, &[lhs.clone(), rhs.clone()])),
        },
        operators::MULTIPLY => match (lhs, rhs) {
            (Int(a), Int(b)) => checked_int(a.checked_mul(*b)),
            (Uint(a), Uint(b)) => checked_uint(a.checked_mul(*b)),
            (Double(a), Double(b)) => Ok(Double(a * b)),
            _ => Err(no_overload(function, &[lhs.clone(), rhs.clone()])),
        },
        operators::DIVIDE => match (lhs, rhs) {
            (Int(_), Int(0)) | (Uint(_), Uint(0)) => err("division by zero"),
            (Int(a), Int(b)) => checked_int(a.checked_div(*b)),
            (Uint(a), Uint(b)) => checked_uint(a.checked_div(*b)),
            (Double(a), Double(b)) => Ok(Double(a / b)),
            _ => Err(no_overload(function, &[lhs.clone(), rhs.clone()])),
        },
        operators::MODULO => match (lhs, rhs) {
            (Int(_), Int(0)) | (Uint(_), Uint(0)) => err("modulus by zero"),
            (Int(a), Int(b)) => checked_int(a.checked_rem(*b)),
            (Uint(a), Uint(b)) => checked_uint(a.checked_rem(*b)),
            _ => Err(no_overload(function, &[lhs.clone(), rhs.clone()])),
        },
        operators::LESS | operators::LESS_EQUALS | operators::GREATER
        | operators::GREATER_EQUALS => {
            let ordering = compare_values(lhs, rhs)
                .ok_or_else(|| no_overload(function, &[lhs.clone(), rhs.clone()]))?;
            let result = match function {
                operators::LESS => ordering.is_lt(),
                operators::LESS_EQUALS => ordering.is_le(),
                operators::GREATER => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Value::Bool(result))
        }
        operators::IN => match rhs {
            List(elements) => Ok(Value::Bool(elements.iter().any(|e| values_equal(lhs, e)))),
            Map(entries) => Ok(Value::Bool(
                entries.iter().any(|(key, _)| values_equal(lhs, key)),
            )),
            _ => Err(no_overload(function, &[lhs.clone(), rhs.clone()])),
        },
        operators::INDEX => match (lhs, rhs) {
            (List(elements), Int(index)) => {
                let index = usize::try_from(*index)
                    .ok()
                    .filter(|&i| i < elements.len());
                match index {
                    Some(index) => Ok(elements[index].clone()),
                    None => err("index out of range"),
                }
            }
            (Map(entries), key) => entries
                .iter()
                .find(|(k, _)| values_equal(k, key))
                .map(|(_, value)| Ok(value.clone()))
                .unwrap_or_else(|| err("no such key")),
            _ => Err(no_overload(function, &[lhs.clone(), rhs.clone()])),
        },
        _ => Err(no_overload(function, &[lhs.clone(), rhs.clone()])),
    }
}

fn checked_int(value: Option<i64>) -> Result<Value, EvalError> {
    match value {
        Some(value) => Ok(Value::Int(value)),
        None => err("integer overflow"),
    }
}

fn checked_uint(value: Option<u64>) -> Result<Value, EvalError> {
    match value {
        Some(value) => Ok(Value::Uint(value)),
        None => err("integer overflow"),
    }
}

fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    lhs == rhs
}

fn compare_values(lhs: &Value, rhs: &Value) -> Option<std::cmp::Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Uint(a), Value::Uint(b)) => Some(a.cmp(b)),
        (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bytes(a), Value::Bytes(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn value_size(value: &Value) -> Result<Value, EvalError> {
    let size = match value {
        Value::String(v) => v.chars().count(),
        Value::Bytes(v) => v.len(),
        Value::List(v) => v.len(),
        Value::Map(v) => v.len(),
        other => {
            return Err(no_overload("size", std::slice::from_ref(other)));
        }
    };
    Ok(Value::Int(size as i64))
}

fn convert_string(value: &Value) -> Result<Value, EvalError> {
    let out = match value {
        Value::Int(v) => v.to_string(),
        Value::Uint(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Bool(v) => v.to_string(),
        Value::String(v) => v.clone(),
        Value::Bytes(v) => match std::str::from_utf8(v) {
            Ok(s) => s.to_string(),
            Err(_) => return err("bytes are not valid UTF-8"),
        },
        other => return Err(no_overload("string", std::slice::from_ref(other))),
    };
    Ok(Value::String(out))
}

fn convert_int(value: &Value) -> Result<Value, EvalError> {
    let out = match value {
        Value::Int(v) => *v,
        Value::Uint(v) => match i64::try_from(*v) {
            Ok(v) => v,
            Err(_) => return err("integer overflow"),
        },
        Value::Double(v) => *v as i64,
        Value::String(v) => match v.parse::<i64>() {
            Ok(v) => v,
            Err(_) => return err(format!("cannot convert '{v}' to int")),
        },
        other => return Err(no_overload("int", std::slice::from_ref(other))),
    };
    Ok(Value::Int(out))
}

fn convert_uint(value: &Value) -> Result<Value, EvalError> {
    let out = match value {
        Value::Uint(v) => *v,
        Value::Int(v) => match u64::try_from(*v) {
            Ok(v) => v,
            Err(_) => return err("integer overflow"),
        },
        Value::Double(v) => *v as u64,
        Value::String(v) => match v.parse::<u64>() {
            Ok(v) => v,
            Err(_) => return err(format!("cannot convert '{v}' to uint")),
        },
        other => return Err(no_overload("uint", std::slice::from_ref(other))),
    };
    Ok(Value::Uint(out))
}

fn convert_double(value: &Value) -> Result<Value, EvalError> {
    let out = match value {
        Value::Double(v) => *v,
        Value::Int(v) => *v as f64,
        Value::Uint(v) => *v as f64,
        Value::String(v) => match v.parse::<f64>() {
            Ok(v) => v,
            Err(_) => return err(format!("cannot convert '{v}' to double")),
        },
        other => return Err(no_overload("double", std::slice::from_ref(other))),
    };
    Ok(Value::Double(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn eval_str(source: &str) -> Result<Value, EvalError> {
        eval(&parse(source).unwrap())
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval_str("1 + 2 * 3").unwrap(), Value::Int(7));
        assert_eq!(eval_str("10 % 3").unwrap(), Value::Int(1));
        assert_eq!(eval_str("7 / 2").unwrap(), Value::Int(3));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(eval_str("1 / 0").is_err());
        assert!(eval_str("1 % 0").is_err());
    }

    #[test]
    fn test_string_operations() {
        assert_eq!(
            eval_str("'foo' + 'bar'").unwrap(),
            Value::String("foobar".to_string())
        );
        assert_eq!(eval_str("'hello'.contains('ell')").unwrap(), Value::Bool(true));
        assert_eq!(eval_str("size('héllo')").unwrap(), Value::Int(5));
    }

    #[test]
    fn test_short_circuit_absorbs_errors() {
        assert_eq!(eval_str("false && 1 / 0 == 0").unwrap(), Value::Bool(false));
        assert_eq!(eval_str("true || 1 / 0 == 0").unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_membership_and_index() {
        assert_eq!(eval_str("2 in [1, 2, 3]").unwrap(), Value::Bool(true));
        assert_eq!(eval_str("[10, 20][1]").unwrap(), Value::Int(20));
        assert_eq!(eval_str("{'a': 1}['a']").unwrap(), Value::Int(1));
        assert!(eval_str("[1][5]").is_err());
    }

    #[test]
    fn test_comprehensions_evaluate() {
        assert_eq!(
            eval_str("[1, 2, 3].map(x, x * 2)").unwrap(),
            Value::List(vec![Value::Int(2), Value::Int(4), Value::Int(6)])
        );
        assert_eq!(
            eval_str("[1, 2, 3, 4].filter(x, x % 2 == 0)").unwrap(),
            Value::List(vec![Value::Int(2), Value::Int(4)])
        );
        assert_eq!(eval_str("[1, 2, 3].all(x, x > 0)").unwrap(), Value::Bool(true));
        assert_eq!(
            eval_str("[1, 2, 3].exists_one(x, x == 2)").unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_exists_stops_early() {
        // The element after the match would divide by zero; the loop
        // condition stops the iteration first.
        assert_eq!(
            eval_str("[1, 0].exists(x, 2 / x == 2)").unwrap(),
            Value::Bool(true)
        );
    }

    #[test]
    fn test_has_on_map_literal() {
        assert_eq!(eval_str("has({'a': 1}.a)").unwrap(), Value::Bool(true));
        assert_eq!(eval_str("has({'a': 1}.b)").unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_free_variables_fail() {
        assert!(eval_str("foo + 1").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(eval_str("[1, 2]").unwrap().to_string(), "[1, 2]");
        assert_eq!(eval_str("'hi'").unwrap().to_string(), "\"hi\"");
        assert_eq!(eval_str("2.0 + 1.0").unwrap().to_string(), "3.0");
        assert_eq!(eval_str("42u").unwrap().to_string(), "42u");
    }

    #[test]
    fn test_conversions() {
        assert_eq!(eval_str("int('42')").unwrap(), Value::Int(42));
        assert_eq!(
            eval_str("string(42)").unwrap(),
            Value::String("42".to_string())
        );
        assert_eq!(eval_str("double(1)").unwrap(), Value::Double(1.0));
    }
}
