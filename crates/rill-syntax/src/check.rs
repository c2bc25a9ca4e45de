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

//! Type checker.
//!
//! Checking never aborts early: every node is assigned a type (falling back
//! to `dyn` at error sites) and all issues are collected. Issue messages
//! spell operators internally (`_+_`); presentation layers rewrite them.

use std::collections::HashMap;

use crate::ast::{Expr, ExprKind, Literal, ParsedExpr, SourceInfo};
use crate::env::Env;
use crate::error::{Issue, Issues, SourceLocation};
use crate::operators;
use crate::types::Type;

/// The result of a clean check: a type for every node.
#[derive(Debug, Clone)]
pub struct CheckedExpr {
    types: HashMap<u64, Type>,
    result: Type,
}

impl CheckedExpr {
    /// The type assigned to a node.
    pub fn type_of(&self, id: u64) -> Option<Type> {
        self.types.get(&id).copied()
    }

    /// The type of the whole expression.
    pub fn result_type(&self) -> Type {
        self.result
    }
}

/// Type-check a parsed expression against an environment.
pub fn check(parsed: &ParsedExpr, env: &Env) -> Result<CheckedExpr, Issues> {
    let mut checker = Checker {
        env,
        info: &parsed.info,
        types: HashMap::new(),
        issues: Vec::new(),
        scopes: Vec::new(),
    };
    let result = checker.check_expr(&parsed.root, SourceLocation::NONE);
    if checker.issues.is_empty() {
        Ok(CheckedExpr {
            types: checker.types,
            result,
        })
    } else {
        Err(Issues(checker.issues))
    }
}

struct Checker<'a> {
    env: &'a Env,
    info: &'a SourceInfo,
    types: HashMap<u64, Type>,
    issues: Vec<Issue>,
    scopes: Vec<HashMap<String, Type>>,
}

impl Checker<'_> {
    /// The location of a node, or `fallback` for nodes synthesized by
    /// macro expansion.
    fn location(&self, expr: &Expr, fallback: SourceLocation) -> SourceLocation {
        let location = self.info.start_location(expr.id);
        if location.is_valid() {
            location
        } else {
            fallback
        }
    }

    fn issue(&mut self, location: SourceLocation, message: String) {
        self.issues.push(Issue::new(location, message));
    }

    fn lookup(&self, name: &str) -> Option<Type> {
        for scope in self.scopes.iter().rev() {
            if let Some(ty) = scope.get(name) {
                return Some(*ty);
            }
        }
        self.env.variable(name)
    }

    fn check_expr(&mut self, expr: &Expr, fallback: SourceLocation) -> Type {
        let location = self.location(expr, fallback);
        let ty = match &expr.kind {
            ExprKind::Ident(name) => match self.lookup(name) {
                Some(ty) => ty,
                // Type names are values of type `type`.
                None if Type::from_name(name).is_some() => Type::Type,
                None => {
                    self.issue(location, format!("undeclared reference to '{name}'"));
                    Type::Dyn
                }
            },
            ExprKind::Literal(literal) => literal_type(literal),
            ExprKind::List { elements } => {
                for element in elements {
                    self.check_expr(element, location);
                }
                Type::List
            }
            ExprKind::Map { entries } => {
                for entry in entries {
                    self.check_expr(&entry.key, location);
                    self.check_expr(&entry.value, location);
                }
                Type::Map
            }
            ExprKind::Struct { type_name, fields } => {
                for field in fields {
                    self.check_expr(&field.value, location);
                }
                self.issue(location, format!("undeclared reference to '{type_name}'"));
                Type::Dyn
            }
            ExprKind::Select {
                operand, test_only, ..
            } => {
                let operand_ty = self.check_expr(operand, location);
                if !matches!(operand_ty, Type::Map | Type::Dyn) {
                    self.issue(
                        location,
                        format!("type '{operand_ty}' does not support field selection"),
                    );
                }
                if *test_only {
                    Type::Bool
                } else {
                    Type::Dyn
                }
            }
            ExprKind::Call {
                function,
                target,
                args,
            } => self.check_call(function, target.as_deref(), args, location),
            ExprKind::Comprehension {
                iter_var,
                iter_range,
                accu_var,
                accu_init,
                loop_condition,
                loop_step,
                result,
            } => {
                let range_ty = self.check_expr(iter_range, location);
                if !matches!(range_ty, Type::List | Type::Map | Type::Dyn) {
                    let range_location = self.location(iter_range, location);
                    self.issue(
                        range_location,
                        format!("expression of type '{range_ty}' cannot be the range of a comprehension"),
                    );
                }
                let accu_ty = self.check_expr(accu_init, location);

                let mut scope = HashMap::new();
                scope.insert(iter_var.clone(), Type::Dyn);
                scope.insert(accu_var.clone(), accu_ty);
                self.scopes.push(scope);
                let cond_ty = self.check_expr(loop_condition, location);
                if !cond_ty.assignable_to(&Type::Bool) {
                    let cond_location = self.location(loop_condition, location);
                    self.issue(
                        cond_location,
                        format!("expected bool loop condition, found '{cond_ty}'"),
                    );
                }
                let step_ty = self.check_expr(loop_step, location);
                self.scopes.pop();

                // The accumulator may change type across iterations; widen
                // before checking the result expression.
                let accu_final = if step_ty == accu_ty { accu_ty } else { Type::Dyn };
                let mut scope = HashMap::new();
                scope.insert(accu_var.clone(), accu_final);
                self.scopes.push(scope);
                let result_ty = self.check_expr(result, location);
                self.scopes.pop();
                result_ty
            }
            ExprKind::Unspecified => Type::Dyn,
        };
        self.types.insert(expr.id, ty);
        ty
    }

    fn check_call(
        &mut self,
        function: &str,
        target: Option<&Expr>,
        args: &[Expr],
        location: SourceLocation,
    ) -> Type {
        let target_ty = target.map(|t| self.check_expr(t, location));
        let arg_tys: Vec<Type> = args.iter().map(|a| self.check_expr(a, location)).collect();

        // The conditional and the equality operators are polymorphic over
        // operand types and are checked structurally.
        if function == operators::CONDITIONAL && arg_tys.len() == 3 {
            if !arg_tys[0].assignable_to(&Type::Bool) {
                self.issue(
                    location,
                    format!(
                        "found no matching overload for '{function}' applied to ({})",
                        type_list(&arg_tys)
                    ),
                );
            }
            return if arg_tys[1] == arg_tys[2] {
                arg_tys[1]
            } else {
                Type::Dyn
            };
        }
        if (function == operators::EQUALS || function == operators::NOT_EQUALS)
            && arg_tys.len() == 2
        {
            if !arg_tys[0].assignable_to(&arg_tys[1]) && !arg_tys[1].assignable_to(&arg_tys[0]) {
                self.issue(
                    location,
                    format!(
                        "found no matching overload for '{function}' applied to ({})",
                        type_list(&arg_tys)
                    ),
                );
            }
            return Type::Bool;
        }

        if self.env.function(function).is_none() {
            self.issue(location, format!("undeclared function '{function}'"));
            return Type::Dyn;
        }
        match self.env.resolve_call(function, target_ty, &arg_tys) {
            Some(result) => result,
            None => {
                let applied = match target_ty {
                    Some(receiver) => format!("{receiver}.({})", type_list(&arg_tys)),
                    None => format!("({})", type_list(&arg_tys)),
                };
                self.issue(
                    location,
                    format!("found no matching overload for '{function}' applied to {applied}"),
                );
                Type::Dyn
            }
        }
    }
}

fn literal_type(literal: &Literal) -> Type {
    match literal {
        Literal::Int(_) => Type::Int,
        Literal::Uint(_) => Type::Uint,
        Literal::Double(_) => Type::Double,
        Literal::String(_) => Type::String,
        Literal::Bytes(_) => Type::Bytes,
        Literal::Bool(_) => Type::Bool,
        Literal::Null => Type::Null,
    }
}

fn type_list(types: &[Type]) -> String {
    types
        .iter()
        .map(|ty| ty.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn check_ok(source: &str) -> CheckedExpr {
        let parsed = parse(source).unwrap();
        check(&parsed, &Env::standard()).unwrap()
    }

    fn check_err(source: &str) -> Issues {
        let parsed = parse(source).unwrap();
        check(&parsed, &Env::standard()).unwrap_err()
    }

    #[test]
    fn test_arithmetic_types() {
        assert_eq!(check_ok("1 + 2 * 3").result_type(), Type::Int);
        assert_eq!(check_ok("1.5 + 0.5").result_type(), Type::Double);
        assert_eq!(check_ok("'a' + 'b'").result_type(), Type::String);
    }

    #[test]
    fn test_mismatched_addition_reports_overload() {
        let issues = check_err("1 + \"hello\"");
        assert_eq!(issues.errors().len(), 1);
        assert_eq!(
            issues.errors()[0].message,
            "found no matching overload for '_+_' applied to (int, string)"
        );
    }

    #[test]
    fn test_undeclared_reference() {
        let issues = check_err("foo + 1");
        assert!(issues.errors()[0]
            .message
            .contains("undeclared reference to 'foo'"));
    }

    #[test]
    fn test_declared_variable() {
        let parsed = parse("name.startsWith('a')").unwrap();
        let env = Env::standard().with_variable("name", Type::String);
        let checked = check(&parsed, &env).unwrap();
        assert_eq!(checked.result_type(), Type::Bool);
    }

    #[test]
    fn test_comprehension_binds_loop_variable() {
        let checked = check_ok("[1, 2, 3].map(x, x * 2)");
        assert_eq!(checked.result_type(), Type::List);
    }

    #[test]
    fn test_all_issues_collected() {
        let issues = check_err("foo + bar");
        assert_eq!(issues.errors().len(), 2);
    }

    #[test]
    fn test_type_names_are_values() {
        assert_eq!(check_ok("type(1) == int").result_type(), Type::Bool);
    }

    #[test]
    fn test_conditional_result() {
        assert_eq!(check_ok("true ? 1 : 2").result_type(), Type::Int);
        assert_eq!(check_ok("true ? 1 : 'x'").result_type(), Type::Dyn);
    }

    #[test]
    fn test_member_call_overload_mismatch() {
        let issues = check_err("'abc'.contains(1)");
        assert_eq!(
            issues.errors()[0].message,
            "found no matching overload for 'contains' applied to string.(int)"
        );
    }

    #[test]
    fn test_selection_requires_map_like_operand() {
        let issues = check_err("(1).field");
        assert!(issues.errors()[0]
            .message
            .contains("does not support field selection"));
    }

    #[test]
    fn test_types_recorded_per_node() {
        let parsed = parse("1 + 2").unwrap();
        let checked = check(&parsed, &Env::standard()).unwrap();
        let ExprKind::Call { args, .. } = &parsed.root.kind else {
            panic!("expected call");
        };
        assert_eq!(checked.type_of(args[0].id), Some(Type::Int));
        assert_eq!(checked.type_of(parsed.root.id), Some(Type::Int));
    }
}
