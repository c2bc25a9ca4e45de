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

//! The declaration environment: variables, functions, operators, and
//! macros, together with the documentation shown by editor tooling.

use std::collections::HashMap;

use crate::operators;
use crate::types::Type;

/// What a documentation entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocKind {
    /// A global function.
    Function,
    /// A method (receiver call).
    Method,
    /// A comprehension macro.
    Macro,
    /// An operator.
    Operator,
    /// A type name.
    Type,
    /// One overload of the parent entry.
    Overload,
    /// A usage example of the parent entry.
    Example,
}

/// One documentation entry. Overloads and examples are `children`.
#[derive(Debug, Clone)]
pub struct Doc {
    /// What this entry describes.
    pub kind: DocKind,
    /// Display name.
    pub name: String,
    /// Signature text, empty when not applicable.
    pub signature: String,
    /// One-paragraph description.
    pub description: String,
    /// Overload and example entries.
    pub children: Vec<Doc>,
}

impl Doc {
    fn new(kind: DocKind, name: &str, signature: &str, description: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
            signature: signature.to_string(),
            description: description.to_string(),
            children: Vec::new(),
        }
    }

    fn overload(mut self, signature: &str) -> Self {
        self.children
            .push(Doc::new(DocKind::Overload, "", signature, ""));
        self
    }

    fn example(mut self, text: &str) -> Self {
        self.children.push(Doc::new(DocKind::Example, "", text, ""));
        self
    }
}

/// One callable overload. For member overloads the receiver type is
/// `params[0]`.
#[derive(Debug, Clone)]
pub struct Overload {
    /// True for receiver-style calls.
    pub member: bool,
    /// Parameter types, receiver first for member overloads.
    pub params: Vec<Type>,
    /// Result type.
    pub result: Type,
}

/// A declared function with its overloads and documentation.
#[derive(Debug, Clone)]
pub struct Function {
    /// Declared name (internal spelling for operators).
    pub name: String,
    /// All overloads, member and global mixed.
    pub overloads: Vec<Overload>,
    /// Documentation shown on hover and in completion.
    pub doc: Doc,
}

impl Function {
    /// True if any overload is a member (receiver) overload.
    pub fn has_member_overload(&self) -> bool {
        self.overloads.iter().any(|o| o.member)
    }

    /// True if any overload is a global overload.
    pub fn has_global_overload(&self) -> bool {
        self.overloads.iter().any(|o| !o.member)
    }

    /// True if some member overload accepts `receiver` as its receiver.
    pub fn accepts_receiver(&self, receiver: Type) -> bool {
        self.overloads
            .iter()
            .any(|o| o.member && !o.params.is_empty() && receiver.assignable_to(&o.params[0]))
    }
}

/// The declaration environment.
#[derive(Debug, Clone)]
pub struct Env {
    variables: HashMap<String, Type>,
    functions: Vec<Function>,
    function_index: HashMap<String, usize>,
    macros: Vec<Doc>,
}

impl Env {
    /// The standard environment: operators, the standard function library,
    /// and the comprehension macros. No variables are declared.
    pub fn standard() -> Self {
        let mut env = Env {
            variables: HashMap::new(),
            functions: Vec::new(),
            function_index: HashMap::new(),
            macros: standard_macros(),
        };
        for function in standard_functions() {
            env.add_function(function);
        }
        for function in standard_operators() {
            env.add_function(function);
        }
        env
    }

    /// Declare a variable. Later declarations shadow earlier ones.
    pub fn with_variable(mut self, name: &str, ty: Type) -> Self {
        self.variables.insert(name.to_string(), ty);
        self
    }

    fn add_function(&mut self, function: Function) {
        self.function_index
            .insert(function.name.clone(), self.functions.len());
        self.functions.push(function);
    }

    /// The type of a declared variable.
    pub fn variable(&self, name: &str) -> Option<Type> {
        self.variables.get(name).copied()
    }

    /// All declared variables, in no particular order.
    pub fn variables(&self) -> impl Iterator<Item = (&str, Type)> {
        self.variables.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    /// Look up a function or operator by name.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.function_index.get(name).map(|&i| &self.functions[i])
    }

    /// All declared functions and operators.
    pub fn functions(&self) -> &[Function] {
        &self.functions
    }

    /// Documentation for the comprehension macros.
    pub fn macros(&self) -> &[Doc] {
        &self.macros
    }

    /// Documentation for a macro by name.
    pub fn macro_doc(&self, name: &str) -> Option<&Doc> {
        self.macros.iter().find(|d| d.name == name)
    }

    /// Resolve a call against the declared overloads. `target` is the
    /// receiver type for member calls. Returns the result type, or `None`
    /// when no overload matches.
    pub fn resolve_call(
        &self,
        function: &str,
        target: Option<Type>,
        args: &[Type],
    ) -> Option<Type> {
        let function = self.function(function)?;
        let mut result: Option<Type> = None;
        for overload in &function.overloads {
            let matched = match target {
                Some(receiver) => {
                    overload.member
                        && overload.params.len() == args.len() + 1
                        && receiver.assignable_to(&overload.params[0])
                        && args
                            .iter()
                            .zip(&overload.params[1..])
                            .all(|(arg, param)| arg.assignable_to(param))
                }
                None => {
                    !overload.member
                        && overload.params.len() == args.len()
                        && args
                            .iter()
                            .zip(&overload.params)
                            .all(|(arg, param)| arg.assignable_to(param))
                }
            };
            if matched {
                result = match result {
                    None => Some(overload.result),
                    Some(prev) if prev == overload.result => Some(prev),
                    // Ambiguous under dyn arguments.
                    Some(_) => Some(Type::Dyn),
                };
            }
        }
        result
    }
}

fn function(name: &str, doc: Doc, overloads: Vec<Overload>) -> Function {
    Function {
        name: name.to_string(),
        overloads,
        doc,
    }
}

fn global(params: &[Type], result: Type) -> Overload {
    Overload {
        member: false,
        params: params.to_vec(),
        result,
    }
}

fn member(params: &[Type], result: Type) -> Overload {
    Overload {
        member: true,
        params: params.to_vec(),
        result,
    }
}

fn standard_functions() -> Vec<Function> {
    use Type::{Bool, Bytes, Double, Dyn, Int, List, Map, String, Uint};
    vec![
        function(
            "size",
            Doc::new(
                DocKind::Function,
                "size",
                "size(string|bytes|list|map) -> int",
                "Returns the number of elements of a collection, or the length of a string or bytes value.",
            )
            .overload("size(string) -> int")
            .overload("size(bytes) -> int")
            .overload("size(list) -> int")
            .overload("size(map) -> int")
            .example("size([1, 2, 3]) == 3")
            .example("'hello'.size() == 5"),
            vec![
                global(&[String], Int),
                global(&[Bytes], Int),
                global(&[List], Int),
                global(&[Map], Int),
                member(&[String], Int),
                member(&[Bytes], Int),
                member(&[List], Int),
                member(&[Map], Int),
            ],
        ),
        function(
            "contains",
            Doc::new(
                DocKind::Method,
                "contains",
                "string.contains(string) -> bool",
                "Tests whether the receiver contains the argument as a substring.",
            )
            .example("'hello'.contains('ell')"),
            vec![member(&[String, String], Bool)],
        ),
        function(
            "startsWith",
            Doc::new(
                DocKind::Method,
                "startsWith",
                "string.startsWith(string) -> bool",
                "Tests whether the receiver begins with the argument.",
            )
            .example("'hello'.startsWith('he')"),
            vec![member(&[String, String], Bool)],
        ),
        function(
            "endsWith",
            Doc::new(
                DocKind::Method,
                "endsWith",
                "string.endsWith(string) -> bool",
                "Tests whether the receiver ends with the argument.",
            )
            .example("'hello'.endsWith('lo')"),
            vec![member(&[String, String], Bool)],
        ),
        function(
            "matches",
            Doc::new(
                DocKind::Method,
                "matches",
                "string.matches(string) -> bool",
                "Tests whether the receiver matches the argument interpreted as a regular expression.",
            )
            .overload("matches(string, string) -> bool")
            .overload("string.matches(string) -> bool")
            .example("'hello'.matches('h.*o')"),
            vec![
                global(&[String, String], Bool),
                member(&[String, String], Bool),
            ],
        ),
        function(
            "string",
            Doc::new(
                DocKind::Function,
                "string",
                "string(int|uint|double|bool|bytes|string) -> string",
                "Converts the argument to a string.",
            )
            .example("string(42) == '42'"),
            vec![
                global(&[Int], String),
                global(&[Uint], String),
                global(&[Double], String),
                global(&[Bool], String),
                global(&[Bytes], String),
                global(&[String], String),
            ],
        ),
        function(
            "int",
            Doc::new(
                DocKind::Function,
                "int",
                "int(int|uint|double|string) -> int",
                "Converts the argument to a signed integer.",
            )
            .example("int('42') == 42"),
            vec![
                global(&[Int], Int),
                global(&[Uint], Int),
                global(&[Double], Int),
                global(&[String], Int),
            ],
        ),
        function(
            "uint",
            Doc::new(
                DocKind::Function,
                "uint",
                "uint(int|uint|double|string) -> uint",
                "Converts the argument to an unsigned integer.",
            )
            .example("uint(42) == 42u"),
            vec![
                global(&[Int], Uint),
                global(&[Uint], Uint),
                global(&[Double], Uint),
                global(&[String], Uint),
            ],
        ),
        function(
            "double",
            Doc::new(
                DocKind::Function,
                "double",
                "double(int|uint|double|string) -> double",
                "Converts the argument to a double.",
            )
            .example("double(1) == 1.0"),
            vec![
                global(&[Int], Double),
                global(&[Uint], Double),
                global(&[Double], Double),
                global(&[String], Double),
            ],
        ),
        function(
            "bytes",
            Doc::new(
                DocKind::Function,
                "bytes",
                "bytes(string|bytes) -> bytes",
                "Converts the argument to a byte string.",
            )
            .example("bytes('abc')"),
            vec![global(&[String], Bytes), global(&[Bytes], Bytes)],
        ),
        function(
            "bool",
            Doc::new(
                DocKind::Function,
                "bool",
                "bool(string|bool) -> bool",
                "Converts the argument to a boolean.",
            )
            .example("bool('true')"),
            vec![global(&[String], Bool), global(&[Bool], Bool)],
        ),
        function(
            "type",
            Doc::new(
                DocKind::Function,
                "type",
                "type(dyn) -> type",
                "Returns the type of the argument as a value.",
            )
            .example("type(1) == int"),
            vec![global(&[Dyn], Type::Type)],
        ),
    ]
}

fn operator(name: &str, description: &str, overloads: Vec<Overload>) -> Function {
    let mut doc = Doc::new(
        DocKind::Operator,
        operators::find_reverse(name).unwrap_or(name),
        "",
        description,
    );
    for overload in &overloads {
        let params = overload
            .params
            .iter()
            .map(Type::name)
            .collect::<Vec<_>>()
            .join(", ");
        doc = doc.overload(&format!("{name}: ({params}) -> {}", overload.result));
    }
    function(name, doc, overloads)
}

fn standard_operators() -> Vec<Function> {
    use Type::{Bool, Bytes, Double, Dyn, Int, List, Map, String, Uint};
    let numeric = |result_of: fn(Type) -> Type| {
        vec![
            global(&[Int, Int], result_of(Int)),
            global(&[Uint, Uint], result_of(Uint)),
            global(&[Double, Double], result_of(Double)),
        ]
    };
    let same = |t: Type| t;
    let comparisons = vec![
        global(&[Int, Int], Bool),
        global(&[Uint, Uint], Bool),
        global(&[Double, Double], Bool),
        global(&[String, String], Bool),
        global(&[Bytes, Bytes], Bool),
        global(&[Bool, Bool], Bool),
    ];
    let mut add = numeric(same);
    add.push(global(&[String, String], String));
    add.push(global(&[Bytes, Bytes], Bytes));
    add.push(global(&[List, List], List));

    vec![
        operator(
            operators::LOGICAL_AND,
            "Logical conjunction.",
            vec![global(&[Bool, Bool], Bool)],
        ),
        operator(
            operators::LOGICAL_OR,
            "Logical disjunction.",
            vec![global(&[Bool, Bool], Bool)],
        ),
        operator(
            operators::LOGICAL_NOT,
            "Logical negation.",
            vec![global(&[Bool], Bool)],
        ),
        operator(
            operators::EQUALS,
            "Equality. Operands must have comparable types.",
            vec![global(&[Dyn, Dyn], Bool)],
        ),
        operator(
            operators::NOT_EQUALS,
            "Inequality. Operands must have comparable types.",
            vec![global(&[Dyn, Dyn], Bool)],
        ),
        operator(operators::LESS, "Ordering comparison.", comparisons.clone()),
        operator(
            operators::LESS_EQUALS,
            "Ordering comparison.",
            comparisons.clone(),
        ),
        operator(operators::GREATER, "Ordering comparison.", comparisons.clone()),
        operator(operators::GREATER_EQUALS, "Ordering comparison.", comparisons),
        operator(
            operators::ADD,
            "Addition, or concatenation of strings, bytes, and lists.",
            add,
        ),
        operator(operators::SUBTRACT, "Subtraction.", numeric(same)),
        operator(operators::MULTIPLY, "Multiplication.", numeric(same)),
        operator(operators::DIVIDE, "Division.", numeric(same)),
        operator(
            operators::MODULO,
            "Remainder.",
            vec![global(&[Int, Int], Int), global(&[Uint, Uint], Uint)],
        ),
        operator(
            operators::NEGATE,
            "Arithmetic negation.",
            vec![global(&[Int], Int), global(&[Double], Double)],
        ),
        operator(
            operators::IN,
            "Membership test over lists and map keys.",
            vec![global(&[Dyn, List], Bool), global(&[Dyn, Map], Bool)],
        ),
        operator(
            operators::INDEX,
            "Indexing into a list or map.",
            vec![global(&[List, Int], Dyn), global(&[Map, Dyn], Dyn)],
        ),
        operator(
            operators::CONDITIONAL,
            "Ternary conditional.",
            vec![global(&[Bool, Dyn, Dyn], Dyn)],
        ),
    ]
}

fn standard_macros() -> Vec<Doc> {
    vec![
        Doc::new(
            DocKind::Macro,
            operators::MACRO_HAS,
            "has(e.f) -> bool",
            "Tests whether the field `f` is present on `e`.",
        )
        .example("has(request.path)"),
        Doc::new(
            DocKind::Macro,
            operators::MACRO_ALL,
            "e.all(x, p) -> bool",
            "True if the predicate `p` holds for every element `x` of `e`.",
        )
        .example("[1, 2, 3].all(x, x > 0)"),
        Doc::new(
            DocKind::Macro,
            operators::MACRO_EXISTS,
            "e.exists(x, p) -> bool",
            "True if the predicate `p` holds for at least one element `x` of `e`.",
        )
        .example("[1, 2, 3].exists(x, x > 2)"),
        Doc::new(
            DocKind::Macro,
            operators::MACRO_EXISTS_ONE,
            "e.exists_one(x, p) -> bool",
            "True if the predicate `p` holds for exactly one element `x` of `e`.",
        )
        .example("[1, 2, 3].exists_one(x, x == 2)"),
        Doc::new(
            DocKind::Macro,
            operators::MACRO_MAP,
            "e.map(x, t) -> list",
            "Transforms each element `x` of `e` by the expression `t`.",
        )
        .example("[1, 2, 3].map(x, x * 2)"),
        Doc::new(
            DocKind::Macro,
            operators::MACRO_FILTER,
            "e.filter(x, p) -> list",
            "Keeps the elements `x` of `e` for which the predicate `p` holds.",
        )
        .example("[1, 2, 3].filter(x, x % 2 == 1)"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_global_call() {
        let env = Env::standard();
        assert_eq!(
            env.resolve_call("size", None, &[Type::String]),
            Some(Type::Int)
        );
        assert_eq!(env.resolve_call("size", None, &[Type::Int]), None);
    }

    #[test]
    fn test_resolve_member_call() {
        let env = Env::standard();
        assert_eq!(
            env.resolve_call("startsWith", Some(Type::String), &[Type::String]),
            Some(Type::Bool)
        );
        assert_eq!(
            env.resolve_call("startsWith", None, &[Type::String, Type::String]),
            None
        );
    }

    #[test]
    fn test_dyn_receiver_matches() {
        let env = Env::standard();
        assert_eq!(
            env.resolve_call("contains", Some(Type::Dyn), &[Type::String]),
            Some(Type::Bool)
        );
    }

    #[test]
    fn test_operator_overloads() {
        let env = Env::standard();
        assert_eq!(
            env.resolve_call(operators::ADD, None, &[Type::Int, Type::Int]),
            Some(Type::Int)
        );
        assert_eq!(
            env.resolve_call(operators::ADD, None, &[Type::Int, Type::String]),
            None
        );
        assert_eq!(
            env.resolve_call(operators::ADD, None, &[Type::String, Type::String]),
            Some(Type::String)
        );
    }

    #[test]
    fn test_dyn_argument_ambiguity_widens() {
        let env = Env::standard();
        assert_eq!(
            env.resolve_call(operators::ADD, None, &[Type::Dyn, Type::Dyn]),
            Some(Type::Dyn)
        );
    }

    #[test]
    fn test_variables() {
        let env = Env::standard().with_variable("request", Type::Map);
        assert_eq!(env.variable("request"), Some(Type::Map));
        assert_eq!(env.variable("missing"), None);
    }

    #[test]
    fn test_macro_docs_present() {
        let env = Env::standard();
        assert_eq!(env.macros().len(), 6);
        let doc = env.macro_doc("map").unwrap();
        assert_eq!(doc.kind, DocKind::Macro);
        assert!(!doc.children.is_empty());
    }
}
