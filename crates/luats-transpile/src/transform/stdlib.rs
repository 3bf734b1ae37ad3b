//! Lua standard library calls with a direct TypeScript counterpart.
//!
//! A library name is only recognized while no Lua local shadows it.

use super::expr::is_string_valued;
use super::{Transformer, VARARGS};
use crate::lua::{self, ExprKind as L, FieldKind};
use crate::provenance::Provenance::Synthetic;
use crate::ts::{Expr, ExprKind, Stmt, StmtKind, UnaryOp};

const MATH_FUNCTIONS: &[&str] = &[
    "floor", "ceil", "abs", "sqrt", "max", "min", "sin", "cos", "tan", "exp",
];

/// Lua library tables with no TypeScript global of the same name.
const LIBRARIES: &[&str] = &[
    "math", "string", "table", "os", "io", "coroutine", "debug", "utf8",
];

impl Transformer {
    fn is_global(&self, name: &str) -> bool {
        !self.scope.is_local(name)
    }

    /// The global library table `name` (`math`, `table`, ...) a callee or
    /// field access is rooted at.
    fn library<'e>(&self, object: &'e lua::Expr) -> Option<&'e str> {
        object.as_name().filter(|name| self.is_global(name))
    }

    pub(super) fn lower_library_call(
        &mut self,
        expr: &lua::Expr,
        callee: &lua::Expr,
        args: &[lua::Expr],
    ) -> Option<Expr> {
        match &callee.kind {
            L::Name(name) if self.is_global(name) => self.lower_global_call(expr, name, args),
            L::Field { object, name } => {
                let library = self.library(object)?;
                self.lower_library_function(expr, library, name.as_str(), args)
                    .or_else(|| self.unsupported_library(expr, library, name.as_str()))
            }
            _ => None,
        }
    }

    /// A member of a Lua library table that has no translation.
    fn unsupported_library(&mut self, expr: &lua::Expr, library: &str, member: &str) -> Option<Expr> {
        if !LIBRARIES.contains(&library) {
            return None;
        }
        let function = format!("{library}.{member}");
        self.diagnostics.unsupported(
            expr.span,
            format!("`{function}` has no TypeScript counterpart"),
        );
        Some(self.placeholder_call(expr, &function))
    }

    fn lower_global_call(&mut self, expr: &lua::Expr, name: &str, args: &[lua::Expr]) -> Option<Expr> {
        let lowered = match (name, args) {
            ("print", _) => {
                let log = self.b.global_member("console", "log");
                let args = self.lower_multi(args);
                self.b.call(expr, log, args)
            }
            ("tostring", [value]) => self.wrap_global(expr, "String", value),
            ("tonumber", [value]) => self.wrap_global(expr, "Number", value),
            ("tonumber", [value, base]) => {
                let parse = self.b.name(Synthetic, "parseInt");
                let value = self.lower_expr(value);
                let base = self.lower_expr(base);
                self.b.call(expr, parse, vec![value, base])
            }
            ("type", [value]) => {
                self.diagnostics.semantic(
                    expr.span,
                    "`type` returns Lua type names; `typeof` returns TypeScript ones",
                );
                let value = self.lower_expr(value);
                self.b.unary(expr, UnaryOp::TypeOf, value)
            }
            ("unpack", [table]) => self.first_element(expr, table),
            ("select", [selector, rest])
                if matches!(rest.kind, L::Vararg) && self.scope.has_varargs() =>
            {
                let varargs = self.b.name(Synthetic, VARARGS);
                if selector.as_string() == Some("#") {
                    self.b.member(expr, varargs, "length")
                } else {
                    let slice = self.b.member(Synthetic, varargs, "slice");
                    let start = self.minus_one(selector);
                    self.b.call(expr, slice, vec![start])
                }
            }
            ("setmetatable", [object, metatable]) => self.lower_setmetatable(expr, object, metatable),
            ("getmetatable", [object]) => {
                self.diagnostics.semantic(
                    expr.span,
                    "`getmetatable` is approximated by the object's prototype",
                );
                let get = self.b.global_member("Object", "getPrototypeOf");
                let object = self.lower_expr(object);
                self.b.call(expr, get, vec![object])
            }
            _ => return None,
        };
        Some(lowered)
    }

    fn lower_library_function(
        &mut self,
        expr: &lua::Expr,
        library: &str,
        function: &str,
        args: &[lua::Expr],
    ) -> Option<Expr> {
        let lowered = match (library, function, args) {
            ("math", f, _) if MATH_FUNCTIONS.contains(&f) => {
                let callee = self.b.global_member("Math", f);
                let args = self.lower_multi(args);
                self.b.call(expr, callee, args)
            }
            ("math", "log", [value]) => {
                let callee = self.b.global_member("Math", "log");
                let value = self.lower_expr(value);
                self.b.call(expr, callee, vec![value])
            }
            ("table", "insert", [table, value]) => self.method(expr, table, "push", &[value]),
            ("table", "insert", [table, position, value]) => {
                let table = self.lower_expr(table);
                let splice = self.b.member(Synthetic, table, "splice");
                let start = self.minus_one(position);
                let zero = self.b.number(Synthetic, 0.0);
                let value = self.lower_expr(value);
                self.b.call(expr, splice, vec![start, zero, value])
            }
            ("table", "remove", [table]) => self.method(expr, table, "pop", &[]),
            ("table", "remove", [table, position]) => {
                let table = self.lower_expr(table);
                let splice = self.b.member(Synthetic, table, "splice");
                let start = self.minus_one(position);
                let one = self.b.number(Synthetic, 1.0);
                let removed = self.b.call(Synthetic, splice, vec![start, one]);
                let zero = self.b.number(Synthetic, 0.0);
                self.b.index(expr, removed, zero)
            }
            ("table", "concat", [table]) => {
                let table = self.lower_expr(table);
                let join = self.b.member(Synthetic, table, "join");
                let separator = self.b.string(Synthetic, "");
                self.b.call(expr, join, vec![separator])
            }
            ("table", "concat", [table, separator]) => self.method(expr, table, "join", &[separator]),
            ("table", "unpack", [table]) => self.first_element(expr, table),
            ("string", "upper", [value]) => self.method(expr, value, "toUpperCase", &[]),
            ("string", "lower", [value]) => self.method(expr, value, "toLowerCase", &[]),
            ("string", "rep", [value, count]) => self.method(expr, value, "repeat", &[count]),
            ("string", "len", [value]) => {
                let value = self.lower_expr(value);
                self.b.member(expr, value, "length")
            }
            _ => return None,
        };
        Some(lowered)
    }

    /// `s:upper()` and friends, when `object` is known to be a string.
    ///
    /// Any other receiver keeps a plain method call, which is only reported
    /// when the method name is one of the translated string methods.
    pub(super) fn lower_string_method(
        &mut self,
        expr: &lua::Expr,
        object: &lua::Expr,
        method: &str,
        args: &[lua::Expr],
    ) -> Option<Expr> {
        let translated = matches!(
            (method, args),
            ("upper" | "lower" | "len", []) | ("rep", [_])
        );
        if !is_string_valued(object) {
            if translated {
                self.diagnostics.semantic(
                    expr.span,
                    format!("`:{method}()` may be a Lua string method; it is kept as a plain method call"),
                );
            }
            return None;
        }
        let lowered = match (method, args) {
            ("upper", []) => self.method(expr, object, "toUpperCase", &[]),
            ("lower", []) => self.method(expr, object, "toLowerCase", &[]),
            ("rep", [count]) => self.method(expr, object, "repeat", &[count]),
            ("len", []) => {
                let object = self.lower_expr(object);
                self.b.member(expr, object, "length")
            }
            _ => return self.unsupported_library(expr, "string", method),
        };
        Some(lowered)
    }

    /// Library constants read as fields (`math.huge`, `math.pi`).
    pub(super) fn lower_library_field(
        &mut self,
        expr: &lua::Expr,
        object: &lua::Expr,
        field: &str,
    ) -> Option<Expr> {
        let library = self.library(object)?;
        match (library, field) {
            ("math", "huge") => Some(self.b.name(expr, "Infinity")),
            ("math", "pi") => {
                let math = self.b.name(Synthetic, "Math");
                Some(self.b.member(expr, math, "PI"))
            }
            _ => self.unsupported_library(expr, library, field),
        }
    }

    /// The table of `table.unpack(t)` / `unpack(t)`, which spreads when it is
    /// the last value of a list.
    pub(super) fn unpack_argument<'e>(&self, expr: &'e lua::Expr) -> Option<&'e lua::Expr> {
        let L::Call { callee, args } = &expr.kind else {
            return None;
        };
        let [table] = args.as_slice() else {
            return None;
        };
        let is_unpack = match &callee.kind {
            L::Name(name) => name == "unpack" && self.is_global(name),
            L::Field { object, name } => {
                self.library(object) == Some("table") && name.as_str() == "unpack"
            }
            _ => false,
        };
        is_unpack.then_some(table)
    }

    /// `error(msg)` as a statement: `throw new Error(msg);`.
    pub(super) fn lower_error_call(&mut self, stmt: &lua::Stmt, call: &lua::Expr) -> Option<Stmt> {
        let L::Call { callee, args } = &call.kind else {
            return None;
        };
        if callee.as_name() != Some("error") || !self.is_global("error") {
            return None;
        }
        let thrown = match args.first() {
            // error objects are thrown as they are
            Some(value) if matches!(value.kind, L::Table(_)) => self.lower_expr(value),
            message => {
                let error = self.b.name(Synthetic, "Error");
                let args = message.map(|m| self.lower_expr(m)).into_iter().collect();
                self.b.expr(
                    call,
                    ExprKind::New {
                        callee: Box::new(error),
                        args,
                    },
                )
            }
        };
        Some(self.b.stmt(stmt, StmtKind::Throw(thrown)))
    }

    /// `setmetatable(o, mt)` becomes `Object.setPrototypeOf(o, proto)`, where
    /// `proto` is the `__index` table. Operator metamethods are reported.
    fn lower_setmetatable(
        &mut self,
        expr: &lua::Expr,
        object: &lua::Expr,
        metatable: &lua::Expr,
    ) -> Expr {
        let target = self.lower_expr(object);
        let prototype = match &metatable.kind {
            L::Table(fields) => {
                let mut index = None;
                for field in fields {
                    match &field.kind {
                        FieldKind::Named(name, value) if name.as_str() == "__index" => {
                            if matches!(value.kind, L::Function(_)) {
                                self.diagnostics
                                    .unsupported(field.span, "`__index` functions are not supported");
                            }
                            index = Some(value);
                        }
                        FieldKind::Named(name, _) => {
                            self.diagnostics.unsupported(
                                field.span,
                                format!(
                                    "metatable field `{}` (operator overloading) is not supported",
                                    name.as_str()
                                ),
                            );
                        }
                        _ => {
                            self.diagnostics
                                .unsupported(field.span, "unnamed metatable fields are not supported");
                        }
                    }
                }
                match index {
                    Some(value) => self.lower_prototype(value),
                    None => self.lower_expr(metatable),
                }
            }
            _ => {
                self.diagnostics.semantic(
                    metatable.span,
                    "metatable contents are unknown; only `__index` lookups are approximated",
                );
                self.lower_prototype(metatable)
            }
        };
        let set = self.b.global_member("Object", "setPrototypeOf");
        self.b.call(expr, set, vec![target, prototype])
    }

    /// Instances of the generated class inherit from `Class.prototype`.
    fn lower_prototype(&mut self, value: &lua::Expr) -> Expr {
        let lowered = self.lower_expr(value);
        let is_class = match (&self.class, value.as_name()) {
            (Some(class), Some(name)) => class == name,
            _ => false,
        };
        if is_class {
            self.b.member(Synthetic, lowered, "prototype")
        } else {
            lowered
        }
    }

    fn wrap_global(&mut self, expr: &lua::Expr, function: &str, value: &lua::Expr) -> Expr {
        let callee = self.b.name(Synthetic, function);
        let value = self.lower_expr(value);
        self.b.call(expr, callee, vec![value])
    }

    fn first_element(&mut self, expr: &lua::Expr, table: &lua::Expr) -> Expr {
        let table = self.lower_expr(table);
        let zero = self.b.number(Synthetic, 0.0);
        self.b.index(expr, table, zero)
    }

    /// `receiver.method(args)`.
    fn method(&mut self, expr: &lua::Expr, receiver: &lua::Expr, method: &str, args: &[&lua::Expr]) -> Expr {
        let receiver = self.lower_expr(receiver);
        let callee = self.b.member(Synthetic, receiver, method);
        let args = args.iter().map(|arg| self.lower_expr(arg)).collect();
        self.b.call(expr, callee, args)
    }
}
