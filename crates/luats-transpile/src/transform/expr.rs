//! Expression lowering.

use super::scope::Target;
use super::{Transformer, VARARGS, contains_call};
use crate::lua::{self, BinaryOp as LuaBinary, ExprKind as L, FieldKind, UnaryOp as LuaUnary};
use crate::provenance::Provenance::{self, Synthetic};
use crate::ts::{
    BinaryOp, Expr, ExprKind, Function, Param, PropKey, UnaryOp, format_number,
    is_reserved_word, is_valid_identifier,
};

/// How a Lua function body is turned into a TypeScript function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionStyle {
    /// `(a) => { ... }`
    Arrow,
    /// `function (a) { ... }` or a named declaration.
    Plain,
    /// Like `Plain`, with the implicit `self` bound to `this`.
    Method,
}

impl Transformer {
    pub(super) fn lower_expr(&mut self, expr: &lua::Expr) -> Expr {
        match &expr.kind {
            L::Nil => self.b.name(expr, "undefined"),
            L::True => self.b.expr(expr, ExprKind::Bool(true)),
            L::False => self.b.expr(expr, ExprKind::Bool(false)),
            L::Number(number) => self.lower_number(expr, number),
            L::String(value) => self.b.string(expr, value.as_str()),
            L::Vararg => self.lower_vararg(expr, false),
            L::Function(body) => {
                let function = self.lower_function(body, FunctionStyle::Arrow, None);
                self.b.expr(expr, ExprKind::Arrow(Box::new(function)))
            }
            L::Table(fields) => self.lower_table(expr, fields),
            L::Binary { op, lhs, rhs } => self.lower_binary(expr, *op, lhs, rhs),
            L::Unary { op, operand } => self.lower_unary(expr, *op, operand),
            L::Name(name) => self.lower_name(expr, name),
            L::Index { object, key } => self.lower_index(expr, object, key),
            L::Field { object, name } => {
                if let Some(lowered) = self.lower_library_field(expr, object, name.as_str()) {
                    return lowered;
                }
                let object = self.lower_expr(object);
                self.b.member(expr, object, name.as_str())
            }
            L::Call { callee, args } => {
                if let Some(lowered) = self.lower_library_call(expr, callee, args) {
                    return lowered;
                }
                let callee = self.lower_expr(callee);
                let args = self.lower_multi(args);
                self.b.call(expr, callee, args)
            }
            L::MethodCall {
                object,
                method,
                args,
            } => {
                if let Some(lowered) = self.lower_string_method(expr, object, method.as_str(), args)
                {
                    return lowered;
                }
                let object = self.lower_expr(object);
                let callee = self.b.member(Synthetic, object, method.as_str());
                let args = self.lower_multi(args);
                self.b.call(expr, callee, args)
            }
            L::Paren(inner) => {
                let inner = self.lower_expr(inner);
                self.b.expr(expr, ExprKind::Paren(Box::new(inner)))
            }
        }
    }

    /// Lowers a list where the last element may expand to several values
    /// (argument lists, table constructors, `return a, ...`).
    pub(super) fn lower_multi(&mut self, exprs: &[lua::Expr]) -> Vec<Expr> {
        let last = exprs.len().saturating_sub(1);
        let mut lowered = Vec::with_capacity(exprs.len());
        for (i, expr) in exprs.iter().enumerate() {
            let value = if i == last {
                self.lower_tail(expr)
            } else {
                self.lower_expr(expr)
            };
            lowered.push(value);
        }
        lowered
    }

    fn lower_tail(&mut self, expr: &lua::Expr) -> Expr {
        if matches!(expr.kind, L::Vararg) {
            return self.lower_vararg(expr, true);
        }
        if let Some(table) = self.unpack_argument(expr) {
            let table = self.lower_expr(table);
            return self.b.expr(expr, ExprKind::Spread(Box::new(table)));
        }
        self.lower_expr(expr)
    }

    /// Lowers the value side of a multiple assignment: a call stays a call,
    /// `...` becomes the whole `varargs` array.
    pub(super) fn lower_destructured(&mut self, expr: &lua::Expr) -> Expr {
        if matches!(expr.kind, L::Vararg) && self.scope.has_varargs() {
            return self.b.name(expr, VARARGS);
        }
        self.lower_expr(expr)
    }

    fn lower_number(&mut self, expr: &lua::Expr, number: &lua::NumberLit) -> Expr {
        if number.value.is_nan() {
            return self.b.name(expr, "NaN");
        }
        if number.value.is_infinite() {
            return self.b.name(expr, "Infinity");
        }
        let text = if is_ts_number(&number.text) {
            number.text.clone()
        } else {
            format_number(number.value)
        };
        self.b.expr(expr, ExprKind::Number(text))
    }

    pub(super) fn lower_vararg(&mut self, expr: &lua::Expr, spread: bool) -> Expr {
        if !self.scope.has_varargs() {
            let message = if self.scope.in_chunk_function() {
                "chunk-level varargs (`...`) are not supported"
            } else {
                "`...` used outside a vararg function"
            };
            self.diagnostics.unsupported(expr.span, message);
            return self.placeholder_call(expr, "...");
        }
        let varargs = self.b.name(Synthetic, VARARGS);
        if spread {
            self.b.expr(expr, ExprKind::Spread(Box::new(varargs)))
        } else {
            let zero = self.b.number(Synthetic, 0.0);
            self.b.index(expr, varargs, zero)
        }
    }

    pub(super) fn lower_function(
        &mut self,
        body: &lua::FuncBody,
        style: FunctionStyle,
        name: Option<crate::ts::Ident>,
    ) -> Function {
        self.scope
            .push_function(style == FunctionStyle::Arrow, body.is_vararg);
        if style == FunctionStyle::Method {
            self.scope.declare_self();
        }

        let mut params = Vec::with_capacity(body.params.len() + 1);
        for param in &body.params {
            let ts_name = self.scope.declare(param.as_str(), false, false);
            params.push(Param {
                name: self.b.ident(param, ts_name),
                rest: false,
            });
        }
        if body.is_vararg {
            params.push(Param {
                name: self.b.ident(Synthetic, VARARGS),
                rest: true,
            });
        }

        let stmts = self.lower_stmts(&body.body);
        self.scope.pop_function();

        Function {
            name,
            params,
            body: stmts,
            is_generator: false,
        }
    }

    fn lower_table(&mut self, expr: &lua::Expr, fields: &[lua::Field]) -> Expr {
        if fields.is_empty() {
            return self.b.expr(expr, ExprKind::Object(Vec::new()));
        }

        let positional: Option<Vec<lua::Expr>> = fields
            .iter()
            .map(|field| match &field.kind {
                FieldKind::Positional(value) => Some(value.clone()),
                _ => None,
            })
            .collect();
        if let Some(items) = positional {
            let items = self.lower_multi(&items);
            return self.b.expr(expr, ExprKind::Array(items));
        }

        let mut props = Vec::with_capacity(fields.len());
        let mut position = 0.0;
        for field in fields {
            let (key, value) = match &field.kind {
                FieldKind::Positional(value) => {
                    let key = PropKey::Number(format_number(position));
                    position += 1.0;
                    (key, self.lower_expr(value))
                }
                FieldKind::Named(name, value) => (string_key(name.as_str()), self.lower_expr(value)),
                FieldKind::Keyed(key, value) => {
                    let key = self.lower_table_key(key);
                    (key, self.lower_expr(value))
                }
            };
            props.push(self.b.prop(field, key, value));
        }
        self.b.expr(expr, ExprKind::Object(props))
    }

    fn lower_table_key(&mut self, key: &lua::Expr) -> PropKey {
        match &key.kind {
            L::String(value) => string_key(value),
            L::Number(number) if is_integral(number.value) => {
                PropKey::Number(format_number(number.value - 1.0))
            }
            L::Number(number) => PropKey::Number(number.text.clone()),
            _ => PropKey::Computed(self.lower_expr(key)),
        }
    }

    fn lower_binary(
        &mut self,
        expr: &lua::Expr,
        op: LuaBinary,
        lhs: &lua::Expr,
        rhs: &lua::Expr,
    ) -> Expr {
        let op = match op {
            LuaBinary::Concat => return self.lower_concat(expr, lhs, rhs),
            LuaBinary::IntDiv => {
                let left = self.lower_expr(lhs);
                let right = self.lower_expr(rhs);
                let quotient = self.b.binary(Synthetic, BinaryOp::Div, left, right);
                let floor = self.b.global_member("Math", "floor");
                return self.b.call(expr, floor, vec![quotient]);
            }
            LuaBinary::Add => BinaryOp::Add,
            LuaBinary::Sub => BinaryOp::Sub,
            LuaBinary::Mul => BinaryOp::Mul,
            LuaBinary::Div => BinaryOp::Div,
            LuaBinary::Mod => {
                self.diagnostics.semantic(
                    expr.span,
                    "`%` rounds differently for negative operands (Lua floors, TypeScript truncates)",
                );
                BinaryOp::Mod
            }
            LuaBinary::Pow => BinaryOp::Exp,
            LuaBinary::Eq => BinaryOp::StrictEq,
            LuaBinary::Ne => BinaryOp::StrictNe,
            LuaBinary::Lt => BinaryOp::Lt,
            LuaBinary::Le => BinaryOp::Le,
            LuaBinary::Gt => BinaryOp::Gt,
            LuaBinary::Ge => BinaryOp::Ge,
            LuaBinary::And | LuaBinary::Or => {
                if !(is_boolean(lhs) && is_boolean(rhs)) {
                    let keyword = if op == LuaBinary::And { "and" } else { "or" };
                    self.diagnostics.semantic(
                        expr.span,
                        format!(
                            "`{keyword}` on non-boolean operands: `0` and `\"\"` are truthy in Lua but falsy in TypeScript"
                        ),
                    );
                }
                if op == LuaBinary::And {
                    BinaryOp::And
                } else {
                    BinaryOp::Or
                }
            }
            LuaBinary::BitAnd | LuaBinary::BitOr | LuaBinary::BitXor | LuaBinary::Shl
            | LuaBinary::Shr => {
                self.diagnostics.semantic(
                    expr.span,
                    "bitwise operators work on 32-bit integers in TypeScript, 64-bit in Lua",
                );
                match op {
                    LuaBinary::BitAnd => BinaryOp::BitAnd,
                    LuaBinary::BitOr => BinaryOp::BitOr,
                    LuaBinary::BitXor => BinaryOp::BitXor,
                    LuaBinary::Shl => BinaryOp::Shl,
                    _ => BinaryOp::UShr,
                }
            }
        };
        let left = self.lower_expr(lhs);
        let right = self.lower_expr(rhs);
        self.b.binary(expr, op, left, right)
    }

    /// `a .. b` is `a + b` when `+` is certain to concatenate, otherwise the
    /// left operand is converted with `String(...)`.
    fn lower_concat(&mut self, expr: &lua::Expr, lhs: &lua::Expr, rhs: &lua::Expr) -> Expr {
        let concatenates = is_string_valued(lhs) || is_string_valued(rhs);
        let mut left = self.lower_expr(lhs);
        if !concatenates {
            let string = self.b.name(Synthetic, "String");
            left = self.b.call(Synthetic, string, vec![left]);
        }
        let right = self.lower_expr(rhs);
        self.b.binary(expr, BinaryOp::Add, left, right)
    }

    fn lower_unary(&mut self, expr: &lua::Expr, op: LuaUnary, operand: &lua::Expr) -> Expr {
        let op = match op {
            LuaUnary::Not => {
                if !is_boolean(operand) {
                    self.diagnostics.semantic(
                        expr.span,
                        "`not` on a non-boolean operand: `0` and `\"\"` are truthy in Lua but falsy in TypeScript",
                    );
                }
                UnaryOp::Not
            }
            LuaUnary::Neg => UnaryOp::Neg,
            LuaUnary::BitNot => {
                self.diagnostics.semantic(
                    expr.span,
                    "bitwise operators work on 32-bit integers in TypeScript, 64-bit in Lua",
                );
                UnaryOp::BitNot
            }
            LuaUnary::Len => {
                if operand.as_string().is_none() {
                    self.diagnostics.semantic(
                        expr.span,
                        "`#` counts up to the first nil in Lua; `.length` counts every slot",
                    );
                }
                let operand = self.lower_expr(operand);
                return self.b.member(expr, operand, "length");
            }
        };
        let operand = self.lower_expr(operand);
        self.b.unary(expr, op, operand)
    }

    pub(super) fn lower_name(&mut self, origin: impl Into<Provenance>, name: &str) -> Expr {
        let resolved = self
            .scope
            .resolve(name)
            .map(|r| (r.binding.target.clone(), r.crosses_function));
        let origin = origin.into();
        match resolved {
            Some((Target::Local(ts_name), _)) => self.b.name(origin, ts_name),
            Some((Target::This, crosses_function)) => {
                if crosses_function {
                    if let Some(source) = origin.origin() {
                        self.diagnostics.semantic(
                            source.span,
                            "`self` used inside a nested named function does not refer to the method receiver",
                        );
                    }
                }
                self.b.expr(origin, ExprKind::This)
            }
            Some((Target::Static { class, name }, _)) => {
                let class = self.b.name(Synthetic, class);
                self.b.member(origin, class, name)
            }
            None if name == "_G" => self.b.name(origin, "globalThis"),
            None if is_reserved_word(name) || self.scope.is_synthetic(name) => {
                let global = self.b.name(Synthetic, "globalThis");
                self.b.member(origin, global, name)
            }
            None => self.b.name(origin, name),
        }
    }

    fn lower_index(&mut self, expr: &lua::Expr, object: &lua::Expr, key: &lua::Expr) -> Expr {
        let object = self.lower_expr(object);
        if let Some(name) = key.as_string().filter(|s| is_valid_identifier(s)) {
            return self.b.member(expr, object, name);
        }
        let index = self.lower_index_key(key);
        self.b.index(expr, object, index)
    }

    /// Shifts a positional key from Lua's 1-based to TypeScript's 0-based
    /// indexing when the key is known to be a number.
    fn lower_index_key(&mut self, key: &lua::Expr) -> Expr {
        match &key.kind {
            L::String(_) => return self.lower_expr(key),
            L::Number(number) if is_integral(number.value) => {
                return self
                    .b
                    .expr(key, ExprKind::Number(format_number(number.value - 1.0)));
            }
            // `t[n + 1]` is `t[n]`
            L::Binary {
                op: LuaBinary::Add,
                lhs,
                rhs,
            } if is_literal(rhs, 1.0) => return self.lower_expr(lhs),
            _ => {}
        }
        if self.is_numeric(key) {
            return self.minus_one(key);
        }
        self.diagnostics.semantic(
            key.span,
            "cannot tell whether this index is positional; it is not shifted to 0-based",
        );
        self.lower_expr(key)
    }

    /// `e - 1`, folded for literals.
    pub(super) fn minus_one(&mut self, expr: &lua::Expr) -> Expr {
        if let L::Number(number) = &expr.kind {
            if is_integral(number.value) {
                return self
                    .b
                    .expr(expr, ExprKind::Number(format_number(number.value - 1.0)));
            }
        }
        let value = self.lower_expr(expr);
        let one = self.b.number(Synthetic, 1.0);
        self.b.binary(Synthetic, BinaryOp::Sub, value, one)
    }

    fn is_numeric(&self, expr: &lua::Expr) -> bool {
        match &expr.kind {
            L::Number(_) => true,
            L::Binary { op, .. } => {
                op.is_arithmetic()
                    || matches!(
                        op,
                        LuaBinary::BitAnd
                            | LuaBinary::BitOr
                            | LuaBinary::BitXor
                            | LuaBinary::Shl
                            | LuaBinary::Shr
                    )
            }
            L::Unary { op, .. } => matches!(op, LuaUnary::Neg | LuaUnary::Len | LuaUnary::BitNot),
            L::Name(name) => self.scope.resolve(name).is_some_and(|r| r.binding.numeric),
            L::Paren(inner) => self.is_numeric(inner),
            _ => false,
        }
    }

    /// `__unsupported("construct")` standing in for an expression.
    pub(super) fn placeholder_call(&mut self, origin: impl Into<Provenance>, construct: &str) -> Expr {
        let name = self.helpers.require(super::helpers::Helper::Unsupported);
        let callee = self.b.name(Synthetic, name);
        let construct = self.b.string(Synthetic, construct);
        self.b.call(origin, callee, vec![construct])
    }

    /// Evaluates `expr` once into a temporary when it may have effects.
    pub(super) fn lower_once(&mut self, expr: &lua::Expr, out: &mut Vec<crate::ts::Stmt>) -> Expr {
        if contains_call(expr) {
            let name = self.hoist(expr, out);
            self.b.name(Synthetic, name)
        } else {
            self.lower_expr(expr)
        }
    }

    /// Two independent lowerings of `expr` for a value that is used twice.
    /// Anything but a name or literal is evaluated once into a temporary.
    pub(super) fn lower_twice(
        &mut self,
        expr: &lua::Expr,
        out: &mut Vec<crate::ts::Stmt>,
    ) -> (Expr, Expr) {
        if is_simple(expr) {
            (self.lower_expr(expr), self.lower_expr(expr))
        } else {
            let name = self.hoist(expr, out);
            (self.b.name(Synthetic, name.as_str()), self.b.name(Synthetic, name))
        }
    }

    fn hoist(&mut self, expr: &lua::Expr, out: &mut Vec<crate::ts::Stmt>) -> String {
        let value = self.lower_expr(expr);
        let name = self.temp();
        out.push(self.b.const_decl(Synthetic, &name, value));
        name
    }
}

fn string_key(key: &str) -> PropKey {
    if is_valid_identifier(key) {
        PropKey::Ident(key.to_string())
    } else {
        PropKey::String(key.to_string())
    }
}

fn is_integral(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

fn is_literal(expr: &lua::Expr, value: f64) -> bool {
    matches!(&expr.kind, L::Number(number) if number.value == value)
}

/// The value of a numeric literal, including a negated one.
pub(super) fn literal_number(expr: &lua::Expr) -> Option<f64> {
    match &expr.kind {
        L::Number(number) => Some(number.value),
        L::Unary {
            op: LuaUnary::Neg,
            operand,
        } => literal_number(operand).map(|v| -v),
        L::Paren(inner) => literal_number(inner),
        _ => None,
    }
}

fn is_simple(expr: &lua::Expr) -> bool {
    match &expr.kind {
        L::Nil | L::True | L::False | L::Number(_) | L::String(_) | L::Name(_) => true,
        _ => literal_number(expr).is_some(),
    }
}

fn is_boolean(expr: &lua::Expr) -> bool {
    match &expr.kind {
        L::True | L::False => true,
        L::Binary { op, lhs, rhs } => {
            op.is_comparison()
                || (matches!(op, LuaBinary::And | LuaBinary::Or) && is_boolean(lhs) && is_boolean(rhs))
        }
        L::Unary {
            op: LuaUnary::Not, ..
        } => true,
        L::Paren(inner) => is_boolean(inner),
        _ => false,
    }
}

pub(super) fn is_string_valued(expr: &lua::Expr) -> bool {
    match &expr.kind {
        L::String(_) => true,
        L::Binary {
            op: LuaBinary::Concat,
            ..
        } => true,
        L::Paren(inner) => is_string_valued(inner),
        _ => false,
    }
}

/// Whether a Lua numeral is also valid TypeScript as written.
fn is_ts_number(text: &str) -> bool {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    // `010` is a legacy octal literal
    let mut digits = text.chars();
    if digits.next() == Some('0') && digits.next().is_some_and(|c| c.is_ascii_digit()) {
        return false;
    }
    let mut seen_digit = false;
    let mut seen_exponent = false;
    let mut previous = None;
    for c in text.chars() {
        match c {
            '0'..='9' => seen_digit = true,
            '.' if !seen_exponent => {}
            'e' | 'E' if seen_digit && !seen_exponent => seen_exponent = true,
            '+' | '-' if matches!(previous, Some('e' | 'E')) => {}
            _ => return false,
        }
        previous = Some(c);
    }
    seen_digit && !matches!(previous, Some('e' | 'E' | '+' | '-'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ts_numerals() {
        assert!(is_ts_number("42"));
        assert!(is_ts_number("3.25"));
        assert!(is_ts_number(".5"));
        assert!(is_ts_number("1e-3"));
        assert!(is_ts_number("0xFF"));
        assert!(!is_ts_number("0x1p4"));
        assert!(!is_ts_number("0x.8"));
    }

    #[test]
    fn test_leading_zeros_are_not_kept() {
        assert!(!is_ts_number("010"));
        assert!(!is_ts_number("007.5"));
        assert!(is_ts_number("0"));
        assert!(is_ts_number("0.25"));
        assert!(is_ts_number("0e3"));
    }
}
