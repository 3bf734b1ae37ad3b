//! Runtime helpers injected at the top of the generated file.

use super::builder::Builder;
use crate::provenance::Provenance::Synthetic;
use crate::ts::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Helper {
    /// `__unsupported(construct)`: placeholder for untranslatable code.
    Unsupported,
    /// `__luaIterate(f, s, c)`: generic `for` over a Lua iterator triple.
    Iterate,
}

impl Helper {
    pub fn name(self) -> &'static str {
        match self {
            Helper::Unsupported => "__unsupported",
            Helper::Iterate => "__luaIterate",
        }
    }
}

/// Helpers in first-use order.
#[derive(Debug, Default)]
pub struct Helpers {
    used: Vec<Helper>,
}

impl Helpers {
    /// Marks `helper` as needed and returns its name.
    pub fn require(&mut self, helper: Helper) -> &'static str {
        if !self.used.contains(&helper) {
            self.used.push(helper);
        }
        helper.name()
    }

    pub fn declarations(&self, b: &mut Builder) -> Vec<Stmt> {
        self.used
            .iter()
            .map(|helper| match helper {
                Helper::Unsupported => unsupported(b),
                Helper::Iterate => iterate(b),
            })
            .collect()
    }
}

fn param(b: &mut Builder, name: &str) -> Param {
    Param {
        name: b.ident(Synthetic, name),
        rest: false,
    }
}

fn function(b: &mut Builder, helper: Helper, params: &[&str], body: Vec<Stmt>, generator: bool) -> Stmt {
    let name = b.ident(Synthetic, helper.name());
    let params = params.iter().map(|p| param(b, p)).collect();
    b.stmt(
        Synthetic,
        StmtKind::Function(Function {
            name: Some(name),
            params,
            body,
            is_generator: generator,
        }),
    )
}

/// ```ts
/// function __unsupported(construct) {
///     throw new Error("unsupported Lua construct: " + construct);
/// }
/// ```
fn unsupported(b: &mut Builder) -> Stmt {
    let prefix = b.string(Synthetic, "unsupported Lua construct: ");
    let construct = b.name(Synthetic, "construct");
    let message = b.binary(Synthetic, BinaryOp::Add, prefix, construct);
    let error = b.name(Synthetic, "Error");
    let new = b.expr(
        Synthetic,
        ExprKind::New {
            callee: Box::new(error),
            args: vec![message],
        },
    );
    let throw = b.stmt(Synthetic, StmtKind::Throw(new));
    function(b, Helper::Unsupported, &["construct"], vec![throw], false)
}

/// ```ts
/// function* __luaIterate(f, s, c) {
///     while (true) {
///         const r = f(s, c);
///         const values = Array.isArray(r) ? r : [r];
///         if (values[0] === undefined) {
///             return;
///         }
///         c = values[0];
///         yield values;
///     }
/// }
/// ```
fn iterate(b: &mut Builder) -> Stmt {
    let call = {
        let f = b.name(Synthetic, "f");
        let s = b.name(Synthetic, "s");
        let c = b.name(Synthetic, "c");
        b.call(Synthetic, f, vec![s, c])
    };
    let r = b.const_decl(Synthetic, "r", call);

    let values = {
        let is_array = b.global_member("Array", "isArray");
        let r = b.name(Synthetic, "r");
        let test = b.call(Synthetic, is_array, vec![r]);
        let consequent = b.name(Synthetic, "r");
        let r = b.name(Synthetic, "r");
        let alternate = b.expr(Synthetic, ExprKind::Array(vec![r]));
        let conditional = b.expr(
            Synthetic,
            ExprKind::Conditional {
                test: Box::new(test),
                consequent: Box::new(consequent),
                alternate: Box::new(alternate),
            },
        );
        b.const_decl(Synthetic, "values", conditional)
    };

    let first = |b: &mut Builder| {
        let values = b.name(Synthetic, "values");
        let zero = b.number(Synthetic, 0.0);
        b.index(Synthetic, values, zero)
    };

    let done = {
        let head = first(b);
        let undefined = b.name(Synthetic, "undefined");
        let test = b.binary(Synthetic, BinaryOp::StrictEq, head, undefined);
        let ret = b.stmt(Synthetic, StmtKind::Return(None));
        let consequent = b.block(Synthetic, vec![ret]);
        b.stmt(
            Synthetic,
            StmtKind::If {
                test,
                consequent: Box::new(consequent),
                alternate: None,
            },
        )
    };

    let advance = {
        let c = b.name(Synthetic, "c");
        let head = first(b);
        let assign = b.assign(Synthetic, AssignOp::Assign, c, head);
        b.expr_stmt(Synthetic, assign)
    };

    let emit = {
        let values = b.name(Synthetic, "values");
        let yielded = b.expr(Synthetic, ExprKind::Yield(Some(Box::new(values))));
        b.expr_stmt(Synthetic, yielded)
    };

    let test = b.expr(Synthetic, ExprKind::Bool(true));
    let body = b.block(Synthetic, vec![r, values, done, advance, emit]);
    let forever = b.stmt(
        Synthetic,
        StmtKind::While {
            test,
            body: Box::new(body),
        },
    );
    function(b, Helper::Iterate, &["f", "s", "c"], vec![forever], true)
}
