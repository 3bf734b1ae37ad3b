//! Statement lowering.

use super::expr::{FunctionStyle, literal_number};
use super::{Transformer, any_function_in, contains_call, mentions, nested_blocks, stmt_exprs};
use crate::lua::{self, ExprKind as L, StmtKind as S, UnaryOp as LuaUnary};
use crate::provenance::Provenance::{self, Synthetic};
use crate::ts::{
    AssignOp, BinaryOp, Declarator, Expr, ExprKind, Pattern, Stmt, StmtKind, UnaryOp, UpdateOp,
    VarDecl, VarKind,
};

impl Transformer {
    /// Lowers a block in a scope of its own.
    pub(super) fn lower_block(&mut self, block: &lua::Block) -> Vec<Stmt> {
        self.scope.push_block();
        let stmts = self.lower_stmts(block);
        self.scope.pop_block();
        stmts
    }

    /// Lowers a block in the current scope.
    pub(super) fn lower_stmts(&mut self, block: &lua::Block) -> Vec<Stmt> {
        let mut out = Vec::with_capacity(block.stmts.len());
        for stmt in &block.stmts {
            self.lower_stmt(stmt, &mut out);
        }
        out
    }

    pub(super) fn lower_stmt(&mut self, stmt: &lua::Stmt, out: &mut Vec<Stmt>) {
        match &stmt.kind {
            S::Local { names, values } => self.lower_local(stmt, names, values, out),
            S::Assign { targets, values } => {
                let lowered = self.lower_assign(stmt, targets, values);
                out.push(lowered);
            }
            S::Call(call) => {
                let lowered = match self.lower_error_call(stmt, call) {
                    Some(throw) => throw,
                    None => {
                        let call = self.lower_expr(call);
                        self.b.expr_stmt(stmt, call)
                    }
                };
                out.push(lowered);
            }
            S::Do(block) => {
                let body = self.lower_block(block);
                out.push(self.b.block(stmt, body));
            }
            S::While { cond, body } => {
                let test = self.lower_expr(cond);
                self.scope.push_block();
                let body = self.loop_body(body, Vec::new(), true);
                self.scope.pop_block();
                out.push(self.b.stmt(
                    stmt,
                    StmtKind::While {
                        test,
                        body: Box::new(body),
                    },
                ));
            }
            S::Repeat { body, cond } => out.push(self.lower_repeat(stmt, body, cond)),
            S::If {
                clauses,
                else_body,
            } => {
                let lowered = self.lower_if(stmt, clauses, else_body.as_ref());
                out.push(lowered);
            }
            S::NumericFor {
                var,
                start,
                limit,
                step,
                body,
            } => self.lower_numeric_for(stmt, var, start, limit, step.as_ref(), body, out),
            S::GenericFor { vars, exprs, body } => {
                self.lower_generic_for(stmt, vars, exprs, body, out)
            }
            S::Function { name, func } => {
                let lowered = self.lower_function_stmt(stmt, name, func);
                out.push(lowered);
            }
            S::LocalFunction { name, func } => {
                let ts_name = self.scope.declare(name.as_str(), false, false);
                let ident = self.b.ident(name, ts_name);
                let function = self.lower_function(func, FunctionStyle::Plain, Some(ident));
                out.push(self.b.stmt(stmt, StmtKind::Function(function)));
            }
            S::Return(values) => {
                let lowered = self.lower_return(stmt, values);
                out.push(lowered);
            }
            S::Break => out.push(self.b.stmt(stmt, StmtKind::Break)),
            S::Goto(label) => {
                if self.scope.is_continue_label(label.as_str()) {
                    out.push(self.b.stmt(stmt, StmtKind::Continue));
                } else {
                    self.diagnostics.unsupported(
                        stmt.span,
                        format!("goto statements are not supported (`goto {}`)", label.as_str()),
                    );
                    out.push(self.placeholder_stmt(stmt, "goto"));
                }
            }
            S::Label(label) => {
                self.diagnostics.unsupported(
                    stmt.span,
                    format!("labels are not supported (`::{}::`)", label.as_str()),
                );
                out.push(self.placeholder_stmt(stmt, "label"));
            }
        }
    }

    /// `__unsupported("construct");` standing in for a statement.
    pub(super) fn placeholder_stmt(&mut self, stmt: &lua::Stmt, construct: &str) -> Stmt {
        let call = self.placeholder_call(Synthetic, construct);
        self.b.expr_stmt(stmt, call)
    }

    fn lower_local(
        &mut self,
        stmt: &lua::Stmt,
        names: &[lua::LocalName],
        values: &[lua::Expr],
        out: &mut Vec<Stmt>,
    ) {
        if let Some(import) = self.lower_require(stmt, names, values) {
            out.push(import);
            return;
        }

        let clashes = |name: &lua::LocalName| values.iter().any(|v| mentions(v, name.name.as_str()));

        let destructures =
            values.len() < names.len() && values.last().is_some_and(lua::Expr::is_multi_valued);
        if destructures {
            // `local a, b, c = 1, f()` is `let a = 1; let [b, c] = f();`
            let (singles, tail) = values.split_at(values.len() - 1);
            let lowered: Vec<Expr> = singles.iter().map(|v| self.lower_expr(v)).collect();
            let tail_value = self.lower_destructured(&tail[0]);

            for (name, value) in names.iter().zip(lowered) {
                let clash = clashes(name);
                out.push(self.declare_local(stmt, name, Some(value), clash));
            }
            let rest = &names[singles.len()..];
            let kind = if rest.iter().all(|n| self.local_kind(n) == VarKind::Const) {
                VarKind::Const
            } else {
                VarKind::Let
            };
            let mut elements = Vec::with_capacity(rest.len());
            for name in rest {
                self.report_attribute(name);
                let ts_name = self.scope.declare(name.name.as_str(), false, clashes(name));
                elements.push(Pattern::Ident(self.b.ident(&name.name, ts_name)));
            }
            let target = self.b.array_pattern(Synthetic, elements);
            out.push(self.b.stmt(
                stmt,
                StmtKind::Var(VarDecl {
                    kind,
                    declarators: vec![Declarator {
                        target,
                        init: Some(tail_value),
                    }],
                }),
            ));
            return;
        }

        let (assigned, extra) = values.split_at(values.len().min(names.len()));
        let lowered: Vec<Expr> = assigned.iter().map(|v| self.lower_expr(v)).collect();
        let mut lowered = lowered.into_iter();
        for name in names {
            let clash = clashes(name);
            let init = lowered.next();
            out.push(self.declare_local(stmt, name, init, clash));
        }
        // surplus values are still evaluated for their effects
        for value in extra.iter().filter(|v| contains_call(v)) {
            let lowered = self.lower_expr(value);
            out.push(self.b.expr_stmt(value, lowered));
        }
    }

    fn declare_local(
        &mut self,
        stmt: &lua::Stmt,
        name: &lua::LocalName,
        init: Option<Expr>,
        clash: bool,
    ) -> Stmt {
        let kind = self.local_kind(name);
        self.report_attribute(name);
        let init = match (kind, init) {
            // `const` needs an initializer
            (VarKind::Const, None) => Some(self.b.name(Synthetic, "undefined")),
            (_, init) => init,
        };
        let ts_name = self.scope.declare(name.name.as_str(), false, clash);
        let target = Pattern::Ident(self.b.ident(&name.name, ts_name));
        self.b.stmt(
            stmt,
            StmtKind::Var(VarDecl {
                kind,
                declarators: vec![Declarator { target, init }],
            }),
        )
    }

    fn local_kind(&self, name: &lua::LocalName) -> VarKind {
        match name.attrib.as_ref().map(lua::Name::as_str) {
            Some("const" | "close") => VarKind::Const,
            _ => VarKind::Let,
        }
    }

    fn report_attribute(&mut self, name: &lua::LocalName) {
        let Some(attrib) = &name.attrib else {
            return;
        };
        match attrib.as_str() {
            "const" => {}
            "close" => self.diagnostics.unsupported(
                attrib.span,
                "to-be-closed variables (`<close>`) are not supported; lowered as `const`",
            ),
            other => self
                .diagnostics
                .unsupported(attrib.span, format!("unknown attribute `<{other}>`")),
        }
    }

    /// `local x = require("a.b")` at the top of a module is
    /// `import * as x from "a/b";`.
    pub(super) fn lower_require(
        &mut self,
        stmt: &lua::Stmt,
        names: &[lua::LocalName],
        values: &[lua::Expr],
    ) -> Option<Stmt> {
        if !self.options.emits_module() || !self.scope.at_chunk_top() {
            return None;
        }
        let ([name], [value]) = (names, values) else {
            return None;
        };
        let L::Call { callee, args } = &value.kind else {
            return None;
        };
        if callee.as_name() != Some("require") || self.scope.is_local("require") {
            return None;
        }
        let [path] = args.as_slice() else {
            return None;
        };
        let source = path.as_string()?.replace('.', "/");
        let ts_name = self.scope.declare(name.name.as_str(), false, false);
        let local = self.b.ident(&name.name, ts_name);
        Some(self.b.stmt(stmt, StmtKind::ImportNamespace { local, source }))
    }

    fn lower_assign(&mut self, stmt: &lua::Stmt, targets: &[lua::Expr], values: &[lua::Expr]) -> Stmt {
        let assign = match (targets, values) {
            ([target], [value]) => {
                let target = self.lower_expr(target);
                let value = self.lower_expr(value);
                self.b.assign(Synthetic, AssignOp::Assign, target, value)
            }
            // `a, b = f()` is `[a, b] = f();`, `a, b = b, a` is `[a, b] = [b, a];`
            _ => {
                let lowered: Vec<Expr> = targets.iter().map(|t| self.lower_expr(t)).collect();
                let pattern = self.b.expr(Synthetic, ExprKind::Array(lowered));
                let value = match values {
                    [value] if value.is_multi_valued() => self.lower_destructured(value),
                    _ => {
                        let items = self.lower_multi(values);
                        self.b.expr(Synthetic, ExprKind::Array(items))
                    }
                };
                self.b.assign(Synthetic, AssignOp::Assign, pattern, value)
            }
        };
        self.b.expr_stmt(stmt, assign)
    }

    fn lower_repeat(&mut self, stmt: &lua::Stmt, body: &lua::Block, cond: &lua::Expr) -> Stmt {
        let declares = body
            .stmts
            .iter()
            .any(|s| matches!(s.kind, S::Local { .. } | S::LocalFunction { .. }));
        self.scope.push_block();

        let lowered = if declares {
            // the condition sees the body's locals
            self.scope.push_loop(None);
            let mut stmts = self.lower_stmts(body);
            let test = self.lower_expr(cond);
            self.scope.pop_loop();

            let brk = self.b.stmt(Synthetic, StmtKind::Break);
            let consequent = self.b.block(Synthetic, vec![brk]);
            stmts.push(self.b.stmt(
                Synthetic,
                StmtKind::If {
                    test,
                    consequent: Box::new(consequent),
                    alternate: None,
                },
            ));
            let test = self.b.expr(Synthetic, ExprKind::Bool(true));
            let body = self.b.block(Synthetic, stmts);
            self.b.stmt(
                stmt,
                StmtKind::While {
                    test,
                    body: Box::new(body),
                },
            )
        } else {
            let body = self.loop_body(body, Vec::new(), true);
            let test = match &cond.kind {
                L::Unary {
                    op: LuaUnary::Not,
                    operand,
                } => self.lower_expr(operand),
                _ => {
                    let cond = self.lower_expr(cond);
                    self.b.unary(Synthetic, UnaryOp::Not, cond)
                }
            };
            self.b.stmt(
                stmt,
                StmtKind::DoWhile {
                    body: Box::new(body),
                    test,
                },
            )
        };

        self.scope.pop_block();
        lowered
    }

    fn lower_if(
        &mut self,
        stmt: &lua::Stmt,
        clauses: &[lua::IfClause],
        else_body: Option<&lua::Block>,
    ) -> Stmt {
        let mut arms = Vec::with_capacity(clauses.len());
        for clause in clauses {
            let test = self.lower_expr(&clause.cond);
            let body = self.lower_block(&clause.body);
            let body = self.b.block(Synthetic, body);
            arms.push((clause, test, body));
        }
        let mut alternate = else_body.map(|block| {
            let body = self.lower_block(block);
            Box::new(self.b.block(Synthetic, body))
        });

        while let Some((clause, test, consequent)) = arms.pop() {
            let origin = if arms.is_empty() {
                Provenance::from(stmt)
            } else {
                Provenance::from(clause)
            };
            let lowered = self.b.stmt(
                origin,
                StmtKind::If {
                    test,
                    consequent: Box::new(consequent),
                    alternate,
                },
            );
            alternate = Some(Box::new(lowered));
        }

        match alternate {
            Some(lowered) => *lowered,
            None => self.b.block(stmt, Vec::new()),
        }
    }

    /// Lowers a loop body in the current scope, after `prologue`.
    ///
    /// When the body ends in a label and `continues` is set, `goto label`
    /// inside the body becomes `continue` and the label is dropped.
    fn loop_body(&mut self, body: &lua::Block, mut prologue: Vec<Stmt>, continues: bool) -> Stmt {
        let label = match body.stmts.last() {
            Some(lua::Stmt {
                kind: S::Label(label),
                ..
            }) if continues => Some(label.as_str().to_string()),
            _ => None,
        };
        let stmts = match label {
            Some(_) => &body.stmts[..body.stmts.len() - 1],
            None => &body.stmts[..],
        };

        self.scope.push_loop(label);
        for stmt in stmts {
            self.lower_stmt(stmt, &mut prologue);
        }
        self.scope.pop_loop();
        self.b.block(Synthetic, prologue)
    }

    #[allow(clippy::too_many_arguments)]
    fn lower_numeric_for(
        &mut self,
        stmt: &lua::Stmt,
        var: &lua::Name,
        start: &lua::Expr,
        limit: &lua::Expr,
        step: Option<&lua::Expr>,
        body: &lua::Block,
        out: &mut Vec<Stmt>,
    ) {
        // bounds are evaluated once, before the loop variable exists
        let start = self.lower_expr(start);
        let bounds = match step.map(|s| (s, literal_number(s))) {
            None => Bounds::Literal {
                limit: self.lower_once(limit, out),
                step: 1.0,
            },
            Some((_, Some(step))) => Bounds::Literal {
                limit: self.lower_once(limit, out),
                step,
            },
            Some((step, None)) => Bounds::Dynamic {
                limits: self.lower_twice(limit, out),
                steps: self.lower_twice(step, out),
            },
        };

        self.scope.push_block();
        let (ts_name, prologue) = self.loop_counter(body, var);
        let binding = Pattern::Ident(self.counter_ident(var, &ts_name, &prologue));
        let init = VarDecl {
            kind: VarKind::Let,
            declarators: vec![Declarator {
                target: binding,
                init: Some(start),
            }],
        };

        let (test, update) = match bounds {
            Bounds::Literal { limit, step } => {
                let counter = self.b.name(Synthetic, ts_name.as_str());
                let op = if step < 0.0 { BinaryOp::Ge } else { BinaryOp::Le };
                let test = self.b.binary(Synthetic, op, counter, limit);
                (test, self.step_update(&ts_name, step))
            }
            Bounds::Dynamic {
                limits: (limit, second_limit),
                steps: (step, second_step),
            } => {
                // s >= 0 ? i <= b : i >= b
                let zero = self.b.number(Synthetic, 0.0);
                let ascending = self.b.binary(Synthetic, BinaryOp::Ge, step, zero);
                let counter = self.b.name(Synthetic, ts_name.as_str());
                let up = self.b.binary(Synthetic, BinaryOp::Le, counter, limit);
                let counter = self.b.name(Synthetic, ts_name.as_str());
                let down = self.b.binary(Synthetic, BinaryOp::Ge, counter, second_limit);
                let test = self.b.expr(
                    Synthetic,
                    ExprKind::Conditional {
                        test: Box::new(ascending),
                        consequent: Box::new(up),
                        alternate: Box::new(down),
                    },
                );
                let counter = self.b.name(Synthetic, ts_name.as_str());
                let update = self
                    .b
                    .assign(Synthetic, AssignOp::AddAssign, counter, second_step);
                (test, update)
            }
        };

        let body = self.loop_body(body, prologue, true);
        self.scope.pop_block();
        out.push(self.b.stmt(
            stmt,
            StmtKind::For {
                init: Some(init),
                test: Some(test),
                update: Some(update),
                body: Box::new(body),
            },
        ));
    }

    /// Declares the control variable `var` of a counting loop and returns
    /// the name the loop header counts with.
    ///
    /// Lua hands the body a copy of the counter, so when the body assigns to
    /// `var` the header counts with a temporary and the body starts with
    /// `let var = counter;`.
    fn loop_counter(&mut self, body: &lua::Block, var: &lua::Name) -> (String, Vec<Stmt>) {
        if !assigns_to(body, var.as_str()) {
            return (self.scope.declare(var.as_str(), true, false), Vec::new());
        }
        let counter = self.temp();
        let ts_name = self.scope.declare(var.as_str(), true, false);
        let target = Pattern::Ident(self.b.ident(var, ts_name));
        let init = self.b.name(Synthetic, counter.as_str());
        let copy = self.b.stmt(
            Synthetic,
            StmtKind::Var(VarDecl {
                kind: VarKind::Let,
                declarators: vec![Declarator {
                    target,
                    init: Some(init),
                }],
            }),
        );
        (counter, vec![copy])
    }

    /// The binding of the loop header: `var` itself, or the hidden counter.
    fn counter_ident(&mut self, var: &lua::Name, counter: &str, prologue: &[Stmt]) -> crate::ts::Ident {
        if prologue.is_empty() {
            self.b.ident(var, counter)
        } else {
            self.b.ident(Synthetic, counter)
        }
    }

    /// `i++`, `i--`, `i += n` or `i -= n`.
    fn step_update(&mut self, counter: &str, step: f64) -> Expr {
        let operand = self.b.name(Synthetic, counter);
        if step == 1.0 || step == -1.0 {
            let op = if step > 0.0 {
                UpdateOp::Increment
            } else {
                UpdateOp::Decrement
            };
            return self.b.expr(
                Synthetic,
                ExprKind::Update {
                    op,
                    prefix: false,
                    operand: Box::new(operand),
                },
            );
        }
        let (op, amount) = if step < 0.0 {
            (AssignOp::SubAssign, -step)
        } else {
            (AssignOp::AddAssign, step)
        };
        let amount = self.b.number(Synthetic, amount);
        self.b.assign(Synthetic, op, operand, amount)
    }

    fn lower_generic_for(
        &mut self,
        stmt: &lua::Stmt,
        vars: &[lua::Name],
        exprs: &[lua::Expr],
        body: &lua::Block,
        out: &mut Vec<Stmt>,
    ) {
        if let [iterator] = exprs {
            if let L::Call { callee, args } = &iterator.kind {
                let library = callee.as_name().filter(|name| !self.scope.is_local(name));
                match (library, args.as_slice()) {
                    (Some("ipairs"), [table]) if !vars.is_empty() => {
                        return self.lower_ipairs(stmt, vars, table, body, out);
                    }
                    (Some("pairs"), [table]) => {
                        return self.lower_pairs(stmt, iterator, vars, table, body, out);
                    }
                    _ => {}
                }
            }
        }

        let args = self.lower_multi(exprs);
        let helper = self.helpers.require(super::helpers::Helper::Iterate);
        let callee = self.b.name(Synthetic, helper);
        let iterable = self.b.call(Synthetic, callee, args);

        self.scope.push_block();
        let kind = loop_binding_kind(body, vars);
        let mut elements = Vec::with_capacity(vars.len());
        for var in vars {
            let ts_name = self.scope.declare(var.as_str(), false, false);
            elements.push(Pattern::Ident(self.b.ident(var, ts_name)));
        }
        let binding = self.b.array_pattern(Synthetic, elements);
        let body = self.loop_body(body, Vec::new(), true);
        self.scope.pop_block();

        out.push(self.b.stmt(
            stmt,
            StmtKind::ForOf {
                kind,
                binding,
                iterable,
                body: Box::new(body),
            },
        ));
    }

    /// `for i, v in ipairs(t)` is an index loop over `t`.
    fn lower_ipairs(
        &mut self,
        stmt: &lua::Stmt,
        vars: &[lua::Name],
        table: &lua::Expr,
        body: &lua::Block,
        out: &mut Vec<Stmt>,
    ) {
        let [index_var, value_vars @ ..] = vars else {
            return;
        };
        let (for_limit, for_element) = self.lower_twice(table, out);

        self.scope.push_block();
        let (index_name, mut prologue) = self.loop_counter(body, index_var);
        let binding = Pattern::Ident(self.counter_ident(index_var, &index_name, &prologue));
        let one = self.b.number(Synthetic, 1.0);
        let init = VarDecl {
            kind: VarKind::Let,
            declarators: vec![Declarator {
                target: binding,
                init: Some(one),
            }],
        };
        let counter = self.b.name(Synthetic, index_name.as_str());
        let length = self.b.member(Synthetic, for_limit, "length");
        let test = self.b.binary(Synthetic, BinaryOp::Le, counter, length);
        let update = self.step_update(&index_name, 1.0);

        if let Some((value_var, unused)) = value_vars.split_first() {
            // const v = t[i - 1];
            let counter = self.b.name(Synthetic, index_name.as_str());
            let one = self.b.number(Synthetic, 1.0);
            let position = self.b.binary(Synthetic, BinaryOp::Sub, counter, one);
            let element = self.b.index(Synthetic, for_element, position);
            let kind = loop_binding_kind(body, std::slice::from_ref(value_var));
            let ts_name = self.scope.declare(value_var.as_str(), false, false);
            let target = Pattern::Ident(self.b.ident(value_var, ts_name));
            prologue.push(self.b.stmt(
                Synthetic,
                StmtKind::Var(VarDecl {
                    kind,
                    declarators: vec![Declarator {
                        target,
                        init: Some(element),
                    }],
                }),
            ));
            for var in unused {
                let ts_name = self.scope.declare(var.as_str(), false, false);
                let target = Pattern::Ident(self.b.ident(var, ts_name));
                prologue.push(self.b.stmt(
                    Synthetic,
                    StmtKind::Var(VarDecl {
                        kind: VarKind::Let,
                        declarators: vec![Declarator { target, init: None }],
                    }),
                ));
            }
        }

        let body = self.loop_body(body, prologue, true);
        self.scope.pop_block();
        out.push(self.b.stmt(
            stmt,
            StmtKind::For {
                init: Some(init),
                test: Some(test),
                update: Some(update),
                body: Box::new(body),
            },
        ));
    }

    /// `for k, v in pairs(t)` iterates `Object.entries(t)`, `for k in
    /// pairs(t)` iterates `Object.keys(t)`.
    fn lower_pairs(
        &mut self,
        stmt: &lua::Stmt,
        iterator: &lua::Expr,
        vars: &[lua::Name],
        table: &lua::Expr,
        body: &lua::Block,
        out: &mut Vec<Stmt>,
    ) {
        self.diagnostics.semantic(
            iterator.span,
            "`pairs` yields string keys in insertion order in TypeScript",
        );
        let method = if vars.len() == 1 { "keys" } else { "entries" };
        let callee = self.b.global_member("Object", method);
        let table = self.lower_expr(table);
        let iterable = self.b.call(iterator, callee, vec![table]);

        self.scope.push_block();
        let kind = loop_binding_kind(body, vars);
        let binding = match vars {
            [key] => {
                let ts_name = self.scope.declare(key.as_str(), false, false);
                Pattern::Ident(self.b.ident(key, ts_name))
            }
            _ => {
                let mut elements = Vec::with_capacity(vars.len());
                for var in vars {
                    let ts_name = self.scope.declare(var.as_str(), false, false);
                    elements.push(Pattern::Ident(self.b.ident(var, ts_name)));
                }
                self.b.array_pattern(Synthetic, elements)
            }
        };
        let body = self.loop_body(body, Vec::new(), true);
        self.scope.pop_block();

        out.push(self.b.stmt(
            stmt,
            StmtKind::ForOf {
                kind,
                binding,
                iterable,
                body: Box::new(body),
            },
        ));
    }

    fn lower_function_stmt(
        &mut self,
        stmt: &lua::Stmt,
        name: &lua::FuncName,
        func: &lua::FuncBody,
    ) -> Stmt {
        let Some((root, path)) = name.path.split_first() else {
            let function = self.lower_function(func, FunctionStyle::Plain, None);
            let value = self.b.expr(stmt, ExprKind::Function(Box::new(function)));
            return self.b.expr_stmt(stmt, value);
        };

        let global = name.is_simple() && !self.scope.is_local(root.as_str());
        // a declaration is only visible everywhere, and in order, when it is
        // the single definition of `f` and sits at the top of the chunk
        if global
            && self.scope.at_chunk_top()
            && self.global_functions.get(root.as_str()) == Some(&1)
            && !crate::ts::is_reserved_word(root.as_str())
        {
            let ident = self.b.ident(root, root.as_str());
            let function = self.lower_function(func, FunctionStyle::Plain, Some(ident));
            return self.b.stmt(stmt, StmtKind::Function(function));
        }

        // `a.b.c = function (...) { ... };`, `globalThis.f = function ...`
        let mut target = if global {
            let object = self.b.name(Synthetic, "globalThis");
            self.b.member(name, object, root.as_str())
        } else {
            self.lower_name(Synthetic, root.as_str())
        };
        let last = path.len() + usize::from(name.method.is_some());
        let properties = path.iter().chain(name.method.as_ref());
        for (i, property) in properties.enumerate() {
            let origin = if i + 1 == last {
                Provenance::from(name)
            } else {
                Synthetic
            };
            target = self.b.member(origin, target, property.as_str());
        }
        let style = if name.method.is_some() {
            FunctionStyle::Method
        } else {
            FunctionStyle::Plain
        };
        let function = self.lower_function(func, style, None);
        let value = self.b.expr(stmt, ExprKind::Function(Box::new(function)));
        let assign = self.b.assign(Synthetic, AssignOp::Assign, target, value);
        self.b.expr_stmt(stmt, assign)
    }

    fn lower_return(&mut self, stmt: &lua::Stmt, values: &[lua::Expr]) -> Stmt {
        if self.scope.in_chunk_function() {
            self.diagnostics.unsupported(
                stmt.span,
                "`return` from the main chunk is only supported as its last statement",
            );
            return self.placeholder_stmt(stmt, "return");
        }
        let value = self.lower_return_values(values);
        self.b.stmt(stmt, StmtKind::Return(value))
    }

    /// `return` takes no value, one value, or an array of values.
    pub(super) fn lower_return_values(&mut self, values: &[lua::Expr]) -> Option<Expr> {
        match values {
            [] => None,
            // `return ...` returns every vararg
            [value] => Some(self.lower_destructured(value)),
            _ => {
                let items = self.lower_multi(values);
                Some(self.b.expr(Synthetic, ExprKind::Array(items)))
            }
        }
    }
}

/// Limit and step of a numeric `for`.
enum Bounds {
    /// The step is a number literal, so its sign is known.
    Literal { limit: Expr, step: f64 },
    /// Each value is needed twice: once for the ascending and once for the
    /// descending comparison (limit), or for the sign test and the update (step).
    Dynamic {
        limits: (Expr, Expr),
        steps: (Expr, Expr),
    },
}

/// `const` unless the loop body assigns to one of the loop variables.
fn loop_binding_kind(body: &lua::Block, vars: &[lua::Name]) -> VarKind {
    if vars.iter().any(|var| assigns_to(body, var.as_str())) {
        VarKind::Let
    } else {
        VarKind::Const
    }
}

fn assigns_to(block: &lua::Block, name: &str) -> bool {
    block.stmts.iter().any(|stmt| {
        let direct = match &stmt.kind {
            S::Assign { targets, .. } => targets.iter().any(|t| t.as_name() == Some(name)),
            _ => false,
        };
        direct
            || nested_blocks(stmt).into_iter().any(|body| assigns_to(body, name))
            || stmt_exprs(stmt)
                .into_iter()
                .any(|expr| any_function_in(expr, &mut |func| assigns_to(&func.body, name)))
    })
}
