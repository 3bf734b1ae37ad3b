//! Lowering a chunk written in the classmod idiom to one exported class.
//!
//! ```lua
//! local Account = {}
//! Account.__index = Account
//! local fee = 1
//! function Account.new(balance) ... end
//! function Account:deposit(v) ... end
//! return Account
//! ```
//!
//! becomes `export default class Account { ... }` with `fee` and `new` as
//! static members and `deposit` as an instance method.

use super::expr::FunctionStyle;
use super::{Transformer, contains_call, split_trailing_return};
use crate::lua::{self, ExprKind as L, FieldKind, StmtKind as S};
use crate::provenance::Provenance::{self, Synthetic};
use crate::ts::{AssignOp, Class, ClassMember, Expr, ExprKind, MemberKind, Stmt, StmtKind};

/// Class name used when the chunk does not return a class table.
const FALLBACK_CLASS: &str = "Module";

impl Transformer {
    pub(super) fn lower_classmod(&mut self, chunk: &lua::Chunk) -> Vec<Stmt> {
        let (stmts, trailing) = split_trailing_return(&chunk.body);
        let table = class_table(stmts, trailing);

        let class_name = match table {
            Some((_, name, _)) => {
                self.class = Some(name.as_str().to_string());
                self.scope.declare(name.as_str(), false, false)
            }
            None => FALLBACK_CLASS.to_string(),
        };

        let mut imports = Vec::new();
        let mut members = Vec::new();
        let mut pending = Vec::new();

        for (i, stmt) in stmts.iter().enumerate() {
            if let Some((index, _, fields)) = table {
                if i == index {
                    self.lower_class_table(fields, &mut members);
                    continue;
                }
            }
            if self.is_index_assignment(stmt) {
                continue;
            }
            match &stmt.kind {
                S::Local { names, values } => {
                    if let Some(import) = self.lower_require(stmt, names, values) {
                        imports.push(import);
                        continue;
                    }
                    self.flush_static_block(&mut pending, &mut members);
                    self.lower_static_fields(stmt, names, values, &class_name, &mut members);
                }
                S::LocalFunction { name, func } => {
                    self.flush_static_block(&mut pending, &mut members);
                    let member = self.scope.declare_static(name.as_str(), &class_name);
                    let method = self.class_method(stmt, name, member, func, true);
                    members.push(method);
                }
                S::Function { name, func } => match self.class_function(name) {
                    Some(ClassFunction::Global(root)) => {
                        self.flush_static_block(&mut pending, &mut members);
                        let member = self.scope.declare_static(root.as_str(), &class_name);
                        let method = self.class_method(stmt, root, member, func, true);
                        members.push(method);
                    }
                    Some(ClassFunction::Static(field)) => {
                        self.flush_static_block(&mut pending, &mut members);
                        let method =
                            self.class_method(stmt, field, field.as_str().to_string(), func, true);
                        members.push(method);
                    }
                    Some(ClassFunction::Instance(method_name)) => {
                        self.flush_static_block(&mut pending, &mut members);
                        let method = self.class_method(
                            stmt,
                            method_name,
                            method_name.as_str().to_string(),
                            func,
                            false,
                        );
                        members.push(method);
                    }
                    None => self.lower_stmt(stmt, &mut pending),
                },
                _ => self.lower_stmt(stmt, &mut pending),
            }
        }
        self.flush_static_block(&mut pending, &mut members);

        if let (None, Some((stmt, _))) = (table, trailing) {
            self.diagnostics.unsupported(
                stmt.span,
                "a classmod chunk must end by returning its class table",
            );
        }

        let name_origin = match table {
            Some((_, name, _)) => Provenance::from(name),
            None => Synthetic,
        };
        let name = self.b.ident(name_origin, class_name);
        let export = self
            .b
            .stmt(chunk, StmtKind::ExportDefaultClass(Class { name, members }));
        imports.push(export);
        imports
    }

    /// Statements between members run in a `static { }` block.
    fn flush_static_block(&mut self, pending: &mut Vec<Stmt>, members: &mut Vec<ClassMember>) {
        if pending.is_empty() {
            return;
        }
        let stmts = std::mem::take(pending);
        members.push(self.b.class_member(Synthetic, MemberKind::StaticBlock(stmts)));
    }

    /// Named fields of `local Class = { ... }` become static properties.
    fn lower_class_table(&mut self, fields: &[lua::Field], members: &mut Vec<ClassMember>) {
        for field in fields {
            let FieldKind::Named(name, value) = &field.kind else {
                self.diagnostics.unsupported(
                    field.span,
                    "only named fields of a class table become class members",
                );
                continue;
            };
            let value = self.lower_expr(value);
            let name = self.b.ident(name, name.as_str());
            members.push(self.b.class_member(
                field,
                MemberKind::Property {
                    is_static: true,
                    name,
                    value: Some(value),
                },
            ));
        }
    }

    /// `local x = e` at the top of the chunk is `static x = e;`.
    fn lower_static_fields(
        &mut self,
        stmt: &lua::Stmt,
        names: &[lua::LocalName],
        values: &[lua::Expr],
        class: &str,
        members: &mut Vec<ClassMember>,
    ) {
        let destructures =
            values.len() < names.len() && values.last().is_some_and(lua::Expr::is_multi_valued);
        if destructures {
            // static a; static b; static { [Class.a, Class.b] = f(); }
            let value = match values {
                [value] => self.lower_destructured(value),
                _ => {
                    let items = self.lower_multi(values);
                    self.b.expr(Synthetic, ExprKind::Array(items))
                }
            };
            let mut targets = Vec::with_capacity(names.len());
            for local in names {
                let member = self.scope.declare_static(local.name.as_str(), class);
                let ident = self.b.ident(&local.name, member.as_str());
                members.push(self.b.class_member(
                    stmt,
                    MemberKind::Property {
                        is_static: true,
                        name: ident,
                        value: None,
                    },
                ));
                let class_ref = self.b.name(Synthetic, class);
                targets.push(self.b.member(Synthetic, class_ref, member));
            }
            let pattern = self.b.expr(Synthetic, ExprKind::Array(targets));
            let assign = self.b.assign(Synthetic, AssignOp::Assign, pattern, value);
            let stmt = self.b.expr_stmt(stmt, assign);
            members.push(self.b.class_member(Synthetic, MemberKind::StaticBlock(vec![stmt])));
            return;
        }

        let (assigned, extra) = values.split_at(values.len().min(names.len()));
        let mut lowered = assigned
            .iter()
            .map(|v| self.lower_expr(v))
            .collect::<Vec<Expr>>()
            .into_iter();
        for local in names {
            let value = lowered.next();
            let member = self.scope.declare_static(local.name.as_str(), class);
            let ident = self.b.ident(&local.name, member);
            members.push(self.b.class_member(
                stmt,
                MemberKind::Property {
                    is_static: true,
                    name: ident,
                    value,
                },
            ));
        }
        let effects: Vec<Stmt> = extra
            .iter()
            .filter(|v| contains_call(v))
            .map(|v| {
                let lowered = self.lower_expr(v);
                self.b.expr_stmt(v, lowered)
            })
            .collect();
        if !effects.is_empty() {
            members.push(self.b.class_member(Synthetic, MemberKind::StaticBlock(effects)));
        }
    }

    fn class_method(
        &mut self,
        stmt: &lua::Stmt,
        name: &lua::Name,
        member: String,
        func: &lua::FuncBody,
        is_static: bool,
    ) -> ClassMember {
        let ident = self.b.ident(name, member);
        let style = if is_static {
            FunctionStyle::Plain
        } else {
            FunctionStyle::Method
        };
        let function = self.lower_function(func, style, None);
        self.b.class_member(
            stmt,
            MemberKind::Method {
                is_static,
                name: ident,
                function,
            },
        )
    }

    /// Where a `function` statement at the top of the chunk goes in the class.
    fn class_function<'a>(&self, name: &'a lua::FuncName) -> Option<ClassFunction<'a>> {
        match (name.path.as_slice(), &name.method) {
            ([root], None) if !self.scope.is_local(root.as_str()) => Some(ClassFunction::Global(root)),
            ([class, field], None) if self.is_class(class.as_str()) => {
                Some(ClassFunction::Static(field))
            }
            ([class], Some(method)) if self.is_class(class.as_str()) => {
                Some(ClassFunction::Instance(method))
            }
            _ => None,
        }
    }

    fn is_class(&self, name: &str) -> bool {
        self.class.as_deref() == Some(name)
    }

    /// `Class.__index = Class`, which the class makes redundant.
    fn is_index_assignment(&self, stmt: &lua::Stmt) -> bool {
        let S::Assign { targets, values } = &stmt.kind else {
            return false;
        };
        let ([target], [value]) = (targets.as_slice(), values.as_slice()) else {
            return false;
        };
        let L::Field { object, name } = &target.kind else {
            return false;
        };
        name.as_str() == "__index"
            && object.as_name().is_some_and(|n| self.is_class(n))
            && value.as_name().is_some_and(|n| self.is_class(n))
    }
}

enum ClassFunction<'a> {
    /// `function f()`
    Global(&'a lua::Name),
    /// `function Class.f()`
    Static(&'a lua::Name),
    /// `function Class:m()`
    Instance(&'a lua::Name),
}

/// The `local Class = { ... }` statement whose local the chunk returns:
/// its index, name and fields.
fn class_table<'a>(
    stmts: &'a [lua::Stmt],
    trailing: Option<(&lua::Stmt, &[lua::Expr])>,
) -> Option<(usize, &'a lua::Name, &'a [lua::Field])> {
    let (_, [returned]) = trailing? else {
        return None;
    };
    let returned = returned.as_name()?;
    stmts.iter().enumerate().find_map(|(i, stmt)| match &stmt.kind {
        S::Local { names, values } => match (names.as_slice(), values.as_slice()) {
            ([local], [value]) if local.name.as_str() == returned => match &value.kind {
                L::Table(fields) => Some((i, &local.name, fields.as_slice())),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use crate::lua;
    use crate::options::Options;
    use crate::transform::transform;
    use crate::ts::Emitter;

    fn classmod(source: &str) -> (String, Vec<String>) {
        let chunk = lua::parse(source).unwrap();
        let options = Options {
            classmod: true,
            ..Options::default()
        };
        let out = transform(&chunk, &options);
        (Emitter::emit(&out.program), out.diagnostics.into_vec())
    }

    #[test]
    fn test_class_table_becomes_class() {
        let source = "\
local Account = {}
Account.__index = Account
local fee = 1
function Account.new(balance)
  local self = setmetatable({}, Account)
  self.balance = balance
  return self
end
function Account:deposit(v)
  self.balance = self.balance + v - fee
end
return Account
";
        let (ts, diagnostics) = classmod(source);
        assert_eq!(
            ts,
            "\
export default class Account {
    static fee = 1;
    static new(balance) {
        let self = Object.setPrototypeOf({}, Account.prototype);
        self.balance = balance;
        return self;
    }
    deposit(v) {
        this.balance = this.balance + v - Account.fee;
    }
}
"
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_loose_statements_become_static_blocks() {
        let (ts, diagnostics) = classmod("print(1)\nfunction helper() return 1 end");
        assert_eq!(
            ts,
            "\
export default class Module {
    static {
        console.log(1);
    }
    static helper() {
        return 1;
    }
}
"
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_local_functions_are_static_members() {
        let (ts, _) = classmod(
            "local M = {}\nlocal function twice(x) return x * 2 end\nfunction M.run() return twice(2) end\nreturn M",
        );
        assert_eq!(
            ts,
            "\
export default class M {
    static twice(x) {
        return x * 2;
    }
    static run() {
        return M.twice(2);
    }
}
"
        );
    }

    #[test]
    fn test_requires_are_hoisted_above_class() {
        let (ts, _) = classmod(
            "local json = require(\"json\")\nlocal M = {}\nfunction M.f() return json end\nreturn M",
        );
        assert_eq!(
            ts,
            "\
import * as json from \"json\";
export default class M {
    static f() {
        return json;
    }
}
"
        );
    }

    #[test]
    fn test_named_table_fields_are_static() {
        let (ts, diagnostics) = classmod("local M = { version = \"1.0\", [1] = 2 }\nreturn M");
        assert_eq!(
            ts,
            "export default class M {\n    static version = \"1.0\";\n}\n"
        );
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].contains("only named fields"));
    }

    #[test]
    fn test_returning_non_class_is_reported() {
        let (ts, diagnostics) = classmod("local x = 1\nreturn x");
        assert_eq!(ts, "export default class Module {\n    static x = 1;\n}\n");
        assert_eq!(
            diagnostics,
            vec!["2:0: a classmod chunk must end by returning its class table".to_string()]
        );
    }
}
