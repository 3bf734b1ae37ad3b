//! Node construction with provenance bookkeeping.
//!
//! Every TypeScript node is created here. Creating a node mints its
//! [`NodeId`] and records where it came from in the same step, so no node
//! can exist without a provenance entry.

use crate::provenance::{Provenance, ProvenanceMap};
use crate::ts::*;

#[derive(Debug, Default)]
pub struct Builder {
    next_id: u32,
    provenance: ProvenanceMap,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provenance(&self) -> &ProvenanceMap {
        &self.provenance
    }

    pub fn into_provenance(self) -> ProvenanceMap {
        self.provenance
    }

    fn mint(&mut self, provenance: impl Into<Provenance>) -> NodeId {
        let id = NodeId::new(self.next_id);
        self.next_id += 1;
        self.provenance.record(id, provenance.into());
        id
    }

    pub fn expr(&mut self, provenance: impl Into<Provenance>, kind: ExprKind) -> Expr {
        Expr {
            id: self.mint(provenance),
            kind,
        }
    }

    pub fn stmt(&mut self, provenance: impl Into<Provenance>, kind: StmtKind) -> Stmt {
        Stmt {
            id: self.mint(provenance),
            kind,
        }
    }

    pub fn ident(&mut self, provenance: impl Into<Provenance>, name: impl Into<String>) -> Ident {
        Ident {
            id: self.mint(provenance),
            name: name.into(),
        }
    }

    pub fn prop(&mut self, provenance: impl Into<Provenance>, key: PropKey, value: Expr) -> Prop {
        Prop {
            id: self.mint(provenance),
            key,
            value,
        }
    }

    pub fn class_member(
        &mut self,
        provenance: impl Into<Provenance>,
        kind: MemberKind,
    ) -> ClassMember {
        ClassMember {
            id: self.mint(provenance),
            kind,
        }
    }

    pub fn array_pattern(
        &mut self,
        provenance: impl Into<Provenance>,
        elements: Vec<Pattern>,
    ) -> Pattern {
        Pattern::Array {
            id: self.mint(provenance),
            elements,
        }
    }

    // Shorthands for the shapes the lowering produces most.

    pub fn name(&mut self, provenance: impl Into<Provenance>, name: impl Into<String>) -> Expr {
        self.expr(provenance, ExprKind::Ident(name.into()))
    }

    pub fn number(&mut self, provenance: impl Into<Provenance>, value: f64) -> Expr {
        self.expr(provenance, ExprKind::Number(format_number(value)))
    }

    pub fn string(&mut self, provenance: impl Into<Provenance>, value: impl Into<String>) -> Expr {
        self.expr(provenance, ExprKind::String(value.into()))
    }

    pub fn member(
        &mut self,
        provenance: impl Into<Provenance>,
        object: Expr,
        property: impl Into<String>,
    ) -> Expr {
        self.expr(
            provenance,
            ExprKind::Member {
                object: Box::new(object),
                property: property.into(),
            },
        )
    }

    /// `Global.property`, both parts synthetic.
    pub fn global_member(&mut self, global: &str, property: &str) -> Expr {
        let object = self.name(Provenance::Synthetic, global);
        self.member(Provenance::Synthetic, object, property)
    }

    pub fn index(&mut self, provenance: impl Into<Provenance>, object: Expr, index: Expr) -> Expr {
        self.expr(
            provenance,
            ExprKind::Index {
                object: Box::new(object),
                index: Box::new(index),
            },
        )
    }

    pub fn call(&mut self, provenance: impl Into<Provenance>, callee: Expr, args: Vec<Expr>) -> Expr {
        self.expr(
            provenance,
            ExprKind::Call {
                callee: Box::new(callee),
                args,
            },
        )
    }

    pub fn binary(
        &mut self,
        provenance: impl Into<Provenance>,
        op: BinaryOp,
        left: Expr,
        right: Expr,
    ) -> Expr {
        self.expr(
            provenance,
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
        )
    }

    pub fn unary(&mut self, provenance: impl Into<Provenance>, op: UnaryOp, operand: Expr) -> Expr {
        self.expr(
            provenance,
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
        )
    }

    pub fn assign(
        &mut self,
        provenance: impl Into<Provenance>,
        op: AssignOp,
        target: Expr,
        value: Expr,
    ) -> Expr {
        self.expr(
            provenance,
            ExprKind::Assign {
                op,
                target: Box::new(target),
                value: Box::new(value),
            },
        )
    }

    pub fn expr_stmt(&mut self, provenance: impl Into<Provenance>, expr: Expr) -> Stmt {
        self.stmt(provenance, StmtKind::Expr(expr))
    }

    pub fn block(&mut self, provenance: impl Into<Provenance>, stmts: Vec<Stmt>) -> Stmt {
        self.stmt(provenance, StmtKind::Block(stmts))
    }

    /// Single-binding declaration; the binding identifier is synthetic.
    pub fn var_decl(
        &mut self,
        provenance: impl Into<Provenance>,
        kind: VarKind,
        name: &str,
        init: Option<Expr>,
    ) -> Stmt {
        let target = Pattern::Ident(self.ident(Provenance::Synthetic, name));
        self.stmt(
            provenance,
            StmtKind::Var(VarDecl {
                kind,
                declarators: vec![Declarator { target, init }],
            }),
        )
    }

    pub fn let_decl(
        &mut self,
        provenance: impl Into<Provenance>,
        name: &str,
        init: Option<Expr>,
    ) -> Stmt {
        self.var_decl(provenance, VarKind::Let, name, init)
    }

    pub fn const_decl(&mut self, provenance: impl Into<Provenance>, name: &str, init: Expr) -> Stmt {
        self.var_decl(provenance, VarKind::Const, name, Some(init))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lua::{Position, Span};
    use crate::provenance::SourceRef;

    #[test]
    fn test_every_node_is_recorded() {
        let origin = SourceRef {
            kind: "Identifier",
            span: Span {
                start: Position::new(1, 6),
                end: Position::new(1, 7),
                start_byte: 6,
                end_byte: 7,
            },
        };
        let mut b = Builder::new();
        let x = b.name(origin, "x");
        let stmt = b.let_decl(Provenance::Synthetic, "y", Some(x.clone()));

        let map = b.provenance();
        assert_eq!(map.get(x.id), Some(&origin));
        assert_eq!(map.provenance(stmt.id), Some(&Provenance::Synthetic));
        // expression, binding identifier, statement
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_ids_are_distinct_for_equal_nodes() {
        let mut b = Builder::new();
        let a = b.name(Provenance::Synthetic, "a");
        let c = b.name(Provenance::Synthetic, "a");
        assert_eq!(a.kind, c.kind);
        assert_ne!(a.id, c.id);
    }
}
