//! Side table from generated TypeScript nodes to the Lua nodes they came from.
//!
//! TypeScript nodes carry no positions. The transformer records the origin of
//! each node it builds here, keyed by the node's [`NodeId`], and the printer
//! reads it back when computing the source map.

use crate::lua::{NodeKind, Position, Span};
use crate::ts::NodeId;
use serde::Serialize;
use std::collections::BTreeMap;

/// Identifies a Lua node: its syntactic kind and where it was parsed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceRef {
    pub kind: &'static str,
    pub span: Span,
}

impl SourceRef {
    pub fn of<N: NodeKind + ?Sized>(node: &N) -> Self {
        Self {
            kind: node.kind_name(),
            span: node.span(),
        }
    }

    pub fn start(&self) -> Position {
        self.span.start
    }
}

/// Where a generated node came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "source")]
pub enum Provenance {
    /// Derived 1:1 from a Lua node.
    Origin(SourceRef),
    /// Scaffolding with no Lua counterpart (helpers, shims, temporaries).
    Synthetic,
}

impl Provenance {
    pub fn origin(&self) -> Option<&SourceRef> {
        match self {
            Provenance::Origin(source) => Some(source),
            Provenance::Synthetic => None,
        }
    }
}

impl<N: NodeKind> From<&N> for Provenance {
    fn from(node: &N) -> Self {
        Provenance::Origin(SourceRef::of(node))
    }
}

impl From<SourceRef> for Provenance {
    fn from(source: SourceRef) -> Self {
        Provenance::Origin(source)
    }
}

/// Identity-keyed provenance records.
///
/// Entries are written once, when the node is created, and never change.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProvenanceMap {
    entries: BTreeMap<NodeId, Provenance>,
}

impl ProvenanceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates a freshly created node with its origin.
    ///
    /// Recording a node twice keeps the first entry.
    pub fn record(&mut self, id: NodeId, provenance: Provenance) {
        let previous = self.entries.entry(id).or_insert(provenance);
        debug_assert!(
            *previous == provenance,
            "provenance of {id:?} recorded twice"
        );
    }

    /// The Lua node `id` was derived from, if any.
    pub fn get(&self, id: NodeId) -> Option<&SourceRef> {
        self.entries.get(&id).and_then(Provenance::origin)
    }

    /// The raw record for `id`, distinguishing synthetic from unknown nodes.
    pub fn provenance(&self, id: NodeId) -> Option<&Provenance> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All records in creation order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Provenance)> {
        self.entries.iter().map(|(id, provenance)| (*id, provenance))
    }
}
