// Connections between ideas, drawn as straight lines between node centres.
//
// Pairs are unordered and stored normalised (lower id first), so A-B and B-A
// are the same connection. The physics engine never reads these.

use std::collections::{BTreeMap, BTreeSet};

use crate::physics::NodeId;

/// An undirected link between two ideas. `from` is always the lower id.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Connection {
    pub from: NodeId,
    pub to: NodeId,
}

impl Connection {
    pub fn new(a: NodeId, b: NodeId) -> Self {
        if a <= b { Self { from: a, to: b } } else { Self { from: b, to: a } }
    }

    pub fn touches(&self, id: NodeId) -> bool {
        self.from == id || self.to == id
    }

    /// The endpoint that is not `id`, if `id` is an endpoint.
    pub fn other(&self, id: NodeId) -> Option<NodeId> {
        if self.from == id {
            Some(self.to)
        } else if self.to == id {
            Some(self.from)
        } else {
            None
        }
    }
}

/// Connection set with a per-node neighbour index.
#[derive(Debug, Clone, Default)]
pub struct Connections {
    edges: BTreeSet<Connection>,
    neighbors: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl Connections {
    /// Add a connection. Returns false if it already existed.
    pub fn insert(&mut self, a: NodeId, b: NodeId) -> bool {
        let conn = Connection::new(a, b);
        if !self.edges.insert(conn) {
            return false;
        }
        self.neighbors.entry(conn.from).or_default().insert(conn.to);
        self.neighbors.entry(conn.to).or_default().insert(conn.from);
        true
    }

    /// Remove a connection. Returns false if there was none.
    pub fn remove(&mut self, a: NodeId, b: NodeId) -> bool {
        let conn = Connection::new(a, b);
        if !self.edges.remove(&conn) {
            return false;
        }
        self.unlink(conn.from, conn.to);
        self.unlink(conn.to, conn.from);
        true
    }

    fn unlink(&mut self, id: NodeId, other: NodeId) {
        if let Some(set) = self.neighbors.get_mut(&id) {
            set.remove(&other);
            if set.is_empty() {
                self.neighbors.remove(&id);
            }
        }
    }

    /// Drop every connection touching `id`. Returns how many were removed.
    pub fn remove_node(&mut self, id: NodeId) -> usize {
        let Some(others) = self.neighbors.remove(&id) else {
            return 0;
        };
        for &other in &others {
            self.edges.remove(&Connection::new(id, other));
            self.unlink(other, id);
        }
        others.len()
    }

    pub fn contains(&self, a: NodeId, b: NodeId) -> bool {
        self.edges.contains(&Connection::new(a, b))
    }

    /// Neighbours of `id`, ascending.
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.neighbors.get(&id).into_iter().flat_map(|s| s.iter().copied())
    }

    pub fn degree(&self, id: NodeId) -> usize {
        self.neighbors.get(&id).map(|s| s.len()).unwrap_or(0)
    }

    /// All connections, sorted by (from, to).
    pub fn iter(&self) -> impl Iterator<Item = Connection> + '_ {
        self.edges.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.neighbors.clear();
    }
}
