//! In-memory record tree.

use super::model::Record;
use super::store::RecordStore;
use crate::error::{CoreError, CoreResult};
use crate::types::RecordId;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Node {
    record: Record,
    parent: Option<RecordId>,
    children: Vec<RecordId>,
}

/// An in-memory [`RecordStore`].
///
/// Records live in an arena keyed by ID; the tree is kept as parent and
/// child ID lists. Removing a record removes its whole subtree.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    nodes: BTreeMap<RecordId, Node>,
    roots: Vec<RecordId>,
    next_id: u64,
}

impl MemoryRecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a top-level record and returns its ID.
    pub fn insert(&mut self, record: Record) -> CoreResult<RecordId> {
        self.attach(record, None)
    }

    /// Appends a top-level record built from a description.
    pub fn create(&mut self, description: impl Into<String>) -> CoreResult<RecordId> {
        self.insert(Record::new(description))
    }

    /// Appends a record as the last child of `parent`.
    pub fn insert_child(&mut self, parent: RecordId, record: Record) -> CoreResult<RecordId> {
        if !self.nodes.contains_key(&parent) {
            return Err(CoreError::RecordNotFound {
                id: parent.as_u64(),
            });
        }
        self.attach(record, Some(parent))
    }

    fn attach(&mut self, mut record: Record, parent: Option<RecordId>) -> CoreResult<RecordId> {
        if record.id.is_unassigned() {
            record.id = self.allocate_id();
        } else if self.nodes.contains_key(&record.id) {
            return Err(CoreError::DuplicateRecordId {
                id: record.id.as_u64(),
            });
        }
        let id = record.id;
        self.next_id = self.next_id.max(id.as_u64());

        match parent {
            Some(p) => {
                if let Some(node) = self.nodes.get_mut(&p) {
                    node.children.push(id);
                }
            }
            None => self.roots.push(id),
        }
        self.nodes.insert(
            id,
            Node {
                record,
                parent,
                children: Vec::new(),
            },
        );
        Ok(id)
    }

    fn allocate_id(&mut self) -> RecordId {
        self.next_id += 1;
        while self.nodes.contains_key(&RecordId::new(self.next_id)) {
            self.next_id += 1;
        }
        RecordId::new(self.next_id)
    }

    /// Removes a record and its subtree. Returns the removed records in
    /// pre-order.
    pub fn remove(&mut self, id: RecordId) -> CoreResult<Vec<Record>> {
        let parent = self
            .nodes
            .get(&id)
            .ok_or(CoreError::RecordNotFound { id: id.as_u64() })?
            .parent;
        self.detach(id, parent);

        let mut order = Vec::new();
        self.walk(id, &mut order);
        Ok(order
            .into_iter()
            .filter_map(|rid| self.nodes.remove(&rid).map(|n| n.record))
            .collect())
    }

    /// Moves a record (with its subtree) under a new parent, or to the top
    /// level, at `position` among its new siblings (clamped).
    pub fn move_to(
        &mut self,
        id: RecordId,
        new_parent: Option<RecordId>,
        position: usize,
    ) -> CoreResult<()> {
        let old_parent = self
            .nodes
            .get(&id)
            .ok_or(CoreError::RecordNotFound { id: id.as_u64() })?
            .parent;

        if let Some(p) = new_parent {
            if !self.nodes.contains_key(&p) {
                return Err(CoreError::RecordNotFound { id: p.as_u64() });
            }
            let mut subtree = Vec::new();
            self.walk(id, &mut subtree);
            if subtree.contains(&p) {
                return Err(CoreError::write(
                    id.as_u64(),
                    "parent",
                    "cannot move a record under its own subtree",
                ));
            }
        }

        self.detach(id, old_parent);
        let siblings = match new_parent {
            Some(p) => match self.nodes.get_mut(&p) {
                Some(node) => &mut node.children,
                None => return Err(CoreError::RecordNotFound { id: p.as_u64() }),
            },
            None => &mut self.roots,
        };
        siblings.insert(position.min(siblings.len()), id);
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent = new_parent;
        }
        Ok(())
    }

    /// Returns the parent of a record.
    pub fn parent_of(&self, id: RecordId) -> Option<RecordId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// Returns the children of a record, in order.
    pub fn children_of(&self, id: RecordId) -> &[RecordId] {
        self.nodes.get(&id).map_or(&[], |n| n.children.as_slice())
    }

    /// Returns the top-level records, in order.
    pub fn roots(&self) -> &[RecordId] {
        &self.roots
    }

    /// Returns true if the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn detach(&mut self, id: RecordId, parent: Option<RecordId>) {
        let siblings = match parent {
            Some(p) => match self.nodes.get_mut(&p) {
                Some(node) => &mut node.children,
                None => return,
            },
            None => &mut self.roots,
        };
        siblings.retain(|&other| other != id);
    }

    fn walk(&self, id: RecordId, out: &mut Vec<RecordId>) {
        out.push(id);
        for &child in self.children_of(id) {
            self.walk(child, out);
        }
    }
}

impl RecordStore for MemoryRecordStore {
    fn ids(&self) -> Vec<RecordId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for &root in &self.roots {
            self.walk(root, &mut out);
        }
        out
    }

    fn record(&self, id: RecordId) -> Option<&Record> {
        self.nodes.get(&id).map(|n| &n.record)
    }

    fn record_mut(&mut self, id: RecordId) -> Option<&mut Record> {
        self.nodes.get_mut(&id).map(|n| &mut n.record)
    }

    fn count(&self) -> usize {
        self.nodes.len()
    }
}
