use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashSet};

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::model::annotation::{Annotation, AnnotationId};
use crate::persist::bridge::{PersistError, PersistOp, PersistenceBridge};

/// In-process backend keeping annotations in a map, with call counters and failure injection.
#[derive(Debug, Default)]
pub struct MemoryBridge {
    stored: RefCell<BTreeMap<AnnotationId, Annotation>>,
    failing: RefCell<HashSet<PersistOp>>,
    creates: Cell<usize>,
    updates: Cell<usize>,
    deletes: Cell<usize>,
}

impl MemoryBridge {
    /// Empty backend that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `op` fail (or succeed again).
    pub fn set_failing(&self, op: PersistOp, failing: bool) {
        let mut set = self.failing.borrow_mut();
        if failing {
            set.insert(op);
        } else {
            set.remove(&op);
        }
    }

    /// Number of create calls received.
    pub fn create_calls(&self) -> usize {
        self.creates.get()
    }

    /// Number of update calls received.
    pub fn update_calls(&self) -> usize {
        self.updates.get()
    }

    /// Number of delete calls received.
    pub fn delete_calls(&self) -> usize {
        self.deletes.get()
    }

    /// Stored copy of `id`.
    pub fn stored(&self, id: &AnnotationId) -> Option<Annotation> {
        self.stored.borrow().get(id).cloned()
    }

    /// Number of stored annotations.
    pub fn len(&self) -> usize {
        self.stored.borrow().len()
    }

    /// Return `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check(&self, op: PersistOp, id: &AnnotationId) -> Result<(), PersistError> {
        let counter = match op {
            PersistOp::Create => &self.creates,
            PersistOp::Update => &self.updates,
            PersistOp::Delete => &self.deletes,
        };
        counter.set(counter.get() + 1);
        if self.failing.borrow().contains(&op) {
            return Err(PersistError::new(op, id.clone(), "rejected by memory backend"));
        }
        Ok(())
    }
}

impl PersistenceBridge for MemoryBridge {
    fn create<'a>(
        &'a self,
        annotation: &'a Annotation,
    ) -> LocalBoxFuture<'a, Result<Annotation, PersistError>> {
        async move {
            self.check(PersistOp::Create, &annotation.id)?;
            self.stored
                .borrow_mut()
                .insert(annotation.id.clone(), annotation.clone());
            Ok(annotation.clone())
        }
        .boxed_local()
    }

    fn update<'a>(
        &'a self,
        annotation: &'a Annotation,
    ) -> LocalBoxFuture<'a, Result<Annotation, PersistError>> {
        async move {
            self.check(PersistOp::Update, &annotation.id)?;
            self.stored
                .borrow_mut()
                .insert(annotation.id.clone(), annotation.clone());
            Ok(annotation.clone())
        }
        .boxed_local()
    }

    fn delete<'a>(&'a self, annotation: &'a Annotation) -> LocalBoxFuture<'a, Result<(), PersistError>> {
        async move {
            self.check(PersistOp::Delete, &annotation.id)?;
            self.stored.borrow_mut().remove(&annotation.id);
            Ok(())
        }
        .boxed_local()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/persist/memory.rs"]
mod tests;
