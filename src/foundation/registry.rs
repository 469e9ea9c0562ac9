//! Name-keyed tables of shared capabilities with handle-based unregistration.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::foundation::callback::CallbackHandle;

type Entries<T> = RefCell<BTreeMap<String, Rc<T>>>;

/// Map from name to `Rc<T>`. Clones share the same table.
pub struct NamedRegistry<T: ?Sized> {
    entries: Rc<Entries<T>>,
}

impl<T: ?Sized> Clone for NamedRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Rc::clone(&self.entries),
        }
    }
}

impl<T: ?Sized> Default for NamedRegistry<T> {
    fn default() -> Self {
        Self {
            entries: Rc::new(RefCell::new(BTreeMap::new())),
        }
    }
}

impl<T: ?Sized> std::fmt::Debug for NamedRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl<T: ?Sized + 'static> NamedRegistry<T> {
    /// Store `value` under `name`, replacing any previous entry.
    pub fn insert(&self, name: impl Into<String>, value: Rc<T>) {
        let name = name.into();
        if self
            .entries
            .borrow_mut()
            .insert(name.clone(), value)
            .is_some()
        {
            tracing::debug!(%name, "registry entry replaced");
        }
    }

    /// Store `value` under `name`. Releasing the handle removes the entry unless it was
    /// replaced in the meantime.
    pub fn register(&self, name: impl Into<String>, value: Rc<T>) -> CallbackHandle {
        let name = name.into();
        self.insert(name.clone(), Rc::clone(&value));

        let weak: Weak<Entries<T>> = Rc::downgrade(&self.entries);
        CallbackHandle::new(move || {
            let Some(entries) = weak.upgrade() else {
                return;
            };
            let mut entries = entries.borrow_mut();
            if entries.get(&name).is_some_and(|cur| Rc::ptr_eq(cur, &value)) {
                entries.remove(&name);
            }
        })
    }
}

impl<T: ?Sized> NamedRegistry<T> {
    /// Entry for `name`.
    pub fn get(&self, name: &str) -> Option<Rc<T>> {
        self.entries.borrow().get(name).cloned()
    }

    /// Return `true` when `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.borrow().contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.entries.borrow().keys().cloned().collect()
    }

    /// Remove `name`, returning its entry.
    pub fn remove(&self, name: &str) -> Option<Rc<T>> {
        self.entries.borrow_mut().remove(name)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/registry.rs"]
mod tests;
