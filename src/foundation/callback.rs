//! Registration-ordered callback lists with releasable handles.
//!
//! Handlers run in registration order until one returns [`CallbackStatus::Stop`]. Releasing a
//! handle while its collection is dispatching is allowed; the entry is skipped for the rest of
//! the pass and dropped once the pass ends.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

/// Result of a single handler invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackStatus {
    /// Halt propagation to handlers registered later.
    Stop,
    /// Let later handlers see the event too.
    Continue,
}

/// Disposable subscription returned by every registration.
#[must_use = "a dropped handle can no longer release its callback"]
pub struct CallbackHandle {
    release: Option<Box<dyn FnOnce()>>,
}

impl CallbackHandle {
    pub(crate) fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A handle that owns nothing.
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Unregister the callback. Releasing twice is a no-op.
    pub fn release(&mut self) {
        if let Some(f) = self.release.take() {
            f();
        }
    }

    /// Return `true` once [`CallbackHandle::release`] ran.
    pub fn is_released(&self) -> bool {
        self.release.is_none()
    }
}

impl std::fmt::Debug for CallbackHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackHandle")
            .field("released", &self.is_released())
            .finish()
    }
}

/// Release every handle in `handles`, leaving the vector empty.
pub fn release_all(handles: &mut Vec<CallbackHandle>) {
    for mut h in handles.drain(..) {
        h.release();
    }
}

struct Slots<F: ?Sized> {
    next_id: Cell<u64>,
    depth: Cell<u32>,
    entries: RefCell<Vec<(u64, Box<F>)>>,
    released: RefCell<Vec<u64>>,
}

impl<F: ?Sized> Slots<F> {
    fn release(&self, id: u64) {
        if self.depth.get() == 0 {
            self.entries.borrow_mut().retain(|(e, _)| *e != id);
        } else {
            self.released.borrow_mut().push(id);
        }
    }

    fn is_released(&self, id: u64) -> bool {
        self.released.borrow().contains(&id)
    }
}

/// Ordered list of boxed callbacks of type `F`.
pub struct CallbackCollection<F: ?Sized> {
    slots: Rc<Slots<F>>,
}

impl<F: ?Sized> Clone for CallbackCollection<F> {
    fn clone(&self) -> Self {
        Self {
            slots: Rc::clone(&self.slots),
        }
    }
}

impl<F: ?Sized> Default for CallbackCollection<F> {
    fn default() -> Self {
        Self {
            slots: Rc::new(Slots {
                next_id: Cell::new(0),
                depth: Cell::new(0),
                entries: RefCell::new(Vec::new()),
                released: RefCell::new(Vec::new()),
            }),
        }
    }
}

impl<F: ?Sized + 'static> CallbackCollection<F> {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback; the returned handle removes it again.
    pub fn register(&self, callback: Box<F>) -> CallbackHandle {
        let id = self.slots.next_id.get();
        self.slots.next_id.set(id + 1);
        self.slots.entries.borrow_mut().push((id, callback));

        let weak: Weak<Slots<F>> = Rc::downgrade(&self.slots);
        CallbackHandle::new(move || {
            if let Some(slots) = weak.upgrade() {
                slots.release(id);
            }
        })
    }

    /// Number of live callbacks (outside of a dispatch pass).
    pub fn len(&self) -> usize {
        self.slots.entries.borrow().len()
    }

    /// Return `true` when no callbacks are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invoke callbacks in registration order through `call` until one returns `Stop`.
    pub fn dispatch(&self, mut call: impl FnMut(&mut F) -> CallbackStatus) -> CallbackStatus {
        let slots = &self.slots;
        let mut running = std::mem::take(&mut *slots.entries.borrow_mut());
        slots.depth.set(slots.depth.get() + 1);

        let mut status = CallbackStatus::Continue;
        for (id, callback) in running.iter_mut() {
            if slots.is_released(*id) {
                continue;
            }
            if call(callback) == CallbackStatus::Stop {
                status = CallbackStatus::Stop;
                break;
            }
        }

        slots.depth.set(slots.depth.get() - 1);
        let mut entries = slots.entries.borrow_mut();
        running.append(&mut entries);
        if slots.depth.get() == 0 {
            let released = std::mem::take(&mut *slots.released.borrow_mut());
            running.retain(|(id, _)| !released.contains(id));
        }
        *entries = running;
        status
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/callback.rs"]
mod tests;
