//! Synchronous typed publish/subscribe.
//!
//! Every observable object in the editor (containers, tree stores,
//! projects) owns an `EventDispatcher` for its event type. Delivery is
//! synchronous and in registration order — there is no scheduler and no
//! queue, so the ordering guarantees of the editor (action applied before
//! listeners observe it) hold by construction.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Handle returned by [`EventDispatcher::on`], used to unsubscribe.
///
/// Closures have no identity in Rust, so removal is by handle rather than
/// by the handler itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler<E> = Rc<dyn Fn(&E)>;

/// A single-threaded event dispatcher.
///
/// Shared via `Rc` between the emitting owner and its observers. Handlers
/// may subscribe or unsubscribe from within a dispatch: `emit` walks a
/// snapshot of the listener list, so changes take effect on the next emit.
pub struct EventDispatcher<E> {
    listeners: RefCell<Vec<(ListenerId, Handler<E>)>>,
    next_id: Cell<u64>,
    disposed: Cell<bool>,
}

impl<E> EventDispatcher<E> {
    pub fn new() -> Self {
        Self {
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            disposed: Cell::new(false),
        }
    }

    /// Register a handler. Returns a handle for [`off`](Self::off).
    ///
    /// On a disposed dispatcher this is a no-op returning a dead id.
    pub fn on(&self, handler: impl Fn(&E) + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);
        if self.disposed.get() {
            return id;
        }
        self.listeners.borrow_mut().push((id, Rc::new(handler)));
        id
    }

    /// Remove a handler by handle. Returns whether anything was removed.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Invoke every listener with `event`, in registration order.
    ///
    /// No isolation between handlers: a panic aborts the remaining
    /// dispatch, matching the source semantics of an uncaught throw.
    pub fn emit(&self, event: &E) {
        if self.disposed.get() {
            return;
        }
        let snapshot: Vec<Handler<E>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, h)| Rc::clone(h))
            .collect();
        for handler in snapshot {
            handler(event);
        }
    }

    /// Clear all listeners and refuse further emits.
    pub fn dispose(&self) {
        self.listeners.borrow_mut().clear();
        self.disposed.set(true);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }
}

impl<E> Default for EventDispatcher<E> {
    fn default() -> Self {
        Self::new()
    }
}
