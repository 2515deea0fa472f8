#![forbid(unsafe_code)]

//! Listener registry.
//!
//! A dispatch table of `(target, kind) -> action` entries. A widget registers
//! its listeners when it becomes interactive and removes them when it is torn
//! down; dispatch only ever consults entries that are currently registered,
//! so a torn-down widget cannot react to events.
//!
//! The registry counts registrations and removals so callers can check that
//! teardown removed exactly what setup added.

use std::fmt;

/// The kind of event a listener reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Click,
    KeyPress,
    KeyDown,
    Blur,
}

/// Handle returned by [`ListenerRegistry::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listener<T, A> {
    pub target: T,
    pub kind: ListenerKind,
    pub action: A,
}

/// Registered listeners in insertion order.
pub struct ListenerRegistry<T, A> {
    entries: Vec<(ListenerId, Listener<T, A>)>,
    next_id: u64,
    registered: usize,
    removed: usize,
}

impl<T: fmt::Debug, A: fmt::Debug> fmt::Debug for ListenerRegistry<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("active", &self.entries.len())
            .field("registered", &self.registered)
            .field("removed", &self.removed)
            .finish()
    }
}

impl<T, A> Default for ListenerRegistry<T, A> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 0,
            registered: 0,
            removed: 0,
        }
    }
}

impl<T: PartialEq, A> ListenerRegistry<T, A> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, target: T, kind: ListenerKind, action: A) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.entries.push((
            id,
            Listener {
                target,
                kind,
                action,
            },
        ));
        self.registered += 1;
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        let Some(index) = self.entries.iter().position(|(i, _)| *i == id) else {
            return false;
        };
        self.entries.remove(index);
        self.removed += 1;
        true
    }

    /// Actions registered for `kind` on `target`, in registration order.
    pub fn actions<'a>(
        &'a self,
        target: &'a T,
        kind: ListenerKind,
    ) -> impl Iterator<Item = &'a A> + 'a {
        self.entries
            .iter()
            .filter(move |(_, l)| l.kind == kind && l.target == *target)
            .map(|(_, l)| &l.action)
    }

    #[must_use]
    pub fn has(&self, target: &T, kind: ListenerKind) -> bool {
        self.actions(target, kind).next().is_some()
    }

    /// Currently registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total registrations over the registry's lifetime.
    #[must_use]
    pub fn registered(&self) -> usize {
        self.registered
    }

    /// Total removals over the registry's lifetime.
    #[must_use]
    pub fn removed(&self) -> usize {
        self.removed
    }

    pub fn iter(&self) -> impl Iterator<Item = &Listener<T, A>> {
        self.entries.iter().map(|(_, l)| l)
    }
}
