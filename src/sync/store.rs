//! Optimistic state store.
//!
//! The store is the single source of truth for what the board shows. Every
//! mutation goes through it synchronously and, before returning, hands the new
//! snapshot to every subscriber. Mutations are applied in call order with no
//! batching, since drag-and-drop and debounced edits race on the same task.
//!
//! Values are kept behind `Rc` and replaced copy-on-write, so a subscriber
//! receives an immutable snapshot and may call back into the store (read or
//! write) without tripping a `RefCell` borrow.

use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::Rc;

use crate::models::{Comment, Project, Task, TaskPatch, User};

/// Handle returned by `subscribe`, used to unsubscribe.
pub type SubscriptionId = u64;

type Listener<V> = Rc<dyn Fn(&Rc<V>)>;

/// A value plus the callbacks interested in it.
pub struct Observable<V> {
    value: RefCell<Rc<V>>,
    listeners: RefCell<Vec<(SubscriptionId, Listener<V>)>>,
    next_id: Cell<SubscriptionId>,
    /// Bumped on every publish; a nested publish supersedes the outer one
    generation: Cell<u64>,
}

impl<V: Clone + 'static> Observable<V> {
    pub fn new(value: V) -> Self {
        Self {
            value: RefCell::new(Rc::new(value)),
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            generation: Cell::new(0),
        }
    }

    /// Current snapshot.
    pub fn get(&self) -> Rc<V> {
        self.value.borrow().clone()
    }

    /// Replace the value and notify.
    pub fn set(&self, value: V) {
        *self.value.borrow_mut() = Rc::new(value);
        self.publish();
    }

    /// Mutate the value in place and notify.
    pub fn update<R>(&self, f: impl FnOnce(&mut V) -> R) -> R {
        let result = {
            let mut slot = self.value.borrow_mut();
            f(Rc::make_mut(&mut slot))
        };
        self.publish();
        result
    }

    /// Register `listener`; it runs after every change, not for the current
    /// value.
    pub fn subscribe(&self, listener: impl Fn(&Rc<V>) + 'static) -> SubscriptionId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(lid, _)| *lid != id);
        listeners.len() != before
    }

    /// Hand the current snapshot to every listener.
    ///
    /// A listener that writes back triggers a nested publish, which delivers
    /// the newer snapshot to everyone; the outer round then stops so no later
    /// listener is left holding the older one.
    fn publish(&self) {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        let snapshot = self.get();
        let listeners: Vec<Listener<V>> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            if self.generation.get() != generation {
                break;
            }
            listener(&snapshot);
        }
    }
}

impl<V: Debug> Debug for Observable<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &self.value.borrow())
            .field("listeners", &self.listeners.borrow().len())
            .finish()
    }
}

/// An entity with a stable identity.
pub trait Record: Clone + 'static {
    type Id: Copy + Eq + Debug;

    fn id(&self) -> Self::Id;
}

impl Record for Task {
    type Id = crate::models::TaskId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Record for Comment {
    type Id = crate::models::CommentId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Record for User {
    type Id = crate::models::UserId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

impl Record for Project {
    type Id = crate::models::ProjectId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// A record that accepts partial updates.
pub trait Patchable: Record {
    type Patch;

    fn apply_patch(&mut self, patch: &Self::Patch);
}

impl Patchable for Task {
    type Patch = TaskPatch;

    fn apply_patch(&mut self, patch: &TaskPatch) {
        self.apply(patch);
    }
}

/// Ordered, observable list of records. New records go first.
#[derive(Debug)]
pub struct Collection<T> {
    items: Observable<Vec<T>>,
}

impl<T: Record> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> Collection<T> {
    pub fn new() -> Self {
        Self {
            items: Observable::new(Vec::new()),
        }
    }

    pub fn snapshot(&self) -> Rc<Vec<T>> {
        self.items.get()
    }

    pub fn get(&self, id: T::Id) -> Option<T> {
        self.items.get().iter().find(|item| item.id() == id).cloned()
    }

    pub fn contains(&self, id: T::Id) -> bool {
        self.items.get().iter().any(|item| item.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.get().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.get().is_empty()
    }

    /// Replace the whole collection.
    pub fn replace_all(&self, items: Vec<T>) {
        self.items.set(items);
    }

    /// Prepend `item`.
    pub fn insert(&self, item: T) {
        self.items.update(|items| items.insert(0, item));
    }

    /// Remove the record with `id`. No-op (and no notification) if absent.
    pub fn remove(&self, id: T::Id) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.items.update(|items| items.retain(|item| item.id() != id));
        true
    }

    /// Overwrite the record with the same id as `item`, keeping its position.
    ///
    /// No-op if absent: a late server answer never resurrects a removed record.
    pub fn replace(&self, item: T) -> bool {
        self.update(item.id(), move |slot| *slot = item)
    }

    /// Mutate the record with `id` in place. No-op if absent.
    pub fn update(&self, id: T::Id, f: impl FnOnce(&mut T)) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.items.update(|items| {
            if let Some(slot) = items.iter_mut().find(|item| item.id() == id) {
                f(slot);
            }
        });
        true
    }

    pub fn subscribe(&self, listener: impl Fn(&Rc<Vec<T>>) + 'static) -> SubscriptionId {
        self.items.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.items.unsubscribe(id)
    }
}

impl<T: Patchable> Collection<T> {
    /// Merge `patch` into the record with `id`. No-op if absent.
    pub fn apply_patch(&self, id: T::Id, patch: &T::Patch) -> bool {
        self.update(id, |item| item.apply_patch(patch))
    }
}

/// Every locally-visible collection the board reads from.
#[derive(Debug)]
pub struct OptimisticStore {
    tasks: Collection<Task>,
    comments: Collection<Comment>,
    users: Collection<User>,
    project: Observable<Option<Project>>,
    loading: Observable<bool>,
    error: Observable<Option<String>>,
}

impl Default for OptimisticStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OptimisticStore {
    pub fn new() -> Self {
        Self {
            tasks: Collection::new(),
            comments: Collection::new(),
            users: Collection::new(),
            project: Observable::new(None),
            loading: Observable::new(false),
            error: Observable::new(None),
        }
    }

    pub fn tasks(&self) -> &Collection<Task> {
        &self.tasks
    }

    /// Comments of the selected task.
    pub fn comments(&self) -> &Collection<Comment> {
        &self.comments
    }

    pub fn users(&self) -> &Collection<User> {
        &self.users
    }

    pub fn project(&self) -> &Observable<Option<Project>> {
        &self.project
    }

    pub fn loading(&self) -> &Observable<bool> {
        &self.loading
    }

    /// Last error message, kept until the next one.
    pub fn error(&self) -> &Observable<Option<String>> {
        &self.error
    }

    pub fn set_error(&self, message: impl Into<String>) {
        self.error.set(Some(message.into()));
    }
}
