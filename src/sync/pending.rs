//! Debounced, per-key pending writes.
//!
//! [`PendingWrites`] keeps at most one deferred write per key. Scheduling a
//! value for a key that already has one cancels the old timer and replaces the
//! value, so when the quiet period finally elapses the flush carries the most
//! recent value and nothing in between.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::rc::{Rc, Weak};
use std::time::Duration;

use tracing::debug;

use super::timer::{Timer, TimerHandle};

/// Action run with the held value when a pending write comes due.
pub type FlushFn<V> = Box<dyn FnOnce(V)>;

struct PendingWrite<V> {
    value: V,
    /// Distinguishes this registration from earlier ones under the same key
    generation: u64,
    handle: TimerHandle,
    flush: FlushFn<V>,
}

type Entries<K, V> = RefCell<HashMap<K, PendingWrite<V>>>;

/// Debounce scheduler keyed by `K` (typically an `(entity id, field)` pair).
pub struct PendingWrites<K, V> {
    timer: Rc<dyn Timer>,
    entries: Rc<Entries<K, V>>,
    generation: Cell<u64>,
}

impl<K, V> PendingWrites<K, V>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: 'static,
{
    pub fn new(timer: Rc<dyn Timer>) -> Self {
        Self {
            timer,
            entries: Rc::new(RefCell::new(HashMap::new())),
            generation: Cell::new(0),
        }
    }

    /// Register `value` for `key`, to be handed to `flush` once `delay` passes
    /// without another schedule for the same key.
    pub fn schedule(&self, key: K, value: V, delay: Duration, flush: impl FnOnce(V) + 'static) {
        let previous = self.entries.borrow_mut().remove(&key);
        if let Some(previous) = previous {
            debug!(key = ?key, "superseding pending write");
            previous.handle.cancel();
        }

        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        let entries: Weak<Entries<K, V>> = Rc::downgrade(&self.entries);
        let due_key = key.clone();
        let handle = self.timer.after(
            delay,
            Box::new(move || {
                let Some(entries) = entries.upgrade() else {
                    return;
                };
                let due = {
                    let mut map = entries.borrow_mut();
                    match map.get(&due_key) {
                        Some(entry) if entry.generation == generation => map.remove(&due_key),
                        _ => None,
                    }
                };
                if let Some(entry) = due {
                    debug!(key = ?due_key, "pending write came due");
                    (entry.flush)(entry.value);
                }
            }),
        );

        self.entries.borrow_mut().insert(
            key,
            PendingWrite {
                value,
                generation,
                handle,
                flush: Box::new(flush),
            },
        );
    }

    /// Run the pending write for `key` now instead of waiting for its timer.
    ///
    /// Returns `false` if nothing was pending.
    pub fn force_flush(&self, key: &K) -> bool {
        let entry = self.entries.borrow_mut().remove(key);
        match entry {
            Some(entry) => {
                debug!(key = ?key, "forcing pending write");
                entry.handle.cancel();
                (entry.flush)(entry.value);
                true
            }
            None => false,
        }
    }

    /// Force every pending write, in the order they were last scheduled.
    pub fn flush_all(&self) -> usize {
        let mut keys: Vec<(u64, K)> = self
            .entries
            .borrow()
            .iter()
            .map(|(k, e)| (e.generation, k.clone()))
            .collect();
        keys.sort_by_key(|(generation, _)| *generation);
        keys.into_iter()
            .filter(|(_, key)| self.force_flush(key))
            .count()
    }

    /// Drop the pending write for `key` without running it.
    pub fn cancel(&self, key: &K) -> Option<V> {
        let entry = self.entries.borrow_mut().remove(key)?;
        entry.handle.cancel();
        Some(entry.value)
    }

    /// Drop every pending write whose key matches `predicate`.
    pub fn cancel_where(&self, predicate: impl Fn(&K) -> bool) -> usize {
        let keys: Vec<K> = self
            .entries
            .borrow()
            .keys()
            .filter(|k| predicate(k))
            .cloned()
            .collect();
        keys.iter().filter(|k| self.cancel(k).is_some()).count()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl<K, V> PendingWrites<K, V>
where
    K: Eq + Hash + Clone + Debug + 'static,
    V: Clone + 'static,
{
    /// The value a pending write for `key` would carry.
    pub fn pending_value(&self, key: &K) -> Option<V> {
        self.entries.borrow().get(key).map(|e| e.value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::timer::ManualTimer;

    const DELAY: Duration = Duration::from_millis(1000);

    type Log = Rc<RefCell<Vec<(&'static str, String)>>>;

    fn setup() -> (ManualTimer, PendingWrites<&'static str, String>, Log) {
        let timer = ManualTimer::new();
        let writes = PendingWrites::new(Rc::new(timer.clone()) as Rc<dyn Timer>);
        (timer, writes, Rc::new(RefCell::new(Vec::new())))
    }

    fn schedule(writes: &PendingWrites<&'static str, String>, log: &Log, key: &'static str, v: &str) {
        let log = log.clone();
        writes.schedule(key, v.to_string(), DELAY, move |value| {
            log.borrow_mut().push((key, value))
        });
    }

    #[test]
    fn test_rapid_schedules_coalesce_to_last_value() {
        let (timer, writes, log) = setup();
        for value in ["a", "ab", "abc", "abcd"] {
            schedule(&writes, &log, "7:title", value);
            timer.advance(Duration::from_millis(100));
        }
        assert_eq!(writes.pending_value(&"7:title"), Some("abcd".to_string()));

        timer.advance(Duration::from_millis(899));
        assert!(log.borrow().is_empty());

        timer.advance(Duration::from_millis(1));
        assert_eq!(*log.borrow(), vec![("7:title", "abcd".to_string())]);

        timer.advance(Duration::from_secs(10));
        assert_eq!(log.borrow().len(), 1);
        assert!(writes.is_empty());
    }

    #[test]
    fn test_force_flush_runs_now_and_cancels_timer() {
        let (timer, writes, log) = setup();
        schedule(&writes, &log, "7:description", "first");
        schedule(&writes, &log, "7:description", "second");

        assert!(writes.force_flush(&"7:description"));
        assert_eq!(*log.borrow(), vec![("7:description", "second".to_string())]);
        assert!(!writes.is_pending(&"7:description"));

        timer.advance(Duration::from_secs(5));
        assert_eq!(log.borrow().len(), 1);
        assert_eq!(timer.pending(), 0);
    }

    #[test]
    fn test_force_flush_without_pending_is_noop() {
        let (_timer, writes, log) = setup();
        assert!(!writes.force_flush(&"missing"));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn test_keys_are_independent() {
        let (timer, writes, log) = setup();
        schedule(&writes, &log, "1:title", "one");
        timer.advance(Duration::from_millis(500));
        schedule(&writes, &log, "2:title", "two");
        assert_eq!(writes.len(), 2);

        timer.advance(Duration::from_millis(500));
        assert_eq!(*log.borrow(), vec![("1:title", "one".to_string())]);

        timer.advance(Duration::from_millis(500));
        assert_eq!(
            *log.borrow(),
            vec![("1:title", "one".to_string()), ("2:title", "two".to_string())]
        );
    }

    #[test]
    fn test_schedule_after_fire_starts_fresh_entry() {
        let (timer, writes, log) = setup();
        schedule(&writes, &log, "k", "v1");
        timer.advance(DELAY);
        schedule(&writes, &log, "k", "v2");
        timer.advance(DELAY);
        assert_eq!(
            *log.borrow(),
            vec![("k", "v1".to_string()), ("k", "v2".to_string())]
        );
    }

    #[test]
    fn test_flush_all_in_schedule_order() {
        let (timer, writes, log) = setup();
        schedule(&writes, &log, "b", "1");
        schedule(&writes, &log, "a", "2");
        schedule(&writes, &log, "b", "3");

        assert_eq!(writes.flush_all(), 2);
        assert_eq!(
            *log.borrow(),
            vec![("a", "2".to_string()), ("b", "3".to_string())]
        );
        timer.advance(Duration::from_secs(5));
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn test_cancel_drops_write() {
        let (timer, writes, log) = setup();
        schedule(&writes, &log, "3:title", "x");
        schedule(&writes, &log, "3:description", "y");
        schedule(&writes, &log, "4:title", "z");

        assert_eq!(writes.cancel(&"4:title"), Some("z".to_string()));
        assert_eq!(writes.cancel_where(|k| k.starts_with("3:")), 2);
        timer.advance(Duration::from_secs(5));
        assert!(log.borrow().is_empty());
        assert!(writes.is_empty());
    }

    #[test]
    fn test_flush_may_reschedule_same_key() {
        let timer = ManualTimer::new();
        let writes: Rc<PendingWrites<&'static str, u32>> =
            Rc::new(PendingWrites::new(Rc::new(timer.clone()) as Rc<dyn Timer>));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let inner = writes.clone();
        let inner_seen = seen.clone();
        writes.schedule("k", 1, DELAY, move |value| {
            inner_seen.borrow_mut().push(value);
            let again = inner_seen.clone();
            inner.schedule("k", value + 1, DELAY, move |v| again.borrow_mut().push(v));
        });

        timer.advance(DELAY * 2);
        assert_eq!(*seen.borrow(), vec![1, 2]);
    }
}
