use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::paths::{is_within, segments};
use crate::store::{ChildEvent, ChildHandler, FeedStore, StoreFuture, SubscriptionId};

const PUSH_CHARS: &'static [u8; 64] =
    b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// In-process record store with the same child-event behaviour as the hosted
/// backend. Used for tests and for running the page without a backend.
///
/// Writes land when their future is polled, and the resulting child events
/// are delivered synchronously from that poll.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Rc<RefCell<Inner>>,
}

#[derive(Default)]
struct Inner {
    root: Value,
    watchers: BTreeMap<SubscriptionId, Watcher>,
    next_subscription: u64,
    clock: u64,
    failing: Vec<String>,
    committed: Vec<String>,
}

struct Watcher {
    path: String,
    handler: ChildHandler,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Current value at `path`, if any.
    pub fn get(&self, path: &str) -> Option<Value> {
        lookup(&self.inner.borrow().root, path).cloned()
    }

    /// Writes immediately, as another client would.
    pub fn set_now(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.commit(vec![(path.to_owned(), value)])
    }

    /// Makes every later write at or below `path` fail.
    pub fn fail_writes_under(&self, path: &str) {
        self.inner.borrow_mut().failing.push(path.to_owned());
    }

    pub fn restore_writes_under(&self, path: &str) {
        self.inner.borrow_mut().failing.retain(|failing| failing != path);
    }

    /// Paths of every write that landed, in order.
    pub fn committed_paths(&self) -> Vec<String> {
        self.inner.borrow().committed.clone()
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.borrow().watchers.len()
    }

    fn commit(&self, writes: Vec<(String, Value)>) -> Result<(), StoreError> {
        let notifications = {
            let mut inner = self.inner.borrow_mut();

            for (path, _) in &writes {
                if inner.failing.iter().any(|failing| is_within(failing, path)) {
                    return Err(StoreError::rejected(path, "permission denied"));
                }
            }

            let watched: Vec<(String, ChildHandler, Map<String, Value>)> = inner
                .watchers
                .values()
                .map(|watcher| {
                    let before = children(&inner.root, &watcher.path);
                    (watcher.path.clone(), watcher.handler.clone(), before)
                })
                .collect();

            for (path, value) in writes {
                write(&mut inner.root, &path, value);
                inner.committed.push(path);
            }

            let mut notifications = Vec::new();
            for (path, handler, before) in watched {
                let after = children(&inner.root, &path);
                for event in diff(&before, &after) {
                    notifications.push((handler.clone(), event));
                }
            }
            notifications
        };

        for (handler, event) in notifications {
            handler(event);
        }

        Ok(())
    }

    fn next_push_id(&self) -> Result<String, StoreError> {
        let now = {
            let mut inner = self.inner.borrow_mut();
            inner.clock += 1;
            inner.clock
        };

        let mut random = [0u8; 12];
        getrandom::getrandom(&mut random)
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        Ok(push_id(now, &random))
    }
}

impl FeedStore for MemoryStore {
    fn set(&self, path: &str, value: Value) -> StoreFuture<()> {
        let store = self.clone();
        let path = path.to_owned();
        Box::pin(async move { store.commit(vec![(path, value)]) })
    }

    fn update(&self, updates: Map<String, Value>) -> StoreFuture<()> {
        let store = self.clone();
        Box::pin(async move { store.commit(updates.into_iter().collect()) })
    }

    fn push_key(&self, _path: &str) -> Result<String, StoreError> {
        self.next_push_id()
    }

    fn once(&self, path: &str) -> StoreFuture<Option<Value>> {
        let store = self.clone();
        let path = path.to_owned();
        Box::pin(async move { Ok(store.get(&path)) })
    }

    fn remove(&self, path: &str) -> StoreFuture<()> {
        self.set(path, Value::Null)
    }

    fn subscribe(&self, path: &str, handler: ChildHandler) -> Result<SubscriptionId, StoreError> {
        let (id, existing) = {
            let mut inner = self.inner.borrow_mut();
            inner.next_subscription += 1;
            let id = SubscriptionId(inner.next_subscription);

            inner.watchers.insert(
                id,
                Watcher {
                    path: path.to_owned(),
                    handler: handler.clone(),
                },
            );
            (id, children(&inner.root, path))
        };

        for (key, value) in existing {
            handler(ChildEvent::Added { key, value });
        }

        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        self.inner.borrow_mut().watchers.remove(&id);
    }
}

/// Push-style key: 8 characters of logical time, then 12 random ones.
/// Keys sort in allocation order.
fn push_id(time: u64, random: &[u8; 12]) -> String {
    let mut time_chars = [0u8; 8];
    let mut remaining = time;
    for slot in time_chars.iter_mut().rev() {
        *slot = PUSH_CHARS[(remaining % 64) as usize];
        remaining /= 64;
    }

    time_chars
        .iter()
        .chain(random.iter().map(|byte| &PUSH_CHARS[(byte % 64) as usize]))
        .map(|&ch| ch as char)
        .collect()
}

fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let found = segments(path).try_fold(root, |node, segment| node.get(segment))?;
    if found.is_null() {
        None
    } else {
        Some(found)
    }
}

fn children(root: &Value, path: &str) -> Map<String, Value> {
    match lookup(root, path) {
        Some(Value::Object(children)) => children.clone(),
        _ => Map::new(),
    }
}

fn write(root: &mut Value, path: &str, value: Value) {
    let path: Vec<&str> = segments(path).collect();
    if path.is_empty() {
        *root = value;
        return;
    }
    write_below(root, &path, value);
}

/// Null and empty objects delete, and parents left empty disappear with them.
fn write_below(node: &mut Value, path: &[&str], value: Value) {
    let deleting = is_empty(&value);
    if !node.is_object() {
        if deleting {
            return;
        }
        *node = Value::Object(Map::new());
    }

    let children = match node {
        Value::Object(children) => children,
        _ => return,
    };

    match path {
        [] => {}
        [last] => {
            if deleting {
                children.remove(*last);
            } else {
                children.insert((*last).to_owned(), value);
            }
        }
        [first, rest @ ..] => {
            let child = children.entry((*first).to_owned()).or_insert(Value::Null);
            write_below(child, rest, value);
            if is_empty(child) {
                children.remove(*first);
            }
        }
    }
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(children) => children.is_empty(),
        _ => false,
    }
}

fn diff(before: &Map<String, Value>, after: &Map<String, Value>) -> Vec<ChildEvent> {
    let mut events = Vec::new();

    for (key, value) in before {
        if !after.contains_key(key) {
            events.push(ChildEvent::Removed {
                key: key.clone(),
                value: value.clone(),
            });
        }
    }
    for (key, value) in after {
        match before.get(key) {
            None => events.push(ChildEvent::Added {
                key: key.clone(),
                value: value.clone(),
            }),
            Some(old) if old != value => events.push(ChildEvent::Changed {
                key: key.clone(),
                value: value.clone(),
            }),
            Some(_) => {}
        }
    }

    events
}
