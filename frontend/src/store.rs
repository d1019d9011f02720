use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::StoreError;

pub type StoreFuture<T> = LocalBoxFuture<'static, Result<T, StoreError>>;
pub type ChildHandler = Rc<dyn Fn(ChildEvent)>;

#[derive(Hash, Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

/// A change to one direct child of a watched path.
#[derive(Clone, Debug, PartialEq)]
pub enum ChildEvent {
    Added { key: String, value: Value },
    Changed { key: String, value: Value },
    Removed { key: String, value: Value },
    /// A child changed, but its value could not be read.
    Malformed { key: String, error: StoreError },
    /// The backend dropped the subscription, e.g. after a permission change.
    Cancelled(StoreError),
}

/// Path-addressed record store with child-level change notifications.
///
/// Writing `Value::Null` to a path removes the record there. Futures are
/// lazy: nothing reaches the backend until they are polled, except for
/// `push_key`, `subscribe` and `unsubscribe`, which act immediately.
pub trait FeedStore {
    fn set(&self, path: &str, value: Value) -> StoreFuture<()>;

    /// Applies every `path -> value` entry as one atomic write.
    fn update(&self, updates: Map<String, Value>) -> StoreFuture<()>;

    /// Allocates a fresh child key under `path` without writing anything.
    fn push_key(&self, path: &str) -> Result<String, StoreError>;

    fn once(&self, path: &str) -> StoreFuture<Option<Value>>;

    fn remove(&self, path: &str) -> StoreFuture<()>;

    /// Starts delivering child events for `path`, beginning with an `Added`
    /// for every child that already exists.
    fn subscribe(&self, path: &str, handler: ChildHandler) -> Result<SubscriptionId, StoreError>;

    fn unsubscribe(&self, id: SubscriptionId);
}

pub fn encode<T: Serialize>(path: &str, record: &T) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|err| StoreError::Decode {
        path: path.to_owned(),
        reason: err.to_string(),
    })
}

pub fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|err| StoreError::Decode {
        path: path.to_owned(),
        reason: err.to_string(),
    })
}

/// One-time typed read. A missing record and an explicit null both read as `None`.
pub fn once_as<T: DeserializeOwned + 'static>(
    store: &dyn FeedStore,
    path: &str,
) -> StoreFuture<Option<T>> {
    let path = path.to_owned();
    let pending = store.once(&path);

    Box::pin(async move {
        match pending.await? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => decode(&path, value).map(Some),
        }
    })
}
