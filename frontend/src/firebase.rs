//! Bindings to the namespaced Firebase JS SDK the host page loads, and the
//! store and session providers built on them.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use js_sys::{Function, Promise, JSON};
use log::debug;
use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::error::{describe_js, StoreError};
use crate::paths::join;
use crate::post::Identity;
use crate::session::{SessionCallback, SessionProvider};
use crate::store::{ChildEvent, ChildHandler, FeedStore, StoreFuture, SubscriptionId};

#[wasm_bindgen]
extern "C" {
    #[derive(Clone)]
    pub type Database;

    #[wasm_bindgen(js_namespace = firebase, js_name = database)]
    fn database() -> Database;

    #[wasm_bindgen(method, js_name = "ref")]
    fn reference(this: &Database, path: &str) -> Reference;

    #[wasm_bindgen(method, js_name = "ref")]
    fn root(this: &Database) -> Reference;

    #[derive(Clone)]
    pub type Reference;

    #[wasm_bindgen(method, getter)]
    fn key(this: &Reference) -> Option<String>;

    #[wasm_bindgen(method)]
    fn push(this: &Reference) -> Reference;

    #[wasm_bindgen(method)]
    fn set(this: &Reference, value: &JsValue) -> Promise;

    #[wasm_bindgen(method)]
    fn update(this: &Reference, values: &JsValue) -> Promise;

    #[wasm_bindgen(method)]
    fn remove(this: &Reference) -> Promise;

    #[wasm_bindgen(method)]
    fn once(this: &Reference, event_type: &str) -> Promise;

    #[wasm_bindgen(method)]
    fn on(
        this: &Reference,
        event_type: &str,
        callback: &Function,
        cancel_callback: &Function,
    ) -> Function;

    #[wasm_bindgen(method, js_name = off)]
    fn off_all(this: &Reference);

    pub type DataSnapshot;

    #[wasm_bindgen(method, getter, js_name = key)]
    fn snapshot_key(this: &DataSnapshot) -> Option<String>;

    #[wasm_bindgen(method)]
    fn val(this: &DataSnapshot) -> JsValue;

    #[derive(Clone)]
    pub type Auth;

    #[wasm_bindgen(js_namespace = firebase, js_name = auth)]
    fn auth() -> Auth;

    #[wasm_bindgen(method, js_name = onAuthStateChanged)]
    fn on_auth_state_changed(this: &Auth, observer: &Function) -> Function;

    #[wasm_bindgen(method, js_name = signInWithPopup)]
    fn sign_in_with_popup(this: &Auth, provider: &GoogleAuthProvider) -> Promise;

    #[wasm_bindgen(method, js_name = signOut)]
    fn sign_out(this: &Auth) -> Promise;

    pub type GoogleAuthProvider;

    #[wasm_bindgen(constructor, js_namespace = ["firebase", "auth"])]
    fn new() -> GoogleAuthProvider;

    pub type User;

    #[wasm_bindgen(method, getter)]
    fn uid(this: &User) -> String;

    #[wasm_bindgen(method, getter, js_name = displayName)]
    fn display_name(this: &User) -> Option<String>;

    #[wasm_bindgen(method, getter)]
    fn email(this: &User) -> Option<String>;

    #[wasm_bindgen(method, getter, js_name = photoURL)]
    fn photo_url(this: &User) -> Option<String>;
}

const CHILD_EVENTS: [&'static str; 3] = ["child_added", "child_changed", "child_removed"];

fn to_js(path: &str, value: &Value) -> Result<JsValue, StoreError> {
    let text = serde_json::to_string(value).map_err(|err| StoreError::Decode {
        path: path.to_owned(),
        reason: err.to_string(),
    })?;
    JSON::parse(&text).map_err(|err| StoreError::Decode {
        path: path.to_owned(),
        reason: describe_js(&err),
    })
}

fn from_js(path: &str, value: &JsValue) -> Result<Option<Value>, StoreError> {
    if value.is_null() || value.is_undefined() {
        return Ok(None);
    }

    let decode_err = |reason: String| StoreError::Decode {
        path: path.to_owned(),
        reason,
    };
    let text: String = JSON::stringify(value)
        .map_err(|err| decode_err(describe_js(&err)))?
        .into();
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|err| decode_err(err.to_string()))
}

async fn settle(path: String, promise: Promise) -> Result<JsValue, StoreError> {
    JsFuture::from(promise)
        .await
        .map_err(|err| StoreError::Rejected {
            path,
            reason: describe_js(&err),
        })
}

fn child_event(kind: &str, collection: &str, snapshot: &DataSnapshot) -> ChildEvent {
    let key = snapshot.snapshot_key().unwrap_or_default();
    let value = from_js(&join(collection, &key), &snapshot.val());
    classify(kind, key, value)
}

fn classify(kind: &str, key: String, value: Result<Option<Value>, StoreError>) -> ChildEvent {
    let value = match value {
        Ok(value) => value.unwrap_or(Value::Null),
        Err(error) => return ChildEvent::Malformed { key, error },
    };

    match kind {
        "child_added" => ChildEvent::Added { key, value },
        "child_changed" => ChildEvent::Changed { key, value },
        _ => ChildEvent::Removed { key, value },
    }
}

/// Handlers stay registered with the SDK for as long as their closures live.
struct Watcher {
    reference: Reference,
    _callbacks: Vec<Closure<dyn FnMut(DataSnapshot)>>,
    _cancel: Closure<dyn FnMut(JsValue)>,
}

/// `FeedStore` backed by the Firebase Realtime Database.
pub struct FirebaseStore {
    database: Database,
    watchers: RefCell<BTreeMap<SubscriptionId, Watcher>>,
    next_id: Cell<u64>,
}

impl FirebaseStore {
    pub fn new() -> Self {
        FirebaseStore {
            database: database(),
            watchers: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(0),
        }
    }
}

impl FeedStore for FirebaseStore {
    fn set(&self, path: &str, value: Value) -> StoreFuture<()> {
        let reference = self.database.reference(path);
        let path = path.to_owned();

        Box::pin(async move {
            let value = to_js(&path, &value)?;
            settle(path, reference.set(&value)).await.map(drop)
        })
    }

    fn update(&self, updates: Map<String, Value>) -> StoreFuture<()> {
        let root = self.database.root();

        Box::pin(async move {
            let values = to_js("/", &Value::Object(updates))?;
            settle("/".into(), root.update(&values)).await.map(drop)
        })
    }

    fn push_key(&self, path: &str) -> Result<String, StoreError> {
        self.database
            .reference(path)
            .push()
            .key()
            .ok_or_else(|| StoreError::MissingKey(path.to_owned()))
    }

    fn once(&self, path: &str) -> StoreFuture<Option<Value>> {
        let reference = self.database.reference(path);
        let path = path.to_owned();

        Box::pin(async move {
            let snapshot = settle(path.clone(), reference.once("value")).await?;
            from_js(&path, &snapshot.unchecked_into::<DataSnapshot>().val())
        })
    }

    fn remove(&self, path: &str) -> StoreFuture<()> {
        let reference = self.database.reference(path);
        let path = path.to_owned();

        Box::pin(async move { settle(path, reference.remove()).await.map(drop) })
    }

    fn subscribe(&self, path: &str, handler: ChildHandler) -> Result<SubscriptionId, StoreError> {
        let reference = self.database.reference(path);

        let cancel_path = path.to_owned();
        let cancel_handler = handler.clone();
        let cancel = Closure::<dyn FnMut(JsValue)>::new(move |err: JsValue| {
            cancel_handler(ChildEvent::Cancelled(StoreError::Rejected {
                path: cancel_path.clone(),
                reason: describe_js(&err),
            }));
        });

        let callbacks: Vec<_> = CHILD_EVENTS
            .iter()
            .map(|&kind| {
                let collection = path.to_owned();
                let handler = handler.clone();
                let callback = Closure::<dyn FnMut(DataSnapshot)>::new(
                    move |snapshot: DataSnapshot| {
                        handler(child_event(kind, &collection, &snapshot));
                    },
                );
                reference.on(
                    kind,
                    callback.as_ref().unchecked_ref(),
                    cancel.as_ref().unchecked_ref(),
                );
                callback
            })
            .collect();

        let id = SubscriptionId(self.next_id.get() + 1);
        self.next_id.set(id.0);
        self.watchers.borrow_mut().insert(
            id,
            Watcher {
                reference,
                _callbacks: callbacks,
                _cancel: cancel,
            },
        );

        debug!("firebase listening on {} as {:?}", path, id);
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if let Some(watcher) = self.watchers.borrow_mut().remove(&id) {
            watcher.reference.off_all();
        }
    }
}

fn identity_from_js(user: &JsValue) -> Option<Identity> {
    if user.is_null() || user.is_undefined() {
        return None;
    }

    let user: &User = user.unchecked_ref();
    Some(Identity {
        uid: user.uid(),
        display_name: user.display_name(),
        email: user.email(),
        photo_url: user.photo_url(),
    })
}

/// `SessionProvider` backed by Firebase Authentication with Google sign-in.
pub struct FirebaseSession {
    auth: Auth,
    observer: RefCell<Option<Closure<dyn FnMut(JsValue)>>>,
}

impl FirebaseSession {
    pub fn new() -> Self {
        FirebaseSession {
            auth: auth(),
            observer: RefCell::new(None),
        }
    }
}

impl SessionProvider for FirebaseSession {
    fn on_session_changed(&self, callback: SessionCallback) {
        let observer = Closure::<dyn FnMut(JsValue)>::new(move |user: JsValue| {
            callback(identity_from_js(&user));
        });

        self.auth
            .on_auth_state_changed(observer.as_ref().unchecked_ref());
        *self.observer.borrow_mut() = Some(observer);
    }

    /// Opens the popup right away, while the click that asked for it is
    /// still being handled.
    fn sign_in(&self) -> StoreFuture<()> {
        let pending = self.auth.sign_in_with_popup(&GoogleAuthProvider::new());
        Box::pin(async move { settle("auth".into(), pending).await.map(drop) })
    }

    fn sign_out(&self) -> StoreFuture<()> {
        let pending = self.auth.sign_out();
        Box::pin(async move { settle("auth".into(), pending).await.map(drop) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unreadable_snapshots_keep_their_error() {
        let error = StoreError::Decode {
            path: "user-posts/u1/-Na1".into(),
            reason: "cyclic object value".into(),
        };

        assert_eq!(
            classify("child_added", "-Na1".into(), Err(error.clone())),
            ChildEvent::Malformed {
                key: "-Na1".into(),
                error,
            }
        );
    }

    #[test]
    fn snapshots_map_to_their_event_kind() {
        assert_eq!(
            classify("child_changed", "-Na1".into(), Ok(Some(json!({"title": "T"})))),
            ChildEvent::Changed {
                key: "-Na1".into(),
                value: json!({"title": "T"}),
            }
        );
        assert_eq!(
            classify("child_removed", "-Na1".into(), Ok(None)),
            ChildEvent::Removed {
                key: "-Na1".into(),
                value: Value::Null,
            }
        );
    }
}
