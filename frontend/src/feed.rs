use std::rc::Rc;

use log::debug;

use crate::error::StoreError;
use crate::paths::join;
use crate::post::{Post, PostId};
use crate::store::{decode, ChildEvent, FeedStore, SubscriptionId};

/// Child events of a post collection, decoded into posts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FeedEvent {
    Added(PostId, Post),
    Changed(PostId, Post),
    Removed(PostId),
}

impl FeedEvent {
    pub fn decode(collection: &str, event: ChildEvent) -> Result<Self, StoreError> {
        match event {
            ChildEvent::Added { key, value } => {
                let post = decode(&join(collection, &key), value)?;
                Ok(FeedEvent::Added(key, post))
            }
            ChildEvent::Changed { key, value } => {
                let post = decode(&join(collection, &key), value)?;
                Ok(FeedEvent::Changed(key, post))
            }
            ChildEvent::Removed { key, .. } => Ok(FeedEvent::Removed(key)),
            ChildEvent::Malformed { error, .. } | ChildEvent::Cancelled(error) => Err(error),
        }
    }

    pub fn post_id(&self) -> &str {
        match self {
            FeedEvent::Added(id, _) | FeedEvent::Changed(id, _) | FeedEvent::Removed(id) => id,
        }
    }
}

/// Subscribes to the post collection at `collection`, handing each child
/// event to `on_event` as a `FeedEvent` or as the error that replaced it.
pub fn watch<F>(
    store: &dyn FeedStore,
    collection: &str,
    on_event: F,
) -> Result<SubscriptionId, StoreError>
where
    F: Fn(Result<FeedEvent, StoreError>) + 'static,
{
    let path = collection.to_owned();
    let handler = Rc::new(move |event: ChildEvent| {
        debug!("feed {} -- {:?}", path, event);
        on_event(FeedEvent::decode(&path, event));
    });

    let id = store.subscribe(collection, handler)?;
    debug!("watching {} as {:?}", collection, id);
    Ok(id)
}
