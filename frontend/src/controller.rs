use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::{debug, info, warn};
use serde_json::Map;

use crate::config::ClientConfig;
use crate::error::{report_unhandled, ClientError, StoreError};
use crate::feed::{self, FeedEvent};
use crate::post::{author_name, Identity, Post, PostId, UserId, UserProfile};
use crate::runtime::{spawn_task, spawn_unhandled};
use crate::session::SessionContext;
use crate::store::{encode, once_as, FeedStore};
use crate::view::{DeleteAction, FeedView, PostView, Section};

/// Mirrors the signed-in user's posts into the page and turns page
/// interactions into store writes.
///
/// Cloning is cheap; every clone drives the same page and session.
#[derive(Clone)]
pub struct FeedController {
    inner: Rc<Inner>,
}

struct Inner {
    store: Rc<dyn FeedStore>,
    view: Rc<dyn FeedView>,
    config: ClientConfig,
    context: RefCell<SessionContext>,
}

impl FeedController {
    pub fn new(store: Rc<dyn FeedStore>, view: Rc<dyn FeedView>, config: ClientConfig) -> Self {
        FeedController {
            inner: Rc::new(Inner {
                store,
                view,
                config,
                context: RefCell::new(SessionContext::new()),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn current_uid(&self) -> Option<UserId> {
        self.inner.context.borrow().current_uid().cloned()
    }

    pub fn active_subscriptions(&self) -> usize {
        self.inner.context.borrow().subscriptions().len()
    }

    fn downgrade(&self) -> Weak<Inner> {
        Rc::downgrade(&self.inner)
    }

    fn upgrade(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| FeedController { inner })
    }

    /// Reacts to a sign-in, sign-out or token refresh from the session provider.
    pub fn on_session_changed(&self, identity: Option<Identity>) -> Result<(), ClientError> {
        if self.inner.context.borrow().is_refresh(identity.as_ref()) {
            debug!("session refreshed for {:?}", self.current_uid());
            return Ok(());
        }

        self.cleanup_ui()?;

        match identity {
            Some(identity) => {
                info!("user {} signed in", identity.uid);
                self.inner.context.borrow_mut().sign_in(identity.clone());
                self.inner.view.set_splash_visible(false)?;

                let controller = self.clone();
                let profile_owner = identity.clone();
                spawn_unhandled(async move { controller.write_user_data(&profile_owner).await });

                self.start_database_queries(&identity.uid)?;
            }
            None => {
                info!("user signed out");
                self.inner.context.borrow_mut().sign_out();
                self.inner.view.set_splash_visible(true)?;
            }
        }

        Ok(())
    }

    /// Empties the rendered list and releases every feed subscription.
    pub fn cleanup_ui(&self) -> Result<(), ClientError> {
        self.inner.view.clear_posts()?;

        let subscriptions = self.inner.context.borrow_mut().drain_subscriptions();
        for id in subscriptions {
            debug!("releasing {:?}", id);
            self.inner.store.unsubscribe(id);
        }

        Ok(())
    }

    /// Upserts the profile record of `identity`.
    pub async fn write_user_data(&self, identity: &Identity) -> Result<(), ClientError> {
        let path = self.inner.config.user_path(&identity.uid);
        let record = encode(&path, &UserProfile::from(identity))?;

        self.inner.store.set(&path, record).await?;
        debug!("profile written for {}", identity.uid);
        Ok(())
    }

    /// Starts mirroring `uid`'s own posts into the list.
    pub fn start_database_queries(&self, uid: &str) -> Result<(), ClientError> {
        let collection = self.inner.config.user_posts_path(uid);
        let weak = self.downgrade();
        let owner = uid.to_owned();

        let id = feed::watch(&*self.inner.store, &collection, move |event| {
            if let Some(controller) = FeedController::upgrade(&weak) {
                if let Err(err) = controller.apply_feed_event(&owner, event) {
                    report_unhandled(&err);
                }
            }
        })?;

        self.inner.context.borrow_mut().register(id);
        Ok(())
    }

    /// Applies one feed notification to the list. `owner` is the user whose
    /// feed produced it; delete controls act on that user's records.
    pub fn apply_feed_event(
        &self,
        owner: &str,
        event: Result<FeedEvent, StoreError>,
    ) -> Result<(), ClientError> {
        let event = event?;
        debug!("post {} in {}'s feed: {:?}", event.post_id(), owner, event);

        match event {
            FeedEvent::Added(id, post) => {
                let view = PostView::from_post(&id, &post, &self.inner.config);
                let on_delete = self.delete_action(owner, &id);
                self.inner.view.prepend_post(&view, on_delete)?;
            }
            FeedEvent::Changed(id, post) => {
                let view = PostView::from_post(&id, &post, &self.inner.config);
                self.inner.view.update_post(&view)?;
            }
            FeedEvent::Removed(id) => {
                self.inner.view.remove_post(&id)?;
            }
        }

        Ok(())
    }

    fn delete_action(&self, owner: &str, post_id: &str) -> DeleteAction {
        let weak = self.downgrade();
        let owner = owner.to_owned();
        let post_id = post_id.to_owned();

        Rc::new(move || {
            if let Some(controller) = FeedController::upgrade(&weak) {
                controller.delete_post(&owner, &post_id);
            }
        })
    }

    /// Removes the post from `owner`'s feed and from the global feed. The two
    /// removals are independent: either may fail while the other succeeds.
    pub fn delete_post(&self, owner: &str, post_id: &str) {
        info!("clicked post {}", post_id);

        let targets = [
            self.inner.config.user_post_path(owner, post_id),
            self.inner.config.post_path(post_id),
        ];

        for path in targets {
            let pending = self.inner.store.remove(&path);
            let post_id = post_id.to_owned();

            spawn_task(async move {
                match pending.await {
                    Ok(()) => info!("removed post {} from {}", post_id, path),
                    Err(err) => warn!("error removing post {} from {}: {}", post_id, path, err),
                }
            });
        }
    }

    /// Handles the new-post form. Returns whether a post was submitted.
    ///
    /// The form is cleared right away; the write and the switch back to the
    /// list happen once the store answers.
    pub fn submit_post(&self) -> Result<bool, ClientError> {
        let draft = self.inner.view.read_draft()?;
        if !draft.is_complete() {
            return Ok(false);
        }

        let identity = self
            .inner
            .context
            .borrow()
            .identity()
            .cloned()
            .ok_or(ClientError::NotSignedIn)?;

        let controller = self.clone();
        spawn_unhandled(async move {
            controller
                .new_post_for_current_user(&identity, draft.title, draft.body)
                .await?;
            controller.show_section(Section::MyPosts)
        });

        self.inner.view.clear_draft()?;
        Ok(true)
    }

    /// Reads the author's profile once, then writes the post under their name.
    pub async fn new_post_for_current_user(
        &self,
        identity: &Identity,
        title: String,
        body: String,
    ) -> Result<PostId, ClientError> {
        let profile_path = self.inner.config.user_path(&identity.uid);
        let profile: Option<UserProfile> = once_as(&*self.inner.store, &profile_path).await?;
        let author = author_name(profile.as_ref(), &self.inner.config.anonymous_name);

        let post = Post::new(
            identity.uid.clone(),
            author.to_owned(),
            identity.photo_url.clone(),
            title,
            body,
        );

        self.write_new_post(&post).await
    }

    /// Writes `post` to the global feed and to its author's feed in one
    /// update, under one freshly allocated key.
    pub async fn write_new_post(&self, post: &Post) -> Result<PostId, ClientError> {
        let config = &self.inner.config;
        let key = self.inner.store.push_key(&config.posts_root)?;

        let global_path = config.post_path(&key);
        let record = encode(&global_path, post)?;

        let mut updates = Map::new();
        updates.insert(config.user_post_path(&post.uid, &key), record.clone());
        updates.insert(global_path, record);

        self.inner.store.update(updates).await?;
        debug!("post {} written for {}", key, post.uid);
        Ok(key)
    }

    /// Switches the visible section. Opening the form starts from a blank draft.
    pub fn show_section(&self, section: Section) -> Result<(), ClientError> {
        self.inner.view.show_section(section)?;

        if section == Section::AddPost {
            self.inner.view.clear_draft()?;
        }

        Ok(())
    }
}
