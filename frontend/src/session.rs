use std::rc::Rc;

use crate::post::{Identity, UserId};
use crate::store::{StoreFuture, SubscriptionId};

pub type SessionCallback = Rc<dyn Fn(Option<Identity>)>;

/// Identity provider the page signs in against.
pub trait SessionProvider {
    /// Registers the one observer for sign-in / sign-out transitions. The
    /// provider also calls it for token refreshes of the same user.
    fn on_session_changed(&self, callback: SessionCallback);

    fn sign_in(&self) -> StoreFuture<()>;

    fn sign_out(&self) -> StoreFuture<()>;
}

/// Who is signed in, and which feed subscriptions belong to that session.
#[derive(Debug, Default)]
pub struct SessionContext {
    identity: Option<Identity>,
    subscriptions: Vec<SubscriptionId>,
}

impl SessionContext {
    pub fn new() -> Self {
        SessionContext::default()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn current_uid(&self) -> Option<&UserId> {
        self.identity.as_ref().map(|identity| &identity.uid)
    }

    /// A notification for the user already tracked is a token refresh.
    pub fn is_refresh(&self, next: Option<&Identity>) -> bool {
        match (next, self.current_uid()) {
            (Some(next), Some(current)) => &next.uid == current,
            _ => false,
        }
    }

    pub fn sign_in(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    pub fn sign_out(&mut self) {
        self.identity = None;
    }

    pub fn register(&mut self, id: SubscriptionId) {
        self.subscriptions.push(id);
    }

    pub fn subscriptions(&self) -> &[SubscriptionId] {
        &self.subscriptions
    }

    /// Empties the teardown registry, handing back what has to be released.
    pub fn drain_subscriptions(&mut self) -> Vec<SubscriptionId> {
        std::mem::take(&mut self.subscriptions)
    }
}
