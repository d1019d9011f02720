#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use tokio::task::LocalSet;

use post_feed_frontend::config::ClientConfig;
use post_feed_frontend::controller::FeedController;
use post_feed_frontend::error::ViewError;
use post_feed_frontend::memory::MemoryStore;
use post_feed_frontend::post::Identity;
use post_feed_frontend::view::{DeleteAction, Draft, FeedView, PostView, Section};

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Runs `step` on a fresh `LocalSet`, then every task it spawned.
pub async fn settle<T, F: FnOnce() -> T>(step: F) -> T {
    let local = LocalSet::new();
    let out = local.run_until(async move { step() }).await;
    local.await;
    out
}

pub fn identity(uid: &str, display_name: Option<&str>) -> Identity {
    Identity {
        uid: uid.into(),
        display_name: display_name.map(String::from),
        email: Some(format!("{}@example.com", uid)),
        photo_url: None,
    }
}

pub struct RenderedPost {
    /// Stable per rendered card; a new card always gets a new node.
    pub node: usize,
    pub view: PostView,
    pub on_delete: DeleteAction,
}

pub struct ViewState {
    pub posts: Vec<RenderedPost>,
    pub splash_visible: bool,
    pub section: Option<Section>,
    pub draft: Draft,
    next_node: usize,
}

/// `FeedView` that keeps the page as plain data.
pub struct RecordingView {
    state: RefCell<ViewState>,
}

impl RecordingView {
    pub fn new() -> Self {
        RecordingView {
            state: RefCell::new(ViewState {
                posts: Vec::new(),
                splash_visible: true,
                section: None,
                draft: Draft::default(),
                next_node: 0,
            }),
        }
    }

    pub fn type_draft(&self, title: &str, body: &str) {
        self.state.borrow_mut().draft = Draft::new(title, body);
    }

    pub fn draft(&self) -> Draft {
        self.state.borrow().draft.clone()
    }

    pub fn splash_visible(&self) -> bool {
        self.state.borrow().splash_visible
    }

    pub fn section(&self) -> Option<Section> {
        self.state.borrow().section
    }

    /// Rendered cards, top first.
    pub fn posts(&self) -> Vec<PostView> {
        self.state
            .borrow()
            .posts
            .iter()
            .map(|rendered| rendered.view.clone())
            .collect()
    }

    pub fn nodes(&self) -> Vec<(usize, String)> {
        self.state
            .borrow()
            .posts
            .iter()
            .map(|rendered| (rendered.node, rendered.view.id.clone()))
            .collect()
    }

    /// Clicks the remove control of the topmost card for `post_id`.
    pub fn click_delete(&self, post_id: &str) {
        let action = self
            .state
            .borrow()
            .posts
            .iter()
            .find(|rendered| rendered.view.id == post_id)
            .map(|rendered| rendered.on_delete.clone())
            .expect("post is not rendered");
        action();
    }
}

impl FeedView for RecordingView {
    fn prepend_post(&self, post: &PostView, on_delete: DeleteAction) -> Result<(), ViewError> {
        let mut state = self.state.borrow_mut();
        state.next_node += 1;
        let node = state.next_node;
        state.posts.insert(
            0,
            RenderedPost {
                node,
                view: post.clone(),
                on_delete,
            },
        );
        Ok(())
    }

    fn update_post(&self, post: &PostView) -> Result<(), ViewError> {
        let mut state = self.state.borrow_mut();
        let rendered = state
            .posts
            .iter_mut()
            .find(|rendered| rendered.view.id == post.id)
            .ok_or_else(|| ViewError::MissingPost(post.id.clone()))?;
        rendered.view = post.clone();
        Ok(())
    }

    fn remove_post(&self, post_id: &str) -> Result<(), ViewError> {
        let mut state = self.state.borrow_mut();
        let index = state
            .posts
            .iter()
            .position(|rendered| rendered.view.id == post_id)
            .ok_or_else(|| ViewError::MissingPost(post_id.to_owned()))?;
        state.posts.remove(index);
        Ok(())
    }

    fn clear_posts(&self) -> Result<(), ViewError> {
        self.state.borrow_mut().posts.clear();
        Ok(())
    }

    fn set_splash_visible(&self, visible: bool) -> Result<(), ViewError> {
        self.state.borrow_mut().splash_visible = visible;
        Ok(())
    }

    fn show_section(&self, section: Section) -> Result<(), ViewError> {
        self.state.borrow_mut().section = Some(section);
        Ok(())
    }

    fn read_draft(&self) -> Result<Draft, ViewError> {
        Ok(self.state.borrow().draft.clone())
    }

    fn clear_draft(&self) -> Result<(), ViewError> {
        self.state.borrow_mut().draft = Draft::default();
        Ok(())
    }
}

pub struct Fixture {
    pub store: MemoryStore,
    pub view: Rc<RecordingView>,
    pub controller: FeedController,
}

impl Fixture {
    pub fn new() -> Self {
        init_logger();
        let store = MemoryStore::new();
        let view = Rc::new(RecordingView::new());
        let controller = FeedController::new(
            Rc::new(store.clone()),
            view.clone(),
            ClientConfig::default(),
        );

        Fixture {
            store,
            view,
            controller,
        }
    }
}
