#![cfg(target_arch = "wasm32")]

extern crate wasm_bindgen_test;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;
use web_sys::{Document, HtmlElement, HtmlInputElement, HtmlTextAreaElement};

use post_feed_frontend::config::ClientConfig;
use post_feed_frontend::controller::FeedController;
use post_feed_frontend::dom::{bind_page, document, DomView};
use post_feed_frontend::error::ViewError;
use post_feed_frontend::memory::MemoryStore;
use post_feed_frontend::post::Identity;
use post_feed_frontend::session::{SessionCallback, SessionProvider};
use post_feed_frontend::store::StoreFuture;
use post_feed_frontend::view::{Draft, FeedView, PostView, Section};

wasm_bindgen_test_configure!(run_in_browser);

const PAGE: &'static str = concat!(
    "<section id=\"page-splash\"></section>",
    "<button id=\"sign-in-button\"></button>",
    "<button id=\"sign-out-button\"></button>",
    "<button id=\"menu-my-posts\"></button>",
    "<button id=\"add\"></button>",
    "<section id=\"user-posts-list\"><div class=\"posts-container\"></div></section>",
    "<section id=\"add-post\">",
    "<form id=\"message-form\">",
    "<input id=\"new-post-title\">",
    "<textarea id=\"new-post-message\"></textarea>",
    "</form>",
    "</section>",
);

fn page() -> (Document, DomView) {
    let document = document().unwrap();
    document.body().unwrap().set_inner_html(PAGE);
    let view = DomView::new(&ClientConfig::default()).unwrap();
    (document, view)
}

fn post(id: &str, title: &str) -> PostView {
    PostView {
        id: id.into(),
        title: title.into(),
        body: format!("{} body", title),
        author: "Alice".into(),
        avatar_url: "./silhouette.jpg".into(),
        star_count: "0".into(),
    }
}

/// Session provider driven by the test instead of a backend.
#[derive(Default)]
struct ScriptedSession {
    observer: RefCell<Option<SessionCallback>>,
    sign_ins: Cell<usize>,
    sign_outs: Cell<usize>,
}

impl ScriptedSession {
    fn notify(&self, identity: Option<Identity>) {
        let observer = self.observer.borrow().clone().unwrap();
        observer(identity);
    }
}

impl SessionProvider for ScriptedSession {
    fn on_session_changed(&self, callback: SessionCallback) {
        *self.observer.borrow_mut() = Some(callback);
    }

    fn sign_in(&self) -> StoreFuture<()> {
        self.sign_ins.set(self.sign_ins.get() + 1);
        Box::pin(async { Ok(()) })
    }

    fn sign_out(&self) -> StoreFuture<()> {
        self.sign_outs.set(self.sign_outs.get() + 1);
        Box::pin(async { Ok(()) })
    }
}

fn by_id(document: &Document, id: &str) -> HtmlElement {
    document
        .get_element_by_id(id)
        .unwrap()
        .dyn_into::<HtmlElement>()
        .unwrap()
}

fn card_titles(document: &Document) -> Vec<String> {
    let titles = document.get_elements_by_class_name("mdl-card__title-text");
    (0..titles.length())
        .filter_map(|index| titles.item(index))
        .filter_map(|title| title.text_content())
        .collect()
}

#[wasm_bindgen_test]
fn prepends_cards_newest_first() {
    let (document, view) = page();

    view.prepend_post(&post("-Na1", "first"), Rc::new(|| ())).unwrap();
    view.prepend_post(&post("-Na2", "second"), Rc::new(|| ())).unwrap();

    assert_eq!(card_titles(&document), vec!["second", "first"]);
}

#[wasm_bindgen_test]
fn user_text_is_not_parsed_as_markup() {
    let (document, view) = page();

    view.prepend_post(&post("-Na1", "<b>bold</b>"), Rc::new(|| ()))
        .unwrap();

    assert_eq!(card_titles(&document), vec!["<b>bold</b>"]);
    assert_eq!(document.get_elements_by_tag_name("b").length(), 0);
}

#[wasm_bindgen_test]
fn updates_and_removes_by_id() {
    let (document, view) = page();
    view.prepend_post(&post("-Na1", "first"), Rc::new(|| ())).unwrap();
    view.prepend_post(&post("-Na2", "second"), Rc::new(|| ())).unwrap();

    view.update_post(&post("-Na1", "edited")).unwrap();
    assert_eq!(card_titles(&document), vec!["second", "edited"]);

    view.remove_post("-Na2").unwrap();
    assert_eq!(card_titles(&document), vec!["edited"]);

    assert_eq!(
        view.remove_post("-Na2"),
        Err(ViewError::MissingPost("-Na2".into()))
    );
}

#[wasm_bindgen_test]
fn remove_control_runs_the_delete_action() {
    let (document, view) = page();
    let clicks = Rc::new(Cell::new(0));
    let counter = clicks.clone();

    view.prepend_post(
        &post("-Na1", "first"),
        Rc::new(move || counter.set(counter.get() + 1)),
    )
    .unwrap();

    document
        .query_selector("span[post-id=\"-Na1\"]")
        .unwrap()
        .unwrap()
        .dyn_into::<HtmlElement>()
        .unwrap()
        .click();

    assert_eq!(clicks.get(), 1);
}

#[wasm_bindgen_test]
fn clear_posts_empties_the_list() {
    let (document, view) = page();
    view.prepend_post(&post("-Na1", "first"), Rc::new(|| ())).unwrap();

    view.clear_posts().unwrap();

    assert!(card_titles(&document).is_empty());
}

#[wasm_bindgen_test]
fn sections_and_splash_toggle_visibility() {
    let (document, view) = page();

    view.show_section(Section::AddPost).unwrap();
    assert_eq!(
        by_id(&document, "add-post").style().get_property_value("display").unwrap(),
        "block"
    );
    assert_eq!(
        by_id(&document, "user-posts-list").style().get_property_value("display").unwrap(),
        "none"
    );
    assert!(by_id(&document, "add").class_list().contains("is-active"));
    assert!(!by_id(&document, "menu-my-posts").class_list().contains("is-active"));

    view.set_splash_visible(false).unwrap();
    assert_eq!(
        by_id(&document, "page-splash").style().get_property_value("display").unwrap(),
        "none"
    );
}

#[wasm_bindgen_test]
fn reads_and_clears_the_draft() {
    let (document, view) = page();
    by_id(&document, "new-post-title")
        .unchecked_into::<HtmlInputElement>()
        .set_value("T1");
    by_id(&document, "new-post-message")
        .unchecked_into::<HtmlTextAreaElement>()
        .set_value("B1");

    assert_eq!(view.read_draft().unwrap(), Draft::new("T1", "B1"));

    view.clear_draft().unwrap();
    assert_eq!(view.read_draft().unwrap(), Draft::default());
}

#[wasm_bindgen_test]
fn card_handlers_are_dropped_with_their_cards() {
    let (_document, view) = page();
    view.prepend_post(&post("-Na1", "first"), Rc::new(|| ())).unwrap();
    view.prepend_post(&post("-Na2", "second"), Rc::new(|| ())).unwrap();
    view.prepend_post(&post("-Na1", "first again"), Rc::new(|| ()))
        .unwrap();
    assert_eq!(view.live_card_handlers(), 3);

    view.remove_post("-Na1").unwrap();
    assert_eq!(view.live_card_handlers(), 2);

    view.clear_posts().unwrap();
    assert_eq!(view.live_card_handlers(), 0);
}

#[wasm_bindgen_test]
fn bind_page_wires_buttons_and_session() {
    let (document, view) = page();
    let store = MemoryStore::new();
    let controller = FeedController::new(
        Rc::new(store.clone()),
        Rc::new(view),
        ClientConfig::default(),
    );
    let session = Rc::new(ScriptedSession::default());

    bind_page(&controller, session.clone(), &document).unwrap();
    assert!(by_id(&document, "menu-my-posts").class_list().contains("is-active"));

    by_id(&document, "add").click();
    assert!(by_id(&document, "add").class_list().contains("is-active"));
    by_id(&document, "menu-my-posts").click();
    assert!(by_id(&document, "menu-my-posts").class_list().contains("is-active"));

    by_id(&document, "sign-in-button").click();
    by_id(&document, "sign-out-button").click();
    assert_eq!(session.sign_ins.get(), 1);
    assert_eq!(session.sign_outs.get(), 1);

    store
        .set_now(
            "user-posts/u1/-Na1",
            serde_json::json!({"title": "T1", "body": "B1", "uid": "u1"}),
        )
        .unwrap();
    session.notify(Some(Identity {
        uid: "u1".into(),
        ..Identity::default()
    }));
    assert_eq!(
        by_id(&document, "page-splash").style().get_property_value("display").unwrap(),
        "none"
    );
    assert_eq!(card_titles(&document), vec!["T1"]);
}
