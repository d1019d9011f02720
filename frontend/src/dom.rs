use std::cell::RefCell;
use std::rc::Rc;

use futures_util::TryFutureExt;
use log::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, EventTarget, HtmlElement, HtmlInputElement, HtmlTextAreaElement,
};

use crate::config::{ClientConfig, ElementIds};
use crate::controller::FeedController;
use crate::error::{report_unhandled, ClientError, ViewError};
use crate::post::PostId;
use crate::runtime::spawn_unhandled;
use crate::session::SessionProvider;
use crate::view::{
    card_class, DeleteAction, Draft, FeedView, PostView, Section, ACTIVE_CLASS, AVATAR_CLASS,
    STAR_COUNT_CLASS, TEXT_CLASS, TITLE_CLASS, USERNAME_CLASS,
};

pub fn document() -> Result<Document, ViewError> {
    web_sys::window()
        .and_then(|window| window.document())
        .ok_or_else(|| ViewError::MissingElement("document".into()))
}

/// Runs `on_load` once the window has finished loading.
pub fn on_window_load<F>(on_load: F) -> Result<(), ViewError>
where
    F: FnOnce() + 'static,
{
    let window = web_sys::window().ok_or_else(|| ViewError::MissingElement("window".into()))?;
    let callback = Closure::once_into_js(on_load);
    window.add_event_listener_with_callback("load", callback.unchecked_ref())?;
    Ok(())
}

type Handler = Closure<dyn FnMut(Event)>;

/// Registers `handler`; it stays callable for as long as the returned
/// closure lives.
fn attach<F>(target: &EventTarget, event_type: &str, handler: F) -> Result<Handler, ViewError>
where
    F: FnMut(Event) + 'static,
{
    let closure = Closure::<dyn FnMut(Event)>::new(handler);
    target.add_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref())?;
    Ok(closure)
}

/// Like `attach`, for handlers that live as long as the page.
fn listen<F>(target: &EventTarget, event_type: &str, handler: F) -> Result<(), ViewError>
where
    F: FnMut(Event) + 'static,
{
    attach(target, event_type, handler)?.forget();
    Ok(())
}

fn first_by_class(root: &Element, class: &str) -> Result<Element, ViewError> {
    root.get_elements_by_class_name(class)
        .item(0)
        .ok_or_else(|| ViewError::MissingElement(class.to_owned()))
}

fn set_class_text(card: &Element, class: &str, text: &str) -> Result<(), ViewError> {
    first_by_class(card, class)?.set_text_content(Some(text));
    Ok(())
}

/// `FeedView` over the live page.
///
/// Remove-control handlers belong to their card and are dropped with it.
pub struct DomView {
    document: Document,
    ids: ElementIds,
    card_handlers: RefCell<Vec<(PostId, Handler)>>,
}

impl DomView {
    pub fn new(config: &ClientConfig) -> Result<Self, ViewError> {
        Ok(DomView {
            document: document()?,
            ids: config.elements.clone(),
            card_handlers: RefCell::new(Vec::new()),
        })
    }

    /// Handlers held for cards currently in the list.
    pub fn live_card_handlers(&self) -> usize {
        self.card_handlers.borrow().len()
    }

    fn element(&self, id: &str) -> Result<HtmlElement, ViewError> {
        self.document
            .get_element_by_id(id)
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
            .ok_or_else(|| ViewError::MissingElement(id.to_owned()))
    }

    fn posts_container(&self) -> Result<Element, ViewError> {
        let section = self.element(&self.ids.user_posts_section)?;
        first_by_class(&section, &self.ids.posts_container_class)
    }

    fn card(&self, post_id: &str) -> Result<Element, ViewError> {
        self.posts_container()?
            .get_elements_by_class_name(&card_class(post_id))
            .item(0)
            .ok_or_else(|| ViewError::MissingPost(post_id.to_owned()))
    }

    fn fill_card(card: &Element, post: &PostView) -> Result<(), ViewError> {
        set_class_text(card, TITLE_CLASS, &post.title)?;
        set_class_text(card, USERNAME_CLASS, &post.author)?;
        set_class_text(card, TEXT_CLASS, &post.body)?;
        set_class_text(card, STAR_COUNT_CLASS, &post.star_count)
    }

    fn input_value(&self, id: &str) -> Result<String, ViewError> {
        let element = self.element(id)?;
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            Ok(input.value())
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            Ok(area.value())
        } else {
            Err(ViewError::MissingElement(id.to_owned()))
        }
    }

    fn set_input_value(&self, id: &str, value: &str) -> Result<(), ViewError> {
        let element = self.element(id)?;
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        } else if let Some(area) = element.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
        } else {
            return Err(ViewError::MissingElement(id.to_owned()));
        }
        Ok(())
    }
}

impl FeedView for DomView {
    fn prepend_post(&self, post: &PostView, on_delete: DeleteAction) -> Result<(), ViewError> {
        let wrapper = self.document.create_element("div")?;
        wrapper.set_inner_html(&post.markup());
        let card = wrapper
            .first_element_child()
            .ok_or_else(|| ViewError::MissingPost(post.id.clone()))?;

        Self::fill_card(&card, post)?;

        let avatar = first_by_class(&card, AVATAR_CLASS)?
            .dyn_into::<HtmlElement>()
            .map_err(|_| ViewError::MissingElement(AVATAR_CLASS.into()))?;
        avatar
            .style()
            .set_property("background-image", &post.avatar_style())?;

        let remove_control = card
            .query_selector(&post.remove_control_selector())?
            .ok_or_else(|| ViewError::MissingElement(post.remove_control_selector()))?;
        let handler = attach(&remove_control, "click", move |_event| on_delete())?;

        let container = self.posts_container()?;
        container.insert_before(&card, container.first_child().as_ref())?;
        self.card_handlers.borrow_mut().push((post.id.clone(), handler));
        Ok(())
    }

    fn update_post(&self, post: &PostView) -> Result<(), ViewError> {
        let card = self.card(&post.id)?;
        Self::fill_card(&card, post)
    }

    /// Removes the topmost card for `post_id`, the one prepended last.
    fn remove_post(&self, post_id: &str) -> Result<(), ViewError> {
        self.card(post_id)?.remove();

        let mut handlers = self.card_handlers.borrow_mut();
        if let Some(index) = handlers.iter().rposition(|(id, _)| id == post_id) {
            handlers.remove(index);
        }
        Ok(())
    }

    fn clear_posts(&self) -> Result<(), ViewError> {
        self.posts_container()?.set_inner_html("");

        debug!("dropping {} card handlers", self.live_card_handlers());
        self.card_handlers.borrow_mut().clear();
        Ok(())
    }

    fn set_splash_visible(&self, visible: bool) -> Result<(), ViewError> {
        let display = if visible { "" } else { "none" };
        self.element(&self.ids.splash_page)?
            .style()
            .set_property("display", display)?;
        Ok(())
    }

    fn show_section(&self, section: Section) -> Result<(), ViewError> {
        for other in Section::ALL {
            self.element(self.ids.section(other))?
                .style()
                .set_property("display", "none")?;
            self.element(self.ids.control(other))?
                .class_list()
                .remove_1(ACTIVE_CLASS)?;
        }

        self.element(self.ids.section(section))?
            .style()
            .set_property("display", "block")?;
        self.element(self.ids.control(section))?
            .class_list()
            .add_1(ACTIVE_CLASS)?;
        Ok(())
    }

    fn read_draft(&self) -> Result<Draft, ViewError> {
        Ok(Draft::new(
            self.input_value(&self.ids.title_input)?,
            self.input_value(&self.ids.message_input)?,
        ))
    }

    fn clear_draft(&self) -> Result<(), ViewError> {
        self.set_input_value(&self.ids.message_input, "")?;
        self.set_input_value(&self.ids.title_input, "")
    }
}

fn report<T>(result: Result<T, ClientError>) {
    if let Err(err) = result {
        report_unhandled(&err);
    }
}

/// Wires the page's buttons, form and session observer to `controller`,
/// then opens the post list.
pub fn bind_page(
    controller: &FeedController,
    session: Rc<dyn SessionProvider>,
    document: &Document,
) -> Result<(), ClientError> {
    let ids = &controller.config().elements;
    let by_id = |id: &str| {
        document
            .get_element_by_id(id)
            .ok_or_else(|| ViewError::MissingElement(id.to_owned()))
    };

    let sign_in_button = by_id(&ids.sign_in_button)?;
    let signing_in = session.clone();
    listen(&sign_in_button, "click", move |_event| {
        spawn_unhandled(signing_in.sign_in().map_err(ClientError::from));
    })?;

    let sign_out_button = by_id(&ids.sign_out_button)?;
    let signing_out = session.clone();
    listen(&sign_out_button, "click", move |_event| {
        spawn_unhandled(signing_out.sign_out().map_err(ClientError::from));
    })?;

    let observer = controller.clone();
    session.on_session_changed(Rc::new(move |identity| {
        report(observer.on_session_changed(identity));
    }));

    let form = by_id(&ids.message_form)?;
    let submitter = controller.clone();
    listen(&form, "submit", move |event| {
        event.prevent_default();
        report(submitter.submit_post());
    })?;

    let my_posts_button = by_id(&ids.my_posts_button)?;
    let to_list = controller.clone();
    listen(&my_posts_button, "click", move |_event| {
        report(to_list.show_section(Section::MyPosts));
    })?;

    let add_button = by_id(&ids.add_button)?;
    let to_form = controller.clone();
    listen(&add_button, "click", move |_event| {
        report(to_form.show_section(Section::AddPost));
    })?;

    controller.show_section(Section::MyPosts)
}
