use std::rc::Rc;

use crate::config::ClientConfig;
use crate::error::ViewError;
use crate::post::{Post, PostId};

pub const ADDED_BY_LABEL: &'static str = "Adicionado por:";

pub const TITLE_CLASS: &'static str = "mdl-card__title-text";
pub const USERNAME_CLASS: &'static str = "username";
pub const TEXT_CLASS: &'static str = "text";
pub const AVATAR_CLASS: &'static str = "avatar";
pub const STAR_COUNT_CLASS: &'static str = "star-count";
pub const REMOVE_CONTROL_CLASS: &'static str = "btn-remove-post";
pub const ACTIVE_CLASS: &'static str = "is-active";

/// Page sections that are shown one at a time.
#[derive(Hash, Copy, Clone, Debug, PartialEq, Eq)]
pub enum Section {
    MyPosts,
    AddPost,
}

impl Section {
    pub const ALL: [Section; 2] = [Section::MyPosts, Section::AddPost];
}

/// Contents of the new-post form.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Draft {
    pub title: String,
    pub body: String,
}

impl Draft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Draft {
            title: title.into(),
            body: body.into(),
        }
    }

    /// Only drafts with both a title and a body get posted.
    pub fn is_complete(&self) -> bool {
        !self.title.is_empty() && !self.body.is_empty()
    }
}

/// Render-ready fields of one post card, fallbacks already applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostView {
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub author: String,
    pub avatar_url: String,
    pub star_count: String,
}

impl PostView {
    pub fn from_post(id: &str, post: &Post, config: &ClientConfig) -> Self {
        PostView {
            id: id.to_owned(),
            title: post.title.clone(),
            body: post.body.clone(),
            author: non_empty(post.author.as_deref())
                .unwrap_or(config.anonymous_name.as_str())
                .to_owned(),
            avatar_url: non_empty(post.author_pic.as_deref())
                .unwrap_or(config.default_avatar_url.as_str())
                .to_owned(),
            star_count: post.star_count.unwrap_or(0).to_string(),
        }
    }

    /// Class that identifies this post's card inside the list.
    pub fn card_class(&self) -> String {
        card_class(&self.id)
    }

    pub fn avatar_style(&self) -> String {
        format!("url(\"{}\")", self.avatar_url)
    }

    pub fn remove_control_selector(&self) -> String {
        format!("span[post-id=\"{}\"]", escape_attribute(&self.id))
    }

    /// Card skeleton. Only the id is baked in; user text is filled in
    /// afterwards as text content, never parsed as markup.
    pub fn markup(&self) -> String {
        let id = escape_attribute(&self.id);

        format!(
            concat!(
                "<div class=\"post post-{id} mdl-cell mdl-cell--12-col ",
                "mdl-cell--6-col-tablet mdl-cell--4-col-desktop mdl-grid mdl-grid--no-spacing\">",
                "<div class=\"mdl-card mdl-shadow--2dp\">",
                "<div class=\"mdl-card__title mdl-color--light-blue-600 mdl-color-text--white\">",
                "<h4 class=\"{title}\"></h4>",
                "<span post-id=\"{id}\" class=\"{remove}\" style=\"margin-left:auto\">X</span>",
                "</div>",
                "<div class=\"header\">",
                "<div>",
                "<div>{added_by}</div>",
                "<div class=\"{avatar}\"></div>",
                "<div class=\"{username} mdl-color-text--black\"></div>",
                "</div>",
                "</div>",
                "<div class=\"{text}\"></div>",
                "<div class=\"{stars}\"></div>",
                "</div>",
                "</div>"
            ),
            id = id,
            title = TITLE_CLASS,
            remove = REMOVE_CONTROL_CLASS,
            added_by = ADDED_BY_LABEL,
            avatar = AVATAR_CLASS,
            username = USERNAME_CLASS,
            text = TEXT_CLASS,
            stars = STAR_COUNT_CLASS,
        )
    }
}

pub fn card_class(post_id: &str) -> String {
    format!("post-{}", post_id)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

pub type DeleteAction = Rc<dyn Fn()>;

/// The page surface the controller drives.
///
/// Lookups are not guarded: asking to update or remove a post that is not
/// rendered is an error, as is any missing element.
pub trait FeedView {
    /// Renders `post` at the top of the list, wiring `on_delete` to its
    /// remove control.
    fn prepend_post(&self, post: &PostView, on_delete: DeleteAction) -> Result<(), ViewError>;

    fn update_post(&self, post: &PostView) -> Result<(), ViewError>;

    fn remove_post(&self, post_id: &str) -> Result<(), ViewError>;

    fn clear_posts(&self) -> Result<(), ViewError>;

    fn set_splash_visible(&self, visible: bool) -> Result<(), ViewError>;

    /// Shows `section`, hides the rest and marks only its control active.
    fn show_section(&self, section: Section) -> Result<(), ViewError>;

    fn read_draft(&self) -> Result<Draft, ViewError>;

    fn clear_draft(&self) -> Result<(), ViewError>;
}
