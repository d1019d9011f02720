use log::LevelFilter;

use crate::view::Section;

pub const POSTS_ROOT: &'static str = "posts";
pub const USER_POSTS_ROOT: &'static str = "user-posts";
pub const USERS_ROOT: &'static str = "users";
pub const ANONYMOUS_NAME: &'static str = "Anonymous";
pub const DEFAULT_AVATAR_URL: &'static str = "./silhouette.jpg";

/// Everything the page needs to know about its backend layout and markup.
///
/// Every field has a default, so a host page only has to pass the keys it
/// wants to override to `bootstrap_with_config`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientConfig {
    pub posts_root: String,
    pub user_posts_root: String,
    pub users_root: String,
    pub anonymous_name: String,
    pub default_avatar_url: String,
    pub log_level: String,
    pub elements: ElementIds,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            posts_root: POSTS_ROOT.into(),
            user_posts_root: USER_POSTS_ROOT.into(),
            users_root: USERS_ROOT.into(),
            anonymous_name: ANONYMOUS_NAME.into(),
            default_avatar_url: DEFAULT_AVATAR_URL.into(),
            log_level: "info".into(),
            elements: ElementIds::default(),
        }
    }
}

impl ClientConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Unknown level names fall back to `info`.
    pub fn log_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ElementIds {
    pub message_form: String,
    pub message_input: String,
    pub title_input: String,
    pub sign_in_button: String,
    pub sign_out_button: String,
    pub splash_page: String,
    pub add_post_section: String,
    pub add_button: String,
    pub user_posts_section: String,
    pub my_posts_button: String,
    pub posts_container_class: String,
}

impl Default for ElementIds {
    fn default() -> Self {
        ElementIds {
            message_form: "message-form".into(),
            message_input: "new-post-message".into(),
            title_input: "new-post-title".into(),
            sign_in_button: "sign-in-button".into(),
            sign_out_button: "sign-out-button".into(),
            splash_page: "page-splash".into(),
            add_post_section: "add-post".into(),
            add_button: "add".into(),
            user_posts_section: "user-posts-list".into(),
            my_posts_button: "menu-my-posts".into(),
            posts_container_class: "posts-container".into(),
        }
    }
}

impl ElementIds {
    pub fn section(&self, section: Section) -> &str {
        match section {
            Section::MyPosts => &self.user_posts_section,
            Section::AddPost => &self.add_post_section,
        }
    }

    pub fn control(&self, section: Section) -> &str {
        match section {
            Section::MyPosts => &self.my_posts_button,
            Section::AddPost => &self.add_button,
        }
    }
}
