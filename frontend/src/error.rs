use thiserror::Error;
use wasm_bindgen::JsValue;

use crate::post::PostId;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("backend rejected operation on `{path}`: {reason}")]
    Rejected { path: String, reason: String },
    #[error("could not decode record at `{path}`: {reason}")]
    Decode { path: String, reason: String },
    #[error("backend did not allocate a key under `{0}`")]
    MissingKey(String),
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn rejected(path: &str, reason: impl Into<String>) -> Self {
        StoreError::Rejected {
            path: path.to_owned(),
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("element `{0}` is not on the page")]
    MissingElement(String),
    #[error("post `{0}` is not rendered")]
    MissingPost(PostId),
    #[error("dom call failed: {0}")]
    Js(String),
}

impl From<JsValue> for ViewError {
    fn from(value: JsValue) -> Self {
        ViewError::Js(describe_js(&value))
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ClientError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    View(#[from] ViewError),
    #[error("no user is signed in")]
    NotSignedIn,
}

/// Last stop for failures nothing above the controller handles.
pub fn report_unhandled(err: &ClientError) {
    log::error!("unhandled failure: {}", err);
}

pub fn describe_js(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    format!("{:?}", value)
}
