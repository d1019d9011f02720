extern crate console_error_panic_hook;
extern crate serde;
#[macro_use]
extern crate serde_derive;

pub mod config;
pub mod controller;
pub mod dom;
pub mod error;
pub mod feed;
pub mod firebase;
pub mod memory;
pub mod paths;
pub mod post;
pub mod runtime;
pub mod session;
pub mod store;
pub mod view;

use std::rc::Rc;

use wasm_bindgen::prelude::*;

use config::ClientConfig;
use controller::FeedController;
use error::{report_unhandled, ClientError};

/// Page entry point with the default configuration.
#[wasm_bindgen]
pub fn bootstrap() {
    start(ClientConfig::default());
}

/// Page entry point; `config_json` overrides any subset of `ClientConfig`.
#[wasm_bindgen]
pub fn bootstrap_with_config(config_json: &str) -> Result<(), JsValue> {
    let config =
        ClientConfig::from_json(config_json).map_err(|err| JsValue::from_str(&err.to_string()))?;
    start(config);
    Ok(())
}

fn start(config: ClientConfig) {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    if let Some(level) = config.log_filter().to_level() {
        let _ = console_log::init_with_level(level);
    }

    let loaded = dom::on_window_load(move || {
        if let Err(err) = mount(config) {
            report_unhandled(&err);
        }
    });

    if let Err(err) = loaded {
        report_unhandled(&err.into());
    }
}

fn mount(config: ClientConfig) -> Result<(), ClientError> {
    let document = dom::document()?;
    let view = Rc::new(dom::DomView::new(&config)?);
    let store = Rc::new(firebase::FirebaseStore::new());
    let session = Rc::new(firebase::FirebaseSession::new());

    let controller = FeedController::new(store, view, config);
    dom::bind_page(&controller, session, &document)
}
