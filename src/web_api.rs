//! The JavaScript-facing API.
//!
//! ```js
//! import init, { DosboxLauncher } from "./pkg/dosbox_web.js";
//! await init();
//! const launcher = new DosboxLauncher();
//! await launcher.start({ zip: "./keen.zip", persist: "KEEN", run: "KEEN1.EXE" });
//! ```
use crate::display_output::WebPage;
use crate::jsdos::{JsDos, DEFAULT_WDOSBOX_URL};
use crate::launch_error::{LaunchError, OptionsError};
use crate::launch_options::{LaunchOptions, RunCommands};
use crate::session::Session;
use js_sys::{Array, Promise, Reflect};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::future_to_promise;

/// Element ids and the js-dos engine location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherConfig {
    pub container_id: String,
    pub canvas_id: String,
    pub message_id: String,
    pub wdosbox_url: String,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        LauncherConfig {
            container_id: "dosbox".to_string(),
            canvas_id: "jsdos-canvas".to_string(),
            message_id: "message-display".to_string(),
            wdosbox_url: DEFAULT_WDOSBOX_URL.to_string(),
        }
    }
}

fn field(object: &JsValue, key: &str) -> JsValue {
    if !object.is_object() {
        return JsValue::UNDEFINED;
    }
    Reflect::get(object, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

/// Reads an optional string field; `undefined` and `null` count as absent.
fn string_field(object: &JsValue, key: &'static str) -> Result<Option<String>, OptionsError> {
    let value = field(object, key);
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    value
        .as_string()
        .map(Some)
        .ok_or(OptionsError::InvalidType(key))
}

impl LauncherConfig {
    pub fn from_js(value: &JsValue) -> Result<Self, OptionsError> {
        let mut config = LauncherConfig::default();
        if let Some(id) = string_field(value, "container")? {
            config.container_id = id;
        }
        if let Some(id) = string_field(value, "canvas")? {
            config.canvas_id = id;
        }
        if let Some(id) = string_field(value, "message")? {
            config.message_id = id;
        }
        if let Some(url) = string_field(value, "wdosboxUrl")? {
            config.wdosbox_url = url;
        }
        Ok(config)
    }
}

fn run_from_js(value: JsValue) -> Result<Option<RunCommands>, OptionsError> {
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    if let Some(run) = value.as_string() {
        return Ok(Some(RunCommands::from(run)));
    }
    let commands = value
        .dyn_into::<Array>()
        .map_err(|_| OptionsError::InvalidType("run"))?;
    commands
        .iter()
        .map(|command| command.as_string().ok_or(OptionsError::RunNotText))
        .collect::<Result<Vec<_>, _>>()
        .map(|commands| Some(RunCommands::from(commands)))
}

/// Builds [`LaunchOptions`] from a plain JS options object, leaving defaults
/// in place for missing fields.
pub fn options_from_js(value: &JsValue) -> Result<LaunchOptions, OptionsError> {
    let mut options = LaunchOptions::default();
    let volume = match string_field(value, "masterVolume")? {
        Some(volume) => Some(volume),
        None => string_field(value, "dosboxMasterVolume")?,
    };
    if let Some(volume) = volume {
        options.master_volume = volume;
    }
    if let Some(run) = run_from_js(field(value, "run"))? {
        options.run = run;
    }
    if let Some(zip) = string_field(value, "zip")? {
        options.zip = zip;
    }
    if let Some(persist) = string_field(value, "persist")? {
        options.persist = persist;
    }
    options.title = string_field(value, "title")?;
    if let Some(mode) = string_field(value, "scaling")? {
        options.scale_mode = mode.parse()?;
    }
    Ok(options)
}

#[wasm_bindgen]
pub struct DosboxLauncher {
    session: Rc<RefCell<Session<JsDos, WebPage>>>,
}

#[wasm_bindgen]
impl DosboxLauncher {
    /// `config` may name the `container`, `canvas` and `message` element ids and
    /// the `wdosboxUrl`; every field is optional.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<DosboxLauncher, JsValue> {
        let config = LauncherConfig::from_js(&config).map_err(|e| js_error(&e.to_string()))?;
        let page = WebPage::from_ids(&config.container_id, &config.canvas_id, &config.message_id)
            .map_err(|e| js_error(e.message()))?;
        let emulator = JsDos::new(page.canvas().clone(), &config.wdosbox_url)
            .map_err(|e| js_error(e.message()))?;
        Ok(DosboxLauncher {
            session: Rc::new(RefCell::new(Session::new(emulator, page))),
        })
    }

    /// Resolves to the js-dos command interface, or `null` if the launch failed.
    /// Failures are shown on the page, never thrown.
    pub fn start(&self, options: JsValue) -> Promise {
        let session = Rc::clone(&self.session);
        future_to_promise(async move {
            let mut session = session
                .try_borrow_mut()
                .map_err(|_| js_error("a launch is already in progress"))?;
            let options = match options_from_js(&options) {
                Ok(options) => options,
                Err(err) => {
                    session.report_failure(&LaunchError::from(err));
                    return Ok(live_console(&session));
                }
            };
            session.start(options).await;
            Ok(live_console(&session))
        })
    }

    pub fn stop(&self) -> Result<(), JsValue> {
        let mut session = self
            .session
            .try_borrow_mut()
            .map_err(|_| js_error("cannot stop while a launch is in progress"))?;
        session.stop().map_err(|e| js_error(&e.to_string()))
    }

    #[wasm_bindgen(getter)]
    pub fn running(&self) -> bool {
        self.session
            .try_borrow()
            .map(|session| session.is_running())
            .unwrap_or(false)
    }
}

fn live_console(session: &Session<JsDos, WebPage>) -> JsValue {
    session
        .live()
        .map(|console| console.clone().into())
        .unwrap_or(JsValue::NULL)
}

fn js_error(message: &str) -> JsValue {
    js_sys::Error::new(message).into()
}
