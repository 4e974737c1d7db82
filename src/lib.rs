pub mod canvas_scaler;
pub mod host;
pub mod launch_error;
pub mod launch_options;
pub mod run_commands;
pub mod session;

#[cfg(target_arch = "wasm32")]
pub mod display_output;
#[cfg(target_arch = "wasm32")]
pub mod jsdos;
#[cfg(target_arch = "wasm32")]
pub mod web_api;

#[cfg(not(target_arch = "wasm32"))]
pub mod preview;

#[cfg(test)]
mod test_support;

pub use canvas_scaler::{fit_integer_contain, ScaleMode, Size};
pub use host::{Emulator, HostError, Page};
pub use launch_error::{LaunchError, OptionsError, Stage, StopError};
pub use launch_options::{LaunchOptions, RunCommands};
pub use session::Session;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn js_entry_point() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    // a second init (module re-instantiated on the same page) is harmless
    console_log::init_with_level(log::Level::Debug).ok();
    Ok(())
}
