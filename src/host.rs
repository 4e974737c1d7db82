//! The two seams a [`Session`](crate::session::Session) talks through: the
//! external emulator component and the page it renders into.
//!
//! Everything is single-threaded; futures are `!Send` and boxed with
//! [`LocalBoxFuture`].
use crate::canvas_scaler::Size;
use futures::future::LocalBoxFuture;
use std::rc::Rc;

/// Failure reported by the emulator component, the network or the DOM.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HostError {
    message: String,
}

impl HostError {
    pub fn new(message: impl Into<String>) -> Self {
        HostError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type HostFuture<'a, T> = LocalBoxFuture<'a, Result<T, HostError>>;

/// Exit status the emulator reports for a clean shutdown.
pub const EXIT_SUCCESS: i32 = 0;

/// Converts a numeric exit status coming from JavaScript. Only whole numbers
/// in `i32` range are statuses; NaN, fractions and out-of-range values are errors.
pub fn exit_status_from_f64(status: f64) -> Result<i32, HostError> {
    if status.fract() == 0.0 && status >= f64::from(i32::MIN) && status <= f64::from(i32::MAX) {
        Ok(status as i32)
    } else {
        Err(HostError::new(format!("invalid exit status {}", status)))
    }
}

/// An opaque DOSBox implementation plus the network fetch that feeds it.
pub trait Emulator {
    /// Fetched content archive, ready for extraction.
    type Archive;
    /// A fresh emulator instance bound to the display surface.
    type Instance;
    /// The command interface returned once the main loop runs.
    type Console;

    fn fetch_archive<'a>(&'a self, url: &'a str) -> HostFuture<'a, Self::Archive>;

    fn create_instance(&self) -> HostFuture<'_, Self::Instance>;

    fn extract<'a>(
        &'a self,
        instance: &'a Self::Instance,
        archive: &'a Self::Archive,
        path: &'a str,
    ) -> HostFuture<'a, ()>;

    fn run_main<'a>(
        &'a self,
        instance: &'a Self::Instance,
        args: &'a [String],
    ) -> HostFuture<'a, Self::Console>;

    /// Runs `commands` in order as one batch on the DOS shell.
    fn shell<'a>(&'a self, console: &'a Self::Console, commands: &'a [String])
        -> HostFuture<'a, ()>;

    /// Requests termination and returns the reported exit status.
    fn exit(&self, console: &Self::Console) -> Result<i32, HostError>;
}

/// The page surface: container, canvas, message line, title and URL.
pub trait Page {
    /// Keeps the resize and resolution callbacks registered until dropped.
    type Watch;

    fn viewport_size(&self) -> Size;

    /// The canvas's native pixel size, as set by the emulator.
    fn native_size(&self) -> Size;

    fn set_container_size(&self, size: Size) -> Result<(), HostError>;

    fn set_running(&self, running: bool);

    fn show_error(&self, message: &str);

    fn set_title(&self, title: &str);

    fn query_param(&self, name: &str) -> Option<String>;

    /// Calls `on_change` on every viewport resize and every change of the
    /// canvas's `width`/`height` attributes.
    fn watch_display(&self, on_change: Rc<dyn Fn()>) -> Result<Self::Watch, HostError>;
}
