//! In-memory `Emulator` and `Page` doubles shared by the unit tests.
use crate::canvas_scaler::Size;
use crate::host::{Emulator, HostError, HostFuture, Page};
use futures::future::{self, FutureExt};
use itertools::Itertools;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

#[derive(Default)]
pub struct MockEmulator {
    calls: RefCell<Vec<String>>,
    failures: RefCell<HashMap<&'static str, String>>,
    next_instance: Cell<u32>,
    exit_status: Cell<i32>,
    live_consoles: Cell<u32>,
    max_live_consoles: Cell<u32>,
}

impl MockEmulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn fail_fetch(&self, message: &str) {
        self.fail("fetch", message);
    }

    pub fn fail_create(&self, message: &str) {
        self.fail("create", message);
    }

    pub fn fail_extract(&self, message: &str) {
        self.fail("extract", message);
    }

    pub fn fail_main(&self, message: &str) {
        self.fail("main", message);
    }

    pub fn fail_shell(&self, message: &str) {
        self.fail("shell", message);
    }

    pub fn clear_failures(&self) {
        self.failures.borrow_mut().clear();
    }

    pub fn set_exit_status(&self, status: i32) {
        self.exit_status.set(status);
    }

    pub fn live_consoles(&self) -> u32 {
        self.live_consoles.get()
    }

    pub fn max_live_consoles(&self) -> u32 {
        self.max_live_consoles.get()
    }

    fn fail(&self, step: &'static str, message: &str) {
        self.failures.borrow_mut().insert(step, message.to_string());
    }

    fn record(&self, step: &'static str, call: String) -> Result<(), HostError> {
        self.calls.borrow_mut().push(call);
        match self.failures.borrow().get(step) {
            Some(message) => Err(HostError::new(message.clone())),
            None => Ok(()),
        }
    }
}

impl Emulator for MockEmulator {
    type Archive = Vec<u8>;
    type Instance = u32;
    type Console = u32;

    fn fetch_archive<'a>(&'a self, url: &'a str) -> HostFuture<'a, Vec<u8>> {
        let result = self
            .record("fetch", format!("fetch {}", url))
            .map(|_| b"PK\x03\x04".to_vec());
        future::ready(result).boxed_local()
    }

    fn create_instance(&self) -> HostFuture<'_, u32> {
        let id = self.next_instance.get() + 1;
        self.next_instance.set(id);
        let result = self.record("create", format!("create {}", id)).map(|_| id);
        future::ready(result).boxed_local()
    }

    fn extract<'a>(
        &'a self,
        instance: &'a u32,
        _archive: &'a Vec<u8>,
        path: &'a str,
    ) -> HostFuture<'a, ()> {
        let result = self.record("extract", format!("extract {} {}", instance, path));
        future::ready(result).boxed_local()
    }

    fn run_main<'a>(&'a self, instance: &'a u32, args: &'a [String]) -> HostFuture<'a, u32> {
        let result = self
            .record("main", format!("main {} {}", instance, args.iter().join(" ")))
            .map(|_| {
                let live = self.live_consoles.get() + 1;
                self.live_consoles.set(live);
                self.max_live_consoles
                    .set(self.max_live_consoles.get().max(live));
                *instance
            });
        future::ready(result).boxed_local()
    }

    fn shell<'a>(&'a self, console: &'a u32, commands: &'a [String]) -> HostFuture<'a, ()> {
        let result = self.record(
            "shell",
            format!("shell {} {}", console, commands.iter().join(" | ")),
        );
        future::ready(result).boxed_local()
    }

    fn exit(&self, console: &u32) -> Result<i32, HostError> {
        self.record("exit", format!("exit {}", console))?;
        self.live_consoles
            .set(self.live_consoles.get().saturating_sub(1));
        Ok(self.exit_status.get())
    }
}

pub struct MockPage {
    viewport: Cell<Size>,
    native: Cell<Size>,
    container: Cell<Option<Size>>,
    running: Cell<bool>,
    message: RefCell<Option<String>>,
    title: RefCell<Option<String>>,
    query: HashMap<String, String>,
    watch_failure: RefCell<Option<String>>,
    listeners: RefCell<Vec<Weak<dyn Fn()>>>,
}

/// Holds the registered callback alive; the page only keeps a weak handle.
pub struct MockWatch {
    _on_change: Rc<dyn Fn()>,
}

impl MockPage {
    pub fn new(viewport: Size, native: Size) -> Self {
        MockPage {
            viewport: Cell::new(viewport),
            native: Cell::new(native),
            container: Cell::new(None),
            running: Cell::new(false),
            message: RefCell::new(None),
            title: RefCell::new(None),
            query: HashMap::new(),
            watch_failure: RefCell::new(None),
            listeners: RefCell::new(Vec::new()),
        }
    }

    pub fn with_query(mut self, name: &str, value: &str) -> Self {
        self.query.insert(name.to_string(), value.to_string());
        self
    }

    pub fn set_viewport(&self, size: Size) {
        self.viewport.set(size);
    }

    pub fn set_native(&self, size: Size) {
        self.native.set(size);
    }

    pub fn fail_watch(&self, message: &str) {
        *self.watch_failure.borrow_mut() = Some(message.to_string());
    }

    pub fn fire_display_change(&self) {
        let live: Vec<Rc<dyn Fn()>> = self
            .listeners
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        for on_change in live {
            on_change();
        }
    }

    pub fn active_watches(&self) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|listener| listener.strong_count() > 0)
            .count()
    }

    pub fn container_size(&self) -> Option<Size> {
        self.container.get()
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn message(&self) -> Option<String> {
        self.message.borrow().clone()
    }

    pub fn title(&self) -> Option<String> {
        self.title.borrow().clone()
    }
}

impl Page for MockPage {
    type Watch = MockWatch;

    fn viewport_size(&self) -> Size {
        self.viewport.get()
    }

    fn native_size(&self) -> Size {
        self.native.get()
    }

    fn set_container_size(&self, size: Size) -> Result<(), HostError> {
        self.container.set(Some(size));
        Ok(())
    }

    fn set_running(&self, running: bool) {
        self.running.set(running);
    }

    fn show_error(&self, message: &str) {
        *self.message.borrow_mut() = Some(message.to_string());
    }

    fn set_title(&self, title: &str) {
        *self.title.borrow_mut() = Some(title.to_string());
    }

    fn query_param(&self, name: &str) -> Option<String> {
        self.query.get(name).cloned()
    }

    fn watch_display(&self, on_change: Rc<dyn Fn()>) -> Result<MockWatch, HostError> {
        if let Some(message) = self.watch_failure.borrow().as_ref() {
            return Err(HostError::new(message.clone()));
        }
        self.listeners.borrow_mut().push(Rc::downgrade(&on_change));
        Ok(MockWatch {
            _on_change: on_change,
        })
    }
}
