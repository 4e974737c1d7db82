//! Module to handle the DOM side of the page: the container that gets resized,
//! the js-dos canvas, the message line and the document title.
use crate::canvas_scaler::Size;
use crate::host::{HostError, Page};
use js_sys::Array;
use log::warn;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    Document, Element, Event, HtmlCanvasElement, HtmlElement, MutationObserver,
    MutationObserverInit, UrlSearchParams, Window,
};

const RUNNING_CLASS: &str = "running";
const ERROR_CLASS: &str = "error";

pub struct WebPage {
    window: Window,
    document: Document,
    container: HtmlElement,
    canvas: HtmlCanvasElement,
    message: Element,
}

fn element_by_id<T: JsCast>(document: &Document, id: &str) -> Result<T, HostError> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| HostError::new(format!("no element with id \"{}\"", id)))?
        .dyn_into::<T>()
        .map_err(|_| HostError::new(format!("element \"{}\" has the wrong type", id)))
}

impl WebPage {
    pub fn from_ids(container: &str, canvas: &str, message: &str) -> Result<Self, HostError> {
        let window = web_sys::window().ok_or_else(|| HostError::new("no global `window` exists"))?;
        let document = window
            .document()
            .ok_or_else(|| HostError::new("window has no document"))?;
        Ok(WebPage {
            container: element_by_id(&document, container)?,
            canvas: element_by_id(&document, canvas)?,
            message: element_by_id(&document, message)?,
            window,
            document,
        })
    }

    pub fn canvas(&self) -> &HtmlCanvasElement {
        &self.canvas
    }
}

/// Resize listener and canvas attribute observer; both are removed on drop.
pub struct DisplayWatch {
    window: Window,
    on_resize: Closure<dyn FnMut(Event)>,
    observer: MutationObserver,
    _on_mutation: Closure<dyn FnMut(Array, MutationObserver)>,
}

impl Drop for DisplayWatch {
    fn drop(&mut self) {
        self.observer.disconnect();
        if self
            .window
            .remove_event_listener_with_callback("resize", self.on_resize.as_ref().unchecked_ref())
            .is_err()
        {
            warn!("could not remove the resize listener");
        }
    }
}

impl Page for WebPage {
    type Watch = DisplayWatch;

    fn viewport_size(&self) -> Size {
        let dimension = |value: Result<JsValue, JsValue>| {
            value.ok().and_then(|v| v.as_f64()).unwrap_or(0.0).max(0.0) as u32
        };
        Size::new(
            dimension(self.window.inner_width()),
            dimension(self.window.inner_height()),
        )
    }

    fn native_size(&self) -> Size {
        Size::new(self.canvas.width(), self.canvas.height())
    }

    fn set_container_size(&self, size: Size) -> Result<(), HostError> {
        let style = self.container.style();
        style.set_property("width", &format!("{}px", size.width))?;
        style.set_property("height", &format!("{}px", size.height))?;
        Ok(())
    }

    fn set_running(&self, running: bool) {
        let classes = self.container.class_list();
        let result = if running {
            classes.add_1(RUNNING_CLASS)
        } else {
            classes.remove_1(RUNNING_CLASS)
        };
        if result.is_err() {
            warn!("could not toggle the \"{}\" class", RUNNING_CLASS);
        }
    }

    fn show_error(&self, message: &str) {
        self.message.set_text_content(Some(message));
        self.message.set_class_name(ERROR_CLASS);
    }

    fn set_title(&self, title: &str) {
        self.document.set_title(title);
    }

    fn query_param(&self, name: &str) -> Option<String> {
        let search = self.window.location().search().ok()?;
        UrlSearchParams::new_with_str(&search).ok()?.get(name)
    }

    fn watch_display(&self, on_change: Rc<dyn Fn()>) -> Result<DisplayWatch, HostError> {
        let resize_change = Rc::clone(&on_change);
        let on_resize = Closure::wrap(Box::new(move |_: Event| resize_change()) as Box<dyn FnMut(_)>);
        self.window
            .add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref())?;

        let on_mutation = Closure::wrap(Box::new(move |_: Array, _: MutationObserver| on_change())
            as Box<dyn FnMut(Array, MutationObserver)>);
        let observer = MutationObserver::new(on_mutation.as_ref().unchecked_ref())?;
        let init = MutationObserverInit::new();
        init.set_attributes(true);
        init.set_attribute_filter(&Array::of2(&"width".into(), &"height".into()));
        // Build the watch first so a failing `observe` still removes the resize listener.
        let watch = DisplayWatch {
            window: self.window.clone(),
            on_resize,
            observer,
            _on_mutation: on_mutation,
        };
        watch.observer.observe_with_options(&self.canvas, &init)?;
        Ok(watch)
    }
}
