//! Bindings to the js-dos 6 API loaded on the page, and the network fetch of
//! content archives.
use crate::host::{exit_status_from_f64, Emulator, HostError, HostFuture, EXIT_SUCCESS};
use futures::future::FutureExt;
use js_sys::{Array, Function, Object, Promise, Reflect};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Blob, HtmlCanvasElement, Response, Url};

pub const DEFAULT_WDOSBOX_URL: &str = "./js-dos/wdosbox.js";

#[wasm_bindgen]
extern "C" {
    /// `Dos(canvas, options)`; returns a thenable resolving to a [`DosInstance`].
    #[wasm_bindgen(catch, js_name = Dos)]
    fn dos(canvas: &HtmlCanvasElement, options: &Object) -> Result<JsValue, JsValue>;

    pub type DosInstance;

    #[wasm_bindgen(method, getter)]
    fn fs(this: &DosInstance) -> DosFs;

    #[wasm_bindgen(method, catch, js_name = main)]
    fn run_main(this: &DosInstance, args: &Array) -> Result<JsValue, JsValue>;

    type DosFs;

    #[wasm_bindgen(method, catch)]
    fn extract(this: &DosFs, url: &str, path: &str) -> Result<JsValue, JsValue>;

    #[derive(Clone, Debug)]
    pub type CommandInterface;

    #[wasm_bindgen(method, catch)]
    fn exit(this: &CommandInterface) -> Result<JsValue, JsValue>;
}

impl From<JsValue> for HostError {
    fn from(value: JsValue) -> Self {
        if let Some(text) = value.as_string() {
            return HostError::new(text);
        }
        if let Some(err) = value.dyn_ref::<js_sys::Error>() {
            return HostError::new(String::from(err.to_string()));
        }
        HostError::new(format!("{:?}", value))
    }
}

/// Awaits a promise or any other thenable.
async fn settle(value: JsValue) -> Result<JsValue, HostError> {
    Ok(JsFuture::from(Promise::resolve(&value)).await?)
}

pub struct JsDos {
    canvas: HtmlCanvasElement,
    options: Object,
    _on_error: Closure<dyn FnMut(JsValue) -> Result<(), JsValue>>,
}

impl JsDos {
    pub fn new(canvas: HtmlCanvasElement, wdosbox_url: &str) -> Result<Self, HostError> {
        // js-dos swallows errors unless its error hook rethrows them.
        let on_error = Closure::wrap(
            Box::new(|err: JsValue| Err(err)) as Box<dyn FnMut(JsValue) -> Result<(), JsValue>>
        );
        let options = Object::new();
        Reflect::set(&options, &"wdosboxUrl".into(), &wdosbox_url.into())?;
        Reflect::set(&options, &"onerror".into(), on_error.as_ref())?;
        Ok(JsDos {
            canvas,
            options,
            _on_error: on_error,
        })
    }
}

impl Emulator for JsDos {
    type Archive = Blob;
    type Instance = DosInstance;
    type Console = CommandInterface;

    fn fetch_archive<'a>(&'a self, url: &'a str) -> HostFuture<'a, Blob> {
        async move {
            let window = web_sys::window().ok_or_else(|| HostError::new("no global `window` exists"))?;
            let response: Response = JsFuture::from(window.fetch_with_str(url))
                .await?
                .dyn_into()?;
            if !response.ok() {
                return Err(HostError::new(format!(
                    "{} {}",
                    response.status(),
                    response.status_text()
                )));
            }
            let blob: Blob = JsFuture::from(response.blob()?).await?.dyn_into()?;
            Ok(blob)
        }
        .boxed_local()
    }

    fn create_instance(&self) -> HostFuture<'_, DosInstance> {
        async move {
            let pending = dos(&self.canvas, &self.options)?;
            Ok(settle(pending).await?.unchecked_into::<DosInstance>())
        }
        .boxed_local()
    }

    fn extract<'a>(
        &'a self,
        instance: &'a DosInstance,
        archive: &'a Blob,
        path: &'a str,
    ) -> HostFuture<'a, ()> {
        async move {
            let url = Url::create_object_url_with_blob(archive)?;
            let extracted = match instance.fs().extract(&url, path) {
                Ok(pending) => settle(pending).await.map(|_| ()),
                Err(err) => Err(HostError::from(err)),
            };
            if Url::revoke_object_url(&url).is_err() {
                log::warn!("could not revoke object URL {}", url);
            }
            extracted
        }
        .boxed_local()
    }

    fn run_main<'a>(
        &'a self,
        instance: &'a DosInstance,
        args: &'a [String],
    ) -> HostFuture<'a, CommandInterface> {
        async move {
            let args: Array = args.iter().map(|arg| JsValue::from_str(arg)).collect();
            let pending = instance.run_main(&args)?;
            Ok(settle(pending).await?.unchecked_into::<CommandInterface>())
        }
        .boxed_local()
    }

    fn shell<'a>(
        &'a self,
        console: &'a CommandInterface,
        commands: &'a [String],
    ) -> HostFuture<'a, ()> {
        async move {
            // `shell(...commands)` is variadic.
            let shell: Function = Reflect::get(console, &"shell".into())?.dyn_into()?;
            let args: Array = commands.iter().map(|cmd| JsValue::from_str(cmd)).collect();
            settle(shell.apply(console, &args)?).await?;
            Ok(())
        }
        .boxed_local()
    }

    fn exit(&self, console: &CommandInterface) -> Result<i32, HostError> {
        let status = console.exit()?;
        // Anything but a number (a promise, `undefined`, ...) counts as a clean exit.
        status.as_f64().map_or(Ok(EXIT_SUCCESS), exit_status_from_f64)
    }
}
