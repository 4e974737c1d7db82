//! A dry-run host for previewing a launch without a browser.
//!
//! The archive is read from the local filesystem and inspected with the `zip`
//! crate; every emulator call is written to a transcript instead of running.
use crate::canvas_scaler::Size;
use crate::host::{Emulator, HostError, HostFuture, Page, EXIT_SUCCESS};
use futures::future::{self, FutureExt};
use itertools::Itertools;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fs;
use std::io::Cursor;

#[derive(Default)]
pub struct PreviewEmulator {
    transcript: RefCell<Vec<String>>,
    next_instance: Cell<u32>,
}

pub struct PreviewInstance {
    id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewConsole {
    pub id: u32,
}

impl PreviewEmulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transcript(&self) -> Vec<String> {
        self.transcript.borrow().clone()
    }

    fn note(&self, line: String) {
        log::debug!("{}", line);
        self.transcript.borrow_mut().push(line);
    }
}

/// Names of the files in a zip archive, in archive order.
pub fn archive_entries(archive: &[u8]) -> Result<Vec<String>, HostError> {
    let mut zip_arch = zip::ZipArchive::new(Cursor::new(archive))
        .map_err(|e| HostError::new(format!("not a zip archive: {}", e)))?;
    let mut names = Vec::with_capacity(zip_arch.len());
    for index in 0..zip_arch.len() {
        let entry = zip_arch
            .by_index(index)
            .map_err(|e| HostError::new(format!("unreadable archive entry {}: {}", index, e)))?;
        if !entry.is_dir() {
            names.push(entry.name().to_string());
        }
    }
    Ok(names)
}

impl Emulator for PreviewEmulator {
    type Archive = Vec<u8>;
    type Instance = PreviewInstance;
    type Console = PreviewConsole;

    fn fetch_archive<'a>(&'a self, url: &'a str) -> HostFuture<'a, Vec<u8>> {
        let result = if url.starts_with("http://") || url.starts_with("https://") {
            Err(HostError::new("only local archives can be previewed"))
        } else {
            fs::read(url).map_err(|e| HostError::new(format!("{}: {}", url, e)))
        };
        if let Ok(archive) = &result {
            self.note(format!("read {} ({} bytes)", url, archive.len()));
        }
        future::ready(result).boxed_local()
    }

    fn create_instance(&self) -> HostFuture<'_, PreviewInstance> {
        let id = self.next_instance.get() + 1;
        self.next_instance.set(id);
        self.note(format!("instance {} created", id));
        future::ready(Ok(PreviewInstance { id })).boxed_local()
    }

    fn extract<'a>(
        &'a self,
        instance: &'a PreviewInstance,
        archive: &'a Vec<u8>,
        path: &'a str,
    ) -> HostFuture<'a, ()> {
        let result = archive_entries(archive).map(|names| {
            for name in names {
                self.note(format!("instance {}: extract {}{}", instance.id, path, name));
            }
        });
        future::ready(result).boxed_local()
    }

    fn run_main<'a>(
        &'a self,
        instance: &'a PreviewInstance,
        args: &'a [String],
    ) -> HostFuture<'a, PreviewConsole> {
        self.note(format!("instance {}: dosbox {}", instance.id, args.iter().join(" ")));
        future::ready(Ok(PreviewConsole { id: instance.id })).boxed_local()
    }

    fn shell<'a>(
        &'a self,
        console: &'a PreviewConsole,
        commands: &'a [String],
    ) -> HostFuture<'a, ()> {
        for command in commands {
            self.note(format!("instance {}: > {}", console.id, command));
        }
        future::ready(Ok(())).boxed_local()
    }

    fn exit(&self, console: &PreviewConsole) -> Result<i32, HostError> {
        self.note(format!("instance {}: exit", console.id));
        Ok(EXIT_SUCCESS)
    }
}

pub struct PreviewPage {
    viewport: Size,
    native: Size,
    query: HashMap<String, String>,
    container: Cell<Option<Size>>,
    running: Cell<bool>,
    message: RefCell<Option<String>>,
    title: RefCell<Option<String>>,
}

impl PreviewPage {
    pub fn new(viewport: Size, native: Size) -> Self {
        PreviewPage {
            viewport,
            native,
            query: HashMap::new(),
            container: Cell::new(None),
            running: Cell::new(false),
            message: RefCell::new(None),
            title: RefCell::new(None),
        }
    }

    pub fn with_query(mut self, query: HashMap<String, String>) -> Self {
        self.query = query;
        self
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

impl Page for PreviewPage {
    // Nothing resizes during a preview.
    type Watch = ();

    fn viewport_size(&self) -> Size {
        self.viewport
    }

    fn native_size(&self) -> Size {
        self.native
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

    fn watch_display(&self, _on_change: std::rc::Rc<dyn Fn()>) -> Result<(), HostError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launch_options::{LaunchOptions, RunCommands};
    use crate::session::Session;
    use futures::executor::block_on;
    use std::io::Write;
    use std::path::PathBuf;
    use zip::write::FileOptions;

    fn write_archive(name: &str, files: &[&str]) -> PathBuf {
        let path = std::env::temp_dir().join(format!("{}-{}.zip", name, std::process::id()));
        let mut writer = zip::ZipWriter::new(fs::File::create(&path).unwrap());
        let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.add_directory("SUB/", options).unwrap();
        for file in files {
            writer.start_file(*file, options).unwrap();
            writer.write_all(b"REM").unwrap();
        }
        writer.finish().unwrap();
        path
    }

    #[test]
    fn previews_a_launch() {
        let path = write_archive("preview-launch", &["KEEN1.EXE", "SUB/LEVEL.DAT"]);
        let mut options = LaunchOptions::new(path.to_str().unwrap());
        options.persist = "KEEN".to_string();
        options.run = RunCommands::from("KEEN1.EXE");

        let mut session = Session::new(
            PreviewEmulator::new(),
            PreviewPage::new(Size::new(1280, 800), Size::new(320, 200)),
        );
        let console = block_on(session.start(options)).copied();
        assert_eq!(console, Some(PreviewConsole { id: 1 }));

        let transcript = session.emulator().transcript();
        assert_eq!(
            &transcript[1..],
            &[
                "instance 1 created",
                "instance 1: extract KEEN/KEEN1.EXE",
                "instance 1: extract KEEN/SUB/LEVEL.DAT",
                "instance 1: dosbox -conf KEEN/dosbox.conf",
                "instance 1: > mixer master 17:17 2> nul",
                "instance 1: > cd KEEN",
                "instance 1: > KEEN1.EXE",
            ]
        );
        assert_eq!(session.page().container_size(), Some(Size::new(1280, 800)));
        assert_eq!(session.page().title(), Some("DOSBox".to_string()));
        fs::remove_file(path).ok();
    }

    #[test]
    fn remote_archives_are_refused() {
        let mut session = Session::new(
            PreviewEmulator::new(),
            PreviewPage::new(Size::new(640, 400), Size::new(320, 200)),
        );
        block_on(session.start(LaunchOptions::new("https://example.com/game.zip")));
        let message = session.page().message().unwrap();
        assert!(message.starts_with("Failed to fetch the content file"));
        assert!(!session.page().is_running());
    }

    #[test]
    fn garbage_archive_fails_extraction() {
        assert!(archive_entries(b"not a zip").is_err());
    }
}
