//! Launching and stopping one DOSBox program on a page.
//!
//! A [`Session`] owns at most one live emulator console. Starting a launch
//! while one is live stops it first. Each launch step fails with its own
//! [`LaunchError`] variant; [`Session::start`] is the one place those errors are
//! logged and shown to the user.
use crate::canvas_scaler::{self, ScaleMode};
use crate::host::{Emulator, HostError, Page, EXIT_SUCCESS};
use crate::launch_error::{LaunchError, StopError};
use crate::launch_options::LaunchOptions;
use crate::run_commands;
use itertools::Itertools;
use log::{debug, error, info, warn};
use std::rc::Rc;

pub struct Session<E: Emulator, P: Page> {
    emulator: E,
    page: Rc<P>,
    live: Option<E::Console>,
    display_watch: Option<P::Watch>,
}

impl<E, P> Session<E, P>
where
    E: Emulator,
    P: Page + 'static,
{
    pub fn new(emulator: E, page: P) -> Self {
        Session {
            emulator,
            page: Rc::new(page),
            live: None,
            display_watch: None,
        }
    }

    pub fn live(&self) -> Option<&E::Console> {
        self.live.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.live.is_some()
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn emulator(&self) -> &E {
        &self.emulator
    }

    /// Launches `options`, reporting any failure on the page. Returns the live
    /// console, if there is one afterwards.
    pub async fn start(&mut self, options: LaunchOptions) -> Option<&E::Console> {
        if let Err(err) = self.launch(options).await {
            self.report_failure(&err);
        }
        self.live.as_ref()
    }

    pub async fn launch(&mut self, options: LaunchOptions) -> Result<(), LaunchError> {
        options.validate()?;

        if self.live.is_some() {
            info!("stopping the running DOSBox instance before a new launch");
            self.stop()?;
        }

        info!("fetching content archive {}", options.zip);
        let archive = self
            .emulator
            .fetch_archive(&options.zip)
            .await
            .map_err(LaunchError::Fetch)?;

        let instance = self
            .emulator
            .create_instance()
            .await
            .map_err(LaunchError::CreateInstance)?;

        let extract_path = options.extract_path();
        info!("extracting content archive into {}", extract_path);
        self.emulator
            .extract(&instance, &archive, &extract_path)
            .await
            .map_err(LaunchError::Extract)?;

        // Dropping the watch unregisters the callbacks, so a failure below
        // leaves no listeners behind.
        let watch = self
            .attach_display(options.scale_mode)
            .map_err(LaunchError::Display)?;
        self.page.set_running(true);

        let commands = run_commands::normalize(&options.run, &options.persist, |name| {
            self.page.query_param(name)
        })?;

        let main_args = options.main_args();
        info!("starting DOSBox with {}", main_args.iter().join(" "));
        let console = self
            .emulator
            .run_main(&instance, &main_args)
            .await
            .map_err(LaunchError::Program)?;
        // The main loop is running from here on, so `stop` must be able to reach it.
        self.display_watch = Some(watch);
        let console = self.live.insert(console);

        // Commands passed through the main loop get dropped at random, so the
        // whole batch goes through the shell instead.
        let mut batch = Vec::with_capacity(commands.len() + 1);
        batch.push(options.volume_command());
        batch.extend(commands);
        debug!("shell batch: {}", batch.iter().format(" | "));
        let shelled = self.emulator.shell(console, &batch).await;
        if let Err(err) = shelled {
            if let Err(stop_err) = self.stop() {
                warn!("could not stop DOSBox after a failed shell batch: {}", stop_err);
            }
            return Err(LaunchError::Program(err));
        }

        self.page.set_title(&options.page_title());
        info!("DOSBox is running");
        Ok(())
    }

    /// Stops the live console. A no-op when nothing is live.
    ///
    /// The live reference, the display watch and the running state are cleared
    /// before the exit status is checked, so a failed stop still leaves the
    /// session empty.
    pub fn stop(&mut self) -> Result<(), StopError> {
        let console = match self.live.take() {
            Some(console) => console,
            None => return Ok(()),
        };
        self.display_watch = None;
        self.page.set_running(false);

        let status = self.emulator.exit(&console).map_err(StopError::Host)?;
        if status != EXIT_SUCCESS {
            return Err(StopError::ExitStatus(status));
        }
        info!("DOSBox stopped");
        Ok(())
    }

    pub fn report_failure(&self, err: &LaunchError) {
        self.page.set_running(false);
        error!("Could not run DOSBox. {} (stage: {})", err, err.stage());
        self.page.show_error(&err.to_string());
    }

    fn attach_display(&self, mode: ScaleMode) -> Result<P::Watch, HostError> {
        canvas_scaler::rescale(&*self.page, mode)?;
        let page = Rc::clone(&self.page);
        self.page.watch_display(Rc::new(move || {
            if let Err(err) = canvas_scaler::rescale(&*page, mode) {
                warn!("could not rescale the display: {}", err);
            }
        }))
    }
}
