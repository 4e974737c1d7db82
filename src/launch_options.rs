use crate::canvas_scaler::ScaleMode;
use crate::launch_error::OptionsError;
use lazy_static::lazy_static;
use regex::Regex;

pub const DEFAULT_MASTER_VOLUME: &str = "17:17";
pub const DEFAULT_TITLE: &str = "DOSBox";

lazy_static! {
    static ref MASTER_VOLUME: Regex = Regex::new(r"^\d{1,3}(:\d{1,3})?$").unwrap();
}

/// Where the startup commands come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunCommands {
    Inline(Vec<String>),
    /// Name of the page URL query parameter holding a run literal.
    UrlParam(String),
}

impl Default for RunCommands {
    fn default() -> Self {
        RunCommands::Inline(Vec::new())
    }
}

/// A single command, or `?name` to read the commands from the URL.
impl From<&str> for RunCommands {
    fn from(run: &str) -> Self {
        match run.strip_prefix('?') {
            Some(name) => RunCommands::UrlParam(name.to_string()),
            None => RunCommands::Inline(vec![run.to_string()]),
        }
    }
}

impl From<String> for RunCommands {
    fn from(run: String) -> Self {
        RunCommands::from(run.as_str())
    }
}

impl From<Vec<String>> for RunCommands {
    fn from(commands: Vec<String>) -> Self {
        RunCommands::Inline(commands)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchOptions {
    /// DOSBox mixer volume, `L:R` (or a single value for both channels).
    pub master_volume: String,
    pub run: RunCommands,
    /// URL of the content archive.
    pub zip: String,
    /// Directory the archive is extracted under and the commands run from.
    pub persist: String,
    pub title: Option<String>,
    pub scale_mode: ScaleMode,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        LaunchOptions {
            master_volume: DEFAULT_MASTER_VOLUME.to_string(),
            run: RunCommands::default(),
            zip: String::new(),
            persist: String::new(),
            title: None,
            scale_mode: ScaleMode::default(),
        }
    }
}

impl LaunchOptions {
    pub fn new(zip: impl Into<String>) -> Self {
        LaunchOptions {
            zip: zip.into(),
            ..LaunchOptions::default()
        }
    }

    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.zip.is_empty() {
            return Err(OptionsError::MissingZip);
        }
        if !MASTER_VOLUME.is_match(&self.master_volume) {
            return Err(OptionsError::InvalidMasterVolume(self.master_volume.clone()));
        }
        Ok(())
    }

    pub fn extract_path(&self) -> String {
        format!("{}/", self.persist)
    }

    pub fn config_path(&self) -> String {
        format!("{}/dosbox.conf", self.persist)
    }

    /// Arguments for the emulator's main loop.
    pub fn main_args(&self) -> Vec<String> {
        vec!["-conf".to_string(), self.config_path()]
    }

    pub fn volume_command(&self) -> String {
        format!("mixer master {} 2> nul", self.master_volume)
    }

    pub fn page_title(&self) -> String {
        match &self.title {
            Some(title) => format!("{} - {}", title, DEFAULT_TITLE),
            None => DEFAULT_TITLE.to_string(),
        }
    }
}
