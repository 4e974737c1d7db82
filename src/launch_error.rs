use crate::host::HostError;
use crate::run_commands::RunCommandError;
use std::fmt;

/// The launch step a failure happened in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Options,
    Stop,
    Fetch,
    CreateInstance,
    Extract,
    Display,
    StartProgram,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Options => "options",
            Stage::Stop => "stop",
            Stage::Fetch => "fetch",
            Stage::CreateInstance => "create-instance",
            Stage::Extract => "extract",
            Stage::Display => "display",
            Stage::StartProgram => "start-program",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OptionsError {
    #[error("Invalid type for the '{0}' option.")]
    InvalidType(&'static str),
    #[error("All run commands must be strings.")]
    RunNotText,
    #[error("No content file was given in the 'zip' option.")]
    MissingZip,
    #[error("Invalid master volume \"{0}\", expected L:R.")]
    InvalidMasterVolume(String),
    #[error("{0}")]
    Scaling(#[from] crate::canvas_scaler::UnknownScaleMode),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StopError {
    #[error("Failed to terminate DOSBox (exit status {0}).")]
    ExitStatus(i32),
    #[error("Failed to terminate DOSBox: {0}")]
    Host(HostError),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LaunchError {
    #[error("Invalid launch options: {0}")]
    Options(#[from] OptionsError),
    #[error("Failed to stop the running DOSBox instance: {0}")]
    Stop(#[from] StopError),
    #[error("Failed to fetch the content file ({0})")]
    Fetch(HostError),
    #[error("Failed to create a DOSBox instance: {0}")]
    CreateInstance(HostError),
    #[error("Failed to extract the content file on the DOSBox instance: {0}")]
    Extract(HostError),
    #[error("Failed to set up the display: {0}")]
    Display(HostError),
    #[error("Failed to start the DOS program: {0}")]
    RunCommands(#[from] RunCommandError),
    #[error("Failed to start the DOS program: {0}")]
    Program(HostError),
}

impl LaunchError {
    pub fn stage(&self) -> Stage {
        match self {
            LaunchError::Options(_) => Stage::Options,
            LaunchError::Stop(_) => Stage::Stop,
            LaunchError::Fetch(_) => Stage::Fetch,
            LaunchError::CreateInstance(_) => Stage::CreateInstance,
            LaunchError::Extract(_) => Stage::Extract,
            LaunchError::Display(_) => Stage::Display,
            LaunchError::RunCommands(_) | LaunchError::Program(_) => Stage::StartProgram,
        }
    }
}
