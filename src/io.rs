//! File input/output and status reporting.

pub mod utils;
pub mod vtk;
pub mod xyz;

use indicatif::{ProgressBar, ProgressStyle};

/// How much status information to print.
#[derive(Clone)]
pub enum Verbosity {
    Quiet,
    Messages,
    Progress(ProgressStyle),
}

impl Verbosity {
    /// Whether non-critical status messages and warnings should be printed.
    pub fn print_messages(&self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Creates a progress bar with the given number of steps, which is hidden
    /// unless progress reporting is enabled.
    pub fn create_progress_bar(&self, size: usize) -> ProgressBar {
        match self {
            Self::Progress(style) => ProgressBar::new(size as u64).with_style(style.clone()),
            _ => ProgressBar::hidden(),
        }
    }
}

impl From<bool> for Verbosity {
    fn from(verbose: bool) -> Self {
        if verbose {
            Self::Messages
        } else {
            Self::Quiet
        }
    }
}
