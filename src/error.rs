// src/error.rs

//! Error types for recipe evaluation and cooking
//!
//! Every failure aborts the remaining build plan. The error carries enough
//! context (failing step, command line, exit status) for the host to report
//! it verbatim; nothing is rolled back.

use crate::recipe::{PatchError, ProbeError, StepKind};
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading, planning or cooking a recipe
#[derive(Error, Debug)]
pub enum Error {
    /// The required host runtime could not be found or queried
    #[error("Environment probe failed: {0}")]
    Probe(#[from] ProbeError),

    /// Network or HTTP failure while downloading
    #[error("Failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },

    /// Downloaded content did not match the declared checksum
    #[error("Checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    /// A patch did not apply to the source tree
    #[error("{0}")]
    Patch(#[from] PatchError),

    /// A wrapped tool exited nonzero
    #[error("{step} phase failed with exit code {}: {command}", display_code(.code))]
    CommandFailed {
        step: StepKind,
        command: String,
        code: Option<i32>,
    },

    /// A wrapped tool could not be started at all
    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A non-command failure inside a build step
    #[error("{step} phase failed: {source}")]
    StepFailed {
        step: StepKind,
        #[source]
        source: Box<Error>,
    },

    /// Declared dependencies are not installed
    #[error("Unresolved dependencies: {}", .0.join(", "))]
    MissingDependencies(Vec<String>),

    /// The recipe could not be parsed or failed validation
    #[error("Invalid recipe: {0}")]
    Parse(String),

    /// The recipe file does not exist
    #[error("Recipe file not found: {}", .0.display())]
    RecipeNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "none (terminated by signal)".to_string(),
    }
}

impl Error {
    /// Wrap an error with the identity of the step that produced it
    ///
    /// Command failures already name their step and are returned unchanged.
    pub fn in_step(self, step: StepKind) -> Self {
        match self {
            Error::CommandFailed { .. } | Error::StepFailed { .. } => self,
            other => Error::StepFailed {
                step,
                source: Box::new(other),
            },
        }
    }

    /// The build step this error was raised in, if any
    pub fn step(&self) -> Option<StepKind> {
        match self {
            Error::CommandFailed { step, .. } | Error::StepFailed { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// Process exit status to report to the invoking host
    ///
    /// Propagates the wrapped tool's exit code when it is known and nonzero.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::CommandFailed {
                code: Some(code), ..
            } if *code != 0 => *code,
            Error::StepFailed { source, .. } => source.exit_code(),
            _ => 1,
        }
    }
}
