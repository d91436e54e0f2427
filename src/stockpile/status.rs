// src/stockpile/status.rs

use std::fmt;

use serde::{Deserialize, Serialize};

/// Object status as stored in the registry.
///
/// The registry owns the integer vocabulary; we name the codes this crate
/// produces or reasons about and carry anything else through untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum Status {
    Initialize,
    Running,
    Complete,
    NotFound,
    GeneralError,
    IoError,
    Other(i32),
}

/// The three regions of the status space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRegion {
    InProgress,
    Complete,
    Error,
}

impl Status {
    pub const INITIALIZE: i32 = 1;
    pub const RUNNING: i32 = 120;
    pub const COMPLETE: i32 = 300;
    pub const NOT_FOUND: i32 = 404;
    /// Codes at or above this are errors.
    pub const ERROR_THRESHOLD: i32 = 1000;
    pub const GENERAL_ERROR: i32 = 1000;
    pub const IO_ERROR: i32 = 6000;

    pub fn code(self) -> i32 {
        match self {
            Status::Initialize => Self::INITIALIZE,
            Status::Running => Self::RUNNING,
            Status::Complete => Self::COMPLETE,
            Status::NotFound => Self::NOT_FOUND,
            Status::GeneralError => Self::GENERAL_ERROR,
            Status::IoError => Self::IO_ERROR,
            Status::Other(code) => code,
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            Self::INITIALIZE => Status::Initialize,
            Self::RUNNING => Status::Running,
            Self::COMPLETE => Status::Complete,
            Self::NOT_FOUND => Status::NotFound,
            Self::GENERAL_ERROR => Status::GeneralError,
            Self::IO_ERROR => Status::IoError,
            other => Status::Other(other),
        }
    }

    /// NOT_FOUND sits below the numeric threshold but is still a failure.
    pub fn region(self) -> StatusRegion {
        match self.code() {
            Self::COMPLETE => StatusRegion::Complete,
            Self::NOT_FOUND => StatusRegion::Error,
            code if code >= Self::ERROR_THRESHOLD => StatusRegion::Error,
            _ => StatusRegion::InProgress,
        }
    }

    pub fn is_error(self) -> bool {
        self.region() == StatusRegion::Error
    }

    pub fn is_complete(self) -> bool {
        self.region() == StatusRegion::Complete
    }

    /// Error rank; `0` for anything that is not an error.
    fn severity(self) -> i32 {
        if self.is_error() { self.code() } else { 0 }
    }

    /// The more severe of two statuses. Any error beats a non-error; among
    /// errors the higher code wins.
    pub fn worst(self, other: Status) -> Status {
        if other.severity() > self.severity() {
            other
        } else {
            self
        }
    }
}

impl From<i32> for Status {
    fn from(code: i32) -> Self {
        Status::from_code(code)
    }
}

impl From<Status> for i32 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Initialize => write!(f, "INITIALIZE({})", Self::INITIALIZE),
            Status::Running => write!(f, "RUNNING({})", Self::RUNNING),
            Status::Complete => write!(f, "COMPLETE({})", Self::COMPLETE),
            Status::NotFound => write!(f, "NOT_FOUND({})", Self::NOT_FOUND),
            Status::GeneralError => write!(f, "GENERAL_ERROR({})", Self::GENERAL_ERROR),
            Status::IoError => write!(f, "IO_ERROR({})", Self::IO_ERROR),
            Status::Other(code) => write!(f, "{code}"),
        }
    }
}
