// SPDX-License-Identifier: AGPL-3.0-only

//! Error types for waveform generator operations

use thiserror::Error;

/// Result type alias for waveform generator operations
pub type Result<T> = std::result::Result<T, WavegenError>;

/// Errors that can occur during waveform generator operations
#[derive(Debug, Error)]
pub enum WavegenError {
    /// No register handle is attached to the engine
    #[error("Waveform generator not initialized")]
    NotInitialized,

    /// Value outside its documented domain
    #[error("Invalid parameter: {reason}")]
    InvalidParameter {
        /// What was rejected and why
        reason: String,
    },

    /// Bulk request larger than the transfer cap
    #[error("Out of range: requested {requested}, limit {limit}")]
    OutOfRange {
        /// Requested size or index
        requested: u64,
        /// Largest accepted value
        limit: u64,
    },

    /// I/O error from the register boundary (device node, mapping, ioctl)
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },

    /// Register read or write failed without an OS error
    #[error("Transfer failed: {reason}")]
    TransferFailed {
        /// Reason for failure
        reason: String,
    },

    /// Bulk staging buffer could not be obtained
    #[error("Allocation of {requested} staging words failed")]
    AllocationFailure {
        /// Number of words requested
        requested: usize,
    },

    /// Status poll exhausted its attempts
    #[error("Reconfigure still busy after {attempts} polls")]
    Timeout {
        /// Number of status reads performed
        attempts: u32,
    },
}

/// Failure kinds as seen by a caller deciding whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operation attempted before a register handle exists
    NotInitialized,
    /// Value outside documented domain
    InvalidParameter,
    /// Bulk count exceeds the transfer cap
    OutOfRange,
    /// Underlying register access failed
    IoFailure,
    /// Bulk staging buffer could not be obtained
    AllocationFailure,
    /// Bounded status poll gave up
    Timeout,
}

impl ErrorKind {
    /// Whether retrying the same call may succeed.
    ///
    /// The remaining kinds are caller bugs: fix the call instead.
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::IoFailure | Self::AllocationFailure | Self::Timeout)
    }

    /// Positive Linux errno for a boundary adapter that reports integers.
    #[must_use]
    pub const fn errno(self) -> i32 {
        match self {
            Self::NotInitialized => libc::ENODEV,
            Self::InvalidParameter => libc::EINVAL,
            Self::OutOfRange => libc::ERANGE,
            Self::IoFailure => libc::EIO,
            Self::AllocationFailure => libc::ENOMEM,
            Self::Timeout => libc::ETIMEDOUT,
        }
    }
}

impl WavegenError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }

    /// Create an out-of-range error
    pub fn out_of_range(requested: impl Into<u64>, limit: impl Into<u64>) -> Self {
        Self::OutOfRange {
            requested: requested.into(),
            limit: limit.into(),
        }
    }

    /// Create a transfer failed error
    pub fn transfer_failed(reason: impl Into<String>) -> Self {
        Self::TransferFailed {
            reason: reason.into(),
        }
    }

    /// Failure kind of this error
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInitialized => ErrorKind::NotInitialized,
            Self::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Self::OutOfRange { .. } => ErrorKind::OutOfRange,
            Self::Io { .. } | Self::TransferFailed { .. } => ErrorKind::IoFailure,
            Self::AllocationFailure { .. } => ErrorKind::AllocationFailure,
            Self::Timeout { .. } => ErrorKind::Timeout,
        }
    }

    /// Shorthand for `self.kind().is_transient()`
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        self.kind().is_transient()
    }

    /// Shorthand for `self.kind().errno()`
    #[must_use]
    pub const fn errno(&self) -> i32 {
        self.kind().errno()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_collapse_to_io_failure() {
        let err: WavegenError = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert_eq!(err.kind(), ErrorKind::IoFailure);
        assert_eq!(WavegenError::transfer_failed("x").kind(), ErrorKind::IoFailure);
    }

    #[test]
    fn caller_bugs_are_not_transient() {
        assert!(!WavegenError::NotInitialized.is_transient());
        assert!(!WavegenError::invalid_parameter("phase").is_transient());
        assert!(!WavegenError::out_of_range(4097u32, 4096u32).is_transient());
        assert!(WavegenError::AllocationFailure { requested: 8 }.is_transient());
        assert!(WavegenError::transfer_failed("bus").is_transient());
    }

    #[test]
    fn errno_mapping() {
        assert_eq!(WavegenError::invalid_parameter("x").errno(), libc::EINVAL);
        assert_eq!(WavegenError::out_of_range(1u32, 0u32).errno(), libc::ERANGE);
        assert_eq!(WavegenError::NotInitialized.errno(), libc::ENODEV);
    }

    #[test]
    fn messages_name_the_values() {
        let msg = WavegenError::out_of_range(4097u32, 4096u32).to_string();
        assert!(msg.contains("4097") && msg.contains("4096"), "{msg}");
    }
}
