//! Error taxonomy shared by the device, factory, probe and dispatch layers.

use thiserror::Error;

use crate::ffi::{self, RS_ERROR};

/// Failures of the native bridge. Every variant maps onto an SDK result code
/// via [`InteropError::code`] so it can cross the C boundary as a plain int.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InteropError {
    /// The device context is not ready. Recoverable: poll again later.
    #[error("graphics device is not initialized")]
    NotInitialized,

    #[error("invalid texture dimensions {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    /// Format code with no native mapping. Permanent for that input.
    #[error("unsupported pixel format code {0}")]
    UnsupportedFormat(i32),

    /// Driver allocation failure carrying the native error code.
    #[error("texture allocation failed (HRESULT {0:#010x})")]
    AllocationFailed(i32),

    /// No capability probe matched the texture handle.
    #[error("unrecognized native resource type")]
    UnrecognizedResourceType,

    /// Event id outside the registered range; producer/consumer version skew.
    #[error("unknown render event id {0}")]
    UnknownEvent(i32),

    #[error("render event payload pointer is null")]
    NullPayload,

    #[error("texture pointer is null")]
    NullTexture,

    #[error("no frame service entry point for {0}")]
    MissingEntryPoint(&'static str),

    /// The frame service itself rejected the call.
    #[error("{op} failed with {} ({code})", code_name(.code))]
    Service { op: &'static str, code: RS_ERROR },
}

fn code_name(code: &RS_ERROR) -> &'static str {
    ffi::rs_error_name(*code)
}

impl InteropError {
    /// SDK result code reported for this failure.
    pub fn code(&self) -> RS_ERROR {
        match self {
            InteropError::NotInitialized | InteropError::MissingEntryPoint(_) => {
                ffi::RS_NOT_INITIALISED
            }
            InteropError::AllocationFailed(_) => ffi::RS_ERROR_UNSPECIFIED,
            InteropError::Service { code, .. } => *code,
            InteropError::InvalidDimensions { .. }
            | InteropError::UnsupportedFormat(_)
            | InteropError::UnrecognizedResourceType
            | InteropError::UnknownEvent(_)
            | InteropError::NullPayload
            | InteropError::NullTexture => ffi::RS_ERROR_INVALID_PARAMETERS,
        }
    }

    /// Lift an SDK result code into a `Result`.
    pub fn check(op: &'static str, code: RS_ERROR) -> Result<(), InteropError> {
        if code == ffi::RS_ERROR_SUCCESS {
            Ok(())
        } else {
            Err(InteropError::Service { op, code })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_keep_the_sdk_code() {
        let err = InteropError::check("rs_sendFrame", ffi::RS_ERROR_TIMEOUT).unwrap_err();
        assert_eq!(err.code(), ffi::RS_ERROR_TIMEOUT);
        assert_eq!(err.to_string(), "rs_sendFrame failed with RS_ERROR_TIMEOUT (10)");
        assert!(InteropError::check("rs_sendFrame", ffi::RS_ERROR_SUCCESS).is_ok());
    }

    #[test]
    fn parameter_errors_map_to_invalid_parameters() {
        for err in [
            InteropError::NullTexture,
            InteropError::UnknownEvent(42),
            InteropError::UnrecognizedResourceType,
            InteropError::UnsupportedFormat(0),
        ] {
            assert_eq!(err.code(), ffi::RS_ERROR_INVALID_PARAMETERS, "{err}");
        }
        assert_eq!(InteropError::NotInitialized.code(), ffi::RS_NOT_INITIALISED);
    }

    #[test]
    fn allocation_failure_formats_hresult() {
        let err = InteropError::AllocationFailed(0x8007000Eu32 as i32);
        assert_eq!(err.to_string(), "texture allocation failed (HRESULT 0x8007000e)");
    }
}
