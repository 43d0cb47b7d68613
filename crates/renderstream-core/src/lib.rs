//! Boundary definitions for the native RenderStream bridge.
//!
//! - [`ffi`]: the frame-distribution SDK's C types and entry-point signatures.
//! - [`host`]: the engine's native plugin interfaces.
//! - [`PixelFormat`], [`InteropError`]: shared value and error types.
//! - [`logging`]: `tracing` forwarding into the engine's log sink.

pub mod error;
pub mod ffi;
pub mod format;
pub mod host;
pub mod logging;

pub use error::InteropError;
pub use format::PixelFormat;

pub type Result<T, E = InteropError> = std::result::Result<T, E>;
