//! Resolving an opaque native texture to the representation the service
//! accepts.
//!
//! A type-erased texture is checked against each [`ProbeKind`] in
//! [`PROBE_ORDER`]; the first capability it supports decides the payload.
//! The order is fixed because one object can satisfy several queries (a
//! D3D11-on-12 wrapped resource answers both), and the same texture must
//! always resolve the same way.

use std::ffi::c_void;
use std::ptr::NonNull;

use renderstream_core::{InteropError, Result};

use crate::payload::FramePayload;

/// A backend interface a texture may expose.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ProbeKind {
    Dx11Resource,
    Dx12Resource,
}

/// Highest priority first.
pub const PROBE_ORDER: [ProbeKind; 2] = [ProbeKind::Dx11Resource, ProbeKind::Dx12Resource];

impl ProbeKind {
    fn payload(self, raw: NonNull<c_void>) -> FramePayload {
        match self {
            ProbeKind::Dx11Resource => FramePayload::Dx11Resource(raw),
            ProbeKind::Dx12Resource => FramePayload::Dx12Resource(raw),
        }
    }
}

/// Capability queries on one texture.
pub trait TextureProbe {
    /// The texture viewed as `kind`, or `None` if it does not support it.
    /// Any reference taken to answer must be released before returning.
    fn try_as(&self, kind: ProbeKind) -> Option<NonNull<c_void>>;
}

/// Run the probes in priority order and build the payload of the first hit.
pub fn identify<P: TextureProbe + ?Sized>(probe: &P) -> Result<FramePayload> {
    PROBE_ORDER
        .iter()
        .find_map(|&kind| probe.try_as(kind).map(|raw| kind.payload(raw)))
        .ok_or(InteropError::UnrecognizedResourceType)
}

/// Turns a raw texture pointer received on the wire into a payload.
pub trait TextureResolver: Send + Sync {
    /// # Safety
    ///
    /// `texture` must point to a live native texture object for the duration
    /// of the call.
    unsafe fn resolve(&self, texture: NonNull<c_void>) -> Result<FramePayload>;
}
