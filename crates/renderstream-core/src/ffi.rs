//! Hardcoded RenderStream SDK constants and C-repr structs.
//!
//! Mirrors the subset of `d3renderstream.h` (API 1.30) the native bridge
//! touches: result codes, pixel formats, frame types, the sender frame union
//! and the camera response records passed back with each sent frame.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(dead_code)]

use std::ffi::{c_char, c_void};

pub const RENDER_STREAM_VERSION_MAJOR: i32 = 1;
pub const RENDER_STREAM_VERSION_MINOR: i32 = 30;

// =====================================================================
// Result codes (RS_ERROR)
// =====================================================================
pub type RS_ERROR = i32;

pub const RS_ERROR_SUCCESS: RS_ERROR = 0;
pub const RS_NOT_INITIALISED: RS_ERROR = 1;
pub const RS_ERROR_ALREADYINITIALISED: RS_ERROR = 2;
pub const RS_ERROR_INVALIDHANDLE: RS_ERROR = 3;
pub const RS_MAXSENDERSREACHED: RS_ERROR = 4;
pub const RS_ERROR_BADSTREAMTYPE: RS_ERROR = 5;
pub const RS_ERROR_NOTFOUND: RS_ERROR = 6;
pub const RS_ERROR_INCORRECTSCHEMA: RS_ERROR = 7;
pub const RS_ERROR_INVALID_PARAMETERS: RS_ERROR = 8;
pub const RS_ERROR_BUFFER_OVERFLOW: RS_ERROR = 9;
pub const RS_ERROR_TIMEOUT: RS_ERROR = 10;
pub const RS_ERROR_STREAMS_CHANGED: RS_ERROR = 11;
pub const RS_ERROR_INCOMPATIBLE_VERSION: RS_ERROR = 12;
pub const RS_ERROR_FAILED_TO_GET_DXDEVICE_FROM_RESOURCE: RS_ERROR = 13;
pub const RS_ERROR_FAILED_TO_INITIALISE_GPGPU: RS_ERROR = 14;
pub const RS_ERROR_QUIT: RS_ERROR = 15;
pub const RS_ERROR_UNSPECIFIED: RS_ERROR = 16;

/// Symbolic name of an SDK result code, for log output.
pub fn rs_error_name(code: RS_ERROR) -> &'static str {
    match code {
        RS_ERROR_SUCCESS => "RS_ERROR_SUCCESS",
        RS_NOT_INITIALISED => "RS_NOT_INITIALISED",
        RS_ERROR_ALREADYINITIALISED => "RS_ERROR_ALREADYINITIALISED",
        RS_ERROR_INVALIDHANDLE => "RS_ERROR_INVALIDHANDLE",
        RS_MAXSENDERSREACHED => "RS_MAXSENDERSREACHED",
        RS_ERROR_BADSTREAMTYPE => "RS_ERROR_BADSTREAMTYPE",
        RS_ERROR_NOTFOUND => "RS_ERROR_NOTFOUND",
        RS_ERROR_INCORRECTSCHEMA => "RS_ERROR_INCORRECTSCHEMA",
        RS_ERROR_INVALID_PARAMETERS => "RS_ERROR_INVALID_PARAMETERS",
        RS_ERROR_BUFFER_OVERFLOW => "RS_ERROR_BUFFER_OVERFLOW",
        RS_ERROR_TIMEOUT => "RS_ERROR_TIMEOUT",
        RS_ERROR_STREAMS_CHANGED => "RS_ERROR_STREAMS_CHANGED",
        RS_ERROR_INCOMPATIBLE_VERSION => "RS_ERROR_INCOMPATIBLE_VERSION",
        RS_ERROR_FAILED_TO_GET_DXDEVICE_FROM_RESOURCE => {
            "RS_ERROR_FAILED_TO_GET_DXDEVICE_FROM_RESOURCE"
        }
        RS_ERROR_FAILED_TO_INITIALISE_GPGPU => "RS_ERROR_FAILED_TO_INITIALISE_GPGPU",
        RS_ERROR_QUIT => "RS_ERROR_QUIT",
        RS_ERROR_UNSPECIFIED => "RS_ERROR_UNSPECIFIED",
        _ => "RS_ERROR_<unknown>",
    }
}

// =====================================================================
// Frame types (SenderFrameType)
// =====================================================================
pub type SenderFrameType = i32;

pub const RS_FRAMETYPE_HOST_MEMORY: SenderFrameType = 0;
pub const RS_FRAMETYPE_DX11_TEXTURE: SenderFrameType = 1;
pub const RS_FRAMETYPE_DX12_TEXTURE: SenderFrameType = 2;
pub const RS_FRAMETYPE_OPENGL_TEXTURE: SenderFrameType = 3;
pub const RS_FRAMETYPE_VULKAN_TEXTURE: SenderFrameType = 4;
pub const RS_FRAMETYPE_UNKNOWN: SenderFrameType = 5;

// =====================================================================
// Handles
// =====================================================================
pub type StreamHandle = u64;
pub type CameraHandle = u64;
pub type GLuint = u32;
pub type VkDeviceMemory = *mut c_void;
pub type VkDeviceSize = u64;
pub type VkSemaphore = *mut c_void;

// =====================================================================
// C-repr structs inside the SDK's `#pragma pack(push, 4)` region
// =====================================================================

/// Tracking data required by the service but not used to render content.
#[repr(C, packed(4))]
#[derive(Debug, Copy, Clone, Default)]
pub struct D3TrackingData {
    pub virtualZoomScale: f32,
    pub virtualReprojectionRequired: u8,
    pub xRealCamera: f32,
    pub yRealCamera: f32,
    pub zRealCamera: f32,
    pub rxRealCamera: f32,
    pub ryRealCamera: f32,
    pub rzRealCamera: f32,
}

/// Camera pose and intrinsics for one stream on one frame.
#[repr(C, packed(4))]
#[derive(Debug, Copy, Clone, Default)]
pub struct CameraData {
    pub id: StreamHandle,
    pub cameraHandle: CameraHandle,
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub rx: f32,
    pub ry: f32,
    pub rz: f32,
    pub focalLength: f32,
    pub sensorX: f32,
    pub sensorY: f32,
    pub cx: f32,
    pub cy: f32,
    pub nearZ: f32,
    pub farZ: f32,
    /// If > 0, an orthographic camera should be used.
    pub orthoWidth: f32,
    pub d3Tracking: D3TrackingData,
}

/// Timestamped camera record echoed back to the service with a sent frame.
#[repr(C, packed(4))]
#[derive(Debug, Copy, Clone, Default)]
pub struct CameraResponseData {
    pub tTracked: f64,
    pub camera: CameraData,
}

#[repr(C, packed(4))]
#[derive(Copy, Clone)]
pub struct HostMemoryData {
    pub data: *mut u8,
    pub stride: u32,
}

#[repr(C, packed(4))]
#[derive(Copy, Clone)]
pub struct Dx11Data {
    /// `ID3D11Resource*`
    pub resource: *mut c_void,
}

#[repr(C, packed(4))]
#[derive(Copy, Clone)]
pub struct Dx12Data {
    /// `ID3D12Resource*`
    pub resource: *mut c_void,
}

#[repr(C, packed(4))]
#[derive(Copy, Clone)]
pub struct OpenGlData {
    pub texture: GLuint,
}

#[repr(C, packed(4))]
#[derive(Copy, Clone)]
pub struct VulkanDataStructure {
    pub memory: VkDeviceMemory,
    pub size: VkDeviceSize,
    pub format: u32,
    pub width: u32,
    pub height: u32,
    pub waitSemaphore: VkSemaphore,
    pub waitSemaphoreValue: u64,
    pub signalSemaphore: VkSemaphore,
    pub signalSemaphoreValue: u64,
}

#[repr(C, packed(4))]
#[derive(Copy, Clone)]
pub struct VulkanData {
    pub image: *mut VulkanDataStructure,
}

/// Union of frame representations; the active member is selected by a
/// [`SenderFrameType`] passed alongside it.
#[repr(C, packed(4))]
#[derive(Copy, Clone)]
pub union SenderFrameTypeData {
    pub cpu: HostMemoryData,
    pub dx11: Dx11Data,
    pub dx12: Dx12Data,
    pub gl: OpenGlData,
    pub vk: VulkanData,
}

// =====================================================================
// C-repr structs after `#pragma pack(pop)`
// =====================================================================

/// Per-frame response passed to `rs_sendFrame`.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct FrameResponseData {
    pub cameraData: *const CameraResponseData,
    pub schemaHash: u64,
    pub parameterDataSize: u32,
    pub parameterData: *mut c_void,
    pub textDataCount: u32,
    pub textData: *mut *const c_char,
}

impl FrameResponseData {
    /// A response carrying only camera data.
    pub fn with_camera(camera: &CameraResponseData) -> Self {
        Self {
            cameraData: camera,
            schemaHash: 0,
            parameterDataSize: 0,
            parameterData: std::ptr::null_mut(),
            textDataCount: 0,
            textData: std::ptr::null_mut(),
        }
    }
}

// =====================================================================
// Entry points
// =====================================================================

/// `rs_getFrameImage`: fills the given texture with a remote image.
pub type GetFrameImageFn = unsafe extern "C" fn(
    image_id: i64,
    frame_type: SenderFrameType,
    data: SenderFrameTypeData,
) -> RS_ERROR;

/// `rs_sendFrame`: publishes a rendered frame for a stream.
pub type SendFrameFn = unsafe extern "C" fn(
    stream: StreamHandle,
    frame_type: SenderFrameType,
    data: SenderFrameTypeData,
    response: *const FrameResponseData,
) -> RS_ERROR;
