//! Tagged frame payloads handed to the frame-distribution service.

use std::ffi::c_void;
use std::ptr::NonNull;

use renderstream_core::ffi::{self, SenderFrameType, SenderFrameTypeData};

/// One frame representation. The variant is the tag; the C union is only
/// materialised by [`FramePayload::to_sender`], in one step.
///
/// Pointers are non-owning and valid only for the call that produced them.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FramePayload {
    HostMemory { data: NonNull<u8>, stride: u32 },
    /// `ID3D11Resource*`
    Dx11Resource(NonNull<c_void>),
    /// `ID3D12Resource*`
    Dx12Resource(NonNull<c_void>),
    OpenGlTexture(ffi::GLuint),
    VulkanImage(NonNull<ffi::VulkanDataStructure>),
}

// SAFETY: the pointers are non-owning and never dereferenced here; the
// producer guarantees the object outlives the call that carries the payload.
unsafe impl Send for FramePayload {}
unsafe impl Sync for FramePayload {}

impl FramePayload {
    pub fn frame_type(&self) -> SenderFrameType {
        match self {
            FramePayload::HostMemory { .. } => ffi::RS_FRAMETYPE_HOST_MEMORY,
            FramePayload::Dx11Resource(_) => ffi::RS_FRAMETYPE_DX11_TEXTURE,
            FramePayload::Dx12Resource(_) => ffi::RS_FRAMETYPE_DX12_TEXTURE,
            FramePayload::OpenGlTexture(_) => ffi::RS_FRAMETYPE_OPENGL_TEXTURE,
            FramePayload::VulkanImage(_) => ffi::RS_FRAMETYPE_VULKAN_TEXTURE,
        }
    }

    /// Lower into the SDK's `(SenderFrameType, SenderFrameTypeData)` pair.
    pub fn to_sender(&self) -> (SenderFrameType, SenderFrameTypeData) {
        let data = match *self {
            FramePayload::HostMemory { data, stride } => SenderFrameTypeData {
                cpu: ffi::HostMemoryData {
                    data: data.as_ptr(),
                    stride,
                },
            },
            FramePayload::Dx11Resource(resource) => SenderFrameTypeData {
                dx11: ffi::Dx11Data {
                    resource: resource.as_ptr(),
                },
            },
            FramePayload::Dx12Resource(resource) => SenderFrameTypeData {
                dx12: ffi::Dx12Data {
                    resource: resource.as_ptr(),
                },
            },
            FramePayload::OpenGlTexture(texture) => SenderFrameTypeData {
                gl: ffi::OpenGlData { texture },
            },
            FramePayload::VulkanImage(image) => SenderFrameTypeData {
                vk: ffi::VulkanData {
                    image: image.as_ptr(),
                },
            },
        };
        (self.frame_type(), data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dx12_payload_writes_matching_member() {
        let mut object = 0u64;
        let raw = NonNull::from(&mut object).cast::<c_void>();
        let (frame_type, data) = FramePayload::Dx12Resource(raw).to_sender();
        assert_eq!(frame_type, ffi::RS_FRAMETYPE_DX12_TEXTURE);
        let resource = unsafe { data.dx12.resource };
        assert_eq!(resource, raw.as_ptr());
    }

    #[test]
    fn host_memory_payload_keeps_stride() {
        let mut pixels = [0u8; 16];
        let data = NonNull::new(pixels.as_mut_ptr()).unwrap();
        let (frame_type, union) = FramePayload::HostMemory { data, stride: 8 }.to_sender();
        assert_eq!(frame_type, ffi::RS_FRAMETYPE_HOST_MEMORY);
        let cpu = unsafe { union.cpu };
        let stride = cpu.stride;
        assert_eq!(stride, 8);
    }

    #[test]
    fn payload_crosses_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<FramePayload>();

        let mut object = 0u64;
        let payload = FramePayload::Dx11Resource(NonNull::from(&mut object).cast());
        let frame_type = std::thread::spawn(move || payload.frame_type()).join().unwrap();
        assert_eq!(frame_type, ffi::RS_FRAMETYPE_DX11_TEXTURE);
    }

    #[test]
    fn gl_payload_tag() {
        let (frame_type, union) = FramePayload::OpenGlTexture(5).to_sender();
        assert_eq!(frame_type, ffi::RS_FRAMETYPE_OPENGL_TEXTURE);
        let texture = unsafe { union.gl.texture };
        assert_eq!(texture, 5);
    }
}
