//! Shareable texture allocation on the engine's D3D12 device.
//!
//! The device is borrowed from the engine for the duration of each call; no
//! reference is retained here.

use std::iter;

use renderstream_core::{InteropError, Result};
use tracing::{debug, error, warn};
use windows::core::{Interface, PCWSTR};
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use crate::handle::{DeviceHandle, TextureHandle};
use crate::texture::{HeapKind, ResourceState, SharedTextureAllocator, SharedTextureDesc};

/// `E_POINTER`, reported when the driver claims success but returns nothing.
const E_POINTER: i32 = 0x8000_4003_u32 as i32;

/// Allocates committed resources through `ID3D12Device::CreateCommittedResource`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Dx12Allocator;

fn heap_properties(heap: HeapKind) -> D3D12_HEAP_PROPERTIES {
    let kind = match heap {
        HeapKind::Default => D3D12_HEAP_TYPE_DEFAULT,
    };
    D3D12_HEAP_PROPERTIES {
        Type: kind,
        CPUPageProperty: D3D12_CPU_PAGE_PROPERTY_UNKNOWN,
        MemoryPoolPreference: D3D12_MEMORY_POOL_UNKNOWN,
        CreationNodeMask: 0,
        VisibleNodeMask: 0,
    }
}

fn heap_flags(desc: &SharedTextureDesc<'_>) -> D3D12_HEAP_FLAGS {
    if desc.shared_heap {
        D3D12_HEAP_FLAG_SHARED
    } else {
        D3D12_HEAP_FLAG_NONE
    }
}

fn resource_state(state: ResourceState) -> D3D12_RESOURCE_STATES {
    match state {
        ResourceState::CopyDest => D3D12_RESOURCE_STATE_COPY_DEST,
    }
}

fn resource_desc(desc: &SharedTextureDesc<'_>) -> D3D12_RESOURCE_DESC {
    let mut flags = D3D12_RESOURCE_FLAG_NONE;
    if desc.usage.simultaneous_access {
        flags |= D3D12_RESOURCE_FLAG_ALLOW_SIMULTANEOUS_ACCESS;
    }
    if desc.usage.render_target {
        flags |= D3D12_RESOURCE_FLAG_ALLOW_RENDER_TARGET;
    }

    D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
        Alignment: 0,
        Width: u64::from(desc.width),
        Height: desc.height,
        DepthOrArraySize: desc.array_size,
        MipLevels: desc.mip_levels,
        Format: desc.format.into(),
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: desc.sample_count,
            Quality: 0,
        },
        Layout: D3D12_TEXTURE_LAYOUT_UNKNOWN,
        Flags: flags,
    }
}

fn set_debug_name(resource: &ID3D12Resource, name: &str) {
    let wide: Vec<u16> = name.encode_utf16().chain(iter::once(0)).collect();
    if let Err(e) = unsafe { resource.SetName(PCWSTR(wide.as_ptr())) } {
        warn!("SetName({name}) failed: {e}");
    }
}

impl SharedTextureAllocator for Dx12Allocator {
    fn allocate(&self, device: DeviceHandle, desc: &SharedTextureDesc<'_>) -> Result<TextureHandle> {
        // SAFETY: the handle came from the engine's D3D12 interface and the
        // engine keeps the device alive while the plugin is loaded.
        let device = unsafe { ID3D12Device::from_raw_borrowed(device.raw_ref()) }
            .ok_or(InteropError::NotInitialized)?;

        let heap = heap_properties(desc.heap);
        let resource_desc = resource_desc(desc);
        let mut resource: Option<ID3D12Resource> = None;

        unsafe {
            device.CreateCommittedResource(
                &heap,
                heap_flags(desc),
                &resource_desc,
                resource_state(desc.initial_state),
                None,
                &mut resource,
            )
        }
        .map_err(|e| {
            error!(
                "CreateCommittedResource failed for {}x{} {:?}: {e}",
                desc.width, desc.height, desc.format
            );
            InteropError::AllocationFailed(e.code().0)
        })?;

        let resource = resource.ok_or(InteropError::AllocationFailed(E_POINTER))?;

        if let Some(name) = desc.name {
            set_debug_name(&resource, name);
        }

        debug!(
            "Created shared texture {}x{} {:?} ({})",
            desc.width,
            desc.height,
            desc.format,
            desc.name.unwrap_or("unnamed")
        );

        // Ownership of the single reference passes to the caller.
        TextureHandle::from_raw(resource.into_raw()).ok_or(InteropError::AllocationFailed(E_POINTER))
    }
}
