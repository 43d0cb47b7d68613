//! C-repr mirrors of the host engine's native plugin interfaces.
//!
//! Covers `IUnityInterfaces`, `IUnityGraphics`, `IUnityGraphicsD3D12v5` and
//! `IUnityLog`: the registry handed to `UnityPluginLoad`, the graphics
//! device-event and event-id services, the D3D12 device/queue accessors and
//! the engine's log sink. Only the layout is defined here; see
//! `renderstream-native` for the safe adapter.

#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]
#![allow(dead_code)]

use std::ffi::{c_char, c_int, c_void};

use num_derive::FromPrimitive;

/// 128-bit interface identifier, split into two halves.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct UnityInterfaceGUID {
    pub high: u64,
    pub low: u64,
}

impl UnityInterfaceGUID {
    pub const fn new(high: u64, low: u64) -> Self {
        Self { high, low }
    }
}

/// Marker for interface types that can be fetched from the registry.
pub trait UnityInterface {
    const GUID: UnityInterfaceGUID;
}

// =====================================================================
// Registry
// =====================================================================

#[repr(C)]
pub struct IUnityInterface {
    _private: [u8; 0],
}

#[repr(C)]
pub struct IUnityInterfaces {
    pub GetInterface:
        Option<unsafe extern "system" fn(guid: UnityInterfaceGUID) -> *mut IUnityInterface>,
    pub RegisterInterface:
        Option<unsafe extern "system" fn(guid: UnityInterfaceGUID, ptr: *mut IUnityInterface)>,
    pub GetInterfaceSplit:
        Option<unsafe extern "system" fn(guid_high: u64, guid_low: u64) -> *mut IUnityInterface>,
    pub RegisterInterfaceSplit: Option<
        unsafe extern "system" fn(guid_high: u64, guid_low: u64, ptr: *mut IUnityInterface),
    >,
}

impl IUnityInterfaces {
    /// Look up an interface by GUID. Returns null when the host lacks it.
    ///
    /// # Safety
    ///
    /// `self` must be the registry passed to `UnityPluginLoad`.
    pub unsafe fn get<T: UnityInterface>(&self) -> *mut T {
        let guid = T::GUID;
        let raw = match (self.GetInterfaceSplit, self.GetInterface) {
            (Some(split), _) => unsafe { split(guid.high, guid.low) },
            (None, Some(get)) => unsafe { get(guid) },
            (None, None) => std::ptr::null_mut(),
        };
        raw.cast()
    }
}

// =====================================================================
// Graphics
// =====================================================================

/// `UnityGfxRenderer`
pub type UnityGfxRenderer = c_int;

pub const kUnityGfxRendererD3D11: UnityGfxRenderer = 2;
pub const kUnityGfxRendererNull: UnityGfxRenderer = 4;
pub const kUnityGfxRendererOpenGLES30: UnityGfxRenderer = 11;
pub const kUnityGfxRendererMetal: UnityGfxRenderer = 16;
pub const kUnityGfxRendererOpenGLCore: UnityGfxRenderer = 17;
pub const kUnityGfxRendererD3D12: UnityGfxRenderer = 18;
pub const kUnityGfxRendererVulkan: UnityGfxRenderer = 21;

/// `UnityGfxDeviceEventType`
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromPrimitive)]
pub enum UnityGfxDeviceEventType {
    Initialize = 0,
    Shutdown = 1,
    BeforeReset = 2,
    AfterReset = 3,
}

pub type IUnityGraphicsDeviceEventCallback = unsafe extern "system" fn(event_type: c_int);

/// `UnityRenderingEventAndData`
pub type UnityRenderingEventAndData = unsafe extern "system" fn(event_id: c_int, data: *mut c_void);

#[repr(C)]
pub struct IUnityGraphics {
    pub GetRenderer: Option<unsafe extern "system" fn() -> UnityGfxRenderer>,
    pub RegisterDeviceEventCallback:
        Option<unsafe extern "system" fn(callback: IUnityGraphicsDeviceEventCallback)>,
    pub UnregisterDeviceEventCallback:
        Option<unsafe extern "system" fn(callback: IUnityGraphicsDeviceEventCallback)>,
    /// Reserves `count` consecutive render-event ids; returns the first one.
    pub ReserveEventIDRange: Option<unsafe extern "system" fn(count: c_int) -> c_int>,
}

impl UnityInterface for IUnityGraphics {
    const GUID: UnityInterfaceGUID = UnityInterfaceGUID::new(0x7CBA0A9CA4DDB544, 0x8C5AD4926EB17B11);
}

/// Opaque in this bridge; only ever passed through.
pub type UnityRenderBuffer = *mut c_void;

#[repr(C)]
pub struct IUnityGraphicsD3D12v5 {
    /// `ID3D12Device*`
    pub GetDevice: Option<unsafe extern "system" fn() -> *mut c_void>,
    /// `ID3D12Fence*`
    pub GetFrameFence: Option<unsafe extern "system" fn() -> *mut c_void>,
    pub GetNextFrameFenceValue: Option<unsafe extern "system" fn() -> u64>,
    pub ExecuteCommandList: Option<
        unsafe extern "system" fn(command_list: *mut c_void, state_count: c_int, states: *mut c_void)
            -> u64,
    >,
    pub SetPhysicalVideoMemoryControlValues:
        Option<unsafe extern "system" fn(mem_info: *const c_void)>,
    /// `ID3D12CommandQueue*`
    pub GetCommandQueue: Option<unsafe extern "system" fn() -> *mut c_void>,
    /// `ID3D12Resource*`
    pub TextureFromRenderBuffer:
        Option<unsafe extern "system" fn(render_buffer: UnityRenderBuffer) -> *mut c_void>,
}

impl UnityInterface for IUnityGraphicsD3D12v5 {
    const GUID: UnityInterfaceGUID = UnityInterfaceGUID::new(0xF5C8D8A37D37BC42, 0xB02DFE93B5064A27);
}

// =====================================================================
// Log
// =====================================================================

/// `UnityLogType`
pub type UnityLogType = c_int;

pub const kUnityLogTypeError: UnityLogType = 0;
pub const kUnityLogTypeWarning: UnityLogType = 2;
pub const kUnityLogTypeLog: UnityLogType = 3;
pub const kUnityLogTypeException: UnityLogType = 4;

#[repr(C)]
pub struct IUnityLog {
    pub Log: Option<
        unsafe extern "system" fn(
            log_type: UnityLogType,
            message: *const c_char,
            file_name: *const c_char,
            file_line: c_int,
        ),
    >,
}

impl UnityInterface for IUnityLog {
    const GUID: UnityInterfaceGUID = UnityInterfaceGUID::new(0x9E7507FA5B444D5D, 0x92FB979515EA83FC);
}
