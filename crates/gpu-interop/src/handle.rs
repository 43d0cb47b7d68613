//! Non-null opaque GPU object pointers exchanged with the host engine.
//!
//! None of these own a reference. Whoever produced the pointer (the engine,
//! or the caller that received a freshly created texture) keeps it alive.

use std::ffi::c_void;

macro_rules! opaque_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[repr(transparent)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(*mut c_void);

        impl $name {
            /// Wrap a raw pointer; `None` if it is null.
            pub fn from_raw(raw: *mut c_void) -> Option<Self> {
                (!raw.is_null()).then_some(Self(raw))
            }

            pub fn as_raw(self) -> *mut c_void {
                self.0
            }

            /// Borrow the pointer slot, as COM borrow helpers expect.
            pub fn raw_ref(&self) -> &*mut c_void {
                &self.0
            }
        }

        // SAFETY: the pointee is a free-threaded driver object; this type
        // never dereferences it on its own.
        unsafe impl Send for $name {}
        unsafe impl Sync for $name {}
    };
}

opaque_handle!(
    /// `ID3D12Device*` owned by the engine.
    DeviceHandle
);

opaque_handle!(
    /// `ID3D12CommandQueue*` owned by the engine.
    QueueHandle
);

opaque_handle!(
    /// A native texture resource (`ID3D12Resource*` for textures this crate
    /// creates; any COM texture for handles coming back from the engine).
    TextureHandle
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_pointers_are_rejected() {
        assert!(DeviceHandle::from_raw(std::ptr::null_mut()).is_none());
        let mut value = 7u32;
        let raw = (&mut value as *mut u32).cast::<c_void>();
        let handle = QueueHandle::from_raw(raw).unwrap();
        assert_eq!(handle.as_raw(), raw);
        assert_eq!(*handle.raw_ref(), raw);
    }
}
