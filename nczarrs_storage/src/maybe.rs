//! `MaybeSend` and `MaybeSync` marker traits.
//!
//! Stores and chunk caches are shared between threads on native targets, but `wasm32` builds have no threads and may hold `!Send` handles.

#[cfg(not(target_arch = "wasm32"))]
mod platform {
    /// Alias of [`Send`] on native targets.
    pub use core::marker::Send as MaybeSend;
    /// Alias of [`Sync`] on native targets.
    pub use core::marker::Sync as MaybeSync;
}

#[cfg(target_arch = "wasm32")]
mod platform {
    /// Implemented for every type on `wasm32`.
    pub trait MaybeSend {}

    impl<T: ?Sized> MaybeSend for T {}

    /// Implemented for every type on `wasm32`.
    pub trait MaybeSync {}

    impl<T: ?Sized> MaybeSync for T {}
}

pub use platform::{MaybeSend, MaybeSync};
