//! The resource, descriptor and synchronization layer of the fxed renderer: a backend agnostic "Native Rendering
//! Interface" with a single bindless descriptor table, explicit image layout tracking and a single frame in flight
//! present loop, implemented on top of Vulkan in [`platform::ash`].

pub mod barrier;
pub mod command;
pub mod descriptor;
pub mod error;
pub mod factory;
pub mod format;
pub mod frame;
pub mod handle;
pub mod memory;
pub mod owned;
pub mod platform;
pub mod program;
pub mod shader;
pub mod upload;

pub use ash;
pub use glam;
pub use raw_window_handle;
