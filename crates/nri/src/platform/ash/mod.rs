//! The Vulkan backend, built on `ash` with dynamic rendering and a single bindless descriptor set.

mod accel;
mod buffer;
mod command;
mod convert;
mod descriptor;
mod image;
mod init;
mod memory;
mod nri;
mod program;
mod raii;
mod swapchain;
mod window;

pub use accel::*;
pub use buffer::*;
pub use command::*;
pub use descriptor::*;
pub use image::*;
pub use init::*;
pub use memory::*;
pub use nri::*;
pub use program::*;
pub use raii::*;
pub use swapchain::*;
pub use window::*;
