//! Creating `fxed-nri` windows from `winit` windows.

use anyhow::Context;
use fxed_nri::factory::{CreateBits, NriCreateInfo};
use fxed_nri::platform::{Nri, Window as NriWindow, WindowCreateInfo};
use std::sync::Arc;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::ActiveEventLoop;
use winit::raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::Window;

/// [`NriCreateInfo`] with surface support for the display of `event_loop`.
pub fn nri_create_info(event_loop: &ActiveEventLoop) -> anyhow::Result<NriCreateInfo> {
	let display_handle = event_loop
		.display_handle()
		.context("Event loop has no display handle")?
		.as_raw();
	Ok(NriCreateInfo {
		bits: CreateBits::WINIT,
		display_handle: Some(display_handle),
		..NriCreateInfo::default()
	})
}

pub fn extent(size: PhysicalSize<u32>) -> [u32; 2] {
	[size.width, size.height]
}

/// A backend window together with the `winit` window it presents to, which it keeps alive.
pub struct WinitNriWindow<N: Nri> {
	// dropped before the winit window, the surface must not outlive its window
	nri_window: N::Window,
	window: Arc<Window>,
}

impl<N: Nri> WinitNriWindow<N> {
	/// Creates the surface and swapchain. The extent of `info` is replaced by the window's inner size.
	pub fn new(nri: &N, window: Arc<Window>, info: WindowCreateInfo) -> anyhow::Result<Self> {
		let display_handle = window.display_handle().context("Window has no display handle")?.as_raw();
		let window_handle = window.window_handle().context("Window has no window handle")?.as_raw();
		let info = WindowCreateInfo {
			extent: extent(window.inner_size()),
			..info
		};
		// SAFETY: the window is kept alive by Self and outlives nri_window
		let nri_window = unsafe { nri.create_window(display_handle, window_handle, &info)? };
		Ok(Self { nri_window, window })
	}

	pub fn window(&self) -> &Arc<Window> {
		&self.window
	}

	pub fn nri_window(&mut self) -> &mut N::Window {
		&mut self.nri_window
	}

	/// Forwards resizes to the backend window. Returns true if the window has an area to render to.
	pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
		if let WindowEvent::Resized(size) = event {
			log::debug!("Window resized to {}x{}", size.width, size.height);
			self.nri_window.resize(extent(*size));
		}
		self.is_visible()
	}

	pub fn is_visible(&self) -> bool {
		let size = self.window.inner_size();
		size.width > 0 && size.height > 0
	}
}
