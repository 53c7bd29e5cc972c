//! Clears a window to a slowly changing color, one frame in flight.

use anyhow::Context;
use fxed_nri::factory::NriFactory;
use fxed_nri::glam::Vec4;
use fxed_nri::platform::ash::AshNri;
use fxed_nri::platform::{Window as _, WindowCreateInfo};
use fxed_nri_winit::{nri_create_info, WinitNriWindow};
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

struct Running {
	window: WinitNriWindow<AshNri>,
	_nri: AshNri,
}

struct App {
	running: Option<Running>,
	start: Instant,
	error: Option<anyhow::Error>,
}

impl App {
	fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<Running> {
		let window = Arc::new(
			event_loop
				.create_window(Window::default_attributes().with_title("fxed-nri demo"))
				.context("Failed to create window")?,
		);
		let nri = NriFactory::<AshNri>::with_default_backends().create(AshNri::NAME, &nri_create_info(event_loop)?)?;
		let window = WinitNriWindow::new(&nri, window, WindowCreateInfo::default())?;
		Ok(Running { window, _nri: nri })
	}

	#[profiling::function]
	fn render(&mut self) -> anyhow::Result<()> {
		let Some(running) = &mut self.running else {
			return Ok(());
		};
		if !running.window.is_visible() {
			return Ok(());
		}
		let t = self.start.elapsed().as_secs_f32();
		let window = running.window.nri_window();
		window.set_clear_color(Vec4::new(t.sin() * 0.5 + 0.5, 0.2, t.cos() * 0.5 + 0.5, 1.0));
		window.begin_frame()?;
		window.begin_rendering()?;
		window.end_rendering()?;
		window.end_frame()?;
		profiling::finish_frame!();
		Ok(())
	}

	fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
		log::error!("{:#}", error);
		self.error = Some(error);
		self.running = None;
		event_loop.exit();
	}
}

impl ApplicationHandler for App {
	fn resumed(&mut self, event_loop: &ActiveEventLoop) {
		if self.running.is_some() {
			return;
		}
		match self.init(event_loop) {
			Ok(running) => {
				running.window.window().request_redraw();
				self.running = Some(running);
			}
			Err(e) => self.fail(event_loop, e),
		}
	}

	fn window_event(&mut self, event_loop: &ActiveEventLoop, _: WindowId, event: WindowEvent) {
		if let Some(running) = &mut self.running {
			running.window.handle_event(&event);
		}
		match event {
			WindowEvent::CloseRequested => {
				self.running = None;
				event_loop.exit();
			}
			WindowEvent::RedrawRequested => {
				if let Err(e) = self.render() {
					self.fail(event_loop, e);
				} else if let Some(running) = &self.running {
					running.window.window().request_redraw();
				}
			}
			_ => {}
		}
	}
}

fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
	let event_loop = EventLoop::new()?;
	event_loop.set_control_flow(ControlFlow::Poll);
	let mut app = App {
		running: None,
		start: Instant::now(),
		error: None,
	};
	event_loop.run_app(&mut app)?;
	match app.error {
		Some(e) => Err(e),
		None => Ok(()),
	}
}
