use std::fmt::{Debug, Formatter};
use thiserror::Error;

/// Where a window is within its frame. Only one frame is ever in flight.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub enum FrameState {
	#[default]
	Idle,
	/// a swapchain image was acquired
	Acquired,
	/// the acquired image was transitioned for rendering and commands are being recorded
	Recording,
	/// the frame was submitted and handed to the presentation engine
	Presented,
}

#[derive(Copy, Clone, Error, Eq, PartialEq)]
pub enum FrameError {
	#[error("end_frame called without a matching begin_frame")]
	NotBegun,
	#[error("begin_frame called while frame is {0:?}")]
	AlreadyBegun(FrameState),
	#[error("No swapchain image available")]
	NoRenderTarget,
}

impl Debug for FrameError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		std::fmt::Display::fmt(self, f)
	}
}

/// Enforces the frame protocol `Idle -> Acquired -> Recording -> Presented -> Idle`.
#[derive(Copy, Clone, Debug, Default)]
pub struct FrameTracker {
	state: FrameState,
	frames_presented: u64,
}

impl FrameTracker {
	pub fn state(&self) -> FrameState {
		self.state
	}

	pub fn frames_presented(&self) -> u64 {
		self.frames_presented
	}

	pub fn is_recording(&self) -> bool {
		self.state == FrameState::Recording
	}

	pub fn acquired(&mut self) -> Result<(), FrameError> {
		match self.state {
			FrameState::Idle => {
				self.state = FrameState::Acquired;
				Ok(())
			}
			state => Err(FrameError::AlreadyBegun(state)),
		}
	}

	pub fn recording(&mut self) -> Result<(), FrameError> {
		match self.state {
			FrameState::Acquired => {
				self.state = FrameState::Recording;
				Ok(())
			}
			FrameState::Idle | FrameState::Presented => Err(FrameError::NotBegun),
			state => Err(FrameError::AlreadyBegun(state)),
		}
	}

	/// Moves an acquired frame to [`FrameState::Recording`] if `started` succeeded. Otherwise the frame is abandoned,
	/// so a failure while starting to record does not block the next `begin_frame`.
	pub fn start_recording<E: From<FrameError>>(&mut self, started: Result<(), E>) -> Result<(), E> {
		match started {
			Ok(()) => Ok(self.recording()?),
			Err(e) => {
				self.finish();
				Err(e)
			}
		}
	}

	/// Checks that a frame is being recorded before `end_frame` touches any GPU state.
	pub fn ensure_recording(&self) -> Result<(), FrameError> {
		match self.state {
			FrameState::Recording => Ok(()),
			_ => Err(FrameError::NotBegun),
		}
	}

	pub fn presented(&mut self) -> Result<(), FrameError> {
		self.ensure_recording()?;
		self.state = FrameState::Presented;
		Ok(())
	}

	/// Returns to [`FrameState::Idle`], after presenting or after the frame was abandoned.
	pub fn finish(&mut self) {
		if self.state == FrameState::Presented {
			self.frames_presented += 1;
		}
		self.state = FrameState::Idle;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_frame_cycle() {
		let mut frame = FrameTracker::default();
		for i in 0..3 {
			assert_eq!(frame.state(), FrameState::Idle);
			frame.acquired().unwrap();
			frame.recording().unwrap();
			assert!(frame.is_recording());
			frame.presented().unwrap();
			assert_eq!(frame.state(), FrameState::Presented);
			frame.finish();
			assert_eq!(frame.frames_presented(), i + 1);
		}
	}

	#[test]
	fn test_end_without_begin() {
		let mut frame = FrameTracker::default();
		assert_eq!(frame.ensure_recording(), Err(FrameError::NotBegun));
		assert_eq!(frame.presented(), Err(FrameError::NotBegun));
		assert_eq!(frame.state(), FrameState::Idle);

		// ending twice is rejected the same way
		frame.acquired().unwrap();
		frame.recording().unwrap();
		frame.presented().unwrap();
		frame.finish();
		assert_eq!(frame.presented(), Err(FrameError::NotBegun));
		assert_eq!(frame.frames_presented(), 1);
	}

	#[test]
	fn test_begin_twice() {
		let mut frame = FrameTracker::default();
		frame.acquired().unwrap();
		frame.recording().unwrap();
		assert_eq!(frame.acquired(), Err(FrameError::AlreadyBegun(FrameState::Recording)));
		assert!(frame.is_recording());
	}

	#[test]
	fn test_abandoned_frame() {
		let mut frame = FrameTracker::default();
		frame.acquired().unwrap();
		frame.finish();
		assert_eq!(frame.state(), FrameState::Idle);
		assert_eq!(frame.frames_presented(), 0);
		frame.acquired().unwrap();
	}

	#[test]
	fn test_failed_start_abandons_frame() {
		let mut frame = FrameTracker::default();
		frame.acquired().unwrap();
		assert_eq!(
			frame.start_recording(Err(FrameError::NoRenderTarget)),
			Err(FrameError::NoRenderTarget)
		);
		assert_eq!(frame.state(), FrameState::Idle);

		frame.acquired().unwrap();
		frame.start_recording::<FrameError>(Ok(())).unwrap();
		assert!(frame.is_recording());
		frame.presented().unwrap();
		frame.finish();
		assert_eq!(frame.frames_presented(), 1);
	}
}
