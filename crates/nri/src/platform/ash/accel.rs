use crate::error::NriError;
use crate::handle::ResourceHandle;
use crate::platform::ash::command::AshCommandBuffer;
use crate::platform::ash::nri::AshNri;
use crate::platform::{Blas, Tlas};

/// Acceleration structures are not supported by this backend, creating one fails.
pub enum AshBlas {}

impl Blas<AshNri> for AshBlas {
	fn build(&mut self, _: &mut AshCommandBuffer) -> Result<(), NriError> {
		match *self {}
	}
}

/// See [`AshBlas`].
pub enum AshTlas {}

impl Tlas<AshNri> for AshTlas {
	fn build(&mut self, _: &mut AshCommandBuffer) -> Result<(), NriError> {
		match *self {}
	}

	fn handle(&self) -> ResourceHandle {
		match *self {}
	}
}
