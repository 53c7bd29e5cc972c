mod nri;

pub use nri::*;

pub mod ash;
