mod counts;
mod table;

pub use counts::*;
pub use table::*;
