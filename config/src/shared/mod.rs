mod base;
mod destination;
mod logging;
mod pipeline;
mod source;

pub use base::*;
pub use destination::*;
pub use logging::*;
pub use pipeline::*;
pub use source::*;
