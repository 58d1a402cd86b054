//! Decisions handed to the code generator. Nothing here constructs an
//! implementation; the generator turns each decision into source code that
//! does.

mod binds;
mod component;

pub use binds::*;
pub use component::*;
