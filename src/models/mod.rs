pub mod enums;
pub mod subject;
pub mod visit;

pub use enums::*;
pub use subject::*;
pub use visit::*;
