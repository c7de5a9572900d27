mod guid;
mod session;

pub use guid::*;
pub use session::*;
