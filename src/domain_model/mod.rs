mod session_key;
mod user;

pub use session_key::*;
pub use user::*;
