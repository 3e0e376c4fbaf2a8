mod admin_state;
mod prompter;

pub use admin_state::*;
pub use prompter::*;
