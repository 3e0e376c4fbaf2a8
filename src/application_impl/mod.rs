mod admin_state_updater;
mod line_prompter;

pub use admin_state_updater::*;
pub use line_prompter::*;
