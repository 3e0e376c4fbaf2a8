//! Process topology: one supervisor, N independent single-session workers.
//! Workers share nothing but the external store and cache.

mod supervisor;
mod worker;

pub use supervisor::*;
pub use worker::*;
