//! In-process adapters used by the test suites. They record every call
//! and can be told to fail; no binary wires them in.

mod session_cache_memory;
mod user_store_memory;

pub use session_cache_memory::*;
pub use user_store_memory::*;
