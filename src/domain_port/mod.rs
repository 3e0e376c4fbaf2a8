// store

mod session_cache;

pub use session_cache::*;

// repo

mod user_store;

pub use user_store::*;
