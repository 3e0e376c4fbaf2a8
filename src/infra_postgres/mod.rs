mod user_store_postgres;

pub use user_store_postgres::*;

mod util;

pub use util::UserSchema;
