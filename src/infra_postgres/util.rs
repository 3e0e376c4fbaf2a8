use anyhow::{Result, anyhow};

/// Table and column names of the user records, already quoted for SQL.
#[derive(Debug, Clone)]
pub struct UserSchema {
    pub table: String,
    pub identifier: String,
    pub flag: String,
}

impl UserSchema {
    pub fn new(table: &str, identifier: &str, flag: &str) -> Result<Self> {
        Ok(UserSchema {
            table: quote_ident(table)?,
            identifier: quote_ident(identifier)?,
            flag: quote_ident(flag)?,
        })
    }
}

// Only plain names are accepted, so quoting never needs escaping. Quoting
// is still required: `user` is reserved in Postgres.
fn quote_ident(name: &str) -> Result<String> {
    let mut chars = name.chars();
    let plain = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !plain || name.len() > 63 {
        return Err(anyhow!("not a plain SQL identifier: {name:?}"));
    }
    Ok(format!("\"{name}\""))
}
