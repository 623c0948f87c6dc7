//! Identifier validation and quoting.
//!
//! SQL identifiers (schema, table and column names) cannot be passed as
//! statement parameters, so every name that reaches generated SQL goes
//! through this module. Access allows spaces, punctuation and reserved words
//! in names; quoting keeps them verbatim on both sides.

use crate::error::{MigrateError, Result};

/// Maximum identifier length accepted before quoting.
/// - PostgreSQL truncates at 63 bytes (NAMEDATALEN - 1)
/// - Access allows 64 characters
const MAX_IDENTIFIER_LENGTH: usize = 128;

/// Validate an identifier.
///
/// Rejects empty identifiers, identifiers containing null bytes and
/// identifiers exceeding [`MAX_IDENTIFIER_LENGTH`].
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MigrateError::schema(name, "identifier cannot be empty"));
    }

    if name.contains('\0') {
        return Err(MigrateError::schema(
            name.replace('\0', "\\0"),
            "identifier contains a null byte",
        ));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(MigrateError::schema(
            name,
            format!(
                "identifier exceeds maximum length of {} bytes (got {} bytes)",
                MAX_IDENTIFIER_LENGTH,
                name.len()
            ),
        ));
    }

    Ok(())
}

/// Quote a PostgreSQL identifier.
///
/// Escapes double quotes by doubling them and wraps in double quotes.
///
/// ```
/// use access_pg_migrate::core::identifier::quote_pg;
/// assert_eq!(quote_pg("Fecha de alta").unwrap(), "\"Fecha de alta\"");
/// assert_eq!(quote_pg("a\"b").unwrap(), "\"a\"\"b\"");
/// ```
pub fn quote_pg(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name.replace('"', "\"\"")))
}

/// Qualify a PostgreSQL table name with schema.
pub fn qualify_pg(schema: &str, table: &str) -> Result<String> {
    Ok(format!("{}.{}", quote_pg(schema)?, quote_pg(table)?))
}

/// Quote an Access (Jet/ACE) identifier using brackets.
///
/// Closing brackets are doubled.
pub fn quote_access(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("[{}]", name.replace(']', "]]")))
}
