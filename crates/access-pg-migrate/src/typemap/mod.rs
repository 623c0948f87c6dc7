//! Type mapping from Access native type names to PostgreSQL column types.
//!
//! The mapping is deliberately coarse: the destination only needs a column
//! type that accepts the text rendering of every source value.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::schema::SourceColumn;

/// The closed set of destination column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetColumnType {
    Text,
    Integer,
    Numeric,
    Timestamp,
}

impl TargetColumnType {
    /// SQL spelling used in DDL.
    pub fn as_sql(&self) -> &'static str {
        match self {
            TargetColumnType::Text => "TEXT",
            TargetColumnType::Integer => "INTEGER",
            TargetColumnType::Numeric => "NUMERIC",
            TargetColumnType::Timestamp => "TIMESTAMP",
        }
    }
}

impl fmt::Display for TargetColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Result of mapping a column from source to target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeMapping {
    /// Target column type.
    pub target_type: TargetColumnType,
    /// Whether no rule matched and the Text fallback was used.
    pub is_fallback: bool,
    /// Warning message for fallback mappings of non-empty type names.
    pub warning: Option<String>,
}

impl TypeMapping {
    /// Create a mapping produced by a matching rule.
    pub fn matched(target_type: TargetColumnType) -> Self {
        Self {
            target_type,
            is_fallback: false,
            warning: None,
        }
    }

    /// Create a fallback mapping.
    pub fn fallback(warning: Option<String>) -> Self {
        Self {
            target_type: TargetColumnType::Text,
            is_fallback: true,
            warning,
        }
    }
}

/// Apply the substring rules to a native type name. `None` means no rule matched.
fn match_rules(native: &str) -> Option<TargetColumnType> {
    let upper = native.to_ascii_uppercase();
    let has = |needle: &str| upper.contains(needle);

    if has("CHAR") || has("TEXT") {
        Some(TargetColumnType::Text)
    } else if has("INT") {
        Some(TargetColumnType::Integer)
    } else if has("DOUBLE") || has("NUMERIC") || has("DECIMAL") {
        Some(TargetColumnType::Numeric)
    } else if has("DATE") || has("TIME") {
        Some(TargetColumnType::Timestamp)
    } else {
        None
    }
}

/// Map a native type name to a destination type. First matching rule wins;
/// anything unrecognized (including an empty name) becomes Text.
pub fn map_type(native: &str) -> TargetColumnType {
    match_rules(native).unwrap_or(TargetColumnType::Text)
}

/// Map a source column, recording whether the fallback rule was used.
pub fn map_column(column: &SourceColumn) -> TypeMapping {
    match match_rules(&column.type_name) {
        Some(target_type) => TypeMapping::matched(target_type),
        None if column.type_name.is_empty() => TypeMapping::fallback(None),
        None => {
            let warning = format!(
                "column '{}' has unrecognized type '{}', stored as TEXT",
                column.name, column.type_name
            );
            warn!("{}", warning);
            TypeMapping::fallback(Some(warning))
        }
    }
}
