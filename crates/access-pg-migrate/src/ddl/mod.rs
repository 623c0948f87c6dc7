//! DDL and COPY statement generation for the destination.
//!
//! Statements are only rendered here; executing them is the writer's job.
//! Every identifier is validated and quoted, so names with spaces, accents,
//! reserved words or embedded quotes survive verbatim.

use serde::Serialize;
use tracing::debug;

use crate::core::identifier::{qualify_pg, quote_pg};
use crate::core::schema::TargetTable;
use crate::error::{MigrateError, Result};

/// Statements needed to receive one source table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaPlan {
    /// Destination table descriptor.
    pub table: TargetTable,
    /// `CREATE SCHEMA IF NOT EXISTS ...`
    pub create_schema: String,
    /// `CREATE TABLE IF NOT EXISTS ...`
    pub create_table: String,
    /// `COPY ... FROM STDIN ...` for the bulk load.
    pub copy_statement: String,
}

/// Render `CREATE SCHEMA IF NOT EXISTS "schema"`.
pub fn create_schema_sql(schema: &str) -> Result<String> {
    Ok(format!("CREATE SCHEMA IF NOT EXISTS {}", quote_pg(schema)?))
}

/// Render `CREATE TABLE IF NOT EXISTS "schema"."table" ("col" TYPE, ...)`.
///
/// Existing tables are left untouched, never altered.
pub fn create_table_sql(table: &TargetTable) -> Result<String> {
    if table.columns.is_empty() {
        return Err(MigrateError::schema(
            table.full_name(),
            "table has no columns",
        ));
    }

    let columns = table
        .columns
        .iter()
        .map(|col| Ok(format!("{} {}", quote_pg(&col.name)?, col.column_type)))
        .collect::<Result<Vec<_>>>()?;

    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        qualify_pg(&table.schema, &table.name)?,
        columns.join(", ")
    ))
}

/// Render the text-format COPY statement used for the bulk load.
pub fn copy_sql(table: &TargetTable) -> Result<String> {
    let columns = table
        .columns
        .iter()
        .map(|col| quote_pg(&col.name))
        .collect::<Result<Vec<_>>>()?;

    Ok(format!(
        "COPY {} ({}) FROM STDIN WITH (FORMAT text, DELIMITER E'\\t', NULL '\\N')",
        qualify_pg(&table.schema, &table.name)?,
        columns.join(", ")
    ))
}

/// Plan every statement for a mapped table.
pub fn plan_schema(table: &TargetTable) -> Result<SchemaPlan> {
    let plan = SchemaPlan {
        table: table.clone(),
        create_schema: create_schema_sql(&table.schema)?,
        create_table: create_table_sql(table)?,
        copy_statement: copy_sql(table)?,
    };
    debug!("Planned DDL for {}: {}", table.full_name(), plan.create_table);
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::TargetColumn;
    use crate::typemap::TargetColumnType;

    fn table(schema: &str, name: &str, cols: &[(&str, TargetColumnType)]) -> TargetTable {
        TargetTable {
            schema: schema.to_string(),
            name: name.to_string(),
            columns: cols
                .iter()
                .map(|(n, t)| TargetColumn {
                    name: n.to_string(),
                    column_type: *t,
                })
                .collect(),
            type_warnings: Vec::new(),
        }
    }

    #[test]
    fn test_plan_schema_statements() {
        let t = table(
            "legacy",
            "Clientes",
            &[
                ("id", TargetColumnType::Integer),
                ("name", TargetColumnType::Text),
                ("amount", TargetColumnType::Numeric),
            ],
        );
        let plan = plan_schema(&t).unwrap();

        assert_eq!(plan.create_schema, "CREATE SCHEMA IF NOT EXISTS \"legacy\"");
        assert_eq!(
            plan.create_table,
            "CREATE TABLE IF NOT EXISTS \"legacy\".\"Clientes\" (\"id\" INTEGER, \"name\" TEXT, \"amount\" NUMERIC)"
        );
        assert_eq!(
            plan.copy_statement,
            "COPY \"legacy\".\"Clientes\" (\"id\", \"name\", \"amount\") FROM STDIN WITH (FORMAT text, DELIMITER E'\\t', NULL '\\N')"
        );
    }

    #[test]
    fn test_plan_is_idempotent() {
        let t = table("public", "t", &[("a", TargetColumnType::Text)]);
        let first = plan_schema(&t).unwrap();
        let second = plan_schema(&t).unwrap();
        assert_eq!(first, second);
        assert!(first.create_table.contains("IF NOT EXISTS"));
    }

    #[test]
    fn test_awkward_identifiers_are_quoted() {
        let t = table(
            "public",
            "Order Details",
            &[
                ("Unit \"Price\"", TargetColumnType::Numeric),
                ("Año", TargetColumnType::Integer),
            ],
        );
        let sql = create_table_sql(&t).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"public\".\"Order Details\" (\"Unit \"\"Price\"\"\" NUMERIC, \"Año\" INTEGER)"
        );
    }

    #[test]
    fn test_table_without_columns_is_rejected() {
        let t = table("public", "Vacia", &[]);
        let err = plan_schema(&t).unwrap_err();
        assert!(matches!(err, MigrateError::SchemaCreation { .. }));
    }

    #[test]
    fn test_invalid_identifier_is_schema_error() {
        let t = table("public", "bad\0name", &[("a", TargetColumnType::Text)]);
        assert!(matches!(
            plan_schema(&t).unwrap_err(),
            MigrateError::SchemaCreation { .. }
        ));
    }
}
