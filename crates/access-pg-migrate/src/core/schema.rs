//! Table and column descriptors for the source catalog and the destination.

use serde::{Deserialize, Serialize};

use crate::typemap::{map_column, TargetColumnType};

/// A column as reported by the legacy driver's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceColumn {
    /// Column name, verbatim.
    pub name: String,

    /// Native type name (driver-specific, may be empty).
    pub type_name: String,
}

impl SourceColumn {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// A table discovered in the source catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceTable {
    /// Table name, unique within the catalog.
    pub name: String,

    /// Columns in catalog order.
    pub columns: Vec<SourceColumn>,
}

impl SourceTable {
    pub fn new(name: impl Into<String>, columns: Vec<SourceColumn>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Column names in catalog order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// Map every column to its destination type, preserving order and names.
    ///
    /// Columns whose non-empty type name matched no rule are stored as TEXT
    /// and listed in `type_warnings`.
    pub fn to_target(&self, schema: &str) -> TargetTable {
        let mut type_warnings = Vec::new();
        let columns = self
            .columns
            .iter()
            .map(|col| {
                let mapping = map_column(col);
                type_warnings.extend(mapping.warning);
                TargetColumn {
                    name: col.name.clone(),
                    column_type: mapping.target_type,
                }
            })
            .collect();

        TargetTable {
            schema: schema.to_string(),
            name: self.name.clone(),
            columns,
            type_warnings,
        }
    }
}

/// A destination column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetColumn {
    pub name: String,
    pub column_type: TargetColumnType,
}

/// A destination table inside the target schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetTable {
    /// Target schema (namespace).
    pub schema: String,

    /// Table name, identical to the source table name.
    pub name: String,

    /// Columns in source order.
    pub columns: Vec<TargetColumn>,

    /// Type fallbacks applied while mapping the columns.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub type_warnings: Vec<String>,
}

impl TargetTable {
    /// Get the fully qualified table name (unquoted, for display).
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Column names in order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_target_preserves_order_and_names() {
        let table = SourceTable::new(
            "Pedidos",
            vec![
                SourceColumn::new("IdPedido", "COUNTER"),
                SourceColumn::new("Fecha Pedido", "DATETIME"),
                SourceColumn::new("Importe", "DECIMAL"),
                SourceColumn::new("Notas", "LONGCHAR"),
            ],
        );

        let target = table.to_target("legado");
        assert_eq!(target.full_name(), "legado.Pedidos");
        assert_eq!(
            target.column_names(),
            vec!["IdPedido", "Fecha Pedido", "Importe", "Notas"]
        );
        assert_eq!(target.columns[0].column_type, TargetColumnType::Text);
        assert_eq!(target.columns[1].column_type, TargetColumnType::Timestamp);
        assert_eq!(target.columns[2].column_type, TargetColumnType::Numeric);
        assert_eq!(target.columns[3].column_type, TargetColumnType::Text);
    }

    #[test]
    fn test_to_target_collects_type_warnings() {
        let table = SourceTable::new(
            "Fotos",
            vec![
                SourceColumn::new("Id", "INTEGER"),
                SourceColumn::new("Imagen", "LONGBINARY"),
                SourceColumn::new("Sin tipo", ""),
            ],
        );

        let target = table.to_target("legado");
        assert_eq!(target.type_warnings.len(), 1);
        assert!(target.type_warnings[0].contains("Imagen"));
        assert!(target.type_warnings[0].contains("LONGBINARY"));
    }
}
