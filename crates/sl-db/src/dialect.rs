//! Column mutation dialects
//!
//! Each backend spells "add a column" and "change a column" differently. A
//! [`ColumnDialect`] turns one logical mutation into the ordered list of
//! statements that backend needs; [`crate::mutation::SchemaMutator`] runs them.

use sl_core::{ColumnOptions, DatabaseDialect};

/// Trait for column mutation SQL generation
pub trait ColumnDialect: Send + Sync {
    /// Statements that add `column` to `table`.
    ///
    /// NOT NULL without a default on a non-empty table fails on most backends;
    /// avoiding that combination is the caller's job.
    fn add_column(
        &self,
        table: &str,
        column: &str,
        column_type: &str,
        options: &ColumnOptions,
    ) -> Vec<String>;

    /// Statements that move `column` to a freshly typed `new_column`.
    ///
    /// The old column is renamed to `<column>_old` and left in place.
    fn change_column(
        &self,
        table: &str,
        column: &str,
        new_column: &str,
        column_type: &str,
        options: &ColumnOptions,
    ) -> Vec<String>;

    /// Get the dialect name
    fn name(&self) -> &'static str;
}

/// Select the strategy for a configured dialect
pub fn dialect_for(dialect: DatabaseDialect) -> Box<dyn ColumnDialect> {
    match dialect {
        DatabaseDialect::DuckDb => Box::new(DuckDbDialect),
        DatabaseDialect::Postgres => Box::new(PostgresDialect),
        DatabaseDialect::MySql => Box::new(MySqlDialect),
    }
}

/// Keywords that differ between the PostgreSQL-style dialects
struct AlterKeywords {
    add: &'static str,
    alter: &'static str,
    rename: &'static str,
}

/// PostgreSQL and DuckDB share one statement sequence: the column is added
/// bare, then the default and NOT NULL are layered on with separate ALTERs so
/// existing rows can be back-filled in between.
fn layered_add_column(
    kw: &AlterKeywords,
    table: &str,
    column: &str,
    column_type: &str,
    options: &ColumnOptions,
) -> Vec<String> {
    let mut stmts = vec![format!(
        "ALTER TABLE {} {} {} {}",
        table, kw.add, column, column_type
    )];
    stmts.extend(layered_attributes(kw, table, column, options, true));
    stmts
}

fn layered_change_column(
    kw: &AlterKeywords,
    table: &str,
    column: &str,
    new_column: &str,
    column_type: &str,
    options: &ColumnOptions,
) -> Vec<String> {
    let old = format!("{}_old", column);
    let mut stmts = vec![
        format!("ALTER TABLE {} {} {} TO {}", table, kw.rename, column, old),
        format!(
            "ALTER TABLE {} {} {} {}",
            table, kw.add, new_column, column_type
        ),
        format!("UPDATE {} SET {} = {}", table, new_column, old),
    ];
    // Rows were just copied, so there is nothing to back-fill
    stmts.extend(layered_attributes(kw, table, new_column, options, false));
    stmts
}

fn layered_attributes(
    kw: &AlterKeywords,
    table: &str,
    column: &str,
    options: &ColumnOptions,
    backfill: bool,
) -> Vec<String> {
    let mut stmts = Vec::new();
    if let Some(default) = &options.default {
        stmts.push(format!(
            "ALTER TABLE {} {} {} SET DEFAULT {}",
            table, kw.alter, column, default
        ));
    }
    if options.not_null {
        if let (true, Some(default)) = (backfill, &options.default) {
            stmts.push(format!("UPDATE {} SET {} = {}", table, column, default));
        }
        stmts.push(format!(
            "ALTER TABLE {} {} {} SET NOT NULL",
            table, kw.alter, column
        ));
    }
    stmts
}

/// PostgreSQL dialect
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresDialect;

const POSTGRES_KEYWORDS: AlterKeywords = AlterKeywords {
    add: "ADD",
    alter: "ALTER",
    rename: "RENAME",
};

impl ColumnDialect for PostgresDialect {
    fn add_column(
        &self,
        table: &str,
        column: &str,
        column_type: &str,
        options: &ColumnOptions,
    ) -> Vec<String> {
        layered_add_column(&POSTGRES_KEYWORDS, table, column, column_type, options)
    }

    fn change_column(
        &self,
        table: &str,
        column: &str,
        new_column: &str,
        column_type: &str,
        options: &ColumnOptions,
    ) -> Vec<String> {
        layered_change_column(
            &POSTGRES_KEYWORDS,
            table,
            column,
            new_column,
            column_type,
            options,
        )
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

/// DuckDB dialect
#[derive(Debug, Default, Clone, Copy)]
pub struct DuckDbDialect;

const DUCKDB_KEYWORDS: AlterKeywords = AlterKeywords {
    add: "ADD COLUMN",
    alter: "ALTER COLUMN",
    rename: "RENAME COLUMN",
};

impl ColumnDialect for DuckDbDialect {
    fn add_column(
        &self,
        table: &str,
        column: &str,
        column_type: &str,
        options: &ColumnOptions,
    ) -> Vec<String> {
        layered_add_column(&DUCKDB_KEYWORDS, table, column, column_type, options)
    }

    fn change_column(
        &self,
        table: &str,
        column: &str,
        new_column: &str,
        column_type: &str,
        options: &ColumnOptions,
    ) -> Vec<String> {
        layered_change_column(
            &DUCKDB_KEYWORDS,
            table,
            column,
            new_column,
            column_type,
            options,
        )
    }

    fn name(&self) -> &'static str {
        "duckdb"
    }
}

/// MySQL dialect
///
/// MySQL fills existing rows with the column default itself, so attributes go
/// on the ADD (or a single MODIFY) instead of separate ALTERs.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySqlDialect;

impl MySqlDialect {
    fn column_definition(column: &str, column_type: &str, options: &ColumnOptions) -> String {
        let mut def = format!("{} {}", column, column_type);
        if options.not_null {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = &options.default {
            def.push_str(" DEFAULT ");
            def.push_str(default);
        }
        def
    }
}

impl ColumnDialect for MySqlDialect {
    fn add_column(
        &self,
        table: &str,
        column: &str,
        column_type: &str,
        options: &ColumnOptions,
    ) -> Vec<String> {
        vec![format!(
            "ALTER TABLE {} ADD {}",
            table,
            Self::column_definition(column, column_type, options)
        )]
    }

    fn change_column(
        &self,
        table: &str,
        column: &str,
        new_column: &str,
        column_type: &str,
        options: &ColumnOptions,
    ) -> Vec<String> {
        let old = format!("{}_old", column);
        let mut stmts = vec![
            format!("ALTER TABLE {} RENAME COLUMN {} TO {}", table, column, old),
            format!("ALTER TABLE {} ADD {} {}", table, new_column, column_type),
            format!("UPDATE {} SET {} = {}", table, new_column, old),
        ];
        if options.not_null || options.default.is_some() {
            stmts.push(format!(
                "ALTER TABLE {} MODIFY {}",
                table,
                Self::column_definition(new_column, column_type, options)
            ));
        }
        stmts
    }

    fn name(&self) -> &'static str {
        "mysql"
    }
}

#[cfg(test)]
#[path = "dialect_test.rs"]
mod tests;
