//! Helpers for building SQL text by hand.

/// Escape a SQL string literal value by doubling single quotes.
///
/// # Examples
/// ```
/// use sl_db::sql_utils::escape_sql_string;
/// assert_eq!(escape_sql_string("it's"), "it''s");
/// ```
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Replace `{table}` placeholders with prefixed table names.
///
/// # Examples
/// ```
/// use sl_db::sql_utils::prefix_tables;
/// assert_eq!(prefix_tables("SELECT * FROM {users}", "cms_"), "SELECT * FROM cms_users");
/// assert_eq!(prefix_tables("SELECT 1", "cms_"), "SELECT 1");
/// ```
pub fn prefix_tables(sql: &str, prefix: &str) -> String {
    let mut out = String::with_capacity(sql.len() + prefix.len());
    for c in sql.chars() {
        match c {
            '{' => out.push_str(prefix),
            '}' => {}
            other => out.push(other),
        }
    }
    out
}
