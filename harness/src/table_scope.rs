use crate::driver::SqlConnection;
use crate::fixtures::safe_drop_tables;
use qsql_core::TableNamer;

/// A table that lives exactly as long as this value.
///
/// Any leftover with the same name is dropped on construction, and the table
/// is dropped again when the scope goes away, whether the case returned
/// normally, bailed out with `?`, or panicked.
pub struct TableScope<'c> {
    conn: &'c dyn SqlConnection,
    name: String,
}

impl<'c> TableScope<'c> {
    pub fn new(conn: &'c dyn SqlConnection, name: String) -> Self {
        safe_drop_tables(conn, std::slice::from_ref(&name));
        Self { conn, name }
    }

    /// Scope for the table `base` of case `case` on `conn`.
    pub fn for_case(
        conn: &'c dyn SqlConnection,
        namer: &TableNamer,
        base: &str,
        case: &str,
    ) -> Self {
        Self::new(conn, namer.scoped_name(base, case, conn.name()))
    }

    pub fn table_name(&self) -> &str {
        &self.name
    }
}

impl Drop for TableScope<'_> {
    fn drop(&mut self) {
        safe_drop_tables(self.conn, std::slice::from_ref(&self.name));
    }
}
