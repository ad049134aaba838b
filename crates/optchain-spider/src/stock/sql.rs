use super::quotes::Column;
use tokio_postgres::types::Type;

//////////////////////////////////////////////////////////////////
// option quotes
//////////////////////////////////////////////////////////////////

/// `OptionQuotes` holds one row per option contract per pricing run.
pub static OPTION_QUOTES: &str = "\"OptionQuotes\"";

/// `CREATE TABLE` for `OptionQuotes` with exactly `columns`, in that order.
pub fn create_option_quotes(columns: &[Column]) -> String {
    let definitions = columns
        .iter()
        .map(|column| format!("    {} {}", column.ident(), column.sql_type().ddl()))
        .collect::<Vec<String>>()
        .join(",\n");

    format!("CREATE TABLE IF NOT EXISTS {OPTION_QUOTES} (\n{definitions}\n)")
}

/// `INSERT` naming every column, so a row bound in `columns` order always lands in the
/// matching columns.
pub fn insert_option_quote(columns: &[Column]) -> String {
    let names = columns
        .iter()
        .map(Column::ident)
        .collect::<Vec<String>>()
        .join(", ");
    let placeholders = columns
        .iter()
        .enumerate()
        .map(|(i, column)| column.sql_type().placeholder(i + 1))
        .collect::<Vec<String>>()
        .join(", ");

    format!("INSERT INTO {OPTION_QUOTES} ({names}) VALUES ({placeholders})")
}

/// Parameter types of [`insert_option_quote`].
pub fn insert_param_types(columns: &[Column]) -> Vec<Type> {
    columns
        .iter()
        .map(|column| column.sql_type().param_type())
        .collect()
}
