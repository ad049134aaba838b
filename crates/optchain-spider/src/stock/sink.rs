use super::ingest::QuoteSink;
use super::quotes::{Column, ColumnValue};
use super::sql;
use crate::error::SpiderError;
use crate::http::*;
use async_trait::async_trait;
use tokio_postgres::types::ToSql;
use tokio_postgres::Statement;
use tracing::{debug, error, trace};

/// [`QuoteSink`] over a single PostgreSQL connection.
///
/// Transactions are driven with plain `BEGIN`/`COMMIT`/`ROLLBACK` so one sink can span any
/// number of them on the borrowed client.
pub struct PgSink<'a> {
    pg_client: &'a PgClient,
    statement: Statement,
    in_transaction: bool,
}

impl<'a> PgSink<'a> {
    /// Prepare the `OptionQuotes` insert for `columns`.
    pub async fn prepare(pg_client: &'a PgClient, columns: &[Column]) -> Result<Self, SpiderError> {
        let stmt = sql::insert_option_quote(columns);
        trace!("preparing statement: {stmt}");
        let statement = pg_client
            .prepare_typed(&stmt, &sql::insert_param_types(columns))
            .await
            .map_err(|err| {
                error!("failed to prepare OptionQuotes insert, error({err})");
                err
            })?;

        Ok(Self {
            pg_client,
            statement,
            in_transaction: false,
        })
    }
}

/// Create `OptionQuotes` with `columns` if it does not exist yet.
pub async fn create_table(pg_client: &PgClient, columns: &[Column]) -> Result<(), SpiderError> {
    let stmt = sql::create_option_quotes(columns);
    debug!("creating table: {stmt}");
    pg_client.batch_execute(&stmt).await.map_err(|err| {
        error!("failed to create OptionQuotes, error({err})");
        err
    })?;
    Ok(())
}

fn as_sql(value: &ColumnValue) -> &(dyn ToSql + Sync) {
    match value {
        ColumnValue::Float(v) => v,
        ColumnValue::Int(v) => v,
        ColumnValue::Bool(v) => v,
        ColumnValue::Text(v) | ColumnValue::DateTime(v) => v,
    }
}

#[async_trait]
impl<'a> QuoteSink for PgSink<'a> {
    async fn begin(&mut self) -> Result<(), SpiderError> {
        self.pg_client.batch_execute("BEGIN").await?;
        self.in_transaction = true;
        trace!("transaction opened");
        Ok(())
    }

    async fn insert(&mut self, row: &[ColumnValue]) -> Result<(), SpiderError> {
        let expected = self.statement.params().len();
        if row.len() != expected {
            return Err(SpiderError::persistence(format!(
                "row has {} values, OptionQuotes insert expects {expected}",
                row.len()
            )));
        }

        let params: Vec<&(dyn ToSql + Sync)> = row.iter().map(as_sql).collect();
        self.pg_client.execute(&self.statement, &params).await?;
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), SpiderError> {
        self.pg_client.batch_execute("COMMIT").await?;
        self.in_transaction = false;
        trace!("transaction committed");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), SpiderError> {
        if !self.in_transaction {
            return Ok(());
        }
        self.in_transaction = false;
        self.pg_client.batch_execute("ROLLBACK").await?;
        debug!("transaction rolled back");
        Ok(())
    }
}
