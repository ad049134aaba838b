use super::common::{format_datetime, format_timestamp};
use crate::error::SpiderError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio_postgres::types::Type;

// columns
// ----------------------------------------------------------------------------

/// A column of the `OptionQuotes` table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Column {
    Ask,
    Bid,
    Change,
    ContractSize,
    ContractSymbol,
    Currency,
    Expiration,
    ImpliedVolatility,
    InTheMoney,
    LastPrice,
    LastTradeDate,
    OpenInterest,
    PercentChange,
    Strike,
    Volume,
    PricingDate,
    Underlying,
    UnderlyingPrice,
    Type,
    Mid,
}

/// Full column order of `OptionQuotes`; the canonical table layout.
pub const FULL_COLUMNS: [Column; 20] = [
    Column::Ask,
    Column::Bid,
    Column::Change,
    Column::ContractSize,
    Column::ContractSymbol,
    Column::Currency,
    Column::Expiration,
    Column::ImpliedVolatility,
    Column::InTheMoney,
    Column::LastPrice,
    Column::LastTradeDate,
    Column::OpenInterest,
    Column::PercentChange,
    Column::Strike,
    Column::Volume,
    Column::PricingDate,
    Column::Underlying,
    Column::UnderlyingPrice,
    Column::Type,
    Column::Mid,
];

/// Older table layout without the derived columns.
pub const LEGACY_COLUMNS: [Column; 15] = [
    Column::Ask,
    Column::Bid,
    Column::Change,
    Column::ContractSize,
    Column::ContractSymbol,
    Column::Currency,
    Column::Expiration,
    Column::ImpliedVolatility,
    Column::InTheMoney,
    Column::LastPrice,
    Column::LastTradeDate,
    Column::OpenInterest,
    Column::PercentChange,
    Column::Strike,
    Column::Volume,
];

/// Storage class of a column, shared by the DDL and the prepared INSERT.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SqlType {
    Float,
    BigInt,
    Bool,
    Text,
    /// Bound as canonical text, cast to `TIMESTAMP` by the statement.
    DateTime,
}

impl SqlType {
    pub fn ddl(&self) -> &'static str {
        match self {
            SqlType::Float => "DOUBLE PRECISION",
            SqlType::BigInt => "BIGINT",
            SqlType::Bool => "BOOLEAN",
            SqlType::Text => "TEXT",
            SqlType::DateTime => "TIMESTAMP",
        }
    }

    /// Type the statement parameter is prepared with.
    pub fn param_type(&self) -> Type {
        match self {
            SqlType::Float => Type::FLOAT8,
            SqlType::BigInt => Type::INT8,
            SqlType::Bool => Type::BOOL,
            SqlType::Text | SqlType::DateTime => Type::TEXT,
        }
    }

    /// Placeholder expression for parameter `$n`.
    pub fn placeholder(&self, n: usize) -> String {
        match self {
            SqlType::DateTime => format!("${n}::timestamp"),
            _ => format!("${n}"),
        }
    }
}

impl Column {
    /// Column name as declared in the table (and as named by the provider).
    pub fn name(&self) -> &'static str {
        match self {
            Column::Ask => "ask",
            Column::Bid => "bid",
            Column::Change => "change",
            Column::ContractSize => "contractSize",
            Column::ContractSymbol => "contractSymbol",
            Column::Currency => "currency",
            Column::Expiration => "expiration",
            Column::ImpliedVolatility => "impliedVolatility",
            Column::InTheMoney => "inTheMoney",
            Column::LastPrice => "lastPrice",
            Column::LastTradeDate => "lastTradeDate",
            Column::OpenInterest => "openInterest",
            Column::PercentChange => "percentChange",
            Column::Strike => "strike",
            Column::Volume => "volume",
            Column::PricingDate => "pricingDate",
            Column::Underlying => "underlying",
            Column::UnderlyingPrice => "underlyingPrice",
            Column::Type => "type",
            Column::Mid => "mid",
        }
    }

    pub fn sql_type(&self) -> SqlType {
        match self {
            Column::Ask
            | Column::Bid
            | Column::Change
            | Column::ImpliedVolatility
            | Column::LastPrice
            | Column::PercentChange
            | Column::Strike
            | Column::UnderlyingPrice
            | Column::Mid => SqlType::Float,
            Column::OpenInterest | Column::Volume => SqlType::BigInt,
            Column::InTheMoney => SqlType::Bool,
            Column::ContractSize
            | Column::ContractSymbol
            | Column::Currency
            | Column::Underlying
            | Column::Type => SqlType::Text,
            Column::Expiration | Column::LastTradeDate | Column::PricingDate => SqlType::DateTime,
        }
    }

    /// Quoted identifier; the names are camelCase so they must be quoted in Postgres.
    pub fn ident(&self) -> String {
        format!("\"{}\"", self.name())
    }
}

impl std::str::FromStr for Column {
    type Err = SpiderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FULL_COLUMNS
            .iter()
            .find(|column| column.name().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| SpiderError::config(format!("unknown OptionQuotes column \"{s}\"")))
    }
}

/// Parse a column set: `full`, `legacy`, or a comma separated list of column names.
pub fn parse_columns(value: &str) -> Result<Vec<Column>, SpiderError> {
    let columns = match value.trim() {
        "full" => FULL_COLUMNS.to_vec(),
        "legacy" => LEGACY_COLUMNS.to_vec(),
        list => list
            .split(',')
            .filter(|name| !name.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Column>, _>>()?,
    };

    if columns.is_empty() {
        return Err(SpiderError::config("column list is empty"));
    }
    for (i, column) in columns.iter().enumerate() {
        if columns[..i].contains(column) {
            return Err(SpiderError::config(format!(
                "column \"{}\" listed twice",
                column.name()
            )));
        }
    }

    Ok(columns)
}

/// A single bound value of an `OptionQuotes` row.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnValue {
    Float(f64),
    Int(i64),
    Bool(bool),
    Text(String),
    /// Canonical `YYYY-MM-DD HH:MM:SS` string.
    DateTime(String),
}

// de
// ----------------------------------------------------------------------------

/// One contract of an options chain, as the provider reports it.
///
/// Every field is optional on the wire; [`QuoteRecord::from_entry`] decides which are required.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractQuote {
    pub contract_symbol: Option<String>,
    pub contract_size: Option<String>,
    pub currency: Option<String>,
    pub strike: Option<f64>,
    pub expiration: Option<i64>,
    pub in_the_money: Option<bool>,
    pub ask: Option<f64>,
    pub bid: Option<f64>,
    pub last_price: Option<f64>,
    pub change: Option<f64>,
    pub percent_change: Option<f64>,
    pub implied_volatility: Option<f64>,
    pub open_interest: Option<i64>,
    pub volume: Option<i64>,
    pub last_trade_date: Option<i64>,
}

/// A contract joined with the underlying it was quoted against.
#[derive(Clone, Debug)]
pub struct ChainEntry {
    pub underlying: String,
    pub underlying_price: f64,
    pub contract: ContractQuote,
}

// output
// ----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    /// Infer the side of a contract from moneyness: above the strike only calls are in the
    /// money, below it only puts are.
    pub fn classify(underlying_price: f64, strike: f64, in_the_money: bool) -> Self {
        if (underlying_price > strike && in_the_money)
            || (underlying_price < strike && !in_the_money)
        {
            OptionType::Call
        } else {
            OptionType::Put
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "call",
            OptionType::Put => "put",
        }
    }
}

pub fn mid(ask: f64, bid: f64) -> f64 {
    (ask + bid) / 2.0
}

/// A normalised `OptionQuotes` row.
#[derive(Clone, Debug, PartialEq)]
pub struct QuoteRecord {
    pub ask: f64,
    pub bid: f64,
    pub change: f64,
    pub contract_size: String,
    pub contract_symbol: String,
    pub currency: String,
    pub expiration: String,
    pub implied_volatility: f64,
    pub in_the_money: bool,
    pub last_price: f64,
    pub last_trade_date: String,
    pub open_interest: i64,
    pub percent_change: f64,
    pub strike: f64,
    pub volume: i64,
    pub pricing_date: String,
    pub underlying: String,
    pub underlying_price: f64,
    pub option_type: OptionType,
    pub mid: f64,
}

fn required<T>(value: &Option<T>, field: &str, contract: &str) -> Result<T, SpiderError>
where
    T: Clone,
{
    value
        .clone()
        .ok_or_else(|| SpiderError::transform(format!("missing field `{field}` in {contract}")))
}

impl QuoteRecord {
    /// Normalise a provider entry; `pricing_time` is stamped as `pricingDate`.
    pub fn from_entry(
        entry: &ChainEntry,
        pricing_time: DateTime<Utc>,
    ) -> Result<Self, SpiderError> {
        let c = &entry.contract;
        let contract_symbol = c
            .contract_symbol
            .clone()
            .ok_or_else(|| SpiderError::transform("missing field `contractSymbol`"))?;
        let id = contract_symbol.as_str();

        if !entry.underlying_price.is_finite() {
            return Err(SpiderError::transform(format!(
                "invalid underlying price {} for {id}",
                entry.underlying_price
            )));
        }

        let ask = required(&c.ask, "ask", id)?;
        let bid = required(&c.bid, "bid", id)?;
        let strike = required(&c.strike, "strike", id)?;
        let in_the_money = required(&c.in_the_money, "inTheMoney", id)?;

        Ok(QuoteRecord {
            ask,
            bid,
            change: required(&c.change, "change", id)?,
            contract_size: required(&c.contract_size, "contractSize", id)?,
            currency: required(&c.currency, "currency", id)?,
            expiration: format_timestamp(required(&c.expiration, "expiration", id)?)?,
            implied_volatility: required(&c.implied_volatility, "impliedVolatility", id)?,
            in_the_money,
            last_price: required(&c.last_price, "lastPrice", id)?,
            last_trade_date: format_timestamp(required(&c.last_trade_date, "lastTradeDate", id)?)?,
            // omitted by the provider when nothing has traded
            open_interest: c.open_interest.unwrap_or(0),
            percent_change: required(&c.percent_change, "percentChange", id)?,
            strike,
            volume: c.volume.unwrap_or(0),
            pricing_date: format_datetime(pricing_time),
            underlying: entry.underlying.clone(),
            underlying_price: entry.underlying_price,
            option_type: OptionType::classify(entry.underlying_price, strike, in_the_money),
            mid: mid(ask, bid),
            contract_symbol,
        })
    }

    pub fn value(&self, column: Column) -> ColumnValue {
        use ColumnValue as V;
        match column {
            Column::Ask => V::Float(self.ask),
            Column::Bid => V::Float(self.bid),
            Column::Change => V::Float(self.change),
            Column::ContractSize => V::Text(self.contract_size.clone()),
            Column::ContractSymbol => V::Text(self.contract_symbol.clone()),
            Column::Currency => V::Text(self.currency.clone()),
            Column::Expiration => V::DateTime(self.expiration.clone()),
            Column::ImpliedVolatility => V::Float(self.implied_volatility),
            Column::InTheMoney => V::Bool(self.in_the_money),
            Column::LastPrice => V::Float(self.last_price),
            Column::LastTradeDate => V::DateTime(self.last_trade_date.clone()),
            Column::OpenInterest => V::Int(self.open_interest),
            Column::PercentChange => V::Float(self.percent_change),
            Column::Strike => V::Float(self.strike),
            Column::Volume => V::Int(self.volume),
            Column::PricingDate => V::DateTime(self.pricing_date.clone()),
            Column::Underlying => V::Text(self.underlying.clone()),
            Column::UnderlyingPrice => V::Float(self.underlying_price),
            Column::Type => V::Text(self.option_type.as_str().to_string()),
            Column::Mid => V::Float(self.mid),
        }
    }

    /// Values of the record, in the order of `columns`.
    pub fn row(&self, columns: &[Column]) -> Vec<ColumnValue> {
        columns.iter().map(|column| self.value(*column)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(underlying_price: f64, strike: f64, in_the_money: bool) -> ChainEntry {
        ChainEntry {
            underlying: "AAPL".into(),
            underlying_price,
            contract: ContractQuote {
                contract_symbol: Some("AAPL240621C00100000".into()),
                contract_size: Some("REGULAR".into()),
                currency: Some("USD".into()),
                strike: Some(strike),
                expiration: Some(1_718_928_000),
                in_the_money: Some(in_the_money),
                ask: Some(10.0),
                bid: Some(8.0),
                last_price: Some(9.15),
                change: Some(-0.35),
                percent_change: Some(-3.68),
                implied_volatility: Some(0.2751),
                open_interest: Some(1520),
                volume: Some(87),
                last_trade_date: Some(1_718_898_659),
            },
        }
    }

    fn pricing_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 20, 21, 0, 0).unwrap()
    }

    #[test]
    fn mid_of_ask_and_bid() {
        assert_eq!(mid(10.0, 8.0), 9.0);
        let record = QuoteRecord::from_entry(&entry(105.0, 100.0, true), pricing_time()).unwrap();
        assert_eq!(record.mid, 9.0);
    }

    #[test]
    fn classifies_type_from_moneyness() {
        assert_eq!(OptionType::classify(105.0, 100.0, true), OptionType::Call);
        assert_eq!(OptionType::classify(95.0, 100.0, false), OptionType::Call);
        assert_eq!(OptionType::classify(105.0, 100.0, false), OptionType::Put);
        assert_eq!(OptionType::classify(95.0, 100.0, true), OptionType::Put);
        // at the money nothing can be told apart
        assert_eq!(OptionType::classify(100.0, 100.0, true), OptionType::Put);

        let call = QuoteRecord::from_entry(&entry(105.0, 100.0, true), pricing_time()).unwrap();
        assert_eq!(call.value(Column::Type), ColumnValue::Text("call".into()));
    }

    #[test]
    fn in_the_money_below_strike_is_a_put() {
        let put = QuoteRecord::from_entry(&entry(95.0, 100.0, true), pricing_time()).unwrap();
        assert_eq!(put.option_type, OptionType::Put);
    }

    #[test]
    fn converts_dates_and_stamps_pricing_date() {
        let record = QuoteRecord::from_entry(&entry(105.0, 100.0, true), pricing_time()).unwrap();
        assert_eq!(record.expiration, "2024-06-21 00:00:00");
        assert_eq!(record.last_trade_date, "2024-06-20 15:50:59");
        assert_eq!(record.pricing_date, "2024-06-20 21:00:00");
        assert_eq!(record.underlying, "AAPL");
        assert_eq!(record.underlying_price, 105.0);
    }

    #[test]
    fn missing_activity_defaults_to_zero() {
        let mut e = entry(105.0, 100.0, true);
        e.contract.volume = None;
        e.contract.open_interest = None;
        let record = QuoteRecord::from_entry(&e, pricing_time()).unwrap();
        assert_eq!(record.volume, 0);
        assert_eq!(record.open_interest, 0);
    }

    #[test]
    fn missing_required_field_is_a_transform_error() {
        let mut e = entry(105.0, 100.0, true);
        e.contract.bid = None;
        let err = QuoteRecord::from_entry(&e, pricing_time()).unwrap_err();
        assert!(matches!(err, SpiderError::Transform(_)));
        assert!(err.to_string().contains("`bid`"), "{err}");

        let mut e = entry(105.0, 100.0, true);
        e.contract.contract_symbol = None;
        assert!(matches!(
            QuoteRecord::from_entry(&e, pricing_time()),
            Err(SpiderError::Transform(_))
        ));

        let mut e = entry(f64::NAN, 100.0, true);
        e.contract.contract_symbol = Some("X".into());
        assert!(QuoteRecord::from_entry(&e, pricing_time()).is_err());
    }

    #[test]
    fn row_follows_column_order() {
        let record = QuoteRecord::from_entry(&entry(105.0, 100.0, true), pricing_time()).unwrap();

        let full = record.row(&FULL_COLUMNS);
        assert_eq!(full.len(), 20);
        assert_eq!(full[0], ColumnValue::Float(10.0));
        assert_eq!(full[4], ColumnValue::Text("AAPL240621C00100000".into()));
        assert_eq!(full[6], ColumnValue::DateTime("2024-06-21 00:00:00".into()));
        assert_eq!(full[8], ColumnValue::Bool(true));
        assert_eq!(full[14], ColumnValue::Int(87));
        assert_eq!(full[19], ColumnValue::Float(9.0));

        let custom = record.row(&[Column::Mid, Column::Strike]);
        assert_eq!(custom, vec![ColumnValue::Float(9.0), ColumnValue::Float(100.0)]);
        assert_eq!(record.row(&LEGACY_COLUMNS), full[..15].to_vec());
    }

    #[test]
    fn parses_column_sets() {
        assert_eq!(parse_columns("full").unwrap(), FULL_COLUMNS.to_vec());
        assert_eq!(parse_columns("legacy").unwrap(), LEGACY_COLUMNS.to_vec());
        assert_eq!(
            parse_columns("contractSymbol, mid,type").unwrap(),
            vec![Column::ContractSymbol, Column::Mid, Column::Type]
        );
        assert!(parse_columns("ask,nope").is_err());
        assert!(parse_columns("ask,ask").is_err());
        assert!(parse_columns(" , ").is_err());
    }

    #[test]
    fn sql_types() {
        assert_eq!(Column::Expiration.sql_type(), SqlType::DateTime);
        assert_eq!(SqlType::DateTime.placeholder(7), "$7::timestamp");
        assert_eq!(SqlType::Float.placeholder(1), "$1");
        assert_eq!(Column::Volume.sql_type().param_type(), Type::INT8);
        assert_eq!(Column::InTheMoney.ident(), "\"inTheMoney\"");
    }
}
