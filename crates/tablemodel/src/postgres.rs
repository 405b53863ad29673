//! Blocking PostgreSQL adapter on `tokio-postgres`.
//!
//! The async client is driven by a private current-thread runtime, so each call blocks
//! until the server answers. SQL arrives with `?` placeholders and is rewritten to
//! `$1, $2, ...` before preparation.

use crate::connection::{Connection, ResultSet};
use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, TIMESTAMP_FORMAT, Value};
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rust_decimal::Decimal;
use std::error::Error;
use std::net::IpAddr;
use tokio::runtime::{Builder, Runtime};
use tokio_postgres::types::{FromSql, IsNull, Kind, ToSql, Type};
use tokio_postgres::{Client, NoTls, Row, Statement};

type BoxError = Box<dyn Error + Sync + Send>;

/// A blocking PostgreSQL connection reporting the `pgsql` driver.
pub struct PgConnection {
    // Dropped before the runtime that drives its connection task.
    client: Client,
    runtime: Runtime,
}

impl PgConnection {
    /// Connect with `NoTls` using a PostgreSQL connection URL.
    pub fn connect(database_url: &str) -> OrmResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| OrmError::Connection(e.to_string()))?;

        let (client, connection) = runtime.block_on(tokio_postgres::connect(database_url, NoTls))?;
        runtime.spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(target: "tablemodel.sql", error = %e, "postgres connection error");
            }
        });

        Ok(Self { client, runtime })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Run a batch of `;`-separated statements without parameters.
    pub fn batch_execute(&self, sql: &str) -> OrmResult<()> {
        Ok(self.runtime.block_on(self.client.batch_execute(sql))?)
    }
}

impl std::fmt::Debug for PgConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgConnection")
            .field("closed", &self.client.is_closed())
            .finish()
    }
}

impl Connection for PgConnection {
    type Statement = Statement;

    fn driver_name(&self) -> Option<String> {
        if self.client.is_closed() {
            None
        } else {
            Some("pgsql".to_string())
        }
    }

    fn prepare(&self, sql: &str) -> OrmResult<Statement> {
        let sql = rewrite_placeholders(sql);
        Ok(self.runtime.block_on(self.client.prepare(&sql))?)
    }

    fn run(&self, stmt: &Statement, params: &[Value]) -> OrmResult<ResultSet> {
        let bind: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|v| v as &(dyn ToSql + Sync)).collect();

        if stmt.columns().is_empty() {
            let affected = self.runtime.block_on(self.client.execute(stmt, &bind))?;
            return Ok(ResultSet::affected(affected));
        }

        let rows = self.runtime.block_on(self.client.query(stmt, &bind))?;
        let columns: Vec<String> = stmt.columns().iter().map(|c| c.name().to_string()).collect();
        let decoded = rows.iter().map(decode_row).collect::<OrmResult<Vec<_>>>()?;
        let count = decoded.len() as u64;
        Ok(ResultSet::new(columns, decoded, count))
    }

    fn last_insert_id(&self) -> OrmResult<Value> {
        let row = self
            .runtime
            .block_on(self.client.query_one("SELECT lastval()", &[]))?;
        Ok(Value::Int(row.try_get(0)?))
    }
}

/// Rewrite `?` placeholders to `$n`, leaving quoted text and identifiers alone.
pub(crate) fn rewrite_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0;
    let mut quote: Option<char> = None;

    for ch in sql.chars() {
        match (quote, ch) {
            (None, '\'' | '"') => {
                quote = Some(ch);
                out.push(ch);
            }
            (Some(q), c) if c == q => {
                quote = None;
                out.push(ch);
            }
            (None, '?') => {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            }
            _ => out.push(ch),
        }
    }
    out
}

fn decode_row(row: &Row) -> OrmResult<Vec<Value>> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            row.try_get::<_, Option<PgValue>>(idx)
                .map(|v| v.map_or(Value::Null, |v| v.0))
                .map_err(|e| OrmError::decode(column.name(), e.to_string()))
        })
        .collect()
}

/// A column of any type, decoded from the binary wire format.
struct PgValue(Value);

impl<'a> FromSql<'a> for PgValue {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, BoxError> {
        decode_raw(ty, raw).map(PgValue)
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn decode_raw(ty: &Type, raw: &[u8]) -> Result<Value, BoxError> {
    match ty.kind() {
        Kind::Domain(inner) => return decode_raw(inner, raw),
        Kind::Enum(_) => return Ok(Value::Text(std::str::from_utf8(raw)?.to_string())),
        Kind::Array(_) => {
            // One-dimensional arrays only; rendered as a JSON list.
            let items = Vec::<Option<PgValue>>::from_sql(ty, raw)?;
            let items: Vec<Value> = items
                .into_iter()
                .map(|v| v.map_or(Value::Null, |v| v.0))
                .collect();
            return Ok(Value::Text(serde_json::to_string(&items)?));
        }
        _ => {}
    }

    let value: Value = match *ty {
        Type::BOOL => bool::from_sql(ty, raw)?.into(),
        Type::INT2 => i16::from_sql(ty, raw)?.into(),
        Type::INT4 => i32::from_sql(ty, raw)?.into(),
        Type::INT8 => i64::from_sql(ty, raw)?.into(),
        Type::OID => u32::from_sql(ty, raw)?.into(),
        Type::CHAR => char::from(i8::from_sql(ty, raw)? as u8).to_string().into(),
        Type::FLOAT4 => f32::from_sql(ty, raw)?.into(),
        Type::FLOAT8 => f64::from_sql(ty, raw)?.into(),
        // Text keeps the declared scale ("2.50").
        Type::NUMERIC => Decimal::from_sql(ty, raw)?.to_string().into(),
        Type::TIMESTAMP => NaiveDateTime::from_sql(ty, raw)?.into(),
        Type::TIMESTAMPTZ => DateTime::<Utc>::from_sql(ty, raw)?.into(),
        Type::DATE => NaiveDate::from_sql(ty, raw)?.and_hms_opt(0, 0, 0).into(),
        Type::TIME => NaiveTime::from_sql(ty, raw)?.to_string().into(),
        Type::INTERVAL => interval_to_text(raw)?.into(),
        Type::INET => IpAddr::from_sql(ty, raw)?.to_string().into(),
        Type::BYTEA => Value::Bytes(raw.to_vec()),
        Type::JSON | Type::JSONB => serde_json::Value::from_sql(ty, raw)?.to_string().into(),
        Type::UUID => uuid::Uuid::from_sql(ty, raw)?.to_string().into(),
        _ if is_text(ty) => String::from_sql(ty, raw)?.into(),
        _ => match std::str::from_utf8(raw) {
            Ok(s) => Value::Text(s.to_string()),
            Err(_) => Value::Bytes(raw.to_vec()),
        },
    };
    Ok(value)
}

/// Render an INTERVAL the way PostgreSQL's default output style does,
/// e.g. `1 year 2 mons 3 days 04:05:06`.
fn interval_to_text(raw: &[u8]) -> Result<String, BoxError> {
    if raw.len() != 16 {
        return Err("invalid buffer size for INTERVAL".into());
    }
    let micros = i64::from_be_bytes(raw[..8].try_into()?);
    let days = i32::from_be_bytes(raw[8..12].try_into()?);
    let months = i32::from_be_bytes(raw[12..].try_into()?);

    let mut parts = Vec::new();
    for (n, unit) in [(months / 12, "year"), (months % 12, "mon"), (days, "day")] {
        if n != 0 {
            let plural = if n.abs() == 1 { "" } else { "s" };
            parts.push(format!("{n} {unit}{plural}"));
        }
    }
    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 { "-" } else { "" };
        let total = micros.unsigned_abs();
        let (secs, frac) = (total / 1_000_000, total % 1_000_000);
        let mut time = format!(
            "{sign}{:02}:{:02}:{:02}",
            secs / 3600,
            secs / 60 % 60,
            secs % 60
        );
        if frac != 0 {
            time.push_str(format!(".{frac:06}").trim_end_matches('0'));
        }
        parts.push(time);
    }
    Ok(parts.join(" "))
}

fn is_text(ty: &Type) -> bool {
    matches!(
        *ty,
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN | Type::XML
    ) || ty.name() == "citext"
}

fn mismatch(kind: &str, ty: &Type) -> BoxError {
    format!("cannot encode {kind} value as postgres type {ty}").into()
}

fn int_to_sql(i: i64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::INT2 => i16::try_from(i)?.to_sql(ty, out),
        Type::INT4 => i32::try_from(i)?.to_sql(ty, out),
        Type::INT8 => i.to_sql(ty, out),
        Type::OID => u32::try_from(i)?.to_sql(ty, out),
        Type::FLOAT4 => (i as f32).to_sql(ty, out),
        Type::FLOAT8 => (i as f64).to_sql(ty, out),
        Type::NUMERIC => Decimal::from(i).to_sql(ty, out),
        Type::BOOL => (i != 0).to_sql(ty, out),
        Type::TIMESTAMP | Type::TIMESTAMPTZ | Type::DATE => {
            let ts = Utc
                .timestamp_opt(i, 0)
                .single()
                .ok_or_else(|| format!("timestamp {i} out of range"))?
                .naive_utc();
            timestamp_to_sql(&ts, ty, out)
        }
        _ if is_text(ty) => i.to_string().to_sql(ty, out),
        _ => Err(mismatch("integer", ty)),
    }
}

fn float_to_sql(f: f64, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::FLOAT4 => (f as f32).to_sql(ty, out),
        Type::FLOAT8 => f.to_sql(ty, out),
        Type::NUMERIC => Decimal::try_from(f)?.to_sql(ty, out),
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID if f.fract() == 0.0 => {
            int_to_sql(f as i64, ty, out)
        }
        _ if is_text(ty) => f.to_string().to_sql(ty, out),
        _ => Err(mismatch("float", ty)),
    }
}

fn timestamp_to_sql(ts: &NaiveDateTime, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    match *ty {
        Type::TIMESTAMP => ts.to_sql(ty, out),
        Type::TIMESTAMPTZ => Utc.from_utc_datetime(ts).to_sql(ty, out),
        Type::DATE => ts.date().to_sql(ty, out),
        Type::TIME => ts.time().to_sql(ty, out),
        _ if is_text(ty) => ts.format(TIMESTAMP_FORMAT).to_string().to_sql(ty, out),
        _ => Err(mismatch("timestamp", ty)),
    }
}

fn text_to_sql(s: &str, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
    if matches!(ty.kind(), Kind::Enum(_)) {
        return s.to_sql(&Type::TEXT, out);
    }
    match *ty {
        Type::INT2 | Type::INT4 | Type::INT8 | Type::OID => {
            int_to_sql(s.trim().parse::<i64>()?, ty, out)
        }
        Type::FLOAT4 => s.trim().parse::<f32>()?.to_sql(ty, out),
        Type::FLOAT8 => s.trim().parse::<f64>()?.to_sql(ty, out),
        Type::NUMERIC => s.trim().parse::<Decimal>()?.to_sql(ty, out),
        Type::BOOL => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "t" | "true" | "1" | "y" | "yes" | "on"
        )
        .to_sql(ty, out),
        Type::CHAR => match s.as_bytes() {
            [b] if b.is_ascii() => (*b as i8).to_sql(ty, out),
            _ => Err(format!("\"char\" expects one ASCII byte, got '{s}'").into()),
        },
        Type::TIMESTAMP | Type::TIMESTAMPTZ | Type::DATE => {
            let ts = NaiveDateTime::from_value(&Value::Text(s.to_string()))?;
            timestamp_to_sql(&ts, ty, out)
        }
        Type::TIME => s.trim().parse::<NaiveTime>()?.to_sql(ty, out),
        Type::INET => s.trim().parse::<IpAddr>()?.to_sql(ty, out),
        Type::JSON | Type::JSONB => serde_json::from_str::<serde_json::Value>(s)?.to_sql(ty, out),
        Type::UUID => uuid::Uuid::parse_str(s.trim())?.to_sql(ty, out),
        Type::BYTEA => s.as_bytes().to_sql(ty, out),
        _ if is_text(ty) => s.to_sql(ty, out),
        _ => Err(mismatch("text", ty)),
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, BoxError> {
        if let Kind::Domain(inner) = ty.kind() {
            return self.to_sql(inner, out);
        }
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) => match *ty {
                Type::BOOL => b.to_sql(ty, out),
                _ if is_text(ty) => b.to_string().to_sql(ty, out),
                _ => int_to_sql(i64::from(*b), ty, out),
            },
            Value::Int(i) => int_to_sql(*i, ty, out),
            Value::Float(f) => float_to_sql(*f, ty, out),
            Value::Text(s) => text_to_sql(s, ty, out),
            Value::Timestamp(ts) => timestamp_to_sql(ts, ty, out),
            Value::Bytes(b) => match *ty {
                Type::BYTEA => b.as_slice().to_sql(ty, out),
                _ => match std::str::from_utf8(b) {
                    Ok(s) => text_to_sql(s, ty, out),
                    Err(_) => Err(mismatch("bytes", ty)),
                },
            },
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}
