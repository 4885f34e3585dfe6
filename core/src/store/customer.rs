use super::ScoreStore;
use crate::{
    customer::{CustomerRecord, CustomerRow, RawField},
    error::ScoreResult,
};
use rusqlite::{params, types::Value, Row};

const CUSTOMER_COLUMNS: &str = "customer_id, age, income, credit_score, credit_utilization,
    missed_payments, debt_to_income_ratio, employment_status, location, credit_card_type,
    account_tenure, loan_balance, delinquent_account,
    month_1, month_2, month_3, month_4, month_5, month_6";

impl ScoreStore {
    // ── Customer ──────────────────────────────────────────────────

    /// Insert a raw row as-is. Loosely typed cells keep their type in
    /// SQLite, so malformed rows survive the round trip and are caught
    /// at validation time.
    pub fn insert_customer_row(&self, row: &CustomerRow) -> ScoreResult<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO customer ({CUSTOMER_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                         ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
            ),
            params![
                row.customer_id,
                to_value(&row.age),
                to_value(&row.income),
                to_value(&row.credit_score),
                to_value(&row.credit_utilization),
                to_value(&row.missed_payments),
                to_value(&row.debt_to_income_ratio),
                row.employment_status,
                row.location,
                row.credit_card_type,
                to_value(&row.account_tenure),
                to_value(&row.loan_balance),
                to_value(&row.delinquent_account),
                row.month_1,
                row.month_2,
                row.month_3,
                row.month_4,
                row.month_5,
                row.month_6,
            ],
        )?;
        Ok(())
    }

    pub fn insert_customer(&self, record: &CustomerRecord) -> ScoreResult<()> {
        self.insert_customer_row(&CustomerRow::from(record))
    }

    /// Insert a whole portfolio in one transaction.
    pub fn insert_customers(&self, records: &[CustomerRecord]) -> ScoreResult<()> {
        self.transaction(|| {
            for record in records {
                self.insert_customer(record)?;
            }
            Ok(())
        })?;
        log::debug!("store: inserted {} customers", records.len());
        Ok(())
    }

    pub fn customer_count(&self) -> ScoreResult<i64> {
        let n = self
            .conn
            .query_row("SELECT COUNT(*) FROM customer", [], |row| row.get(0))?;
        Ok(n)
    }

    /// Every customer row, ordered by id, unvalidated.
    pub fn customer_rows(&self) -> ScoreResult<Vec<CustomerRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customer ORDER BY customer_id ASC"
        ))?;
        let rows = stmt.query_map([], read_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

fn read_row(row: &Row<'_>) -> rusqlite::Result<CustomerRow> {
    Ok(CustomerRow {
        customer_id:          text(row.get(0)?),
        age:                  raw(row.get(1)?),
        income:               raw(row.get(2)?),
        credit_score:         raw(row.get(3)?),
        credit_utilization:   raw(row.get(4)?),
        missed_payments:      raw(row.get(5)?),
        debt_to_income_ratio: raw(row.get(6)?),
        employment_status:    text(row.get(7)?),
        location:             text(row.get(8)?),
        credit_card_type:     text(row.get(9)?),
        account_tenure:       raw(row.get(10)?),
        loan_balance:         raw(row.get(11)?),
        delinquent_account:   raw(row.get(12)?),
        month_1:              text(row.get(13)?),
        month_2:              text(row.get(14)?),
        month_3:              text(row.get(15)?),
        month_4:              text(row.get(16)?),
        month_5:              text(row.get(17)?),
        month_6:              text(row.get(18)?),
    })
}

fn raw(value: Value) -> Option<RawField> {
    match value {
        Value::Null       => None,
        Value::Integer(i) => Some(RawField::Number(i as f64)),
        Value::Real(f)    => Some(RawField::Number(f)),
        Value::Text(s)    => Some(RawField::Text(s)),
        Value::Blob(b)    => Some(RawField::Text(String::from_utf8_lossy(&b).into_owned())),
    }
}

fn text(value: Value) -> Option<String> {
    match value {
        Value::Null       => None,
        Value::Integer(i) => Some(i.to_string()),
        Value::Real(f)    => Some(f.to_string()),
        Value::Text(s)    => Some(s),
        Value::Blob(b)    => Some(String::from_utf8_lossy(&b).into_owned()),
    }
}

fn to_value(field: &Option<RawField>) -> Value {
    match field {
        None                        => Value::Null,
        Some(RawField::Bool(b))     => Value::Integer(i64::from(*b)),
        Some(RawField::Number(n))   => Value::Real(*n),
        Some(RawField::Text(s))     => Value::Text(s.clone()),
    }
}
