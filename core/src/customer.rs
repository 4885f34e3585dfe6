//! Customer records: the scorer's input.
//!
//! Two shapes live here:
//!   - `CustomerRow`:    a raw row as read from a table or a JSON file.
//!                       Every field is optional and loosely typed.
//!   - `CustomerRecord`: a domain-checked record. Only `validate()` and
//!                       direct construction produce one, and the scorer
//!                       re-checks directly constructed records.
//!
//! RULE: `delinquent_account` is the ground-truth label. It is carried
//! for retrospective evaluation only and never read by the scorer.

use crate::{
    error::{ScoreError, ScoreResult},
    types::{CustomerId, HISTORY_MONTHS},
};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MIN_AGE: i64 = 18;
pub const MIN_CREDIT_SCORE: i64 = 300;
pub const MAX_CREDIT_SCORE: i64 = 850;
pub const MAX_MISSED_PAYMENTS: i64 = HISTORY_MONTHS as i64;

const UNKNOWN_CUSTOMER: &str = "<unknown>";

// ── Payment status ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PaymentStatus {
    OnTime,
    Late,
    Missed,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 3] = [Self::OnTime, Self::Late, Self::Missed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnTime => "On-time",
            Self::Late   => "Late",
            Self::Missed => "Missed",
        }
    }

    /// Parse the textual forms found in source tables.
    /// Accepts `On-time`, `OnTime`, `on_time`, `Late`, `Missed` in any case.
    pub fn parse(raw: &str) -> Option<Self> {
        let folded: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "ontime" => Some(Self::OnTime),
            "late"   => Some(Self::Late),
            "missed" => Some(Self::Missed),
            _        => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Domain-checked record ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerRecord {
    pub customer_id:          CustomerId,
    pub age:                  u32,
    pub income:               f64,
    pub credit_score:         i32,
    pub credit_utilization:   f64,
    pub missed_payments:      u8,
    pub debt_to_income_ratio: f64,
    pub employment_status:    String,
    pub location:             String,
    pub credit_card_type:     String,
    pub account_tenure:       u32,
    pub loan_balance:         Option<f64>, // None = no loan, distinct from 0.0
    pub delinquent_account:   bool,
    /// Index 0 = most recent month, index 5 = oldest.
    pub payment_history:      [PaymentStatus; HISTORY_MONTHS],
}

impl CustomerRecord {
    /// Check the hard domain bounds the scoring formula relies on.
    ///
    /// DTI is only required to be finite and non-negative: values above
    /// 1.0 occur for stressed customers and are scored as they are.
    pub fn check(&self) -> ScoreResult<()> {
        let id = self.customer_id.as_str();

        if id.trim().is_empty() {
            return Err(ScoreError::invalid(UNKNOWN_CUSTOMER, "customer_id", "is empty"));
        }
        if i64::from(self.age) < MIN_AGE {
            return Err(ScoreError::invalid(id, "age", format!("must be >= {MIN_AGE}, got {}", self.age)));
        }
        check_non_negative(id, "income", self.income)?;
        let score = i64::from(self.credit_score);
        if !(MIN_CREDIT_SCORE..=MAX_CREDIT_SCORE).contains(&score) {
            return Err(ScoreError::invalid(
                id,
                "credit_score",
                format!("must be in [{MIN_CREDIT_SCORE}, {MAX_CREDIT_SCORE}], got {score}"),
            ));
        }
        if !self.credit_utilization.is_finite() || !(0.0..=1.0).contains(&self.credit_utilization) {
            return Err(ScoreError::invalid(
                id,
                "credit_utilization",
                format!("must be in [0, 1], got {}", self.credit_utilization),
            ));
        }
        if i64::from(self.missed_payments) > MAX_MISSED_PAYMENTS {
            return Err(ScoreError::invalid(
                id,
                "missed_payments",
                format!("must be in [0, {MAX_MISSED_PAYMENTS}], got {}", self.missed_payments),
            ));
        }
        check_non_negative(id, "debt_to_income_ratio", self.debt_to_income_ratio)?;
        if let Some(balance) = self.loan_balance {
            check_non_negative(id, "loan_balance", balance)?;
        }
        Ok(())
    }

    /// Number of months in the history with the given status.
    pub fn history_count(&self, status: PaymentStatus) -> usize {
        self.payment_history.iter().filter(|s| **s == status).count()
    }
}

fn check_non_negative(id: &str, field: &'static str, value: f64) -> ScoreResult<()> {
    if !value.is_finite() {
        return Err(ScoreError::invalid(id, field, format!("must be finite, got {value}")));
    }
    if value < 0.0 {
        return Err(ScoreError::invalid(id, field, format!("must be >= 0, got {value}")));
    }
    Ok(())
}

// ── Raw row ──────────────────────────────────────────────────────────────────

/// A loosely typed cell: whatever the source handed us.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RawField {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl From<f64> for RawField {
    fn from(v: f64) -> Self { Self::Number(v) }
}

impl From<i64> for RawField {
    fn from(v: i64) -> Self { Self::Number(v as f64) }
}

impl From<bool> for RawField {
    fn from(v: bool) -> Self { Self::Bool(v) }
}

impl From<&str> for RawField {
    fn from(v: &str) -> Self { Self::Text(v.to_string()) }
}

/// One row of the source table, before validation.
/// Column names follow the source table (`month_1` = most recent).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CustomerRow {
    pub customer_id:          Option<String>,
    pub age:                  Option<RawField>,
    pub income:               Option<RawField>,
    pub credit_score:         Option<RawField>,
    pub credit_utilization:   Option<RawField>,
    pub missed_payments:      Option<RawField>,
    pub debt_to_income_ratio: Option<RawField>,
    pub employment_status:    Option<String>,
    pub location:             Option<String>,
    pub credit_card_type:     Option<String>,
    pub account_tenure:       Option<RawField>,
    pub loan_balance:         Option<RawField>,
    pub delinquent_account:   Option<RawField>,
    pub month_1:              Option<String>,
    pub month_2:              Option<String>,
    pub month_3:              Option<String>,
    pub month_4:              Option<String>,
    pub month_5:              Option<String>,
    pub month_6:              Option<String>,
}

impl CustomerRow {
    /// The id if present, for error reporting before validation.
    pub fn id_hint(&self) -> Option<&str> {
        self.customer_id.as_deref().filter(|s| !s.trim().is_empty())
    }

    /// Convert into a domain-checked record.
    /// Fails on the first missing, non-numeric or out-of-domain field.
    pub fn validate(&self) -> ScoreResult<CustomerRecord> {
        let id = self
            .id_hint()
            .ok_or_else(|| ScoreError::invalid(UNKNOWN_CUSTOMER, "customer_id", "is missing"))?
            .to_string();

        let age = integer(&id, "age", &self.age)?;
        let credit_score = integer(&id, "credit_score", &self.credit_score)?;
        let missed_payments = integer(&id, "missed_payments", &self.missed_payments)?;
        let account_tenure = integer(&id, "account_tenure", &self.account_tenure)?;

        if age < MIN_AGE {
            return Err(ScoreError::invalid(&id, "age", format!("must be >= {MIN_AGE}, got {age}")));
        }
        if !(MIN_CREDIT_SCORE..=MAX_CREDIT_SCORE).contains(&credit_score) {
            return Err(ScoreError::invalid(
                &id,
                "credit_score",
                format!("must be in [{MIN_CREDIT_SCORE}, {MAX_CREDIT_SCORE}], got {credit_score}"),
            ));
        }
        if !(0..=MAX_MISSED_PAYMENTS).contains(&missed_payments) {
            return Err(ScoreError::invalid(
                &id,
                "missed_payments",
                format!("must be in [0, {MAX_MISSED_PAYMENTS}], got {missed_payments}"),
            ));
        }
        if account_tenure < 0 {
            return Err(ScoreError::invalid(
                &id,
                "account_tenure",
                format!("must be >= 0, got {account_tenure}"),
            ));
        }

        let loan_balance = match &self.loan_balance {
            None => None,
            Some(field) => Some(number(&id, "loan_balance", field)?),
        };

        let record = CustomerRecord {
            age: u32::try_from(age)
                .map_err(|_| ScoreError::invalid(&id, "age", format!("out of range: {age}")))?,
            income: required_number(&id, "income", &self.income)?,
            credit_score: credit_score as i32,
            credit_utilization: required_number(&id, "credit_utilization", &self.credit_utilization)?,
            missed_payments: missed_payments as u8,
            debt_to_income_ratio: required_number(&id, "debt_to_income_ratio", &self.debt_to_income_ratio)?,
            employment_status: text(&id, "employment_status", &self.employment_status)?,
            location: text(&id, "location", &self.location)?,
            credit_card_type: text(&id, "credit_card_type", &self.credit_card_type)?,
            account_tenure: u32::try_from(account_tenure).map_err(|_| {
                ScoreError::invalid(&id, "account_tenure", format!("out of range: {account_tenure}"))
            })?,
            loan_balance,
            delinquent_account: flag(&id, "delinquent_account", &self.delinquent_account)?,
            payment_history: [
                status(&id, "month_1", &self.month_1)?,
                status(&id, "month_2", &self.month_2)?,
                status(&id, "month_3", &self.month_3)?,
                status(&id, "month_4", &self.month_4)?,
                status(&id, "month_5", &self.month_5)?,
                status(&id, "month_6", &self.month_6)?,
            ],
            customer_id: id,
        };

        record.check()?;
        Ok(record)
    }
}

impl From<&CustomerRecord> for CustomerRow {
    fn from(r: &CustomerRecord) -> Self {
        let month = |i: usize| Some(r.payment_history[i].as_str().to_string());
        Self {
            customer_id:          Some(r.customer_id.clone()),
            age:                  Some(i64::from(r.age).into()),
            income:               Some(r.income.into()),
            credit_score:         Some(i64::from(r.credit_score).into()),
            credit_utilization:   Some(r.credit_utilization.into()),
            missed_payments:      Some(i64::from(r.missed_payments).into()),
            debt_to_income_ratio: Some(r.debt_to_income_ratio.into()),
            employment_status:    Some(r.employment_status.clone()),
            location:             Some(r.location.clone()),
            credit_card_type:     Some(r.credit_card_type.clone()),
            account_tenure:       Some(i64::from(r.account_tenure).into()),
            loan_balance:         r.loan_balance.map(RawField::from),
            delinquent_account:   Some(r.delinquent_account.into()),
            month_1: month(0),
            month_2: month(1),
            month_3: month(2),
            month_4: month(3),
            month_5: month(4),
            month_6: month(5),
        }
    }
}

/// Parse a JSON array of rows. A malformed element becomes an
/// `InvalidInput` in its slot; only a non-array document fails outright.
pub fn rows_from_json(content: &str) -> ScoreResult<Vec<ScoreResult<CustomerRow>>> {
    let doc: serde_json::Value = serde_json::from_str(content)?;
    let items = match doc {
        serde_json::Value::Array(items) => items,
        other => {
            return Err(ScoreError::invalid(
                UNKNOWN_CUSTOMER,
                "<document>",
                format!("expected a JSON array of rows, got {}", json_kind(&other)),
            ));
        }
    };

    Ok(items
        .into_iter()
        .map(|item| {
            let id = item
                .get("customer_id")
                .and_then(|v| v.as_str())
                .unwrap_or(UNKNOWN_CUSTOMER)
                .to_string();
            serde_json::from_value::<CustomerRow>(item)
                .map_err(|e| ScoreError::invalid(&id, "<row>", e.to_string()))
        })
        .collect())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null      => "null",
        serde_json::Value::Bool(_)   => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_)  => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// ── Field coercion ───────────────────────────────────────────────────────────

fn number(id: &str, field: &'static str, raw: &RawField) -> ScoreResult<f64> {
    let value = match raw {
        RawField::Number(n) => *n,
        RawField::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ScoreError::invalid(id, field, format!("is not numeric: {s:?}")))?,
        RawField::Bool(b) => {
            return Err(ScoreError::invalid(id, field, format!("is not numeric: {b}")));
        }
    };
    check_non_negative(id, field, value)?;
    Ok(value)
}

fn required_number(id: &str, field: &'static str, raw: &Option<RawField>) -> ScoreResult<f64> {
    match raw {
        Some(f) => number(id, field, f),
        None    => Err(ScoreError::invalid(id, field, "is missing")),
    }
}

fn integer(id: &str, field: &'static str, raw: &Option<RawField>) -> ScoreResult<i64> {
    let value = match raw {
        None => return Err(ScoreError::invalid(id, field, "is missing")),
        Some(RawField::Number(n)) => *n,
        Some(RawField::Text(s)) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| ScoreError::invalid(id, field, format!("is not numeric: {s:?}")))?,
        Some(RawField::Bool(b)) => {
            return Err(ScoreError::invalid(id, field, format!("is not numeric: {b}")));
        }
    };
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(ScoreError::invalid(id, field, format!("must be an integer, got {value}")));
    }
    if value.abs() > i32::MAX as f64 {
        return Err(ScoreError::invalid(id, field, format!("out of range: {value}")));
    }
    Ok(value as i64)
}

fn text(id: &str, field: &'static str, raw: &Option<String>) -> ScoreResult<String> {
    match raw.as_deref().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(ScoreError::invalid(id, field, "is missing")),
    }
}

fn flag(id: &str, field: &'static str, raw: &Option<RawField>) -> ScoreResult<bool> {
    match raw {
        None => Err(ScoreError::invalid(id, field, "is missing")),
        Some(RawField::Bool(b)) => Ok(*b),
        Some(RawField::Number(n)) if *n == 0.0 => Ok(false),
        Some(RawField::Number(n)) if *n == 1.0 => Ok(true),
        Some(RawField::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "y" => Ok(true),
            "0" | "false" | "no" | "n" => Ok(false),
            _ => Err(ScoreError::invalid(id, field, format!("is not a boolean: {s:?}"))),
        },
        Some(other) => Err(ScoreError::invalid(id, field, format!("is not a boolean: {other:?}"))),
    }
}

fn status(id: &str, field: &'static str, raw: &Option<String>) -> ScoreResult<PaymentStatus> {
    let s = raw
        .as_deref()
        .ok_or_else(|| ScoreError::invalid(id, field, "is missing"))?;
    PaymentStatus::parse(s)
        .ok_or_else(|| ScoreError::invalid(id, field, format!("unknown payment status: {s:?}")))
}
