//! Raw row validation: missing, malformed and out-of-domain fields.

mod common;

use common::{customer, row_for};
use delinquency_core::{
    customer::{rows_from_json, CustomerRow, RawField},
    PaymentStatus, ScoreError,
};

fn expect_invalid(row: &CustomerRow, expected_field: &str) {
    match row.validate() {
        Err(ScoreError::InvalidInput { field, .. }) => {
            assert_eq!(field, expected_field, "wrong field reported");
        }
        other => panic!("Expected InvalidInput on {expected_field}, got {other:?}"),
    }
}

/// A row built from a valid record validates back to the same record.
#[test]
fn valid_row_validates_to_record() {
    let record = customer("c-valid", 2, 0.35, 690, 0.28);
    let row = row_for(&record);
    assert_eq!(row.validate().unwrap(), record);
}

/// Missing missed_payments is InvalidInput, never a default of zero.
#[test]
fn missing_missed_payments_is_invalid() {
    let mut row = row_for(&customer("c-missing", 1, 0.3, 700, 0.2));
    row.missed_payments = None;
    expect_invalid(&row, "missed_payments");
}

/// credit_score -1 is out of domain.
#[test]
fn negative_credit_score_is_invalid() {
    let mut row = row_for(&customer("c-neg", 1, 0.3, 700, 0.2));
    row.credit_score = Some(RawField::Number(-1.0));
    expect_invalid(&row, "credit_score");
}

/// Non-numeric text in a numeric column is InvalidInput.
#[test]
fn non_numeric_income_is_invalid() {
    let mut row = row_for(&customer("c-text", 1, 0.3, 700, 0.2));
    row.income = Some(RawField::Text("lots".into()));
    expect_invalid(&row, "income");
}

/// Numeric text is accepted.
#[test]
fn numeric_text_is_coerced() {
    let mut row = row_for(&customer("c-coerce", 1, 0.3, 700, 0.2));
    row.credit_score = Some(RawField::Text("700".into()));
    row.credit_utilization = Some(RawField::Text(" 0.3 ".into()));
    let record = row.validate().unwrap();
    assert_eq!(record.credit_score, 700);
    assert_eq!(record.credit_utilization, 0.3);
}

/// Fractional missed payments are rejected.
#[test]
fn fractional_missed_payments_is_invalid() {
    let mut row = row_for(&customer("c-frac", 1, 0.3, 700, 0.2));
    row.missed_payments = Some(RawField::Number(2.5));
    expect_invalid(&row, "missed_payments");
}

/// Age below 18 is rejected.
#[test]
fn underage_customer_is_invalid() {
    let mut row = row_for(&customer("c-young", 0, 0.3, 700, 0.2));
    row.age = Some(RawField::Number(17.0));
    expect_invalid(&row, "age");
}

/// An unknown payment status in the history is rejected.
#[test]
fn unknown_payment_status_is_invalid() {
    let mut row = row_for(&customer("c-status", 0, 0.3, 700, 0.2));
    row.month_4 = Some("Skipped".into());
    expect_invalid(&row, "month_4");
}

/// A missing id is reported against the placeholder id.
#[test]
fn missing_customer_id_is_invalid() {
    let mut row = row_for(&customer("c-noid", 0, 0.3, 700, 0.2));
    row.customer_id = Some("   ".into());
    expect_invalid(&row, "customer_id");
}

/// A missing loan balance means "no loan", not an error.
#[test]
fn missing_loan_balance_means_no_loan() {
    let mut row = row_for(&customer("c-noloan", 0, 0.3, 700, 0.2));
    row.loan_balance = None;
    assert_eq!(row.validate().unwrap().loan_balance, None);
}

/// DTI above 1.0 passes validation.
#[test]
fn dti_above_one_is_valid() {
    let row = row_for(&customer("c-stressed", 0, 0.3, 700, 1.4));
    assert_eq!(row.validate().unwrap().debt_to_income_ratio, 1.4);
}

/// JSON rows parse with source spellings and loose types.
#[test]
fn json_rows_parse_loose_types() {
    let json = r#"[
        {
            "customer_id": "CUST0001", "age": 34, "income": "52000",
            "credit_score": 712, "credit_utilization": 0.41, "missed_payments": 1,
            "debt_to_income_ratio": 0.22, "employment_status": "Employed",
            "location": "Houston", "credit_card_type": "Gold", "account_tenure": 19,
            "loan_balance": null, "delinquent_account": 0,
            "month_1": "On-time", "month_2": "Late", "month_3": "Missed",
            "month_4": "On-time", "month_5": "On-time", "month_6": "On-time"
        },
        {"customer_id": "CUST0002", "age": "forty"},
        42
    ]"#;
    let rows = rows_from_json(json).unwrap();
    assert_eq!(rows.len(), 3);

    let first = rows[0].as_ref().unwrap().validate().unwrap();
    assert_eq!(first.income, 52_000.0);
    assert_eq!(first.loan_balance, None);
    assert!(!first.delinquent_account);
    assert_eq!(first.payment_history[2], PaymentStatus::Missed);
    assert_eq!(first.history_count(PaymentStatus::Late), 1);

    let second = rows[1].as_ref().unwrap().validate().unwrap_err();
    assert_eq!(second.field(), Some("age"));

    let third = rows[2].as_ref().unwrap_err();
    assert_eq!(third.field(), Some("<row>"));
}

/// A document that is not an array fails outright.
#[test]
fn json_document_must_be_an_array() {
    let err = rows_from_json(r#"{"customer_id": "CUST0001"}"#).unwrap_err();
    assert_eq!(err.field(), Some("<document>"));
}
