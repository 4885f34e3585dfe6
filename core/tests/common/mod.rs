//! Shared record builders for the integration tests.
#![allow(dead_code)]

use delinquency_core::customer::{CustomerRecord, CustomerRow, PaymentStatus};

/// A valid, risk-free customer: every weighted factor is zero.
pub fn clean_customer(id: &str) -> CustomerRecord {
    CustomerRecord {
        customer_id:          id.into(),
        age:                  40,
        income:               60_000.0,
        credit_score:         850,
        credit_utilization:   0.0,
        missed_payments:      0,
        debt_to_income_ratio: 0.0,
        employment_status:    "Employed".into(),
        location:             "Chicago".into(),
        credit_card_type:     "Standard".into(),
        account_tenure:       48,
        loan_balance:         Some(10_000.0),
        delinquent_account:   false,
        payment_history:      [PaymentStatus::OnTime; 6],
    }
}

/// A customer with the four scored factors set.
pub fn customer(id: &str, missed: u8, utilization: f64, score: i32, dti: f64) -> CustomerRecord {
    let mut r = clean_customer(id);
    r.missed_payments = missed;
    r.credit_utilization = utilization;
    r.credit_score = score;
    r.debt_to_income_ratio = dti;
    for month in r.payment_history.iter_mut().take(usize::from(missed.min(6))) {
        *month = PaymentStatus::Missed;
    }
    r
}

pub fn row_for(record: &CustomerRecord) -> CustomerRow {
    CustomerRow::from(record)
}

/// Route `log` output through the test harness; `RUST_LOG` controls it.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
