//! Synthetic customer portfolio.
//!
//! Produces a realistic, fully valid customer table from a seed so that
//! the runner and the tests have data without an external source.
//! Same seed, same size → identical records.
//!
//! The delinquency label is drawn after the features, with probability
//! rising with the rule score, so reports have signal to find.

use crate::{
    customer::{CustomerRecord, PaymentStatus},
    rng::{Stream, StreamRng},
    scorer::RiskModel,
    types::HISTORY_MONTHS,
};

pub const EMPLOYMENT_STATUSES: [&str; 4] = ["Employed", "Self-employed", "Unemployed", "Retired"];
const EMPLOYMENT_WEIGHTS: [f64; 4] = [0.62, 0.18, 0.10, 0.10];

pub const LOCATIONS: [&str; 5] = ["Los Angeles", "New York", "Chicago", "Houston", "Phoenix"];

pub const CARD_TYPES: [&str; 5] = ["Standard", "Gold", "Platinum", "Business", "Student"];
const CARD_WEIGHTS: [f64; 5] = [0.40, 0.20, 0.15, 0.15, 0.10];

const MISSED_WEIGHTS: [f64; 7] = [0.30, 0.22, 0.16, 0.12, 0.09, 0.07, 0.04];

const NO_LOAN_RATE: f64 = 0.12;
const STRESSED_DTI_RATE: f64 = 0.02;
const LATE_RATE: f64 = 0.15;

pub fn generate_portfolio(seed: u64, size: usize) -> Vec<CustomerRecord> {
    let mut demo = Stream::Demographics.rng(seed);
    let mut credit = Stream::Credit.rng(seed);
    let mut payments = Stream::Payments.rng(seed);
    let mut label = Stream::Label.rng(seed);
    let model = RiskModel::default();

    let portfolio: Vec<CustomerRecord> = (0..size)
        .map(|i| {
            let mut record = draw_customer(i, &mut demo, &mut credit, &mut payments);
            let risk = model.components(&record).total();
            record.delinquent_account = label.chance((0.03 + 0.55 * risk).min(0.95));
            record
        })
        .collect();

    log::debug!("population: generated {size} customers from seed {seed}");
    portfolio
}

fn draw_customer(
    index: usize,
    demo: &mut StreamRng,
    credit: &mut StreamRng,
    payments: &mut StreamRng,
) -> CustomerRecord {
    let age = demo.range_inclusive(18, 75) as u32;
    let employment_status = EMPLOYMENT_STATUSES[demo.weighted_index(&EMPLOYMENT_WEIGHTS)];
    let income_mean = match employment_status {
        "Unemployed" => 18_000.0,
        "Retired"    => 42_000.0,
        _            => 72_000.0,
    };
    let income = demo.normal(income_mean, income_mean * 0.45).max(0.0).round();
    let location = demo.pick(&LOCATIONS).copied().unwrap_or(LOCATIONS[0]);
    let credit_card_type = CARD_TYPES[demo.weighted_index(&CARD_WEIGHTS)];
    let account_tenure = demo.range_inclusive(0, 240) as u32;

    let credit_score = credit.normal(680.0, 85.0).round().clamp(300.0, 850.0) as i32;
    let credit_utilization = round_to(credit.normal(0.40, 0.22).clamp(0.0, 1.0), 3);
    let debt_to_income_ratio = if credit.chance(STRESSED_DTI_RATE) {
        round_to(1.0 + credit.next_f64() * 0.6, 3)
    } else {
        round_to(credit.normal(0.30, 0.15).clamp(0.0, 0.95), 3)
    };
    let loan_balance = if credit.chance(NO_LOAN_RATE) {
        None
    } else {
        Some(round_to(credit.normal(25_000.0, 15_000.0).max(0.0), 2))
    };

    let missed_payments = payments.weighted_index(&MISSED_WEIGHTS) as u8;
    let payment_history = draw_history(missed_payments, payments);

    CustomerRecord {
        customer_id: format!("CUST{:04}", index + 1),
        age,
        income,
        credit_score,
        credit_utilization,
        missed_payments,
        debt_to_income_ratio,
        employment_status: employment_status.into(),
        location: location.into(),
        credit_card_type: credit_card_type.into(),
        account_tenure,
        loan_balance,
        delinquent_account: false,
        payment_history,
    }
}

/// Exactly `missed` months are Missed; the others are Late or OnTime.
fn draw_history(missed: u8, rng: &mut StreamRng) -> [PaymentStatus; HISTORY_MONTHS] {
    let mut history = [PaymentStatus::OnTime; HISTORY_MONTHS];
    let mut remaining = usize::from(missed).min(HISTORY_MONTHS);
    while remaining > 0 {
        let slot = rng.next_u64_below(HISTORY_MONTHS as u64) as usize;
        if history[slot] != PaymentStatus::Missed {
            history[slot] = PaymentStatus::Missed;
            remaining -= 1;
        }
    }
    for status in history.iter_mut() {
        if *status == PaymentStatus::OnTime && rng.chance(LATE_RATE) {
            *status = PaymentStatus::Late;
        }
    }
    history
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
