//! Rule-based delinquency risk scoring for a customer portfolio.
//!
//! The core is `scorer::RiskModel::score`, a pure function from a
//! checked `CustomerRecord` to a probability, a risk tier and a
//! collection action. Everything else reads scored records: the
//! aggregator, the fairness checks, the reports and the SQLite store.

pub mod aggregate;
pub mod bands;
pub mod batch;
pub mod config;
pub mod customer;
pub mod engine;
pub mod error;
pub mod fairness;
pub mod population;
pub mod report;
pub mod rng;
pub mod scorer;
pub mod store;
pub mod types;

pub use customer::{CustomerRecord, CustomerRow, PaymentStatus};
pub use error::{ScoreError, ScoreResult};
pub use scorer::{score, CollectionAction, RiskModel, RiskTier, ScoredRecord};
