//! score-runner: headless scoring runner.
//!
//! Usage:
//!   score-runner --db scores.db --data-dir ./data
//!   score-runner --input customers.json --json
//!   score-runner --seed 12345 --population 1000

use anyhow::Result;
use delinquency_core::{
    config::ScoringConfig,
    customer::rows_from_json,
    engine::{RunReport, ScoringEngine},
    store::ScoreStore,
};
use std::env;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let json_out = args.iter().any(|a| a == "--json");
    let db = str_arg(&args, "--db").unwrap_or(":memory:");
    let data_dir = str_arg(&args, "--data-dir").unwrap_or("./data");
    let input = str_arg(&args, "--input");

    let config = if Path::new(&format!("{data_dir}/scoring")).is_dir() {
        ScoringConfig::load(data_dir)?
    } else {
        log::warn!("No config under {data_dir}/scoring, using built-in defaults");
        ScoringConfig::default()
    };
    let population = parse_arg(&args, "--population", config.reporting.synthetic_population);

    if !json_out {
        println!("Delinquency risk scoring: score-runner");
        println!("  model:     {}", config.model.model_version);
        println!("  db:        {db}");
        println!("  data_dir:  {data_dir}");
        match input {
            Some(path) => println!("  input:     {path}"),
            None => println!("  source:    customer table (seed {seed}, population {population} if empty)"),
        }
        println!();
    }

    let store = ScoreStore::open(db)?;
    store.migrate()?;
    let engine = ScoringEngine::new(config, store);

    let report = match input {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
            let rows = rows_from_json(&content)?;
            engine.run_rows(&rows)?
        }
        None => {
            engine.seed_synthetic(seed, population)?;
            engine.run()?
        }
    };

    if json_out {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    let run = &report.run;
    let o = &report.overview;
    println!("=== RUN SUMMARY ===");
    println!("  run_id:           {}", run.run_id);
    println!("  rows read:        {}", run.rows_read);
    println!("  rows scored:      {}", run.rows_scored);
    println!("  rows rejected:    {}", run.rows_rejected);
    println!("  delinquent:       {} ({:.2}%)", o.delinquent_count, o.delinquency_rate * 100.0);
    println!("  avg probability:  {:.3}", o.avg_probability);

    println!();
    println!("=== RISK TIERS ===");
    for c in &report.tiers {
        println!("  {:<22} {:>6} ({:.1}%)", c.class, c.count, c.share * 100.0);
    }
    println!();
    println!("=== COLLECTION ACTIONS ===");
    for c in &report.actions {
        println!("  {:<22} {:>6} ({:.1}%)", c.class, c.count, c.share * 100.0);
    }

    println!();
    println!("=== HIGH-RISK PROFILE ===");
    match &report.high_risk_profile {
        None => println!("  (No HIGH-tier customers)"),
        Some(p) => {
            println!("  customers:          {}", p.customers);
            println!("  avg income:         ${:.0}", p.avg_income);
            println!("  avg credit score:   {:.0}", p.avg_credit_score);
            println!("  avg utilization:    {:.2}%", p.avg_credit_utilization * 100.0);
            println!("  avg missed:         {:.1}", p.avg_missed_payments);
            println!("  avg DTI:            {:.2}%", p.avg_debt_to_income * 100.0);
        }
    }

    println!();
    println!("=== RISK DRIVERS (correlation with delinquency) ===");
    for d in &report.drivers {
        match d.correlation {
            Some(r) => println!("  {:<26} {r:+.3}", d.driver),
            None => println!("  {:<26} n/a", d.driver),
        }
    }

    println!();
    println!("=== PAYMENT PATTERNS (month 1 = most recent) ===");
    for m in &report.payment_patterns {
        println!(
            "  month {}  on-time {:>5}  late {:>5}  missed {:>5}",
            m.month, m.on_time, m.late, m.missed
        );
    }

    println!();
    println!("=== SEGMENTS ===");
    let mut current = String::new();
    for s in &report.segments {
        let dims = s.dimension_label();
        if dims != current {
            println!("  [{dims}]");
            current = dims;
        }
        println!(
            "    {:<36} n={:>5}  avg={:.3}  high={:>5.1}%  actual={:>5.1}%  gap={:+.1}pp",
            s.label(),
            s.count,
            s.avg_probability,
            s.high_risk_rate * 100.0,
            s.actual_delinquency_rate * 100.0,
            s.prediction_gap * 100.0,
        );
    }

    println!();
    println!("=== FAIRNESS ===");
    for f in &report.fairness {
        let flagged: Vec<_> = f.flagged().collect();
        if flagged.is_empty() {
            println!("  {:<20} no groups flagged", f.dimension);
            continue;
        }
        println!("  {:<20} {} group(s) flagged", f.dimension, flagged.len());
        for g in flagged {
            let ratio = g
                .disparate_impact
                .map(|r| format!("{r:.2}"))
                .unwrap_or_else(|| "n/a".into());
            println!(
                "    {:<24} DI={ratio}  dev={:+.1}pp  gap={:+.1}pp",
                g.group,
                g.deviation * 100.0,
                g.calibration_gap * 100.0,
            );
        }
    }

    let q = &report.data_quality;
    println!();
    println!("=== DATA QUALITY ===");
    println!("  DTI above 1.0:      {}", q.dti_above_one);
    println!("  probability > 1.0:  {}", q.probability_above_one);
    println!("  without loan:       {}", q.without_loan);
    for (field, n) in &q.rejected_by_field {
        println!("  rejected ({field}): {n}");
    }
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}
