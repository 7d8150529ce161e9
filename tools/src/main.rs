//! report-runner: headless fair-lending report runner.
//!
//! Usage:
//!   report-runner --db hmda.db --year 2013 --county 11001 --metro 47900
//!   report-runner --demo --seed 42 --json
//!
//! List flags (--county, --metro, --lender, --lien-status, --loan-purpose,
//! --property-type, --owner-occupancy) may be repeated or comma-joined.

use anyhow::Result;
use fairlend_core::{
    config::AnalyticsConfig,
    peer_resolver::{self, LenderGroup},
    report::ReportDocument,
    report_input::{ReportInput, ReportRequest},
    snapshot,
    store::LendStore,
    synthetic::{self, SyntheticParams},
    tract_volume::{self, LenderScope, TractVolume},
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let seed = parse_arg(&args, "--seed", 42u64);
    let demo = args.iter().any(|a| a == "--demo");
    let json = args.iter().any(|a| a == "--json");
    let db = arg_value(&args, "--db").unwrap_or(":memory:");
    let data_dir = arg_value(&args, "--data-dir").unwrap_or("./data");

    let config = AnalyticsConfig::load(data_dir).unwrap_or_else(|e| {
        log::warn!("using default analytics config: {e}");
        AnalyticsConfig::default()
    });

    // For :memory: use a shared-cache URI so the reader connection used for
    // the report sees what the loader connection wrote.
    let db_effective: String = if db == ":memory:" {
        format!("file:reportrun_{}?mode=memory&cache=shared", chrono_tick())
    } else {
        db.to_string()
    };
    let store = LendStore::open(&db_effective)?;
    store.migrate()?;

    let mut request = ReportRequest {
        county: arg_values(&args, "--county"),
        metro: arg_values(&args, "--metro"),
        lender: arg_values(&args, "--lender"),
        year: arg_value(&args, "--year").unwrap_or_default().to_string(),
        lien_status: arg_values(&args, "--lien-status"),
        loan_purpose: arg_values(&args, "--loan-purpose"),
        property_type: arg_values(&args, "--property-type"),
        owner_occupancy: arg_values(&args, "--owner-occupancy"),
    };

    if demo || db == ":memory:" {
        let params = SyntheticParams::default();
        let dataset = synthetic::generate(&store, seed, &params)?;
        if request.year.is_empty() {
            request.year = dataset.year.to_string();
        }
        if request.county.is_empty() && request.metro.is_empty() {
            request.metro = dataset.metros.clone();
            request.county = dataset.counties.iter().take(1).cloned().collect();
        }
        if request.lender.is_empty() {
            request.lender = dataset.lenders.iter().rev().take(1).cloned().collect();
        }
    }
    if request.year.is_empty() {
        if let Some(latest) = store.lar_years()?.first() {
            request.year = latest.to_string();
        }
    }

    snapshot::rebuild_aggregates(&store)?;

    let input = ReportInput::from_request(&request)?;
    let reader = store.reopen()?;
    let doc = ReportDocument::generate(&reader, &input, &config)?;
    let groups = peer_resolver::lender_groups(&reader, &input, &config)?;
    let tracts = doc
        .divisions
        .iter()
        .map(|report| {
            tract_volume::tract_volumes(&reader, &report.division, &input, &[], &LenderScope::All, &config)
        })
        .collect::<Result<Vec<_>, _>>()?;

    if json {
        println!("{}", doc.to_json()?);
        println!("{}", serde_json::to_string_pretty(&groups)?);
        println!("{}", serde_json::to_string_pretty(&tracts)?);
    } else {
        print_summary(&doc, &groups, &tracts, db, seed);
    }
    Ok(())
}

fn print_summary(
    doc: &ReportDocument,
    groups: &[LenderGroup],
    tracts: &[Vec<TractVolume>],
    db: &str,
    seed: u64,
) {
    println!("Fair-lending report {}", doc.report_id);
    println!("  db:         {db}");
    println!("  seed:       {seed}");
    println!("  year:       {}", doc.year);
    println!("  snapshot:   generation {}", doc.snapshot_generation);
    println!();

    for (report, tract_rows) in doc.divisions.iter().zip(tracts) {
        println!(
            "=== {} ({} {}) ===",
            report.division.name(),
            report.division.kind().label(),
            report.division.geoid()
        );
        println!("  -- Population --");
        for row in &report.population {
            println!("  {:<32} {:>10} {:>4}%", row.label, row.count, row.percent);
        }
        println!("  -- Income & housing --");
        for row in &report.income_housing {
            println!("  {:<32} {:>10} {:>4}%", row.label, row.count, row.percent);
        }
        println!("  -- Disparity --");
        for section in &report.disparity {
            println!("  vs {}:", section.comparison_label);
            for line in &section.rows {
                println!(
                    "    {:<28} {:>6}/{:<6} ratio {}",
                    line.row.feature,
                    line.row.feature_approved,
                    line.row.feature_total,
                    line.disparity_ratio
                );
            }
        }
        println!("  -- Top lenders --");
        for row in &report.top_lenders {
            println!(
                "  {:>3}{} {:<40} apps {:>6} approved {:>3}% lmit {:>3}% lmib {:>3}% mint {:>3}% minb {:>3}%",
                row.lender_rank,
                if row.requested { "*" } else { " " },
                row.name,
                row.applications,
                row.approval_rate,
                row.lmit_pct,
                row.lmib_pct,
                row.mint_pct,
                row.minb_pct
            );
        }
        println!("  -- Loans per tract --");
        for row in tract_rows {
            println!(
                "  {:<12} volume {:>6} households {:>6} per 1000 {:>8.1}",
                row.tract_id, row.volume, row.num_households, row.per_thousand_households
            );
        }
        println!();
    }

    for group in groups {
        println!("=== Lender {} ===", group.institution_id);
        println!("  hierarchy: {} institutions", group.hierarchy.len());
        for inst in &group.hierarchy {
            println!("    {}", inst.formatted_name());
        }
        for in_division in &group.peers {
            println!("  peers in {}: {}", in_division.division.name(), in_division.peers.len());
            for peer in &in_division.peers {
                println!("    {:<48} volume {}", peer.institution.formatted_name(), peer.volume);
            }
        }
    }
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}

/// Every value given for a repeatable flag.
fn arg_values(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2)
        .filter(|w| w[0] == flag)
        .map(|w| w[1].clone())
        .collect()
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn chrono_tick() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
