// Clinic Intake System - CLI
// import: load a raw JSON blob into the store
// report: print the prepared admin report
// export: write the report as CSV or JSON

use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::PathBuf;

use clinic_intake::{
    prepare_report, report_to_csv, report_to_json, AdminStore, DataSource, RawAdminData,
};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("import") => run_import(args.get(2).map(String::as_str)),
        Some("report") => run_report(),
        Some("export") => run_export(args.get(2).map(String::as_str)),
        _ => {
            print_usage();
            Ok(())
        }
    }
}

fn db_path() -> PathBuf {
    env::var("CLINIC_DB")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("clinic-intake.db"))
}

fn print_usage() {
    println!("🏥 Clinic Intake System v{}", clinic_intake::VERSION);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Usage:");
    println!("  clinic-intake import <data.json>   Import a raw JSON blob into the store");
    println!("  clinic-intake report               Print the admin report");
    println!("  clinic-intake export <out.csv>     Export the report (.csv or .json)");
    println!();
    println!("Store path: {:?} (override with CLINIC_DB)", db_path());
}

fn run_import(path: Option<&str>) -> Result<()> {
    let path = path.context("Usage: clinic-intake import <data.json>")?;

    println!("📂 Importing raw data from {}...", path);
    let json = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?;
    let data: RawAdminData =
        serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path))?;

    let store = AdminStore::open(db_path())?;
    store.save(&data)?;

    println!("✓ Imported (source: {})", DataSource::ManualImport.as_str());
    println!(
        "✓ Raw records: {} persons, {} payments, {} treatments, {} doctors",
        data.persons().len(),
        data.payments().len(),
        data.treatments().len(),
        data.doctors().len()
    );
    Ok(())
}

fn run_report() -> Result<()> {
    let store = AdminStore::open(db_path())?;
    let (data, source) = store.load()?;
    let report = prepare_report(data.as_ref());

    println!("🏥 Clinic Intake - Admin Report");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Data source: {}", source.as_str());
    println!();
    println!("📊 KPIs");
    println!("  People:          {}", report.kpis.total_people);
    println!("  Payment methods: {}", report.kpis.total_payment_types);
    println!("  Treatments:      {}", report.kpis.total_treatments);
    println!("  Doctors:         {}", report.kpis.total_doctors);

    if !report.charts.payments_by_score.is_empty() {
        println!();
        println!("💳 Payment methods by best score");
        for payment in &report.charts.payments_by_score {
            println!(
                "  {} {} ({})",
                payment.stars, payment.name, payment.best_score
            );
        }
    }

    if !report.charts.treatment_profit_buckets.is_empty() {
        println!();
        println!("🦷 Treatments by profitability");
        for bucket in &report.charts.treatment_profit_buckets {
            println!("  {}: {}", bucket.name, bucket.value);
        }
    }

    if !report.charts.doctors_by_specialty.is_empty() {
        println!();
        println!("🩺 Doctors by specialty");
        for bucket in &report.charts.doctors_by_specialty {
            println!("  {}: {}", bucket.name, bucket.value);
        }
    }

    Ok(())
}

fn run_export(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or("admin-report.csv");

    let store = AdminStore::open(db_path())?;
    let (data, _source) = store.load()?;
    let report = prepare_report(data.as_ref());

    if path.ends_with(".json") {
        fs::write(path, report_to_json(&report)?)
            .with_context(|| format!("Failed to write {}", path))?;
    } else {
        fs::write(path, report_to_csv(&report)?)
            .with_context(|| format!("Failed to write {}", path))?;
    }

    println!("✓ Report exported to {}", path);
    Ok(())
}
