//! data-loader: load the healthcare stroke dataset into the patient database.
//!
//! Usage:
//!   cargo run -p data-loader -- load              # import only if empty
//!   cargo run -p data-loader -- reload            # clear and re-import
//!   cargo run -p data-loader -- verify            # print a summary
//!   cargo run -p data-loader -- load --csv data/stroke.csv --db sqlite:strokedb.db

use anyhow::{bail, Context, Result};
use patient_store::dataset::DEFAULT_DATASET_PATH;
use patient_store::{
    DatasetImporter, DatasetSummary, ImportOutcome, PageRequest, PatientDb, PatientFilter,
    SortField, SortOrder,
};

const DEFAULT_DATABASE_URL: &str = "sqlite:strokedb.db";
/// Rows shown by `verify`.
const SAMPLE_ROWS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Load,
    Reload,
    Verify,
}

#[derive(Debug)]
struct Args {
    command: Command,
    csv_path: String,
    database_url: String,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut command = None;
    let mut csv_path = DEFAULT_DATASET_PATH.to_string();
    let mut database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "load" => command = Some(Command::Load),
            "reload" => command = Some(Command::Reload),
            "verify" => command = Some(Command::Verify),
            "--csv" => csv_path = iter.next().context("--csv needs a path")?.clone(),
            "--db" => database_url = iter.next().context("--db needs a database URL")?.clone(),
            other => bail!("Unknown argument: {} (expected load, reload or verify)", other),
        }
    }

    Ok(Args {
        command: command.unwrap_or(Command::Load),
        csv_path,
        database_url,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "data_loader=info,patient_store=info,sqlx=warn".into()),
        )
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let args = parse_args(&argv)?;

    let db = PatientDb::new(&args.database_url)
        .await
        .with_context(|| format!("Failed to open {}", args.database_url))?;
    let importer = DatasetImporter::new(db.patients());

    match args.command {
        Command::Load => match importer.import_if_empty(&args.csv_path).await? {
            ImportOutcome::Skipped { existing } => {
                tracing::info!("Dataset already loaded ({} records). Skipping.", existing)
            }
            ImportOutcome::Imported { inserted } => {
                tracing::info!("Loaded {} anonymized patient records", inserted)
            }
        },
        Command::Reload => {
            let outcome = importer
                .force_reload(&args.csv_path)
                .await
                .with_context(|| format!("Reload from {} failed", args.csv_path))?;
            tracing::info!("Deleted {} existing records", outcome.deleted);
            tracing::info!("Inserted {} new records", outcome.inserted);
        }
        Command::Verify => {
            let summary = importer.summary().await?;
            print_summary(&summary);

            let first_page = PageRequest::new(1, SAMPLE_ROWS, SortField::Age, SortOrder::Ascending);
            let sample = db.patients().find(&PatientFilter::default(), &first_page).await?;
            println!("\nFirst {} records by age:", sample.len());
            for p in &sample {
                println!(
                    "  {:<6} age {:>5}  glucose {:>7.2}  bmi {:>5}  {:<16} stroke={}",
                    p.gender,
                    p.age,
                    p.avg_glucose_level,
                    p.bmi.map(|b| format!("{:.1}", b)).unwrap_or_else(|| "N/A".to_string()),
                    p.smoking_status,
                    p.stroke
                );
            }
        }
    }

    Ok(())
}

fn print_summary(summary: &DatasetSummary) {
    println!("Total patients: {}", summary.total);

    let sections = [
        ("Gender", &summary.gender),
        ("Stroke", &summary.stroke),
        ("Hypertension", &summary.hypertension),
        ("Work type", &summary.work_type),
        ("Smoking status", &summary.smoking_status),
    ];
    for (title, counts) in sections {
        println!("\n{}:", title);
        for (value, count) in counts.iter() {
            println!("  {:<16} {:>6} ({:.1}%)", value, count, summary.percent(*count));
        }
    }

    match summary.age {
        Some((min, avg, max)) => {
            println!("\nAge: min {:.1}, avg {:.1}, max {:.1}", min, avg, max)
        }
        None => println!("\nAge: no records"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_to_load() {
        let parsed = parse_args(&[]).unwrap();
        assert_eq!(parsed.command, Command::Load);
        assert_eq!(parsed.csv_path, DEFAULT_DATASET_PATH);
    }

    #[test]
    fn parses_command_and_paths() {
        let parsed = parse_args(&args(&["verify", "--csv", "x.csv", "--db", "sqlite::memory:"]))
            .unwrap();
        assert_eq!(parsed.command, Command::Verify);
        assert_eq!(parsed.csv_path, "x.csv");
        assert_eq!(parsed.database_url, "sqlite::memory:");
    }

    #[test]
    fn rejects_unknown_arguments() {
        assert!(parse_args(&args(&["--dry-run"])).is_err());
        assert!(parse_args(&args(&["reload", "--csv"])).is_err());
    }
}
