use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

mod advisor;
mod dashboard;
mod gemini;
mod mock;
mod models;
mod report;
mod stats;
mod store;

#[derive(Parser)]
#[command(name = "edpulse")]
#[command(about = "Student risk dashboard with AI-generated intervention plans", long_about = None)]
struct Cli {
    /// Cohort file holding the loaded student records
    #[arg(long, global = true, default_value = "cohort.json")]
    cohort_file: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the demo dataset
    Generate {
        #[arg(long, default_value_t = mock::DEFAULT_COUNT)]
        count: usize,
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Load student records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Show cohort statistics and the priority intervention list
    Dashboard {
        #[arg(long, default_value_t = stats::PRIORITY_LIST_LEN)]
        limit: usize,
        /// Ask the model for an executive summary of the cohort
        #[arg(long)]
        insights: bool,
    },
    /// Show one student's profile
    Profile {
        #[arg(long)]
        id: String,
    },
    /// Generate an AI risk analysis for one student
    Analyze {
        #[arg(long)]
        id: String,
        /// Regenerate even when an analysis is already stored
        #[arg(long)]
        force: bool,
    },
    /// Generate an executive summary of the cohort
    Insights,
    /// Generate a markdown report
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long)]
        insights: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let cohort_file = cli.cohort_file;

    match cli.command {
        Commands::Generate { count, seed } => {
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let students = mock::generate_mock_data(&mut rng, count)?;
            store::save_cohort(&cohort_file, &students)?;
            info!(count = students.len(), path = %cohort_file.display(), "demo dataset generated");
            println!("Generated {} students into {}.", students.len(), cohort_file.display());
        }
        Commands::Import { csv } => {
            let students = store::import_csv(&csv)?;
            store::save_cohort(&cohort_file, &students)?;
            println!("Imported {} students from {}.", students.len(), csv.display());
        }
        Commands::Dashboard { limit, insights } => {
            let students = store::load_cohort(&cohort_file)?;
            let summary = if insights {
                advisor::cohort_insights_or_none(&gemini::EnvGeminiClient, &students).await
            } else {
                None
            };
            print!("{}", dashboard::render_dashboard(&students, summary.as_deref(), limit));
        }
        Commands::Profile { id } => {
            let students = store::load_cohort(&cohort_file)?;
            let student = store::find_student(&students, &id)?;
            print!("{}", dashboard::render_profile(student));
        }
        Commands::Analyze { id, force } => {
            let students = store::load_cohort(&cohort_file)?;
            let (students, source) =
                advisor::analyze_cached(&gemini::EnvGeminiClient, students, &id, force).await?;
            if source == advisor::AnalysisSource::Generated {
                store::save_cohort(&cohort_file, &students)?;
            }
            print!("{}", dashboard::render_profile(store::find_student(&students, &id)?));
        }
        Commands::Insights => {
            let students = store::load_cohort(&cohort_file)?;
            if students.is_empty() {
                anyhow::bail!("no student records in {}", cohort_file.display());
            }
            let client = gemini::GeminiClient::from_env().context("Gemini client not configured")?;
            let text = advisor::generate_cohort_insights(&client, &students).await?;
            println!("{text}");
        }
        Commands::Report { out, insights } => {
            let students = store::load_cohort(&cohort_file)?;
            let summary = if insights {
                advisor::cohort_insights_or_none(&gemini::EnvGeminiClient, &students).await
            } else {
                None
            };
            let cohort = single_cohort(&students);
            let report = report::build_report(
                cohort.as_deref(),
                Utc::now().date_naive(),
                &students,
                summary.as_deref(),
            );
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn single_cohort(students: &[models::Student]) -> Option<String> {
    let first = students.first()?;
    students
        .iter()
        .all(|s| s.cohort == first.cohort)
        .then(|| first.cohort.clone())
}
