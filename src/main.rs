use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgGroup, Args, Parser, Subcommand};
use serde::Serialize;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use registration_academics::config::{Config, LOG_ENV_VAR};
use registration_academics::models::{Course, GradeRecord};
use registration_academics::{db, gpa, grading, ingest, report, schedule};

#[derive(Parser)]
#[command(name = "registration-academics")]
#[command(about = "GPA and weekly schedule tooling for the course registration portal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where a command reads its student data from.
#[derive(Args)]
#[command(group(
    ArgGroup::new("source")
        .args(["student", "grades_csv", "courses_csv"])
        .required(true)
        .multiple(true)
))]
struct Source {
    /// Student number to load from the database
    #[arg(long, conflicts_with_all = ["grades_csv", "courses_csv"])]
    student: Option<String>,
    /// Grade export to read instead of the database
    #[arg(long)]
    grades_csv: Option<PathBuf>,
    /// Registration export to read instead of the database
    #[arg(long)]
    courses_csv: Option<PathBuf>,
}

impl Source {
    /// Rejects CSV inputs the command would not read.
    fn check_inputs(&self, want_grades: bool, want_courses: bool) -> anyhow::Result<()> {
        if self.grades_csv.is_some() && !want_grades {
            anyhow::bail!("--grades-csv is not used by this command");
        }
        if self.courses_csv.is_some() && !want_courses {
            anyhow::bail!("--courses-csv is not used by this command");
        }
        Ok(())
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Load sample students, courses, grades and registrations
    Seed,
    /// Import grade records from a CSV file
    Import {
        #[arg(long)]
        csv: PathBuf,
    },
    /// Convert a percentage to a letter grade and points
    Grade {
        #[arg(long, allow_negative_numbers = true)]
        percentage: f64,
    },
    /// Compute cumulative and semester GPA
    Gpa {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        json: bool,
    },
    /// Place approved courses into the weekly grid
    Schedule {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown academic report
    Report {
        #[command(flatten)]
        source: Source,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

impl Commands {
    fn needs_database(&self) -> bool {
        match self {
            Commands::InitDb | Commands::Seed | Commands::Import { .. } => true,
            Commands::Grade { .. } => false,
            Commands::Gpa { source, .. }
            | Commands::Schedule { source, .. }
            | Commands::Report { source, .. } => source.student.is_some(),
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    // offline commands never read the environment
    let config = if cli.command.needs_database() {
        Config::from_env().context("invalid configuration")?
    } else {
        Config::default()
    };

    match cli.command {
        Commands::InitDb => {
            let pool = db::connect_with_retry(&config).await?;
            db::init_db(&pool).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let pool = db::connect_with_retry(&config).await?;
            db::seed(&pool).await?;
            println!("Seed data inserted.");
        }
        Commands::Import { csv } => {
            let pool = db::connect_with_retry(&config).await?;
            let summary = db::import_grades_csv(&pool, &csv).await?;
            println!(
                "Inserted {} grade records from {} ({} rejected).",
                summary.inserted,
                csv.display(),
                summary.rejected
            );
        }
        Commands::Grade { percentage } => {
            let letter_grade = grading::percentage_to_letter_grade(percentage);
            println!(
                "{percentage}% -> {letter_grade} ({:.2} points)",
                grading::letter_grade_to_points(letter_grade)
            );
        }
        Commands::Gpa { source, json } => {
            let data = load(&config, &source, true, false).await?;
            let result = gpa::calculate_gpa(&data.grades);

            if json {
                print_json(&result)?;
                return Ok(());
            }

            println!("{}", data.label);
            println!(
                "GPA {:.2} (semester {:.2}) - {} / {}",
                result.gpa,
                result.semester_gpa,
                result.academic_status.label_en(),
                result.academic_status.label_ar()
            );
            println!(
                "{} hours passed, {} failed, {:.2}% complete, {} remaining",
                result.total_hours_passed,
                result.total_hours_failed,
                result.completion_percentage,
                result.remaining_hours
            );
        }
        Commands::Schedule { source, json } => {
            let data = load(&config, &source, false, true).await?;
            let outcome = schedule::generate_schedule(&data.courses);

            if json {
                print_json(&outcome)?;
                return Ok(());
            }

            if outcome.slots().is_empty() {
                println!("No approved registrations for {}.", data.label);
                return Ok(());
            }

            print!("{}", report::schedule_grid(outcome.slots()));
            for session in outcome.unplaced() {
                println!(
                    "warning: {} has {} session(s) without a free slot",
                    session.course_code, session.missing_sessions
                );
            }
        }
        Commands::Report { source, out } => {
            let data = load(&config, &source, true, true).await?;
            let result = gpa::calculate_gpa(&data.grades);
            let terms = gpa::term_summaries(&data.grades);
            let outcome = schedule::generate_schedule(&data.courses);
            let today = chrono::Utc::now().date_naive();
            let report = report::build_report(&data.label, today, &result, &terms, &outcome);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

struct StudentData {
    label: String,
    grades: Vec<GradeRecord>,
    courses: Vec<Course>,
}

/// Loads grades and/or courses from CSV files when given, otherwise from the
/// database (which requires the backend to be enabled).
async fn load(
    config: &Config,
    source: &Source,
    want_grades: bool,
    want_courses: bool,
) -> anyhow::Result<StudentData> {
    source.check_inputs(want_grades, want_courses)?;

    if let Some(student_number) = source.student.as_deref() {
        let pool = db::connect_with_retry(config).await?;
        return load_from_db(&pool, student_number, want_grades, want_courses).await;
    }

    let mut data = StudentData {
        label: "offline input".to_string(),
        grades: Vec::new(),
        courses: Vec::new(),
    };

    if want_grades {
        if let Some(path) = source.grades_csv.as_deref() {
            let import = ingest::read_grade_records(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            if !import.rejected.is_empty() {
                info!(rejected = import.rejected.len(), "some grade rows were left out");
            }
            data.grades = import.records;
            data.label = label_for(path);
        }
    }
    if want_courses {
        if let Some(path) = source.courses_csv.as_deref() {
            data.courses = ingest::read_courses(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            if !want_grades || source.grades_csv.is_none() {
                data.label = label_for(path);
            }
        }
    }

    Ok(data)
}

async fn load_from_db(
    pool: &PgPool,
    student_number: &str,
    want_grades: bool,
    want_courses: bool,
) -> anyhow::Result<StudentData> {
    let student = db::fetch_student(pool, student_number).await?;
    let grades = if want_grades {
        db::fetch_grade_records(pool, student_number).await?
    } else {
        Vec::new()
    };
    let courses = if want_courses {
        db::fetch_approved_courses(pool, student_number).await?
    } else {
        Vec::new()
    };

    Ok(StudentData {
        label: format!("{} ({})", student.full_name, student.student_number),
        grades,
        courses,
    })
}

fn label_for(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("registration-academics").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn only_database_commands_read_config() {
        assert!(!parse(&["grade", "--percentage", "87"]).command.needs_database());
        assert!(!parse(&["gpa", "--grades-csv", "g.csv"]).command.needs_database());
        assert!(!parse(&["report", "--grades-csv", "g.csv", "--courses-csv", "c.csv"])
            .command
            .needs_database());
        assert!(parse(&["gpa", "--student", "441100231"]).command.needs_database());
        assert!(parse(&["init-db"]).command.needs_database());
        assert!(parse(&["import", "--csv", "g.csv"]).command.needs_database());
    }

    #[test]
    fn inputs_a_command_ignores_are_rejected() {
        let Commands::Schedule { source, .. } = parse(&["schedule", "--grades-csv", "g.csv"]).command
        else {
            panic!("expected schedule");
        };
        assert!(source.check_inputs(false, true).is_err());

        let Commands::Gpa { source, .. } = parse(&["gpa", "--courses-csv", "c.csv"]).command else {
            panic!("expected gpa");
        };
        assert!(source.check_inputs(true, false).is_err());

        let Commands::Report { source, .. } =
            parse(&["report", "--grades-csv", "g.csv", "--courses-csv", "c.csv"]).command
        else {
            panic!("expected report");
        };
        assert!(source.check_inputs(true, true).is_ok());
    }

    #[test]
    fn student_conflicts_with_csv_inputs() {
        let args = ["registration-academics", "gpa", "--student", "1", "--grades-csv", "g.csv"];
        assert!(Cli::try_parse_from(args).is_err());
    }
}
