use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod analysis;
mod config;
mod directory;
mod editor;
mod models;
mod report;
mod roster;
mod shell;
mod state;
mod stats;

use config::AnalysisSettings;
use models::{StudentDraft, StudentStatus};
use state::{Action, Clock, Dashboard, Effect, SystemClock};

#[derive(Parser)]
#[command(name = "edustream")]
#[command(about = "Student records dashboard with AI performance insights", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Load the roster from a CSV file instead of the built-in sample students
    #[arg(long, global = true)]
    roster: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    analysis: AnalysisSettings,
}

#[derive(Subcommand)]
enum Commands {
    /// Show aggregate statistics
    Stats,
    /// List students whose name or email matches a query
    List {
        query: Option<String>,
        #[arg(long, value_enum, default_value_t = ListFormat::Table)]
        format: ListFormat,
    },
    /// Create a student and print the resulting directory
    Add {
        #[command(flatten)]
        fields: NewStudent,
    },
    /// Update a student; unspecified fields keep their current values
    Edit {
        id: String,
        #[command(flatten)]
        fields: StudentChanges,
    },
    /// Request an AI performance insight for one student
    Analyze { id: String },
    /// Write a markdown dashboard report
    Report {
        #[arg(long)]
        query: Option<String>,
        /// Include an AI insight for this student
        #[arg(long)]
        analyze: Option<String>,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// Interactive dashboard console
    Shell,
}

#[derive(Clone, Copy, ValueEnum)]
enum ListFormat {
    Table,
    Csv,
}

#[derive(clap::Args)]
struct NewStudent {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, default_value_t = 9, value_parser = clap::value_parser!(u8).range(9..=12))]
    grade: u8,
    #[arg(long, value_parser = parse_gpa_arg)]
    gpa: f64,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    attendance: u8,
    #[arg(long, value_enum, default_value_t = StudentStatus::Active)]
    status: StudentStatus,
    #[arg(long, default_value = "")]
    notes: String,
}

#[derive(clap::Args)]
struct StudentChanges {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(9..=12))]
    grade: Option<u8>,
    #[arg(long, value_parser = parse_gpa_arg)]
    gpa: Option<f64>,
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    attendance: Option<u8>,
    #[arg(long, value_enum)]
    status: Option<StudentStatus>,
    #[arg(long)]
    notes: Option<String>,
}

impl StudentChanges {
    fn apply(self, draft: &mut StudentDraft) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(email) = self.email {
            draft.email = email;
        }
        if let Some(grade) = self.grade {
            draft.grade_level = grade;
        }
        if let Some(gpa) = self.gpa {
            draft.gpa = gpa;
        }
        if let Some(attendance) = self.attendance {
            draft.attendance = attendance;
        }
        if let Some(status) = self.status {
            draft.status = status;
        }
        if let Some(notes) = self.notes {
            draft.notes = notes;
        }
    }
}

fn parse_gpa_arg(value: &str) -> Result<f64, String> {
    editor::parse_gpa(value).map_err(|e| e.to_string())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_dashboard(roster_path: Option<&PathBuf>) -> anyhow::Result<Dashboard> {
    let clock = SystemClock;
    let students = match roster_path {
        Some(path) => roster::import_csv(path, clock.today())?,
        None => roster::seed()?,
    };
    let dashboard = Dashboard::new(students, Box::new(clock));
    tracing::debug!(count = dashboard.students().len(), "roster loaded");
    Ok(dashboard)
}

fn print_directory(dashboard: &Dashboard) {
    print!("{}", report::directory_table(&dashboard.visible()));
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut dashboard =
        load_dashboard(cli.roster.as_ref()).context("failed to load the student roster")?;

    match cli.command {
        Commands::Stats => {
            for (label, value) in report::stat_cards(&dashboard.stats()) {
                println!("{label}: {value}");
            }
        }
        Commands::List { query, format } => {
            dashboard.dispatch(Action::FilterChanged(query.unwrap_or_default()))?;
            match format {
                ListFormat::Table => print_directory(&dashboard),
                ListFormat::Csv => {
                    roster::write_csv(std::io::stdout().lock(), &dashboard.visible())?;
                }
            }
        }
        Commands::Add { fields } => {
            let draft = StudentDraft {
                name: fields.name,
                email: fields.email,
                grade_level: fields.grade,
                gpa: fields.gpa,
                attendance: fields.attendance,
                status: fields.status,
                notes: fields.notes,
            };
            editor::check_draft(&draft)?;
            if let Effect::Created(id) = dashboard.dispatch(Action::RecordCreated(draft))? {
                println!("Created student {id}.");
            }
            print_directory(&dashboard);
        }
        Commands::Edit { id, fields } => {
            let existing = dashboard
                .find(&id)
                .with_context(|| format!("no student with id {id}"))?;
            let mut draft = editor::draft_from(existing);
            fields.apply(&mut draft);
            editor::check_draft(&draft)?;
            if let Effect::Updated(id) = dashboard.dispatch(Action::RecordUpdated { id, draft })? {
                println!("Updated student {id}.");
            }
            print_directory(&dashboard);
        }
        Commands::Analyze { id } => {
            let analyzer = cli.analysis.analyzer();
            analyze_into(&mut dashboard, &analyzer, &id).await?;
            if let Some(section) = report::overlay_section(dashboard.overlay()) {
                print!("{section}");
            }
        }
        Commands::Report {
            query,
            analyze,
            out,
        } => {
            dashboard.dispatch(Action::FilterChanged(query.unwrap_or_default()))?;
            if let Some(id) = analyze {
                let analyzer = cli.analysis.analyzer();
                analyze_into(&mut dashboard, &analyzer, &id).await?;
            }
            let report = report::build_report(&dashboard, dashboard.today());
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Shell => {
            let analyzer: Arc<dyn analysis::Analyzer> = Arc::new(cli.analysis.analyzer());
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            let mut stdout = std::io::stdout();
            shell::run(&mut dashboard, analyzer, input, &mut stdout).await?;
        }
    }

    Ok(())
}

/// Runs one analysis to completion. A failed request leaves the overlay in
/// its failed state rather than aborting the command.
async fn analyze_into(
    dashboard: &mut Dashboard,
    analyzer: &dyn analysis::Analyzer,
    id: &str,
) -> anyhow::Result<()> {
    let Effect::StartAnalysis(ticket) = dashboard.dispatch(Action::AnalysisRequested {
        student_id: id.to_string(),
    })?
    else {
        return Ok(());
    };

    let action = match analysis::analyze_student(analyzer, &ticket.student).await {
        Some(analysis) => Action::AnalysisResolved {
            seq: ticket.seq,
            analysis,
        },
        None => Action::AnalysisFailed { seq: ticket.seq },
    };
    dashboard.dispatch(action)?;
    Ok(())
}
