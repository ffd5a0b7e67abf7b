use crate::infra::{
    InMemoryAdmissionRepository, InMemoryFileRepository, InMemoryProspectRepository,
    LocalFileStorage, TracingNotifier,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use continuing_education::admissions::{
    allowed_next, AdmissionQuery, AdmissionScope, AdmissionService, AdmissionState,
};
use continuing_education::auth::RoleRegistry;
use continuing_education::error::AppError;
use continuing_education::export::{admission_workbook, AdmissionExportFilters};
use continuing_education::locale::Locale;
use continuing_education::prospects::ProspectService;
use continuing_education::seed::SeedData;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(
    name = "Continuing Education Admissions",
    about = "Serve and inspect continuing-education admission records",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the admission state transition table
    States(StatesArgs),
    /// Write the admissions list of a seed file as CSV to stdout
    Export(ExportArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON file of admissions and prospects loaded before serving
    #[arg(long)]
    pub(crate) seed: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct StatesArgs {
    /// Label language (en or fr)
    #[arg(long, default_value = "en")]
    locale: Locale,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Seed file holding the admissions to export
    #[arg(long)]
    seed: PathBuf,
    /// Only export admissions to this formation acronym
    #[arg(long)]
    formation: Option<String>,
    /// Only export admissions of this faculty
    #[arg(long)]
    faculty: Option<String>,
    /// Only export admissions in this state, e.g. "Registration submitted"
    #[arg(long)]
    state: Option<AdmissionState>,
    /// Header and title language (en or fr)
    #[arg(long, default_value = "en")]
    locale: Locale,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::States(args) => print_states(args, std::io::stdout().lock()),
        Command::Export(args) => export_admissions(args, std::io::stdout().lock()),
    }
}

fn print_states<W: Write>(args: StatesArgs, mut out: W) -> Result<(), AppError> {
    for state in AdmissionState::ordered() {
        let line = match allowed_next(state) {
            Ok(next) => next
                .iter()
                .map(|target| target.label(args.locale))
                .collect::<Vec<_>>()
                .join(", "),
            Err(err) => err.to_string(),
        };
        writeln!(out, "{:<40} -> {}", state.label(args.locale), line)?;
    }
    Ok(())
}

fn export_admissions<W: Write>(args: ExportArgs, out: W) -> Result<(), AppError> {
    let roles = Arc::new(RoleRegistry::standard());
    let scratch = std::env::temp_dir().join("continuing-education-export");
    let admissions = AdmissionService::new(
        Arc::new(InMemoryAdmissionRepository::default()),
        Arc::new(InMemoryFileRepository::default()),
        Arc::new(LocalFileStorage::new(scratch)),
        Arc::new(TracingNotifier),
        roles.clone(),
    );
    let prospects = ProspectService::new(Arc::new(InMemoryProspectRepository::default()), roles);
    SeedData::from_path(&args.seed)?.load_into(&admissions, &prospects)?;

    let query = AdmissionQuery {
        formation: args.formation,
        faculty: args.faculty,
        state: args.state,
        ..AdmissionQuery::default()
    };
    let records = admissions.list(AdmissionScope::All, &query)?;
    let filters = AdmissionExportFilters {
        faculty: query.faculty,
        formation: query.formation,
        state: query.state,
    };

    admission_workbook("cli", &records, &filters, args.locale).write_csv(out)?;
    Ok(())
}
