//! GoodData CLI
//!
//! Render dataset MAQL and manifests, and create, load and migrate datasets
//! on GoodData.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use gooddata_client::{
    csv_to_rows, Connection, ConnectionConfig, Dataset, Error, MigrationEngine, MigrationOptions,
    Project, RemoteState, Report, UploadData, UploadMode, UploadOptions, DEFAULT_HOST,
    DEFAULT_WEBDAV_HOST,
};

#[derive(Parser)]
#[command(name = "gooddata")]
#[command(about = "Manage GoodData datasets declared as JSON")]
#[command(version)]
struct Cli {
    /// Log every request (overrides RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where and as whom to connect.
#[derive(Args)]
struct RemoteArgs {
    /// Project identifier
    #[arg(long)]
    project: Option<String>,

    #[arg(long, env = "GOODDATA_USERNAME")]
    username: Option<String>,

    #[arg(long, env = "GOODDATA_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, env = "GOODDATA_HOST", default_value = DEFAULT_HOST)]
    host: String,

    #[arg(long, env = "GOODDATA_WEBDAV_HOST", default_value = DEFAULT_WEBDAV_HOST)]
    webdav_host: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the MAQL creating a dataset
    Maql {
        /// Dataset declaration (JSON)
        dataset: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Print the SLI manifest of a dataset
    Manifest {
        /// Dataset declaration (JSON)
        dataset: PathBuf,

        /// Full load instead of incremental
        #[arg(long)]
        full: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Show how a remote dataset differs from its declaration
    Diff {
        dataset: PathBuf,

        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Bring a remote dataset in line with its declaration
    Migrate {
        dataset: PathBuf,

        /// Write the generated MAQL to this file
        #[arg(long)]
        dump: Option<PathBuf>,

        /// Generate the MAQL without executing it
        #[arg(long)]
        dry_run: bool,

        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Load a CSV file into a dataset, creating the dataset if needed
    Upload {
        dataset: PathBuf,

        /// CSV file with a header row
        data: PathBuf,

        /// Full load instead of incremental
        #[arg(long)]
        full: bool,

        /// Keep a copy of the uploaded CSV
        #[arg(long)]
        keep_csv: Option<PathBuf>,

        /// Build the archive without sending it (no credentials needed)
        #[arg(long)]
        no_upload: bool,

        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Create a dataset and its date dimensions
    Create {
        dataset: PathBuf,

        #[command(flatten)]
        remote: RemoteArgs,
    },

    /// Export a report as CSV
    Report {
        /// Report object id
        report: String,

        /// Output file
        #[arg(long)]
        output: PathBuf,

        #[command(flatten)]
        remote: RemoteArgs,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Maql { dataset, output } => run_maql(&dataset, output.as_deref()),
        Commands::Manifest {
            dataset,
            full,
            pretty,
        } => run_manifest(&dataset, full, pretty),
        Commands::Diff { dataset, remote } => run_diff(&dataset, &remote),
        Commands::Migrate {
            dataset,
            dump,
            dry_run,
            remote,
        } => {
            let mut options = MigrationOptions::new().dry_run(dry_run);
            options.dump_path = dump;
            run_migrate(&dataset, options, &remote)
        }
        Commands::Upload {
            dataset,
            data,
            full,
            keep_csv,
            no_upload,
            remote,
        } => run_upload(UploadArgs {
            dataset,
            data,
            full,
            keep_csv,
            no_upload,
            remote,
        }),
        Commands::Create { dataset, remote } => run_create(&dataset, &remote),
        Commands::Report {
            report,
            output,
            remote,
        } => run_report(&report, &output, &remote),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
}

/// Print an error and turn it into an exit code.
fn fail(context: &str, err: Error) -> u8 {
    eprintln!("Error {}: {}", context, err);
    err.exit_code() as u8
}

fn load_dataset(path: &Path) -> Result<Dataset, u8> {
    Dataset::load(path).map_err(|e| fail(&format!("loading {}", path.display()), e))
}

fn required<'a>(value: &'a Option<String>, flag: &str) -> Result<&'a str, u8> {
    value.as_deref().ok_or_else(|| {
        eprintln!("Error: --{} is required", flag);
        2u8
    })
}

/// Open a session. Fails early when the project is not set either.
fn login(remote: &RemoteArgs) -> Result<Connection, u8> {
    required(&remote.project, "project")?;
    let username = required(&remote.username, "username")?;
    let password = required(&remote.password, "password")?;
    let config = ConnectionConfig::new()
        .host(remote.host.as_str())
        .webdav_host(remote.webdav_host.as_str());
    Connection::login(config, username, password).map_err(|e| fail("logging in", e))
}

fn open_project<'c>(connection: &'c Connection, remote: &RemoteArgs) -> Result<Project<'c>, u8> {
    let id = required(&remote.project, "project")?;
    Ok(Project::load_by_id(connection, id))
}

fn run_maql(dataset_path: &Path, output: Option<&Path>) -> Result<(), u8> {
    let dataset = load_dataset(dataset_path)?;
    let maql = dataset.maql();

    match output {
        Some(path) => {
            std::fs::write(path, &maql).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", maql);
        }
    }
    Ok(())
}

fn run_manifest(dataset_path: &Path, full: bool, pretty: bool) -> Result<(), u8> {
    let dataset = load_dataset(dataset_path)?;
    let manifest = dataset.manifest(UploadMode::from_full_flag(full));

    let json_output = if pretty {
        serde_json::to_string_pretty(&manifest)
    } else {
        serde_json::to_string(&manifest)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    println!("{}", json_output);
    Ok(())
}

fn run_diff(dataset_path: &Path, remote: &RemoteArgs) -> Result<(), u8> {
    let dataset = load_dataset(dataset_path)?;
    let connection = login(remote)?;
    let project = open_project(&connection, remote)?;

    let diff = RemoteState::new(&project, dataset.name())
        .diff(&dataset)
        .map_err(|e| fail("reading remote dataset", e))?;

    if diff.is_empty() {
        println!("{} is synchronised", dataset.name());
        return Ok(());
    }
    for (name, column) in &diff.added {
        println!("+ {} ({})", name, column.kind().ldm_type());
    }
    for (name, altered) in &diff.altered {
        println!(
            "~ {} ({} -> {})",
            name,
            altered.old.kind().ldm_type(),
            altered.new.kind().ldm_type()
        );
    }
    for (name, column) in &diff.deleted {
        println!("- {} ({})", name, column.kind().ldm_type());
    }
    Ok(())
}

fn run_migrate(
    dataset_path: &Path,
    options: MigrationOptions,
    remote: &RemoteArgs,
) -> Result<(), u8> {
    let dataset = load_dataset(dataset_path)?;
    let dry_run = options.dry_run;
    let connection = login(remote)?;
    let project = open_project(&connection, remote)?;

    let chain = MigrationEngine::new(&project, options)
        .migrate(&dataset)
        .map_err(|e| fail("migrating", e))?;

    if chain.is_empty() {
        println!("{} is synchronised", dataset.name());
    } else if dry_run {
        println!("{}", chain.maql());
    } else {
        println!("{}: {} actions applied", dataset.name(), chain.len());
    }
    Ok(())
}

struct UploadArgs {
    dataset: PathBuf,
    data: PathBuf,
    full: bool,
    keep_csv: Option<PathBuf>,
    no_upload: bool,
    remote: RemoteArgs,
}

fn run_upload(args: UploadArgs) -> Result<(), u8> {
    let UploadArgs {
        dataset: dataset_path,
        data: data_path,
        full,
        keep_csv,
        no_upload,
        remote,
    } = args;
    let dataset = load_dataset(&dataset_path)?;

    let content = std::fs::read_to_string(&data_path).map_err(|e| {
        eprintln!("Error reading {}: {}", data_path.display(), e);
        3u8
    })?;
    let rows = csv_to_rows(&content).map_err(|e| fail("parsing CSV", e))?;
    let data = UploadData::Rows(rows);
    let mode = UploadMode::from_full_flag(full);

    if no_upload {
        let archive = dataset
            .archive(&data, mode, keep_csv.as_deref())
            .map_err(|e| fail("building archive", e))?;
        println!("{} bytes archived, nothing uploaded", archive.len());
        return Ok(());
    }

    let connection = login(&remote)?;
    let project = open_project(&connection, &remote)?;

    let mut options = UploadOptions::new();
    if full {
        options = options.full();
    }
    if let Some(path) = keep_csv {
        options = options.keep_csv(path);
    }
    let dir = project
        .upload_dataset(&dataset, &data, &options)
        .map_err(|e| fail("uploading", e))?;
    if let Some(dir) = dir {
        println!("uploaded {} through {}", dataset.name(), dir);
    }
    Ok(())
}

fn run_create(dataset_path: &Path, remote: &RemoteArgs) -> Result<(), u8> {
    let dataset = load_dataset(dataset_path)?;
    let connection = login(remote)?;
    let project = open_project(&connection, remote)?;

    project
        .create_dataset(&dataset)
        .map_err(|e| fail("creating dataset", e))?;
    println!("created {}", dataset.name());
    Ok(())
}

fn run_report(report_id: &str, output: &Path, remote: &RemoteArgs) -> Result<(), u8> {
    let connection = login(remote)?;
    let project = open_project(&connection, remote)?;

    Report::new(&project, report_id)
        .save(output)
        .map_err(|e| fail("exporting report", e))?;
    println!("saved report {} to {}", report_id, output.display());
    Ok(())
}
