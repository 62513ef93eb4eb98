use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use memsnap_core::platform::{native_dump_platform, native_system};
use memsnap_core::probe::ArchitectureProbe;
use memsnap_core::{list_processes, DumpEngine, DumpStrategy, MemoryDumper, OutputSpec, ProcessTarget, Table};
use memsnap_utils::{debug, info, init_logging, init_logging_with_level, LogFormat, LogLevel};

/// List processes and capture full-memory dumps, live or through a point-in-time snapshot.
#[derive(Parser, Debug)]
#[command(name = "memsnap")]
#[command(version)]
#[command(about = "List processes and capture full-memory dumps, live or through a point-in-time snapshot", long_about = None)]
struct Cli
{
    /// Log level (error, warn, info, debug, trace); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands
{
    /// List every visible process
    Ps
    {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Show the machine architecture
    Arch,
    /// Write a full-memory minidump of a process
    Dump
    {
        /// Process ID, or image name with or without `.exe`
        target: ProcessTarget,
        /// Directory for the dump file (default: current directory)
        #[arg(short, long, env = "MEMSNAP_OUTPUT_DIR")]
        output_dir: Option<PathBuf>,
        /// Dump file name (default: <processName>_<pid>.dmp)
        #[arg(short, long)]
        file_name: Option<String>,
        /// Read the live process (direct) or a point-in-time clone (snapshot)
        #[arg(short, long, default_value_t = DumpStrategy::Direct)]
        strategy: DumpStrategy,
        /// Output format for the result
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat
{
    /// Aligned text
    Table,
    /// JSON on stdout
    Json,
}

fn main() -> ExitCode
{
    let cli = Cli::parse();

    // Logs go to stderr; MEMSNAP_LOG_FORMAT and MEMSNAP_LOG_FILE apply either way
    let logging = match cli.log_level {
        Some(level) => init_logging_with_level(level, LogFormat::from_env()),
        None => init_logging(),
    };
    let _guard = match logging {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    match run_command(cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Run one subcommand; `Ok(false)` means it ran but reported failure
fn run_command(command: Commands) -> Result<bool, Box<dyn std::error::Error>>
{
    match command {
        Commands::Ps { format } => {
            let system = native_system()?;
            let records = list_processes(&system)?;
            debug!(count = records.len(), "listed processes");
            let table = Table::from_records(&records);
            match format {
                OutputFormat::Table => print!("{}", table.render()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&table)?),
            }
            Ok(true)
        }
        Commands::Arch => {
            let system = native_system()?;
            println!("{}", system.machine_architecture());
            Ok(true)
        }
        Commands::Dump {
            target,
            output_dir,
            file_name,
            strategy,
            format,
        } => {
            info!(%target, %strategy, "dumping process");
            let engine = DumpEngine::new(native_system()?, native_dump_platform()?, strategy);
            let output = OutputSpec {
                directory: output_dir,
                file_name,
            };
            let outcome = engine.dump(&target, &output);
            match format {
                OutputFormat::Table => {
                    if outcome.success {
                        println!("Dump written to {}", outcome.file_path.display());
                    } else {
                        eprintln!(
                            "Dump failed: {}",
                            outcome.failure.as_deref().unwrap_or("unknown error")
                        );
                    }
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
            }
            Ok(outcome.success)
        }
    }
}
