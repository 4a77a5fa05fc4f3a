use anyhow::{Context, Result};
use clap::{ArgGroup, CommandFactory, Parser, ValueEnum};
use cmdbctl::cmdb::http::format_cmdb_error;
use cmdbctl::config::Overrides;
use cmdbctl::{output, CmdbClient, CmdbError, CmdbResult, Config, UpdatePayload};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// List, inspect, and update ServiceNow CMDB server records
#[derive(Parser, Debug)]
#[command(name = "cmdbctl", version, about, long_about = None)]
#[command(group(
    ArgGroup::new("operation").args(["list_all", "get_server", "update_server"])
))]
struct Args {
    /// List all CMDB CI servers
    #[arg(long)]
    list_all: bool,

    /// Get details of a server by sys_id
    #[arg(long, value_name = "SYS_ID")]
    get_server: Option<String>,

    /// Update details of a server by sys_id
    #[arg(long, value_name = "SYS_ID")]
    update_server: Option<String>,

    /// New name for the server
    #[arg(long, requires = "update_server", conflicts_with_all = ["list_all", "get_server"])]
    name: Option<String>,

    /// New description for the server
    #[arg(long, requires = "update_server", conflicts_with_all = ["list_all", "get_server"])]
    description: Option<String>,

    /// ServiceNow instance name (<instance>.service-now.com)
    #[arg(long)]
    instance: Option<String>,

    /// CI table to query
    #[arg(long)]
    table: Option<String>,

    /// Full base URL, replacing the instance-derived one
    #[arg(long)]
    base_url: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

#[derive(Debug, PartialEq)]
enum Operation {
    ListAll,
    Get(String),
    Update {
        sys_id: String,
        payload: UpdatePayload,
    },
}

impl Args {
    /// The requested operation, or `None` if no operation flag was given.
    /// Update arguments are validated here, before any request is made.
    fn operation(&self) -> CmdbResult<Option<Operation>> {
        if self.list_all {
            return Ok(Some(Operation::ListAll));
        }
        if let Some(sys_id) = self.get_server.clone().filter(|s| !s.is_empty()) {
            return Ok(Some(Operation::Get(sys_id)));
        }
        if let Some(sys_id) = self.update_server.clone().filter(|s| !s.is_empty()) {
            let payload = UpdatePayload::new(self.name.clone(), self.description.clone())?;
            return Ok(Some(Operation::Update { sys_id, payload }));
        }
        Ok(None)
    }

    fn overrides(&self) -> Overrides {
        Overrides {
            instance: self.instance.clone(),
            table: self.table.clone(),
            base_url: self.base_url.clone(),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Warning: logging disabled, cannot open {:?}: {}", log_path, err);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("cmdbctl started with log level: {:?}", level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("cmdbctl").join("cmdbctl.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".cmdbctl").join("cmdbctl.log");
    }
    PathBuf::from("cmdbctl.log")
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            if let Some(url) = err.downcast_ref::<CmdbError>().and_then(CmdbError::url) {
                tracing::error!("Request URL: {}", url);
            }
            for line in error_lines(&err) {
                eprintln!("{}", line);
            }
            ExitCode::FAILURE
        }
    }
}

/// Lines printed to stderr for a fatal error: the context chain, then a hint
fn error_lines(err: &anyhow::Error) -> Vec<String> {
    let mut lines = vec![format!("{:#}", err)];
    if let Some(hint) = err.downcast_ref::<CmdbError>().and_then(format_cmdb_error) {
        lines.push(hint.to_string());
    }
    lines
}

async fn run(args: &Args) -> Result<()> {
    let Some(operation) = args.operation()? else {
        Args::command().print_help()?;
        return Ok(());
    };

    let config = Config::load(&args.overrides()).context("Failed to load configuration")?;
    tracing::info!("Using table {} at {}", config.table, config.base_url());

    let client = CmdbClient::new(&config).context("Failed to create HTTP client")?;

    match operation {
        Operation::ListAll => {
            let servers = client
                .list_servers()
                .await
                .context("Error retrieving servers")?;
            output::write_server_list(&mut io::stdout().lock(), &servers)?;
        }
        Operation::Get(sys_id) => {
            let server = client
                .get_server(&sys_id)
                .await
                .context("Error fetching server")?;
            println!("{}", output::fetched_line(&server));
        }
        Operation::Update { sys_id, payload } => {
            client
                .update_server(&sys_id, &payload)
                .await
                .context("Error updating server")?;
            println!("{}", output::UPDATE_SUCCESS);
        }
    }

    Ok(())
}
