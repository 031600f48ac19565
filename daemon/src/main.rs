use std::{fs::File, io::BufReader, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::{error, info};
use harvest_common::{
    config::VERSION,
    get_cli_styles,
    logger::{default_logs_datetime_format, init_logger, LogLevel, LoggerConfig, ModuleConfig},
};
use harvest_daemon::{
    config::{DEFAULT_RPC_BIND_ADDRESS, DEFAULT_RPC_WORKERS, DEFAULT_STORAGE_DIR},
    core::{
        storage::{MemoryStorage, SledStorage, Storage},
        AccrualScheduler, Ledger, LedgerConfig,
    },
    rpc::{LedgerRpcServer, RpcConfig},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StorageBackend {
    /// Everything is lost on exit, for tests and demos
    Memory,
    Sled,
}

#[derive(Parser, Debug)]
#[clap(version = VERSION, about = "Harvest ledger & accrual daemon")]
#[command(styles = get_cli_styles())]
pub struct CliConfig {
    /// Set log level
    #[clap(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Set file log level, by default the same as the console
    #[clap(long, value_enum)]
    file_log_level: Option<LogLevel>,

    /// Disable the log file
    #[clap(long)]
    disable_file_logging: bool,

    /// Use a single log file instead of one per day
    #[clap(long)]
    disable_file_log_date_based: bool,

    /// Disable the usage of colors in log
    #[clap(long)]
    disable_log_color: bool,

    #[clap(long, default_value_t = String::from("harvest-daemon.log"))]
    filename_log: String,

    #[clap(long, default_value_t = String::from("logs/"))]
    logs_path: String,

    /// Per module log level, written module=level
    #[clap(long)]
    logs_modules: Vec<ModuleConfig>,

    #[clap(long, default_value_t = default_logs_datetime_format())]
    datetime_format: String,

    #[clap(long, value_enum, default_value_t = StorageBackend::Sled)]
    storage: StorageBackend,

    /// Directory of the sled database
    #[clap(long, default_value_t = String::from(DEFAULT_STORAGE_DIR))]
    dir_path: String,

    /// JSON file with the ledger rules, defaults are used without it
    #[clap(long)]
    config_file: Option<String>,

    #[clap(long, default_value_t = String::from(DEFAULT_RPC_BIND_ADDRESS))]
    rpc_bind_address: String,

    #[clap(long, default_value_t = DEFAULT_RPC_WORKERS)]
    rpc_workers: usize,

    /// Only serve user methods, even to loopback clients
    #[clap(long)]
    disable_admin_rpc: bool,

    /// Do not start the RPC server
    #[clap(long)]
    disable_rpc: bool,

    /// Seconds between two accrual sweeps, overrides the config file
    #[clap(long)]
    sweep_interval: Option<u64>,

    /// Do not run the periodic accrual sweep
    #[clap(long)]
    disable_sweep: bool,
}

fn load_config(path: Option<&str>) -> Result<LedgerConfig> {
    let Some(path) = path else {
        return Ok(LedgerConfig::default());
    };

    let file = File::open(path).with_context(|| format!("Error while opening config file {}", path))?;
    let config: LedgerConfig = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Error while parsing config file {}", path))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CliConfig::parse();

    init_logger(LoggerConfig {
        level: cli.log_level,
        file_level: cli.file_log_level.unwrap_or(cli.log_level),
        dir_path: &cli.logs_path,
        filename_log: &cli.filename_log,
        disable_file_logging: cli.disable_file_logging,
        disable_file_log_date_based: cli.disable_file_log_date_based,
        disable_colors: cli.disable_log_color,
        module_logs: cli.logs_modules.clone(),
        logs_datetime_format: cli.datetime_format.clone(),
    })?;

    info!("Harvest daemon v{}", VERSION);

    let mut config = load_config(cli.config_file.as_deref())?;
    if let Some(interval) = cli.sweep_interval {
        config.sweep_interval_secs = interval;
    }

    match cli.storage {
        StorageBackend::Memory => {
            info!("Using in-memory storage, nothing will be persisted");
            run(MemoryStorage::new(), config, &cli).await
        }
        StorageBackend::Sled => {
            info!("Opening sled storage at {}", cli.dir_path);
            let storage = SledStorage::open(&cli.dir_path).context("Error while opening storage")?;
            run(storage, config, &cli).await
        }
    }
}

async fn run<S: Storage>(storage: S, config: LedgerConfig, cli: &CliConfig) -> Result<()> {
    let sweep_interval = Duration::from_secs(config.sweep_interval_secs);
    let ledger = Arc::new(Ledger::new(storage, config).context("Invalid ledger configuration")?);

    let scheduler = if cli.disable_sweep {
        info!("Accrual sweep is disabled, contracts only accrue on session start");
        None
    } else {
        info!("Accrual sweep every {} seconds", sweep_interval.as_secs());
        Some(AccrualScheduler::start(Arc::clone(&ledger), sweep_interval))
    };

    let rpc = if cli.disable_rpc {
        None
    } else {
        let config = RpcConfig {
            bind_address: cli.rpc_bind_address.clone(),
            workers: cli.rpc_workers,
            allow_admin_methods: !cli.disable_admin_rpc,
        };
        Some(
            LedgerRpcServer::start(Arc::clone(&ledger), config)
                .await
                .context("Error while starting RPC server")?,
        )
    };

    info!("Daemon is running, press Ctrl-C to stop");
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Error while waiting for Ctrl-C: {}", e);
    }

    info!("Shutting down...");
    if let Some(rpc) = rpc {
        rpc.stop().await;
    }
    if let Some(scheduler) = scheduler {
        scheduler.stop().await;
    }
    ledger.flush().context("Error while flushing storage")?;
    info!("Bye");

    Ok(())
}
