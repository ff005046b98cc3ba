#![warn(clippy::all, rust_2018_idioms)]

use std::process::ExitCode;
use std::sync::Mutex;

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::prelude::*;

use cwtail::app::cli::Cli;
use cwtail::app::tail::{terminal, SessionEnd};

const DEFAULT_FILTER: &str = "cwtail=info,aws_config=warn,aws_sigv4=warn,aws_smithy_runtime=warn,aws_smithy_runtime_api=warn,hyper=warn";
const VERBOSE_FILTER: &str = "cwtail=debug,aws_config=info,aws_smithy_runtime=warn,hyper=warn";

fn log_dir() -> Option<std::path::PathBuf> {
    directories::ProjectDirs::from("com", "", "cwtail").map(|dirs| dirs.data_dir().join("logs"))
}

fn init_logging(verbose: bool) {
    // Standard output is the log display, so diagnostics go to a file
    let Some(log_dir) = log_dir() else {
        return;
    };
    if std::fs::create_dir_all(&log_dir).is_err() {
        return;
    }

    let log_path = log_dir.join("cwtail.log");
    let file = match std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(_) => return,
    };

    // Set restrictive permissions (owner read/write only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let _ = std::fs::set_permissions(&log_path, std::fs::Permissions::from_mode(0o600));
    }

    // RUST_LOG wins over the built-in levels
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER })
    });

    let subscriber = tracing_subscriber::registry().with(filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(Mutex::new(file))
            .with_ansi(false), // No ANSI colors in file
    );

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        tracing::info!("Logging initialized to: {:?}", log_path);
    }
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        // Give the user their terminal back before anything else
        let _ = terminal::restore();

        let crash_msg = format!(
            "cwtail crashed!\n\
             Panic occurred at: {}\n\
             Details: {}\n\
             Backtrace:\n{:?}\n",
            panic_info
                .location()
                .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                .unwrap_or_else(|| "unknown location".to_string()),
            panic_info
                .payload()
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic_info.payload().downcast_ref::<String>().map(|s| s.as_str()))
                .unwrap_or("unknown panic"),
            std::backtrace::Backtrace::force_capture()
        );

        eprintln!("\n{}", crash_msg);

        if let Some(log_dir) = log_dir() {
            let _ = std::fs::create_dir_all(&log_dir);
            let crash_log_path = log_dir.join("crash.log");

            if let Ok(mut file) = std::fs::OpenOptions::new()
                .append(true)
                .create(true)
                .open(&crash_log_path)
            {
                use std::io::Write;
                let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
                let _ = writeln!(file, "\n=== CRASH at {} ===\n{}", timestamp, crash_msg);
                eprintln!("Crash log written to: {:?}", crash_log_path);
            }
        }
    }));
}

fn main() -> ExitCode {
    // Set up panic handler BEFORE anything else so raw mode is always undone
    setup_panic_handler();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // --help and --version are not failures
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_logging(cli.verbose);

    let config = match cli.into_config(Utc::now()) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Invalid configuration: {:#}", err);
            eprintln!("Error: {:#}", err);
            return ExitCode::FAILURE;
        }
    };

    // One thread: the poller, keystrokes and rendering take turns on it
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Error: failed to start async runtime: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let outcome = runtime.block_on(cwtail::app::run_tail(config));
    // Don't wait on in-flight requests after an interrupt
    runtime.shutdown_background();

    match outcome {
        Ok(SessionEnd::Completed) => ExitCode::SUCCESS,
        Ok(SessionEnd::Interrupted) => {
            tracing::info!("Session interrupted by user");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("Session failed: {:#}", err);
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
