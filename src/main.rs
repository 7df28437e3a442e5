use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;

use clap::{Args, Parser};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, error, info, Level};

use xcloud_listener::codec::{ByteOrder, OversizePolicy, DEFAULT_BUFFER_SIZE};
use xcloud_listener::config::{HostConfig, LogConfig, APP_NAME, DEFAULT_PORT};
use xcloud_listener::host::{run_stdio, spawn_writer};
use xcloud_listener::logging::init_logging;
use xcloud_listener::{http, NmError};

#[derive(Parser)]
#[command(name = APP_NAME, author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[cfg(feature = "install")]
    #[command(subcommand)]
    command: Option<manage::Command>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args)]
struct RunArgs {
    /// Port of the HTTP trigger endpoint
    #[arg(long, env = "XCLOUD_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Address the HTTP trigger binds to
    #[arg(long, env = "XCLOUD_BIND", default_value = "0.0.0.0")]
    bind: IpAddr,

    /// Largest incoming message, in bytes
    #[arg(long, env = "XCLOUD_BUFFER_SIZE", default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// What to do with incoming messages larger than the buffer
    #[arg(long, env = "XCLOUD_OVERSIZE", value_enum, default_value_t = OversizePolicy::Skip)]
    oversize: OversizePolicy,

    /// Log file (appended to)
    #[arg(long, env = "XCLOUD_LOG_FILE", value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Log level, overridden by RUST_LOG
    #[arg(long, env = "XCLOUD_LOG_LEVEL", default_value = "info")]
    log_level: Level,

    /// Caller origin (Chrome) or manifest path and add-on ID (Firefox)
    #[arg(hide = true)]
    caller: Vec<String>,

    /// Passed by Chrome on Windows
    #[arg(long, hide = true)]
    parent_window: Option<String>,
}

impl From<&RunArgs> for HostConfig {
    fn from(args: &RunArgs) -> Self {
        let defaults = LogConfig::default();
        HostConfig {
            bind: args.bind,
            port: args.port,
            buffer_size: args.buffer_size,
            oversize: args.oversize,
            log: LogConfig {
                file: args.log_file.clone().unwrap_or(defaults.file),
                max_level: args.log_level,
            },
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = HostConfig::from(&cli.run);

    // Held until main returns so buffered log lines are flushed.
    let _log_guard = match init_logging(&config.log) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Failed to initialize logger: {e}");
            None
        }
    };

    #[cfg(feature = "install")]
    if let Some(command) = cli.command {
        return manage::run(command);
    }

    if !cli.run.caller.is_empty() || cli.run.parent_window.is_some() {
        debug!(
            caller = ?cli.run.caller,
            parent_window = ?cli.run.parent_window,
            "launched by browser"
        );
    }

    info!(byte_order = %ByteOrder::NATIVE, "native messaging host started");
    let code = match run_host(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "native messaging host failed");
            ExitCode::FAILURE
        }
    };
    info!("native messaging host exited");
    code
}

async fn run_host(config: HostConfig) -> Result<(), NmError> {
    let (sender, _writer) = spawn_writer(io::stdout())?;

    let (done_tx, done_rx) = oneshot::channel();
    let stdio_sender = sender.clone();
    let (buffer_size, oversize) = (config.buffer_size, config.oversize);
    thread::Builder::new()
        .name("stdio-reader".to_string())
        .spawn(move || {
            let mut stdin = io::stdin().lock();
            let result = run_stdio(&mut stdin, buffer_size, oversize, &stdio_sender);
            let _ = done_tx.send(result);
        })?;

    let listener = TcpListener::bind(config.http_addr()).await?;
    let result = tokio::select! {
        stdio = done_rx => stdio.unwrap_or(Err(NmError::Disconnected)),
        served = http::serve(listener, sender.clone()) => served,
    };

    // Replies queued just before stdin closed still need to reach stdout.
    if let Err(e) = sender.flush().await {
        debug!(error = %e, "writer already stopped");
    }
    result
}

#[cfg(feature = "install")]
mod manage {
    use std::path::PathBuf;
    use std::process::ExitCode;

    use clap::{Args, Subcommand};
    use tracing::error;

    use xcloud_listener::install::{install, remove, verify_installed, Scope};

    const HOST_NAME: &str = "com.xcloud.listener";

    #[derive(Subcommand)]
    pub enum Command {
        /// Write the host manifest for the given browsers
        Install(InstallArgs),
        /// Delete the host manifest from the given browsers
        Remove(Target),
        /// Exit 0 if a manifest is installed for any of the given browsers
        Verify(Target),
    }

    #[derive(Args)]
    pub struct Target {
        /// Native messaging host name
        #[arg(long, default_value = HOST_NAME)]
        name: String,

        /// Browser keys (chrome, chromium, edge, brave, firefox, librewolf)
        #[arg(long = "browser", value_name = "BROWSER", default_values = ["chrome", "firefox"])]
        browsers: Vec<String>,

        #[arg(long, value_enum, default_value_t = Scope::User)]
        scope: Scope,
    }

    #[derive(Args)]
    pub struct InstallArgs {
        #[command(flatten)]
        target: Target,

        #[arg(long, default_value = "Xcloud extension listener")]
        description: String,

        /// Host executable; defaults to this binary
        #[arg(long, value_name = "PATH")]
        exe: Option<PathBuf>,

        /// Allowed Chromium extension origin, e.g. chrome-extension://<id>/
        #[arg(long = "origin", value_name = "ORIGIN")]
        origins: Vec<String>,

        /// Allowed Firefox add-on ID
        #[arg(long = "extension", value_name = "ID")]
        extensions: Vec<String>,
    }

    fn browser_keys(target: &Target) -> Vec<&str> {
        target.browsers.iter().map(String::as_str).collect()
    }

    pub fn run(command: Command) -> ExitCode {
        let result = match command {
            Command::Install(args) => {
                let exe = match args.exe.map(Ok).unwrap_or_else(std::env::current_exe) {
                    Ok(exe) => exe,
                    Err(e) => {
                        error!(error = %e, "unable to resolve host executable");
                        eprintln!("unable to resolve host executable: {e}");
                        return ExitCode::FAILURE;
                    }
                };
                install(
                    &args.target.name,
                    &args.description,
                    &exe,
                    &args.origins,
                    &args.extensions,
                    &browser_keys(&args.target),
                    args.target.scope,
                )
                .map(|written| {
                    for path in written {
                        println!("{}", path.display());
                    }
                    true
                })
            }
            Command::Remove(target) => {
                remove(&target.name, &browser_keys(&target), target.scope).map(|()| true)
            }
            Command::Verify(target) => {
                let browsers = browser_keys(&target);
                verify_installed(&target.name, Some(browsers.as_slice()), target.scope)
            }
        };

        match result {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::FAILURE,
            Err(e) => {
                error!(error = %e, "manifest command failed");
                eprintln!("{e}");
                ExitCode::FAILURE
            }
        }
    }
}
