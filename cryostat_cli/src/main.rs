mod cli;
mod error_fmt;
mod run;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;

use cli::{Cli, Commands, FILE_GUARD, JSON_MODE};

fn main() {
    let _ = color_eyre::install();
    let args = Cli::parse();
    let json = args.json;
    let _ = JSON_MODE.set(json);

    let cfg = match load_config(&args.config) {
        Ok(cfg) => cfg,
        Err(err) => {
            report_error(&err);
            std::process::exit(2);
        }
    };
    init_tracing(&args, &cfg.logging);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            flag.store(true, Ordering::Relaxed);
        }) {
            tracing::warn!(error = %e, "could not install Ctrl-C handler");
        }
    }

    let result: cryostat_core::Result<()> = match args.cmd {
        Commands::Run {
            setpoints,
            integration_s,
            stable_s,
            temp_tol,
            out,
            sample,
            user,
            material,
            max_run_s,
            progress,
        } => run::run_measurement(
            &cfg,
            run::RunOptions {
                setpoints,
                integration_s,
                stable_s,
                temp_tol,
                out,
                sample,
                user,
                material,
                max_run_s,
                progress,
            },
            shutdown,
        )
        .map(|outcome| print_summary(&outcome, json)),
        Commands::SelfCheck => run::self_check(&cfg),
    };

    if let Err(err) = result {
        report_error(&err);
        std::process::exit(error_fmt::exit_code_for_error(&err));
    }
}

fn print_summary(outcome: &run::RunOutcome, json: bool) {
    if json {
        println!(
            "{}",
            serde_json::json!({
                "windows": outcome.windows,
                "out": outcome.out_path.display().to_string(),
                "interrupted": outcome.interrupted,
            })
        );
    } else {
        println!(
            "{} window(s) written to {}",
            outcome.windows,
            outcome.out_path.display()
        );
    }
}

fn report_error(err: &eyre::Report) {
    if JSON_MODE.get().copied().unwrap_or(false) {
        eprintln!("{}", error_fmt::format_error_json(err));
    } else {
        eprintln!("{}", error_fmt::humanize(err));
    }
}

/// Missing config file is not an error: every table has documented defaults.
fn load_config(path: &Path) -> eyre::Result<cryostat_config::Config> {
    if !path.exists() {
        return Ok(cryostat_config::Config::default());
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config {}", path.display()))?;
    let cfg = cryostat_config::load_toml(&text).wrap_err("parse config TOML")?;
    cfg.validate().wrap_err("invalid configuration")?;
    Ok(cfg)
}

fn init_tracing(args: &Cli, logging: &cryostat_config::Logging) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let level = logging.level.as_deref().unwrap_or(&args.log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // Console layer: pretty or JSON lines, always on stderr so stdout stays
    // machine-readable.
    let (pretty, json) = if args.json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().with_writer(std::io::stderr)), None)
    };

    // Optional JSON file layer with rotation from the config.
    let file_layer = logging.file.as_ref().map(|file| {
        let path = Path::new(file);
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let name = path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "cryostat.log".into());
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        fmt::layer().json().with_writer(writer)
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .with(file_layer)
        .init();
}
