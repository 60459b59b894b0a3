//! Trellis demo entry point.
//!
//! A two-screen service restart flow: a layered multi-select picker, then a
//! confirmation form. Demonstrates the screen stack, key bindings, filter,
//! and persisted defaults.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use trellis_config::ConfigManager;
use trellis_core::{Field, FieldValue, ScreenResult, SelectMode, TableRow, TableState};
use trellis_tasks::{RetryPolicy, retry_with_backoff, run_parallel_with_limit};
use trellis_tui::shell::ScreenStack;
use trellis_tui::{Screen, ScreenBuilder, Shell, detect_capabilities};

/// Trellis demo flow
#[derive(Parser, Debug)]
#[command(name = "trellis-demo")]
#[command(about = "Demo flow for the Trellis terminal pattern library")]
#[command(version)]
struct Args {
    /// Log file path. Logs never go to stdout; the terminal belongs to the
    /// UI.
    #[arg(long, default_value = "trellis-demo.log")]
    log_file: PathBuf,

    /// Config file for persisted choices.
    #[arg(long, default_value = "trellis-demo.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let log_file = std::fs::File::create(&args.log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::sync::Arc::new(log_file))
        .with_ansi(false)
        .init();

    let config = ConfigManager::open(&args.config)?;

    let mut shell = Shell::new(detect_capabilities())?;
    shell.push(picker_screen()?, move |result, stack| {
        on_services_picked(&result, config, stack);
    });
    shell.run().await?;
    Ok(())
}

fn service_table() -> TableState {
    let rows = vec![
        TableRow::new([("Service", "auth-gateway"), ("Status", "Running")])
            .layer("Core")
            .key("auth-gateway"),
        TableRow::new([("Service", "session-store"), ("Status", "Running")])
            .layer("Core")
            .key("session-store"),
        TableRow::new([("Service", "billing-api"), ("Status", "Degraded")])
            .layer("Billing")
            .key("billing-api"),
        TableRow::new([("Service", "invoice-worker"), ("Status", "Stopped")])
            .layer("Billing")
            .key("invoice-worker"),
        TableRow::new([("Service", "metrics-scraper"), ("Status", "Running")])
            .layer("Observability")
            .key("metrics-scraper"),
    ];
    TableState::new(vec!["Service".into(), "Status".into()], rows, SelectMode::Multi)
        .filterable(true)
}

fn picker_screen() -> Result<Screen, trellis_tui::BindingError> {
    Ok(ScreenBuilder::new("Restart services")
        .field(Field::table("services", service_table()).label("Services").required(true))
        .explanation(
            "Restart",
            "Choose the services to restart. Layer shortcuts select whole \
             groups at once.",
            "Space: toggle | /: filter | Ctrl+L: layer | Ctrl+A: all | Enter: submit",
        )
        .bind("ctrl+l", "select-layer")?
        .bind("ctrl+t", "toggle-layer")?
        .bind("ctrl+a", "toggle-all")?
        .build())
}

fn on_services_picked(result: &ScreenResult, config: ConfigManager, stack: &mut ScreenStack) {
    // A cancelled picker still carries partial values, including any rows
    // toggled before Esc; only a confirmed result moves forward.
    if !result.confirmed {
        tracing::info!("picker cancelled, exiting");
        return;
    }
    let Some(FieldValue::Rows(rows)) = result.values.get("services") else {
        return;
    };
    let names: Vec<String> = rows
        .iter()
        .filter_map(|row| row.value("Service"))
        .map(str::to_owned)
        .collect();
    if names.is_empty() {
        tracing::info!("nothing selected, exiting");
        return;
    }

    stack.push(details_screen(&names, &config), move |result, _stack| {
        if !result.confirmed {
            tracing::info!("restart cancelled at the details step");
            return;
        }

        let reason = match result.values.get("reason") {
            Some(FieldValue::Text(text)) => text.clone(),
            _ => String::new(),
        };
        let dry_run =
            matches!(result.values.get("dry_run"), Some(FieldValue::Bool(true)));
        tracing::info!(services = ?names, %reason, dry_run, "restart confirmed");

        if !dry_run {
            tokio::spawn(restart_services(names.clone()));
        }

        let mut config = config;
        for (key, outcome) in [
            ("last_services", config.set("last_services", &names)),
            ("last_reason", config.set("last_reason", &reason)),
        ] {
            if let Err(error) = outcome {
                tracing::warn!(%error, key, "could not persist choice");
            }
        }
    });
}

/// Issue restarts with bounded concurrency, retrying flapping services.
async fn restart_services(names: Vec<String>) {
    let tasks = names.into_iter().map(|name| async move {
        retry_with_backoff(
            RetryPolicy::with_attempts(3),
            |attempt| {
                let name = name.clone();
                async move {
                    tokio::time::sleep(Duration::from_millis(200)).await;
                    tracing::info!(service = %name, attempt, "restart issued");
                    Ok::<(), String>(())
                }
            },
            |attempt, error| tracing::warn!(%error, attempt, "restart retrying"),
        )
        .await
    });

    match run_parallel_with_limit(2, tasks).await {
        Ok(_) => tracing::info!("all restarts complete"),
        Err(error) => tracing::warn!(%error, "restart batch failed"),
    }
}

fn details_screen(names: &[String], config: &ConfigManager) -> Screen {
    let last_reason = config.get_or("last_reason", String::new());

    ScreenBuilder::new("Confirm restart")
        .field(Field::message("summary", format!("Restarting: {}", names.join(", "))))
        .field(
            Field::text("reason")
                .label("Reason")
                .required(true)
                .default_value(last_reason)
                .placeholder("why these services need a restart"),
        )
        .field(Field::boolean("dry_run", true).label("Dry run"))
        .explanation(
            "Confirm",
            "Review the restart before it runs. The reason is recorded in \
             the audit log.",
            "Enter: review, then confirm | Esc: cancel",
        )
        .build()
}
