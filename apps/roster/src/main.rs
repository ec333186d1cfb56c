use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::HttpEmployeeDirectory;
use coordinator::{selection, Action, ConflictPolicy, RosterState, RosterStore, StoreOptions};
use shared::{
    domain::{Employee, EmployeeFields, EmployeeId},
    validation::validate_fields,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, Overrides, Settings};

#[derive(Parser, Debug)]
#[command(name = "roster", about = "Keep the employee roster in sync with the server")]
struct Cli {
    /// Settings file; defaults to ./roster.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// reinsert_on_update or delete_wins
    #[arg(long)]
    conflict_policy: Option<ConflictPolicy>,
    /// Print the roster as JSON instead of a table.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and print the roster.
    List,
    /// Create a record.
    Add(FieldArgs),
    /// Edit a record; omitted fields keep their current values.
    Update {
        id: String,
        #[command(flatten)]
        fields: FieldArgs,
    },
    /// Delete one or more records.
    Delete {
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Args, Debug, Default)]
struct FieldArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    phone: Option<String>,
}

impl FieldArgs {
    fn merge_into(self, base: EmployeeFields) -> EmployeeFields {
        EmployeeFields {
            name: self.name.unwrap_or(base.name),
            email: self.email.unwrap_or(base.email),
            address: self.address.unwrap_or(base.address),
            phone: self.phone.unwrap_or(base.phone),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(
        cli.config.as_deref(),
        Overrides {
            server_url: cli.server_url,
            request_timeout_ms: cli.timeout_ms,
            conflict_policy: cli.conflict_policy,
        },
    )?;
    debug!(?settings, "loaded settings");

    let mut store = connect(&settings)?;
    let state = execute(&mut store, cli.command).await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(state.employees())?);
    } else {
        print!("{}", render_table(state.employees()));
    }
    Ok(())
}

fn connect(settings: &Settings) -> Result<RosterStore> {
    let directory =
        HttpEmployeeDirectory::with_timeout(&settings.server_url, settings.request_timeout())
            .with_context(|| format!("invalid server url '{}'", settings.server_url))?;
    info!(server = %directory.base_url(), policy = %settings.conflict_policy, "connecting");
    let (store, _handle) = RosterStore::new(
        Arc::new(directory),
        StoreOptions {
            policy: settings.conflict_policy,
        },
    );
    Ok(store)
}

/// Loads the roster, then plays `command` through the store the way the form
/// dialog would.
async fn execute(store: &mut RosterStore, command: Command) -> Result<RosterState> {
    run_step(store, [Action::FetchRequested]).await?;

    match command {
        Command::List => {}
        Command::Add(args) => {
            run_step(store, selection::add_intents()).await?;
            submit(store, args).await?;
        }
        Command::Update { id, fields } => {
            run_step(store, selection::edit_intents(EmployeeId::new(id))).await?;
            submit(store, fields).await?;
        }
        Command::Delete { ids } => {
            run_step(
                store,
                ids.into_iter()
                    .map(|id| Action::DeleteRequested(EmployeeId::new(id))),
            )
            .await?;
        }
    }

    Ok(store.state().clone())
}

async fn submit(store: &mut RosterStore, args: FieldArgs) -> Result<()> {
    let Some(prefill) = selection::form_prefill(store.state()) else {
        bail!("edit dialog is not open");
    };
    let fields = args.merge_into(prefill);
    if let Err(errors) = validate_fields(&fields) {
        let lines: Vec<String> = errors
            .0
            .iter()
            .map(|err| format!("  {}: {}", err.field, err.message))
            .collect();
        bail!("invalid employee fields:\n{}", lines.join("\n"));
    }

    let intent = selection::submit_intent(store.state(), fields);
    run_step(store, [intent]).await
}

/// Dispatches `actions`, waits for their remote calls, and fails on a surfaced error.
async fn run_step(store: &mut RosterStore, actions: impl IntoIterator<Item = Action>) -> Result<()> {
    for action in actions {
        store.dispatch(action);
    }
    store.settle().await;

    match &store.state().ui.last_error {
        Some(error) => bail!("{error}"),
        None => Ok(()),
    }
}

fn render_table(employees: &[Employee]) -> String {
    if employees.is_empty() {
        return "no employees\n".to_string();
    }

    let header = ["ID", "NAME", "EMAIL", "PHONE", "ADDRESS", "CREATED"];
    let rows: Vec<[String; 6]> = employees
        .iter()
        .map(|employee| {
            [
                employee.id.to_string(),
                employee.name.clone(),
                employee.email.clone(),
                employee.phone.clone(),
                employee.address.clone(),
                employee.created_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_row = |cells: Vec<&str>| {
        let line: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    };
    push_row(header.to_vec());
    for row in &rows {
        push_row(row.iter().map(String::as_str).collect());
    }
    out
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
