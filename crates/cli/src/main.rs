//! CLI for the Warden access gate.
//!
//! Administrative surface over the whitelist file plus an offline replay of
//! recorded chat events through the gate.

mod replay;
mod sink;

use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser, Subcommand};
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use warden_core::{Identity, Role, Snapshot};
use warden_store::MembershipStore;

#[derive(Parser, Debug)]
#[command(name = "warden", version, about = "Whitelist gate for chat bots")]
struct Cli {
    /// Whitelist file. Missing is fine; unreadable or corrupt aborts.
    #[arg(
        long,
        global = true,
        env = "WARDEN_WHITELIST_PATH",
        default_value = "whitelist.json"
    )]
    whitelist: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the current whitelist.
    Show {
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Explain the admission decision for an identity (omit for anonymous).
    Check {
        #[arg(allow_negative_numbers = true)]
        id: Option<Identity>,
    },

    /// Grant the admin role to one or more identities.
    AddAdmin {
        #[arg(required = true, allow_negative_numbers = true)]
        ids: Vec<Identity>,
    },

    /// Grant the user role to one or more identities.
    AddUser {
        #[arg(required = true, allow_negative_numbers = true)]
        ids: Vec<Identity>,
    },

    /// Revoke the admin role. Absent identities are ignored.
    RemoveAdmin {
        #[arg(required = true, allow_negative_numbers = true)]
        ids: Vec<Identity>,
    },

    /// Revoke the user role. Absent identities are ignored.
    RemoveUser {
        #[arg(required = true, allow_negative_numbers = true)]
        ids: Vec<Identity>,
    },

    /// Admit or reject identities that are on neither list.
    AllowUnknown {
        #[arg(action = ArgAction::Set, value_parser = BoolishValueParser::new())]
        value: bool,
    },

    /// Run NDJSON events through the gate and the built-in commands.
    Replay {
        /// Input file; stdin when omitted.
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Reply rows as NDJSON; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long, env = "WARDEN_DENIED_TEXT")]
        denied_text: Option<String>,
    },
}

#[derive(Debug, Clone, Copy)]
enum Edit {
    Add(Role),
    Remove(Role),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Corrupt state must stop us here rather than degrade to a default list.
    let store = match MembershipStore::load(&cli.whitelist) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            if e.is_fatal_at_startup() {
                tracing::error!(
                    path = %cli.whitelist.display(),
                    error = %e,
                    "refusing to start with an unusable whitelist"
                );
            }
            return Err(e.into());
        }
    };

    match cli.command {
        Commands::Show { json } => {
            let snapshot = store.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print!("{}", render(&snapshot, store.size()));
            }
        }

        Commands::Check { id } => {
            let decision = store.decide(id);
            match id {
                Some(id) => match store.role_of(id) {
                    Some(role) => println!("{id} ({role}): {decision}"),
                    None => println!("{id} (unlisted): {decision}"),
                },
                None => println!("anonymous: {decision}"),
            }
        }

        Commands::AddAdmin { ids } => apply(&store, Edit::Add(Role::Admin), &ids)?,
        Commands::AddUser { ids } => apply(&store, Edit::Add(Role::User), &ids)?,
        Commands::RemoveAdmin { ids } => apply(&store, Edit::Remove(Role::Admin), &ids)?,
        Commands::RemoveUser { ids } => apply(&store, Edit::Remove(Role::User), &ids)?,

        Commands::AllowUnknown { value } => {
            store.set_allow_unknown(value);
            store.save()?;
            println!("allow_unknown = {value}");
        }

        Commands::Replay {
            input,
            output,
            denied_text,
        } => {
            let dispatcher = replay::build_dispatcher(Arc::clone(&store), denied_text);

            let input: Box<dyn std::io::BufRead> = match input {
                Some(path) => Box::new(BufReader::new(std::fs::File::open(path)?)),
                None => Box::new(std::io::stdin().lock()),
            };

            let (stats, rows) = match output {
                Some(path) => {
                    let mut s = sink::JsonStreamSink::new(std::fs::File::create(&path)?);
                    let stats = replay::replay(&dispatcher, input, &mut s).await?;
                    (stats, s.finish()?)
                }
                None => {
                    let mut s = sink::JsonStreamSink::stdout();
                    let stats = replay::replay(&dispatcher, input, &mut s).await?;
                    (stats, s.finish()?)
                }
            };

            tracing::info!(
                handled = stats.handled,
                unhandled = stats.unhandled,
                rejected = stats.rejected,
                failed = stats.failed,
                malformed = stats.malformed,
                rows,
                "replay complete"
            );
        }
    }

    Ok(())
}

/// Applies a batch of edits under one lock and saves once.
fn apply(
    store: &MembershipStore,
    edit: Edit,
    ids: &[Identity],
) -> Result<(), Box<dyn std::error::Error>> {
    let changed = store.update(|m| {
        ids.iter()
            .filter(|&&id| match edit {
                Edit::Add(role) => m.add(role, id),
                Edit::Remove(role) => m.remove(role, id),
            })
            .count()
    });

    if changed == 0 {
        tracing::info!(?edit, "nothing to change");
        return Ok(());
    }

    store.save()?;
    println!("{changed} change(s) saved to {}", store.path().display());
    Ok(())
}

fn render(snapshot: &Snapshot, size: usize) -> String {
    format!(
        "admins:        {}\nusers:         {}\nallow_unknown: {}\nidentities:    {}\n",
        id_list(snapshot.admin_ids()),
        id_list(snapshot.user_ids()),
        snapshot.allow_unknown,
        size,
    )
}

fn id_list(ids: impl Iterator<Item = Identity>) -> String {
    let list: Vec<String> = ids.map(|id| id.to_string()).collect();
    if list.is_empty() {
        "-".to_string()
    } else {
        list.join(", ")
    }
}
