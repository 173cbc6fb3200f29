//! driftnote-guest: inspect and edit the on-device guest store.
//!
//! Operates directly on the filesystem guest store, with the same quota rules
//! the application enforces. Useful for support and for reproducing quota or
//! restart scenarios by hand.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use driftnote_local::{
    CreateNoteRequest, CreateReminderRequest, GuestStore, GuestStoreConfig, NoteType, Priority,
    RecordId,
};

#[derive(Parser)]
#[command(name = "driftnote-guest")]
#[command(author, version, about = "Inspect and edit the driftnote guest store")]
#[command(propagate_version = true)]
struct Cli {
    /// Guest data directory (default: $DRIFTNOTE_DATA_DIR or .driftnote/guest)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the guest profile and quota usage
    Status,

    /// Create the guest profile if it does not exist
    Init,

    /// Add a note
    AddNote {
        /// Note title
        #[arg(short, long)]
        title: String,

        /// Note content
        #[arg(short, long)]
        content: String,

        /// Note type: text, url, file, image
        #[arg(long, default_value = "text")]
        r#type: NoteType,

        /// Tags (can specify multiple)
        #[arg(long)]
        tag: Vec<String>,
    },

    /// List notes, newest first
    ListNotes,

    /// Delete a note by id
    DeleteNote {
        /// Note id (`guest:<uuid>` or bare uuid)
        id: RecordId,
    },

    /// Add a reminder
    AddReminder {
        /// Reminder title
        #[arg(short, long)]
        title: String,

        /// When to remind, RFC 3339 (e.g. 2026-01-01T09:00:00Z)
        #[arg(short, long)]
        at: DateTime<Utc>,

        /// Priority: low, medium, high
        #[arg(short, long, default_value = "medium")]
        priority: Priority,

        /// Note this reminder refers to
        #[arg(long)]
        note: Option<RecordId>,
    },

    /// List active reminders, soonest first
    ListReminders,

    /// Mark a reminder completed
    CompleteReminder {
        /// Reminder id (`guest:<uuid>` or bare uuid)
        id: RecordId,
    },

    /// Print all guest data as JSON
    Export,

    /// Erase all guest data
    Clear {
        /// Required to confirm the erase
        #[arg(long)]
        yes: bool,
    },
}

fn init_tracing() {
    // Environment variables:
    //   RUST_LOG    - filter directives (default: "driftnote_local=info")
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "driftnote_local=info".into());
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = GuestStoreConfig::from_env();
    if let Some(dir) = cli.data_dir.clone() {
        config = config.with_data_dir(dir);
    }

    let store = config.open();
    match run(cli.command, &store).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, store: &GuestStore) -> anyhow::Result<()> {
    store
        .initialize()
        .await
        .context("failed to load guest store")?;

    match command {
        Commands::Status => {
            let usage = store.usage().await?;
            match store.profile().await? {
                Some(profile) => {
                    println!("Guest profile: {}", profile.id);
                    println!("Created:       {}", profile.created_at.to_rfc3339());
                }
                None => println!("Guest profile: none"),
            }
            println!("Notes:         {} / {}", usage.notes, usage.max_notes);
            println!("Reminders:     {} / {}", usage.reminders, usage.max_reminders);
        }
        Commands::Init => {
            let profile = store.ensure_profile().await?;
            println!("Guest profile: {}", profile.id);
        }
        Commands::AddNote {
            title,
            content,
            r#type,
            tag,
        } => {
            let note = store
                .create_note(
                    CreateNoteRequest::text(title, content)
                        .with_type(r#type)
                        .with_tags(tag),
                )
                .await
                .context("failed to add note")?;
            println!("{}", note.id);
        }
        Commands::ListNotes => {
            for note in store.list_notes().await? {
                println!(
                    "{}  {}  [{}]  {}",
                    note.id,
                    note.created_at.format("%Y-%m-%d %H:%M"),
                    note.note_type,
                    note.title
                );
            }
        }
        Commands::DeleteNote { id } => {
            store.delete_note(id).await?;
            println!("Deleted {id}");
        }
        Commands::AddReminder {
            title,
            at,
            priority,
            note,
        } => {
            let mut req = CreateReminderRequest::new(title, at).with_priority(priority);
            if let Some(note_id) = note {
                req = req.with_note(note_id);
            }
            let reminder = store
                .create_reminder(req)
                .await
                .context("failed to add reminder")?;
            println!("{}", reminder.id);
        }
        Commands::ListReminders => {
            for reminder in store.list_active_reminders().await? {
                println!(
                    "{}  {}  {:<6}  {}",
                    reminder.id,
                    reminder.remind_at.format("%Y-%m-%d %H:%M"),
                    reminder.priority,
                    reminder.title
                );
            }
        }
        Commands::CompleteReminder { id } => {
            store.complete_reminder(id).await?;
            println!("Completed {id}");
        }
        Commands::Export => {
            let export = store.export_all().await?;
            println!("{}", serde_json::to_string_pretty(&export)?);
        }
        Commands::Clear { yes } => {
            if !yes {
                anyhow::bail!("refusing to erase guest data without --yes");
            }
            store.clear_all().await?;
            println!("Guest data cleared");
        }
    }
    Ok(())
}
