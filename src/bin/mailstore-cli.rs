#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI for inspecting and maintaining a mailbox over IMAP

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use mailstore::{
    AccountConfig, CreateMode, Fetched, Flag, Folder, FolderAccess, ImapFolder, Message,
    OpenMode, Teardown, Term, create_session, with_folder,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailstore-cli")]
#[command(about = "Inspect and maintain IMAP folders")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// List the most recent messages in a folder
    List {
        /// Folder to list from
        #[arg(long, default_value = "INBOX")]
        folder: String,

        /// Maximum number of messages to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },

    /// Search a folder
    Search {
        /// Folder to search in
        #[arg(long, default_value = "INBOX")]
        folder: String,

        /// Sender contains this text
        #[arg(long)]
        from: Option<String>,

        /// Subject contains this text
        #[arg(long)]
        subject: Option<String>,

        /// Only unseen messages
        #[arg(long)]
        unseen: bool,

        /// Messages since this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        since: Option<NaiveDate>,

        /// Messages before this date (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        before: Option<NaiveDate>,

        /// Maximum number of results
        #[arg(long, default_value = "50")]
        limit: usize,
    },

    /// Create a folder if it does not exist
    Ensure {
        /// Folder path
        #[arg(long)]
        folder: String,
    },

    /// Permanently remove messages flagged as deleted
    Purge {
        /// Folder to purge
        #[arg(long, default_value = "INBOX")]
        folder: String,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("Invalid date '{s}': {e}"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let account = AccountConfig::from_env()?;

    match &args.command {
        Command::List { folder, limit } => cmd_list(&account, &args, folder, *limit).await?,
        Command::Search {
            folder,
            from,
            subject,
            unseen,
            since,
            before,
            limit,
        } => {
            let mut term = Term::All;
            if let Some(from) = from {
                term = term.and(Term::from(from.as_str()));
            }
            if let Some(subject) = subject {
                term = term.and(Term::subject(subject.as_str()));
            }
            if *unseen {
                term = term.and(Term::NotFlag(Flag::Seen));
            }
            if let Some(since) = since {
                term = term.and(Term::Since(*since));
            }
            if let Some(before) = before {
                term = term.and(Term::Before(*before));
            }
            cmd_search(&account, &args, folder, &term, *limit).await?;
        }
        Command::Ensure { folder } => cmd_ensure(&account, &args, folder).await?,
        Command::Purge { folder } => cmd_purge(&account, &args, folder).await?,
    }

    Ok(())
}

async fn cmd_list(
    account: &AccountConfig,
    args: &Args,
    folder: &str,
    limit: usize,
) -> anyhow::Result<()> {
    let session = create_session(account.connection.clone());
    let fetched = with_folder(
        &session,
        &account.credentials,
        folder,
        FolderAccess::Open(OpenMode::ReadOnly),
        Teardown::DISCARD,
        async |f: &mut Folder<ImapFolder>| f.fetch_all().await,
    )
    .await
    .with_context(|| format!("Cannot read {folder}"))?;

    print_fetched(args, fetched, limit)
}

async fn cmd_search(
    account: &AccountConfig,
    args: &Args,
    folder: &str,
    term: &Term,
    limit: usize,
) -> anyhow::Result<()> {
    let session = create_session(account.connection.clone());
    let fetched = with_folder(
        &session,
        &account.credentials,
        folder,
        FolderAccess::Open(OpenMode::ReadOnly),
        Teardown::DISCARD,
        async |f: &mut Folder<ImapFolder>| f.fetch_matching(term).await,
    )
    .await
    .with_context(|| format!("Cannot search {folder}"))?;

    print_fetched(args, fetched, limit)
}

async fn cmd_ensure(account: &AccountConfig, args: &Args, folder: &str) -> anyhow::Result<()> {
    let session = create_session(account.connection.clone());
    let mode = with_folder(
        &session,
        &account.credentials,
        folder,
        FolderAccess::EnsureExists {
            create: CreateMode::HOLDS_MESSAGES,
            open: OpenMode::ReadWrite,
        },
        Teardown::DISCARD,
        async |f: &mut Folder<ImapFolder>| f.mode(),
    )
    .await
    .with_context(|| format!("Cannot ensure {folder}"))?;

    if args.json {
        println!(
            "{}",
            serde_json::json!({ "folder": folder, "open": mode.is_some() })
        );
    } else if let Some(mode) = mode {
        println!("{folder}: ready ({mode})");
    } else {
        println!("{folder}: exists but could not be opened");
    }
    Ok(())
}

async fn cmd_purge(account: &AccountConfig, args: &Args, folder: &str) -> anyhow::Result<()> {
    let session = create_session(account.connection.clone());
    let removed = with_folder(
        &session,
        &account.credentials,
        folder,
        FolderAccess::Open(OpenMode::ReadWrite),
        Teardown {
            save_changes: true,
            expunge: false,
        },
        async |f: &mut Folder<ImapFolder>| f.expunge().await,
    )
    .await
    .with_context(|| format!("Cannot purge {folder}"))?;

    if let Some(failure) = removed.failure() {
        anyhow::bail!("Purge of {folder} failed: {failure}");
    }

    if args.json {
        println!(
            "{}",
            serde_json::json!({ "folder": folder, "removed": removed.len() })
        );
    } else {
        println!("Removed {} message(s) from {folder}", removed.len());
    }
    Ok(())
}

fn print_fetched(args: &Args, fetched: Fetched, limit: usize) -> anyhow::Result<()> {
    if let Some(failure) = fetched.failure() {
        eprintln!("warning: {failure}");
    }

    let messages = fetched.into_messages();
    let start = messages.len().saturating_sub(limit);
    let display = &messages[start..];

    if args.json {
        println!("{}", serde_json::to_string_pretty(display)?);
    } else {
        print_message_table(display);
    }
    Ok(())
}

fn print_message_table(messages: &[Message]) {
    if messages.is_empty() {
        println!("No messages found.");
        return;
    }

    let header = format!("{:<8} {:<20} {:<30} {}", "UID", "Date", "From", "Subject");
    println!("{header}");
    println!("{}", "-".repeat(100));

    for message in messages {
        let date = message
            .date
            .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string());
        println!(
            "{:<8} {:<20} {:<30} {}",
            message.uid,
            date,
            truncate(&message.from.join(", "), 28),
            truncate(message.subject.as_deref().unwrap_or(""), 40),
        );
    }

    println!("\n{} message(s)", messages.len());
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{truncated}...")
    }
}
