//! # Bahi Console
//!
//! Interactive terminal over [`AssistService`].
//!
//! ## Session
//! ```text
//! > 5 pepsi 30 ke becha
//! Record sale of 5 × Pepsi @ ₹30 for ₹150 (cash). Confirm?
//! [y/n] y
//! Sale recorded: ₹150 (5 items), profit ₹50.
//! > :stock
//! Pepsi                      5   ₹20   Beverages
//! ```
//!
//! ## Commands
//! - `:stock` lists the owner's inventory
//! - `:pending` shows how many actions are staged
//! - `:help` shows this list
//! - `:quit` exits (so do Ctrl+D and Ctrl+C)

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::info;
use tracing_subscriber::EnvFilter;

use bahi_assist::{
    AssistConfig, AssistError, AssistService, ErrorResponse, IntentInterpreter, JsonInterpreter,
    LlmInterpreter,
};
use bahi_core::{Language, OwnerId};
use bahi_db::{Database, DbConfig};

/// Bahi - type shop commands, confirm, and they are recorded
#[derive(Parser, Debug)]
#[command(name = "bahi")]
#[command(about = "Record sales, expenses and stock changes from plain-text commands")]
struct Args {
    /// Config file (default: platform config dir, bahi.toml)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// SQLite database file (overrides config)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Owner account to act for (overrides config)
    #[arg(long, short = 'o')]
    owner: Option<String>,

    /// Message language: en or hi (overrides config)
    #[arg(long)]
    lang: Option<Language>,

    /// Treat each input line as the interpreter's JSON reply instead of
    /// calling the language model
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let args = Args::parse();

    let mut config = AssistConfig::load(args.config)?;
    if let Some(db) = args.db {
        config.database.path = db;
    }
    if let Some(owner) = args.owner {
        config.owner.id = owner;
    }
    if let Some(lang) = args.lang {
        config.owner.language = lang;
    }
    config.validate()?;

    let interpreter: Arc<dyn IntentInterpreter> = if args.json {
        Arc::new(JsonInterpreter)
    } else {
        match LlmInterpreter::from_settings(&config.interpreter) {
            Ok(llm) => Arc::new(llm),
            Err(e) => {
                eprintln!("{}", e);
                eprintln!("Set BAHI_LLM_API_KEY, or run with --json to type interpreter replies.");
                return Err(e.into());
            }
        }
    };

    let db_config = DbConfig::new(config.database.path.clone())
        .max_connections(config.database.max_connections);
    let db = Database::new(db_config).await?;
    info!(path = ?config.database.path, "Database ready");

    let service = Arc::new(AssistService::from_config(db.clone(), interpreter, &config));
    let sweeper = service.spawn_sweeper(config.sweep_interval());

    let owner = config.owner_id();
    let language = config.owner.language;

    println!("Bahi - owner {} ({}). Type :help for commands.", owner, language);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let outcome = run_session(&service, &owner, language, &mut lines).await;

    sweeper.shutdown().await;
    db.close().await;
    info!("Console stopped");

    outcome
}

/// Initializes the tracing subscriber on stderr.
///
/// `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,bahi=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

// =============================================================================
// Session Loop
// =============================================================================

async fn run_session(
    service: &AssistService,
    owner: &OwnerId,
    language: Language,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        let Some(line) = prompt(lines, "> ").await? else {
            break;
        };
        let line = line.trim();

        match line {
            "" => continue,
            ":quit" | ":q" | ":exit" => break,
            ":help" => print_help(),
            ":stock" => print_stock(service, owner).await,
            ":pending" => println!(
                "{} action(s) awaiting confirmation",
                service.stage().pending_for(owner)
            ),
            text => {
                if !propose(service, owner, language, text, lines).await? {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Proposes one command. Returns `false` when input ended mid-confirmation.
async fn propose(
    service: &AssistService,
    owner: &OwnerId,
    language: Language,
    text: &str,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let parsed = match service.parse_intent(owner, text, language).await {
        Ok(parsed) => parsed,
        Err(e) => {
            print_error(&e);
            return Ok(true);
        }
    };

    let (Some(id), Some(preview)) = (parsed.confirmation_id, parsed.preview) else {
        println!(
            "{}",
            parsed.reason.as_deref().unwrap_or("Not an actionable command")
        );
        return Ok(true);
    };

    println!("{}", preview);
    let Some(answer) = prompt(lines, "[y/n] ").await? else {
        // Leave the action staged; the sweeper expires it.
        return Ok(false);
    };
    let confirmed = matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "haan" | "ha" | "h"
    );

    match service.execute_action(owner, &id, confirmed, language).await {
        Ok(response) => println!("{}", response.message()),
        Err(e) => print_error(&e),
    }

    Ok(true)
}

/// Prints `label` and waits for a line. `None` on Ctrl+D or Ctrl+C.
async fn prompt(
    lines: &mut Lines<BufReader<Stdin>>,
    label: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(label.as_bytes()).await?;
    stdout.flush().await?;

    tokio::select! {
        line = lines.next_line() => Ok(line?),
        _ = tokio::signal::ctrl_c() => {
            println!();
            Ok(None)
        }
    }
}

// =============================================================================
// Output
// =============================================================================

fn print_help() {
    println!("Type a command in plain words, e.g. \"sold 5 pepsi at 30\".");
    println!("  :stock     list inventory");
    println!("  :pending   count staged actions");
    println!("  :quit      exit");
}

async fn print_stock(service: &AssistService, owner: &OwnerId) {
    match service.database().inventory().list(owner).await {
        Ok(items) if items.is_empty() => println!("No items yet."),
        Ok(items) => {
            for item in items {
                println!(
                    "{:<24} {:>6}   {:>8}   {}",
                    item.item_name,
                    item.stock_qty,
                    item.price_per_unit.to_string(),
                    item.category
                );
            }
        }
        Err(e) => print_error(&AssistError::from(e)),
    }
}

fn print_error(err: &AssistError) {
    let response = ErrorResponse::from(err);
    match response.available {
        Some(available) => println!("✗ {} (in stock: {})", response.message, available),
        None => println!("✗ {}", response.message),
    }
}
