use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use vocab_review::database::{ItemStore, SqliteStore, migrate_learner};
use vocab_review::export::{export_items_to_path, import_items};
use vocab_review::models::due::classify_record;
use vocab_review::{Clock, Config, Error, Explanation, ReviewResponse, ReviewSession, SystemClock};

/// Spaced-repetition vocabulary review
#[derive(Parser)]
#[command(name = "vocab-review")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// SQLite database (overrides the configuration file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Learner whose items are used (overrides the configuration file)
    #[arg(long, global = true)]
    learner: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new item, due immediately in both directions
    Add {
        term: String,
        definition: String,
        #[arg(long)]
        translation: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// List the directions that are due now
    Due,
    /// Upgrade single-direction records to bidirectional tracking
    Migrate,
    /// Review everything that is due
    Review,
    /// Import items from a JSON file
    Import { file: PathBuf },
    /// Export the learner's items to a JSON file
    Export { file: PathBuf },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.database_path = db;
    }
    if let Some(learner) = cli.learner {
        config.learner_id = learner;
    }
    config.validate()?;

    let store = SqliteStore::open(&config.database_path)
        .with_context(|| format!("opening {}", config.database_path.display()))?;
    let clock = SystemClock;
    let learner = config.learner_id.as_str();

    match cli.command {
        Commands::Add {
            term,
            definition,
            translation,
            notes,
        } => {
            let mut explanation = Explanation::new(&term, &definition);
            if let Some(translation) = translation {
                explanation.translation = translation;
            }
            explanation.notes = notes;
            let id = store.add_item(learner, &explanation, clock.now())?;
            println!("Added '{}' (id {})", term, id);
        }
        Commands::Due => {
            let now = clock.now();
            let records = store.fetch_items_for_learner(learner)?;
            let mut total = 0;
            for record in &records {
                let status = classify_record(record, now);
                for direction in status.directions {
                    println!("{:>6}  {:<12} {}", record.id, direction, record.explanation.term);
                    total += 1;
                }
            }
            println!("{} cards due across {} items", total, records.len());
        }
        Commands::Migrate => {
            let report = migrate_learner(&store, learner, &clock)?;
            println!(
                "Migrated {} items ({} already up to date)",
                report.migrated, report.skipped
            );
            report.into_result()?;
        }
        Commands::Review => run_review(store, &config)?,
        Commands::Import { file } => {
            let records = import_items(&file, clock.now())?;
            let imported = store.import_records(learner, &records)?;
            println!(
                "Imported {} items ({} already present)",
                imported,
                records.len() - imported
            );
        }
        Commands::Export { file } => {
            let records = store.fetch_items_for_learner(learner)?;
            export_items_to_path(&records, &file)?;
            println!("Exported {} items to {}", records.len(), file.display());
        }
    }

    Ok(())
}

fn run_review(store: SqliteStore, config: &Config) -> anyhow::Result<()> {
    let mut session = ReviewSession::new(
        Arc::new(store),
        Arc::new(SystemClock),
        &config.learner_id,
        config.session_options(),
    );
    session.refresh()?;
    match session.start() {
        Ok(()) => {}
        Err(Error::EmptyDueSet) => {
            println!("No cards due for review.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut read = |prompt: &str| -> anyhow::Result<Option<String>> {
        print!("{prompt}");
        io::stdout().flush()?;
        Ok(lines.next().transpose()?.map(|line| line.trim().to_string()))
    };

    println!("{}", session.phase_message());
    while !session.is_completed() {
        let Some(card) = session.current_card() else {
            break;
        };
        let (position, total) = session.progress();
        println!("\n[{position}/{total}] {} → {}", card.direction, card.prompt());

        if !card.revealed {
            match read("Press Enter to show the answer (q to quit) ")? {
                Some(line) if line != "q" => session.reveal()?,
                _ => {
                    session.exit()?;
                    return Ok(());
                }
            }
        }

        if let Some(card) = session.current_card() {
            println!("  {}", card.answer());
            if card.show_details {
                print_details(&card.item.explanation);
            }
        }

        let Some(line) = read("again / hard / good / easy (d: details, q: quit) ")? else {
            session.exit()?;
            return Ok(());
        };
        match line.as_str() {
            "q" => {
                session.exit()?;
                return Ok(());
            }
            "d" => {
                session.toggle_details()?;
                continue;
            }
            _ => {}
        }

        let response = match line.parse::<ReviewResponse>() {
            Ok(response) => response,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };
        match session.respond(response) {
            Ok(outcome) => {
                println!("  next review in {} day(s)", outcome.tracking.interval);
                if outcome.requeued {
                    println!("  will come back at the end of this session");
                }
            }
            Err(Error::PersistenceFailure(e)) => println!("Could not save ({e}); try again."),
            Err(e) => return Err(e.into()),
        }
    }

    println!("\nReview complete!");
    let remaining = session.exit()?;
    if remaining > 0 {
        println!("{remaining} cards are due again.");
    }
    Ok(())
}

fn print_details(explanation: &Explanation) {
    if let Some(hanja) = &explanation.hanja {
        println!("  hanja: {hanja}");
    }
    if !explanation.definition.is_empty() {
        println!("  {}", explanation.definition);
    }
    for example in &explanation.examples {
        println!("  - {} / {}", example.source, example.target);
    }
    if let Some(notes) = &explanation.notes {
        println!("  note: {notes}");
    }
}
