use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vocab_srs::database::{SqliteCardStore, db};
use vocab_srs::export::json::{export_json_to_path, import_json};
use vocab_srs::models::sm2;
use vocab_srs::{Quality, ReviewSession, Result, config};

/// Spaced repetition for Dutch vocabulary (SM-2)
#[derive(Parser)]
#[command(name = "vocab-srs")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Schedule vocabulary reviews with SM-2")]
struct Cli {
    /// Learner id
    #[arg(long, short, default_value_t = 1)]
    user: i64,

    /// Database file (overrides config.toml and SRS_DATABASE_PATH)
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a word; it is due immediately
    Add { word: String, translation: String },

    /// Remove a word and its review card
    Remove { item_id: i64 },

    /// Record one review. Quality is 0-5 or a label (blackout .. perfect)
    Review { item_id: i64, quality: String },

    /// Review all due cards interactively
    Session,

    /// List cards due at the simulated date
    Due,

    /// List all cards with their schedule
    List,

    /// Review history of one card
    History { item_id: i64 },

    /// Show totals and average mastery
    Stats,

    /// Move the simulated date one day forward
    AdvanceDay,

    /// Write the learner's cards to a JSON file
    Export { output: PathBuf },

    /// Load cards from a JSON backup
    Import { input: PathBuf },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vocab_srs=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let path = match cli.db {
        Some(path) => path,
        None => config::load_database_path()?,
    };
    let mut conn = db::init_database(&path)?;
    let user = cli.user;

    match cli.command {
        Commands::Add { word, translation } => {
            let id = db::add_word(user, &word, &translation, &conn)?;
            println!("{} '{}' -> '{}'", id, word, translation);
        }
        Commands::Remove { item_id } => {
            if db::remove_word(user, item_id, &conn)? {
                println!("Removed item {}", item_id);
            } else {
                println!("No item {} for user {}", item_id, user);
            }
        }
        Commands::Review { item_id, quality } => {
            let quality: Quality = quality.parse()?;
            let now = db::get_current_date(&conn)?;
            let quality_value = i64::from(quality.value());
            let card = db::submit_review(user, item_id, quality_value, now, &mut conn)?;
            println!(
                "Rated {}: next review in {} day(s) on {} (EF {:.2}, streak {})",
                quality,
                card.interval,
                card.next_review_at.format("%Y-%m-%d"),
                card.ease_factor,
                card.repetitions
            );
        }
        Commands::Session => run_session(user, conn)?,
        Commands::Due => {
            let now = db::get_current_date(&conn)?;
            let due = db::get_due_cards(user, now, &conn)?;
            println!("{} card(s) due on {}", due.len(), now.format("%Y-%m-%d"));
            for vc in due {
                println!("  {:>4}  {}", vc.item.id, vc.item.word);
            }
        }
        Commands::List => {
            for vc in db::get_cards_for_user(user, &conn)? {
                println!(
                    "{:>4}  {:<20} {:<20} EF {:.2}  int {:>3}  reps {:>2}  due {}  mastery {:>3}%",
                    vc.item.id,
                    vc.item.word,
                    vc.item.translation,
                    vc.card.ease_factor,
                    vc.card.interval,
                    vc.card.repetitions,
                    vc.card.next_review_at.format("%Y-%m-%d"),
                    sm2::mastery_level(vc.card.repetitions, vc.card.ease_factor)
                );
            }
        }
        Commands::History { item_id } => {
            for entry in db::get_review_history(user, item_id, &conn)? {
                println!(
                    "{}  quality {}  interval {}",
                    entry.reviewed_at.format("%Y-%m-%d %H:%M"),
                    entry.quality,
                    entry.interval_days
                );
            }
        }
        Commands::Stats => {
            let now = db::get_current_date(&conn)?;
            let stats = db::user_stats(user, now, &conn)?;
            println!("Words:           {}", stats.total_items);
            println!("Never reviewed:  {}", stats.new_items);
            println!("Due now:         {}", stats.due_now);
            println!("Average mastery: {:.1}%", stats.average_mastery);
        }
        Commands::AdvanceDay => {
            let date = db::advance_day(&conn)?;
            println!("Simulated date is now {}", date.format("%Y-%m-%d"));
        }
        Commands::Export { output } => {
            let count = export_json_to_path(user, &output, &conn)?;
            println!("Exported {} card(s) to {}", count, output.display());
        }
        Commands::Import { input } => {
            let count = import_json(user, &input, &mut conn)?;
            println!("Imported {} card(s) from {}", count, input.display());
        }
    }

    Ok(())
}

fn run_session(user: i64, conn: rusqlite::Connection) -> Result<()> {
    let now = db::get_current_date(&conn)?;
    let due = db::get_due_cards(user, now, &conn)?;
    let mut session = ReviewSession::new_from_due_cards(user, due, SqliteCardStore::new(conn));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut stdout = io::stdout();
    let mut round = 0;

    while !session.is_completed() {
        if session.round_number != round {
            round = session.round_number;
            println!("{}", session.phase_message());
        }
        let Some(vc) = session.current_card() else {
            break;
        };
        let (word, translation) = (vc.item.word.clone(), vc.item.translation.clone());

        print!("{}  (enter to reveal) ", word);
        stdout.flush()?;
        if lines.next().transpose()?.is_none() {
            return Ok(());
        }

        loop {
            print!("{}  quality 0-5: ", translation);
            stdout.flush()?;
            let Some(line) = lines.next().transpose()? else {
                return Ok(());
            };
            let graded = line
                .parse::<Quality>()
                .and_then(|q| session.grade_current_card(i64::from(q.value())));
            match graded {
                Ok(Some(card)) => {
                    println!("  next review in {} day(s)", card.interval);
                    break;
                }
                Ok(None) => break,
                Err(e) => println!("  {}", e),
            }
        }
        session.next_card();
    }

    println!("Session complete");
    Ok(())
}
