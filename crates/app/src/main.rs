use genie_core::Clock;
use genie_core::model::{Difficulty, QuestionDraft, QuestionId};
use services::AppServices;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod config;
mod format;
mod play;

use config::{
    AppConfig, ArgsError, Backend, ConfigBuilder, parse_number, prepare_sqlite_file, require_value,
};

const DEFAULT_HISTORY_LIMIT: u32 = 20;

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  genie [play]       [options]");
    eprintln!("  genie history      [options] [--limit <n>]");
    eprintln!("  genie stats        [options] [--json]");
    eprintln!("  genie seed         [options] [--force]");
    eprintln!("  genie questions list   [options]");
    eprintln!("  genie questions add    [options] --prompt <text> --option <text>... --correct <text>");
    eprintln!("                         [--category <name>] [--difficulty <easy|medium|hard>]");
    eprintln!("  genie questions delete [options] <id>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --backend <sqlite|remote>   Storage backend (default: sqlite)");
    eprintln!("  --db <sqlite_url>           SQLite URL (default: sqlite://genie.sqlite3)");
    eprintln!("  --remote-url <url>          Remote project URL");
    eprintln!("  --remote-key <key>          Remote API key");
    eprintln!("  --remote-token <token>      Remote access token for the signed-in player");
    eprintln!("  --user <uuid>               Player id (default: local player)");
    eprintln!("  --questions <n>             Questions per round (default: 10)");
    eprintln!("  --time-limit <secs>         Seconds per question, 5-600 (default: 30)");
    eprintln!("  --feedback-ms <ms>          Pause after each answer (default: 300)");
    eprintln!("  --difficulty <list>         Comma-separated difficulties to play (default: all)");
    eprintln!();
    eprintln!("Environment (same as flags, read after .env):");
    eprintln!("  GENIE_BACKEND, GENIE_DB_URL, GENIE_REMOTE_URL, GENIE_REMOTE_KEY,");
    eprintln!("  GENIE_REMOTE_TOKEN, GENIE_USER_ID, GENIE_QUESTIONS, GENIE_TIME_LIMIT,");
    eprintln!("  GENIE_FEEDBACK_MS, GENIE_DIFFICULTY, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    History,
    Stats,
    Seed,
    Questions,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "history" => Some(Self::History),
            "stats" => Some(Self::Stats),
            "seed" => Some(Self::Seed),
            "questions" => Some(Self::Questions),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuestionAction {
    List,
    Add,
    Delete,
}

#[derive(Debug, Default)]
struct DraftArgs {
    prompt: Option<String>,
    options: Vec<String>,
    correct: Option<String>,
    category: Option<String>,
    difficulty: Option<Difficulty>,
}

impl DraftArgs {
    fn into_draft(self) -> Result<QuestionDraft, ArgsError> {
        Ok(QuestionDraft {
            prompt: self
                .prompt
                .ok_or(ArgsError::MissingValue { flag: "--prompt" })?,
            options: self.options,
            correct_option: self
                .correct
                .ok_or(ArgsError::MissingValue { flag: "--correct" })?,
            category: self.category.unwrap_or_else(|| "general".to_string()),
            difficulty: self.difficulty.unwrap_or(Difficulty::Medium),
        })
    }
}

struct Args {
    command: Command,
    config: AppConfig,
    limit: u32,
    json: bool,
    force: bool,
    action: Option<QuestionAction>,
    question_id: Option<QuestionId>,
    draft: DraftArgs,
}

impl Args {
    fn parse(
        command: Command,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut config = ConfigBuilder::from_env()?;
        let mut limit = DEFAULT_HISTORY_LIMIT;
        let mut json = false;
        let mut force = false;
        let mut action = None;
        let mut question_id = None;
        let mut draft = DraftArgs::default();

        while let Some(arg) = args.next() {
            match (command, arg.as_str()) {
                (_, "--help" | "-h") => {
                    print_usage();
                    std::process::exit(0);
                }
                (Command::History, "--limit") => {
                    let value = require_value(args, "--limit")?;
                    limit = parse_number(&value, "--limit")?;
                }
                (Command::Stats, "--json") => json = true,
                (Command::Seed, "--force") => force = true,
                (Command::Questions, "list") if action.is_none() => {
                    action = Some(QuestionAction::List);
                }
                (Command::Questions, "add") if action.is_none() => {
                    action = Some(QuestionAction::Add);
                }
                (Command::Questions, "delete") if action.is_none() => {
                    action = Some(QuestionAction::Delete);
                }
                (Command::Questions, "--prompt") => {
                    draft.prompt = Some(require_value(args, "--prompt")?);
                }
                (Command::Questions, "--option") => {
                    draft.options.push(require_value(args, "--option")?);
                }
                (Command::Questions, "--correct") => {
                    draft.correct = Some(require_value(args, "--correct")?);
                }
                (Command::Questions, "--category") => {
                    draft.category = Some(require_value(args, "--category")?);
                }
                (Command::Questions, "--difficulty") => {
                    let value = require_value(args, "--difficulty")?;
                    draft.difficulty = Some(
                        value
                            .parse()
                            .map_err(|err: genie_core::model::QuestionError| {
                                ArgsError::Settings(err.into())
                            })?,
                    );
                }
                (Command::Questions, raw)
                    if action == Some(QuestionAction::Delete)
                        && question_id.is_none()
                        && !raw.starts_with("--") =>
                {
                    question_id = Some(QuestionId::new(parse_number(raw, "question id")?));
                }
                (_, flag) => {
                    if !config.apply_flag(flag, args)? {
                        return Err(ArgsError::UnknownArg(arg));
                    }
                }
            }
        }

        if command == Command::Questions && action.is_none() {
            return Err(ArgsError::MissingValue {
                flag: "questions <list|add|delete>",
            });
        }
        if action == Some(QuestionAction::Delete) && question_id.is_none() {
            return Err(ArgsError::MissingValue {
                flag: "questions delete <id>",
            });
        }

        Ok(Self {
            command,
            config: config.build()?,
            limit,
            json,
            force,
            action,
            question_id,
            draft,
        })
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn,reqwest=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

async fn build_services(config: &AppConfig) -> Result<AppServices, Box<dyn std::error::Error>> {
    let clock = Clock::default_clock();
    let services = match &config.backend {
        Backend::Sqlite { db_url } => {
            // Keep file creation in the binary glue so storage stays side-effect free.
            prepare_sqlite_file(db_url)?;
            AppServices::new_sqlite(db_url, clock, config.settings.clone()).await?
        }
        Backend::Remote(remote) => {
            AppServices::new_remote(remote.clone(), clock, config.settings.clone())?
        }
    };
    Ok(services)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing();

    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Playing a round is the default when no subcommand is given.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };
    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let args = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let services = build_services(&args.config).await?;
    let user_id = args.config.user_id;
    tracing::debug!(command = ?args.command, %user_id, "services ready");

    match args.command {
        Command::Play => {
            play::play(&services.game_loop(), user_id).await?;
        }
        Command::History => {
            let rows = services.stats().history(user_id, args.limit).await?;
            if rows.is_empty() {
                println!("No games played yet.");
            }
            for row in &rows {
                println!("{}", format::history_line(row));
            }
        }
        Command::Stats => {
            let stats = services.stats();
            let overview = stats.overview(user_id).await?;
            let week = stats.streak_week(user_id).await?;
            if args.json {
                let value = serde_json::json!({ "overview": overview, "week": week });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                print!("{}", format::overview_block(&overview));
                println!();
                print!("{}", format::week_block(&week));
            }
        }
        Command::Seed => {
            let report = services.question_bank().seed_samples(args.force).await?;
            if report.inserted == 0 {
                println!(
                    "Question bank already has {} questions; use --force to add the samples anyway.",
                    report.existing
                );
            } else {
                println!(
                    "Seeded {} sample questions ({} already present).",
                    report.inserted, report.existing
                );
            }
        }
        Command::Questions => {
            let bank = services.question_bank();
            match args.action {
                Some(QuestionAction::List) | None => {
                    for question in bank.list().await? {
                        println!(
                            "{:>4}  [{} | {}]  {}",
                            question.id(),
                            question.category(),
                            question.difficulty(),
                            question.prompt()
                        );
                    }
                }
                Some(QuestionAction::Add) => {
                    let question = bank.add(args.draft.into_draft()?).await?;
                    println!("Added question {}.", question.id());
                }
                Some(QuestionAction::Delete) => {
                    if let Some(id) = args.question_id {
                        bank.delete(id).await?;
                        println!("Deleted question {id}.");
                    }
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
