use std::fmt;
use std::path::{Path, PathBuf};

use genie_core::model::{
    DEFAULT_FEEDBACK_DELAY_MS, DEFAULT_QUESTION_POOL_LIMIT, DEFAULT_QUESTION_TIME_LIMIT_SECS,
    DEFAULT_QUESTIONS_PER_GAME, Difficulty, GameSettings, UserId,
};
use storage::remote::{RemoteConfig, RemoteInitError};

pub const DEFAULT_DB_URL: &str = "sqlite://genie.sqlite3";

#[derive(Debug)]
pub enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidUserId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidBackend { raw: String },
    MissingRemote { name: &'static str },
    Remote(RemoteInitError),
    Settings(genie_core::Error),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid --user value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidBackend { raw } => {
                write!(f, "invalid --backend value (expected sqlite or remote): {raw}")
            }
            ArgsError::MissingRemote { name } => {
                write!(f, "remote backend requires {name}")
            }
            ArgsError::Remote(err) => write!(f, "{err}"),
            ArgsError::Settings(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ArgsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ArgsError::Remote(err) => Some(err),
            ArgsError::Settings(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RemoteInitError> for ArgsError {
    fn from(err: RemoteInitError) -> Self {
        ArgsError::Remote(err)
    }
}

pub fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

pub fn parse_number<T: std::str::FromStr>(raw: &str, flag: &'static str) -> Result<T, ArgsError> {
    raw.trim().parse().map_err(|_| ArgsError::InvalidNumber {
        flag,
        raw: raw.to_string(),
    })
}

/// Comma-separated difficulty list; blank entries are skipped.
pub fn parse_difficulties(raw: &str) -> Result<Vec<Difficulty>, ArgsError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<Difficulty>()
                .map_err(|err| ArgsError::Settings(err.into()))
        })
        .collect()
}

#[derive(Debug, Clone)]
pub enum Backend {
    Sqlite { db_url: String },
    Remote(RemoteConfig),
}

/// Resolved runtime configuration shared by every command.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: Backend,
    pub user_id: UserId,
    pub settings: GameSettings,
}

/// Raw knobs collected from the environment and then from flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    backend: Option<String>,
    db_url: Option<String>,
    remote_url: Option<String>,
    remote_key: Option<String>,
    remote_token: Option<String>,
    user_id: Option<UserId>,
    questions: Option<u32>,
    time_limit: Option<u32>,
    feedback_ms: Option<u64>,
    difficulties: Vec<Difficulty>,
}

impl ConfigBuilder {
    /// Read `GENIE_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ArgsError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ArgsError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let mut builder = Self {
            backend: var("GENIE_BACKEND"),
            db_url: var("GENIE_DB_URL"),
            remote_url: var("GENIE_REMOTE_URL"),
            remote_key: var("GENIE_REMOTE_KEY"),
            remote_token: var("GENIE_REMOTE_TOKEN"),
            ..Self::default()
        };
        if let Some(raw) = var("GENIE_USER_ID") {
            builder.user_id = Some(
                raw.parse()
                    .map_err(|_| ArgsError::InvalidUserId { raw: raw.clone() })?,
            );
        }
        if let Some(raw) = var("GENIE_QUESTIONS") {
            builder.questions = Some(parse_number(&raw, "GENIE_QUESTIONS")?);
        }
        if let Some(raw) = var("GENIE_TIME_LIMIT") {
            builder.time_limit = Some(parse_number(&raw, "GENIE_TIME_LIMIT")?);
        }
        if let Some(raw) = var("GENIE_FEEDBACK_MS") {
            builder.feedback_ms = Some(parse_number(&raw, "GENIE_FEEDBACK_MS")?);
        }
        if let Some(raw) = var("GENIE_DIFFICULTY") {
            builder.difficulties = parse_difficulties(&raw)?;
        }
        Ok(builder)
    }

    /// Consume `flag` (and its value) if it is a shared configuration flag.
    ///
    /// Returns `Ok(false)` when the flag belongs to someone else.
    pub fn apply_flag(
        &mut self,
        flag: &str,
        args: &mut impl Iterator<Item = String>,
    ) -> Result<bool, ArgsError> {
        match flag {
            "--backend" => self.backend = Some(require_value(args, "--backend")?),
            "--db" => {
                let value = require_value(args, "--db")?;
                if value.trim().is_empty() {
                    return Err(ArgsError::InvalidDbUrl { raw: value });
                }
                self.db_url = Some(value);
            }
            "--remote-url" => self.remote_url = Some(require_value(args, "--remote-url")?),
            "--remote-key" => self.remote_key = Some(require_value(args, "--remote-key")?),
            "--remote-token" => self.remote_token = Some(require_value(args, "--remote-token")?),
            "--user" => {
                let value = require_value(args, "--user")?;
                self.user_id = Some(
                    value
                        .parse()
                        .map_err(|_| ArgsError::InvalidUserId { raw: value.clone() })?,
                );
            }
            "--questions" => {
                let value = require_value(args, "--questions")?;
                self.questions = Some(parse_number(&value, "--questions")?);
            }
            "--time-limit" => {
                let value = require_value(args, "--time-limit")?;
                self.time_limit = Some(parse_number(&value, "--time-limit")?);
            }
            "--feedback-ms" => {
                let value = require_value(args, "--feedback-ms")?;
                self.feedback_ms = Some(parse_number(&value, "--feedback-ms")?);
            }
            "--difficulty" => {
                let value = require_value(args, "--difficulty")?;
                self.difficulties = parse_difficulties(&value)?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    pub fn build(self) -> Result<AppConfig, ArgsError> {
        let questions = self.questions.unwrap_or(DEFAULT_QUESTIONS_PER_GAME);
        let settings = GameSettings::new(
            questions,
            self.time_limit.unwrap_or(DEFAULT_QUESTION_TIME_LIMIT_SECS),
            self.feedback_ms.unwrap_or(DEFAULT_FEEDBACK_DELAY_MS),
            DEFAULT_QUESTION_POOL_LIMIT.max(questions),
            self.difficulties,
        )
        .map_err(|err| ArgsError::Settings(err.into()))?;

        let backend = match self.backend.as_deref().map(str::trim) {
            None | Some("sqlite") => Backend::Sqlite {
                db_url: normalize_sqlite_url(
                    self.db_url.unwrap_or_else(|| DEFAULT_DB_URL.to_string()),
                ),
            },
            Some("remote") => {
                let url = self.remote_url.ok_or(ArgsError::MissingRemote {
                    name: "GENIE_REMOTE_URL or --remote-url",
                })?;
                let key = self.remote_key.ok_or(ArgsError::MissingRemote {
                    name: "GENIE_REMOTE_KEY or --remote-key",
                })?;
                Backend::Remote(RemoteConfig::new(&url, key, self.remote_token)?)
            }
            Some(other) => {
                return Err(ArgsError::InvalidBackend {
                    raw: other.to_string(),
                });
            }
        };

        Ok(AppConfig {
            backend,
            user_id: self.user_id.unwrap_or_else(UserId::local),
            settings,
        })
    }
}

/// Turn a bare path or `sqlite:` URL into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file and its parent directories if missing.
pub fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}
