use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr};

/// Longest accepted session lifetime: ten years.
pub const MAX_SESSION_TTL_HOURS: i64 = 10 * 366 * 24;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub upload_dir: String,
    pub database_url: String,
    pub session_ttl_hours: i64,
    pub max_upload_mb: usize,
    pub cookie_secure: bool,
    pub admin_password: String,
    pub seed: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Movie catalog and streaming service")]
pub struct Args {
    /// Host to bind to (overrides MOVIE_CATALOG_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides MOVIE_CATALOG_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where uploaded posters and videos are stored (overrides MOVIE_CATALOG_UPLOAD_DIR)
    #[arg(long)]
    pub upload_dir: Option<String>,

    /// Database URL (overrides MOVIE_CATALOG_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Session lifetime in hours (overrides MOVIE_CATALOG_SESSION_TTL_HOURS)
    #[arg(long)]
    pub session_ttl_hours: Option<i64>,

    /// Largest accepted admin upload in MiB (overrides MOVIE_CATALOG_MAX_UPLOAD_MB)
    #[arg(long)]
    pub max_upload_mb: Option<usize>,

    /// Mark the session cookie `Secure` (overrides MOVIE_CATALOG_COOKIE_SECURE)
    #[arg(long)]
    pub cookie_secure: bool,

    /// Password for the seeded `admin` account (overrides MOVIE_CATALOG_ADMIN_PASSWORD)
    #[arg(long)]
    pub admin_password: Option<String>,

    /// Skip creating the admin account and sample movies
    #[arg(long)]
    pub no_seed: bool,

    /// Run migrations (and seeding) and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();

        let env_host = env::var("MOVIE_CATALOG_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = parse_env("MOVIE_CATALOG_PORT", 5000u16)?;
        let env_upload =
            env::var("MOVIE_CATALOG_UPLOAD_DIR").unwrap_or_else(|_| "./static/uploads".into());
        let env_db = env::var("MOVIE_CATALOG_DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://./data/movies.db".into());
        let env_ttl = parse_env("MOVIE_CATALOG_SESSION_TTL_HOURS", 24i64)?;
        let env_max_upload = parse_env("MOVIE_CATALOG_MAX_UPLOAD_MB", 512usize)?;
        let env_secure = parse_env("MOVIE_CATALOG_COOKIE_SECURE", false)?;
        let env_admin_password =
            env::var("MOVIE_CATALOG_ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into());

        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            upload_dir: args.upload_dir.unwrap_or(env_upload),
            database_url: args.database_url.unwrap_or(env_db),
            session_ttl_hours: args.session_ttl_hours.unwrap_or(env_ttl),
            max_upload_mb: args.max_upload_mb.unwrap_or(env_max_upload),
            cookie_secure: args.cookie_secure || env_secure,
            admin_password: args.admin_password.unwrap_or(env_admin_password),
            seed: !args.no_seed,
        };

        cfg.validate()?;
        Ok((cfg, args.migrate))
    }

    /// Reject values the rest of the service cannot represent.
    pub fn validate(&self) -> Result<()> {
        if self.session_ttl_hours <= 0 {
            anyhow::bail!("session TTL must be positive, got {}", self.session_ttl_hours);
        }
        if self.session_ttl_hours > MAX_SESSION_TTL_HOURS {
            anyhow::bail!(
                "session TTL of {} hours exceeds the maximum of {}",
                self.session_ttl_hours,
                MAX_SESSION_TTL_HOURS
            );
        }
        Ok(())
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

/// Read `name` from the environment, falling back to `default` when unset.
fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}
