use clap::Parser;
use once_cell::sync::Lazy;

/// Daily cap for a single course, in minutes.
pub const COURSE_DAILY_CAP_MINUTES: i64 = 120;

pub const DEFAULT_MAX_MARKS: f64 = 100.0;

pub const DEFAULT_PAGE_SIZE: u64 = 20;
pub const MAX_PAGE_SIZE: u64 = 200;

pub static APP_CONFIG: Lazy<Config> = Lazy::new(Config::parse);

#[derive(Debug, Parser, Clone)]
pub struct Config {
    #[clap(long, env, default_value_t = 8080)]
    pub port: u16,

    #[clap(long, env, default_value_t = true)]
    pub swagger_enabled: bool,

    #[clap(long, env, default_value = "info")]
    pub log_level: String,

    #[clap(long, env)]
    pub database_url: String,

    #[clap(long, env, default_value = "local")]
    pub app_env: String,

    #[clap(long, env, default_value = "*")]
    pub cors_allowed_origins: String,

    #[clap(long, env, default_value_t = 1024)]
    pub audit_buffer_size: usize,
}
