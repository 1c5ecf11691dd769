use clap::{Parser, ValueEnum};
use keyhole_cache::CacheConfig;
use keyhole_shortener::ShortenerSettings;
use keyhole_telemetry::LogFormat;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackend {
    InMemory,
    Mysql,
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::InMemory => write!(f, "in-memory"),
            StorageBackend::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheBackend {
    None,
    Moka,
    Redis,
    /// Moka in front of Redis.
    Layered,
}

impl Display for CacheBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheBackend::None => write!(f, "none"),
            CacheBackend::Moka => write!(f, "moka"),
            CacheBackend::Redis => write!(f, "redis"),
            CacheBackend::Layered => write!(f, "layered"),
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "gateway", about = "Keyhole URL shortener HTTP gateway")]
pub struct Cli {
    #[arg(long, env = "KEYHOLE_LISTEN_ADDR", default_value = "127.0.0.1:8080")]
    pub listen_addr: SocketAddr,

    /// Base of the URL that serves redirects.
    #[arg(
        long,
        env = "KEYHOLE_REAL_BASE_URL",
        default_value = "http://127.0.0.1:8080"
    )]
    pub real_base_url: String,

    /// Base of the URL shown to users; defaults to the real base URL.
    #[arg(long, env = "KEYHOLE_DISPLAY_BASE_URL")]
    pub display_base_url: Option<String>,

    #[arg(long, env = "KEYHOLE_KEY_LENGTH", default_value_t = 6)]
    pub key_length: usize,

    #[arg(long, env = "KEYHOLE_MAX_ATTEMPTS", default_value_t = 100)]
    pub max_attempts: u32,

    #[arg(long, env = "KEYHOLE_STORE_TIMEOUT_MS", default_value_t = 2000)]
    pub store_timeout_ms: u64,

    #[arg(long, env = "KEYHOLE_CACHE_TIMEOUT_MS", default_value_t = 200)]
    pub cache_timeout_ms: u64,

    #[arg(
        long,
        env = "KEYHOLE_STORAGE",
        value_enum,
        default_value_t = StorageBackend::InMemory
    )]
    pub storage: StorageBackend,

    #[arg(long, env = "KEYHOLE_MYSQL_DSN", required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(
        long,
        env = "KEYHOLE_CACHE",
        value_enum,
        default_value_t = CacheBackend::Moka
    )]
    pub cache: CacheBackend,

    #[arg(
        long,
        env = "KEYHOLE_REDIS_URL",
        required_if_eq_any([("cache", "redis"), ("cache", "layered")])
    )]
    pub redis_url: Option<String>,

    #[arg(long, env = "KEYHOLE_REDIS_KEY_PREFIX", default_value = "")]
    pub redis_key_prefix: String,

    #[arg(long, env = "KEYHOLE_MOKA_CAPACITY", default_value_t = 10_000)]
    pub moka_capacity: u64,

    /// Evict in-process cache entries this long after insertion.
    #[arg(long, env = "KEYHOLE_MOKA_TTL_SECS")]
    pub moka_ttl_secs: Option<u64>,

    /// Evict in-process cache entries this long after their last read.
    #[arg(long, env = "KEYHOLE_MOKA_TTI_SECS")]
    pub moka_tti_secs: Option<u64>,

    /// `text` or `json`.
    #[arg(long, env = "KEYHOLE_LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,
}

impl Cli {
    pub fn shortener_settings(&self) -> ShortenerSettings {
        let display_base_url = self
            .display_base_url
            .clone()
            .unwrap_or_else(|| self.real_base_url.clone());

        ShortenerSettings::builder()
            .real_base_url(self.real_base_url.clone())
            .display_base_url(display_base_url)
            .store_timeout(Duration::from_millis(self.store_timeout_ms))
            .cache_timeout(Duration::from_millis(self.cache_timeout_ms))
            .max_attempts(self.max_attempts)
            .build()
    }

    pub fn moka_config(&self) -> CacheConfig {
        CacheConfig {
            max_capacity: Some(self.moka_capacity),
            ttl: self.moka_ttl_secs.map(Duration::from_secs),
            tti: self.moka_tti_secs.map(Duration::from_secs),
        }
    }
}
