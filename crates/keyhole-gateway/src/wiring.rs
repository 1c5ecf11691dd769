//! Builds a [`Shortener`] from command line settings.

use crate::cli::{CacheBackend, Cli, StorageBackend};
use anyhow::Context;
use keyhole_cache::{LayeredCache, MokaUrlCache, NoopCache, RedisUrlCache};
use keyhole_core::{Repository, Shortener};
use keyhole_generator::{RandomGenerator, RandomGeneratorSettings};
use keyhole_shortener::{ShortenerService, ShortenerSettings};
use keyhole_storage::{InMemoryRepository, MySqlRepository};
use std::sync::Arc;
use tracing::info;

pub async fn build_shortener(cli: &Cli) -> anyhow::Result<Arc<dyn Shortener>> {
    let generator = RandomGenerator::new(
        RandomGeneratorSettings::builder()
            .length(cli.key_length)
            .build(),
    )
    .context("invalid key generator settings")?;
    let settings = cli.shortener_settings();

    match cli.storage {
        StorageBackend::InMemory => {
            with_cache(cli, InMemoryRepository::new(), generator, settings).await
        }
        StorageBackend::Mysql => {
            let dsn = cli
                .mysql_dsn
                .as_deref()
                .context("--mysql-dsn is required for mysql storage")?;
            let repository = MySqlRepository::connect(dsn)
                .await
                .context("failed to connect to mysql")?;
            repository
                .ensure_schema()
                .await
                .context("failed to apply mysql schema")?;
            info!("Connected to mysql");
            with_cache(cli, repository, generator, settings).await
        }
    }
}

async fn with_cache<R: Repository>(
    cli: &Cli,
    repository: R,
    generator: RandomGenerator,
    settings: ShortenerSettings,
) -> anyhow::Result<Arc<dyn Shortener>> {
    let shortener: Arc<dyn Shortener> = match cli.cache {
        CacheBackend::None => Arc::new(ShortenerService::new(
            repository, NoopCache, generator, settings,
        )),
        CacheBackend::Moka => Arc::new(ShortenerService::new(
            repository,
            MokaUrlCache::from(cli.moka_config()),
            generator,
            settings,
        )),
        CacheBackend::Redis => Arc::new(ShortenerService::new(
            repository,
            connect_redis(cli).await?,
            generator,
            settings,
        )),
        CacheBackend::Layered => {
            let cache = LayeredCache::new(
                MokaUrlCache::from(cli.moka_config()),
                connect_redis(cli).await?,
            );
            Arc::new(ShortenerService::new(
                repository, cache, generator, settings,
            ))
        }
    };

    Ok(shortener)
}

async fn connect_redis(cli: &Cli) -> anyhow::Result<RedisUrlCache> {
    let url = cli
        .redis_url
        .as_deref()
        .context("--redis-url is required for the redis cache")?;
    let cache = RedisUrlCache::connect(url, cli.redis_key_prefix.clone())
        .await
        .context("failed to connect to redis")?;
    info!("Connected to redis");
    Ok(cache)
}
