use async_trait::async_trait;
use log::{debug, info};
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;
use std::collections::BTreeSet;
use std::time::Duration;

use super::{CacheError, RecipeStore};
use crate::config::CacheConfig;

const SCAN_BATCH: usize = 100;

/// Redis-backed store; keys are namespaced with the configured prefix
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisStore {
    /// Connect and `PING`, retrying under the configured connection policy
    pub async fn connect(host: &str, port: u16, config: &CacheConfig) -> Result<Self, CacheError> {
        let client = redis::Client::open(format!("redis://{host}:{port}/"))?;
        let timeout = Duration::from_millis(config.connect_timeout_ms);
        let policy = config.connect_retry.policy();

        let conn = policy
            .run(
                &format!("Connecting to Redis at {host}"),
                |_| Self::try_connect(client.clone(), timeout),
                |_| true,
            )
            .await?;

        info!("Connected to Redis at {}", host);
        Ok(Self {
            conn,
            prefix: config.key_prefix.clone(),
        })
    }

    async fn try_connect(
        client: redis::Client,
        timeout: Duration,
    ) -> Result<ConnectionManager, CacheError> {
        // Retries are ours, not the connection manager's
        let manager_config = ConnectionManagerConfig::new()
            .set_number_of_retries(0)
            .set_connection_timeout(timeout)
            .set_response_timeout(timeout);

        let mut conn = ConnectionManager::new_with_config(client, manager_config).await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        debug!("Redis answered {}", pong);
        Ok(conn)
    }

    fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl RecipeStore for RedisStore {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(self.namespaced(key)).await?;
        Ok(raw)
    }

    async fn set_raw(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(self.namespaced(key), value).await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(self.namespaced(key)).await?;
        Ok(())
    }

    async fn keys(&self) -> Result<BTreeSet<String>, CacheError> {
        // SCAN rather than KEYS so a large cache never blocks the server
        let mut conn = self.conn.clone();
        let pattern = format!("{}*", self.prefix);
        let mut keys = BTreeSet::new();
        let mut cursor: u64 = 0;

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            keys.extend(
                batch
                    .into_iter()
                    .filter_map(|k| k.strip_prefix(&self.prefix).map(str::to_string)),
            );

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(keys)
    }
}
