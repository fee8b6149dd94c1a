/// Namespaced Redis cache with graceful degradation.
///
/// Every key is written under a fixed namespace prefix (for example `sg:v1:`), so a
/// server can drop all of its own keys without touching anyone else's. On any Redis
/// failure an operation logs a warning and behaves like a cache miss; callers recompute
/// from source. Nothing requires Redis to be running.
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::CommonError;

pub struct RedisCache {
    client: Option<redis::Client>,
    namespace: String,
}

impl RedisCache {
    /// Build a cache for `namespace`. A missing or unparsable URL yields a cache that
    /// never stores anything.
    pub fn new(url: Option<&str>, namespace: impl Into<String>) -> Self {
        let client = url.and_then(|u| {
            redis::Client::open(u)
                .inspect_err(|e| warn!(error = %e, url = u, "failed to create redis client, cache disabled"))
                .ok()
        });
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    /// A cache that is permanently disabled.
    pub fn disabled(namespace: impl Into<String>) -> Self {
        Self::new(None, namespace)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Full key for a namespace-relative name.
    pub fn key(&self, name: &str) -> String {
        format!("{}{name}", self.namespace)
    }

    /// PING the server. `false` when disabled or unreachable.
    pub async fn is_available(&self) -> bool {
        let Some(mut conn) = self.connection().await else {
            return false;
        };
        let pong: Result<String, _> = redis::cmd("PING").query_async(&mut conn).await;
        pong.is_ok()
    }

    pub async fn get(&self, name: &str) -> Option<String> {
        let mut conn = self.connection().await?;
        let key = self.key(name);
        conn.get::<_, Option<String>>(&key)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis GET failed"))
            .ok()?
    }

    /// Store without expiry. Returns `true` if Redis accepted the write.
    pub async fn set(&self, name: &str, value: &str) -> bool {
        let Some(mut conn) = self.connection().await else {
            return false;
        };
        let key = self.key(name);
        conn.set::<_, _, ()>(&key, value)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis SET failed"))
            .is_ok()
    }

    pub async fn set_with_ttl(&self, name: &str, value: &str, ttl_secs: u64) -> bool {
        let Some(mut conn) = self.connection().await else {
            return false;
        };
        let key = self.key(name);
        conn.set_ex::<_, _, ()>(&key, value, ttl_secs)
            .await
            .inspect_err(|e| warn!(error = %e, key, "redis SETEX failed"))
            .is_ok()
    }

    /// Read and deserialize a JSON value. Undecodable payloads count as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let json = self.get(name).await?;
        decode(&json)
            .inspect_err(|e| warn!(error = %e, key = self.key(name), "cache deserialization failed"))
            .ok()
    }

    pub async fn set_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> bool {
        match serde_json::to_string(value) {
            Ok(json) => self.set(name, &json).await,
            Err(e) => {
                warn!(error = %e, key = self.key(name), "cache serialization failed");
                false
            }
        }
    }

    pub async fn set_json_with_ttl<T: Serialize + ?Sized>(
        &self,
        name: &str,
        value: &T,
        ttl_secs: u64,
    ) -> bool {
        match serde_json::to_string(value) {
            Ok(json) => self.set_with_ttl(name, &json, ttl_secs).await,
            Err(e) => {
                warn!(error = %e, key = self.key(name), "cache serialization failed");
                false
            }
        }
    }

    /// Delete every key in this cache's namespace.
    ///
    /// Walks the keyspace with SCAN rather than KEYS so the server is never blocked.
    pub async fn clear_namespace(&self) -> bool {
        let Some(mut conn) = self.connection().await else {
            return false;
        };

        let pattern = format!("{}*", self.namespace);
        let mut cursor: u64 = 0;
        loop {
            let scanned: Result<(u64, Vec<String>), _> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await;
            let (next_cursor, keys) = match scanned {
                Ok(page) => page,
                Err(e) => {
                    warn!(error = %e, pattern, "redis SCAN failed");
                    return false;
                }
            };

            if !keys.is_empty() {
                if let Err(e) = conn.del::<_, ()>(&keys).await {
                    warn!(error = %e, pattern, "redis DEL failed while clearing namespace");
                    return false;
                }
            }

            cursor = next_cursor;
            if cursor == 0 {
                return true;
            }
        }
    }

    async fn connection(&self) -> Option<MultiplexedConnection> {
        let client = self.client.as_ref()?;
        client
            .get_multiplexed_async_connection()
            .await
            .inspect_err(|e| warn!(error = %e, namespace = %self.namespace, "redis connection failed"))
            .ok()
    }
}

fn decode<T: DeserializeOwned>(json: &str) -> Result<T, CommonError> {
    Ok(serde_json::from_str(json)?)
}
