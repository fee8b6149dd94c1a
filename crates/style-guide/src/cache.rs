/// Redis caching layer for the style guide server.
///
/// Every operation degrades to a miss or no-op when Redis is down.
///
/// Key schema (namespace `sg:v1:`):
/// - `sg:v1:entry:{anchor}` — JSON GuideEntry
/// - `sg:v1:toc` — JSON Vec<TocRow>
/// - `sg:v1:search:{sha256(query|limit)}` — JSON Vec<EntryHit> (TTL 3600s)
/// - `sg:v1:revision` — content digest of the indexed guide
use sha2::{Digest, Sha256};

use crate::model::{GuideEntry, TocRow};
use crate::search::EntryHit;
use mcp_common::redis::RedisCache;

pub const NAMESPACE: &str = "sg:v1:";
const SEARCH_TTL_SECS: u64 = 3600;

pub struct GuideCache {
    redis: RedisCache,
}

impl GuideCache {
    pub fn new(redis: RedisCache) -> Self {
        Self { redis }
    }

    pub async fn get_entry(&self, anchor: &str) -> Option<GuideEntry> {
        self.redis.get_json(&format!("entry:{anchor}")).await
    }

    pub async fn set_entry(&self, entry: &GuideEntry) {
        self.redis
            .set_json(&format!("entry:{}", entry.anchor), entry)
            .await;
    }

    pub async fn get_toc(&self) -> Option<Vec<TocRow>> {
        self.redis.get_json("toc").await
    }

    pub async fn set_toc(&self, rows: &[TocRow]) {
        self.redis.set_json("toc", rows).await;
    }

    pub async fn get_search_results(&self, query: &str, limit: usize) -> Option<Vec<EntryHit>> {
        self.redis.get_json(&search_key(query, limit)).await
    }

    pub async fn set_search_results(&self, query: &str, limit: usize, hits: &[EntryHit]) {
        self.redis
            .set_json_with_ttl(&search_key(query, limit), hits, SEARCH_TTL_SECS)
            .await;
    }

    pub async fn get_revision(&self) -> Option<String> {
        self.redis.get("revision").await
    }

    pub async fn set_revision(&self, revision: &str) {
        self.redis.set("revision", revision).await;
    }

    pub async fn invalidate_all(&self) {
        self.redis.clear_namespace().await;
    }
}

fn search_key(query: &str, limit: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(query.as_bytes());
    hasher.update(b"|");
    hasher.update(limit.to_string().as_bytes());
    format!("search:{:x}", hasher.finalize())
}
