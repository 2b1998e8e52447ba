use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    ensure_id, matches, upsert_seed, Collection, Document, DocumentStore, Filter, UpdateOptions,
    UpdateOutcome, ID_FIELD,
};

/// In-process store used when no database is configured, and by tests.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of operations served so far (reads, writes).
    #[cfg(test)]
    pub fn op_counts(&self) -> (usize, usize) {
        (
            self.reads.load(Ordering::Relaxed),
            self.writes.load(Ordering::Relaxed),
        )
    }

    /// Copy of a collection, bypassing the operation counters.
    #[cfg(test)]
    pub async fn snapshot(&self, coll: Collection) -> Vec<Document> {
        self.collections
            .read()
            .await
            .get(&coll)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert(&self, coll: Collection, mut doc: Document) -> anyhow::Result<String> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let id = ensure_id(&mut doc);
        let mut guard = self.collections.write().await;
        let docs = guard.entry(coll).or_default();
        if docs
            .iter()
            .any(|d| d.get(ID_FIELD).and_then(|v| v.as_str()) == Some(id.as_str()))
        {
            anyhow::bail!("duplicate _id {} in {}", id, coll.as_str());
        }
        docs.push(doc);
        Ok(id)
    }

    async fn find(&self, coll: Collection, filter: Filter) -> anyhow::Result<Vec<Document>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let guard = self.collections.read().await;
        Ok(guard
            .get(&coll)
            .map(|docs| docs.iter().filter(|d| matches(d, &filter)).cloned().collect())
            .unwrap_or_default())
    }

    async fn find_one(&self, coll: Collection, filter: Filter) -> anyhow::Result<Option<Document>> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        let guard = self.collections.read().await;
        Ok(guard
            .get(&coll)
            .and_then(|docs| docs.iter().find(|d| matches(d, &filter)).cloned()))
    }

    async fn update(
        &self,
        coll: Collection,
        filter: Filter,
        patch: Document,
        opts: UpdateOptions,
    ) -> anyhow::Result<UpdateOutcome> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let mut guard = self.collections.write().await;
        let docs = guard.entry(coll).or_default();

        let mut matched = 0u64;
        for doc in docs.iter_mut().filter(|d| matches(d, &filter)) {
            doc.extend(patch.clone());
            matched += 1;
        }

        if matched == 0 && opts.upsert {
            let mut doc = upsert_seed(filter, patch);
            let id = ensure_id(&mut doc);
            docs.push(doc);
            return Ok(UpdateOutcome {
                matched_count: 0,
                upserted_id: Some(id),
            });
        }

        Ok(UpdateOutcome {
            matched_count: matched,
            upserted_id: None,
        })
    }

    async fn delete(&self, coll: Collection, filter: Filter) -> anyhow::Result<u64> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        let mut guard = self.collections.write().await;
        let Some(docs) = guard.get_mut(&coll) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !matches(d, &filter));
        Ok((before - docs.len()) as u64)
    }
}
