use crate::store::{by_id, Collection, Document, DocumentStore, Filter};

pub async fn list(db: &dyn DocumentStore) -> anyhow::Result<Vec<Document>> {
    db.find(Collection::Parts, Filter::new()).await
}

pub async fn get(db: &dyn DocumentStore, id: &str) -> anyhow::Result<Option<Document>> {
    db.find_one(Collection::Parts, by_id(id)).await
}

pub async fn create(db: &dyn DocumentStore, part: Document) -> anyhow::Result<String> {
    db.insert(Collection::Parts, part).await
}
