use async_trait::async_trait;
use std::collections::HashMap;
use serde::{Deserialize, Serialize};
use crate::core::library::{LibraryResult, PaginatedResult};

#[async_trait]
pub trait Repository<Entity>: Sync + Send {
    // create an entity
    async fn create(&self, entity: &Entity) -> LibraryResult<usize>;

    // updates an entity, guarded by its version
    async fn update(&self, entity: &Entity) -> LibraryResult<usize>;

    // get an entity
    async fn get(&self, id: &str) -> LibraryResult<Entity>;

    // delete an entity
    async fn delete(&self, id: &str) -> LibraryResult<usize>;

    // query by attributes; a key may carry an operator suffix such as `due_date:<`
    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<Entity>>;
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy)]
pub enum RepositoryStore {
    DynamoDB,
    LocalDynamoDB,
    Memory,
}

impl RepositoryStore {
    // LIBRARY_STORE=memory|local|aws, falling back to the dev-mode default
    pub fn from_env(dev_mode: bool) -> RepositoryStore {
        match std::env::var("LIBRARY_STORE").unwrap_or_default().as_str() {
            "memory" => RepositoryStore::Memory,
            "local" => RepositoryStore::LocalDynamoDB,
            "aws" => RepositoryStore::DynamoDB,
            _ if dev_mode => RepositoryStore::LocalDynamoDB,
            _ => RepositoryStore::DynamoDB,
        }
    }
}
