use std::cmp::Ordering;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};
use async_trait::async_trait;
use lazy_static::lazy_static;
use serde::Serialize;
use serde_json::Value;
use crate::books::domain::model::BookEntity;
use crate::core::domain::Identifiable;
use crate::core::library::{LibraryError, LibraryResult, PaginatedResult};
use crate::core::repository::Repository;
use crate::loans::domain::model::LoanEntity;
use crate::users::domain::model::UserEntity;

// MemoryTables holds every table of the in-process store so that writes touching
// more than one table happen under a single lock.
#[derive(Debug, Default)]
pub(crate) struct MemoryTables {
    pub books: HashMap<String, BookEntity>,
    pub loans: HashMap<String, LoanEntity>,
    pub users: HashMap<String, UserEntity>,
}

#[derive(Debug, Default, Clone)]
pub(crate) struct MemoryDatabase {
    tables: Arc<Mutex<MemoryTables>>,
}

lazy_static! {
    static ref SHARED_DB: MemoryDatabase = MemoryDatabase::default();
}

impl MemoryDatabase {
    #[cfg(test)]
    pub(crate) fn new() -> Self {
        MemoryDatabase::default()
    }

    // the process-wide database used by the factories
    pub(crate) fn shared() -> Self {
        SHARED_DB.clone()
    }

    pub(crate) fn lock(&self) -> LibraryResult<MutexGuard<'_, MemoryTables>> {
        Ok(self.tables.lock()?)
    }
}

// MemoryRecord binds an entity to its table in MemoryTables.
pub(crate) trait MemoryRecord: Identifiable + Serialize + Clone + 'static {
    const NAME: &'static str;
    fn table(tables: &mut MemoryTables) -> &mut HashMap<String, Self>;
    fn set_version(&mut self, version: i64);
    // records are listed in this order
    fn sort_key(&self) -> String;
    // secondary uniqueness rules checked on create
    fn check_unique(&self, _table: &HashMap<String, Self>) -> LibraryResult<()> {
        Ok(())
    }
}

pub(crate) struct MemoryRepository<E> {
    pub(crate) db: MemoryDatabase,
    _entity: PhantomData<E>,
}

impl<E> MemoryRepository<E> {
    pub(crate) fn new(db: MemoryDatabase) -> Self {
        Self { db, _entity: PhantomData }
    }
}

#[async_trait]
impl<E: MemoryRecord> Repository<E> for MemoryRepository<E> {
    async fn create(&self, entity: &E) -> LibraryResult<usize> {
        let mut tables = self.db.lock()?;
        let table = E::table(&mut tables);
        if table.contains_key(entity.id().as_str()) {
            return Err(LibraryError::conflict(format!("{} {} already exists", E::NAME, entity.id()).as_str()));
        }
        entity.check_unique(table)?;
        table.insert(entity.id(), entity.clone());
        Ok(1)
    }

    async fn update(&self, entity: &E) -> LibraryResult<usize> {
        let mut tables = self.db.lock()?;
        let table = E::table(&mut tables);
        let stored = table.get(entity.id().as_str())
            .ok_or_else(|| LibraryError::not_found(format!("{} not found for {}", E::NAME, entity.id()).as_str()))?;
        if stored.version() != entity.version() {
            return Err(LibraryError::conflict(format!("{} {} was modified concurrently", E::NAME, entity.id()).as_str()));
        }
        let mut next = entity.clone();
        next.set_version(entity.version() + 1);
        table.insert(entity.id(), next);
        Ok(1)
    }

    async fn get(&self, id: &str) -> LibraryResult<E> {
        let mut tables = self.db.lock()?;
        E::table(&mut tables).get(id).cloned()
            .ok_or_else(|| LibraryError::not_found(format!("{} not found for {}", E::NAME, id).as_str()))
    }

    async fn delete(&self, id: &str) -> LibraryResult<usize> {
        let mut tables = self.db.lock()?;
        Ok(E::table(&mut tables).remove(id).map(|_| 1).unwrap_or(0))
    }

    async fn query(&self, predicate: &HashMap<String, String>,
                   page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<E>> {
        let mut tables = self.db.lock()?;
        let mut records = vec![];
        for entity in E::table(&mut tables).values() {
            if matches_predicate(entity, predicate)? {
                records.push(entity.clone());
            }
        }
        records.sort_by_key(|a| a.sort_key());
        Ok(paginate(records, page, page_size))
    }
}

// Checks every `attr[:op]` entry of the predicate against the serialized entity.
pub(crate) fn matches_predicate<T: Serialize>(entity: &T, predicate: &HashMap<String, String>) -> LibraryResult<bool> {
    let value = serde_json::to_value(entity)?;
    for (k, expected) in predicate {
        let (attr, op) = match k.split_once(':') {
            Some((attr, op)) => (attr, op),
            None => (k.as_str(), "="),
        };
        let actual = match value.get(attr) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => b.to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        let ok = match op {
            "=" => actual == *expected,
            "<>" => actual != *expected,
            "contains" => actual.to_lowercase().contains(expected.to_lowercase().as_str()),
            "<" => compare(&actual, expected) == Ordering::Less,
            "<=" => compare(&actual, expected) != Ordering::Greater,
            ">" => compare(&actual, expected) == Ordering::Greater,
            ">=" => compare(&actual, expected) != Ordering::Less,
            other => {
                return Err(LibraryError::validation(format!("unsupported operator {}", other).as_str(), None));
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

// numbers compare numerically, everything else (including formatted dates) lexically
fn compare(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.cmp(b),
    }
}

// pages are offsets into the sorted result
pub(crate) fn paginate<T>(records: Vec<T>, page: Option<&str>, page_size: usize) -> PaginatedResult<T> {
    let offset = page.and_then(|p| p.parse::<usize>().ok()).unwrap_or(0);
    let page_size = page_size.max(1);
    let total = records.len();
    let selected: Vec<T> = records.into_iter().skip(offset).take(page_size).collect();
    let next_page = if offset + page_size < total {
        Some((offset + page_size).to_string())
    } else {
        None
    };
    PaginatedResult::new(page, page_size, next_page, selected)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use serde::Serialize;
    use crate::utils::memory::{matches_predicate, paginate};

    #[derive(Serialize)]
    struct Row {
        title: String,
        available: bool,
        due_date: String,
        quantity: i64,
    }

    fn row() -> Row {
        Row {
            title: "The Rust Programming Language".to_string(),
            available: true,
            due_date: "2023-04-11T11:11:11.250".to_string(),
            quantity: 9,
        }
    }

    #[tokio::test]
    async fn test_should_match_predicates() {
        let cases = vec![
            (("available", "true"), true),
            (("available", "false"), false),
            (("title:contains", "rust"), true),
            (("title:contains", "python"), false),
            (("due_date:<", "2023-05-01T00:00:00"), true),
            (("due_date:<", "2023-04-01T00:00:00"), false),
            (("quantity:>=", "10"), false),
            (("quantity:<", "10"), true),
            (("missing", "x"), false),
        ];
        for ((k, v), expected) in cases {
            let predicate = HashMap::from([(k.to_string(), v.to_string())]);
            assert_eq!(expected, matches_predicate(&row(), &predicate).unwrap(), "{} {}", k, v);
        }
        let predicate = HashMap::from([("title:like".to_string(), "x".to_string())]);
        assert!(matches_predicate(&row(), &predicate).is_err());
    }

    #[tokio::test]
    async fn test_should_paginate() {
        let records: Vec<usize> = (0..25).collect();
        let first = paginate(records.clone(), None, 10);
        assert_eq!(10, first.records.len());
        assert_eq!(Some("10".to_string()), first.next_page);
        let last = paginate(records, Some("20"), 10);
        assert_eq!(vec![20, 21, 22, 23, 24], last.records);
        assert_eq!(None, last.next_page);
    }
}
