//! In-memory, insertion-ordered store of book records.
//!
//! Every operation takes the single `RwLock` for its whole duration, so id
//! lookups and the mutations that follow them are atomic with respect to each
//! other.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use time::OffsetDateTime;

use super::models::{Book, BookFilter, BookId, BookPayload, BookSummary, ValidationError};

const ID_LEN: usize = 16;

/// No `0/O`, `1/l/I` look-alikes.
const ID_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Source of `insertedAt` / `updatedAt` values.
pub type Clock = Arc<dyn Fn() -> OffsetDateTime + Send + Sync>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("book '{id}' not found")]
    NotFound { id: BookId },

    #[error("book registry lock poisoned")]
    LockPoisoned,
}

pub struct BookRegistry {
    books: RwLock<Vec<Book>>,
    clock: Clock,
}

impl BookRegistry {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(OffsetDateTime::now_utc))
    }

    pub fn with_clock(clock: Clock) -> Self {
        Self {
            books: RwLock::new(Vec::new()),
            clock,
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Book>>, RegistryError> {
        self.books.read().map_err(|_| RegistryError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Book>>, RegistryError> {
        self.books.write().map_err(|_| RegistryError::LockPoisoned)
    }

    /// Validate, assign a fresh id and append. Returns the new id.
    pub fn create(&self, payload: BookPayload) -> Result<BookId, RegistryError> {
        let input = payload.validate()?;

        let mut books = self.write()?;
        let id = fresh_id(&books);
        let now = (self.clock)();

        books.push(Book {
            id: id.clone(),
            finished: input.is_finished(),
            name: input.name,
            year: input.year,
            author: input.author,
            summary: input.summary,
            publisher: input.publisher,
            page_count: input.page_count,
            read_page: input.read_page,
            reading: input.reading,
            inserted_at: now,
            updated_at: now,
        });

        tracing::info!(book_id = %id, total = books.len(), "book created");
        Ok(id)
    }

    /// Projections of the matching records, in insertion order.
    pub fn list(&self, filter: &BookFilter) -> Result<Vec<BookSummary>, RegistryError> {
        let books = self.read()?;
        Ok(books
            .iter()
            .filter(|book| filter.matches(book))
            .map(Book::to_summary)
            .collect())
    }

    pub fn get(&self, id: &str) -> Result<Book, RegistryError> {
        let books = self.read()?;
        books
            .iter()
            .find(|book| book.id == id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    /// Validation runs before the id lookup.
    pub fn update(&self, id: &str, payload: BookPayload) -> Result<(), RegistryError> {
        let input = payload.validate()?;

        let mut books = self.write()?;
        let book = books
            .iter_mut()
            .find(|book| book.id == id)
            .ok_or_else(|| not_found(id))?;

        book.apply(input, (self.clock)());

        tracing::info!(book_id = %id, finished = book.finished, "book updated");
        Ok(())
    }

    pub fn delete(&self, id: &str) -> Result<(), RegistryError> {
        let mut books = self.write()?;
        let index = books
            .iter()
            .position(|book| book.id == id)
            .ok_or_else(|| not_found(id))?;

        // `remove` shifts the tail, keeping relative order.
        books.remove(index);

        tracing::info!(book_id = %id, total = books.len(), "book deleted");
        Ok(())
    }

    pub fn len(&self) -> Result<usize, RegistryError> {
        Ok(self.read()?.len())
    }
}

impl Default for BookRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found(id: &str) -> RegistryError {
    RegistryError::NotFound { id: id.to_string() }
}

fn random_id() -> BookId {
    std::iter::repeat_with(|| ID_ALPHABET[fastrand::usize(..ID_ALPHABET.len())] as char)
        .take(ID_LEN)
        .collect()
}

/// Caller holds the write lock, so the uniqueness check cannot race.
fn fresh_id(books: &[Book]) -> BookId {
    loop {
        let id = random_id();
        if !books.iter().any(|book| book.id == id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::thread;
    use time::Duration;

    /// Each call advances one second from a fixed origin.
    fn stepping_clock() -> Clock {
        let ticks = Arc::new(AtomicI64::new(0));
        Arc::new(move || {
            let tick = ticks.fetch_add(1, Ordering::SeqCst);
            time::macros::datetime!(2024-01-01 00:00:00 UTC) + Duration::seconds(tick)
        })
    }

    fn payload(name: &str, page_count: u32, read_page: u32) -> BookPayload {
        BookPayload {
            name: Some(name.to_string()),
            publisher: format!("{name} Press"),
            page_count,
            read_page,
            ..BookPayload::default()
        }
    }

    #[test]
    fn create_then_get_computes_finished() {
        let registry = BookRegistry::new();

        let done = registry.create(payload("Done", 100, 100)).unwrap();
        let open = registry.create(payload("Open", 100, 3)).unwrap();

        assert!(registry.get(&done).unwrap().finished);
        assert!(!registry.get(&open).unwrap().finished);
        assert_ne!(done, open);
    }

    #[test]
    fn ids_use_unambiguous_alphabet() {
        let registry = BookRegistry::new();
        let id = registry.create(payload("Dune", 1, 0)).unwrap();

        assert_eq!(id.len(), ID_LEN);
        assert!(id.bytes().all(|b| ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn invalid_create_leaves_registry_untouched() {
        let registry = BookRegistry::new();
        registry.create(payload("Keep", 5, 5)).unwrap();

        let err = registry
            .create(BookPayload {
                name: None,
                ..BookPayload::default()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Validation(ValidationError::MissingName)
        ));

        let err = registry.create(payload("Broken", 10, 20)).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Validation(ValidationError::ReadPageExceedsPageCount)
        ));

        assert_eq!(registry.len().unwrap(), 1);
    }

    #[test]
    fn list_preserves_insertion_order_and_projects() {
        let registry = BookRegistry::new();
        let ids: Vec<_> = ["C", "A", "B"]
            .iter()
            .map(|name| registry.create(payload(name, 10, 0)).unwrap())
            .collect();

        let listed = registry.list(&BookFilter::default()).unwrap();
        let listed_ids: Vec<_> = listed.iter().map(|b| b.id.clone()).collect();
        assert_eq!(listed_ids, ids);
        assert_eq!(listed[0].name, "C");
        assert_eq!(listed[0].publisher, "C Press");
    }

    #[test]
    fn list_filters_compose() {
        let registry = BookRegistry::new();
        registry
            .create(BookPayload {
                reading: true,
                ..payload("Dicoding Academy", 10, 10)
            })
            .unwrap();
        registry.create(payload("The Academy Years", 10, 1)).unwrap();
        registry
            .create(BookPayload {
                reading: true,
                ..payload("Unrelated", 10, 2)
            })
            .unwrap();

        let by_name = registry
            .list(&BookFilter {
                name: Some("aCaDeMy".to_string()),
                ..BookFilter::default()
            })
            .unwrap();
        assert_eq!(by_name.len(), 2);

        let reading_academy = registry
            .list(&BookFilter {
                name: Some("academy".to_string()),
                reading: Some(true),
                ..BookFilter::default()
            })
            .unwrap();
        assert_eq!(reading_academy.len(), 1);
        assert_eq!(reading_academy[0].name, "Dicoding Academy");

        let unfinished = registry
            .list(&BookFilter {
                finished: Some(false),
                ..BookFilter::default()
            })
            .unwrap();
        let names: Vec<_> = unfinished.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["The Academy Years", "Unrelated"]);
    }

    #[test]
    fn update_replaces_fields_and_refreshes_updated_at() {
        let registry = BookRegistry::with_clock(stepping_clock());
        let id = registry.create(payload("A", 100, 100)).unwrap();
        let before = registry.get(&id).unwrap();
        assert!(before.finished);

        registry
            .update(
                &id,
                BookPayload {
                    author: "Someone".to_string(),
                    ..payload("A", 100, 50)
                },
            )
            .unwrap();

        let after = registry.get(&id).unwrap();
        assert!(!after.finished);
        assert_eq!(after.read_page, 50);
        assert_eq!(after.author, "Someone");
        assert_eq!(after.id, before.id);
        assert_eq!(after.inserted_at, before.inserted_at);
        assert!(after.updated_at > before.updated_at);
    }

    #[test]
    fn update_keeps_position() {
        let registry = BookRegistry::new();
        let first = registry.create(payload("First", 1, 0)).unwrap();
        registry.create(payload("Second", 1, 0)).unwrap();

        registry.update(&first, payload("Renamed", 1, 1)).unwrap();

        let listed = registry.list(&BookFilter::default()).unwrap();
        assert_eq!(listed[0].id, first);
        assert_eq!(listed[0].name, "Renamed");
    }

    #[test]
    fn update_validates_before_lookup() {
        let registry = BookRegistry::new();

        let err = registry.update("missing", payload("X", 1, 2)).unwrap_err();
        assert!(matches!(err, RegistryError::Validation(_)));

        let err = registry.update("missing", payload("X", 2, 1)).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
    }

    #[test]
    fn invalid_update_leaves_record_untouched() {
        let registry = BookRegistry::new();
        let id = registry.create(payload("Stable", 10, 5)).unwrap();
        let before = registry.get(&id).unwrap();

        registry.update(&id, payload("Stable", 10, 11)).unwrap_err();

        assert_eq!(registry.get(&id).unwrap(), before);
    }

    #[test]
    fn delete_then_get_is_not_found() {
        let registry = BookRegistry::new();
        let a = registry.create(payload("A", 1, 0)).unwrap();
        let b = registry.create(payload("B", 1, 0)).unwrap();
        let c = registry.create(payload("C", 1, 0)).unwrap();

        registry.delete(&b).unwrap();

        assert!(matches!(
            registry.get(&b).unwrap_err(),
            RegistryError::NotFound { .. }
        ));
        assert!(matches!(
            registry.delete(&b).unwrap_err(),
            RegistryError::NotFound { .. }
        ));
        let remaining: Vec<_> = registry
            .list(&BookFilter::default())
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(remaining, vec![a, c]);
    }

    #[test]
    fn concurrent_creates_and_deletes_stay_consistent() {
        let registry = Arc::new(BookRegistry::new());

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for n in 0..50 {
                        let id = registry
                            .create(payload(&format!("w{worker}-{n}"), 10, 0))
                            .unwrap();
                        if n % 2 == 0 {
                            registry.delete(&id).unwrap();
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let listed = registry.list(&BookFilter::default()).unwrap();
        assert_eq!(listed.len(), 8 * 25);
        let mut ids: Vec<_> = listed.into_iter().map(|s| s.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 8 * 25);
    }
}
