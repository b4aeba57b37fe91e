//! In-memory book collection
//!
//! Owns the ordered sequence of books and the id counter. Insertion order is
//! listing order; deletions shift later entries down.

mod book;
mod error;

pub use book::{seed_books, Book, BookPayload};
pub use error::StoreError;

/// Ordered collection of books with monotonic id assignment
#[derive(Debug)]
pub struct BookStore {
    books: Vec<Book>,
    next_id: i64,
}

impl BookStore {
    /// Create a store holding `books`; new ids continue after the highest one
    pub fn new(books: Vec<Book>) -> Self {
        let next_id = books.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        Self { books, next_id }
    }

    /// Create a store with the built-in catalogue
    pub fn seeded() -> Self {
        Self::new(seed_books())
    }

    /// All books in insertion order
    pub fn list(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    /// Append a new book with the next id and return the stored record
    ///
    /// Any id carried by the candidate is ignored.
    pub fn insert(&mut self, candidate: BookPayload) -> Book {
        let book = candidate.into_book(self.next_id);
        self.next_id += 1;
        self.books.push(book.clone());
        book
    }

    pub fn find_by_id(&self, id: i64) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }

    /// Overwrite the record with `id`; the stored record keeps `id`
    pub fn replace_by_id(&mut self, id: i64, replacement: BookPayload) -> Result<&Book, StoreError> {
        let index = self.position(id)?;
        self.books[index] = replacement.into_book(id);
        Ok(&self.books[index])
    }

    /// Remove the record with `id`, returning it
    pub fn delete_by_id(&mut self, id: i64) -> Result<Book, StoreError> {
        let index = self.position(id)?;
        Ok(self.books.remove(index))
    }

    fn position(&self, id: i64) -> Result<usize, StoreError> {
        self.books
            .iter()
            .position(|b| b.id == id)
            .ok_or(StoreError::NotFound(id))
    }
}

impl Default for BookStore {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
