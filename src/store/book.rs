// Book record and request payload types
// Field names on the wire are fixed: "id", "titulo", "autor"

use serde::{Deserialize, Serialize};

/// A stored book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "autor")]
    pub author: String,
}

/// Decoded POST/PUT body
///
/// `id` is optional: create ignores it, update only checks it against the
/// path id. Missing strings decode as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookPayload {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(rename = "titulo", default)]
    pub title: String,
    #[serde(rename = "autor", default)]
    pub author: String,
}

impl BookPayload {
    /// Attach an id, producing the record as it will be stored
    pub fn into_book(self, id: i64) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
        }
    }
}

/// Initial catalogue loaded when `store.seed` is enabled
pub fn seed_books() -> Vec<Book> {
    [
        ("O Guarani", "José de Alencar"),
        ("Iracema", "José de Alencar"),
        ("Dom Casmurro", "Machado de Assis"),
        ("A Hora da Estrela", "Clarice Lispector"),
        ("Grande Sertão: Veredas", "Guimarães Rosa"),
    ]
    .into_iter()
    .zip(1..)
    .map(|((title, author), id)| Book {
        id,
        title: title.to_string(),
        author: author.to_string(),
    })
    .collect()
}
