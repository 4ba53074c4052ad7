use std::cmp::Ordering;
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::model::Book;

pub const ALL_GENRES_LABEL: &str = "All Genres";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Title,
    Author,
    PublishedYear,
}

impl SortKey {
    pub fn parse(value: &str) -> Result<Option<Self>, String> {
        match value.trim().to_lowercase().as_str() {
            "" | "none" => Ok(None),
            "title" => Ok(Some(Self::Title)),
            "author" => Ok(Some(Self::Author)),
            "published_year" | "year" => Ok(Some(Self::PublishedYear)),
            other => Err(format!(
                "unknown sort key '{other}', expected title, author or published_year"
            )),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Author => "author",
            Self::PublishedYear => "published_year",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewQuery {
    pub search: String,
    pub category: String,
    pub sort: Option<SortKey>,
}

impl ViewQuery {
    pub fn new(search: impl Into<String>, category: impl Into<String>, sort: Option<SortKey>) -> Self {
        Self {
            search: search.into(),
            category: category.into(),
            sort,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CategoryOption {
    pub value: String,
    pub label: String,
}

impl CategoryOption {
    pub fn all() -> Self {
        Self {
            value: String::new(),
            label: ALL_GENRES_LABEL.to_string(),
        }
    }

    pub fn is_all(&self) -> bool {
        self.value.is_empty()
    }
}

/// The "all" option followed by one option per distinct genre, in the order
/// genres first appear in `books`. Blank genres contribute nothing.
pub fn category_options(books: &[Book]) -> Vec<CategoryOption> {
    let genres = books
        .iter()
        .filter_map(Book::genre_label)
        .unique()
        .map(|genre| CategoryOption {
            value: genre.to_string(),
            label: genre.to_string(),
        });
    std::iter::once(CategoryOption::all()).chain(genres).collect()
}

pub fn matches_search(book: &Book, search: &str) -> bool {
    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();
    book.title.to_lowercase().contains(&needle) || book.author.to_lowercase().contains(&needle)
}

pub fn matches_category(book: &Book, category: &str) -> bool {
    if category.is_empty() {
        return true;
    }
    match book.genre_label() {
        Some(genre) => genre.to_lowercase() == category.to_lowercase(),
        None => false,
    }
}

pub fn filter_books<'a>(books: &'a [Book], query: &ViewQuery) -> Vec<&'a Book> {
    books
        .iter()
        .filter(|b| matches_search(b, &query.search))
        .filter(|b| matches_category(b, &query.category))
        .collect()
}

fn compare_text(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

fn compare_year(a: &Book, b: &Book) -> Ordering {
    match (a.published_year.numeric(), b.published_year.numeric()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn compare_by(key: SortKey, a: &Book, b: &Book) -> Ordering {
    match key {
        SortKey::Title => compare_text(&a.title, &b.title),
        SortKey::Author => compare_text(&a.author, &b.author),
        SortKey::PublishedYear => compare_year(a, b),
    }
}

pub fn sort_books(books: &mut [&Book], key: Option<SortKey>) {
    if let Some(key) = key {
        books.sort_by(|a, b| compare_by(key, a, b));
    }
}

pub fn apply_query<'a>(books: &'a [Book], query: &ViewQuery) -> Vec<&'a Book> {
    let mut visible = filter_books(books, query);
    sort_books(&mut visible, query.sort);
    visible
}
