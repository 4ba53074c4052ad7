use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Backend-assigned record identifier. The backend may hand it out as a JSON
/// number or a string; either way it is kept as text and echoed back in URLs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BookId(String);

impl BookId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BookId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<u64> for BookId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for BookId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.parse::<u64>() {
            Ok(n) => serializer.serialize_u64(n),
            Err(_) => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for BookId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match LooseScalar::deserialize(deserializer)? {
            LooseScalar::Null => Err(serde::de::Error::custom("book id is null")),
            other => Ok(BookId(other.into_text().unwrap_or_default())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LooseScalar {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

impl LooseScalar {
    fn into_text(self) -> Option<String> {
        match self {
            LooseScalar::Null => None,
            LooseScalar::Bool(b) => Some(b.to_string()),
            LooseScalar::Int(n) => Some(n.to_string()),
            LooseScalar::UInt(n) => Some(n.to_string()),
            LooseScalar::Float(f) => Some(f.to_string()),
            LooseScalar::Text(s) => Some(s),
        }
    }
}

fn text_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(LooseScalar::deserialize(deserializer)?
        .into_text()
        .unwrap_or_default())
}

fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(LooseScalar::deserialize(deserializer)?.into_text())
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PublishedYear {
    raw: String,
}

impl PublishedYear {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn numeric(&self) -> Option<i64> {
        crate::utils::parse_year(&self.raw)
    }

    pub fn is_empty(&self) -> bool {
        self.raw.trim().is_empty()
    }
}

impl fmt::Display for PublishedYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for PublishedYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.numeric() {
            Some(n) if n.to_string() == self.raw.trim() => serializer.serialize_i64(n),
            _ => serializer.serialize_str(&self.raw),
        }
    }
}

impl<'de> Deserialize<'de> for PublishedYear {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(PublishedYear {
            raw: LooseScalar::deserialize(deserializer)?
                .into_text()
                .unwrap_or_default(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub author: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub genre: Option<String>,
    #[serde(default)]
    pub published_year: PublishedYear,
    #[serde(default, deserialize_with = "optional_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub kstatus: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub krates: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub jstatus: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub jrates: Option<String>,
}

impl Book {
    pub fn genre_label(&self) -> Option<&str> {
        self.genre
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
    }

    pub fn k_tracking(&self) -> Tracking<'_> {
        Tracking {
            label: "K",
            status: self.kstatus.as_deref(),
            rates: self.krates.as_deref(),
        }
    }

    pub fn j_tracking(&self) -> Tracking<'_> {
        Tracking {
            label: "J",
            status: self.jstatus.as_deref(),
            rates: self.jrates.as_deref(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tracking<'a> {
    pub label: &'static str,
    pub status: Option<&'a str>,
    pub rates: Option<&'a str>,
}

impl fmt::Display for Tracking<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} ({})",
            self.label,
            self.status.unwrap_or(""),
            self.rates.unwrap_or("")
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_year: String,
    pub location: String,
    pub kstatus: String,
    pub krates: String,
    pub jstatus: String,
    pub jrates: String,
    pub notes: String,
}

impl From<&Book> for BookDraft {
    fn from(book: &Book) -> Self {
        BookDraft {
            title: book.title.clone(),
            author: book.author.clone(),
            genre: book.genre.clone().unwrap_or_default(),
            published_year: book.published_year.raw().to_string(),
            location: book.location.clone().unwrap_or_default(),
            kstatus: book.kstatus.clone().unwrap_or_default(),
            krates: book.krates.clone().unwrap_or_default(),
            jstatus: book.jstatus.clone().unwrap_or_default(),
            jrates: book.jrates.clone().unwrap_or_default(),
            notes: book.notes.clone().unwrap_or_default(),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DraftPatch {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    pub published_year: Option<String>,
    pub location: Option<String>,
    pub kstatus: Option<String>,
    pub krates: Option<String>,
    pub jstatus: Option<String>,
    pub jrates: Option<String>,
    pub notes: Option<String>,
}

impl DraftPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.genre.is_none()
            && self.published_year.is_none()
            && self.location.is_none()
            && self.kstatus.is_none()
            && self.krates.is_none()
            && self.jstatus.is_none()
            && self.jrates.is_none()
            && self.notes.is_none()
    }

    pub fn apply(self, draft: &mut BookDraft) {
        let fields = [
            (self.title, &mut draft.title),
            (self.author, &mut draft.author),
            (self.genre, &mut draft.genre),
            (self.published_year, &mut draft.published_year),
            (self.location, &mut draft.location),
            (self.kstatus, &mut draft.kstatus),
            (self.krates, &mut draft.krates),
            (self.jstatus, &mut draft.jstatus),
            (self.jrates, &mut draft.jrates),
            (self.notes, &mut draft.notes),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value;
            }
        }
    }

    pub fn into_draft(self) -> BookDraft {
        let mut draft = BookDraft::default();
        self.apply(&mut draft);
        draft
    }
}
