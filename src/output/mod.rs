pub mod report;

use serde::Serialize;

use crate::catalog::CategoryOption;
use crate::model::Book;
use crate::utils::escape_html;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

pub fn row_class(index: usize) -> &'static str {
    if index % 2 == 0 {
        "white"
    } else {
        "lightgrey"
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn tracking_line(book: &Book) -> String {
    format!("{}, {}", book.k_tracking(), book.j_tracking())
}

pub fn render_text(books: &[Book]) -> Vec<u8> {
    let mut out = String::new();
    for book in books {
        out.push_str(&book.title);
        out.push_str(" by ");
        out.push_str(&book.author);
        if !book.published_year.is_empty() {
            out.push_str(&format!(" ({})", book.published_year));
        }
        out.push_str(&format!("  [#{}]\n", book.id));
        if let Some(location) = present(book.location.as_deref()) {
            out.push_str(&format!("    {location}\n"));
        }
        out.push_str(&format!("    {}\n", tracking_line(book)));
        if let Some(notes) = present(book.notes.as_deref()) {
            out.push_str(&format!("    {notes}\n"));
        }
    }
    out.into_bytes()
}

pub fn render_json<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
    let mut out = serde_json::to_vec_pretty(value).unwrap_or_else(|_| b"[]".to_vec());
    out.push(b'\n');
    out
}

pub fn render_categories_text(options: &[CategoryOption]) -> Vec<u8> {
    let mut out = String::new();
    for option in options {
        if option.is_all() {
            out.push_str(&format!("{} (\"\")\n", option.label));
        } else {
            out.push_str(&option.label);
            out.push('\n');
        }
    }
    out.into_bytes()
}

fn render_book_block(out: &mut String, index: usize, book: &Book) {
    let id = escape_html(book.id.as_str());
    out.push_str(&format!(
        "<div class=\"{}\" data-id=\"{id}\">\n",
        row_class(index)
    ));
    out.push_str("  <div class=\"book-header\">\n");
    out.push_str("    <div class=\"book-title\">\n");
    out.push_str(&format!(
        "      <p class=\"title\">{}</p>\n",
        escape_html(&book.title)
    ));
    out.push_str(&format!(
        "      <span class=\"book-meta\">{}    {}</span>\n",
        escape_html(&book.author),
        escape_html(book.published_year.raw())
    ));
    out.push_str("    </div>\n");
    out.push_str("    <div class=\"button-container\">\n");
    out.push_str(&format!(
        "      <button type=\"button\" data-action=\"delete\" data-id=\"{id}\">Delete</button>\n"
    ));
    out.push_str(&format!(
        "      <button type=\"button\" data-action=\"edit\" data-id=\"{id}\">Edit</button>\n"
    ));
    out.push_str("    </div>\n");
    out.push_str("  </div>\n");
    if let Some(location) = present(book.location.as_deref()) {
        out.push_str(&format!(
            "  <div class=\"location\">{}</div>\n",
            escape_html(location)
        ));
    }
    out.push_str(&format!(
        "  <div class=\"tracking\">{}</div>\n",
        escape_html(&tracking_line(book))
    ));
    if let Some(notes) = present(book.notes.as_deref()) {
        out.push_str(&format!(
            "  <div class=\"notes\">{}</div>\n",
            escape_html(notes)
        ));
    }
    out.push_str("</div>\n");
}

pub fn render_html_fragment(books: &[Book]) -> Vec<u8> {
    let mut out = String::new();
    for (index, book) in books.iter().enumerate() {
        render_book_block(&mut out, index, book);
    }
    out.into_bytes()
}
