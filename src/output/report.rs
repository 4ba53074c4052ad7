use crate::catalog::SortKey;
use crate::controller::CatalogView;
use crate::utils::escape_html;

use super::render_html_fragment;

fn selected(is_selected: bool) -> &'static str {
    if is_selected {
        " selected"
    } else {
        ""
    }
}

fn category_select(view: &CatalogView) -> String {
    let current = view.query.category.trim().to_lowercase();
    let mut out = String::new();
    for option in view.categories.iter() {
        out.push_str(&format!(
            "          <option value=\"{}\"{}>{}</option>\n",
            escape_html(&option.value),
            selected(option.value.to_lowercase() == current),
            escape_html(&option.label)
        ));
    }
    out
}

fn sort_select(current: Option<SortKey>) -> String {
    let choices = [
        (None, "Unsorted"),
        (Some(SortKey::Title), "Title"),
        (Some(SortKey::Author), "Author"),
        (Some(SortKey::PublishedYear), "Year"),
    ];
    let mut out = String::new();
    for (key, label) in choices {
        out.push_str(&format!(
            "          <option value=\"{}\"{}>{}</option>\n",
            key.map(SortKey::as_str).unwrap_or(""),
            selected(key == current),
            label
        ));
    }
    out
}

pub fn render_page(view: &CatalogView, download_href: &str) -> Vec<u8> {
    let books = String::from_utf8(render_html_fragment(&view.books)).unwrap_or_default();
    let html = format!(
        r####"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8"/>
  <meta content="width=device-width, initial-scale=1.0" name="viewport"/>
  <title>Library</title>
  <style>
    body {{ font-family: sans-serif; margin: 2em; }}
    .controls {{ display: flex; gap: 1em; margin-bottom: 1.5em; }}
    .white {{ background-color: #ffffff; padding: 0.75em; }}
    .lightgrey {{ background-color: #d3d3d3; padding: 0.75em; }}
    .book-header {{ display: flex; justify-content: space-between; align-items: center; }}
    .book-title .title {{ font-size: 2em; display: inline-block; margin: 0; }}
    .book-meta {{ margin-left: 1em; white-space: pre; }}
  </style>
</head>
<body>
  <header>
    <h1>Library</h1>
    <p>{shown} of {total} books</p>
  </header>
  <form class="controls" method="get">
    <input id="searchBar" name="search" type="text" placeholder="Search by title or author" value="{search}"/>
    <select id="categoryFilter" name="category">
{categories}    </select>
    <select id="sortBy" name="sort">
{sorts}    </select>
    <button type="submit">Apply</button>
    <a id="download-db-btn" href="{download}" download="library.db">Download database</a>
  </form>
  <div id="books">
{books}  </div>
</body>
</html>
"####,
        shown = view.books.len(),
        total = view.total,
        search = escape_html(&view.query.search),
        categories = category_select(view),
        sorts = sort_select(view.query.sort),
        download = escape_html(download_href),
        books = books,
    );
    html.into_bytes()
}
