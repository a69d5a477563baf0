//! `OpenGraph` metadata extraction.

use scraper::{Html, Selector};

use crate::Preview;

/// Extracts a preview from an HTML document.
///
/// The title is the `og:title` content, else the `<title>` text, else
/// `fallback_title`. The description and image come from `og:description`
/// and `og:image` and are empty when absent.
#[must_use]
pub fn parse_html_preview(
    body: &str,
    url: &str,
    fallback_title: &str,
    title_max_chars: usize,
    description_max_chars: usize,
) -> Preview {
    let document = Html::parse_document(body);

    let title = meta_content(&document, "og:title")
        .or_else(|| title_text(&document))
        .map_or_else(
            || fallback_title.to_string(),
            |t| truncate_chars(&t, title_max_chars),
        );
    let description = meta_content(&document, "og:description")
        .map(|d| truncate_chars(&d, description_max_chars))
        .unwrap_or_default();
    let image = meta_content(&document, "og:image").unwrap_or_default();

    Preview {
        title,
        description,
        image,
        url: url.to_string(),
    }
}

fn meta_content(document: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!("meta[property=\"{property}\"]")).ok()?;
    document
        .select(&selector)
        .find_map(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

fn title_text(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
