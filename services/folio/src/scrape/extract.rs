use super::{FetchError, FetchResult};
use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::LazyLock;
use url::Url;

static PRE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("pre").expect("pre selector"));
static VIDEO_SOURCE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("video source").expect("video source selector"));
static EMBED_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"src=(?:'([^']*)'|"([^"]*)")"#).expect("embed src regex")
});

/// Parses the text of the page's first `<pre>` block as JSON.
///
/// Browsers render a raw JSON response inside a `<pre>` wrapper, so this is
/// how the JSON endpoints come back through the headless session.
pub fn pre_json(html: &str) -> FetchResult<Value> {
    let document = Html::parse_document(html);
    let text: String = document
        .select(&PRE)
        .next()
        .map(|pre| pre.text().collect())
        .ok_or(FetchError::MissingPayload)?;
    let text = text.trim();
    if text.is_empty() {
        return Err(FetchError::MissingPayload);
    }
    Ok(serde_json::from_str(text)?)
}

/// Returns the `src` of the first `<video><source>` element, resolved against
/// `page_url` the way the DOM's `src` property is.
pub fn video_source(html: &str, page_url: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let src = document
        .select(&VIDEO_SOURCE)
        .next()?
        .value()
        .attr("src")?
        .trim();
    if src.is_empty() {
        return None;
    }
    match Url::parse(page_url).and_then(|base| base.join(src)) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(_) => Url::parse(src).ok().map(|absolute| absolute.to_string()),
    }
}

/// Extracts the player URL from an embed snippet such as
/// `<iframe src='https://player.example/embed/1'></iframe>`.
pub fn embed_source_url(snippet: &str) -> Option<String> {
    let captures = EMBED_SRC.captures(snippet)?;
    captures
        .get(1)
        .or_else(|| captures.get(2))
        .map(|m| m.as_str().trim())
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}
