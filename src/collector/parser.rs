//! Parsers turning fetched bytes into normalized records
//!
//! Each job kind has its own entry point, all sharing the shape
//! `(bytes, source) -> Result<Vec<Record>, ParseError>`. Pages and API
//! documents also take the charset declared by the server; feeds follow
//! their own `<?xml encoding=...?>` declaration.
//!
//! - [`parse_page`]: exactly one `WebPage` (title + visible body text)
//! - [`parse_api`]: exactly one `ApiPayload` wrapping the raw JSON text
//! - [`parse_feed`]: zero or more `NewsArticle`s, one per RSS `item`
//!
//! All records from one call share a single timestamp taken at parse time.

use crate::collector::JobKind;
use crate::record::{ApiPayload, NewsArticle, Record, WebPage, WEB_SCRAPING_SOURCE};
use chrono::{DateTime, Utc};
use encoding_rs::{Encoding, UTF_8};
use quick_xml::events::Event;
use quick_xml::Reader;
use scraper::{Html, Selector};
use std::borrow::Cow;
use thiserror::Error;

/// Title used when a page or feed item has none
pub const NO_TITLE: &str = "No title";

/// Elements whose text never reaches the page content
const HIDDEN_ELEMENTS: [&str; 3] = ["script", "style", "noscript"];

/// Errors raised when a payload cannot be read as its expected format
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("ParseError for {source_id}: body is not valid {message}")]
    Encoding { source_id: String, message: String },

    #[error("ParseError for {source_id}: malformed JSON: {source}")]
    Json {
        source_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("ParseError for {source_id}: malformed XML: {message}")]
    Xml { source_id: String, message: String },
}

/// Parses a payload with the parser matching the job kind
pub fn parse(
    kind: JobKind,
    bytes: &[u8],
    charset: Option<&str>,
    source_id: &str,
) -> Result<Vec<Record>, ParseError> {
    match kind {
        JobKind::Page => parse_page(bytes, charset, source_id),
        JobKind::Api => parse_api(bytes, charset, source_id),
        JobKind::RssFeed => parse_feed(bytes, source_id),
    }
}

/// Byte-order mark first, then the declared charset, then UTF-8
fn detect_encoding(bytes: &[u8], charset: Option<&str>) -> &'static Encoding {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return encoding;
    }
    charset
        .and_then(|label| Encoding::for_label(label.trim().as_bytes()))
        .unwrap_or(UTF_8)
}

/// Decodes text, replacing undecodable sequences with U+FFFD
fn decode_lossy<'a>(bytes: &'a [u8], charset: Option<&str>) -> Cow<'a, str> {
    let (text, _) = detect_encoding(bytes, charset).decode_with_bom_removal(bytes);
    text
}

/// Decodes text, failing on any undecodable sequence
fn decode_strict<'a>(
    bytes: &'a [u8],
    charset: Option<&str>,
    source_id: &str,
) -> Result<Cow<'a, str>, ParseError> {
    let encoding = detect_encoding(bytes, charset);
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(ParseError::Encoding {
            source_id: source_id.to_string(),
            message: encoding.name().to_string(),
        });
    }
    Ok(text)
}

// ===== HTML pages =====

/// Parses an HTML page into one `WebPage` record
///
/// # Example
///
/// ```
/// use global_harvester::collector::parse_page;
/// use global_harvester::Record;
///
/// let html = br#"<html><head><title>Test</title></head><body><p>Hi</p></body></html>"#;
/// let records = parse_page(html, None, "https://example.com/").unwrap();
/// match &records[0] {
///     Record::WebPage(page) => assert_eq!(page.title, "Test"),
///     _ => unreachable!(),
/// }
/// ```
pub fn parse_page(
    bytes: &[u8],
    charset: Option<&str>,
    source_id: &str,
) -> Result<Vec<Record>, ParseError> {
    let html = decode_lossy(bytes, charset);
    let document = Html::parse_document(&html);

    let title = extract_title(&document).unwrap_or_else(|| NO_TITLE.to_string());
    let content = extract_text(&document);

    Ok(vec![Record::WebPage(WebPage {
        url: source_id.to_string(),
        title,
        content,
        timestamp: Utc::now(),
        source: WEB_SCRAPING_SOURCE.to_string(),
    })])
}

/// Extracts the page title from the HTML document
fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Renders the visible text of `<body>` (or the whole document when there is
/// no body), skipping script/style content and collapsing whitespace
fn extract_text(document: &Html) -> String {
    let root = Selector::parse("body")
        .ok()
        .and_then(|selector| document.select(&selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut words: Vec<&str> = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .map_or(false, |el| HIDDEN_ELEMENTS.contains(&el.name()))
        });
        if hidden {
            continue;
        }

        words.extend(text.split_whitespace());
    }

    words.join(" ")
}

// ===== JSON APIs =====

/// Wraps a JSON document into one `ApiPayload` record
///
/// Only well-formedness is checked; the document text is stored as received.
pub fn parse_api(
    bytes: &[u8],
    charset: Option<&str>,
    source_id: &str,
) -> Result<Vec<Record>, ParseError> {
    let text = decode_strict(bytes, charset, source_id)?;

    serde_json::from_str::<serde_json::Value>(&text).map_err(|source| ParseError::Json {
        source_id: source_id.to_string(),
        source,
    })?;

    Ok(vec![Record::ApiPayload(ApiPayload {
        endpoint: source_id.to_string(),
        data_type: "json".to_string(),
        raw_json: text.into_owned(),
        timestamp: Utc::now(),
    })])
}

// ===== RSS feeds =====

/// Fields collected for the `item` currently being read
#[derive(Debug, Default)]
struct ItemFields {
    title: Option<String>,
    description: Option<String>,
    pub_date: Option<String>,
    link: Option<String>,
    authors: Vec<String>,
}

/// The item child whose text is being captured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemField {
    Title,
    Description,
    PubDate,
    Link,
    Author,
}

impl ItemField {
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Self::Title),
            b"description" => Some(Self::Description),
            b"pubDate" => Some(Self::PubDate),
            b"link" => Some(Self::Link),
            b"author" | b"dc:creator" => Some(Self::Author),
            _ => None,
        }
    }
}

impl ItemFields {
    /// Appends text to a field; text and CDATA pieces of one element concatenate
    fn push_text(&mut self, field: ItemField, text: &str) {
        let slot = match field {
            ItemField::Title => &mut self.title,
            ItemField::Description => &mut self.description,
            ItemField::PubDate => &mut self.pub_date,
            ItemField::Link => &mut self.link,
            ItemField::Author => {
                if let Some(last) = self.authors.last_mut() {
                    last.push_str(text);
                }
                return;
            }
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }

    fn into_article(self, feed_url: &str, timestamp: DateTime<Utc>) -> NewsArticle {
        let authors: Vec<String> = self
            .authors
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();

        NewsArticle {
            title: self
                .title
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| NO_TITLE.to_string()),
            content: self.description.unwrap_or_default().trim().to_string(),
            source: feed_url.to_string(),
            published_date: self.pub_date.unwrap_or_default().trim().to_string(),
            url: self.link.unwrap_or_default().trim().to_string(),
            authors: authors.join(", "),
            timestamp,
        }
    }
}

fn xml_error(source_id: &str, message: impl ToString) -> ParseError {
    ParseError::Xml {
        source_id: source_id.to_string(),
        message: message.to_string(),
    }
}

/// Parses an RSS feed into one `NewsArticle` per `item` element
///
/// A feed without items yields an empty vector, not an error. Missing
/// title falls back to "No title"; missing description, pubDate and link
/// fall back to empty strings.
pub fn parse_feed(bytes: &[u8], source_id: &str) -> Result<Vec<Record>, ParseError> {
    let timestamp = Utc::now();

    // Reading from bytes lets the XML declaration pick the decoder
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);

    let mut articles = Vec::new();
    let mut depth: usize = 0;
    let mut saw_root = false;
    // Depth of the open <item>, if any
    let mut item_depth: Option<usize> = None;
    let mut current: ItemFields = ItemFields::default();
    // Field being captured, only for direct children of <item>
    let mut field: Option<ItemField> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                saw_root = true;
                depth += 1;
                let name = e.name();
                match item_depth {
                    None if name.as_ref() == b"item" => {
                        item_depth = Some(depth);
                        current = ItemFields::default();
                    }
                    Some(item) if depth == item + 1 => {
                        field = ItemField::from_tag(name.as_ref());
                        if field == Some(ItemField::Author) {
                            current.authors.push(String::new());
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                saw_root = true;
                if item_depth.is_none() && e.name().as_ref() == b"item" {
                    articles.push(Record::NewsArticle(
                        ItemFields::default().into_article(source_id, timestamp),
                    ));
                }
            }
            Ok(Event::End(_)) => {
                if let Some(item) = item_depth {
                    if depth == item {
                        let finished = std::mem::take(&mut current);
                        articles.push(Record::NewsArticle(
                            finished.into_article(source_id, timestamp),
                        ));
                        item_depth = None;
                    } else if depth == item + 1 {
                        field = None;
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Text(t)) => {
                if let Some(f) = field {
                    let value = t
                        .unescape()
                        .map(Cow::into_owned)
                        .unwrap_or_else(|_| String::from_utf8_lossy(&t).into_owned());
                    current.push_text(f, &value);
                }
            }
            Ok(Event::CData(c)) => {
                if let Some(f) = field {
                    let value = reader
                        .decoder()
                        .decode(&c)
                        .map(Cow::into_owned)
                        .unwrap_or_else(|_| String::from_utf8_lossy(&c).into_owned());
                    current.push_text(f, &value);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(xml_error(
                    source_id,
                    format!("at byte {}: {}", reader.buffer_position(), e),
                ))
            }
        }
    }

    if !saw_root {
        return Err(xml_error(source_id, "document has no root element"));
    }
    if depth != 0 {
        return Err(xml_error(source_id, "document ended with unclosed elements"));
    }

    Ok(articles)
}
