//! Download link scraping
//!
//! The notification template lists every download link twice: once as the
//! text of a `span.download_link_link` and once as the `href` of an
//! `a.download_link_link`. Each of those shapes is a [`LinkRule`]; the
//! [`LinkExtractor`] runs all of its rules over the HTML body of a message
//! and merges the results into a [`LinkSet`].

use crate::message::{MailMessage, MessagePart};
use crate::types::LinkSet;
use scraper::{Html, Selector};
use tracing::{debug, info, warn};

/// CSS class the WeTransfer template puts on download links
pub const DOWNLOAD_LINK_CLASS: &str = "download_link_link";

/// One way of finding link candidates in an HTML document
pub trait LinkRule: Send + Sync {
    /// Push every candidate found in `document` onto `out`
    fn collect(&self, document: &Html, out: &mut Vec<String>);

    /// Human-readable name for logging
    fn name(&self) -> String;
}

/// Text content of every `<tag class="...">` element
#[derive(Debug, Clone)]
pub struct ElementTextRule {
    tag: String,
    class: String,
}

impl ElementTextRule {
    /// Match elements named `tag` carrying CSS class `class`
    pub fn new(tag: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            class: class.into(),
        }
    }
}

impl LinkRule for ElementTextRule {
    fn collect(&self, document: &Html, out: &mut Vec<String>) {
        let Some(selector) = class_selector(&self.tag, &self.class, None) else {
            return;
        };
        for element in document.select(&selector) {
            out.push(element.text().collect::<String>());
        }
    }

    fn name(&self) -> String {
        format!("{}.{} text", self.tag, self.class)
    }
}

/// Value of `attr` on every `<tag class="..." attr="...">` element
#[derive(Debug, Clone)]
pub struct ElementAttrRule {
    tag: String,
    class: String,
    attr: String,
}

impl ElementAttrRule {
    /// Match elements named `tag` carrying CSS class `class` and attribute `attr`
    pub fn new(tag: impl Into<String>, class: impl Into<String>, attr: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            class: class.into(),
            attr: attr.into(),
        }
    }
}

impl LinkRule for ElementAttrRule {
    fn collect(&self, document: &Html, out: &mut Vec<String>) {
        let Some(selector) = class_selector(&self.tag, &self.class, Some(&self.attr)) else {
            return;
        };
        for element in document.select(&selector) {
            if let Some(value) = element.value().attr(&self.attr) {
                out.push(value.to_string());
            }
        }
    }

    fn name(&self) -> String {
        format!("{}.{}[{}]", self.tag, self.class, self.attr)
    }
}

fn class_selector(tag: &str, class: &str, attr: Option<&str>) -> Option<Selector> {
    let source = match attr {
        Some(attr) => format!("{tag}.{class}[{attr}]"),
        None => format!("{tag}.{class}"),
    };
    match Selector::parse(&source) {
        Ok(selector) => Some(selector),
        Err(e) => {
            warn!(selector = %source, error = %e, "invalid link selector, rule disabled");
            None
        }
    }
}

/// Finds the HTML body of a message and scrapes it with a set of rules
pub struct LinkExtractor {
    rules: Vec<Box<dyn LinkRule>>,
}

impl Default for LinkExtractor {
    /// Rules for the WeTransfer notification template
    fn default() -> Self {
        Self::new(vec![
            Box::new(ElementTextRule::new("span", DOWNLOAD_LINK_CLASS)),
            Box::new(ElementAttrRule::new("a", DOWNLOAD_LINK_CLASS, "href")),
        ])
    }
}

impl LinkExtractor {
    /// Create an extractor running `rules` in order
    pub fn new(rules: Vec<Box<dyn LinkRule>>) -> Self {
        Self { rules }
    }

    /// Add a rule, e.g. for a new template revision
    pub fn with_rule(mut self, rule: impl LinkRule + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Extract download links from a parsed message
    ///
    /// Never fails: a message without a usable body yields an empty set.
    pub fn extract<M: MailMessage>(&self, message: &M) -> LinkSet {
        let Some(body) = html_body(message) else {
            warn!("Unable to parse message!");
            return LinkSet::new();
        };

        let links = self.extract_from_html(&String::from_utf8_lossy(&body));
        info!(count = links.len(), "Found {} links to download.", links.len());
        links
    }

    /// Run every rule over an HTML document
    pub fn extract_from_html(&self, html: &str) -> LinkSet {
        let document = Html::parse_document(html);
        let mut links = LinkSet::new();
        for rule in &self.rules {
            let mut found = Vec::new();
            rule.collect(&document, &mut found);
            debug!(rule = %rule.name(), candidates = found.len(), "link rule applied");
            links.extend(found);
        }
        links
    }
}

/// Pick the bytes to scan: the first inline `text/html` part of a
/// multi-part message, else the message's own payload
fn html_body<M: MailMessage>(message: &M) -> Option<Vec<u8>> {
    if message.is_multipart() {
        let html_part = message
            .parts()
            .into_iter()
            .find(|part| part.content_type() == "text/html" && !part.is_attachment());
        if let Some(part) = html_part {
            return part.decoded_payload();
        }
    }
    message.decoded_payload()
}
