use anyhow::{Context, Result};
use scraper::{Html, Selector};

use crate::config::SelectorConfig;

/// Raw per-selector text pulled from one product page. Every field defaults
/// to the empty string when its selector matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    pub title: String,
    pub unavailable_text: String,
    pub description: String,
    pub availability: String,
}

impl ExtractedPage {
    pub fn is_unavailable(&self) -> bool {
        !self.unavailable_text.is_empty()
    }
}

/// Selector-driven extractor for product pages. Selectors are compiled once
/// at construction; extraction itself is pure and synchronous.
pub struct PageExtractor {
    title: Selector,
    unavailable: Selector,
    description: Selector,
    availability: Selector,
}

impl PageExtractor {
    pub fn new(config: &SelectorConfig) -> Result<Self> {
        Ok(PageExtractor {
            title: parse_selector(&config.title)?,
            unavailable: parse_selector(&config.unavailable)?,
            description: parse_selector(&config.description)?,
            availability: parse_selector(&config.availability)?,
        })
    }

    /// Pull the configured fields out of one fetched document.
    pub fn extract(&self, html: &str) -> ExtractedPage {
        let document = Html::parse_document(html);

        ExtractedPage {
            title: first_text(&document, &self.title),
            unavailable_text: first_text(&document, &self.unavailable),
            description: first_text(&document, &self.description),
            availability: first_text(&document, &self.availability),
        }
    }
}

fn parse_selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("invalid CSS selector: {}", raw))
}

/// Normalized text of the first matching element, empty string when absent.
fn first_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .next()
        .map(|element| {
            element
                .text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}
