use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Content pulled from one page. Exactly one form is produced per fetch:
/// `Structured` when the page yields headed sections, `Flat` otherwise
/// (including the inline error markers a failed fetch degrades to).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageContent {
    Structured {
        /// Text preceding the first heading.
        intro: String,
        /// Free text keyed by heading.
        sections: BTreeMap<String, String>,
        /// Tables as row/cell string matrices.
        tables: Vec<Vec<Vec<String>>>,
    },
    Flat(String),
}

impl PageContent {
    pub fn error(message: impl std::fmt::Display) -> Self {
        PageContent::Flat(format!("Error: {}", message))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, PageContent::Flat(text) if text.starts_with("Error:"))
    }

    /// Section text by (case-insensitive) heading, for structured content.
    pub fn section(&self, heading: &str) -> Option<&str> {
        match self {
            PageContent::Structured { sections, .. } => sections
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(heading))
                .map(|(_, text)| text.as_str()),
            PageContent::Flat(_) => None,
        }
    }
}

/// One scraped page keyed by its URL. Batch results arrive in completion
/// order, so consumers must look content up by URL, never by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub url: String,
    pub content: PageContent,
}
