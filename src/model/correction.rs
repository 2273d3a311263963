//! Correction suggestions against a report's source document
//!
//! A correction cites one or more pages of the source document and carries
//! free-text instructions. Page numbers start at 1.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorrectionError {
    #[error("correction is missing {0}")]
    Incomplete(&'static str),
}

/// Sorted, duplicate-free set of cited page numbers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageSelection(Vec<u32>);

impl PageSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a page. Page 0 and pages already selected are ignored and
    /// return `false`.
    pub fn add_page(&mut self, page: u32) -> bool {
        if page == 0 {
            return false;
        }
        match self.0.binary_search(&page) {
            Ok(_) => false,
            Err(pos) => {
                self.0.insert(pos, page);
                true
            }
        }
    }

    /// Add a page typed by the user. Blank or non-numeric text is ignored.
    pub fn add_page_input(&mut self, input: &str) -> bool {
        input
            .trim()
            .parse::<u32>()
            .map(|page| self.add_page(page))
            .unwrap_or(false)
    }

    pub fn remove_page(&mut self, page: u32) -> bool {
        match self.0.binary_search(&page) {
            Ok(pos) => {
                self.0.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    pub fn pages(&self) -> &[u32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A submitted correction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Correction {
    pub report_id: String,
    pub pages: PageSelection,
    pub notes: String,
    pub submitted_by: String,
    pub timestamp: DateTime<Utc>,
}

/// The "suggest correction" form for one report
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CorrectionDraft {
    report_id: String,
    pub pages: PageSelection,
    notes: String,
}

impl CorrectionDraft {
    pub fn new(report_id: impl Into<String>) -> Self {
        Self {
            report_id: report_id.into(),
            ..Self::default()
        }
    }

    pub fn report_id(&self) -> &str {
        &self.report_id
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.notes = notes.into();
    }

    pub fn can_submit(&self) -> bool {
        !self.pages.is_empty() && !self.notes.trim().is_empty()
    }

    /// Turn the draft into a correction. An incomplete draft is refused.
    pub fn submit(&self, submitted_by: impl Into<String>) -> Result<Correction, CorrectionError> {
        if self.pages.is_empty() {
            return Err(CorrectionError::Incomplete("pages"));
        }
        if self.notes.trim().is_empty() {
            return Err(CorrectionError::Incomplete("notes"));
        }
        Ok(Correction {
            report_id: self.report_id.clone(),
            pages: self.pages.clone(),
            notes: self.notes.trim().to_string(),
            submitted_by: submitted_by.into(),
            timestamp: Utc::now(),
        })
    }
}
