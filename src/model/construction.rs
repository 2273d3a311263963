//! Construction state: the in-progress form behind "create analysis"
//!
//! One `ConstructionState` belongs to exactly one creation session. It is
//! mutated freely by user actions and copied once when generation starts.

use super::analysis::Period;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Reasons a construction state cannot be turned into an analysis
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("analysis name is required")]
    MissingName,

    #[error("reporting period is required")]
    MissingPeriod,

    #[error("description is required")]
    MissingDescription,

    #[error("a data warehouse must be selected")]
    MissingDataWarehouse,

    #[error("at least one internal document is required")]
    NoInternalDocuments,

    #[error("at least one competitor is required")]
    NoCompetitors,

    #[error("competitor '{0}' has no documents attached")]
    CompetitorWithoutDocuments(String),

    #[error("unknown reporting period: {0}")]
    UnknownPeriod(String),

    #[error("unknown data warehouse: {0}")]
    UnknownDataWarehouse(String),
}

/// Source warehouse for internal financial data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataWarehouse {
    Primary,
    Reporting,
    Risk,
}

impl DataWarehouse {
    pub const ALL: [DataWarehouse; 3] = [Self::Primary, Self::Reporting, Self::Risk];

    pub fn id(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Reporting => "reporting",
            Self::Risk => "risk",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Primary => "Primary Data Warehouse",
            Self::Reporting => "Reporting Data Mart",
            Self::Risk => "Risk Data Warehouse",
        }
    }
}

impl FromStr for DataWarehouse {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|w| w.id() == wanted)
            .ok_or_else(|| ValidationError::UnknownDataWarehouse(s.to_string()))
    }
}

/// Opaque reference to an uploaded document (typically its file name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentHandle(String);

impl DocumentHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<&str> for DocumentHandle {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for DocumentHandle {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for DocumentHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named peer bank and the documents filed for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Competitor {
    pub name: String,
    pub documents: Vec<DocumentHandle>,
}

impl Competitor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            documents: Vec::new(),
        }
    }

    pub fn has_documents(&self) -> bool {
        !self.documents.is_empty()
    }
}

/// Form data collected before an analysis is generated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructionState {
    name: String,
    description: String,
    period: Option<Period>,
    data_warehouse: Option<DataWarehouse>,
    internal_documents: Vec<DocumentHandle>,
    competitors: Vec<Competitor>,
}

impl ConstructionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn period(&self) -> Option<Period> {
        self.period
    }

    pub fn data_warehouse(&self) -> Option<DataWarehouse> {
        self.data_warehouse
    }

    pub fn internal_documents(&self) -> &[DocumentHandle] {
        &self.internal_documents
    }

    pub fn competitors(&self) -> &[Competitor] {
        &self.competitors
    }

    pub fn competitor_names(&self) -> Vec<String> {
        self.competitors.iter().map(|c| c.name.clone()).collect()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_period(&mut self, period: Period) {
        self.period = Some(period);
    }

    /// Select a period by its label; out-of-set labels are rejected and
    /// leave the current selection untouched.
    pub fn select_period(&mut self, label: &str) -> Result<Period, ValidationError> {
        let period = label.parse::<Period>()?;
        self.period = Some(period);
        Ok(period)
    }

    pub fn set_data_warehouse(&mut self, warehouse: DataWarehouse) {
        self.data_warehouse = Some(warehouse);
    }

    pub fn select_data_warehouse(&mut self, id: &str) -> Result<DataWarehouse, ValidationError> {
        let warehouse = id.parse::<DataWarehouse>()?;
        self.data_warehouse = Some(warehouse);
        Ok(warehouse)
    }

    /// Attach internal documents, skipping blank handles.
    ///
    /// Returns how many were attached.
    pub fn attach_internal_documents<I, D>(&mut self, documents: I) -> usize
    where
        I: IntoIterator<Item = D>,
        D: Into<DocumentHandle>,
    {
        append_documents(&mut self.internal_documents, documents)
    }

    /// Add a competitor by name.
    ///
    /// Blank names and names already present (case-sensitive) are ignored;
    /// returns whether a competitor was added.
    pub fn add_competitor(&mut self, name: &str) -> bool {
        let name = name.trim();
        if name.is_empty() || self.competitor_index(name).is_some() {
            return false;
        }
        self.competitors.push(Competitor::new(name));
        true
    }

    pub fn remove_competitor(&mut self, index: usize) -> Option<Competitor> {
        if index < self.competitors.len() {
            Some(self.competitors.remove(index))
        } else {
            None
        }
    }

    pub fn competitor_index(&self, name: &str) -> Option<usize> {
        self.competitors.iter().position(|c| c.name == name)
    }

    /// Attach documents to the competitor at `index`, skipping blank handles.
    ///
    /// Returns how many were attached; an unknown index attaches nothing.
    pub fn attach_competitor_documents<I, D>(&mut self, index: usize, documents: I) -> usize
    where
        I: IntoIterator<Item = D>,
        D: Into<DocumentHandle>,
    {
        match self.competitors.get_mut(index) {
            Some(competitor) => append_documents(&mut competitor.documents, documents),
            None => 0,
        }
    }
}

fn append_documents<I, D>(target: &mut Vec<DocumentHandle>, documents: I) -> usize
where
    I: IntoIterator<Item = D>,
    D: Into<DocumentHandle>,
{
    let before = target.len();
    target.extend(
        documents
            .into_iter()
            .map(Into::into)
            .filter(|doc: &DocumentHandle| !doc.is_blank()),
    );
    target.len() - before
}
