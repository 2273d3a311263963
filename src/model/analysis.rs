//! Analysis: a persisted comparative study for one reporting period

use super::construction::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for an analysis
///
/// Serializes as a plain string. Fresh ids are UUID-based; seeded and
/// imported analyses may carry semantic ids like "analysis-1".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisId(String);

impl AnalysisId {
    /// Create a new random AnalysisId
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create an AnalysisId from a string
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AnalysisId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle status of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnalysisStatus {
    Draft,
    InProgress,
    Completed,
}

impl AnalysisStatus {
    pub const ALL: [AnalysisStatus; 3] = [Self::Draft, Self::InProgress, Self::Completed];

    /// Position in the status sort order: completed first, drafts last.
    pub fn rank(self) -> u8 {
        match self {
            Self::Completed => 0,
            Self::InProgress => 1,
            Self::Draft => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown analysis status: {}", s))
    }
}

/// Fiscal quarter an analysis reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
#[allow(non_camel_case_types)]
pub enum Period {
    Q1_2024,
    Q2_2024,
    Q3_2024,
    Q4_2024,
    Q1_2025,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Self::Q1_2024,
        Self::Q2_2024,
        Self::Q3_2024,
        Self::Q4_2024,
        Self::Q1_2025,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Q1_2024 => "Q1 2024",
            Self::Q2_2024 => "Q2 2024",
            Self::Q3_2024 => "Q3 2024",
            Self::Q4_2024 => "Q4 2024",
            Self::Q1_2025 => "Q1 2025",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.label() == wanted)
            .ok_or_else(|| ValidationError::UnknownPeriod(s.to_string()))
    }
}

impl TryFrom<String> for Period {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(period: Period) -> Self {
        period.label().to_string()
    }
}

/// A comparative financial study against named competitors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub id: AnalysisId,
    pub name: String,
    pub description: String,
    pub period: Period,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
    /// Competitor names in the order they were added
    pub competitors: Vec<String>,
    /// Percent complete, only meaningful while in progress
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
}

impl Analysis {
    /// Create a draft analysis stamped with the current time
    pub fn draft(
        name: impl Into<String>,
        description: impl Into<String>,
        period: Period,
    ) -> Self {
        Self {
            id: AnalysisId::new(),
            name: name.into(),
            description: description.into(),
            period,
            status: AnalysisStatus::Draft,
            created_at: Utc::now(),
            competitors: Vec::new(),
            progress: None,
        }
    }

    /// A finished analysis as produced by the generation pipeline.
    pub fn completed(
        name: impl Into<String>,
        description: impl Into<String>,
        period: Period,
        competitors: Vec<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AnalysisId::new(),
            name: name.into(),
            description: description.into(),
            period,
            status: AnalysisStatus::Completed,
            created_at,
            competitors,
            progress: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<AnalysisId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_competitors<I, S>(mut self, competitors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.competitors = competitors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    /// Move to in-progress at the given percentage (clamped to 100)
    pub fn in_progress(mut self, progress: u8) -> Self {
        self.status = AnalysisStatus::InProgress;
        self.progress = Some(progress.min(100));
        self
    }

    /// Mark as completed; progress no longer applies
    pub fn into_completed(mut self) -> Self {
        self.status = AnalysisStatus::Completed;
        self.progress = None;
        self
    }

    /// Check the structural invariants an analysis must hold before it
    /// enters a collection.
    pub fn check_invariants(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err(format!("analysis {} has an empty name", self.id));
        }
        if self.description.trim().is_empty() {
            return Err(format!("analysis {} has an empty description", self.id));
        }
        match (self.status, self.progress) {
            (_, Some(p)) if p > 100 => {
                Err(format!("analysis {} has progress {} above 100", self.id, p))
            }
            (AnalysisStatus::Completed, Some(p)) if p != 100 => Err(format!(
                "completed analysis {} reports progress {}",
                self.id, p
            )),
            (AnalysisStatus::Completed, _) if self.competitors.is_empty() => Err(format!(
                "completed analysis {} names no competitors",
                self.id
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_rank_order() {
        assert!(AnalysisStatus::Completed.rank() < AnalysisStatus::InProgress.rank());
        assert!(AnalysisStatus::InProgress.rank() < AnalysisStatus::Draft.rank());
    }

    #[test]
    fn test_status_serializes_kebab_case() {
        let json = serde_json::to_string(&AnalysisStatus::InProgress).unwrap();
        assert_eq!(json, "\"in-progress\"");
        assert_eq!("in-progress".parse::<AnalysisStatus>(), Ok(AnalysisStatus::InProgress));
        assert!("failed".parse::<AnalysisStatus>().is_err());
    }

    #[test]
    fn test_period_parses_known_labels() {
        assert_eq!("Q3 2024".parse::<Period>().unwrap(), Period::Q3_2024);
        assert_eq!(" Q1 2025 ".parse::<Period>().unwrap(), Period::Q1_2025);
    }

    #[test]
    fn test_period_rejects_out_of_set_value() {
        let err = "Full Year 2024".parse::<Period>().unwrap_err();
        assert_eq!(err, ValidationError::UnknownPeriod("Full Year 2024".into()));
    }

    #[test]
    fn test_period_serializes_as_label() {
        let json = serde_json::to_string(&Period::Q4_2024).unwrap();
        assert_eq!(json, "\"Q4 2024\"");
        let back: Period = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Period::Q4_2024);
        assert!(serde_json::from_str::<Period>("\"Q2 2023\"").is_err());
    }

    #[test]
    fn test_completed_analysis_holds_invariants() {
        let analysis = Analysis::completed(
            "Q1 Review",
            "Peer review",
            Period::Q1_2024,
            vec!["Wells Fargo".into()],
            Utc::now(),
        );
        assert_eq!(analysis.status, AnalysisStatus::Completed);
        assert!(analysis.progress.is_none());
        assert!(analysis.check_invariants().is_ok());
    }

    #[test]
    fn test_completed_with_partial_progress_is_rejected() {
        let mut analysis =
            Analysis::draft("A", "B", Period::Q1_2024).with_competitors(["Truist"]);
        analysis.status = AnalysisStatus::Completed;
        analysis.progress = Some(40);
        assert!(analysis.check_invariants().is_err());

        analysis.progress = Some(100);
        assert!(analysis.check_invariants().is_ok());
    }

    #[test]
    fn test_completed_without_competitors_is_rejected() {
        let analysis = Analysis::completed("A", "B", Period::Q1_2024, vec![], Utc::now());
        let err = analysis.check_invariants().unwrap_err();
        assert!(err.contains("no competitors"));

        // drafts may still be empty
        assert!(Analysis::draft("A", "B", Period::Q1_2024).check_invariants().is_ok());
    }

    #[test]
    fn test_in_progress_clamps_percentage() {
        let analysis = Analysis::draft("A", "B", Period::Q2_2024).in_progress(180);
        assert_eq!(analysis.status, AnalysisStatus::InProgress);
        assert_eq!(analysis.progress, Some(100));
    }

    #[test]
    fn test_analysis_id_serializes_transparently() {
        let id = AnalysisId::from_string("analysis-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"analysis-1\"");
    }
}
