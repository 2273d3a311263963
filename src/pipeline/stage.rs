//! The fixed, ordered generation stages

use serde::Serialize;

/// One named unit of work in the generation pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    DocumentProcessing,
    IncomeStatement,
    BalanceSheet,
    CashFlow,
    Kpis,
    Mda,
    ReportGeneration,
}

impl Stage {
    /// Every stage in execution order
    pub const ALL: [Stage; 7] = [
        Self::DocumentProcessing,
        Self::IncomeStatement,
        Self::BalanceSheet,
        Self::CashFlow,
        Self::Kpis,
        Self::Mda,
        Self::ReportGeneration,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// The stage at `index`, if within the pipeline
    pub fn at(index: usize) -> Option<Stage> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        match self {
            Self::DocumentProcessing => 0,
            Self::IncomeStatement => 1,
            Self::BalanceSheet => 2,
            Self::CashFlow => 3,
            Self::Kpis => 4,
            Self::Mda => 5,
            Self::ReportGeneration => 6,
        }
    }

    /// Name of the agent shown while this stage runs
    pub fn agent_name(self) -> &'static str {
        match self {
            Self::DocumentProcessing => "Document Processing Agent",
            Self::IncomeStatement => "Income Statement Agent",
            Self::BalanceSheet => "Balance Sheet Agent",
            Self::CashFlow => "Cash Flow Agent",
            Self::Kpis => "KPIs Agent",
            Self::Mda => "MD&A Agent",
            Self::ReportGeneration => "Report Generation Agent",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.agent_name())
    }
}

/// Percent complete once `completed` stages have finished, rounded half up.
pub fn progress_after(completed: usize) -> u8 {
    let completed = completed.min(Stage::COUNT);
    ((completed * 100 + Stage::COUNT / 2) / Stage::COUNT) as u8
}
