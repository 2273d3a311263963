//! Market research questions and the dashboard/report taxonomy

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Violations of the closed dashboard → report taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaxonomyError {
    #[error("unknown dashboard: {0}")]
    UnknownDashboard(String),

    #[error("unknown report: {0}")]
    UnknownReport(String),

    #[error("report '{report}' does not belong to dashboard '{dashboard}'")]
    ReportNotInDashboard { dashboard: Dashboard, report: Report },

    #[error("select a dashboard before choosing a report")]
    NoDashboardSelected,
}

/// Errors from submitting a question draft
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuestionError {
    #[error("question is incomplete: {0} is required")]
    Incomplete(&'static str),

    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
}

/// Top-level dashboard a question is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dashboard {
    IncomeStatement,
    BalanceSheet,
    CashFlow,
    KpisAndRatios,
    Mda,
}

impl Dashboard {
    pub const ALL: [Dashboard; 5] = [
        Self::IncomeStatement,
        Self::BalanceSheet,
        Self::CashFlow,
        Self::KpisAndRatios,
        Self::Mda,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::IncomeStatement => "Income Statement",
            Self::BalanceSheet => "Balance Sheet",
            Self::CashFlow => "Cash Flow",
            Self::KpisAndRatios => "KPIs & Ratios",
            Self::Mda => "MD&A",
        }
    }

    /// The reports a question under this dashboard may target
    pub fn reports(self) -> &'static [Report] {
        use Report::*;
        match self {
            Self::IncomeStatement => &[
                RevenueGrowth,
                ExpenseRatios,
                NetInterestMargin,
                ProfitabilityRatios,
            ],
            Self::BalanceSheet => &[
                AssetGrowth,
                LiabilityStructure,
                CapitalRatios,
                LoanToDepositRatio,
            ],
            Self::CashFlow => &[OperatingCashFlow, InvestmentCashFlow, FinancingCashFlow],
            Self::KpisAndRatios => &[
                NplRatio,
                CustomerAcquisitionCost,
                LiquidityCoverageRatio,
                CustomerGrowth,
            ],
            Self::Mda => &[StrategicPriorities, RiskFactors, BankOutlook, LegalIssues],
        }
    }

    pub fn contains(self, report: Report) -> bool {
        self.reports().contains(&report)
    }

    /// Check that `report` is filed under this dashboard
    pub fn validate(self, report: Report) -> Result<(), TaxonomyError> {
        if self.contains(report) {
            Ok(())
        } else {
            Err(TaxonomyError::ReportNotInDashboard {
                dashboard: self,
                report,
            })
        }
    }
}

impl std::fmt::Display for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Dashboard {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.label() == wanted)
            .ok_or_else(|| TaxonomyError::UnknownDashboard(s.to_string()))
    }
}

impl TryFrom<String> for Dashboard {
    type Error = TaxonomyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dashboard> for String {
    fn from(dashboard: Dashboard) -> Self {
        dashboard.label().to_string()
    }
}

/// A report within a dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Report {
    RevenueGrowth,
    ExpenseRatios,
    NetInterestMargin,
    ProfitabilityRatios,
    AssetGrowth,
    LiabilityStructure,
    CapitalRatios,
    LoanToDepositRatio,
    OperatingCashFlow,
    InvestmentCashFlow,
    FinancingCashFlow,
    NplRatio,
    CustomerAcquisitionCost,
    LiquidityCoverageRatio,
    CustomerGrowth,
    StrategicPriorities,
    RiskFactors,
    BankOutlook,
    LegalIssues,
}

impl Report {
    pub fn label(self) -> &'static str {
        match self {
            Self::RevenueGrowth => "Revenue Growth",
            Self::ExpenseRatios => "Expense Ratios",
            Self::NetInterestMargin => "Net Interest Margin",
            Self::ProfitabilityRatios => "Profitability Ratios",
            Self::AssetGrowth => "Asset Growth",
            Self::LiabilityStructure => "Liability Structure",
            Self::CapitalRatios => "Capital Ratios",
            Self::LoanToDepositRatio => "Loan-to-Deposit Ratio",
            Self::OperatingCashFlow => "Operating Cash Flow",
            Self::InvestmentCashFlow => "Investment Cash Flow",
            Self::FinancingCashFlow => "Financing Cash Flow",
            Self::NplRatio => "NPL Ratio",
            Self::CustomerAcquisitionCost => "Customer Acquisition Cost",
            Self::LiquidityCoverageRatio => "Liquidity Coverage Ratio",
            Self::CustomerGrowth => "Customer Growth",
            Self::StrategicPriorities => "Strategic Priorities",
            Self::RiskFactors => "Risk Factors",
            Self::BankOutlook => "Bank Outlook",
            Self::LegalIssues => "Legal Issues",
        }
    }

    /// The dashboard this report is filed under
    pub fn dashboard(self) -> Dashboard {
        match self {
            Self::RevenueGrowth
            | Self::ExpenseRatios
            | Self::NetInterestMargin
            | Self::ProfitabilityRatios => Dashboard::IncomeStatement,
            Self::AssetGrowth
            | Self::LiabilityStructure
            | Self::CapitalRatios
            | Self::LoanToDepositRatio => Dashboard::BalanceSheet,
            Self::OperatingCashFlow | Self::InvestmentCashFlow | Self::FinancingCashFlow => {
                Dashboard::CashFlow
            }
            Self::NplRatio
            | Self::CustomerAcquisitionCost
            | Self::LiquidityCoverageRatio
            | Self::CustomerGrowth => Dashboard::KpisAndRatios,
            Self::StrategicPriorities | Self::RiskFactors | Self::BankOutlook | Self::LegalIssues => {
                Dashboard::Mda
            }
        }
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Report {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Dashboard::ALL
            .iter()
            .flat_map(|d| d.reports().iter().copied())
            .find(|r| r.label() == wanted)
            .ok_or_else(|| TaxonomyError::UnknownReport(s.to_string()))
    }
}

impl TryFrom<String> for Report {
    type Error = TaxonomyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Report> for String {
    fn from(report: Report) -> Self {
        report.label().to_string()
    }
}

/// Unique identifier for a market question
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(String);

impl QuestionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for QuestionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QuestionStatus {
    Draft,
    Pending,
    InProgress,
    Answered,
}

impl QuestionStatus {
    pub const ALL: [QuestionStatus; 4] =
        [Self::Draft, Self::Pending, Self::InProgress, Self::Answered];

    /// Position in the status sort order: open questions first, drafts last.
    pub fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::InProgress => 1,
            Self::Answered => 2,
            Self::Draft => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Answered => "answered",
        }
    }
}

impl std::fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown question status: {}", s))
    }
}

/// An analyst's answer to a market question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResearchResponse {
    pub analyst: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    /// Analyst's confidence in [0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ResearchResponse {
    pub fn new(analyst: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            analyst: analyst.into(),
            text: text.into(),
            timestamp: Utc::now(),
            attachments: Vec::new(),
            confidence: None,
        }
    }

    pub fn with_attachment(mut self, attachment: impl Into<String>) -> Self {
        self.attachments.push(attachment.into());
        self
    }

    /// Set the confidence score, clamped to [0, 1]. A non-finite score is
    /// treated as no score.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence
            .is_finite()
            .then(|| confidence.clamp(0.0, 1.0));
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// A free-text research question tied to a dashboard report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuestion {
    pub id: QuestionId,
    pub question: String,
    pub analysis_name: String,
    pub dashboard: Dashboard,
    pub report: Report,
    pub status: QuestionStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub responses: Vec<ResearchResponse>,
}

impl MarketQuestion {
    /// Create a pending question, rejecting reports outside the dashboard
    pub fn new(
        question: impl Into<String>,
        analysis_name: impl Into<String>,
        dashboard: Dashboard,
        report: Report,
    ) -> Result<Self, TaxonomyError> {
        dashboard.validate(report)?;
        Ok(Self {
            id: QuestionId::new(),
            question: question.into(),
            analysis_name: analysis_name.into(),
            dashboard,
            report,
            status: QuestionStatus::Pending,
            created_at: Utc::now(),
            responses: Vec::new(),
        })
    }

    pub fn with_id(mut self, id: impl Into<QuestionId>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_status(mut self, status: QuestionStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn check_taxonomy(&self) -> Result<(), TaxonomyError> {
        self.dashboard.validate(self.report)
    }

    /// Record an analyst response; the question becomes answered.
    pub fn add_response(&mut self, response: ResearchResponse) {
        self.responses.push(response);
        self.status = QuestionStatus::Answered;
    }
}

/// The "ask a question" form
///
/// Tracks the dashboard/report pair so a report can only ever be chosen
/// from the currently selected dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionDraft {
    question: String,
    analysis_name: String,
    dashboard: Option<Dashboard>,
    report: Option<Report>,
}

impl QuestionDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn analysis_name(&self) -> &str {
        &self.analysis_name
    }

    pub fn dashboard(&self) -> Option<Dashboard> {
        self.dashboard
    }

    pub fn report(&self) -> Option<Report> {
        self.report
    }

    pub fn set_question(&mut self, question: impl Into<String>) {
        self.question = question.into();
    }

    pub fn set_analysis(&mut self, analysis_name: impl Into<String>) {
        self.analysis_name = analysis_name.into();
    }

    /// Select a dashboard. Any previously chosen report is cleared.
    pub fn select_dashboard(&mut self, dashboard: Dashboard) {
        self.dashboard = Some(dashboard);
        self.report = None;
    }

    pub fn select_dashboard_label(&mut self, label: &str) -> Result<Dashboard, TaxonomyError> {
        let dashboard = label.parse::<Dashboard>()?;
        self.select_dashboard(dashboard);
        Ok(dashboard)
    }

    /// Select a report from the current dashboard.
    ///
    /// A report outside the dashboard is rejected and the previous
    /// selection is kept.
    pub fn select_report(&mut self, report: Report) -> Result<(), TaxonomyError> {
        let dashboard = self.dashboard.ok_or(TaxonomyError::NoDashboardSelected)?;
        dashboard.validate(report)?;
        self.report = Some(report);
        Ok(())
    }

    pub fn select_report_label(&mut self, label: &str) -> Result<Report, TaxonomyError> {
        let report = label.parse::<Report>()?;
        self.select_report(report)?;
        Ok(report)
    }

    /// Reports offered for the current dashboard (none until one is chosen)
    pub fn available_reports(&self) -> &'static [Report] {
        self.dashboard.map(Dashboard::reports).unwrap_or(&[])
    }

    pub fn can_submit(&self) -> bool {
        self.missing_field().is_none()
    }

    fn missing_field(&self) -> Option<&'static str> {
        if self.question.trim().is_empty() {
            Some("question")
        } else if self.analysis_name.trim().is_empty() {
            Some("analysis")
        } else if self.dashboard.is_none() {
            Some("dashboard")
        } else if self.report.is_none() {
            Some("report")
        } else {
            None
        }
    }

    /// Turn the draft into a pending question and reset the form.
    ///
    /// An incomplete draft is left untouched.
    pub fn submit(&mut self) -> Result<MarketQuestion, QuestionError> {
        if let Some(field) = self.missing_field() {
            return Err(QuestionError::Incomplete(field));
        }
        let (Some(dashboard), Some(report)) = (self.dashboard, self.report) else {
            return Err(QuestionError::Incomplete("report"));
        };
        let question = MarketQuestion::new(
            self.question.trim(),
            self.analysis_name.trim(),
            dashboard,
            report,
        )?;
        *self = Self::default();
        Ok(question)
    }
}
