//! Demo collections used by the dashboard before a backend is attached

use super::traits::{CollectionStore, StorageResult};
use crate::model::{
    Analysis, Dashboard, MarketQuestion, Period, QuestionStatus, Report, ResearchResponse,
};
use chrono::{DateTime, NaiveDate, Utc};
use tracing::info;

fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

/// The four demo analyses
pub fn demo_analyses() -> Vec<Analysis> {
    vec![
        Analysis::draft(
            "Q4 2024 Banking Performance Analysis",
            "Comprehensive quarterly analysis of banking sector performance with competitive benchmarking",
            Period::Q4_2024,
        )
        .with_id("analysis-1")
        .with_competitors(["Bank of America", "Wells Fargo", "JPMorgan Chase"])
        .with_created_at(at(2024, 1, 15, 10, 0))
        .into_completed(),
        Analysis::draft(
            "Digital Banking Transformation Study",
            "Analysis of digital banking trends and competitive positioning in the fintech space",
            Period::Q1_2024,
        )
        .with_id("analysis-2")
        .with_competitors(["Citibank", "Goldman Sachs", "Morgan Stanley"])
        .with_created_at(at(2024, 2, 1, 9, 0))
        .in_progress(65),
        Analysis::draft(
            "Risk Management Assessment",
            "Credit risk and operational risk analysis across major banking institutions",
            Period::Q3_2024,
        )
        .with_id("analysis-3")
        .with_competitors(["US Bank", "PNC Bank", "Capital One"])
        .with_created_at(at(2024, 1, 5, 14, 30)),
        Analysis::draft(
            "Market Share Analysis 2024",
            "Regional market share analysis and growth opportunities identification",
            Period::Q4_2024,
        )
        .with_id("analysis-4")
        .with_competitors(["Chase", "Bank of America", "Wells Fargo"])
        .with_created_at(at(2024, 1, 25, 8, 15))
        .into_completed(),
    ]
}

fn question(
    id: &str,
    analysis_name: &str,
    dashboard: Dashboard,
    report: Report,
    text: &str,
    created_at: DateTime<Utc>,
) -> StorageResult<MarketQuestion> {
    Ok(MarketQuestion::new(text, analysis_name, dashboard, report)?
        .with_id(id)
        .with_created_at(created_at))
}

/// The five demo market questions, three of them answered
pub fn demo_questions() -> StorageResult<Vec<MarketQuestion>> {
    let mut q1 = question(
        "question-1",
        "Q4 2024 Banking Performance Analysis",
        Dashboard::IncomeStatement,
        Report::RevenueGrowth,
        "What are the key revenue drivers for our competitors in Q4 2024?",
        at(2024, 1, 16, 11, 0),
    )?;
    q1.add_response(
        ResearchResponse::new(
            "Sarah Johnson",
            "Key revenue drivers include digital banking fees (15% growth), loan origination \
             volumes (8% increase) and wealth management services (12% growth). Investment \
             banking revenues declined 5% due to market volatility.",
        )
        .with_confidence(0.85)
        .with_timestamp(at(2024, 1, 18, 14, 30)),
    );

    let q2 = question(
        "question-2",
        "Digital Banking Transformation Study",
        Dashboard::KpisAndRatios,
        Report::NplRatio,
        "How do competitor credit loss provisions compare to industry benchmarks?",
        at(2024, 2, 2, 10, 15),
    )?;

    let mut q3 = question(
        "question-3",
        "Q4 2024 Banking Performance Analysis",
        Dashboard::Mda,
        Report::StrategicPriorities,
        "What digital banking initiatives are our competitors prioritizing?",
        at(2024, 1, 20, 9, 30),
    )?;
    q3.add_response(
        ResearchResponse::new(
            "Mike Analytics",
            "Major competitors are focusing on AI-powered customer service, mobile-first \
             account opening and cryptocurrency trading platforms.",
        )
        .with_confidence(0.78)
        .with_timestamp(at(2024, 1, 25, 16, 45)),
    );

    let q4 = question(
        "question-4",
        "Risk Management Assessment",
        Dashboard::IncomeStatement,
        Report::ExpenseRatios,
        "How do operational efficiency ratios compare across major banks?",
        at(2024, 1, 8, 15, 20),
    )?
    .with_status(QuestionStatus::InProgress);

    let mut q5 = question(
        "question-5",
        "Market Share Analysis 2024",
        Dashboard::BalanceSheet,
        Report::AssetGrowth,
        "Which regions show the highest growth potential for banking services?",
        at(2024, 1, 26, 13, 10),
    )?;
    q5.add_response(
        ResearchResponse::new(
            "Emma Insights",
            "Southeast and Southwest regions show the strongest growth potential with 15% \
             and 12% projected growth respectively.",
        )
        .with_confidence(0.92)
        .with_timestamp(at(2024, 1, 29, 11, 25)),
    );

    Ok(vec![q1, q2, q3, q4, q5])
}

/// Insert every demo item the store does not already hold.
///
/// Returns how many items were inserted, so reseeding is a no-op.
pub fn seed_store(store: &dyn CollectionStore) -> StorageResult<usize> {
    let mut inserted = 0;
    for analysis in demo_analyses() {
        if store.get_analysis(&analysis.id)?.is_none() {
            store.insert_analysis(&analysis)?;
            inserted += 1;
        }
    }
    for question in demo_questions()? {
        if store.get_market_question(&question.id)?.is_none() {
            store.insert_market_question(&question)?;
            inserted += 1;
        }
    }
    info!(inserted, "demo data seeded");
    Ok(inserted)
}
