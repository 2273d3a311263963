//! Research metrics over the market questions collection

use super::collate::locale_cmp;
use crate::model::{MarketQuestion, QuestionStatus};
use serde::Serialize;

/// Response activity of one analyst
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalystStats {
    pub name: String,
    pub responses: usize,
    /// Mean confidence over the responses that carry a score
    pub avg_confidence: Option<f64>,
}

/// Question counts by status and per-analyst response activity
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResearchMetrics {
    pub total_questions: usize,
    pub draft: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub answered: usize,
    /// Most responses first; ties alphabetical by name
    pub top_analysts: Vec<AnalystStats>,
}

impl ResearchMetrics {
    pub fn from_questions(questions: &[MarketQuestion]) -> Self {
        let mut metrics = Self {
            total_questions: questions.len(),
            ..Self::default()
        };
        // (name, responses, confidence sum, scored responses)
        let mut analysts: Vec<(String, usize, f64, usize)> = Vec::new();

        for question in questions {
            match question.status {
                QuestionStatus::Draft => metrics.draft += 1,
                QuestionStatus::Pending => metrics.pending += 1,
                QuestionStatus::InProgress => metrics.in_progress += 1,
                QuestionStatus::Answered => metrics.answered += 1,
            }
            for response in &question.responses {
                let pos = match analysts.iter().position(|a| a.0 == response.analyst) {
                    Some(pos) => pos,
                    None => {
                        analysts.push((response.analyst.clone(), 0, 0.0, 0));
                        analysts.len() - 1
                    }
                };
                let entry = &mut analysts[pos];
                entry.1 += 1;
                if let Some(score) = response.confidence {
                    entry.2 += score;
                    entry.3 += 1;
                }
            }
        }

        metrics.top_analysts = analysts
            .into_iter()
            .map(|(name, responses, sum, scored)| AnalystStats {
                name,
                responses,
                avg_confidence: (scored > 0).then(|| sum / scored as f64),
            })
            .collect();
        metrics.top_analysts.sort_by(|a, b| {
            b.responses
                .cmp(&a.responses)
                .then_with(|| locale_cmp(&a.name, &b.name))
        });
        metrics
    }

    pub fn count(&self, status: QuestionStatus) -> usize {
        match status {
            QuestionStatus::Draft => self.draft,
            QuestionStatus::Pending => self.pending,
            QuestionStatus::InProgress => self.in_progress,
            QuestionStatus::Answered => self.answered,
        }
    }
}
