use serde::Serialize;
use uuid::Uuid;

use crate::assessment::rules::{evaluate, Band, Evaluation};
use crate::core::shared::utils::{format_percentage, round2};
use crate::exercises::types::ResultDetail;
use crate::progress::estimate::EstimatedScore;
use crate::progress::types::{estimate_from_results, mean, type_averages, ResultFact};

#[derive(Debug, Clone, Serialize)]
pub struct ResultAssessment {
    pub result_id: Uuid,
    pub lesson_id: Uuid,
    pub lesson_title: String,
    pub lesson_type: String,
    pub percentage: f64,
    pub percentage_text: String,
    pub ratio_text: String,
    #[serde(flatten)]
    pub evaluation: Evaluation,
    pub wrong_question_ids: Vec<Uuid>,
}

impl From<ResultDetail> for ResultAssessment {
    fn from(detail: ResultDetail) -> Self {
        let summary = detail.summary;
        let wrong_question_ids = detail
            .answers
            .iter()
            .filter(|a| !a.is_correct)
            .map(|a| a.question_id)
            .collect();

        Self {
            result_id: summary.result.id,
            lesson_id: summary.result.lesson_id,
            evaluation: evaluate(&summary.lesson_type, summary.result.percentage),
            percentage: summary.result.percentage,
            percentage_text: summary.percentage_text,
            ratio_text: summary.ratio_text,
            lesson_title: summary.lesson_title,
            lesson_type: summary.lesson_type,
            wrong_question_ids,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TypeAssessment {
    pub lesson_type: String,
    pub attempts: i64,
    pub average_percentage: f64,
    pub average_percentage_text: String,
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

#[derive(Debug, Clone, Serialize)]
pub struct OverallAssessment {
    pub total_attempts: i64,
    pub average_percentage: f64,
    pub band: Option<Band>,
    pub comment: Option<&'static str>,
    pub by_type: Vec<TypeAssessment>,
    pub strongest_type: Option<String>,
    pub weakest_type: Option<String>,
    pub estimated_score: EstimatedScore,
}

pub fn build_overall(results: &[ResultFact]) -> OverallAssessment {
    let percentages: Vec<f64> = results.iter().map(|r| r.percentage).collect();
    let average = mean(&percentages).map(round2);
    let band = average.map(Band::from_percentage);

    let by_type: Vec<TypeAssessment> = type_averages(results)
        .into_iter()
        .map(|avg| TypeAssessment {
            evaluation: evaluate(&avg.lesson_type, avg.average_percentage),
            average_percentage_text: format_percentage(avg.average_percentage),
            lesson_type: avg.lesson_type,
            attempts: avg.attempts,
            average_percentage: avg.average_percentage,
        })
        .collect();

    let by_score = |a: &&TypeAssessment, b: &&TypeAssessment| {
        a.average_percentage.total_cmp(&b.average_percentage)
    };
    let strongest_type = by_type.iter().max_by(by_score).map(|t| t.lesson_type.clone());
    let weakest_type = if by_type.len() > 1 {
        by_type.iter().min_by(by_score).map(|t| t.lesson_type.clone())
    } else {
        None
    };

    OverallAssessment {
        total_attempts: results.len() as i64,
        average_percentage: average.unwrap_or(0.0),
        band,
        comment: band.map(|b| b.comment()),
        estimated_score: estimate_from_results(results),
        strongest_type,
        weakest_type,
        by_type,
    }
}
