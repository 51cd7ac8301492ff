use common::storage::types::training_job::JobResult;

const STUDY_TIPS: [&str; 5] = [
    "Tip: Overfitting? Try dropout or data augmentation.",
    "Tip: Use learning rate scheduling for better convergence.",
    "Tip: For images, consider data normalization and augmentation.",
    "Tip: For text, ensure proper tokenization and padding.",
    "Tip: Monitor loss curve, sudden jumps may indicate unstable training.",
];

/// Plain-language feedback on a finished run.
///
/// The trailing study tip is keyed on the job id so repeated reads of the
/// same result stay identical.
pub fn generate_insights(result: &JobResult) -> Vec<String> {
    let mut insights = Vec::with_capacity(4);

    let accuracy = result.final_accuracy;
    if accuracy > 0.9 {
        insights.push("Excellent accuracy achieved, the model learned effectively.".to_string());
    } else if accuracy > 0.7 {
        insights.push("Good accuracy. Consider more epochs or data augmentation.".to_string());
    } else {
        insights.push("Low accuracy. Try a different model or check data quality.".to_string());
    }

    let loss = result.final_loss;
    if loss < 0.1 {
        insights.push("Low final loss indicates good convergence.".to_string());
    } else if loss < 0.5 {
        insights.push("Moderate loss. Training is stable.".to_string());
    } else {
        insights.push("High loss. Model may need tuning or more training.".to_string());
    }

    if let [first, .., last] = result.metrics_history.as_slice() {
        let trend = last.accuracy - first.accuracy;
        if trend > 0.5 {
            insights.push("Strong improvement in accuracy over epochs.".to_string());
        } else if trend > 0.2 {
            insights.push("Accuracy improved steadily.".to_string());
        } else {
            insights.push(
                "Accuracy improved slowly, consider a higher learning rate.".to_string(),
            );
        }
    }

    insights.push(study_tip(&result.job_id).to_string());
    insights
}

fn study_tip(job_id: &str) -> &'static str {
    let index = job_id
        .bytes()
        .fold(0_usize, |acc, byte| acc.wrapping_add(usize::from(byte)))
        % STUDY_TIPS.len();
    STUDY_TIPS.get(index).copied().unwrap_or_default()
}
