use crate::consensus::stats::round_to;
use crate::model::{PayloadFeatures, TaskPayload};

/// Word and sentence statistics for the textual part of a payload.
///
/// Returns `None` when the payload carries no text or transcript.
pub fn extract_features(payload: &TaskPayload) -> Option<PayloadFeatures> {
    let text = payload.textual_content()?.trim();
    if text.is_empty() {
        return None;
    }

    let word_count = text.split_whitespace().count();
    let sentence_count = text
        .split(['.', '!', '?'])
        .filter(|segment| !segment.trim().is_empty())
        .count()
        .max(1);
    let avg_words_per_sentence = word_count as f64 / sentence_count as f64;
    let readability = (100.0 - 2.0 * avg_words_per_sentence).clamp(0.0, 100.0);

    Some(PayloadFeatures {
        word_count,
        sentence_count,
        avg_words_per_sentence: round_to(avg_words_per_sentence, 2),
        readability: round_to(readability, 2),
    })
}
