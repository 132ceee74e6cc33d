use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Number of story concepts offered per batch.
pub const CONCEPT_BATCH_SIZE: usize = 3;

/// A proposed story premise offered to the user for selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    /// Batch-local identifier, assigned by this program (1..=3)
    pub id: u32,
    /// Story title
    pub title: String,
    /// One-line teaser
    pub logline: String,
    /// Full plot summary
    pub synopsis: String,
    /// Cast names, none shared with the reference story
    pub characters: Vec<String>,
    /// Mood of the piece (e.g. warm, mystery, comic)
    pub tone: String,
}

/// The long-form narration generated for a selected concept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedScript {
    /// Concept this script was written for
    pub concept_id: u32,
    /// Full narration text
    pub content: String,
    /// Creation instant, unix milliseconds
    pub timestamp: i64,
}

impl GeneratedScript {
    pub fn new(concept_id: u32, content: String) -> Self {
        Self {
            concept_id,
            content,
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// Life cycle of one generation flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

/// Re-number ids sequentially from 1 and cap the batch at
/// [`CONCEPT_BATCH_SIZE`], whatever the model chose to return. Under-filled
/// batches are kept as-is.
pub fn renumber_batch(batch: Vec<Concept>) -> Vec<Concept> {
    batch
        .into_iter()
        .take(CONCEPT_BATCH_SIZE)
        .enumerate()
        .map(|(i, mut concept)| {
            concept.id = i as u32 + 1;
            concept
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub(id: u32) -> Concept {
        Concept {
            id,
            title: format!("Title {id}"),
            logline: "A one-line teaser".to_string(),
            synopsis: "A full summary".to_string(),
            characters: vec!["Mara".to_string(), "Elin".to_string()],
            tone: "warm".to_string(),
        }
    }

    #[test]
    fn renumber_truncates_oversized_batch() {
        let batch = (0..5).map(|i| stub(i + 40)).collect();
        let batch = renumber_batch(batch);
        assert_eq!(batch.len(), CONCEPT_BATCH_SIZE);
        let ids: Vec<u32> = batch.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn renumber_keeps_underfilled_batch() {
        let batch = renumber_batch(vec![stub(7), stub(7)]);
        assert_eq!(batch.len(), 2);
        let ids: Vec<u32> = batch.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn renumber_preserves_order_and_content() {
        let batch = renumber_batch(vec![stub(9), stub(3)]);
        assert_eq!(batch[0].title, "Title 9");
        assert_eq!(batch[1].title, "Title 3");
    }
}
