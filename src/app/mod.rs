use crate::api::StoryModel;
use crate::concept::{renumber_batch, Concept, GeneratedScript, GenerationStatus};
use crate::error::{Result, StoryError};
use std::collections::HashMap;
use tracing::{info, warn};

/// Cue for the presentation layer after a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiSignal {
    ScrollToConcepts,
    ScrollToScript,
}

/// Everything the presentation layer renders from.
#[derive(Debug, Default)]
pub struct FlowState {
    pub reference_text: String,
    pub concepts: Vec<Concept>,
    pub scripts: HashMap<u32, GeneratedScript>,
    pub concept_status: GenerationStatus,
    pub script_status: GenerationStatus,
    pub selected_concept: Option<u32>,
}

/// Owns the two generation flows and the concept selection. All mutation
/// goes through `&mut self`, so a second request cannot start while one is
/// still in flight.
pub struct StoryFlow<M> {
    model: M,
    state: FlowState,
}

impl<M: StoryModel> StoryFlow<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            state: FlowState::default(),
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn set_reference_text(&mut self, text: impl Into<String>) {
        self.state.reference_text = text.into();
    }

    /// Concept and script for the current selection, once both exist.
    pub fn selected_script(&self) -> Option<(&Concept, &GeneratedScript)> {
        let id = self.state.selected_concept?;
        let concept = self.state.concepts.iter().find(|c| c.id == id)?;
        let script = self.state.scripts.get(&id)?;
        Some((concept, script))
    }

    /// Generate a fresh concept batch from the reference text. Any previous
    /// batch, its scripts, and the selection are cleared before the request
    /// goes out.
    pub async fn start_concept_generation(&mut self) -> Result<UiSignal> {
        if self.state.reference_text.trim().is_empty() {
            return Err(StoryError::Validation(
                "Please enter a reference story first".to_string(),
            ));
        }

        self.state.concept_status = GenerationStatus::Loading;
        self.state.concepts.clear();
        self.state.scripts.clear();
        self.state.selected_concept = None;

        match self.model.request_concepts(&self.state.reference_text).await {
            Ok(batch) => {
                self.state.concepts = renumber_batch(batch);
                self.state.concept_status = GenerationStatus::Success;
                Ok(UiSignal::ScrollToConcepts)
            }
            Err(e) => {
                warn!("Concept generation failed: {}", e);
                self.state.concept_status = GenerationStatus::Error;
                Err(e)
            }
        }
    }

    /// Select a concept from the current batch, generating its script on
    /// first selection and replaying the cached one afterwards.
    pub async fn select_concept(&mut self, concept_id: u32) -> Result<UiSignal> {
        let concept = self
            .state
            .concepts
            .iter()
            .find(|c| c.id == concept_id)
            .cloned()
            .ok_or_else(|| {
                StoryError::Validation(format!("No concept with id {}", concept_id))
            })?;

        self.state.selected_concept = Some(concept_id);

        if self.state.scripts.contains_key(&concept_id) {
            info!(
                "Script for concept {} already generated, showing cached copy",
                concept_id
            );
            return Ok(UiSignal::ScrollToScript);
        }

        self.state.script_status = GenerationStatus::Loading;

        match self.model.request_script(&concept).await {
            Ok(content) => {
                self.state
                    .scripts
                    .insert(concept_id, GeneratedScript::new(concept_id, content));
                self.state.script_status = GenerationStatus::Success;
                Ok(UiSignal::ScrollToScript)
            }
            Err(e) => {
                warn!("Script generation failed: {}", e);
                self.state.script_status = GenerationStatus::Error;
                Err(e)
            }
        }
    }
}
