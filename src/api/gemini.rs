use crate::api::StoryModel;
use crate::concept::{renumber_batch, Concept, CONCEPT_BATCH_SIZE};
use crate::error::{Result, StoryError};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tracing::{debug, info};

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Upper bound on generated narration size. Very long scripts may be cut off
/// here by the service.
const SCRIPT_MAX_OUTPUT_TOKENS: u32 = 8192;

const CONCEPT_SYSTEM_PROMPT: &str =
    "You are a warm, empathetic, and creative drama writer specialized in stories for senior women.";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default, rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(default, rename = "totalTokenCount")]
    total_token_count: Option<u32>,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self::with_model(api_key, DEFAULT_MODEL.to_string())
    }

    pub fn with_model(api_key: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key,
            model,
            client,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            GEMINI_API_BASE, self.model
        )
    }

    /// One request/response round trip against the generateContent endpoint.
    async fn generate(&self, body: Value) -> Result<String> {
        let started = Instant::now();

        let response = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .header("X-Goog-Api-Key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(StoryError::Service(format!(
                "Gemini API error: {}",
                error_text
            )));
        }

        let parsed: GenerateContentResponse = response.json().await?;

        if let Some(usage) = &parsed.usage_metadata {
            if let Some(total) = usage.total_token_count {
                debug!("Generation used {} tokens in {:?}", total, started.elapsed());
            }
        }

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(StoryError::EmptyResponse);
        }

        Ok(text)
    }
}

#[async_trait::async_trait]
impl StoryModel for GeminiClient {
    async fn request_concepts(&self, reference_text: &str) -> Result<Vec<Concept>> {
        info!("Requesting story concepts from Gemini...");

        let request_body = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": concept_prompt(reference_text) }]
                }
            ],
            "systemInstruction": {
                "role": "system",
                "parts": [{ "text": CONCEPT_SYSTEM_PROMPT }]
            },
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": concept_schema()
            }
        });

        let text = self.generate(request_body).await?;
        let concepts = parse_concepts(&text)?;

        info!("Received {} story concepts", concepts.len());
        Ok(concepts)
    }

    async fn request_script(&self, concept: &Concept) -> Result<String> {
        info!(
            "Requesting full script for concept {} ({})",
            concept.id, concept.title
        );

        let request_body = json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": script_prompt(concept) }]
                }
            ],
            "generationConfig": {
                "maxOutputTokens": SCRIPT_MAX_OUTPUT_TOKENS
            }
        });

        let content = self.generate(request_body).await?;

        info!("Received script ({} characters)", content.chars().count());
        Ok(content)
    }
}

fn concept_prompt(reference_text: &str) -> String {
    format!(
        r#"You are a senior head drama writer who deeply understands the sensibilities of women in their sixties and beyond.

[Goal]
Analyze the reference story below, extract its core thematic keywords, and propose {count} completely new story concepts built on them.

[Constraints]
1. Renamed cast and places: never reuse a character name or place name from the reference story. Invent entirely new ones.
2. Target audience: women aged 60 and over.
3. Subject and mood: comfort for a life already lived, fresh hope, warm family bonds, or a stirring late-life romance. Aim for deep resonance, lasting warmth, or gentle humor rather than shock value.
4. Pull: the story must spark strong curiosity from its very first beat.

[Reference story]
{reference_text}"#,
        count = CONCEPT_BATCH_SIZE,
        reference_text = reference_text
    )
}

/// Response shape declared to the service and enforced again when parsing.
fn concept_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "id": { "type": "INTEGER" },
                "title": { "type": "STRING", "description": "An evocative, emotional title" },
                "logline": { "type": "STRING", "description": "One-line teaser" },
                "synopsis": {
                    "type": "STRING",
                    "description": "Full plot summary with beginning, build, turn, and resolution"
                },
                "characters": {
                    "type": "ARRAY",
                    "items": { "type": "STRING" },
                    "description": "Cast names, none shared with the reference story"
                },
                "tone": { "type": "STRING", "description": "Mood of the piece (e.g. warm, mystery, comic)" }
            },
            "required": ["id", "title", "logline", "synopsis", "characters", "tone"]
        }
    })
}

fn parse_concepts(text: &str) -> Result<Vec<Concept>> {
    // The service occasionally wraps structured output in markdown fences
    let json_text = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let batch: Vec<Concept> = serde_json::from_str(json_text).map_err(|e| {
        StoryError::MalformedResponse(format!("Failed to parse concepts JSON: {}", e))
    })?;

    Ok(renumber_batch(batch))
}

fn script_prompt(concept: &Concept) -> String {
    format!(
        r#"You are a professional audio drama writer.
Using the concept below, write a narration script optimized for read-aloud (TTS) playback, about 30 minutes long with a very unhurried pace.

[Concept]
- Title: {title}
- Synopsis: {synopsis}
- Characters: {characters}
- Audience: women aged 60 and over (moving, engaging, immersive)

[Rules - follow strictly]
1. Opening: start with an intense, emotional hook that pulls the listener in within the first ten seconds.
2. Structure: place turns and emotional peaks through the middle of the story so the listener stays to the end.
3. Format (TTS-ready):
   - Preface: before the narration body, give a short introduction of the cast (name, temperament).
   - Body: never write stage directions or speaker labels (such as 'Tom:' or 'Narration:').
   - Write only the text that will be read aloud.
   - Let context show who is speaking, or keep the whole piece flowing as a one-voice reading.
   - Use conversational sentences, broken where a reader would naturally breathe.
4. Length: as long and detailed as possible, with a tightly woven emotional line (target about 30 minutes read aloud).

[Formatting example]
(Good)
The wind is cold tonight. Do you remember last winter, the day the snow fell and we first met?
(Bad)
Tom: The wind is cold tonight.
Sarah: It really is.
Narration: Tom looked at Sarah.

Write like the good example: no speaker names, voices woven into context, narration and dialogue flowing as one."#,
        title = concept.title,
        synopsis = concept.synopsis,
        characters = concept.characters.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_concepts_renumbers_and_truncates() {
        let payload = serde_json::to_string(
            &(0..5)
                .map(|i| {
                    json!({
                        "id": 90 + i,
                        "title": format!("Title {i}"),
                        "logline": "teaser",
                        "synopsis": "summary",
                        "characters": ["Mara"],
                        "tone": "warm"
                    })
                })
                .collect::<Vec<_>>(),
        )
        .unwrap();

        let concepts = parse_concepts(&payload).unwrap();
        assert_eq!(concepts.len(), CONCEPT_BATCH_SIZE);
        let ids: Vec<u32> = concepts.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn parse_concepts_strips_markdown_fences() {
        let fenced = "```json\n[{\"id\": 1, \"title\": \"T\", \"logline\": \"L\", \"synopsis\": \"S\", \"characters\": [\"A\"], \"tone\": \"warm\"}]\n```";
        let concepts = parse_concepts(fenced).unwrap();
        assert_eq!(concepts.len(), 1);
        assert_eq!(concepts[0].title, "T");
    }

    #[test]
    fn parse_concepts_rejects_malformed_payload() {
        let err = parse_concepts("{\"not\": \"an array\"}").unwrap_err();
        assert!(matches!(err, StoryError::MalformedResponse(_)));
    }

    #[test]
    fn concept_schema_requires_every_field() {
        let schema = concept_schema();
        let required: Vec<&str> = schema["items"]["required"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(
            required,
            vec!["id", "title", "logline", "synopsis", "characters", "tone"]
        );
    }

    #[test]
    fn concept_prompt_embeds_reference_and_constraints() {
        let prompt = concept_prompt("An old tale about two sisters");
        assert!(prompt.contains("An old tale about two sisters"));
        assert!(prompt.contains("3 completely new story concepts"));
        assert!(prompt.contains("never reuse a character name"));
    }

    #[test]
    fn script_prompt_embeds_concept_fields() {
        let concept = Concept {
            id: 2,
            title: "The Hill of Winds".to_string(),
            logline: "teaser".to_string(),
            synopsis: "A widow returns to her home village".to_string(),
            characters: vec!["Mara".to_string(), "Elin".to_string()],
            tone: "warm".to_string(),
        };
        let prompt = script_prompt(&concept);
        assert!(prompt.contains("The Hill of Winds"));
        assert!(prompt.contains("A widow returns to her home village"));
        assert!(prompt.contains("Mara, Elin"));
        assert!(prompt.contains("speaker labels"));
    }
}
