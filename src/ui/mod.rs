use crate::app::FlowState;
use crate::concept::{Concept, GeneratedScript};
use crate::error::Result;
use chrono::{Local, TimeZone};
use std::path::{Path, PathBuf};
use tracing::info;

/// Print the concept cards of the current batch.
pub fn render_concepts(state: &FlowState) {
    println!();
    println!("=== Suggested story concepts ===");

    for concept in &state.concepts {
        let ready = if state.scripts.contains_key(&concept.id) {
            "  [script ready]"
        } else {
            ""
        };

        println!();
        println!("[{}] {}{}", concept.id, concept.title, ready);
        println!("    Tone: {}", concept.tone);
        println!("    \"{}\"", concept.logline);
        println!("    Synopsis: {}", concept.synopsis);
        println!("    Cast: {}", concept.characters.join(", "));
    }

    println!();
    println!("Pick a concept to turn it into a full narration script.");
}

/// Print the script viewer: title header, body, generation-time footer.
pub fn render_script(concept: &Concept, script: &GeneratedScript) {
    let generated_at = Local
        .timestamp_millis_opt(script.timestamp)
        .single()
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default();

    println!();
    println!("================================================");
    println!("{}", concept.title);
    println!("Narration format, about 30 minutes read aloud");
    println!("================================================");
    println!();
    println!("{}", script.content);
    println!();
    println!("--- Generated at {} ---", generated_at);
}

/// File name derived from the concept title. Anything the filesystem might
/// reject becomes '_'.
pub fn script_file_name(title: &str) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let stem = stem.trim_matches('_');

    if stem.is_empty() {
        "script.txt".to_string()
    } else {
        format!("{}_script.txt", stem)
    }
}

/// Export the script as a plain-text file under `output_dir`.
pub async fn save_script(
    output_dir: &Path,
    concept: &Concept,
    script: &GeneratedScript,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir).await?;

    let path = output_dir.join(script_file_name(&concept.title));
    tokio::fs::write(&path, &script.content).await?;

    info!("Script saved to {}", path.display());
    Ok(path)
}
