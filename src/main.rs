mod api;
mod app;
mod concept;
mod error;
mod ui;

use anyhow::Context;
use api::{GeminiClient, StoryModel};
use app::StoryFlow;
use clap::Parser;
use error::{Result, StoryError};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "silver-story")]
#[command(about = "Audio drama script writer for senior listeners, powered by AI", long_about = None)]
struct Args {
    /// Reference story text
    #[arg(short, long)]
    text: Option<String>,

    /// Reference story file path
    #[arg(short, long)]
    file: Option<String>,

    /// Output directory for saved scripts
    #[arg(short, long, default_value = "./scripts")]
    output: PathBuf,

    /// Pick a concept (1-3) non-interactively, save its script, and exit
    #[arg(short, long)]
    pick: Option<u32>,

    /// Gemini model name
    #[arg(long)]
    model: Option<String>,

    /// Gemini API key
    #[arg(long)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();

    let api_key = if let Some(key) = args.api_key {
        key
    } else if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        key
    } else {
        eprintln!("Error: GEMINI_API_KEY not found. Please set it via --api-key or the GEMINI_API_KEY environment variable");
        std::process::exit(1);
    };

    let reference_text = if let Some(text) = args.text {
        text
    } else if let Some(file_path) = args.file {
        tokio::fs::read_to_string(&file_path)
            .await
            .context(format!("Failed to read file: {}", file_path))?
    } else {
        eprintln!("Error: Either --text or --file must be provided");
        std::process::exit(1);
    };

    let client = match args.model {
        Some(model) => GeminiClient::with_model(api_key, model),
        None => GeminiClient::new(api_key),
    };

    let mut flow = StoryFlow::new(client);
    flow.set_reference_text(reference_text);

    info!("Starting story session...");

    let result = match args.pick {
        Some(concept_id) => run_once(&mut flow, concept_id, &args.output).await,
        None => run_session(&mut flow, &args.output).await,
    };

    if let Err(e) = result {
        error!("Session failed: {}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// One-shot mode: generate concepts, pick one, export its script.
async fn run_once<M: StoryModel>(
    flow: &mut StoryFlow<M>,
    concept_id: u32,
    output_dir: &Path,
) -> Result<()> {
    flow.start_concept_generation().await?;
    ui::render_concepts(flow.state());

    flow.select_concept(concept_id).await?;

    if let Some((concept, script)) = flow.selected_script() {
        ui::render_script(concept, script);
        let path = ui::save_script(output_dir, concept, script).await?;
        println!("Saved: {}", path.display());
    }

    Ok(())
}

/// Interactive session: concept batch up front, then a command loop.
async fn run_session<M: StoryModel>(flow: &mut StoryFlow<M>, output_dir: &Path) -> Result<()> {
    generate_concepts(flow).await;

    let stdin = io::stdin();

    loop {
        print!("\n[1-3] generate/view script  [s] save script  [g] regenerate concepts  [n] new reference  [q] quit\n> ");
        io::stdout().flush()?;

        let line = match read_line(&stdin)? {
            Some(line) => line,
            None => break,
        };

        match line.trim() {
            "" => continue,
            "q" => break,
            "s" => save_selected(flow, output_dir).await,
            "g" => generate_concepts(flow).await,
            "n" => {
                let text = read_reference(&stdin)?;
                flow.set_reference_text(text);
                generate_concepts(flow).await;
            }
            other => match other.parse::<u32>() {
                Ok(id) => select_and_show(flow, id).await,
                Err(_) => println!("Unknown command: {}", other),
            },
        }
    }

    Ok(())
}

async fn generate_concepts<M: StoryModel>(flow: &mut StoryFlow<M>) {
    println!("Generating story concepts...");

    match flow.start_concept_generation().await {
        Ok(_) => ui::render_concepts(flow.state()),
        Err(StoryError::Validation(msg)) => println!("{}", msg),
        Err(e) => {
            error!("Concept generation failed: {}", e);
            println!("Something went wrong while creating concepts. Please try again.");
        }
    }
}

async fn select_and_show<M: StoryModel>(flow: &mut StoryFlow<M>, concept_id: u32) {
    let cached = flow.state().scripts.contains_key(&concept_id);
    if !cached {
        println!("Writing the script... a long-form piece can take a while.");
    }

    match flow.select_concept(concept_id).await {
        Ok(_) => {
            if let Some((concept, script)) = flow.selected_script() {
                ui::render_script(concept, script);
            }
        }
        Err(StoryError::Validation(msg)) => println!("{}", msg),
        Err(e) => {
            error!("Script generation failed: {}", e);
            println!("Something went wrong while writing the script. Please try again.");
        }
    }
}

async fn save_selected<M: StoryModel>(flow: &StoryFlow<M>, output_dir: &Path) {
    match flow.selected_script() {
        Some((concept, script)) => match ui::save_script(output_dir, concept, script).await {
            Ok(path) => println!("Saved: {}", path.display()),
            Err(e) => println!("Could not save the script: {}", e),
        },
        None => println!("Generate a script first, then save it."),
    }
}

fn read_line(stdin: &io::Stdin) -> io::Result<Option<String>> {
    let mut line = String::new();
    if stdin.lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn read_reference(stdin: &io::Stdin) -> io::Result<String> {
    println!("Paste the reference story, then finish with an empty line:");

    let mut text = String::new();
    loop {
        match read_line(stdin)? {
            None => break,
            Some(line) if line.trim().is_empty() => break,
            Some(line) => text.push_str(&line),
        }
    }

    Ok(text)
}
