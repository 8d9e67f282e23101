use clap::Parser;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};

mod args;
mod composer;
mod config;
mod error;
mod ffmpeg;
mod generator;
mod ledger;
mod llm;
mod models;
mod pipeline;
mod prompts;
mod publisher;
mod store;
mod tts;

use args::Args;
use composer::MediaComposer;
use config::Config;
use error::RunError;
use ffmpeg::FfmpegProcessor;
use generator::StoryGenerator;
use ledger::ChapterLedger;
use llm::OpenAiClient;
use models::RunOutcome;
use pipeline::Pipeline;
use publisher::{PlatformClient, Publisher};
use store::JsonStore;
use tts::ElevenLabsClient;

#[derive(Serialize)]
struct RunReport {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    chapter: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    post_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    media_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_code: Option<u64>,
}

impl RunReport {
    fn success(outcome: RunOutcome) -> Self {
        Self {
            success: true,
            message: "Chapter video uploaded and posted successfully".to_string(),
            chapter: Some(outcome.chapter),
            caption: Some(outcome.caption),
            content: Some(outcome.content),
            post_id: Some(outcome.external_post_id),
            media_id: Some(outcome.media_id),
            error_code: None,
        }
    }

    fn failure(error: &RunError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            chapter: None,
            caption: None,
            content: None,
            post_id: None,
            media_id: None,
            error_code: error.code(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter("info") // set to "debug" for more logs
        .init();

    info!("Starting chapter video publishing pipeline");

    let args = Args::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let store = Arc::new(JsonStore::new(&args.data_dir));
    let ledger = ChapterLedger::new(store.clone(), store.clone());

    if args.reconcile_only {
        let chapter = ledger.reconcile().await;
        info!("Chapter counter reconciled at {}", chapter);
        println!(
            "{}",
            serde_json::json!({ "success": true, "chapter": chapter })
        );
        return Ok(());
    }

    let speech = match ElevenLabsClient::new(
        &config.eleven_labs_api_key,
        &config.eleven_labs_voice_id,
        &config.eleven_labs_api_base,
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let model = Arc::new(OpenAiClient::new(
        &config.openai_api_key,
        &config.openai_api_base,
        &config.openai_model,
    ));
    let generator = StoryGenerator::new(model);
    let composer = MediaComposer::new(
        Arc::new(FfmpegProcessor),
        &args.scratch_dir,
        &args.backgrounds,
        &args.music,
    );
    let publisher = Publisher::new(Arc::new(PlatformClient::new(
        &config.platform_api_base,
        &config.platform_access_token,
    )));

    let pipeline = Pipeline::new(
        store.clone(),
        store,
        ledger,
        generator,
        speech,
        composer,
        publisher,
    );

    match pipeline.run(args.content_type).await {
        Ok(outcome) => {
            info!(
                "Chapter {} published as post {}",
                outcome.chapter, outcome.external_post_id
            );
            println!(
                "{}",
                serde_json::to_string_pretty(&RunReport::success(outcome))?
            );
        }
        Err(e) => {
            error!("Run failed during {}: {}", e.stage(), e);
            println!(
                "{}",
                serde_json::to_string_pretty(&RunReport::failure(&e))?
            );
            std::process::exit(1);
        }
    }

    Ok(())
}
