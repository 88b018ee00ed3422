use clap::Parser;
use preview_seo::analysis::remote::RemoteEngineFactory;
use preview_seo::fetch::{HttpPreviewSource, PreviewSource, WebDriverPreviewSource};
use preview_seo::orchestrator::SnippetPreview;
use preview_seo::{Panel, PanelConfig, PanelState};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;

mod args;
use args::Args;

#[derive(Serialize)]
struct Output {
    state: PanelState,
    snippet: SnippetPreview,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    let args = Args::parse();

    let mut config = match PanelConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            ::log::error!("Failed to load panel configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(selector) = args.selector {
        config.content_selector = selector;
    }

    ::log::info!("Analysing preview {}", config.preview_url);

    let webdriver = args
        .webdriver
        .as_deref()
        .map(|url| Arc::new(WebDriverPreviewSource::new(url)));
    let source: Arc<dyn PreviewSource> = match &webdriver {
        Some(webdriver) => webdriver.clone() as Arc<dyn PreviewSource>,
        None => Arc::new(HttpPreviewSource::new()),
    };

    let panel = Panel::new(config, Arc::new(RemoteEngineFactory::new(&args.engine_url)))
        .with_source(source)
        .build();

    let result = panel.start().await;
    if let Some(webdriver) = webdriver {
        webdriver.close().await;
    }
    if let Err(e) = result {
        ::log::error!("Preview cycle failed: {}", e);
        return ExitCode::FAILURE;
    }

    let output = Output {
        state: panel.state(),
        snippet: panel.snippet_preview(),
    };
    match serde_json::to_string_pretty(&output) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            ::log::error!("Failed to serialize panel state: {}", e);
            ExitCode::FAILURE
        }
    }
}
