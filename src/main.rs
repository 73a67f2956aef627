use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::PathBuf;

use image_request::config::Config;
use image_request::request::{ImageRequestInfo, ImageRequestPipeline, RequestEvent};
use image_request::response::{error_response, success_headers, ResponseHeaders};
use image_request::signature::SecretsManagerProvider;
use image_request::storage::S3ObjectStore;

/// Resolve one image request against S3 and print the processing descriptor
#[derive(Parser, Debug)]
#[command(name = "image-request")]
#[command(version, about, long_about = None)]
struct Args {
    /// Request path, e.g. /fit-in/200x200/images/cat.jpg
    #[arg(short, long, conflicts_with = "event")]
    path: Option<String>,

    /// Request header as `Name: value` (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Value for the `signature` query parameter
    #[arg(short, long)]
    signature: Option<String>,

    /// JSON event file with `path`, `headers` and `queryStringParameters`
    #[arg(short, long)]
    event: Option<PathBuf>,

    /// YAML configuration file; the environment is used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SuccessOutput<'a> {
    status_code: u16,
    headers: ResponseHeaders,
    body_size: usize,
    request: &'a ImageRequestInfo,
}

fn build_event(args: &Args) -> anyhow::Result<RequestEvent> {
    let mut event = match &args.event {
        Some(file) => {
            let contents = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read event file {}", file.display()))?;
            serde_json::from_str(&contents).context("Failed to parse event JSON")?
        }
        None => RequestEvent {
            path: args.path.clone(),
            ..Default::default()
        },
    };

    for header in &args.headers {
        let (name, value) = header
            .split_once(':')
            .with_context(|| format!("Header '{}' is not in `Name: value` form", header))?;
        event = event.with_header(name.trim(), value.trim());
    }

    if let Some(signature) = &args.signature {
        event = event.with_query_param("signature", signature.as_str());
    }

    Ok(event)
}

fn load_config(args: &Args) -> anyhow::Result<Config> {
    let config = match &args.config {
        Some(file) => Config::from_file(file).map_err(anyhow::Error::msg)?,
        None => Config::from_env(),
    };
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    image_request::logging::init_subscriber()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging subsystem: {}", e))?;

    let args = Args::parse();
    let config = load_config(&args)?;
    let event = build_event(&args)?;

    tracing::info!(
        path = event.path.as_deref().unwrap_or_default(),
        auto_webp = config.auto_webp,
        signature_enabled = config.signature.enabled,
        custom_rewrite = config.rewrite_rule().is_some(),
        "Configuration loaded"
    );

    let sdk_config = aws_config::load_from_env().await;
    let store = S3ObjectStore::from_sdk_config(&sdk_config);
    let secrets = SecretsManagerProvider::from_sdk_config(&sdk_config);
    let pipeline = ImageRequestPipeline::new(&config, &store, &secrets);

    match pipeline.setup(&event).await {
        Ok(info) => {
            let output = SuccessOutput {
                status_code: 200,
                headers: success_headers(&info, &config),
                body_size: info.original_image.len(),
                request: &info,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(err) => {
            tracing::warn!(status = err.status(), code = %err.code, "Image request failed");
            let response = error_response(&err, &config);
            println!("{}", serde_json::to_string_pretty(&response)?);
            std::process::exit(1);
        }
    }
}
