//! Render job submitter binary.
//!
//! Usage: `render-submit [--json] <render_job_id> <scene_uri> [webhook_url]`

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use render_models::RenderRequest;
use render_submit::{JobSubmitter, SubmitterConfig};

const USAGE: &str = "usage: render-submit [--json] <render_job_id> <scene_uri> [webhook_url]";

struct Args {
    json: bool,
    request: RenderRequest,
}

fn parse_args() -> Option<Args> {
    let mut json = false;
    let mut positional = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--json" => json = true,
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let render_job_id = positional.next()?;
    let scene_uri = positional.next()?;
    let webhook_url = positional.next();
    if positional.next().is_some() {
        return None;
    }

    Some(Args {
        json,
        request: RenderRequest::new(render_job_id, scene_uri, webhook_url),
    })
}

fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("render_submit=info,render_batch=info"));

    // Logs go to stderr; stdout carries only the result.
    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false),
            )
            .with(env_filter)
            .init();
    }
}

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider was already installed");
    }

    dotenvy::dotenv().ok();
    init_tracing();

    let Some(Args { json, mut request }) = parse_args() else {
        eprintln!("{USAGE}");
        std::process::exit(2);
    };

    let config = match SubmitterConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load submitter config: {}", e);
            std::process::exit(1);
        }
    };

    if request.webhook_url.is_none() {
        request.webhook_url = config.webhook_signal_url();
    }

    info!(
        project_id = %config.batch.project_id,
        region = %config.batch.region,
        output_bucket = %config.output_bucket,
        "Starting render-submit"
    );

    let submitter = match JobSubmitter::from_config(config).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create job submitter: {}", e);
            std::process::exit(1);
        }
    };

    match submitter.submit_request(&request).await {
        Ok(submitted) if json => match serde_json::to_string_pretty(&submitted) {
            Ok(body) => println!("{body}"),
            Err(e) => {
                error!("Failed to encode result: {}", e);
                std::process::exit(1);
            }
        },
        Ok(submitted) => println!("{}", submitted.name),
        Err(e) => {
            error!(render_job_id = %request.render_job_id, "Submission failed: {}", e);
            std::process::exit(if e.is_invalid_input() { 2 } else { 1 });
        }
    }
}
