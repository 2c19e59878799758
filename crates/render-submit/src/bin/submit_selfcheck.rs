//! Checks that the submitter can be configured and authenticated without
//! creating a job.

use render_submit::{JobSubmitter, SubmitterConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = rustls::crypto::ring::default_provider().install_default();
    dotenvy::dotenv().ok();

    let config = SubmitterConfig::from_env()?;
    println!(
        "submit-selfcheck: parent={} output_bucket={} machine_type={}",
        config.batch.parent(),
        config.output_bucket,
        config.profile.machine_type
    );

    match config.webhook_signal_url() {
        Some(url) => println!("submit-selfcheck: webhook={}", url),
        None => println!("submit-selfcheck: no PIPELINE_MANAGER_URL, jobs will not signal completion"),
    }

    JobSubmitter::from_config(config)
        .await
        .map_err(|e| anyhow::anyhow!("credentials not usable: {}", e))?;

    println!("submit-selfcheck: ok");
    Ok(())
}
