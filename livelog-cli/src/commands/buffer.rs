//! Print the console buffer of an instance once.

use anyhow::{Context, Result};
use livelog_client::{BufferFetcher, FetchRequest, HttpBufferFetcher, InstanceUuid};

use crate::config::Config;

/// Run the buffer command.
pub async fn run(config: &Config, instance: &str) -> Result<()> {
    let target = InstanceUuid::from(instance);
    let context = config.context();
    let url = context
        .buffer_url(&target)
        .context("Invalid core address")?;

    let request = FetchRequest {
        url: url.to_string(),
        token: context.token.clone(),
        target,
    };
    let records = HttpBufferFetcher::new(config.buffer.format)
        .fetch_buffer(&request)
        .await
        .with_context(|| format!("Failed to fetch console buffer of {}", instance))?;

    for record in &records {
        println!("{}", record);
    }
    tracing::info!(count = records.len(), "console buffer printed");
    Ok(())
}
