use anyhow::{Context, Result};
use std::path::Path;
use vigil_client::HttpClassifier;
use vigil_core::{ClassificationService, Frame, MonitorConfig};

pub async fn classify_command(config: &MonitorConfig, image: &Path) -> Result<()> {
    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read {}", image.display()))?;

    let classifier = HttpClassifier::from_config(&config.service)?;
    let label = classifier.classify(&Frame::png(bytes)).await?;

    println!("{label}: {}", label.status_message());
    Ok(())
}
