use std::path::Path;
use tagline_types::FinalRecord;

/// Write the final records as a pretty JSON array
pub async fn write_json_report(path: &Path, records: &[FinalRecord]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    tokio::fs::write(path, json).await?;
    tracing::info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

/// Write a plain-text report meant for reading
pub async fn write_text_report(path: &Path, records: &[FinalRecord]) -> anyhow::Result<()> {
    tokio::fs::write(path, render_text(records)).await?;
    tracing::info!("Wrote text report to {}", path.display());
    Ok(())
}

pub fn render_text(records: &[FinalRecord]) -> String {
    let rule = "-".repeat(40);
    let separator = "=".repeat(60);
    records
        .iter()
        .map(|record| {
            format!(
                "ID: {}\nTitle: {}\nTags: {}\n{}\n[User]\n{}\n\n[AI]\n{}\n{}\n\n",
                record.id,
                record.title,
                record.tags.join(", "),
                rule,
                record.user_prompt_cleaned,
                record.ai_response_cleaned,
                separator
            )
        })
        .collect()
}

/// Read a JSON report written by [`write_json_report`]
pub async fn read_json_report(path: &Path) -> anyhow::Result<Vec<FinalRecord>> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}
