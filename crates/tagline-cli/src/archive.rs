// Parser for the exported chat activity page
// The export is one HTML document; every conversation starts with a fixed
// separator word followed by the prompt, a timestamp and the response.

use anyhow::Context;
use regex::{Captures, Regex};
use std::path::Path;
use tagline_types::ConversationRecord;

/// Matches timestamps like `2024年5月17日 14:03:22 JST`
pub const DEFAULT_TIMESTAMP_PATTERN: &str =
    r"\d{4}年\d{1,2}月\d{1,2}日\s\d{1,2}:\d{2}:\d{2}\s[A-Z]{2,5}";

pub struct ArchiveOptions {
    separator: String,
    timestamp: Regex,
    markup: Markup,
}

struct Markup {
    hidden: Regex,
    line_break: Regex,
    tag: Regex,
    entity: Regex,
}

impl ArchiveOptions {
    pub fn new(separator: impl Into<String>, timestamp_pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            separator: separator.into(),
            timestamp: Regex::new(timestamp_pattern)?,
            markup: Markup {
                hidden: Regex::new(
                    r"(?is)<script\b.*?</script\s*>|<style\b.*?</style\s*>|<!--.*?-->",
                )?,
                line_break: Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|tr|h[1-6])\s*>")?,
                tag: Regex::new(r"(?s)<[^>]*>")?,
                entity: Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);")?,
            },
        })
    }

    /// Options for a stock export: `Prompted` separator, default timestamp format
    pub fn standard() -> Result<Self, regex::Error> {
        Self::new("Prompted", DEFAULT_TIMESTAMP_PATTERN)
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Visible text of an HTML document
    pub fn html_to_text(&self, html: &str) -> String {
        let text = self.markup.hidden.replace_all(html, "");
        let text = self.markup.line_break.replace_all(&text, "\n");
        let text = self.markup.tag.replace_all(&text, "");
        decode_with(&self.markup.entity, &text)
    }

    /// Decode named and numeric character references
    ///
    /// Unknown names are left untouched.
    pub fn decode_entities(&self, text: &str) -> String {
        decode_with(&self.markup.entity, text)
    }
}

fn decode_with(entity: &Regex, text: &str) -> String {
    entity
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            let decoded = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse::<u32>().ok().and_then(char::from_u32)
            } else {
                named_entity(name)
            };
            match decoded {
                Some(c) => c.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn named_entity(name: &str) -> Option<char> {
    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ldquo" => '\u{201c}',
        "rdquo" => '\u{201d}',
        "lsquo" => '\u{2018}',
        "rsquo" => '\u{2019}',
        "hellip" => '\u{2026}',
        "mdash" => '\u{2014}',
        "ndash" => '\u{2013}',
        "copy" => '\u{a9}',
        _ => return None,
    };
    Some(c)
}

/// Split the archive into conversation records
///
/// Chunks are numbered from 1 in document order. Ids are positional so a
/// re-parse of the same export yields the same ids; empty chunks and chunks
/// without a timestamp still consume their number.
pub fn parse_archive(html: &str, options: &ArchiveOptions) -> Vec<ConversationRecord> {
    let text = options.html_to_text(html);
    let mut records = Vec::new();

    for (index, chunk) in text.split(options.separator.as_str()).enumerate().skip(1) {
        let id = index as u64;
        if chunk.trim().is_empty() {
            continue;
        }

        let Some(found) = options.timestamp.find(chunk) else {
            tracing::warn!("No timestamp in conversation chunk {}, skipping", id);
            continue;
        };

        let user_prompt = chunk[..found.start()]
            .trim()
            .replace(['\u{201c}', '\u{201d}'], "\"");
        let ai_response = chunk[found.end()..].trim();

        records.push(ConversationRecord::new(
            id,
            found.as_str(),
            user_prompt,
            ai_response,
        ));
    }

    tracing::info!("Parsed {} conversations", records.len());
    records
}

/// Read and parse an archive file
pub async fn parse_file(path: &Path, options: &ArchiveOptions) -> anyhow::Result<Vec<ConversationRecord>> {
    tracing::info!("Parsing archive {}", path.display());
    let html = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read archive {}", path.display()))?;
    Ok(parse_archive(&html, options))
}

/// Cache parsed records as pretty JSON
pub async fn save_structured(path: &Path, records: &[ConversationRecord]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    tokio::fs::write(path, json).await?;
    tracing::info!("Saved structured history to {}", path.display());
    Ok(())
}

pub async fn load_structured(path: &Path) -> anyhow::Result<Vec<ConversationRecord>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read structured history {}", path.display()))?;
    let records: Vec<ConversationRecord> = serde_json::from_str(&raw)?;
    tracing::info!("Loaded {} conversations from {}", records.len(), path.display());
    Ok(records)
}
