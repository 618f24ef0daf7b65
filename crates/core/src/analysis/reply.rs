//! Parsing of the model's text reply into an [`AnalysisResult`].

use serde::Deserialize;

use super::error::AnalysisError;
use crate::art::{AnalysisResult, TAG_DELIMITER};

#[derive(Debug, Deserialize)]
struct RawReply {
    title: String,
    tags: RawTags,
}

/// Models are asked for a delimited string but sometimes answer with a list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTags {
    Delimited(String),
    List(Vec<String>),
}

impl RawTags {
    fn into_tags(self) -> Vec<String> {
        let raw = match self {
            Self::Delimited(joined) => joined
                .split(TAG_DELIMITER)
                .map(str::to_string)
                .collect::<Vec<_>>(),
            Self::List(list) => list,
        };
        raw.into_iter()
            .map(|tag| tag.trim().to_string())
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

/// Remove a surrounding Markdown code fence, if any.
///
/// Handles both ```` ``` ```` and ```` ```json ```` openers.
#[must_use]
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);

    match inner.find('\n') {
        Some(newline) => inner[newline + 1..].trim(),
        None => inner.trim_start_matches(char::is_alphanumeric).trim(),
    }
}

/// Parse the reply text into a title and tag list.
///
/// # Errors
///
/// Returns [`AnalysisError::Malformed`] if the reply is not the expected JSON
/// object, or if the title or tags are empty.
pub fn parse_reply(content: &str) -> Result<AnalysisResult, AnalysisError> {
    let body = strip_code_fence(content);
    let raw: RawReply = serde_json::from_str(body)
        .map_err(|e| AnalysisError::malformed(format!("{e} in reply {body:?}")))?;

    let title = raw.title.trim().to_string();
    if title.is_empty() {
        return Err(AnalysisError::malformed("empty title"));
    }

    let tags = raw.tags.into_tags();
    if tags.is_empty() {
        return Err(AnalysisError::malformed("no tags"));
    }

    Ok(AnalysisResult { title, tags })
}
