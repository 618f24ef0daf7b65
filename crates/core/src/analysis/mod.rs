//! Image analysis: a short title and a few tags for each submission.

mod error;
mod openai;
mod provider;
mod reply;

pub use error::AnalysisError;
pub use openai::{OpenAiAnalyzer, OpenAiConfig};
pub use provider::AnalysisProvider;
pub use reply::{parse_reply, strip_code_fence};

#[cfg(test)]
pub use provider::MockAnalysisProvider;
