//! Question Provider boundary: the request shape, the raw record a provider
//! returns, and the trait the acquisition pipeline talks to.

mod config;
mod error;
mod gemini;

use futures::future::BoxFuture;
use serde::Deserialize;

use crate::state::game::{CategorySet, Difficulty, Language, Mode};

pub use config::ProviderConfig;
pub use error::{ProviderError, ProviderResult};
pub use gemini::GeminiProvider;

/// What a provider is asked to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRequest {
    /// One to three categories; mixed requests are spread evenly.
    pub categories: CategorySet,
    /// Difficulty every question should match.
    pub difficulty: Difficulty,
    /// Positive number of questions wanted.
    pub count: usize,
    /// One of Classic, Kids or Students; tournaments are asked as Classic.
    pub mode: Mode,
    /// Language the questions are written in.
    pub language: Language,
}

impl QuestionRequest {
    /// Build a request, folding tournament play onto the classic audience.
    pub fn new(
        categories: CategorySet,
        difficulty: Difficulty,
        count: usize,
        mode: Mode,
        language: Language,
    ) -> Self {
        let mode = match mode {
            Mode::LocalTournament => Mode::Classic,
            other => other,
        };
        Self {
            categories,
            difficulty,
            count,
            mode,
            language,
        }
    }
}

/// A question record exactly as the provider produced it, not yet validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProviderQuestion {
    /// Question wording.
    pub text: String,
    /// Candidate answers as generated.
    pub options: Vec<String>,
    /// The option that is correct.
    pub correct_answer: String,
    /// Illustration to show next to the question.
    pub image_url: Option<String>,
    /// ISO country code for flag questions.
    pub country_code: Option<String>,
    /// Short note shown after adjudication.
    pub explanation: Option<String>,
}

/// Abstraction over the external content service generating questions.
pub trait QuestionProvider: Send + Sync {
    /// Generate up to `request.count` ranked question records.
    fn generate(
        &self,
        request: QuestionRequest,
    ) -> BoxFuture<'static, ProviderResult<Vec<ProviderQuestion>>>;

    /// Whether calls can succeed at all. When false every round is served
    /// from the fallback set and the service reports itself degraded.
    fn is_available(&self) -> bool {
        true
    }
}
