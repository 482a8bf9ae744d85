use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::state::game::{Category, Mode};

use super::{
    ProviderQuestion, QuestionProvider, QuestionRequest,
    config::ProviderConfig,
    error::{ProviderError, ProviderResult},
};

/// Question provider backed by the Gemini `generateContent` REST endpoint.
#[derive(Clone)]
pub struct GeminiProvider {
    client: Client,
    config: Arc<ProviderConfig>,
}

impl GeminiProvider {
    /// Build the HTTP client for the given configuration.
    pub fn new(config: ProviderConfig) -> ProviderResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| ProviderError::ClientBuilder { source })?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    /// Whether an API key is configured; without one every call falls back.
    pub fn has_credentials(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn request_questions(
        &self,
        request: &QuestionRequest,
    ) -> ProviderResult<Vec<ProviderQuestion>> {
        let api_key = self.config.require_api_key()?;
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );

        let payload = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(request),
                }],
            }],
            tools: vec![Tool {
                google_search: EmptyObject {},
            }],
            generation_config: GenerationConfig {
                temperature: temperature(request.mode),
            },
        };

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&payload)
            .send()
            .await
            .map_err(|source| ProviderError::Transport {
                url: url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                status: response.status(),
            });
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|source| ProviderError::DecodeResponse { source })?;

        let text = body
            .candidates
            .into_iter()
            .next()
            .map(|candidate| {
                candidate
                    .content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<String>()
            })
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ProviderError::malformed("empty candidate list"))?;

        let questions = parse_questions(&text)?;
        debug!(
            model = %self.config.model,
            count = questions.len(),
            "provider returned questions"
        );
        Ok(questions)
    }
}

impl QuestionProvider for GeminiProvider {
    fn generate(
        &self,
        request: QuestionRequest,
    ) -> BoxFuture<'static, ProviderResult<Vec<ProviderQuestion>>> {
        let provider = self.clone();
        Box::pin(async move { provider.request_questions(&request).await })
    }

    fn is_available(&self) -> bool {
        self.has_credentials()
    }
}

fn temperature(mode: Mode) -> f32 {
    match mode {
        Mode::Kids => 0.5,
        _ => 0.7,
    }
}

/// Prompt shaped by audience, language, category and mixing.
fn build_prompt(request: &QuestionRequest) -> String {
    let language = request.language.display_name();
    let categories = request
        .categories
        .as_slice()
        .iter()
        .map(|category| category.tag())
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = format!(
        "You are a quiz master for a game called 'Sharq > Gharb'.\n\
         Generate {count} multiple-choice questions in {language}.\n\
         Category ID: {categories}\n\
         Difficulty: {difficulty}\n",
        count = request.count,
        difficulty = request.difficulty.tag(),
    );

    match request.mode {
        Mode::Kids => {
            prompt.push_str(&format!(
                "\nMODE: KIDS (age 5-10)\n\
                 - Role: kindergarten or primary school teacher.\n\
                 - Tone: fun, cheerful, encouraging, simple {language}.\n\
                 - Restrictions: no violence, no politics, no complex history, \
                 no obscure facts.\n\
                 - Images must be colorful, clear and easy to recognize.\n"
            ));
        }
        Mode::Students => {
            prompt.push_str(&format!(
                "\nMODE: STUDENTS (age 12-18)\n\
                 - Role: high school teacher.\n\
                 - Tone: academic {language}.\n\
                 - Focus: school curriculum topics.\n"
            ));
        }
        Mode::Classic | Mode::LocalTournament => {
            prompt.push_str(
                "\nMODE: GENERAL\n\
                 - Audience: general public.\n\
                 - Tone: entertaining, trivia night style.\n",
            );
        }
    }

    prompt.push_str(&format!(
        "\nReturn only JSON shaped as:\n\
         {{\"questions\": [{{\"text\": \"...\", \
         \"options\": [\"...\", \"...\", \"...\", \"...\"], \
         \"correctAnswer\": \"one of the options\", \"imageUrl\": \"https://...\", \
         \"countryCode\": \"SA\", \"explanation\": \"short explanation in {language}\"}}]}}\n\
         Every question has exactly 4 distinct options and the correct answer \
         appears among them exactly once.\n"
    ));

    if request.categories.as_slice().contains(&Category::Flags) {
        prompt.push_str(&format!(
            "For FLAGS questions the text asks \"Which country is this?\", \
             the options are 4 country names in {language}, \
             and countryCode (ISO 3166 alpha-2) is mandatory.\n"
        ));
    }

    if request.categories.is_mixed() {
        prompt.push_str(&format!("Distribute questions evenly across: {categories}.\n"));
    }

    prompt
}

/// Extract the outermost JSON object from model text and read its question list.
pub(crate) fn parse_questions(text: &str) -> ProviderResult<Vec<ProviderQuestion>> {
    let start = text
        .find('{')
        .ok_or_else(|| ProviderError::malformed("no JSON object in response"))?;
    let end = text
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| ProviderError::malformed("unterminated JSON object in response"))?;

    let document: QuestionDocument =
        serde_json::from_str(&text[start..=end]).map_err(ProviderError::malformed)?;
    document
        .questions
        .ok_or_else(|| ProviderError::malformed("missing `questions` array"))
}

#[derive(Debug, Deserialize)]
struct QuestionDocument {
    questions: Option<Vec<ProviderQuestion>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    tools: Vec<Tool>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: EmptyObject,
}

#[derive(Debug, Serialize)]
struct EmptyObject {}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::game::{CategorySet, Difficulty, Language};

    fn request(categories: CategorySet, mode: Mode) -> QuestionRequest {
        QuestionRequest::new(categories, Difficulty::Medium, 10, mode, Language::English)
    }

    #[test]
    fn parses_json_wrapped_in_prose() {
        let text = "Here you go:\n```json\n\
                    {\"questions\": [{\"text\": \"Which country is this?\", \
                    \"options\": [\"Egypt\", \"Qatar\", \"Oman\", \"Chad\"], \
                    \"correctAnswer\": \"Egypt\", \"countryCode\": \"EG\"}]}\n```\nEnjoy!";
        let questions = parse_questions(text).unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].correct_answer, "Egypt");
        assert_eq!(questions[0].country_code.as_deref(), Some("EG"));
        assert_eq!(questions[0].image_url, None);
    }

    #[test]
    fn rejects_text_without_a_question_list() {
        assert!(matches!(
            parse_questions("no json here"),
            Err(ProviderError::Malformed { .. })
        ));
        assert!(matches!(
            parse_questions("{\"items\": []}"),
            Err(ProviderError::Malformed { .. })
        ));
        assert!(matches!(
            parse_questions("{\"questions\": [oops]}"),
            Err(ProviderError::Malformed { .. })
        ));
    }

    #[test]
    fn prompt_mentions_country_codes_only_for_flags() {
        let flags = build_prompt(&request(CategorySet::single(Category::Flags), Mode::Classic));
        assert!(flags.contains("countryCode (ISO 3166 alpha-2) is mandatory"));

        let science = build_prompt(&request(
            CategorySet::single(Category::Science),
            Mode::Students,
        ));
        assert!(!science.contains("is mandatory"));
        assert!(science.contains("MODE: STUDENTS"));
    }

    #[test]
    fn mixed_prompt_asks_for_an_even_split() {
        let categories =
            CategorySet::new([Category::Math, Category::Quran, Category::Cars]).unwrap();
        let prompt = build_prompt(&request(categories, Mode::Classic));
        assert!(prompt.contains("Distribute questions evenly across: MATH, QURAN, CARS."));
    }

    #[test]
    fn kids_are_asked_with_a_lower_temperature() {
        assert_eq!(temperature(Mode::Kids), 0.5);
        assert_eq!(temperature(Mode::Students), 0.7);
    }

    #[tokio::test]
    async fn missing_key_fails_without_a_request() {
        let provider =
            GeminiProvider::new(ProviderConfig::new("http://127.0.0.1:9", "test-model")).unwrap();
        assert!(!provider.has_credentials());
        let err = provider
            .generate(request(CategorySet::single(Category::General), Mode::Classic))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredentials { .. }));
    }
}
