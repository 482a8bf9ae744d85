//! Question Acquisition Pipeline: provider calls with a deterministic fallback,
//! record validation, flag image derivation and image warming.

use std::{sync::Arc, time::Duration};

use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{
        image::ImageWarmer,
        provider::{ProviderError, ProviderQuestion, QuestionProvider, QuestionRequest},
    },
    services::fallback::{fallback_questions, flag_image_url},
    state::game::{Category, Question, usable_image},
};

/// Turns question requests into playable batches. Never fails.
#[derive(Clone)]
pub struct QuestionPipeline {
    provider: Arc<dyn QuestionProvider>,
    warmer: Arc<dyn ImageWarmer>,
    provider_timeout: Duration,
    first_image_timeout: Duration,
    flag_image_base: Arc<str>,
}

impl QuestionPipeline {
    /// Build a pipeline from its collaborators and the configured timeouts.
    pub fn new(
        provider: Arc<dyn QuestionProvider>,
        warmer: Arc<dyn ImageWarmer>,
        config: &AppConfig,
    ) -> Self {
        Self {
            provider,
            warmer,
            provider_timeout: config.provider_timeout,
            first_image_timeout: config.first_image_timeout,
            flag_image_base: Arc::from(config.flag_image_base.as_str()),
        }
    }

    /// False when every batch will come from the fallback set.
    pub fn provider_available(&self) -> bool {
        self.provider.is_available()
    }

    /// Produce exactly `request.count` questions.
    ///
    /// Provider failures of any kind are logged and replaced by the fallback
    /// set; unusable records are dropped and the batch is topped up from it.
    pub async fn fetch_batch(&self, request: QuestionRequest) -> Vec<Question> {
        let count = request.count;
        let fallback_category = request.categories.primary();
        let language = request.language;
        let derive_flags = request.categories.as_slice().contains(&Category::Flags);

        let records = match self.call_provider(request).await {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, count, "question provider failed; serving fallback set");
                return fallback_questions(
                    fallback_category,
                    language,
                    count,
                    &self.flag_image_base,
                );
            }
        };

        let received = records.len();
        let batch = Uuid::new_v4().simple().to_string();
        let mut questions: Vec<Question> = records
            .into_iter()
            .filter_map(|record| self.normalize(record, derive_flags))
            .take(count)
            .enumerate()
            .map(|(index, mut question)| {
                question.id = format!("{batch}-{index}");
                question
            })
            .collect();

        if questions.len() < count {
            warn!(
                received,
                usable = questions.len(),
                count,
                "provider batch short of usable questions; topping up from fallback set"
            );
            let filler =
                fallback_questions(fallback_category, language, count, &self.flag_image_base);
            questions.extend(filler.into_iter().skip(questions.len()));
        }

        debug!(count = questions.len(), "question batch assembled");
        questions
    }

    async fn call_provider(
        &self,
        request: QuestionRequest,
    ) -> Result<Vec<ProviderQuestion>, ProviderError> {
        match timeout(self.provider_timeout, self.provider.generate(request)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                millis: self.provider_timeout.as_millis(),
            }),
        }
    }

    /// Validate a raw record and resolve its display image.
    fn normalize(&self, record: ProviderQuestion, derive_flags: bool) -> Option<Question> {
        let country_code = record
            .country_code
            .as_deref()
            .map(str::trim)
            .filter(|code| is_country_code(code))
            .map(str::to_ascii_uppercase);

        let image = match (&country_code, derive_flags) {
            (Some(code), true) => Some(flag_image_url(&self.flag_image_base, code)),
            _ => usable_image(record.image_url.as_deref()),
        };

        let question = Question {
            id: String::new(),
            text: record.text.trim().to_owned(),
            options: record.options,
            correct_answer: record.correct_answer,
            image,
            explanation: record
                .explanation
                .map(|text| text.trim().to_owned())
                .filter(|text| !text.is_empty()),
            country_code,
        };

        match question.validate() {
            Ok(()) => Some(question),
            Err(defect) => {
                debug!(defect = %defect, "discarding malformed provider question");
                None
            }
        }
    }

    /// Resolve the first question's image, bounded by the configured limit.
    pub async fn warm_first(&self, questions: &[Question]) {
        let Some(url) = questions.first().and_then(|q| q.image.clone()) else {
            return;
        };
        match timeout(self.first_image_timeout, self.warmer.warm(url.clone())).await {
            Ok(Ok(())) => debug!(url = %url, "first image warmed"),
            Ok(Err(err)) => debug!(error = %err, "first image could not be warmed"),
            Err(_) => debug!(url = %url, "first image warm-up timed out"),
        }
    }

    /// Warm the image of `upcoming` in the background. Fire-and-forget.
    pub fn prefetch(&self, upcoming: Option<&Question>) {
        let Some(url) = upcoming.and_then(|q| q.image.clone()) else {
            return;
        };
        let warmer = self.warmer.clone();
        tokio::spawn(async move {
            match warmer.warm(url.clone()).await {
                Ok(()) => debug!(url = %url, "prefetched next image"),
                Err(err) => debug!(error = %err, "next image prefetch failed"),
            }
        });
    }
}

fn is_country_code(code: &str) -> bool {
    code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic())
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use futures::future::BoxFuture;

    use super::*;
    use crate::{
        dao::{image::ImageError, provider::ProviderResult},
        state::game::{CategorySet, Difficulty, Language, Mode},
    };

    /// Provider answering every call with a canned outcome.
    pub(crate) enum FakeProvider {
        Records(Vec<ProviderQuestion>),
        Unavailable,
        Hanging,
    }

    impl QuestionProvider for FakeProvider {
        fn generate(
            &self,
            _request: QuestionRequest,
        ) -> BoxFuture<'static, ProviderResult<Vec<ProviderQuestion>>> {
            let outcome = match self {
                FakeProvider::Records(records) => Some(Ok(records.clone())),
                FakeProvider::Unavailable => Some(Err(ProviderError::MissingCredentials {
                    var: "API_KEY",
                })),
                FakeProvider::Hanging => None,
            };
            Box::pin(async move {
                match outcome {
                    Some(result) => result,
                    None => futures::future::pending().await,
                }
            })
        }

        fn is_available(&self) -> bool {
            !matches!(self, FakeProvider::Unavailable)
        }
    }

    /// Warmer recording every URL it was asked to warm.
    #[derive(Default)]
    pub(crate) struct RecordingWarmer {
        pub urls: Arc<Mutex<Vec<String>>>,
    }

    impl ImageWarmer for RecordingWarmer {
        fn warm(&self, url: String) -> BoxFuture<'static, Result<(), ImageError>> {
            let urls = self.urls.clone();
            Box::pin(async move {
                urls.lock().unwrap().push(url);
                Ok(())
            })
        }
    }

    pub(crate) fn record(text: &str, country_code: Option<&str>) -> ProviderQuestion {
        ProviderQuestion {
            text: text.into(),
            options: vec!["Oman".into(), "Chad".into(), "Peru".into(), "Fiji".into()],
            correct_answer: "Oman".into(),
            image_url: Some("https://images.example/provider.png".into()),
            country_code: country_code.map(str::to_owned),
            explanation: Some("  ".into()),
        }
    }

    fn pipeline(provider: FakeProvider) -> QuestionPipeline {
        let config = AppConfig {
            provider_timeout: Duration::from_millis(50),
            ..AppConfig::default()
        };
        QuestionPipeline::new(
            Arc::new(provider),
            Arc::new(RecordingWarmer::default()),
            &config,
        )
    }

    fn request(category: Category, count: usize) -> QuestionRequest {
        QuestionRequest::new(
            CategorySet::single(category),
            Difficulty::Medium,
            count,
            Mode::Classic,
            Language::English,
        )
    }

    #[tokio::test]
    async fn outage_yields_exactly_count_fallback_questions() {
        let questions = pipeline(FakeProvider::Unavailable)
            .fetch_batch(request(Category::Science, 10))
            .await;
        assert_eq!(questions.len(), 10);
        assert!(questions.iter().all(|q| q.id.starts_with("fallback-")));
        assert_eq!(questions[0].text, "Test Question 1");
    }

    #[tokio::test]
    async fn slow_provider_times_out_into_fallback() {
        let questions = pipeline(FakeProvider::Hanging)
            .fetch_batch(request(Category::Flags, 3))
            .await;
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[0].correct_answer, "Egypt");
    }

    #[tokio::test]
    async fn country_code_wins_over_provider_image_for_flags() {
        let questions = pipeline(FakeProvider::Records(vec![record("Which country?", Some("om"))]))
            .fetch_batch(request(Category::Flags, 1))
            .await;
        assert_eq!(
            questions[0].image.as_deref(),
            Some("https://flagcdn.com/w640/om.png")
        );
        assert_eq!(questions[0].country_code.as_deref(), Some("OM"));
        assert_eq!(questions[0].explanation, None);
    }

    #[tokio::test]
    async fn malformed_country_code_keeps_provider_image() {
        let questions = pipeline(FakeProvider::Records(vec![record("Which country?", Some("OMN"))]))
            .fetch_batch(request(Category::Flags, 1))
            .await;
        assert_eq!(
            questions[0].image.as_deref(),
            Some("https://images.example/provider.png")
        );
        assert_eq!(questions[0].country_code, None);
    }

    #[tokio::test]
    async fn invalid_records_are_dropped_and_topped_up() {
        let mut duplicated = record("Two right answers", None);
        duplicated.options[1] = "Oman".into();
        let mut short = record("Three options", None);
        short.options.pop();

        let questions = pipeline(FakeProvider::Records(vec![
            record("Good one", None),
            duplicated,
            short,
        ]))
        .fetch_batch(request(Category::General, 4))
        .await;

        assert_eq!(questions.len(), 4);
        assert_eq!(questions[0].text, "Good one");
        assert_eq!(questions[1].text, "Test Question 2");
        assert_eq!(questions[3].id, "fallback-3");

        let mut ids: Vec<_> = questions.iter().map(|q| q.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }

    #[tokio::test]
    async fn oversized_batches_are_truncated() {
        let records = (0..12).map(|i| record(&format!("Q{i}"), None)).collect();
        let questions = pipeline(FakeProvider::Records(records))
            .fetch_batch(request(Category::General, 10))
            .await;
        assert_eq!(questions.len(), 10);
        assert_eq!(questions[9].text, "Q9");
    }

    #[tokio::test]
    async fn first_image_is_warmed_before_play() {
        let warmer = RecordingWarmer::default();
        let urls = warmer.urls.clone();
        let pipeline = QuestionPipeline::new(
            Arc::new(FakeProvider::Unavailable),
            Arc::new(warmer),
            &AppConfig::default(),
        );
        let questions = pipeline.fetch_batch(request(Category::Flags, 2)).await;
        pipeline.warm_first(&questions).await;
        assert_eq!(
            urls.lock().unwrap().as_slice(),
            ["https://flagcdn.com/w640/eg.png".to_string()]
        );
    }

    #[test]
    fn country_codes_are_two_ascii_letters() {
        assert!(is_country_code("sa"));
        assert!(!is_country_code("s1"));
        assert!(!is_country_code("SAU"));
        assert!(!is_country_code(""));
    }
}
