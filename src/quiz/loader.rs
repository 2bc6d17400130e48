use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::error::LoadError;
use super::question::Question;

/// Where raw question records come from.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Value>, LoadError>;
}

/// Reads the record list from a JSON endpoint with a single GET.
pub struct HttpQuestionSource {
    client: reqwest::Client,
    url: String,
}

impl HttpQuestionSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, LoadError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl QuestionSource for HttpQuestionSource {
    async fn fetch(&self) -> Result<Vec<Value>, LoadError> {
        log::debug!("Fetching questions from {}", self.url);
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Fetches and validates the question list, keeping source order.
pub async fn fetch_questions(source: &dyn QuestionSource) -> Result<Vec<Question>, LoadError> {
    let records = source.fetch().await?;
    Ok(normalize(&records))
}

/// Drops invalid records, logging each one.
pub fn normalize(records: &[Value]) -> Vec<Question> {
    let (questions, rejected) = partition_records(records);
    for record in &rejected {
        log::warn!("Skipping invalid question record: {}", record);
    }
    log::info!(
        "Loaded {} question(s), skipped {}",
        questions.len(),
        rejected.len()
    );
    questions
}

fn partition_records(records: &[Value]) -> (Vec<Question>, Vec<&Value>) {
    let mut questions = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();
    for record in records {
        match Question::from_record(record) {
            Some(question) => questions.push(question),
            None => rejected.push(record),
        }
    }
    (questions, rejected)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    /// Serves a fixed payload, or a failure when `records` is `None`.
    pub(crate) struct StaticSource {
        pub(crate) records: Option<Vec<Value>>,
    }

    impl StaticSource {
        pub(crate) fn with(records: Vec<Value>) -> Self {
            Self {
                records: Some(records),
            }
        }

        pub(crate) fn failing() -> Self {
            Self { records: None }
        }
    }

    #[async_trait]
    impl QuestionSource for StaticSource {
        async fn fetch(&self) -> Result<Vec<Value>, LoadError> {
            self.records.clone().ok_or(LoadError::Status(500))
        }
    }

    #[test]
    fn invalid_record_is_dropped_and_reported_once() {
        let records = vec![
            json!({"type": "mc", "q": "Broken", "a": "A"}),
            json!({"type": "mc", "q": "2+2?", "op": {"A": "3", "B": "4"}, "a": "B"}),
        ];

        let (questions, rejected) = partition_records(&records);

        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].prompt(), "2+2?");
        assert_eq!(rejected, vec![&records[0]]);
    }

    #[test]
    fn valid_records_keep_their_relative_order() {
        let records = vec![
            json!({"q": "first", "op": {"A": "x"}, "a": "A"}),
            json!({"q": "dropped"}),
            json!({"type": "short", "q": "second", "keywords": ["y"]}),
            json!("not even an object"),
            json!({"q": "third", "op": {"A": "x", "B": "z"}, "a": "B"}),
        ];

        let questions = normalize(&records);

        let prompts: Vec<_> = questions.iter().map(Question::prompt).collect();
        assert_eq!(prompts, ["first", "second", "third"]);
        assert!(questions.len() <= records.len());
    }

    #[tokio::test]
    async fn fetch_questions_normalizes_payload() {
        let source = StaticSource::with(vec![
            json!({"type": "short", "q": "Capital of France?", "keywords": ["paris"]}),
            json!({"type": "short", "q": "Bad", "keywords": "paris"}),
        ]);

        let questions = fetch_questions(&source).await.expect("fetch succeeds");

        assert_eq!(questions.len(), 1);
        assert!(matches!(questions[0], Question::ShortAnswer { .. }));
    }

    #[tokio::test]
    async fn fetch_failure_is_returned_to_the_caller() {
        let result = fetch_questions(&StaticSource::failing()).await;
        assert!(matches!(result, Err(LoadError::Status(500))));
    }
}
