use thiserror::Error;

use super::surface::Region;

/// Why the question payload could not be fetched. The controller treats all
/// of these the same way.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered with status {0}")]
    Status(u16),
    #[error("payload is not a list of records: {0}")]
    Decode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuizError {
    #[error("render regions are missing: {0:?}")]
    MissingRegions(Vec<Region>),
    #[error("the quiz is not accepting input right now")]
    NotAcceptingInput,
    #[error("no option with key {0:?}")]
    UnknownOption(String),
    #[error("the current question does not take this kind of answer")]
    WrongQuestionKind,
}
