pub mod controller;
pub mod error;
pub mod grading;
pub mod loader;
pub mod question;
pub mod surface;

pub use controller::{Delays, QuizController, ScheduledAdvance};
pub use loader::{HttpQuestionSource, QuestionSource};
pub use surface::Board;
