use std::time::Duration;

use super::error::QuizError;
use super::grading;
use super::loader::{self, QuestionSource};
use super::question::Question;
use super::surface::{Control, Mark, RenderSurface};

pub const LOAD_FAILED_TEXT: &str = "Không thể tải câu hỏi. Vui lòng thử lại.";
pub const NO_QUESTIONS_TEXT: &str = "Không có câu hỏi nào để hiển thị.";
pub const MISSING_REGIONS_TEXT: &str = "Lỗi: Không tìm thấy các phần tử giao diện cần thiết.";
pub const SHORT_ANSWER_PLACEHOLDER: &str = "Nhập câu trả lời của bạn...";
pub const SUBMIT_LABEL: &str = "Gửi";
pub const CORRECT_TEXT: &str = "Trả lời đúng!";
pub const INCORRECT_TEXT: &str = "Trả lời chưa chính xác.";

pub fn finished_text(score: u32, total: usize) -> String {
    format!("Hoàn thành! Bạn đạt {}/{} điểm.", score, total)
}

/// How long graded feedback stays up before the next question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delays {
    pub choice: Duration,
    pub short_answer: Duration,
}

impl Default for Delays {
    fn default() -> Self {
        Self {
            choice: Duration::from_millis(2000),
            short_answer: Duration::from_millis(1000),
        }
    }
}

/// Questions plus progress through them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizSession {
    questions: Vec<Question>,
    current_index: usize,
    score: u32,
}

impl QuizSession {
    #[cfg(test)]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[cfg(test)]
    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.current_index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Loading,
    /// Showing the current question and waiting for an answer.
    Presenting,
    /// Answer graded; controls locked until the scheduled advance fires.
    Locked,
    Finished,
    /// Nothing to run: load failed, no questions, or regions missing.
    Halted,
}

/// A pending move to the next question.
///
/// The host waits out `delay` and hands the ticket back to
/// [`QuizController::advance`]. Tickets from before a reset, or superseded by
/// a later one, are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledAdvance {
    pub generation: u64,
    pub delay: Duration,
}

impl ScheduledAdvance {
    pub async fn elapsed(self) -> Self {
        tokio::time::sleep(self.delay).await;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizController {
    session: QuizSession,
    phase: Phase,
    generation: u64,
    delays: Delays,
}

impl QuizController {
    pub fn new(delays: Delays) -> Self {
        Self {
            session: QuizSession::default(),
            phase: Phase::Loading,
            generation: 0,
            delays,
        }
    }

    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Checks that every region exists. On failure the error is written to
    /// the container region and the controller halts.
    pub fn mount(&mut self, surface: &mut impl RenderSurface) -> Result<(), QuizError> {
        let missing = surface.missing_regions();
        if missing.is_empty() {
            return Ok(());
        }
        log::error!("Render regions are missing: {:?}", missing);
        surface.show_container_error(MISSING_REGIONS_TEXT);
        self.phase = Phase::Halted;
        Err(QuizError::MissingRegions(missing))
    }

    /// Fetches questions and presents the first one. Fetch failures end up on
    /// the question text region; they never reach the caller.
    pub async fn load<S>(
        &mut self,
        source: &dyn QuestionSource,
        surface: &mut S,
    ) -> Result<(), QuizError>
    where
        S: RenderSurface + Send,
    {
        if self.phase != Phase::Loading {
            return Err(QuizError::NotAcceptingInput);
        }
        match loader::fetch_questions(source).await {
            Ok(questions) => self.start(questions, surface),
            Err(err) => {
                log::error!("Failed to load questions: {}", err);
                surface.set_question_text(LOAD_FAILED_TEXT);
                self.phase = Phase::Halted;
            }
        }
        Ok(())
    }

    /// Takes the loaded questions and enters the first question, or halts
    /// with a notice when there are none.
    pub fn start(&mut self, questions: Vec<Question>, surface: &mut impl RenderSurface) {
        self.session = QuizSession {
            questions,
            current_index: 0,
            score: 0,
        };
        if self.session.questions.is_empty() {
            surface.clear_answers();
            surface.set_question_text(NO_QUESTIONS_TEXT);
            self.phase = Phase::Halted;
            return;
        }
        self.present(surface);
    }

    pub fn select_option(
        &mut self,
        key: &str,
        surface: &mut impl RenderSurface,
    ) -> Result<ScheduledAdvance, QuizError> {
        if self.phase != Phase::Presenting {
            return Err(QuizError::NotAcceptingInput);
        }
        let Some(Question::MultipleChoice {
            options,
            correct_text,
            ..
        }) = self.session.current()
        else {
            return Err(QuizError::WrongQuestionKind);
        };
        let selected = options
            .iter()
            .find(|option| option.key == key)
            .ok_or_else(|| QuizError::UnknownOption(key.to_string()))?;

        if grading::choice_is_correct(&selected.text, correct_text) {
            surface.mark_option(&selected.key, Mark::Correct);
            self.session.score += 1;
        } else {
            surface.mark_option(&selected.key, Mark::Wrong);
            let revealed = options
                .iter()
                .find(|option| option.text == *correct_text)
                .is_some_and(|option| surface.mark_option(&option.key, Mark::Correct));
            if !revealed {
                log::debug!("No control holds the correct answer {:?}", correct_text);
            }
        }

        surface.set_score(self.session.score);
        surface.disable_answers();
        Ok(self.schedule(self.delays.choice))
    }

    /// Grades free text. Further input is refused until the advance.
    pub fn submit_short_answer(
        &mut self,
        input: &str,
        surface: &mut impl RenderSurface,
    ) -> Result<ScheduledAdvance, QuizError> {
        if self.phase != Phase::Presenting {
            return Err(QuizError::NotAcceptingInput);
        }
        let Some(Question::ShortAnswer { keywords, .. }) = self.session.current() else {
            return Err(QuizError::WrongQuestionKind);
        };

        if grading::short_answer_matches(input, keywords) {
            surface.notify(CORRECT_TEXT);
            self.session.score += 1;
        } else {
            surface.notify(INCORRECT_TEXT);
        }

        surface.set_score(self.session.score);
        surface.disable_answers();
        Ok(self.schedule(self.delays.short_answer))
    }

    /// Moves to the next question, or to the summary after the last one.
    /// Returns `false` for a stale ticket.
    pub fn advance(&mut self, ticket: ScheduledAdvance, surface: &mut impl RenderSurface) -> bool {
        if self.phase != Phase::Locked || ticket.generation != self.generation {
            log::debug!(
                "Ignoring stale advance (ticket {}, current {})",
                ticket.generation,
                self.generation
            );
            return false;
        }
        self.session.current_index += 1;
        self.present(surface);
        true
    }

    /// Drops the session and invalidates any pending advance. A following
    /// [`QuizController::load`] starts over.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.session = QuizSession::default();
        self.phase = Phase::Loading;
    }

    fn schedule(&mut self, delay: Duration) -> ScheduledAdvance {
        self.generation += 1;
        self.phase = Phase::Locked;
        ScheduledAdvance {
            generation: self.generation,
            delay,
        }
    }

    fn present(&mut self, surface: &mut impl RenderSurface) {
        surface.clear_answers();

        let Some(question) = self.session.current() else {
            surface.set_question_text(&finished_text(
                self.session.score,
                self.session.questions.len(),
            ));
            self.phase = Phase::Finished;
            return;
        };

        surface.set_question_text(question.prompt());
        match question {
            Question::MultipleChoice { options, .. } => {
                for option in options {
                    surface.push_control(Control::option(option.key.clone(), option.label()));
                }
            }
            Question::ShortAnswer { .. } => {
                surface.push_control(Control::TextInput {
                    placeholder: SHORT_ANSWER_PLACEHOLDER.to_string(),
                    disabled: false,
                });
                surface.push_control(Control::Submit {
                    label: SUBMIT_LABEL.to_string(),
                    disabled: false,
                });
            }
        }
        self.phase = Phase::Presenting;
    }
}
