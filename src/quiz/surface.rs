/// Named region of the page the quiz writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    /// Only written when the other regions are missing.
    QuestionContainer,
    QuestionText,
    Answers,
    ScoreValue,
}

pub const ALL_REGIONS: [Region; 4] = [
    Region::QuestionContainer,
    Region::QuestionText,
    Region::Answers,
    Region::ScoreValue,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mark {
    Correct,
    Wrong,
}

/// An interactive element inside the answers region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Option {
        key: String,
        label: String,
        mark: Option<Mark>,
        disabled: bool,
    },
    TextInput {
        placeholder: String,
        disabled: bool,
    },
    Submit {
        label: String,
        disabled: bool,
    },
}

impl Control {
    pub fn option(key: impl Into<String>, label: impl Into<String>) -> Self {
        Control::Option {
            key: key.into(),
            label: label.into(),
            mark: None,
            disabled: false,
        }
    }

    #[cfg(test)]
    pub fn is_disabled(&self) -> bool {
        match self {
            Control::Option { disabled, .. }
            | Control::TextInput { disabled, .. }
            | Control::Submit { disabled, .. } => *disabled,
        }
    }

    fn disable(&mut self) {
        match self {
            Control::Option { disabled, .. }
            | Control::TextInput { disabled, .. }
            | Control::Submit { disabled, .. } => *disabled = true,
        }
    }
}

/// What the quiz controller draws on. Hosts implement this for whatever
/// actually shows the quiz.
pub trait RenderSurface {
    fn missing_regions(&self) -> Vec<Region>;
    fn show_container_error(&mut self, message: &str);
    fn set_question_text(&mut self, text: &str);
    /// Removes every control from the answers region.
    fn clear_answers(&mut self);
    fn push_control(&mut self, control: Control);
    /// Returns `false` when no option control has `key`.
    fn mark_option(&mut self, key: &str, mark: Mark) -> bool;
    fn disable_answers(&mut self);
    fn set_score(&mut self, score: u32);
    /// Non-blocking feedback for the user.
    fn notify(&mut self, message: &str);
}

/// A region update recorded by [`Board`] for a host to replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    ContainerError(String),
    QuestionText,
    AnswersReplaced,
    AnswersUpdated,
    Score,
    Notice(String),
}

/// In-memory model of the four regions.
///
/// Every write is also appended to a change journal, drained with
/// [`Board::take_changes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    regions: Vec<Region>,
    container_error: Option<String>,
    question_text: String,
    controls: Vec<Control>,
    score: Option<u32>,
    notices: Vec<String>,
    changes: Vec<Change>,
}

impl Default for Board {
    fn default() -> Self {
        Self::with_regions(&ALL_REGIONS)
    }
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_regions(regions: &[Region]) -> Self {
        Self {
            regions: regions.to_vec(),
            container_error: None,
            question_text: String::new(),
            controls: Vec::new(),
            score: None,
            notices: Vec::new(),
            changes: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn container_error(&self) -> Option<&str> {
        self.container_error.as_deref()
    }

    pub fn question_text(&self) -> &str {
        &self.question_text
    }

    pub fn controls(&self) -> &[Control] {
        &self.controls
    }

    pub fn score(&self) -> Option<u32> {
        self.score
    }

    /// Every notification shown so far, oldest first.
    #[cfg(test)]
    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    /// Key of the `position`-th option control, counting options only.
    pub fn option_key(&self, position: usize) -> Option<&str> {
        self.controls
            .iter()
            .filter_map(|control| match control {
                Control::Option { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .nth(position)
    }

    #[cfg(test)]
    pub fn option(&self, key: &str) -> Option<&Control> {
        self.controls
            .iter()
            .find(|control| matches!(control, Control::Option { key: k, .. } if k == key))
    }

    pub fn take_changes(&mut self) -> Vec<Change> {
        std::mem::take(&mut self.changes)
    }

    fn record(&mut self, change: Change) {
        if self.changes.last() != Some(&change) {
            self.changes.push(change);
        }
    }
}

impl RenderSurface for Board {
    fn missing_regions(&self) -> Vec<Region> {
        ALL_REGIONS
            .into_iter()
            .filter(|region| !self.regions.contains(region))
            .collect()
    }

    fn show_container_error(&mut self, message: &str) {
        self.container_error = Some(message.to_string());
        self.record(Change::ContainerError(message.to_string()));
    }

    fn set_question_text(&mut self, text: &str) {
        self.question_text = text.to_string();
        self.record(Change::QuestionText);
    }

    fn clear_answers(&mut self) {
        self.controls.clear();
        self.record(Change::AnswersReplaced);
    }

    fn push_control(&mut self, control: Control) {
        self.controls.push(control);
        self.record(Change::AnswersReplaced);
    }

    fn mark_option(&mut self, key: &str, new_mark: Mark) -> bool {
        let target = self.controls.iter_mut().find_map(|control| match control {
            Control::Option { key: k, mark, .. } if k == key => Some(mark),
            _ => None,
        });
        match target {
            Some(mark) => {
                *mark = Some(new_mark);
                self.record(Change::AnswersUpdated);
                true
            }
            None => false,
        }
    }

    fn disable_answers(&mut self) {
        self.controls.iter_mut().for_each(Control::disable);
        self.record(Change::AnswersUpdated);
    }

    fn set_score(&mut self, score: u32) {
        self.score = Some(score);
        self.record(Change::Score);
    }

    fn notify(&mut self, message: &str) {
        self.notices.push(message.to_string());
        self.changes.push(Change::Notice(message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_board_has_no_missing_regions() {
        assert!(Board::new().missing_regions().is_empty());
    }

    #[test]
    fn reports_regions_left_out() {
        let board = Board::with_regions(&[Region::QuestionContainer, Region::QuestionText]);

        assert_eq!(
            board.missing_regions(),
            vec![Region::Answers, Region::ScoreValue]
        );
    }

    #[test]
    fn marking_unknown_option_changes_nothing() {
        let mut board = Board::new();
        board.push_control(Control::option("A", "A. 3"));
        board.take_changes();

        assert!(!board.mark_option("Z", Mark::Correct));
        assert!(board.take_changes().is_empty());
        assert_eq!(board.option("A"), Some(&Control::option("A", "A. 3")));
    }

    #[test]
    fn disable_covers_every_control() {
        let mut board = Board::new();
        board.push_control(Control::TextInput {
            placeholder: "...".to_string(),
            disabled: false,
        });
        board.push_control(Control::Submit {
            label: "Send".to_string(),
            disabled: false,
        });

        board.disable_answers();

        assert!(board.controls().iter().all(Control::is_disabled));
    }

    #[test]
    fn journal_collapses_repeated_changes() {
        let mut board = Board::new();
        board.clear_answers();
        board.push_control(Control::option("A", "A. x"));
        board.push_control(Control::option("B", "B. y"));
        board.set_question_text("Q");

        assert_eq!(
            board.take_changes(),
            vec![Change::AnswersReplaced, Change::QuestionText]
        );
        assert!(board.take_changes().is_empty());
    }

    #[test]
    fn option_key_counts_option_controls_only() {
        let mut board = Board::new();
        board.push_control(Control::TextInput {
            placeholder: "...".to_string(),
            disabled: false,
        });
        board.push_control(Control::option("long answer key", "x"));
        board.push_control(Control::option("B", "y"));

        assert_eq!(board.option_key(0), Some("long answer key"));
        assert_eq!(board.option_key(1), Some("B"));
        assert_eq!(board.option_key(2), None);
    }
}
