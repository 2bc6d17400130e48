use serde::Deserialize;
use serde_json::Value;

/// A payload entry as it arrives, before any validation. Only the fields the
/// quiz reads are kept; a `null` field counts as missing.
#[derive(Debug, Deserialize)]
pub struct RawQuestionRecord {
    #[serde(rename = "type")]
    kind: Option<Value>,
    q: Option<Value>,
    keywords: Option<Value>,
    op: Option<Value>,
    a: Option<Value>,
}

/// One selectable choice of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerOption {
    pub key: String,
    pub text: String,
}

impl AnswerOption {
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }

    /// The label shown on the option's control, e.g. `B. 4`.
    pub fn label(&self) -> String {
        format!("{}. {}", self.key, self.text)
    }
}

/// A question that passed validation.
///
/// Only [`Question::from_record`] builds these out of raw payload entries, so
/// code downstream of the loader never has to re-check optional fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Question {
    ShortAnswer {
        prompt: String,
        keywords: Vec<String>,
    },
    MultipleChoice {
        prompt: String,
        options: Vec<AnswerOption>,
        correct_text: String,
    },
}

impl Question {
    pub fn prompt(&self) -> &str {
        match self {
            Question::ShortAnswer { prompt, .. } => prompt,
            Question::MultipleChoice { prompt, .. } => prompt,
        }
    }

    /// Validates one payload entry. Anything that isn't an object is invalid.
    pub fn from_record(record: &Value) -> Option<Self> {
        let raw = RawQuestionRecord::deserialize(record).ok()?;
        Self::from_raw(raw)
    }

    /// `type == "short"` selects the short-answer shape, anything else
    /// (including a missing `type`) the multiple-choice one.
    ///
    /// Fields are checked for truthiness only. Values that aren't strings are
    /// shown the way a browser would print them.
    pub fn from_raw(raw: RawQuestionRecord) -> Option<Self> {
        let prompt = truthy(raw.q.as_ref())?;
        let prompt = display_text(prompt);

        if raw.kind.as_ref().and_then(Value::as_str) == Some("short") {
            // An empty keyword list is allowed: every answer matches it.
            let keywords = raw
                .keywords?
                .as_array()?
                .iter()
                .map(display_text)
                .collect();
            return Some(Question::ShortAnswer { prompt, keywords });
        }

        let raw_options = truthy(raw.op.as_ref())?;
        let answer_key = display_text(truthy(raw.a.as_ref())?);
        let options = collect_options(raw_options)?;
        let correct = options.iter().position(|option| option.key == answer_key)?;
        truthy(option_value(raw_options, correct))?;
        let correct_text = options[correct].text.clone();

        Some(Question::MultipleChoice {
            prompt,
            options,
            correct_text,
        })
    }
}

/// Options come from an object (keys in payload order, via serde_json's
/// `preserve_order`) or an array (keys are the indices).
fn collect_options(raw: &Value) -> Option<Vec<AnswerOption>> {
    match raw {
        Value::Object(map) => Some(
            map.iter()
                .map(|(key, value)| AnswerOption::new(key.clone(), display_text(value)))
                .collect(),
        ),
        Value::Array(items) => Some(
            items
                .iter()
                .enumerate()
                .map(|(index, value)| AnswerOption::new(index.to_string(), display_text(value)))
                .collect(),
        ),
        _ => None,
    }
}

fn option_value(raw: &Value, position: usize) -> Option<&Value> {
    match raw {
        Value::Object(map) => map.values().nth(position),
        Value::Array(items) => items.get(position),
        _ => None,
    }
}

/// `Some(value)` when the field is present and truthy: `true`, a non-zero
/// number, a non-empty string, or any array or object.
fn truthy(value: Option<&Value>) -> Option<&Value> {
    let value = value?;
    let is_truthy = match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map_or(true, |n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    };
    is_truthy.then_some(value)
}

/// Text a browser shows for a JSON value placed in the page.
fn display_text(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => match number.as_f64() {
            Some(n) if number.is_f64() && n.fract() == 0.0 && n.abs() < 1e15 => {
                format!("{}", n as i64)
            }
            _ => number.to_string(),
        },
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_text(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn multiple_choice_record_resolves_correct_text() {
        let record = json!({"type": "mc", "q": "2+2?", "op": {"A": "3", "B": "4"}, "a": "B"});

        let question = Question::from_record(&record).expect("valid record");

        assert_eq!(
            question,
            Question::MultipleChoice {
                prompt: "2+2?".to_string(),
                options: vec![AnswerOption::new("A", "3"), AnswerOption::new("B", "4")],
                correct_text: "4".to_string(),
            }
        );
    }

    #[test]
    fn options_keep_payload_order() {
        let record = json!({"q": "Pick", "op": {"C": "c", "A": "a", "B": "b"}, "a": "A"});

        let Some(Question::MultipleChoice { options, .. }) = Question::from_record(&record) else {
            panic!("expected a multiple-choice question");
        };

        let keys: Vec<_> = options.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, ["C", "A", "B"]);
        assert_eq!(options[0].label(), "C. c");
    }

    #[test]
    fn missing_type_defaults_to_multiple_choice() {
        let record = json!({"q": "Sky?", "op": {"A": "blue"}, "a": "A"});

        assert!(matches!(
            Question::from_record(&record),
            Some(Question::MultipleChoice { .. })
        ));
    }

    #[test]
    fn multiple_choice_without_answer_key_is_rejected() {
        let record = json!({"q": "2+2?", "op": {"A": "3", "B": "4"}});
        assert_eq!(Question::from_record(&record), None);
    }

    #[test]
    fn answer_key_absent_from_options_is_rejected() {
        let record = json!({"q": "2+2?", "op": {"A": "3", "B": "4"}, "a": "C"});
        assert_eq!(Question::from_record(&record), None);
    }

    #[test]
    fn empty_correct_option_text_is_rejected() {
        let record = json!({"q": "2+2?", "op": {"A": "", "B": "4"}, "a": "A"});
        assert_eq!(Question::from_record(&record), None);
    }

    #[test]
    fn missing_or_empty_prompt_is_rejected() {
        assert_eq!(
            Question::from_record(&json!({"op": {"A": "x"}, "a": "A"})),
            None
        );
        assert_eq!(
            Question::from_record(&json!({"q": "", "op": {"A": "x"}, "a": "A"})),
            None
        );
    }

    #[test]
    fn short_answer_record_keeps_keywords() {
        let record = json!({"type": "short", "q": "Capital of France?", "keywords": ["paris"]});

        assert_eq!(
            Question::from_record(&record),
            Some(Question::ShortAnswer {
                prompt: "Capital of France?".to_string(),
                keywords: vec!["paris".to_string()],
            })
        );
    }

    #[test]
    fn short_answer_with_non_sequence_keywords_is_rejected() {
        for keywords in [json!("paris"), json!({"0": "paris"}), json!(null), json!(3)] {
            let record = json!({"type": "short", "q": "Capital?", "keywords": keywords.clone()});
            assert_eq!(Question::from_record(&record), None, "keywords = {keywords}");
        }

        let record = json!({"type": "short", "q": "Capital?"});
        assert_eq!(Question::from_record(&record), None);
    }

    #[test]
    fn short_answer_with_empty_keywords_is_accepted() {
        let record = json!({"type": "short", "q": "Anything?", "keywords": []});
        assert!(matches!(
            Question::from_record(&record),
            Some(Question::ShortAnswer { keywords, .. }) if keywords.is_empty()
        ));
    }

    #[test]
    fn numeric_answer_key_and_option_values_are_accepted() {
        let record = json!({"q": "1+1?", "op": {"1": 2, "2": 3}, "a": 1});

        let Some(Question::MultipleChoice { correct_text, .. }) = Question::from_record(&record)
        else {
            panic!("expected a multiple-choice question");
        };
        assert_eq!(correct_text, "2");
    }

    #[test]
    fn non_string_option_values_keep_the_record() {
        let record = json!({"q": "2+2?", "op": {"A": "4", "B": null, "C": [1, 2], "D": {"x": 1}}, "a": "A"});

        let Some(Question::MultipleChoice { options, correct_text, .. }) =
            Question::from_record(&record)
        else {
            panic!("record should stay in the quiz");
        };

        assert_eq!(correct_text, "4");
        let labels: Vec<_> = options.iter().map(AnswerOption::label).collect();
        assert_eq!(labels, ["A. 4", "B. null", "C. 1,2", "D. [object Object]"]);
    }

    #[test]
    fn truthy_non_string_prompt_is_accepted() {
        let record = json!({"q": true, "op": {"A": "4"}, "a": "A"});

        let question = Question::from_record(&record).expect("true is a truthy prompt");
        assert_eq!(question.prompt(), "true");

        let record = json!({"q": false, "op": {"A": "4"}, "a": "A"});
        assert_eq!(Question::from_record(&record), None);
    }

    #[test]
    fn null_correct_option_is_rejected() {
        let record = json!({"q": "2+2?", "op": {"A": null, "B": "4"}, "a": "A"});
        assert_eq!(Question::from_record(&record), None);
    }

    #[test]
    fn array_options_are_keyed_by_index() {
        let record = json!({"q": "Pick", "op": ["x", "y"], "a": 1});

        let Some(Question::MultipleChoice { options, correct_text, .. }) =
            Question::from_record(&record)
        else {
            panic!("expected a multiple-choice question");
        };

        assert_eq!(correct_text, "y");
        assert_eq!(options[0], AnswerOption::new("0", "x"));
    }

    #[test]
    fn non_string_keywords_are_printed() {
        let record = json!({"type": "short", "q": "Year?", "keywords": [1969]});

        assert_eq!(
            Question::from_record(&record),
            Some(Question::ShortAnswer {
                prompt: "Year?".to_string(),
                keywords: vec!["1969".to_string()],
            })
        );
    }

    #[test]
    fn non_object_record_is_rejected() {
        assert_eq!(Question::from_record(&json!("2+2?")), None);
        assert_eq!(Question::from_record(&json!(null)), None);
    }
}
