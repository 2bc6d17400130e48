/// Trims and lowercases free-text input before keyword matching.
pub fn normalize_input(input: &str) -> String {
    input.trim().to_lowercase()
}

/// A short answer is correct when every keyword occurs in it, ignoring case.
pub fn short_answer_matches(input: &str, keywords: &[String]) -> bool {
    let normalized = normalize_input(input);
    keywords
        .iter()
        .all(|keyword| normalized.contains(&keyword.to_lowercase()))
}

/// Multiple-choice answers compare option text, not keys.
pub fn choice_is_correct(selected_text: &str, correct_text: &str) -> bool {
    selected_text == correct_text
}
