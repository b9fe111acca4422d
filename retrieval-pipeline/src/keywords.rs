/// Words that carry no retrieval signal in conversational questions.
pub const STOP_WORDS: [&str; 12] = [
    "tell", "about", "what", "how", "the", "and", "for", "with", "you", "your", "me", "my",
];

/// Lowercases, replaces anything outside ASCII word characters and whitespace
/// with a space, and keeps tokens longer than one character that are not stop
/// words. Order of appearance is kept.
pub fn extract_keywords(query: &str) -> Vec<String> {
    let normalized: String = query
        .to_lowercase()
        .chars()
        .map(|c| {
            if is_word_char(c) || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();

    normalized
        .split_whitespace()
        .filter(|word| word.chars().count() > 1 && !STOP_WORDS.contains(word))
        .map(str::to_owned)
        .collect()
}

/// Alternation pattern matching any of the keywords.
pub fn keyword_pattern(keywords: &[String]) -> Option<String> {
    if keywords.is_empty() {
        None
    } else {
        Some(keywords.join("|"))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
