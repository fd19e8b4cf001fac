/// True if `word` is a shell `NAME=value` assignment.
pub fn is_env_assignment(word: &str) -> bool {
    let Some((name, _)) = word.split_once('=') else {
        return false;
    };
    !name.is_empty()
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
}

/// Tokenize a command segment into words using shlex (POSIX word splitting).
///
/// Returns `None` when shlex cannot parse the text (e.g. unbalanced quotes).
pub fn try_tokenize(command: &str) -> Option<Vec<String>> {
    shlex::split(command)
}

/// Tokenize a command segment, falling back to whitespace splitting.
pub fn tokenize(command: &str) -> Vec<String> {
    try_tokenize(command).unwrap_or_else(|| {
        // Fallback: simple whitespace splitting if shlex can't parse
        command.split_whitespace().map(String::from).collect()
    })
}

/// Split leading `NAME=value` words off a tokenized command.
///
/// Returns the assignments and the remaining words (command first).
pub fn split_env_prefix(words: &[String]) -> (&[String], &[String]) {
    let n = words.iter().take_while(|w| is_env_assignment(w)).count();
    words.split_at(n)
}
