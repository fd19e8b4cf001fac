//! Commit message extraction from `git commit` command text.

use super::shell::{heredoc_bodies, split_commands};
use super::tokenize::{split_env_prefix, tokenize, try_tokenize};

/// What a Bash command says about a commit message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitMessage {
    /// The command does not run `git commit`.
    NotCommit,
    /// A commit whose message cannot be read confidently from the command
    /// text (editor, `-F path`, `$(cat file)`, unbalanced quotes).
    Unresolved,
    /// The literal commit message.
    Literal(String),
}

/// Git global options that consume the following word.
const GIT_OPTS_WITH_VALUE: &[&str] = &["-C", "-c", "--git-dir", "--work-tree", "--namespace"];

/// Find the first `git commit` in a (possibly compound) command and
/// extract its message.
pub fn extract_commit_message(command: &str) -> CommitMessage {
    let chain = split_commands(command);
    for segment in &chain.segments {
        let parsed = try_tokenize(segment);
        let words = parsed.clone().unwrap_or_else(|| tokenize(segment));
        let Some(args) = commit_args(&words) else {
            continue;
        };
        if parsed.is_none() {
            return CommitMessage::Unresolved;
        }
        return message_from_args(args, segment);
    }
    CommitMessage::NotCommit
}

/// If `words` run `git [global opts] commit`, return the words after `commit`.
fn commit_args(words: &[String]) -> Option<&[String]> {
    let (_, rest) = split_env_prefix(words);
    let program = rest.first()?;
    let base = program.rsplit('/').next().unwrap_or(program);
    if base != "git" {
        return None;
    }

    let mut i = 1;
    while i < rest.len() {
        let word = rest[i].as_str();
        if GIT_OPTS_WITH_VALUE.contains(&word) {
            i += 2;
            continue;
        }
        if word.starts_with('-') {
            i += 1;
            continue;
        }
        return (word == "commit").then(|| &rest[i + 1..]);
    }
    None
}

/// `git commit` short options that take a value (attached or next word).
const SHORT_WITH_VALUE: &[char] = &['m', 'F', 'C', 'c', 't'];

/// Short options whose value, if any, must be attached (`-S<keyid>`).
const SHORT_OPTIONAL_VALUE: &[char] = &['S', 'u'];

/// `git commit` long options that take a value when not written `--opt=value`.
const LONG_WITH_VALUE: &[&str] = &[
    "message",
    "file",
    "reuse-message",
    "reedit-message",
    "template",
    "author",
    "date",
    "cleanup",
    "fixup",
    "squash",
    "trailer",
    "pathspec-from-file",
];

/// Walk a short-option cluster (`am`, `Skey`, `mmsg`) up to the first
/// option that takes a value, returning it with its attached suffix.
///
/// `None` when the cluster holds only switches or ends in an option whose
/// value can only be attached.
fn short_option(cluster: &str) -> Option<(char, &str)> {
    for (idx, flag) in cluster.char_indices() {
        if SHORT_WITH_VALUE.contains(&flag) {
            return Some((flag, &cluster[idx + flag.len_utf8()..]));
        }
        if SHORT_OPTIONAL_VALUE.contains(&flag) {
            return None;
        }
    }
    None
}

/// Collect `-m`/`--message` values; resolve `-F -` from the segment's heredoc.
fn message_from_args(args: &[String], segment: &str) -> CommitMessage {
    let mut parts: Vec<String> = Vec::new();
    let mut from_stdin = false;
    let mut elsewhere = false;

    let mut iter = args.iter();
    while let Some(word) = iter.next() {
        let word = word.as_str();
        if word == "--" {
            break;
        }

        let (option, inline) = if let Some(long) = word.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            if !LONG_WITH_VALUE.contains(&name) {
                continue;
            }
            (name, inline)
        } else if let Some(cluster) = word.strip_prefix('-') {
            let Some((flag, attached)) = short_option(cluster) else {
                continue;
            };
            let name = match flag {
                'm' => "message",
                'F' => "file",
                'C' => "reuse-message",
                'c' => "reedit-message",
                _ => "template",
            };
            (name, (!attached.is_empty()).then_some(attached))
        } else {
            continue;
        };

        let value = match inline {
            Some(value) => value.to_string(),
            None => match iter.next() {
                Some(value) => value.clone(),
                None => return CommitMessage::Unresolved,
            },
        };
        match option {
            "message" => parts.push(value),
            "file" if value == "-" => from_stdin = true,
            "file" | "reuse-message" | "reedit-message" => elsewhere = true,
            _ => {}
        }
    }

    if elsewhere {
        return CommitMessage::Unresolved;
    }

    if from_stdin {
        if !parts.is_empty() {
            return CommitMessage::Unresolved;
        }
        return match heredoc_bodies(segment).as_slice() {
            [body] => CommitMessage::Literal(body.clone()),
            _ => CommitMessage::Unresolved,
        };
    }

    let mut paragraphs = Vec::with_capacity(parts.len());
    for part in parts {
        if part.contains("$(") || part.contains('`') {
            match substituted_heredoc(&part) {
                Some(body) => paragraphs.push(body),
                None => return CommitMessage::Unresolved,
            }
        } else {
            paragraphs.push(part);
        }
    }

    if paragraphs.is_empty() {
        return CommitMessage::Unresolved;
    }
    CommitMessage::Literal(paragraphs.join("\n\n"))
}

/// The body of a value that is exactly one `$(cat <<EOF ... EOF)` substitution.
fn substituted_heredoc(value: &str) -> Option<String> {
    let value = value.trim();
    if !value.starts_with("$(") || !value.ends_with(')') {
        return None;
    }
    match heredoc_bodies(value).as_slice() {
        [body] => Some(body.clone()),
        _ => None,
    }
}

/// The first line of a commit message.
pub fn subject_line(message: &str) -> &str {
    message.trim_start_matches('\n').lines().next().unwrap_or("").trim_end()
}
