use super::types::{CommandChain, Operator};

/// Split a command at shell operators (&&, ||, ;, |, |&, newline),
/// respecting single/double quotes, backslash escapes, `$(...)` nesting
/// and heredoc bodies.
///
/// A multi-line `-m "..."` message stays within its segment, and a heredoc
/// body is attached to the segment that declared the heredoc.
pub fn split_commands(command: &str) -> CommandChain {
    let mut segments: Vec<String> = Vec::new();
    let mut operators = Vec::new();
    let mut buf = String::new();

    let chars: Vec<char> = command.chars().collect();
    let len = chars.len();
    let mut i = 0;
    let (mut sq, mut dq, mut esc) = (false, false, false);
    let mut depth: u32 = 0;
    // Declared heredocs awaiting their body: delimiter, tab stripping,
    // index of the declaring segment
    let mut pending: Vec<(String, bool, usize)> = Vec::new();

    while i < len {
        let c = chars[i];

        if esc {
            buf.push(c);
            esc = false;
            i += 1;
            continue;
        }

        // Newline after a heredoc operator: each body goes verbatim to the
        // segment that declared it, which may already be flushed
        if c == '\n' && !sq && !pending.is_empty() {
            let mut end = i;
            for (delim, strip_tabs, owner) in pending.drain(..) {
                let next = heredoc_span(&chars, end + 1, &delim, strip_tabs).1;
                let body: String = chars[end..next].iter().collect();
                match segments.get_mut(owner) {
                    Some(segment) => segment.push_str(&body),
                    None => buf.push_str(&body),
                }
                end = next;
            }
            i = end;
            continue;
        }

        if c == '\\' && !sq {
            esc = true;
            buf.push(c);
            i += 1;
            continue;
        }
        if c == '\'' && !dq {
            sq = !sq;
            buf.push(c);
            i += 1;
            continue;
        }
        if c == '"' && !sq {
            dq = !dq;
            buf.push(c);
            i += 1;
            continue;
        }
        if sq {
            buf.push(c);
            i += 1;
            continue;
        }

        if c == '<'
            && (!dq || depth > 0)
            && let Some((delim, strip_tabs, next)) = heredoc_start(&chars, i)
        {
            pending.push((delim, strip_tabs, segments.len()));
            buf.extend(&chars[i..next]);
            i = next;
            continue;
        }

        // $( opens a substitution even inside double quotes
        if c == '$' && i + 1 < len && chars[i + 1] == '(' {
            depth += 1;
            buf.push_str("$(");
            i += 2;
            continue;
        }
        if depth > 0 {
            if c == '(' {
                depth += 1;
            } else if c == ')' {
                depth -= 1;
            }
        }
        if dq || depth > 0 {
            buf.push(c);
            i += 1;
            continue;
        }

        // Two-char operators
        if i + 1 < len {
            let op = match (c, chars[i + 1]) {
                ('&', '&') => Some(Operator::And),
                ('|', '|') => Some(Operator::Or),
                ('|', '&') => Some(Operator::PipeErr),
                _ => None,
            };
            if let Some(op) = op {
                flush(&mut buf, &mut segments);
                operators.push(op);
                i += 2;
                continue;
            }
        }

        // Single-char operators
        let op = match c {
            '|' => Some(Operator::Pipe),
            ';' | '\n' => Some(Operator::Semi),
            _ => None,
        };
        if let Some(op) = op {
            flush(&mut buf, &mut segments);
            operators.push(op);
            i += 1;
            continue;
        }

        buf.push(c);
        i += 1;
    }

    flush(&mut buf, &mut segments);

    CommandChain {
        segments,
        operators,
    }
}

/// Move the trimmed buffer into `segments` (dropping empties) and reset it.
fn flush(buf: &mut String, segments: &mut Vec<String>) {
    let trimmed = buf.trim();
    if !trimmed.is_empty() {
        segments.push(trimmed.to_string());
    }
    buf.clear();
}

/// Parse a heredoc operator (`<<WORD`, `<<-WORD`, `<<'WORD'`, `<<"WORD"`)
/// at `chars[i]`. Here-strings (`<<<`) are not heredocs.
///
/// Returns the delimiter, whether leading tabs are stripped, and the index
/// just past the delimiter word.
fn heredoc_start(chars: &[char], i: usize) -> Option<(String, bool, usize)> {
    if chars.get(i) != Some(&'<') || chars.get(i + 1) != Some(&'<') {
        return None;
    }
    if i > 0 && chars[i - 1] == '<' {
        return None;
    }
    let mut j = i + 2;
    if chars.get(j) == Some(&'<') {
        return None;
    }
    let strip_tabs = chars.get(j) == Some(&'-');
    if strip_tabs {
        j += 1;
    }
    while chars.get(j).is_some_and(|c| *c == ' ' || *c == '\t') {
        j += 1;
    }
    let quote = match chars.get(j) {
        Some(&q) if q == '\'' || q == '"' => {
            j += 1;
            Some(q)
        }
        _ => None,
    };

    let mut delim = String::new();
    while let Some(&c) = chars.get(j) {
        match quote {
            Some(q) if c == q => {
                j += 1;
                break;
            }
            Some(_) => {}
            None if c.is_whitespace() || matches!(c, ';' | '|' | '&' | '(' | ')' | '<' | '>') => {
                break;
            }
            None => {}
        }
        delim.push(c);
        j += 1;
    }

    if delim.is_empty() {
        None
    } else {
        Some((delim, strip_tabs, j))
    }
}

/// Read heredoc lines starting at `start` until the terminator line.
///
/// Returns the body (without the terminator) and the index of the newline
/// ending the terminator line, or the end of input if it is unterminated.
fn heredoc_span(chars: &[char], start: usize, delim: &str, strip_tabs: bool) -> (String, usize) {
    let len = chars.len();
    let mut lines = Vec::new();
    let mut j = start.min(len);

    while j < len {
        let line_end = chars[j..]
            .iter()
            .position(|c| *c == '\n')
            .map_or(len, |p| j + p);
        let raw: String = chars[j..line_end].iter().collect();
        let line = if strip_tabs {
            raw.trim_start_matches('\t').to_string()
        } else {
            raw
        };
        if line.trim_end() == delim {
            return (lines.join("\n"), line_end);
        }
        lines.push(line);
        j = line_end + 1;
    }

    (lines.join("\n"), len)
}

/// Extract the bodies of every heredoc in a command, in order of appearance.
pub fn heredoc_bodies(command: &str) -> Vec<String> {
    let chars: Vec<char> = command.chars().collect();
    let mut bodies = Vec::new();
    let mut pending: Vec<(String, bool)> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '\n' && !pending.is_empty() {
            let mut end = i;
            for (delim, strip_tabs) in pending.drain(..) {
                let (body, next) = heredoc_span(&chars, end + 1, &delim, strip_tabs);
                bodies.push(body);
                end = next;
            }
            i = end + 1;
            continue;
        }
        if let Some((delim, strip_tabs, next)) = heredoc_start(&chars, i) {
            pending.push((delim, strip_tabs));
            i = next;
            continue;
        }
        i += 1;
    }

    bodies
}
