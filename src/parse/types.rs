//! Output of [`split_commands`](super::split_commands).

/// Control operator between two segments of a compound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
    /// `;` or a newline
    Semi,
    Pipe,
    /// `|&`
    PipeErr,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::And => "&&",
            Operator::Or => "||",
            Operator::Semi => ";",
            Operator::Pipe => "|",
            Operator::PipeErr => "|&",
        }
    }
}

/// Segments of a compound command; `operators[i]` sits between
/// `segments[i]` and `segments[i + 1]`.
#[derive(Debug, Clone, Default)]
pub struct CommandChain {
    pub segments: Vec<String>,
    pub operators: Vec<Operator>,
}

impl CommandChain {
    pub fn is_compound(&self) -> bool {
        self.segments.len() > 1
    }

    /// e.g. `3 segments (&&, |)`, for debug logging.
    pub fn describe(&self) -> String {
        let mut ops: Vec<&str> = self.operators.iter().map(Operator::as_str).collect();
        ops.sort_unstable();
        ops.dedup();
        if ops.is_empty() {
            format!("{} segment(s)", self.segments.len())
        } else {
            format!("{} segments ({})", self.segments.len(), ops.join(", "))
        }
    }
}
