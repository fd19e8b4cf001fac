pub mod commit;
pub mod event;
pub mod shell;
pub mod tokenize;
pub mod types;

pub use commit::{CommitMessage, extract_commit_message, subject_line};
pub use event::{ToolEvent, USER_PROMPT_SUBMIT};
pub use shell::{heredoc_bodies, split_commands};
pub use tokenize::{is_env_assignment, split_env_prefix, tokenize, try_tokenize};
pub use types::{CommandChain, Operator};
