//! Git subprocess substrate for the VCS ingestor and Trace Engine: repo
//! root discovery, command execution, commit log walking, and blame
//! resolution with rename-following.

pub mod blame;
pub mod commands;
pub mod gitdir;
pub mod log;

pub use blame::{blame_line, BlameResult};
pub use commands::{git_command, git_command_lines, GitError, Result};
pub use gitdir::{find_git_root, get_git_root_via_command, is_git_repo, is_shallow_repository};
pub use log::{walk_log, CommitInfo, LogBounds};
