//! # repo-sweep
//!
//! `repo-sweep` synchronizes every git repository found directly under a root
//! directory. It powers the `sweep` CLI tool.
//!
//! ## Core Features
//!
//! - **Discovery**: Non-recursive scan for `.git` directories and gitdir files.
//! - **Bounded Concurrency**: A limiter caps how many git processes run at once.
//! - **Deadlines**: Every repository gets its own timeout; hung git processes
//!   are killed along with their children.
//! - **Non-interactive**: Credential prompts are disabled, so auth problems are
//!   reported instead of blocking the run.
//!
//! ## Example
//!
//! ```rust,no_run
//! use repo_sweep::core::find_repos_from_path;
//!
//! fn main() -> anyhow::Result<()> {
//!     for repo in find_repos_from_path(".")? {
//!         println!("{}: {}", repo.name, repo.path.display());
//!     }
//!     Ok(())
//! }
//! ```

pub mod commands;
pub mod core;
pub mod git;
pub mod utils;
