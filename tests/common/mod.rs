//! Common test utilities and helpers
#![allow(dead_code, unused_imports)]

pub mod fixtures;
pub mod git;

pub use self::fixtures::SweepWorkspace;
pub use self::git::{
    clone_repo, create_multiple_repos, create_test_commit, is_git_available, run_git,
    setup_git_repo,
};
