//! Git testing utilities

use anyhow::Result;
use std::path::Path;
use std::process::Command;

/// Runs git in `path`, failing with its stderr when it exits non-zero
pub fn run_git(path: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(path)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()?;

    if !output.status.success() {
        anyhow::bail!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr)
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Configures identity and signing so commits work on any machine
fn configure_identity(path: &Path) -> Result<()> {
    run_git(path, &["config", "user.name", "Test User"])?;
    run_git(path, &["config", "user.email", "test@example.com"])?;
    // Disable commit signing for tests
    run_git(path, &["config", "commit.gpgsign", "false"])?;
    Ok(())
}

/// Sets up a git repository with user config
pub fn setup_git_repo(path: &Path) -> Result<()> {
    let init_result = Command::new("git")
        .args(["init", "-q"])
        .current_dir(path)
        .output()?;

    if !init_result.status.success() {
        anyhow::bail!("Git not available - skipping test");
    }

    configure_identity(path)
}

/// Creates a test commit in the repository
pub fn create_test_commit(path: &Path, file_name: &str, content: &str, message: &str) -> Result<()> {
    std::fs::write(path.join(file_name), content)?;
    run_git(path, &["add", file_name])?;
    run_git(path, &["commit", "-q", "-m", message])?;
    Ok(())
}

/// Clones `source` into `dest` and prepares it for fast-forward pulls
pub fn clone_repo(source: &Path, dest: &Path) -> Result<()> {
    let parent = dest
        .parent()
        .ok_or_else(|| anyhow::anyhow!("clone destination has no parent"))?;
    let source_arg = source.to_string_lossy().into_owned();
    let dest_arg = dest.to_string_lossy().into_owned();
    run_git(parent, &["clone", "-q", source_arg.as_str(), dest_arg.as_str()])?;

    configure_identity(dest)?;
    run_git(dest, &["config", "pull.rebase", "false"])?;
    Ok(())
}

/// Creates multiple test repositories in a parent directory
pub fn create_multiple_repos(parent_dir: &Path, count: usize) -> Result<Vec<String>> {
    let mut repo_names = Vec::new();

    for i in 0..count {
        let repo_name = format!("test-repo-{}", i + 1);
        let repo_path = parent_dir.join(&repo_name);
        std::fs::create_dir(&repo_path)?;

        setup_git_repo(&repo_path)?;
        create_test_commit(
            &repo_path,
            "README.md",
            &format!("# Repo {}", i + 1),
            "Initial commit",
        )?;

        repo_names.push(repo_name);
    }

    Ok(repo_names)
}

/// Checks if git is available in the system
pub fn is_git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
