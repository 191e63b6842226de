//! Pre-flight checks
//!
//! A concern (a file, a host) is described by an ordered list of
//! [`Check`]s. [`first_issue`] evaluates them left to right and stops at
//! the first one that fails, so a concern yields at most one message.
//! Workflows concatenate the results of several concerns and refuse to
//! touch any host if the combined list is non-empty.

use crate::error::{CoreError, Result};
use futures_util::future::BoxFuture;
use nodeprov_remote::{RemoteExecutor, RemoteTarget};
use std::future::Future;
use std::path::{Path, PathBuf};

/// A lazily evaluated predicate paired with the message reported when it fails.
///
/// The predicate does not run until [`first_issue`] reaches it.
pub struct Check<'a> {
    predicate: BoxFuture<'a, bool>,
    message: String,
}

impl<'a> Check<'a> {
    /// A check backed by an async probe (e.g. a connectivity test).
    pub fn probe(predicate: impl Future<Output = bool> + Send + 'a, message: impl Into<String>) -> Self {
        Self {
            predicate: Box::pin(predicate),
            message: message.into(),
        }
    }

    /// A check backed by a plain closure.
    pub fn new(predicate: impl FnOnce() -> bool + Send + 'a, message: impl Into<String>) -> Self {
        Self::probe(async move { predicate() }, message)
    }
}

/// Message of the first failing check, or nothing if every check passes.
pub async fn first_issue(checks: Vec<Check<'_>>) -> Vec<String> {
    for check in checks {
        if !check.predicate.await {
            return vec![check.message];
        }
    }
    Vec::new()
}

/// The path must exist and be a regular file.
pub async fn file_access_issues(path: &Path) -> Vec<String> {
    let display = path.display().to_string();
    let exists = path.to_path_buf();
    let is_file = path.to_path_buf();
    first_issue(vec![
        Check::new(move || exists.exists(), format!("File {display} does not exist")),
        Check::new(move || is_file.is_file(), format!("File {display} is not a file")),
    ])
    .await
}

/// The host must accept our credentials and let us escalate privileges.
pub async fn remote_access_issues(executor: &dyn RemoteExecutor, target: &RemoteTarget) -> Vec<String> {
    let (host, port, user) = (&target.host, target.port, &target.username);
    first_issue(vec![
        Check::probe(
            executor.check_connection(target),
            format!("Cannot connect to {host}:{port} using {user}"),
        ),
        Check::probe(
            executor.check_sudo(target),
            format!("Cannot sudo on {host}:{port} as {user}"),
        ),
    ])
    .await
}

/// Public half of an SSH key pair: `<private>.pub`
pub fn public_key_for(private_key: &Path) -> PathBuf {
    let mut name = private_key.as_os_str().to_os_string();
    name.push(".pub");
    PathBuf::from(name)
}

/// Turn a combined issue list into a `Preflight` error.
pub fn ensure_no_issues(issues: Vec<String>) -> Result<()> {
    if issues.is_empty() {
        Ok(())
    } else {
        Err(CoreError::Preflight(issues))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nodeprov_remote::fake::FakeExecutor;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pass(msg: &str) -> Check<'static> {
        Check::new(|| true, msg)
    }

    fn fail(msg: &str) -> Check<'static> {
        Check::new(|| false, msg)
    }

    #[tokio::test]
    async fn test_all_pass_is_empty() {
        assert!(first_issue(vec![pass("a"), pass("b")]).await.is_empty());
        assert!(first_issue(Vec::new()).await.is_empty());
    }

    #[tokio::test]
    async fn test_first_failure_wins() {
        let issues = first_issue(vec![pass("a"), fail("b"), fail("c")]).await;
        assert_eq!(issues, vec!["b"]);
    }

    #[tokio::test]
    async fn test_prepending_passing_checks_changes_nothing() {
        for prefix in 0..4 {
            let mut checks: Vec<Check> = (0..prefix).map(|i| pass(&format!("p{i}"))).collect();
            checks.push(fail("target"));
            checks.push(fail("later"));
            assert_eq!(first_issue(checks).await, vec!["target"]);
        }
    }

    #[tokio::test]
    async fn test_later_checks_are_not_evaluated() {
        let evaluated = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&evaluated);

        let issues = first_issue(vec![
            fail("first"),
            Check::new(
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    false
                },
                "second",
            ),
        ])
        .await;

        assert_eq!(issues, vec!["first"]);
        assert_eq!(evaluated.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("openrc");

        let issues = file_access_issues(&missing).await;
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("does not exist"));
        assert!(issues[0].contains(&missing.display().to_string()));
    }

    #[tokio::test]
    async fn test_directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let issues = file_access_issues(dir.path()).await;
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("is not a file"));
    }

    #[tokio::test]
    async fn test_regular_file_passes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("openrc");
        std::fs::write(&path, "OS_USERNAME=ci\n").unwrap();
        assert!(file_access_issues(&path).await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_host_skips_sudo_probe() {
        let executor = FakeExecutor::new();
        executor.set_unreachable();
        let target = RemoteTarget::new("ubuntu", "10.0.0.5", 22);

        let issues = remote_access_issues(&executor, &target).await;
        assert_eq!(issues, vec!["Cannot connect to 10.0.0.5:22 using ubuntu"]);
        assert_eq!(executor.probes(), 1);
    }

    #[tokio::test]
    async fn test_sudo_denied() {
        let executor = FakeExecutor::new();
        executor.deny_sudo();
        let target = RemoteTarget::new("ubuntu", "10.0.0.5", 2222);

        let issues = remote_access_issues(&executor, &target).await;
        assert_eq!(issues, vec!["Cannot sudo on 10.0.0.5:2222 as ubuntu"]);
    }

    #[test]
    fn test_public_key_for() {
        assert_eq!(
            public_key_for(Path::new("/keys/gerrit")),
            PathBuf::from("/keys/gerrit.pub")
        );
    }

    #[test]
    fn test_ensure_no_issues() {
        assert!(ensure_no_issues(Vec::new()).is_ok());
        match ensure_no_issues(vec!["x".to_string()]) {
            Err(CoreError::Preflight(issues)) => assert_eq!(issues, vec!["x"]),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
