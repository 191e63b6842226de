mod common;

use common::{TestFiles, target};
use nodeprov_core::{CoreError, UploadKeysArgs, upload_keys};
use nodeprov_remote::RemoteError;
use nodeprov_remote::fake::FakeExecutor;

const ABSENT: &str = "ERROR (CommandError): No keypair with a name or ID of 'nodepool' exists.";

fn args(files: &TestFiles, remove: bool) -> UploadKeysArgs {
    UploadKeysArgs {
        target: target(),
        openrc: files.openrc(),
        remove,
    }
}

fn count(commands: &[String], needle: &str) -> usize {
    commands.iter().filter(|c| c.contains(needle)).count()
}

#[tokio::test]
async fn test_fresh_regions_get_the_key() {
    let files = TestFiles::new();
    let executor = FakeExecutor::new();
    executor.fail_when("keypair-show", 1, ABSENT);

    upload_keys(&executor, args(&files, false)).await.unwrap();

    let commands = executor.commands();
    assert_eq!(count(&commands, "keypair-show"), 2);
    assert_eq!(count(&commands, "keypair-delete"), 0);

    let adds: Vec<&String> = commands.iter().filter(|c| c.contains("keypair-add")).collect();
    assert_eq!(adds.len(), 2);
    assert!(adds[0].contains("OS_REGION_NAME=IAD"));
    assert!(adds[1].contains("OS_REGION_NAME=DFW"));
    assert!(adds[0].contains("--pub-key /home/nodepool/.ssh/id_rsa.pub nodepool"));
    assert_eq!(executor.closes(), 1);
}

#[tokio::test]
async fn test_existing_key_without_remove_is_a_conflict() {
    let files = TestFiles::new();
    let executor = FakeExecutor::new();
    executor.fail_when_all(&["OS_REGION_NAME=DFW", "keypair-show"], 1, ABSENT);

    let err = upload_keys(&executor, args(&files, false)).await.unwrap_err();

    match &err {
        CoreError::KeypairConflict { keypair, regions } => {
            assert_eq!(keypair, "nodepool");
            assert_eq!(regions, &vec!["IAD".to_string()]);
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(err.to_string().contains("--remove"));

    let commands = executor.commands();
    assert_eq!(count(&commands, "keypair-add"), 0);
    assert_eq!(count(&commands, "keypair-delete"), 0);
    assert_eq!(executor.closes(), 1);
}

#[tokio::test]
async fn test_remove_replaces_existing_keys_in_order() {
    let files = TestFiles::new();
    let executor = FakeExecutor::new();
    executor.fail_when_all(&["OS_REGION_NAME=DFW", "keypair-show"], 1, ABSENT);

    upload_keys(&executor, args(&files, true)).await.unwrap();

    let mutations: Vec<String> = executor
        .commands()
        .into_iter()
        .filter(|c| !c.contains("keypair-show") && !c.starts_with("rm -f"))
        .collect();
    assert_eq!(mutations.len(), 3);
    assert!(mutations[0].contains("OS_REGION_NAME=IAD") && mutations[0].contains("keypair-delete"));
    assert!(mutations[1].contains("OS_REGION_NAME=IAD") && mutations[1].contains("keypair-add"));
    assert!(mutations[2].contains("OS_REGION_NAME=DFW") && mutations[2].contains("keypair-add"));
}

#[tokio::test]
async fn test_survey_precedes_every_mutation() {
    let files = TestFiles::new();
    let executor = FakeExecutor::new();

    upload_keys(&executor, args(&files, true)).await.unwrap();

    let commands = executor.commands();
    let last_show = commands.iter().rposition(|c| c.contains("keypair-show")).unwrap();
    let first_mutation = commands
        .iter()
        .position(|c| c.contains("keypair-delete") || c.contains("keypair-add"))
        .unwrap();
    assert!(last_show < first_mutation);
    assert_eq!(count(&commands, "keypair-delete"), 2);
    assert_eq!(count(&commands, "keypair-add"), 2);
}

#[tokio::test]
async fn test_openrc_region_is_overridden_per_call() {
    let files = TestFiles::new();
    let executor = FakeExecutor::new();
    executor.fail_when("keypair-show", 1, ABSENT);

    upload_keys(&executor, args(&files, false)).await.unwrap();

    assert!(executor.commands().iter().all(|c| !c.contains("OS_REGION_NAME=ORD")));
}

#[tokio::test]
async fn test_failed_add_is_fatal() {
    let files = TestFiles::new();
    let executor = FakeExecutor::new();
    executor.fail_when("keypair-show", 1, ABSENT);
    executor.fail_when_all(&["OS_REGION_NAME=DFW", "keypair-add"], 1, "quota exceeded");

    let err = upload_keys(&executor, args(&files, false)).await.unwrap_err();
    assert!(matches!(err, CoreError::Remote(_)), "{err:?}");
    assert_eq!(executor.closes(), 1);
}

#[tokio::test]
async fn test_failed_delete_is_fatal() {
    let files = TestFiles::new();
    let executor = FakeExecutor::new();
    executor.fail_when_all(&["OS_REGION_NAME=DFW", "keypair-show"], 1, ABSENT);
    executor.fail_when_all(&["OS_REGION_NAME=IAD", "keypair-delete"], 1, "forbidden");

    let err = upload_keys(&executor, args(&files, true)).await.unwrap_err();

    assert!(matches!(err, CoreError::Remote(_)), "{err:?}");
    let commands = executor.commands();
    assert_eq!(count(&commands, "keypair-delete"), 1);
    assert_eq!(count(&commands, "keypair-add"), 0);
    assert_eq!(executor.closes(), 1);
}

#[tokio::test]
async fn test_transport_error_during_survey_is_fatal() {
    let files = TestFiles::new();
    let executor = FakeExecutor::new();
    executor.break_when("OS_REGION_NAME=DFW");

    let err = upload_keys(&executor, args(&files, true)).await.unwrap_err();

    assert!(
        matches!(err, CoreError::Remote(RemoteError::Io(_))),
        "{err:?}"
    );
    let commands = executor.commands();
    assert_eq!(count(&commands, "keypair-show"), 2);
    assert_eq!(count(&commands, "keypair-delete"), 0);
    assert_eq!(count(&commands, "keypair-add"), 0);
    assert_eq!(executor.closes(), 1);
}

#[tokio::test]
async fn test_minimal_openrc_is_enough() {
    let files = TestFiles::new();
    let executor = FakeExecutor::new();
    executor.fail_when("keypair-show", 1, ABSENT);
    let openrc = files.write(
        "openrc",
        "OS_USERNAME=ci\nOS_PROJECT_ID=abc123\nOS_AUTH_URL=https://identity.example.com/v3/\n",
    );

    upload_keys(
        &executor,
        UploadKeysArgs {
            target: target(),
            openrc,
            remove: false,
        },
    )
    .await
    .unwrap();

    let adds: Vec<String> = executor
        .commands()
        .into_iter()
        .filter(|c| c.contains("keypair-add"))
        .collect();
    assert_eq!(adds.len(), 2);
    assert!(adds[0].contains("OS_PROJECT_ID=abc123 OS_AUTH_URL=https://identity.example.com/v3/"));
    assert!(adds[0].contains("OS_REGION_NAME=IAD"));
    assert!(adds[1].contains("OS_REGION_NAME=DFW"));
}

#[tokio::test]
async fn test_missing_openrc_stops_before_connecting() {
    let files = TestFiles::new();
    let executor = FakeExecutor::new();
    let openrc = files.missing("openrc");

    let err = upload_keys(
        &executor,
        UploadKeysArgs {
            target: target(),
            openrc: openrc.clone(),
            remove: false,
        },
    )
    .await
    .unwrap_err();

    match err {
        CoreError::Preflight(issues) => {
            assert_eq!(issues.len(), 1);
            assert!(issues[0].contains(&openrc.display().to_string()));
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(executor.connects(), 0);
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_malformed_openrc_stops_before_connecting() {
    let files = TestFiles::new();
    let executor = FakeExecutor::new();
    let openrc = files.write("openrc", "export OS_PASSWORD=$(cat secret)\n");

    let err = upload_keys(
        &executor,
        UploadKeysArgs {
            target: target(),
            openrc,
            remove: false,
        },
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CoreError::EnvFile { .. }), "{err:?}");
    assert_eq!(executor.connects(), 0);
}
