mod common;

use std::path::Path;
use std::sync::Arc;

use common::RecordingService;
use webdav_dsl::{
    Credentials, DslConfig, DslError, MappedDrive, Mode, ResourceRef, Session,
};

fn drive_session(volume: &Path, service: Arc<RecordingService>) -> Session {
    let mut config = DslConfig::for_server_url("http://127.0.0.1:9").unwrap();
    config.download_dir = volume.join("downloads");
    Session::authenticate(config, Credentials::new("bob", "secret"))
        .unwrap()
        .with_content_service(service)
        .with_network_drive(MappedDrive::preexisting(volume))
}

async fn in_bob_home(volume: &Path, service: Arc<RecordingService>) -> Session {
    std::fs::create_dir_all(volume.join("User Homes/bob")).unwrap();
    let mut session = drive_session(volume, service);
    session
        .using_network_drive()
        .await
        .unwrap()
        .using_own_user_home()
        .unwrap();
    session
}

#[tokio::test]
async fn switching_to_drive_changes_mode_and_prefix() {
    let dir = tempfile::tempdir().unwrap();
    let session = in_bob_home(dir.path(), Arc::new(RecordingService::default())).await;

    assert_eq!(session.mode(), Mode::MappedDrive);
    assert!(session.current_space().ends_with("/User Homes/bob"));
    assert_eq!(session.sites_path(), format!("{}/Sites", session.prefix()));
}

#[tokio::test]
async fn creating_existing_folder_fails_and_keeps_last_resource() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = in_bob_home(dir.path(), Arc::new(RecordingService::default())).await;

    let mut folder = ResourceRef::folder("Reports");
    let mut file = ResourceRef::file_with_content("a.txt", "alpha");
    session
        .create_folder(&mut folder)
        .await
        .unwrap()
        .create_file(&mut file)
        .await
        .unwrap();
    assert_eq!(
        folder.repository_location.as_deref(),
        Some("/User Homes/bob/Reports")
    );
    assert_eq!(
        folder.node_ref.as_deref(),
        Some("workspace://SpacesStore/User Homes/bob/Reports")
    );

    let before = session.last_resource().to_string();
    let mut again = ResourceRef::folder("Reports");
    let err = session.create_folder(&mut again).await.err().unwrap();

    assert!(matches!(err, DslError::AlreadyExists(_)));
    assert_eq!(session.last_resource(), before);
    assert_eq!(again.repository_location, None);
}

#[tokio::test]
async fn delete_removes_and_waits_for_repository() {
    let dir = tempfile::tempdir().unwrap();
    let service = Arc::new(RecordingService::default());
    let mut session = in_bob_home(dir.path(), service.clone()).await;

    let mut file = ResourceRef::file_with_content("old.txt", "bye");
    session
        .create_file(&mut file)
        .await
        .unwrap()
        .delete()
        .await
        .unwrap()
        .assert_that()
        .does_not_exist_in_webdav()
        .await
        .unwrap();

    assert!(!dir.path().join("User Homes/bob/old.txt").exists());
    assert_eq!(service.waits(), vec!["/User Homes/bob/old.txt"]);
}

#[tokio::test]
async fn update_and_read_back_content() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = in_bob_home(dir.path(), Arc::new(RecordingService::default())).await;

    let mut file = ResourceRef::file_with_content("notes.txt", "draft");
    session
        .create_file(&mut file)
        .await
        .unwrap()
        .update("final")
        .await
        .unwrap()
        .assert_that()
        .content_is("final")
        .await
        .unwrap()
        .download()
        .await
        .unwrap()
        .assert_that()
        .is_downloaded()
        .await
        .unwrap();

    assert_eq!(
        std::fs::read_to_string(dir.path().join("downloads/notes.txt")).unwrap(),
        "final"
    );
}

#[tokio::test]
async fn update_of_missing_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = in_bob_home(dir.path(), Arc::new(RecordingService::default())).await;
    let ghost = ResourceRef::file("ghost.txt").at("/User Homes/bob/ghost.txt");

    let err = session
        .using_resource(&ghost)
        .unwrap()
        .update("boo")
        .await
        .err()
        .unwrap();
    assert!(matches!(err, DslError::NotFound(_)));
}

#[tokio::test]
async fn children_are_listed_recursively_by_scope() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = in_bob_home(dir.path(), Arc::new(RecordingService::default())).await;

    let mut docs = ResourceRef::folder("docs");
    let mut readme = ResourceRef::file_with_content("readme.md", "# hi");
    session.create_folder(&mut docs).await.unwrap();
    session
        .using_resource(&docs)
        .unwrap()
        .create_file(&mut readme)
        .await
        .unwrap()
        .using_own_user_home()
        .unwrap();

    let children = session.get_children().await.unwrap();
    let locations: Vec<&str> = children
        .iter()
        .filter_map(|c| c.repository_location.as_deref())
        .collect();
    assert_eq!(
        locations,
        vec!["/User Homes/bob/docs", "/User Homes/bob/docs/readme.md"]
    );

    session
        .assert_that()
        .has_folders(&[ResourceRef::folder("docs")])
        .await
        .unwrap()
        .assert_that()
        .has_files(&[ResourceRef::file("readme.md")])
        .await
        .unwrap();
    let files = session.get_files().await.unwrap();
    assert_eq!(files.len(), 1);
}

#[tokio::test]
async fn copy_honours_overwrite_policy_and_move_relocates() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = in_bob_home(dir.path(), Arc::new(RecordingService::default())).await;

    let mut archive = ResourceRef::folder("Archive");
    let mut file = ResourceRef::file_with_content("q1.csv", "1,2,3");
    session.create_folder(&mut archive).await.unwrap();
    session
        .create_file(&mut file)
        .await
        .unwrap()
        .copy_to(&archive)
        .await
        .unwrap();
    assert_eq!(
        session.last_resource_without_prefix(),
        "/User Homes/bob/Archive/q1.csv"
    );

    session.using_resource(&file).unwrap();
    let err = session.copy_to(&archive).await.err().unwrap();
    assert!(matches!(err, DslError::AlreadyExists(_)));

    session
        .overwrite_if_exists()
        .copy_to(&archive)
        .await
        .unwrap();

    let mut outbox = ResourceRef::folder("Outbox");
    session.using_own_user_home().unwrap();
    session.create_folder(&mut outbox).await.unwrap();
    session
        .using_resource(&file)
        .unwrap()
        .move_to(&outbox)
        .await
        .unwrap();

    assert!(!dir.path().join("User Homes/bob/q1.csv").exists());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("User Homes/bob/Outbox/q1.csv")).unwrap(),
        "1,2,3"
    );
}

#[tokio::test]
async fn rename_keeps_parent_folder() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = in_bob_home(dir.path(), Arc::new(RecordingService::default())).await;

    let mut file = ResourceRef::file_with_content("draft.txt", "text");
    session
        .create_file(&mut file)
        .await
        .unwrap()
        .rename("final.txt")
        .await
        .unwrap()
        .assert_that()
        .exists_in_webdav()
        .await
        .unwrap();

    assert!(dir.path().join("User Homes/bob/final.txt").is_file());
    assert!(!dir.path().join("User Homes/bob/draft.txt").exists());
}

#[tokio::test]
async fn protocol_only_steps_are_refused_on_drive() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = in_bob_home(dir.path(), Arc::new(RecordingService::default())).await;
    let local = dir.path().join("upload.bin");
    std::fs::write(&local, b"bytes").unwrap();

    let err = session.upload_file(&local).await.err().unwrap();
    assert!(matches!(err, DslError::UnsupportedOnMappedDrive(_)));
    let err = session.lock().await.err().unwrap();
    assert!(matches!(err, DslError::UnsupportedOnMappedDrive(_)));
}
