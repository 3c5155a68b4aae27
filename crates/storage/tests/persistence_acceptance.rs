use shared::{
    domain::UserId,
    inspection::{HistoryScope, InspectionDraft},
};
use storage::Storage;

#[tokio::test]
async fn session_blob_and_inspections_survive_reopen() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("inspector.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));
    let inspector = UserId::new("emp-7");

    let saved = {
        let storage = Storage::new(&database_url).await.expect("first open");
        storage
            .write_value("autocheck_session", br#"{"id":"emp-7"}"#)
            .await
            .expect("write session");
        let draft = InspectionDraft {
            plate: "XYZ9A87".to_string(),
            ..InspectionDraft::default()
        };
        storage
            .insert_inspection(&draft, &inspector, &inspector)
            .await
            .expect("insert")
    };

    let reopened = Storage::new(&database_url).await.expect("reopen");
    assert_eq!(
        reopened
            .read_value("autocheck_session")
            .await
            .expect("read session"),
        Some(br#"{"id":"emp-7"}"#.to_vec())
    );

    let history = reopened
        .list_inspections(&HistoryScope::User(inspector))
        .await
        .expect("history");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, saved.id);
    assert_eq!(history[0].data.plate, "XYZ9A87");
}
