//! Protocol round-trip tests.
//!
//! Each test drives `SyncClient` against the in-memory server and checks
//! the client's view after every exchange.

use serde_json::json;

use imagetext::sync::{
    DataUri, ErrorSlot, ImageState, PostField, Resolution, Snapshot, SyncController,
};
use imagetext::Error;

use crate::fixtures::{client, loaded_client, DownServer, FakeServer, ImageFiles, TINY_PNG_B64};

/// Scenario A: initial mount
/// Given a server holding an image and no commands
/// When the client mounts
/// Then the image is shown, the log is empty and there are no alerts
#[tokio::test]
async fn test_mount_shows_server_image() {
    let mut client = client(FakeServer::new());
    client
        .gateway()
        .transport()
        .script(json!({"image": TINY_PNG_B64, "commands": []}));

    assert_eq!(client.load().await.unwrap(), Resolution::Applied);

    let state = client.state();
    let uri = state.image().data_uri().unwrap();
    assert_eq!(uri, format!("data:image/png;base64,{}", TINY_PNG_B64));
    assert_eq!(DataUri::parse(uri).unwrap().png_dimensions(), Some((1, 1)));
    assert!(state.commands().is_empty());
    assert!(state.errors().is_empty());
    assert_eq!(client.gateway().transport().gets(), 1);
}

/// Scenario B: append a command
/// Then the history shows exactly one row "0.) rotate 90"
#[tokio::test]
async fn test_submit_command_adds_history_row() {
    let mut client = loaded_client(&[]).await;
    let before = client.state().image().clone();

    assert_eq!(client.submit("rotate 90").await.unwrap(), Resolution::Applied);

    let rows: Vec<String> = client
        .state()
        .commands()
        .display_rows()
        .map(|row| row.to_string())
        .collect();
    assert_eq!(rows, vec!["0.) rotate 90"]);
    assert_ne!(client.state().image(), &before, "Server image replaces the old one");
    assert_eq!(
        client.gateway().transport().posted(),
        vec![PostField::Cmd("rotate 90".to_string())]
    );
}

/// Scenario C: undo the only command
#[tokio::test]
async fn test_undo_empties_history() {
    let mut client = loaded_client(&["rotate 90"]).await;

    client.undo().await.unwrap();

    assert!(client.state().commands().is_empty());
    assert_eq!(
        client.state().image().data_uri(),
        Some(format!("data:image/png;base64,{}", TINY_PNG_B64).as_str())
    );
    assert_eq!(client.gateway().transport().posted(), vec![PostField::Undo]);
}

/// Scenario D: revert answered with an error and no commands
/// Then the log is empty (absent field means empty) and the general alert shows
#[tokio::test]
async fn test_revert_error_reply_applied_wholesale() {
    let mut client = loaded_client(&["a", "b"]).await;
    client
        .gateway()
        .transport()
        .script(json!({"errors": ["bad index"]}));

    assert_eq!(client.revert(1).await.unwrap(), Resolution::Applied);

    let state = client.state();
    assert!(state.commands().is_empty());
    assert!(state.image().is_absent());
    assert_eq!(state.errors().get(ErrorSlot::General), Some("bad index"));
    assert_eq!(state.errors().get(ErrorSlot::Command), None);
    assert_eq!(
        client.gateway().transport().posted(),
        vec![PostField::Revert("1".to_string())]
    );
}

#[tokio::test]
async fn test_undo_with_empty_history_still_asks_server() {
    let mut client = loaded_client(&[]).await;

    client.undo().await.unwrap();

    assert_eq!(client.gateway().transport().posted(), vec![PostField::Undo]);
    assert_eq!(
        client.state().errors().get(ErrorSlot::General),
        Some("nothing to undo")
    );
}

#[tokio::test]
async fn test_errors_cleared_by_next_clean_reply() {
    let mut client = loaded_client(&[]).await;
    client.undo().await.unwrap();
    assert!(!client.state().errors().is_empty());

    client.submit("blur 2").await.unwrap();
    assert!(client.state().errors().is_empty());
}

#[tokio::test]
async fn test_both_error_slots_populated() {
    let mut client = loaded_client(&["a"]).await;
    client.gateway().transport().script(json!({
        "image": TINY_PNG_B64,
        "commands": ["a"],
        "errors": [null, "upload failed", "", "unknown verb"],
    }));

    client.submit("frobnicate").await.unwrap();

    let errors = client.state().errors();
    assert_eq!(errors.get(ErrorSlot::General), Some("upload failed"));
    assert_eq!(errors.get(ErrorSlot::Command), Some("unknown verb"));
    // Image and commands of the same reply are still applied.
    assert_eq!(client.state().commands().as_slice(), ["a"]);
}

#[tokio::test]
async fn test_upload_starts_new_history() {
    let files = ImageFiles::new();
    let mut client = loaded_client(&["rotate 90", "blur 2"]).await;

    let path = ImageFiles::path_str(&files.gif);
    client.upload(&path).await.unwrap();

    assert!(client.state().commands().is_empty());
    assert!(client.controller().pending_file().is_none());
    match &client.gateway().transport().posted()[..] {
        [PostField::File {
            file_name,
            mime,
            bytes,
        }] => {
            assert_eq!(file_name, "anim.gif");
            assert_eq!(mime, "image/gif");
            assert_eq!(bytes, b"GIF89a");
        }
        other => panic!("Expected one file field, got {:?}", other),
    }
}

/// For every 0 <= i <= len, reverting to i leaves exactly i commands.
#[tokio::test]
async fn test_revert_leaves_index_commands() {
    let history = ["a", "b", "c", "d"];
    for i in 0..=history.len() {
        let mut client = loaded_client(&history).await;

        client.revert(i).await.unwrap();

        assert_eq!(client.state().commands().len(), i, "revert({})", i);
        assert_eq!(client.state().commands().as_slice(), &history[..i]);
        assert!(client.state().errors().is_empty());
    }
}

#[tokio::test]
async fn test_revert_past_end_rejected_locally() {
    let mut client = loaded_client(&["a", "b"]).await;

    let err = client.revert(3).await.unwrap_err();

    assert!(err.is_validation());
    assert!(client.gateway().transport().posted().is_empty());
    assert_eq!(client.state().commands().len(), 2);
}

/// Display row p of a log of length L reverts to chronological index L - p - 1.
#[tokio::test]
async fn test_revert_by_display_row() {
    let history = ["a", "b", "c"];
    for p in 0..history.len() {
        let mut client = loaded_client(&history).await;
        let row = client.state().commands().display_rows().nth(p).unwrap();
        assert_eq!(row.index, history.len() - p - 1);

        client.revert_row(p).await.unwrap();

        assert_eq!(
            client.gateway().transport().posted(),
            vec![PostField::Revert((history.len() - p - 1).to_string())]
        );
        assert_eq!(client.state().commands().len(), history.len() - p - 1);
    }
}

#[tokio::test]
async fn test_blank_command_never_sent() {
    let mut client = loaded_client(&[]).await;

    assert!(client.submit("   ").await.unwrap_err().is_validation());
    assert!(client.gateway().transport().posted().is_empty());
}

#[tokio::test]
async fn test_upload_of_missing_file_keeps_state() {
    let mut client = loaded_client(&["a"]).await;
    let before = client.state().clone();

    let err = client.upload("/definitely/not/here.png").await.unwrap_err();

    assert!(matches!(err, Error::Io(_)));
    assert_eq!(client.state(), &before);
    assert!(!client.controller().is_busy());
}

#[tokio::test]
async fn test_transport_failure_keeps_state() {
    let mut client = imagetext::sync::SyncClient::new(imagetext::sync::RequestGateway::new(
        DownServer,
    ));

    assert!(client.load().await.is_err());
    assert!(client.undo().await.is_err());

    assert!(client.state().image().is_absent());
    assert!(client.state().errors().is_empty(), "Transport errors are not server errors");
    assert_eq!(client.state().revision(), 0);
    assert!(!client.controller().is_busy());
}

#[tokio::test]
async fn test_non_json_reply_is_transport_error() {
    let mut client = loaded_client(&["a"]).await;
    client.gateway().transport().script_raw("<html>502 Bad Gateway</html>");

    let err = client.undo().await.unwrap_err();

    assert!(matches!(err, Error::Json(_)));
    assert_eq!(client.state().commands().as_slice(), ["a"]);
}

#[tokio::test]
async fn test_empty_image_field_clears_image() {
    let mut client = loaded_client(&["a"]).await;
    client
        .gateway()
        .transport()
        .script(json!({"image": "", "commands": ["a"]}));

    client.undo().await.unwrap();

    assert_eq!(client.state().image(), &ImageState::Absent);
}

/// Applying the same snapshot twice leaves the same state.
#[test]
fn test_apply_is_idempotent() {
    let snapshot = Snapshot::from_body(
        &json!({"image": TINY_PNG_B64, "commands": ["a", "b"], "errors": ["x"]}).to_string(),
    )
    .unwrap();

    let mut sync = SyncController::new();
    let first = sync.on_mount();
    sync.resolve(first.seq, snapshot.clone());
    let once = (
        sync.state().image().clone(),
        sync.state().commands().clone(),
        sync.state().errors().clone(),
    );

    let second = sync.on_mount();
    sync.resolve(second.seq, snapshot);
    let twice = (
        sync.state().image().clone(),
        sync.state().commands().clone(),
        sync.state().errors().clone(),
    );

    assert_eq!(once, twice);
}

/// Server state and client view agree after a mixed sequence of operations.
#[tokio::test]
async fn test_client_mirrors_server_after_session() {
    let files = ImageFiles::new();
    let mut client = client(FakeServer::new());
    client.load().await.unwrap();
    assert!(client.state().image().is_absent());

    client.upload(&ImageFiles::path_str(&files.png)).await.unwrap();
    for cmd in ["rotate 90", "blur 2", "invert", "sharpen"] {
        client.submit(cmd).await.unwrap();
    }
    client.undo().await.unwrap();
    client.revert(1).await.unwrap();
    client.submit("grayscale").await.unwrap();

    let server_commands = client.gateway().transport().commands();
    assert_eq!(server_commands, vec!["rotate 90", "grayscale"]);
    assert_eq!(client.state().commands().as_slice(), server_commands.as_slice());
    assert_eq!(client.controller().latest_seq(), 9);
    assert!(!client.controller().is_busy());
}
