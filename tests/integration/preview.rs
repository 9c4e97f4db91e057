//! Local preview tests.
//!
//! A selected file is shown immediately from disk. The server's image takes
//! over once an upload of that file is answered, however late the preview is.

use imagetext::sync::{
    DataUri, ImageSource, ImageState, LocalPreviewEncoder, RequestGateway, Resolution,
    SyncController,
};

use crate::fixtures::{tiny_png_bytes, FakeServer, ImageFiles};

#[tokio::test]
async fn test_encoder_reads_file_as_data_uri() {
    let files = ImageFiles::new();

    let uri = LocalPreviewEncoder::encode(&files.png).await.unwrap();

    let parsed = DataUri::parse(&uri).unwrap();
    assert_eq!(parsed.mime, "image/png");
    assert_eq!(parsed.decode().unwrap(), tiny_png_bytes());
    assert_eq!(parsed.png_dimensions(), Some((1, 1)));
}

#[tokio::test]
async fn test_encoder_missing_file_is_io_error() {
    let files = ImageFiles::new();
    let missing = files.dir.path().join("gone.png");

    let err = LocalPreviewEncoder::encode(&missing).await.unwrap_err();

    assert!(matches!(err, imagetext::Error::Io(_)));
}

/// Test: Preview shown before upload
/// Given a file is selected
/// When its preview finishes
/// Then the image slot shows it as a local preview, commands untouched
#[tokio::test]
async fn test_preview_shown_before_upload() {
    let files = ImageFiles::new();
    let mut sync = SyncController::new();

    let ticket = sync
        .on_file_selected(&ImageFiles::path_str(&files.gif))
        .unwrap();
    let uri = LocalPreviewEncoder::encode(&ticket.path).await.unwrap();

    assert!(sync.show_preview(ticket.generation, uri));
    assert_eq!(sync.state().image().source(), Some(ImageSource::LocalPreview));
    assert_eq!(
        sync.state().image().data_uri(),
        Some("data:image/gif;base64,R0lGODlh")
    );
    assert_eq!(sync.state().revision(), 0, "Previews are not snapshots");
}

/// Test: Reselecting before the first preview finishes
/// Then only the newer selection's preview is shown
#[tokio::test]
async fn test_superseded_selection_preview_dropped() {
    let files = ImageFiles::new();
    let mut sync = SyncController::new();

    let first = sync
        .on_file_selected(&ImageFiles::path_str(&files.png))
        .unwrap();
    let second = sync
        .on_file_selected(&ImageFiles::path_str(&files.gif))
        .unwrap();

    let second_uri = LocalPreviewEncoder::encode(&second.path).await.unwrap();
    let first_uri = LocalPreviewEncoder::encode(&first.path).await.unwrap();

    assert!(sync.show_preview(second.generation, second_uri.clone()));
    assert!(!sync.show_preview(first.generation, first_uri));
    assert_eq!(sync.state().image().data_uri(), Some(second_uri.as_str()));
}

/// Test: Preview finishing after the upload reply
/// Then the server image stays
#[tokio::test]
async fn test_late_preview_never_overwrites_uploaded_image() {
    let files = ImageFiles::new();
    let gateway = RequestGateway::new(FakeServer::new());
    let mut sync = SyncController::new();

    let ticket = sync
        .on_file_selected(&ImageFiles::path_str(&files.png))
        .unwrap();
    let upload = sync.on_upload_requested().unwrap();
    let snapshot = gateway.execute(&upload.request).await.unwrap();
    assert_eq!(sync.resolve(upload.seq, snapshot), Resolution::Applied);
    let server_image = sync.state().image().clone();
    assert!(matches!(server_image, ImageState::Confirmed(_)));

    let uri = LocalPreviewEncoder::encode(&ticket.path).await.unwrap();
    assert!(!sync.show_preview(ticket.generation, uri));
    assert_eq!(sync.state().image(), &server_image);
}

/// Test: Any later snapshot replaces a shown preview
#[tokio::test]
async fn test_snapshot_replaces_preview() {
    let files = ImageFiles::new();
    let gateway = RequestGateway::new(FakeServer::with_history(&["rotate 90"]));
    let mut sync = SyncController::new();

    let ticket = sync
        .on_file_selected(&ImageFiles::path_str(&files.gif))
        .unwrap();
    let uri = LocalPreviewEncoder::encode(&ticket.path).await.unwrap();
    assert!(sync.show_preview(ticket.generation, uri));

    let mount = sync.on_mount();
    let snapshot = gateway.execute(&mount.request).await.unwrap();
    sync.resolve(mount.seq, snapshot);

    assert_eq!(sync.state().image().source(), Some(ImageSource::Server));
    assert_eq!(sync.state().commands().as_slice(), ["rotate 90"]);
    assert!(sync.pending_file().is_some(), "Still waiting to be uploaded");
}
