use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::extract::Query;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use hlscat_engine::{
    CancellationToken, DownloaderConfig, GrabRequest, HlsCat, HlsError, UnsupportedFeature,
};
use tokio::net::TcpListener;

const MEDIA_PLAYLIST: &str = "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:10\n\
#EXTINF:10,\nseg0.ts\n#EXTINF:10,\nseg1.ts\n#EXT-X-ENDLIST\n";

async fn slow_first_segment() -> &'static str {
    // Finishes after seg1 so ordering cannot rely on completion order.
    tokio::time::sleep(Duration::from_millis(100)).await;
    "AA"
}

async fn authed_playlist(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let header_ok = headers
        .get("x-token")
        .is_some_and(|value| value == "secret");
    let query_ok = query.get("auth").is_some_and(|value| value == "abc");
    if header_ok && query_ok {
        (StatusCode::OK, "#EXTM3U\n#EXTINF:4,\nclip.aac\n").into_response()
    } else {
        StatusCode::FORBIDDEN.into_response()
    }
}

async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new()
        .route("/live/index.m3u8", get(|| async { MEDIA_PLAYLIST }))
        .route("/live/seg0.ts", get(slow_first_segment))
        .route("/live/seg1.ts", get(|| async { "BB" }))
        .route("/broken/index.m3u8", get(|| async { MEDIA_PLAYLIST }))
        .route("/broken/seg0.ts", get(|| async { "AA" }))
        .route(
            "/encrypted/index.m3u8",
            get(|| async { "#EXTM3U\n#EXT-X-KEY:METHOD=AES-128,URI=\"k.bin\"\nseg0.ts\n" }),
        )
        .route(
            "/empty/index.m3u8",
            get(|| async { "#EXTM3U\n#EXT-X-TARGETDURATION:10\n#EXT-X-ENDLIST\n" }),
        )
        .route("/auth/index.m3u8", get(authed_playlist))
        .route("/auth/clip.aac", get(|| async { "AUDIO" }));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn request(addr: SocketAddr, path: &str, dir: &tempfile::TempDir) -> GrabRequest {
    GrabRequest::new(format!("http://{addr}{path}"))
        .with_output(dir.path().join("output").to_string_lossy().into_owned())
}

#[tokio::test]
async fn downloads_and_concatenates_in_playlist_order() {
    let addr = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let cat = HlsCat::new(DownloaderConfig::default()).unwrap();

    let outcome = cat
        .run(
            request(addr, "/live/index.m3u8", &dir),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.path, dir.path().join("output.ts"));
    assert_eq!(outcome.segment_count, 2);
    assert_eq!(outcome.bytes_written, 4);
    assert_eq!(std::fs::read(&outcome.path).unwrap(), b"AABB");
}

#[tokio::test]
async fn missing_segment_fails_without_writing() {
    let addr = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let cat = HlsCat::new(DownloaderConfig::default()).unwrap();

    let err = cat
        .run(
            request(addr, "/broken/index.m3u8", &dir),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert!(!dir.path().join("output.ts").exists());
}

#[tokio::test]
async fn encrypted_playlist_is_rejected() {
    let addr = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let cat = HlsCat::new(DownloaderConfig::default()).unwrap();

    let err = cat
        .run(
            request(addr, "/encrypted/index.m3u8", &dir),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    match err {
        HlsError::UnsupportedFeature { feature, line } => {
            assert_eq!(feature, UnsupportedFeature::Encryption);
            assert_eq!(line, 2);
        }
        other => panic!("expected unsupported feature, got {other:?}"),
    }
    assert!(!dir.path().join("output.ts").exists());
}

#[tokio::test]
async fn playlist_without_segments_is_rejected() {
    let addr = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();
    let cat = HlsCat::new(DownloaderConfig::default()).unwrap();

    let err = cat
        .run(
            request(addr, "/empty/index.m3u8", &dir),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, HlsError::EmptyPlaylist));
}

#[tokio::test]
async fn custom_headers_and_query_params_are_sent() {
    let addr = spawn_server().await;
    let dir = tempfile::tempdir().unwrap();

    let denied = HlsCat::new(DownloaderConfig::default())
        .unwrap()
        .run(
            request(addr, "/auth/index.m3u8", &dir),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();
    assert_eq!(denied.status(), Some(StatusCode::FORBIDDEN));

    let config = DownloaderConfig::default()
        .with_header("X-Token", "secret")
        .unwrap()
        .with_params(vec![("auth".to_string(), "abc".to_string())]);
    let outcome = HlsCat::new(config)
        .unwrap()
        .run(
            request(addr, "/auth/index.m3u8", &dir),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(outcome.path, dir.path().join("output.aac"));
    assert_eq!(std::fs::read(&outcome.path).unwrap(), b"AUDIO");
}

#[tokio::test]
async fn unreachable_host_is_a_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = tempfile::tempdir().unwrap();
    let err = HlsCat::new(DownloaderConfig::default())
        .unwrap()
        .run(request(addr, "/index.m3u8", &dir), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, HlsError::Network { .. }));
}
