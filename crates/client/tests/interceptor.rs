//! End-to-end behavior of the interceptor against an in-memory partition
//! store and a scripted network.

use std::sync::Arc;

use m360_client::testing::{ScriptedNetwork, ok};
use m360_client::{
    FetchClient, FetchConfig, FetchOutcome, OfflineWorker, Registration, ResourceKind, ResponseSource, WorkerConfig,
};
use m360_core::{AppConfig, CacheDb, Destination, Request, Response};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use url::Url;

const ORIGIN: &str = "https://monastery360.example";

fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}


fn app(version: &str, manifest: &[&str]) -> AppConfig {
    AppConfig {
        origin: ORIGIN.into(),
        static_cache: version.into(),
        manifest: manifest.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

fn worker(app: &AppConfig, db: &CacheDb, net: &Arc<ScriptedNetwork>) -> OfflineWorker {
    OfflineWorker::new(WorkerConfig::from_app(app).unwrap(), Arc::new(db.clone()), net.clone())
}

async fn active(app: &AppConfig, db: &CacheDb, net: &Arc<ScriptedNetwork>) -> Registration {
    let registration = Registration::new();
    registration.register(worker(app, db, net)).await.unwrap();
    registration
}

fn served(outcome: FetchOutcome) -> (ResourceKind, m360_client::Served) {
    match outcome {
        FetchOutcome::Respond { kind, served } => (kind, served),
        FetchOutcome::PassThrough => panic!("request was not intercepted"),
    }
}

#[tokio::test]
async fn install_is_idempotent() {
    let db = CacheDb::open_in_memory().await.unwrap();
    let net = Arc::new(ScriptedNetwork::new());
    net.route(&url("/").to_string(), ok("text/html", "<html>home</html>"));
    net.route(&url("/src/main.tsx").to_string(), ok("text/javascript", "main()"));
    let app = app("sikkim-monasteries-v2", &["/", "/src/main.tsx"]);

    worker(&app, &db, &net).install().await.unwrap();
    let first = db.list_entries("sikkim-monasteries-v2").await.unwrap();

    net.route(&url("/").to_string(), ok("text/html", "<html>home, redeployed</html>"));
    worker(&app, &db, &net).install().await.unwrap();
    let second = db.list_entries("sikkim-monasteries-v2").await.unwrap();

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    let urls = |entries: &[m360_core::StoredEntry]| entries.iter().map(|e| e.url.clone()).collect::<Vec<_>>();
    assert_eq!(urls(&first), urls(&second));
    let home = db.match_entry("sikkim-monasteries-v2", &Request::get(url("/"))).await.unwrap().unwrap();
    assert_eq!(home.body.as_ref(), b"<html>home, redeployed</html>");
}

#[tokio::test]
async fn activation_deletes_only_stale_partitions() {
    let db = CacheDb::open_in_memory().await.unwrap();
    for name in ["static-v1", "images-v1", "maps-v1"] {
        db.open_partition(name).await.unwrap();
    }
    db.put_entry("images-v1", &Request::get(url("/hero.jpg")), &ok("image/jpeg", "jpeg"))
        .await
        .unwrap();
    let net = Arc::new(ScriptedNetwork::new());

    let registration = Registration::new();
    let report = registration.register(worker(&app("static-v2", &[]), &db, &net)).await.unwrap();

    assert_eq!(report.activate.unwrap().deleted, vec!["static-v1".to_string()]);
    let mut names = db.partition_names().await.unwrap();
    names.sort();
    assert_eq!(names, vec!["images-v1", "maps-v1", "static-v2"]);
    assert_eq!(db.entry_count("images-v1").await.unwrap(), 1);
}

#[tokio::test]
async fn cached_image_is_served_without_network() {
    let db = CacheDb::open_in_memory().await.unwrap();
    let net = Arc::new(ScriptedNetwork::new());
    let registration = active(&app("static-v2", &[]), &db, &net).await;

    let image = url("/lovable-uploads/rumtek.jpg");
    db.put_entry("images-v1", &Request::get(image.clone()), &ok("image/jpeg", "jpeg-bytes"))
        .await
        .unwrap();

    let request = Request::get(image).with_destination(Destination::Image);
    let (kind, served) = served(registration.handle_fetch(&request).await);

    assert_eq!(kind, ResourceKind::Image);
    assert_eq!(served.source, ResponseSource::Cache);
    assert_eq!(served.response.body.as_ref(), b"jpeg-bytes");
    assert_eq!(net.calls(), 0);
}

#[tokio::test]
async fn maps_responses_stay_fresh() {
    let db = CacheDb::open_in_memory().await.unwrap();
    let net = Arc::new(ScriptedNetwork::new());
    let registration = active(&app("static-v2", &[]), &db, &net).await;

    let tiles = "https://maps.googleapis.com/maps/api/staticmap?center=Gangtok";
    let request = Request::get(Url::parse(tiles).unwrap());

    net.route(tiles, ok("application/json", r#"{"v":1}"#));
    let (kind, first) = served(registration.handle_fetch(&request).await);
    assert_eq!(kind, ResourceKind::MapsApi);
    assert_eq!(first.source, ResponseSource::Network);

    net.route(tiles, ok("application/json", r#"{"v":2}"#));
    let (_, second) = served(registration.handle_fetch(&request).await);
    assert_eq!(second.response.body.as_ref(), br#"{"v":2}"#);

    net.set_online(false);
    let (_, offline) = served(registration.handle_fetch(&request).await);
    assert_eq!(offline.source, ResponseSource::Cache);
    assert_eq!(offline.response.body.as_ref(), br#"{"v":2}"#);

    let never_seen = Request::get(Url::parse("https://maps.googleapis.com/maps/api/js?key=k").unwrap());
    let (_, empty) = served(registration.handle_fetch(&never_seen).await);
    assert_eq!(empty.response.status, 200);
    assert_eq!(empty.response.content_type(), Some("application/json"));
    assert_eq!(empty.response.body.as_ref(), b"{}");
}

#[tokio::test]
async fn offline_navigation_gets_offline_page() {
    let db = CacheDb::open_in_memory().await.unwrap();
    let net = Arc::new(ScriptedNetwork::new());
    net.route(&url("/").to_string(), ok("text/html", "<html>home</html>"));
    let registration = active(&app("static-v2", &["/"]), &db, &net).await;

    net.set_online(false);

    let (_, home) = served(registration.handle_fetch(&Request::navigate(url("/"))).await);
    assert_eq!(home.source, ResponseSource::Cache);
    assert_eq!(home.response.body.as_ref(), b"<html>home</html>");

    let (kind, page) = served(registration.handle_fetch(&Request::navigate(url("/monasteries/rumtek"))).await);
    assert_eq!(kind, ResourceKind::Navigation);
    assert_eq!(page.source, ResponseSource::Synthesized);
    assert_eq!(page.response.status, 200);
    assert_eq!(page.response.content_type(), Some("text/html"));
    let body = String::from_utf8(page.response.body.to_vec()).unwrap();
    assert!(body.contains("You're Offline"));
    assert!(body.contains("Try Again"));
    assert!(body.contains("Go Back"));

    net.set_online(true);
    let (_, missing) = served(registration.handle_fetch(&Request::navigate(url("/nowhere"))).await);
    assert_eq!(missing.source, ResponseSource::Network);
    assert_eq!(missing.response.status, 404);
}

#[tokio::test]
async fn non_get_requests_pass_through() {
    let db = CacheDb::open_in_memory().await.unwrap();
    let net = Arc::new(ScriptedNetwork::new());
    let registration = active(&app("static-v2", &[]), &db, &net).await;

    let booking = Request::get(url("/rest/v1/bookings")).with_method("POST").with_body(r#"{"guests":2}"#);
    assert!(registration.handle_fetch(&booking).await.is_pass_through());

    let extension = Request::get(Url::parse("chrome-extension://abc/content.js").unwrap());
    assert!(registration.handle_fetch(&extension).await.is_pass_through());

    assert_eq!(net.calls(), 0);
    for name in db.partition_names().await.unwrap() {
        assert_eq!(db.entry_count(&name).await.unwrap(), 0);
    }
}

#[tokio::test]
async fn static_asset_round_trips_byte_identical() {
    let db = CacheDb::open_in_memory().await.unwrap();
    let net = Arc::new(ScriptedNetwork::new());
    let bytes: Vec<u8> = vec![0x00, 0xff, 0x9f, 0x92, b'\n', 0x80, b'{', b'}'];
    let stylesheet = Response::new(
        200,
        vec![
            ("Content-Type".into(), "text/css".into()),
            ("ETag".into(), "\"abc123\"".into()),
        ],
        bytes.clone(),
    );
    net.route(&url("/src/index.css").to_string(), stylesheet.clone());
    let registration = active(&app("static-v2", &["/src/index.css"]), &db, &net).await;
    let calls_after_install = net.calls();

    let request = Request::get(url("/src/index.css")).with_destination(Destination::Style);
    let (kind, served) = served(registration.handle_fetch(&request).await);

    assert_eq!(kind, ResourceKind::StaticAsset);
    assert_eq!(served.source, ResponseSource::Cache);
    assert_eq!(served.response, stylesheet);
    assert_eq!(served.response.body.as_ref(), bytes.as_slice());
    assert_eq!(net.calls(), calls_after_install);
}

/// Accept connections forever, answering each with the same 200 `text/html`
/// body of `len` bytes.
async fn serve_large_page(len: usize) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let origin = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n"
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(&vec![b'x'; len]).await;
            let _ = socket.shutdown().await;
        }
    });
    origin
}

#[tokio::test]
async fn large_online_response_is_not_treated_as_offline() {
    let origin = serve_large_page(12 * 1024 * 1024).await;
    let db = CacheDb::open_in_memory().await.unwrap();
    let app = AppConfig { origin: origin.clone(), manifest: Vec::new(), ..Default::default() };
    let network = Arc::new(FetchClient::new(FetchConfig::from_app(&app)).unwrap());
    let registration = Registration::new();
    registration
        .register(OfflineWorker::new(WorkerConfig::from_app(&app).unwrap(), Arc::new(db.clone()), network))
        .await
        .unwrap();

    let tour = Request::navigate(Url::parse(&format!("{origin}/tour")).unwrap());
    let (kind, served) = served(registration.handle_fetch(&tour).await);

    assert_eq!(kind, ResourceKind::Navigation);
    assert_eq!(served.source, ResponseSource::Network);
    assert_eq!(served.response.status, 200);
    assert_eq!(served.response.body.len(), 12 * 1024 * 1024);
}
