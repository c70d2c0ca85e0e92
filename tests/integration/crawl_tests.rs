//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, from the seed page to the CSV file.

use product_ripple::config::{
    load_config, CrawlConfig, CrawlMode, CrawlerConfig, FilterConfig, OutputConfig,
    SelectorConfig,
};
use product_ripple::crawler::{
    build_http_client, crawl, fetch_url, run_crawl, FetchPolicy, USER_AGENT,
};
use product_ripple::output::{ChannelSink, CrawlEvent, NullSink};
use product_ripple::{CrawlLog, FetchOutcome, RippleError};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling the given seed into `csv_path`
fn create_test_config(seed: &str, mode: CrawlMode, csv_path: &Path) -> CrawlConfig {
    CrawlConfig {
        crawler: CrawlerConfig {
            seed_url: seed.to_string(),
            mode,
            product_identifier: "/p/".to_string(),
            concurrency: 4,
            timeout_secs: 5,
            max_retries: 2,
            backoff_base_ms: 10,
            max_duration_secs: None,
        },
        selectors: SelectorConfig::default(),
        filter: FilterConfig {
            blacklist: vec!["/cart".to_string(), "/account".to_string()],
        },
        output: OutputConfig {
            csv_path: csv_path.to_string_lossy().into_owned(),
        },
    }
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

fn json_ld_page(json: &str, body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            r#"<html><head><script type="application/ld+json">{}</script></head><body>{}</body></html>"#,
            json, body
        ))
        .insert_header("content-type", "text/html")
}

/// Reads the CSV file back as (header, rows sorted by name)
fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).expect("Failed to open CSV");
    let header = reader
        .headers()
        .expect("Missing header")
        .iter()
        .map(str::to_string)
        .collect();
    let mut rows: Vec<Vec<String>> = reader
        .records()
        .map(|r| r.expect("Bad row").iter().map(str::to_string).collect())
        .collect();
    rows.sort();
    (header, rows)
}

fn fast_policy() -> FetchPolicy {
    FetchPolicy {
        timeout: Duration::from_millis(200),
        max_retries: 3,
        backoff_base: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn test_full_crawl_structured() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Index page: nested links, a blacklisted one and an off-site one
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            r#"<nav><ul>
                <li><a href="/p/boot">Boot</a></li>
                <li><span><a href="/p/sock#reviews">Sock</a></span></li>
                <li><a href="/cart">Cart</a></li>
                <li><a href="/about">About</a></li>
                <li><a href="https://www.facebook.com/shop">Follow us</a></li>
            </ul></nav>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/boot"))
        .respond_with(json_ld_page(
            r#"{"@context": "https://schema.org", "@type": "Product", "name": "Hiking Boot",
                "image": ["https://cdn.example.com/boot-1.jpg", "https://cdn.example.com/boot-2.jpg"],
                "description": "Waterproof leather boot", "sku": "HB-42",
                "offers": {"@type": "Offer", "price": "129.95", "priceCurrency": "EUR"}}"#,
            r#"<a href="/p/sock">Matching socks</a><a href="/">Home</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/sock"))
        .respond_with(json_ld_page(
            r#"{"@type": "Product", "name": "Wool Sock", "sku": "WS-1",
                "offers": [{"price": 12.5}, {"price": 10}]}"#,
            r#"<a href="/p/boot">Boot</a>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    // Not a product URL; links back home only
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html_page(r#"<a href="/">Home</a>"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(html_page("cart"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = temp_dir.path().join("products.csv");
    let config = create_test_config(
        &format!("{}/", base_url),
        CrawlMode::Structured,
        &csv_path,
    );

    let summary = crawl(config).await.expect("Crawl failed");

    assert!(!summary.cancelled);
    assert_eq!(summary.pages_visited, 4, "Should visit /, /about and both products");
    assert_eq!(summary.pages_fetched, 4);
    assert_eq!(summary.pages_failed, 0);
    assert_eq!(summary.products_written, 2);
    assert_eq!(summary.pages_left_pending, 0);

    let (header, rows) = read_csv(&csv_path);
    assert_eq!(header, vec!["name", "image", "desc", "sku", "price", "url"]);
    assert_eq!(rows.len(), 2);

    assert_eq!(
        rows[0],
        vec![
            "Hiking Boot".to_string(),
            "https://cdn.example.com/boot-1.jpg".to_string(),
            "Waterproof leather boot".to_string(),
            "HB-42".to_string(),
            "129,95".to_string(),
            format!("{}/p/boot", base_url),
        ]
    );

    assert_eq!(rows[1][0], "Wool Sock");
    assert_eq!(rows[1][1], "", "Absent JSON-LD fields are written empty");
    assert_eq!(rows[1][4], "12,5");
    assert_eq!(rows[1][5], format!("{}/p/sock", base_url));
}

#[tokio::test]
async fn test_full_crawl_heuristic() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            r#"<div class="grid"><a href="/p/trail-runner">Trail Runner</a></div>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/trail-runner"))
        .respond_with(html_page(
            r#"<h1 class="headline product-title">Trail Runner</h1>
               <div class="gallery"><img src="/img/trail.jpg"></div>
               <div class="product-desc"><p>Light shoe</p></div>
               <span itemprop="sku">TR-1</span>
               <div itemprop="offers" itemscope>
                 <meta itemprop="priceCurrency" content="EUR">
                 <span itemprop="price">89.90</span>
               </div>"#,
        ))
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = temp_dir.path().join("products.csv");
    let mut config = create_test_config(
        &format!("{}/", base_url),
        CrawlMode::Heuristic,
        &csv_path,
    );
    config.selectors = SelectorConfig {
        name: "product-title".to_string(),
        image: "gallery".to_string(),
        description: "product-desc".to_string(),
        ..Default::default()
    };

    let summary = crawl(config).await.expect("Crawl failed");
    assert_eq!(summary.products_written, 1);

    let (_, rows) = read_csv(&csv_path);
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row[0], "Trail Runner");
    assert_eq!(row[1], "/img/trail.jpg");
    assert!(row[2].contains("<p>Light shoe</p>"), "Description keeps markup: {}", row[2]);
    assert_eq!(row[3], "TR-1");
    assert_eq!(row[4], "89,90");
    assert_eq!(row[5], format!("{}/p/trail-runner", base_url));
}

#[tokio::test]
async fn test_failed_pages_do_not_stop_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            r#"<a href="/p/gone">Gone</a><a href="/p/secret">Secret</a><a href="/p/ok">Ok</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/secret"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/ok"))
        .respond_with(json_ld_page(
            r#"{"@type": "Product", "name": "Survivor"}"#,
            "",
        ))
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = temp_dir.path().join("products.csv");
    let config = create_test_config(
        &format!("{}/", base_url),
        CrawlMode::Structured,
        &csv_path,
    );

    let (sink, mut events) = ChannelSink::new();
    let summary = run_crawl(config, Arc::new(sink), CancellationToken::new())
        .await
        .expect("Crawl failed");

    assert_eq!(summary.pages_visited, 4);
    assert_eq!(summary.pages_failed, 2);
    assert_eq!(summary.products_written, 1);

    let mut lines = Vec::new();
    let mut last = None;
    while let Ok(event) = events.try_recv() {
        if let CrawlEvent::Log(line) = &event {
            lines.push(line.clone());
        }
        last = Some(event);
    }

    assert!(matches!(last, Some(CrawlEvent::Finished(_))));
    assert!(lines.iter().any(|l| l.contains("403 Forbidden")));
    assert!(lines.iter().any(|l| l.contains("Non-2xx status code 404")));
    assert!(lines.iter().any(|l| l == "Visited: 4 | Queuing: 0 | product: 1."));
}

#[tokio::test]
async fn test_fetch_sends_browser_user_agent() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // A bare listener keeps the header exactly as it went over the wire;
    // the user agent contains commas, which header matchers may split on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("No connection");
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.expect("Read failed");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }
        socket
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok")
            .await
            .expect("Write failed");
        String::from_utf8_lossy(&request).into_owned()
    });

    let policy = fast_policy();
    let client = build_http_client(policy.timeout).expect("Failed to build client");
    let url = Url::parse(&format!("http://{}/p/1", addr)).unwrap();

    let outcome = fetch_url(
        &client,
        &url,
        &policy,
        &CancellationToken::new(),
        &CrawlLog::silent(),
    )
    .await;
    assert_eq!(outcome, FetchOutcome::Body("ok".to_string()));

    let request = server.await.expect("Server task failed");
    let user_agent = request
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("user-agent")
                .then(|| value.trim().to_string())
        })
        .expect("Request carried no user agent");
    assert_eq!(user_agent, USER_AGENT);
}

#[tokio::test]
async fn test_fetch_forbidden_is_denied() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&mock_server)
        .await;

    let policy = fast_policy();
    let client = build_http_client(policy.timeout).expect("Failed to build client");
    let url = Url::parse(&format!("{}/private", mock_server.uri())).unwrap();

    let outcome = fetch_url(
        &client,
        &url,
        &policy,
        &CancellationToken::new(),
        &CrawlLog::silent(),
    )
    .await;

    assert_eq!(outcome, FetchOutcome::Denied);
}

#[tokio::test]
async fn test_fetch_server_error_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let policy = fast_policy();
    let client = build_http_client(policy.timeout).expect("Failed to build client");
    let url = Url::parse(&format!("{}/broken", mock_server.uri())).unwrap();

    let outcome = fetch_url(
        &client,
        &url,
        &policy,
        &CancellationToken::new(),
        &CrawlLog::silent(),
    )
    .await;

    assert_eq!(outcome, FetchOutcome::HttpError(500));
}

#[tokio::test]
async fn test_fetch_timeout_retries_then_gives_up() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page("late").set_delay(Duration::from_secs(2)))
        .expect(3)
        .mount(&mock_server)
        .await;

    let policy = fast_policy();
    let client = build_http_client(policy.timeout).expect("Failed to build client");
    let url = Url::parse(&format!("{}/slow", mock_server.uri())).unwrap();

    let outcome = fetch_url(
        &client,
        &url,
        &policy,
        &CancellationToken::new(),
        &CrawlLog::silent(),
    )
    .await;

    assert_eq!(outcome, FetchOutcome::Timeout);
}

#[tokio::test]
async fn test_fetch_timeout_backoff_is_cancellable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page("late").set_delay(Duration::from_secs(2)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let policy = FetchPolicy {
        backoff_base: Duration::from_secs(30),
        ..fast_policy()
    };
    let client = build_http_client(policy.timeout).expect("Failed to build client");
    let url = Url::parse(&format!("{}/slow", mock_server.uri())).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(400)).await;
        trigger.cancel();
    });

    let outcome = fetch_url(&client, &url, &policy, &cancel, &CrawlLog::silent()).await;
    assert_eq!(outcome, FetchOutcome::Cancelled);
}

#[tokio::test]
async fn test_fetch_connection_refused() {
    // Grab a free port and release it so nothing is listening there
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
        listener.local_addr().unwrap().port()
    };

    let policy = fast_policy();
    let client = build_http_client(policy.timeout).expect("Failed to build client");
    let url = Url::parse(&format!("http://127.0.0.1:{}/", port)).unwrap();

    let outcome = fetch_url(
        &client,
        &url,
        &policy,
        &CancellationToken::new(),
        &CrawlLog::silent(),
    )
    .await;

    assert!(
        matches!(outcome, FetchOutcome::ConnectionError(_)),
        "Unexpected outcome: {:?}",
        outcome
    );
}

#[tokio::test]
async fn test_invalid_seed_creates_no_file() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = temp_dir.path().join("products.csv");
    let config = create_test_config("shop.example.com", CrawlMode::Structured, &csv_path);

    let (sink, mut events) = ChannelSink::new();
    let result = run_crawl(config, Arc::new(sink), CancellationToken::new()).await;

    assert!(matches!(result, Err(RippleError::Config(_))));
    assert!(!csv_path.exists(), "No CSV should be created for a bad seed");

    match events.try_recv() {
        Ok(CrawlEvent::Log(line)) => {
            assert!(line.starts_with("Invalid URL. Please provide a valid URL."))
        }
        other => panic!("Expected an error line, got {:?}", other),
    }
}

#[tokio::test]
async fn test_crawl_from_config_file() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(
            r#"<a href="/artikel/42">Lamp</a><a href="/kontakt">Contact</a>"#,
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/artikel/42"))
        .respond_with(json_ld_page(
            r#"{"@type": "Product", "name": "Desk Lamp",
                "offers": {"price": "24.00", "url": "https://shop.example.com/lamp"}}"#,
            "",
        ))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/kontakt"))
        .respond_with(html_page("contact"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = temp_dir.path().join("lamps.csv");
    let config_path = temp_dir.path().join("crawl.toml");

    // Blacklist given as a text block, mode via its alias
    let toml = format!(
        r#"
[crawler]
seed-url = "{}/"
mode = "json"
product-identifier = "/artikel/"
concurrency = 2

[filter]
blacklist = """
/kontakt

/cart
"""

[output]
csv-path = "{}"
"#,
        base_url,
        csv_path.display()
    );
    std::fs::write(&config_path, toml).expect("Failed to write config");

    let config = load_config(&config_path).expect("Failed to load config");
    assert_eq!(config.crawler.mode, CrawlMode::Structured);
    assert_eq!(config.filter.blacklist, vec!["/kontakt", "/cart"]);

    let summary = run_crawl(config, Arc::new(NullSink), CancellationToken::new())
        .await
        .expect("Crawl failed");
    assert_eq!(summary.products_written, 1);

    let (_, rows) = read_csv(&csv_path);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0][0], "Desk Lamp");
    assert_eq!(rows[0][4], "24,00");
    assert_eq!(rows[0][5], "https://shop.example.com/lamp");
}

#[tokio::test]
async fn test_rerun_truncates_csv() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html_page(r#"<a href="/p/1">One</a>"#))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/p/1"))
        .respond_with(json_ld_page(r#"{"@type": "Product", "name": "One"}"#, ""))
        .mount(&mock_server)
        .await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let csv_path = temp_dir.path().join("products.csv");
    let seed = format!("{}/", mock_server.uri());

    for _ in 0..2 {
        let config = create_test_config(&seed, CrawlMode::Structured, &csv_path);
        crawl(config).await.expect("Crawl failed");
    }

    let (_, rows) = read_csv(&csv_path);
    assert_eq!(rows.len(), 1, "Second run should replace the first file");
}
