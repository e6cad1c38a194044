use std::collections::HashMap;
use std::time::Duration;

use memcached_profile::client::{KeyDetail, MemcachedStats};
use memcached_profile::config::Config;
use memcached_profile::filter::PatternSet;
use memcached_profile::{profile, Error};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;

/// Start a one-connection fake memcached that answers each command from `replies`.
/// Unknown commands get `ERROR`.
async fn fake_memcached(replies: &[(&str, &str)]) -> u16 {
    let replies: Vec<(&str, &[u8])> = replies
        .iter()
        .map(|(cmd, reply)| (*cmd, reply.as_bytes()))
        .collect();
    fake_memcached_raw(&replies).await
}

/// Like [`fake_memcached`] but replies are raw bytes, which need not be UTF-8.
async fn fake_memcached_raw(replies: &[(&str, &[u8])]) -> u16 {
    let replies: HashMap<String, Vec<u8>> = replies
        .iter()
        .map(|(cmd, reply)| (cmd.to_string(), reply.to_vec()))
        .collect();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        while reader.read_line(&mut line).await.unwrap_or(0) > 0 {
            let reply = replies
                .get(line.trim_end())
                .cloned()
                .unwrap_or_else(|| b"ERROR\r\n".to_vec());
            if reader.get_mut().write_all(&reply).await.is_err() {
                break;
            }
            line.clear();
        }
    });

    port
}

const STATS_ITEMS: &str = "STAT items:1:number 2\r\n\
                           STAT items:1:age 30\r\n\
                           STAT items:1:number_hot 0\r\n\
                           STAT items:3:number 1\r\n\
                           STAT items:3:age 12\r\n\
                           END\r\n";

const SLAB_1: &str = "ITEM a:1 [10 b; 1700000000 s]\r\n\
                      ITEM b:1 [20 b; 1700000000 s]\r\n\
                      END\r\n";

const SLAB_3: &str = "ITEM a:2 [30 b; 1700000000 s]\r\nEND\r\n";

fn healthy_server() -> Vec<(&'static str, &'static str)> {
    vec![
        ("stats items", STATS_ITEMS),
        ("stats cachedump 1 0", SLAB_1),
        ("stats cachedump 3 0", SLAB_3),
    ]
}

fn config(port: u16, patterns: &[&str], limit: usize) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port,
        limit,
        patterns: PatternSet::new(patterns).unwrap(),
        verbose: true,
        json: false,
        connect_timeout: Duration::from_secs(2),
    }
}

#[tokio::test]
async fn test_slab_ids_and_key_details() {
    let port = fake_memcached(&healthy_server()).await;
    let mut stats = MemcachedStats::connect("127.0.0.1", port, Duration::from_secs(2))
        .await
        .expect("connect failed");

    assert_eq!(stats.slab_ids().await.unwrap(), vec![1, 3]);

    let details = stats.key_details(0).await.unwrap();
    assert_eq!(
        details,
        vec![
            KeyDetail::new("a:1", "10 b", "1700000000 s"),
            KeyDetail::new("b:1", "20 b", "1700000000 s"),
            KeyDetail::new("a:2", "30 b", "1700000000 s"),
        ]
    );
}

#[tokio::test]
async fn test_profile_matching_keys() {
    let port = fake_memcached(&healthy_server()).await;
    let report = profile::run(&config(port, &["^a:"], 0)).await.expect("profile failed");

    assert_eq!(report.slabs, 2);
    assert_eq!(report.matched, 2);
    assert_eq!(report.total_bytes, 40);
    let stats = report.stats.expect("stats present");
    assert_eq!(stats.smallest, 10);
    assert_eq!(stats.largest, 30);
    assert_eq!(stats.average, 20.0);
}

#[tokio::test]
async fn test_profile_respects_match_limit() {
    let port = fake_memcached(&healthy_server()).await;
    let report = profile::run(&config(port, &["^a:"], 1)).await.expect("profile failed");

    assert_eq!(report.matched, 1);
    assert_eq!(report.total_bytes, 10);
}

#[tokio::test]
async fn test_profile_no_matches() {
    let port = fake_memcached(&healthy_server()).await;
    let report = profile::run(&config(port, &["^nothing$"], 0)).await.expect("profile failed");

    assert_eq!(report.slabs, 2);
    assert_eq!(report.matched, 0);
    assert_eq!(report.total_bytes, 0);
    assert!(report.stats.is_none());
}

#[tokio::test]
async fn test_profile_empty_cache() {
    let port = fake_memcached(&[("stats items", "END\r\n")]).await;
    let report = profile::run(&config(port, &[], 0)).await.expect("profile failed");

    assert_eq!(report.slabs, 0);
    assert_eq!(report.matched, 0);
}

#[tokio::test]
async fn test_malformed_size_aborts() {
    let port = fake_memcached(&[
        ("stats items", "STAT items:1:number 1\r\nEND\r\n"),
        ("stats cachedump 1 0", "ITEM a:1 [10 kb; 0 s]\r\nEND\r\n"),
    ])
    .await;
    let err = profile::run(&config(port, &[], 0)).await.unwrap_err();
    assert!(matches!(err, Error::MalformedSize { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_server_error_reply() {
    let port = fake_memcached(&[
        ("stats items", "STAT items:1:number 1\r\nEND\r\n"),
        ("stats cachedump 1 0", "SERVER_ERROR cachedump disabled\r\n"),
    ])
    .await;
    let err = profile::run(&config(port, &[], 0)).await.unwrap_err();
    match err {
        Error::Server { command, reply } => {
            assert_eq!(command, "stats cachedump 1 0");
            assert_eq!(reply, "SERVER_ERROR cachedump disabled");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unexpected_reply_line() {
    let port = fake_memcached(&[
        ("stats items", "STAT items:1:number 1\r\nEND\r\n"),
        ("stats cachedump 1 0", "VALUE a:1 0 10\r\nEND\r\n"),
    ])
    .await;
    let err = profile::run(&config(port, &[], 0)).await.unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_connection_closed_mid_reply() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 64];
        let _ = tokio::io::AsyncReadExt::read(&mut stream, &mut buf).await;
        let _ = stream.write_all(b"STAT items:1:number 1\r\n").await;
    });

    let mut stats = MemcachedStats::connect("127.0.0.1", port, Duration::from_secs(2))
        .await
        .unwrap();
    let err = stats.slab_ids().await.unwrap_err();
    assert!(matches!(err, Error::ConnectionClosed(_)), "got {err:?}");
}

const BINARY_KEY_ITEMS: &[u8] = b"STAT items:1:number 2\r\nEND\r\n";

#[tokio::test]
async fn test_non_utf8_key_names_are_kept() {
    let port = fake_memcached_raw(&[
        ("stats items", BINARY_KEY_ITEMS),
        (
            "stats cachedump 1 0",
            &b"ITEM caf\xe9:1 [10 b; 0 s]\r\nITEM ok:2 [20 b; 0 s]\r\nEND\r\n"[..],
        ),
    ])
    .await;

    let mut stats = MemcachedStats::connect("127.0.0.1", port, Duration::from_secs(2))
        .await
        .unwrap();
    let details = stats.key_details(0).await.expect("cachedump with binary key failed");
    assert_eq!(
        details,
        vec![
            KeyDetail::new("caf\u{fffd}:1", "10 b", "0 s"),
            KeyDetail::new("ok:2", "20 b", "0 s"),
        ]
    );
}

#[tokio::test]
async fn test_profile_skips_unmatched_non_utf8_key() {
    let port = fake_memcached_raw(&[
        ("stats items", BINARY_KEY_ITEMS),
        (
            "stats cachedump 1 0",
            &b"ITEM \xff\xfe [10 b; 0 s]\r\nITEM ok:2 [20 b; 0 s]\r\nEND\r\n"[..],
        ),
    ])
    .await;

    let report = profile::run(&config(port, &["^ok:"], 0)).await.expect("profile failed");
    assert_eq!(report.matched, 1);
    assert_eq!(report.total_bytes, 20);
}
