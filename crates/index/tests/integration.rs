//! Integration tests for the HTTP index client

use httpmock::prelude::*;
use relbuild_index::{
    download_with_retry, HttpIndexClient, Index, IndexCache, PackageIndexClient,
};
use relbuild_net::{NetConfig, RetryConfig};
use std::time::Duration;
use tempfile::tempdir;

fn index_json() -> String {
    let mut index = Index::new();
    index.add("pupmod-foo-1.0.0-1.noarch.rpm", None).unwrap();
    index
        .add("pupmod-foo-1.2.0-1.noarch.rpm", Some("pkgs/pupmod-foo-1.2.0-1.noarch.rpm".into()))
        .unwrap();
    index.to_json().unwrap()
}

#[tokio::test]
async fn available_reports_newest_published_build() {
    let server = MockServer::start();
    let index_mock = server.mock(|when, then| {
        when.method(GET).path("/repo/index.json");
        then.status(200).body(index_json());
    });

    let temp = tempdir().unwrap();
    let cache = IndexCache::new(temp.path());
    let client = HttpIndexClient::connect(
        &server.url("/repo/index.json"),
        &cache,
        true,
        &NetConfig::default(),
        None,
    )
    .await
    .unwrap();

    index_mock.assert();
    let found = client.available("pupmod-foo").await.unwrap().unwrap();
    assert_eq!(found.version, "1.2.0");
    assert!(client.available("pupmod-bar").await.unwrap().is_none());
    assert!(cache.index_path().is_file());
}

#[tokio::test]
async fn cached_index_is_reused_without_refresh() {
    let server = MockServer::start();
    let index_mock = server.mock(|when, then| {
        when.method(GET).path("/index.json");
        then.status(200).body(index_json());
    });

    let temp = tempdir().unwrap();
    let cache = IndexCache::new(temp.path());
    let url = server.url("/index.json");

    HttpIndexClient::connect(&url, &cache, true, &NetConfig::default(), None)
        .await
        .unwrap();
    let client = HttpIndexClient::connect(&url, &cache, false, &NetConfig::default(), None)
        .await
        .unwrap();

    index_mock.assert_hits(1);
    assert_eq!(client.index().package_count(), 1);
}

#[tokio::test]
async fn download_resolves_relative_locations() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repo/index.json");
        then.status(200).body(index_json());
    });
    let pkg_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/repo/pkgs/pupmod-foo-1.2.0-1.noarch.rpm");
        then.status(200).body("rpm-bytes");
    });

    let temp = tempdir().unwrap();
    let cache = IndexCache::new(temp.path().join("cache"));
    let client = HttpIndexClient::connect(
        &server.url("/repo/index.json"),
        &cache,
        true,
        &NetConfig::default(),
        None,
    )
    .await
    .unwrap();

    let dist = temp.path().join("dist");
    let path = client.download("pupmod-foo", &dist).await.unwrap();
    pkg_mock.assert();
    assert_eq!(path, dist.join("pupmod-foo-1.2.0-1.noarch.rpm"));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "rpm-bytes");
}

#[tokio::test]
async fn unreachable_index_fails_construction() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/index.json");
        then.status(404);
    });

    let temp = tempdir().unwrap();
    let result = HttpIndexClient::connect(
        &server.url("/index.json"),
        &IndexCache::new(temp.path()),
        true,
        &NetConfig::default(),
        None,
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn server_errors_consume_retry_budget() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repo/index.json");
        then.status(200).body(index_json());
    });
    let pkg_mock = server.mock(|when, then| {
        when.method(GET)
            .path("/repo/pkgs/pupmod-foo-1.2.0-1.noarch.rpm");
        then.status(503);
    });

    let temp = tempdir().unwrap();
    let client = HttpIndexClient::connect(
        &server.url("/repo/index.json"),
        &IndexCache::new(temp.path().join("cache")),
        true,
        &NetConfig::default(),
        None,
    )
    .await
    .unwrap();

    let candidate = client.available("pupmod-foo").await.unwrap().unwrap();
    let retry = RetryConfig::default()
        .with_attempts(3)
        .with_initial_delay(Duration::from_millis(1));
    let result =
        download_with_retry(&client, &candidate, &temp.path().join("dist"), &retry, &None).await;

    assert!(result.is_err());
    pkg_mock.assert_hits(3);
}
