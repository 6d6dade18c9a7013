//! Integration tests for net crate

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use relbuild_errors::{Error, IndexError};
    use relbuild_net::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_download_to() {
        let server = MockServer::start();
        let content = b"package payload";
        let mock = server.mock(|when, then| {
            when.method(GET).path("/pkgs/foo-1.0.0-1.noarch.rpm");
            then.status(200).body(content);
        });

        let temp = tempdir().unwrap();
        let dest = temp.path().join("foo-1.0.0-1.noarch.rpm");
        let client = NetClient::with_defaults().unwrap();

        let size = client
            .download_to(&server.url("/pkgs/foo-1.0.0-1.noarch.rpm"), &dest)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(size, content.len() as u64);
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), content);
        assert!(!temp.path().join(".foo-1.0.0-1.noarch.rpm.part").exists());
    }

    #[tokio::test]
    async fn test_status_classification() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/denied");
            then.status(403);
        });
        server.mock(|when, then| {
            when.method(GET).path("/busy");
            then.status(503);
        });

        let client = NetClient::with_defaults().unwrap();

        let denied = client.get(&server.url("/denied")).await.unwrap_err();
        assert!(matches!(denied, Error::Index(IndexError::Unauthorized { .. })));
        assert!(!is_transient(&denied));

        let busy = client.get(&server.url("/busy")).await.unwrap_err();
        assert!(matches!(
            busy,
            Error::Index(IndexError::Http { status: 503, .. })
        ));
        assert!(is_transient(&busy));
    }

    #[tokio::test]
    async fn test_failed_download_leaves_no_file() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/missing.rpm");
            then.status(404);
        });

        let temp = tempdir().unwrap();
        let dest = temp.path().join("missing.rpm");
        let client = NetClient::with_defaults().unwrap();

        assert!(client
            .download_to(&server.url("/missing.rpm"), &dest)
            .await
            .is_err());
        assert!(!dest.exists());
    }
}
