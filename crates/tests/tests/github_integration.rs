use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};
use futures::StreamExt;
use simple_broker_core::github::{
    GithubApiConfig, GithubIntegration, GithubIntegrationConfig, GithubRepository,
    GithubRepositoryApi, GithubToken, RepositoryReference,
};
use simple_broker_core::{
    BrokerError, Integration, IntegrationId, IntegrationSet, PackageName, PackageStream,
    PackageVersion,
};
use simple_broker_tests::{FakeGithub, TEST_TOKEN};
use tokio::time::sleep;

fn api_config(upstream: &FakeGithub) -> GithubApiConfig {
    GithubApiConfig::default().with_base_url(upstream.base_url())
}

fn integration(
    upstream: &FakeGithub,
    repositories: Vec<RepositoryReference>,
) -> Result<GithubIntegration> {
    integration_with(api_config(upstream), repositories)
}

fn integration_with(
    api: GithubApiConfig,
    repositories: Vec<RepositoryReference>,
) -> Result<GithubIntegration> {
    Ok(GithubIntegration::new(GithubIntegrationConfig {
        token: Some(TEST_TOKEN.into()),
        repositories,
        api,
    })?)
}

async fn read_all(mut stream: PackageStream) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    while let Some(chunk) = stream.next().await {
        bytes.extend_from_slice(&chunk?);
    }
    Ok(bytes)
}

async fn wait_for<F>(mut predicate: F, timeout: Duration) -> Result<()>
where
    F: FnMut() -> bool,
{
    let step = Duration::from_millis(50);
    let mut elapsed = Duration::ZERO;
    while elapsed < timeout {
        if predicate() {
            return Ok(());
        }
        sleep(step).await;
        elapsed += step;
    }
    bail!("condition not met within {:?}", timeout);
}

#[tokio::test]
async fn api_lists_releases_with_bearer_token() -> Result<()> {
    let upstream = FakeGithub::start().await?;
    upstream.publish("acme/tools", "v1.0.0", &[("tools-1.0.0.tar.gz", b"sdist")]);

    let api = GithubRepositoryApi::with_client(
        GithubToken::new(TEST_TOKEN)?,
        RepositoryReference::new("acme", "tools"),
        Arc::new(api_config(&upstream)),
        api_config(&upstream).build_client()?,
    );
    let releases = api.retrieve_releases().await?;
    assert_eq!(releases.len(), 1);
    assert_eq!(releases[0].tag_name, "v1.0.0");
    assert_eq!(releases[0].assets[0].name, "tools-1.0.0.tar.gz");
    Ok(())
}

#[tokio::test]
async fn api_rejects_wrong_token_with_status() -> Result<()> {
    let upstream = FakeGithub::start().await?;
    upstream.publish("acme/tools", "v1", &[]);
    let api = GithubRepositoryApi::with_client(
        GithubToken::new("wrong")?,
        RepositoryReference::new("acme", "tools"),
        Arc::new(api_config(&upstream)),
        api_config(&upstream).build_client()?,
    );
    let err = api.retrieve_releases().await.unwrap_err();
    assert_eq!(err.upstream_status(), Some(401));
    Ok(())
}

#[tokio::test]
async fn repository_index_keeps_only_distributions_in_order() -> Result<()> {
    let upstream = FakeGithub::start().await?;
    upstream.publish(
        "acme/tools",
        "v2",
        &[("a.tar.gz", b"a"), ("b.whl", b"b"), ("c.zip", b"c")],
    );
    upstream.publish("acme/tools", "v1", &[("a.tar.gz", b"old"), ("notes.txt", b"n")]);

    let repository = GithubRepository::new(
        IntegrationId::new(),
        GithubRepositoryApi::with_client(
            GithubToken::new(TEST_TOKEN)?,
            RepositoryReference::new("acme", "tools"),
            Arc::new(api_config(&upstream)),
            api_config(&upstream).build_client()?,
        ),
    );
    let entry = repository.get_index().await?;
    assert_eq!(entry.package_name, PackageName::from("tools"));
    let versions: Vec<_> = entry
        .package_version_list
        .iter()
        .map(PackageVersion::as_str)
        .collect();
    assert_eq!(versions, vec!["a.tar.gz", "b.whl", "a.tar.gz"]);
    Ok(())
}

#[tokio::test]
async fn repository_download_does_not_need_prior_index() -> Result<()> {
    let upstream = FakeGithub::start().await?;
    upstream.publish("acme/tools", "v1", &[("tools-1.0.tar.gz", b"payload bytes")]);
    let repository = GithubRepository::new(
        IntegrationId::new(),
        GithubRepositoryApi::with_client(
            GithubToken::new(TEST_TOKEN)?,
            RepositoryReference::new("acme", "tools"),
            Arc::new(api_config(&upstream)),
            api_config(&upstream).build_client()?,
        ),
    );
    let stream = repository
        .get_download_package(&"tools".into(), &"tools-1.0.tar.gz".into())
        .await?;
    assert_eq!(read_all(stream).await?, b"payload bytes");

    let missing = repository
        .get_download_package(&"tools".into(), &"tools-2.0.tar.gz".into())
        .await;
    assert!(matches!(missing, Err(BrokerError::VersionNotFound { .. })));
    Ok(())
}

#[tokio::test]
async fn integration_index_follows_configuration_order() -> Result<()> {
    let upstream = FakeGithub::start().await?;
    upstream.publish("acme/slow", "v1", &[("slow-1.whl", b"s")]);
    upstream.publish("acme/fast", "v1", &[("fast-1.whl", b"f")]);
    upstream.delay("acme/slow", Duration::from_millis(150));

    let integration = integration(
        &upstream,
        vec![
            RepositoryReference::new("acme", "slow"),
            RepositoryReference::new("acme", "fast").with_package_name("quick"),
        ],
    )?;
    let index = integration.get_index().await?;
    let names: Vec<_> = index
        .iter()
        .map(|entry| entry.package_name.to_string())
        .collect();
    assert_eq!(names, vec!["slow", "quick"]);
    assert!(index.iter().all(|entry| entry.integration_id == integration.id()));
    assert_eq!(
        upstream.requests(),
        vec!["releases:acme/slow", "releases:acme/fast"]
    );
    Ok(())
}

#[tokio::test]
async fn integration_download_requires_cached_index() -> Result<()> {
    let upstream = FakeGithub::start().await?;
    upstream.publish("acme/pkg", "v1", &[("pkg-1.0.tar.gz", b"0123456789abcdef")]);
    let integration = integration(&upstream, vec![RepositoryReference::new("acme", "pkg")])?;

    let before = integration
        .get_download_package(&"pkg".into(), &"pkg-1.0.tar.gz".into())
        .await;
    assert!(matches!(before, Err(BrokerError::IndexNotLoaded)));
    assert!(upstream.requests().is_empty());

    integration.get_index().await?;
    let stream = integration
        .get_download_package(&"pkg".into(), &"pkg-1.0.tar.gz".into())
        .await?;
    assert_eq!(read_all(stream).await?, b"0123456789abcdef");

    let unknown_version = integration
        .get_download_package(&"pkg".into(), &"pkg-2.0.tar.gz".into())
        .await;
    assert!(matches!(
        unknown_version,
        Err(BrokerError::VersionNotFound { .. })
    ));
    let unknown_package = integration
        .get_download_package(&"other".into(), &"pkg-1.0.tar.gz".into())
        .await;
    assert!(matches!(
        unknown_package,
        Err(BrokerError::PackageNotFound { .. })
    ));
    Ok(())
}

#[tokio::test]
async fn release_removed_after_indexing_is_not_found() -> Result<()> {
    let upstream = FakeGithub::start().await?;
    upstream.publish("acme/pkg", "v1", &[("pkg-1.0.tar.gz", b"bytes")]);
    let integration = integration(&upstream, vec![RepositoryReference::new("acme", "pkg")])?;
    integration.get_index().await?;

    upstream.clear_releases("acme/pkg");
    let result = integration
        .get_download_package(&"pkg".into(), &"pkg-1.0.tar.gz".into())
        .await;
    assert!(matches!(result, Err(BrokerError::VersionNotFound { .. })));
    Ok(())
}

#[tokio::test]
async fn upstream_status_propagates_unchanged() -> Result<()> {
    let upstream = FakeGithub::start().await?;
    upstream.publish("acme/pkg", "v1", &[("pkg-1.0.tar.gz", b"bytes")]);
    let integration = integration(&upstream, vec![RepositoryReference::new("acme", "pkg")])?;
    integration.get_index().await?;

    upstream.fail_with("acme/pkg", 503);
    let index_err = integration.get_index().await.unwrap_err();
    assert!(matches!(
        index_err,
        BrokerError::UpstreamStatus { status: 503, .. }
    ));

    // The failed refresh leaves the previous snapshot in place.
    let download_err = integration
        .get_download_package(&"pkg".into(), &"pkg-1.0.tar.gz".into())
        .await
        .err()
        .expect("download should fail");
    assert!(matches!(
        download_err,
        BrokerError::UpstreamStatus { status: 503, .. }
    ));
    Ok(())
}

#[tokio::test]
async fn deleted_asset_surfaces_upstream_status() -> Result<()> {
    let upstream = FakeGithub::start().await?;
    upstream.publish("acme/pkg", "v1", &[("pkg-1.0.tar.gz", b"bytes")]);
    let integration = integration(&upstream, vec![RepositoryReference::new("acme", "pkg")])?;
    integration.get_index().await?;

    upstream.remove_asset("pkg-1.0.tar.gz");
    let err = integration
        .get_download_package(&"pkg".into(), &"pkg-1.0.tar.gz".into())
        .await
        .err()
        .expect("download should fail");
    assert!(matches!(
        err,
        BrokerError::UpstreamStatus { status: 404, .. }
    ));
    assert_eq!(err.class(), simple_broker_core::ErrorClass::Upstream);
    Ok(())
}

#[tokio::test]
async fn malformed_payload_fails_whole_call() -> Result<()> {
    let upstream = FakeGithub::start().await?;
    upstream.respond_raw(
        "acme/pkg",
        r#"[{"tag_name":"v1","name":"v1","assets":[]},{"tag_name":"v2","assets":[{"name":"x.whl"}]}]"#,
    );
    let integration = integration(&upstream, vec![RepositoryReference::new("acme", "pkg")])?;
    let err = integration.get_index().await.unwrap_err();
    assert!(matches!(err, BrokerError::UpstreamPayload { .. }));
    Ok(())
}

#[tokio::test]
async fn slow_listing_times_out_as_upstream_error() -> Result<()> {
    let upstream = FakeGithub::start().await?;
    upstream.publish("acme/pkg", "v1", &[]);
    upstream.delay("acme/pkg", Duration::from_secs(2));
    let integration = integration_with(
        api_config(&upstream).with_timeout(Duration::from_millis(100)),
        vec![RepositoryReference::new("acme", "pkg")],
    )?;
    let err = integration.get_index().await.unwrap_err();
    assert!(matches!(err, BrokerError::UpstreamTimeout { .. }));
    Ok(())
}

#[tokio::test]
async fn stalled_download_times_out_after_first_chunk() -> Result<()> {
    let upstream = FakeGithub::start().await?;
    upstream.publish_stalled("acme/pkg", "v1", "pkg-1.0.whl", b"head");
    let integration = integration_with(
        api_config(&upstream).with_timeout(Duration::from_millis(200)),
        vec![RepositoryReference::new("acme", "pkg")],
    )?;
    integration.get_index().await?;
    let mut stream = integration
        .get_download_package(&"pkg".into(), &"pkg-1.0.whl".into())
        .await?;
    let first = stream.next().await.expect("first chunk")?;
    assert_eq!(&first[..], b"head");
    let second = stream.next().await.expect("timeout error");
    assert!(matches!(second, Err(BrokerError::UpstreamTimeout { .. })));
    Ok(())
}

#[tokio::test]
async fn dropping_download_closes_upstream_connection() -> Result<()> {
    let upstream = FakeGithub::start().await?;
    upstream.publish_stalled("acme/pkg", "v1", "pkg-1.0.whl", b"head");
    let integration = integration(&upstream, vec![RepositoryReference::new("acme", "pkg")])?;
    integration.get_index().await?;
    let mut stream = integration
        .get_download_package(&"pkg".into(), &"pkg-1.0.whl".into())
        .await?;
    stream.next().await.expect("first chunk")?;
    assert!(!upstream.stalled_body_dropped());

    drop(stream);
    wait_for(|| upstream.stalled_body_dropped(), Duration::from_secs(5)).await
}

#[tokio::test]
async fn concurrent_index_refreshes_stay_consistent() -> Result<()> {
    let upstream = FakeGithub::start().await?;
    upstream.publish("acme/a", "v1", &[("a-1.whl", b"a")]);
    upstream.publish("acme/b", "v1", &[("b-1.whl", b"b")]);
    let integration = Arc::new(integration(
        &upstream,
        vec![
            RepositoryReference::new("acme", "a"),
            RepositoryReference::new("acme", "b"),
        ],
    )?);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let integration = Arc::clone(&integration);
            tokio::spawn(async move { integration.get_index().await })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await??.len(), 2);
    }
    let cached = integration.cached_index().expect("index cached");
    let names: Vec<_> = cached
        .iter()
        .map(|entry| entry.package_name.to_string())
        .collect();
    assert_eq!(names, vec!["a", "b"]);
    Ok(())
}

#[tokio::test]
async fn integration_set_merges_and_routes_downloads() -> Result<()> {
    let upstream = FakeGithub::start().await?;
    upstream.publish("one/foo", "v1", &[("foo-1.0.tar.gz", b"from-one")]);
    upstream.publish("two/foo", "v1", &[("foo-2.0.tar.gz", b"from-two")]);
    upstream.publish("two/bar", "v1", &[("bar-1.0.whl", b"bar-bytes")]);

    let first = integration(&upstream, vec![RepositoryReference::new("one", "foo")])?;
    let second = integration(
        &upstream,
        vec![
            RepositoryReference::new("two", "foo"),
            RepositoryReference::new("two", "bar"),
        ],
    )?;
    let set = IntegrationSet::new(vec![Arc::new(first), Arc::new(second)]);

    let names = set.list_packages().await?;
    assert_eq!(names, vec![PackageName::from("foo"), PackageName::from("bar")]);

    let foo_versions = set.list_versions(&"foo".into()).await?;
    assert_eq!(foo_versions, vec![PackageVersion::from("foo-1.0.tar.gz")]);

    let bar = set.download(&"bar".into(), &"bar-1.0.whl".into()).await?;
    assert_eq!(read_all(bar).await?, b"bar-bytes");

    // First match wins: foo-2.0 only exists in the shadowed integration.
    let shadowed = set.download(&"foo".into(), &"foo-2.0.tar.gz".into()).await;
    assert!(matches!(shadowed, Err(BrokerError::VersionNotFound { .. })));
    Ok(())
}
