use chrono::{TimeDelta, Utc};
use http::Method;
use ossreq_aliyun_oss::{
    AnonymousCredentialProvider, ClosureCredentialProvider, Config, Credential, OperationInput,
    PresignOptions, SignatureVersion,
};
use ossreq_core::{ErrorKind, Result};
use pretty_assertions::assert_eq;
use std::time::Duration;

use super::mock::{client_builder, client_builder_with, MockHttpSend};

fn get_object() -> OperationInput {
    OperationInput::new(Method::GET)
        .with_bucket("bucket")
        .with_key("dir/key.txt")
}

#[tokio::test]
async fn test_presign_v4() -> Result<()> {
    let mock = MockHttpSend::new();
    let client = client_builder(&mock).build()?;

    let result = client.presign(get_object(), PresignOptions::default()).await?;
    assert_eq!(result.method, Method::GET);
    assert!(result
        .url
        .starts_with("https://bucket.oss-cn-hangzhou.aliyuncs.com/dir/key.txt?"));
    assert!(result
        .url
        .contains("x-oss-signature-version=OSS4-HMAC-SHA256"));
    assert!(result.url.contains("x-oss-expires=900"));
    assert!(result.url.contains("x-oss-credential="));
    assert!(result.url.contains("x-oss-signature="));
    assert!(!result.signed_headers.contains_key("authorization"));
    assert!(!result.signed_headers.contains_key("user-agent"));

    let expiration = result.expiration.expect("expiration must be set");
    let remaining = expiration - Utc::now();
    assert!(remaining > TimeDelta::minutes(14) && remaining <= TimeDelta::minutes(15));

    // Presigning never touches the network.
    assert_eq!(mock.attempts(), 0);
    Ok(())
}

#[tokio::test]
async fn test_presign_returns_only_signed_headers() -> Result<()> {
    let mock = MockHttpSend::new();
    let mut config = Config::default().with_region("cn-hangzhou");
    config.additional_headers = vec!["Abc".to_string()];
    let client = client_builder_with(&mock, config).build()?;

    let input = OperationInput::new(Method::PUT)
        .with_bucket("bucket")
        .with_key("dir/key.txt")
        .with_header("content-type", "text/plain")?
        .with_header("x-oss-meta-a", "a")?
        .with_header("abc", "signed")?
        .with_header("cache-control", "no-cache")?;
    let result = client.presign(input, PresignOptions::default()).await?;

    assert_eq!(result.signed_headers.get("content-type").map(String::as_str), Some("text/plain"));
    assert_eq!(result.signed_headers.get("x-oss-meta-a").map(String::as_str), Some("a"));
    assert_eq!(result.signed_headers.get("abc").map(String::as_str), Some("signed"));
    assert!(!result.signed_headers.contains_key("cache-control"));
    assert!(result.url.contains("x-oss-additional-headers=abc"));
    Ok(())
}

#[tokio::test]
async fn test_presign_with_security_token() -> Result<()> {
    let mock = MockHttpSend::new();
    let client = client_builder(&mock)
        .with_credential_provider(ClosureCredentialProvider::new(|| async {
            Ok(Credential::new("ak", "sk").with_security_token("token"))
        }))
        .build()?;

    let result = client
        .presign(
            get_object(),
            PresignOptions::default().with_expires_in(Duration::from_secs(3600)),
        )
        .await?;
    assert!(result.url.contains("x-oss-security-token=token"));
    // The signing time is a little after the options were built.
    assert!(
        result.url.contains("x-oss-expires=3600") || result.url.contains("x-oss-expires=3599")
    );
    Ok(())
}

#[tokio::test]
async fn test_presign_v4_expiration_too_long() -> Result<()> {
    let mock = MockHttpSend::new();
    let client = client_builder(&mock).build()?;

    let err = client
        .presign(
            get_object(),
            PresignOptions::default().with_expires_in(Duration::from_secs(8 * 24 * 3600)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExpirationTooLong);
    Ok(())
}

#[tokio::test]
async fn test_presign_v1() -> Result<()> {
    let mock = MockHttpSend::new();
    let client = client_builder_with(
        &mock,
        Config::default()
            .with_region("cn-hangzhou")
            .with_signature_version(SignatureVersion::V1),
    )
    .build()?;

    // V1 has no upper bound on expiration.
    let expiration = Utc::now() + TimeDelta::days(30);
    let result = client
        .presign(
            get_object(),
            PresignOptions::default().with_expiration(expiration),
        )
        .await?;
    assert!(result.url.contains("OSSAccessKeyId=ak"));
    assert!(result
        .url
        .contains(&format!("Expires={}", expiration.timestamp())));
    assert!(result.url.contains("Signature="));
    assert_eq!(
        result.expiration.map(|v| v.timestamp()),
        Some(expiration.timestamp())
    );
    Ok(())
}

#[tokio::test]
async fn test_presign_anonymous() -> Result<()> {
    let mock = MockHttpSend::new();
    let client = client_builder(&mock)
        .with_credential_provider(AnonymousCredentialProvider::new())
        .build()?;

    let result = client.presign(get_object(), PresignOptions::default()).await?;
    assert_eq!(
        result.url,
        "https://bucket.oss-cn-hangzhou.aliyuncs.com/dir/key.txt"
    );
    assert_eq!(result.expiration, None);
    Ok(())
}
