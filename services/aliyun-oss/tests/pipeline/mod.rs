use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use chrono::{NaiveDateTime, SecondsFormat, TimeDelta, Utc};
use futures::StreamExt;
use http::{Method, StatusCode};
use ossreq_aliyun_oss::retry::FixedDelayBackoff;
use ossreq_aliyun_oss::{
    AnonymousCredentialProvider, ClosureCredentialProvider, Config, Credential, ExecuteOptions,
    OperationInput, SignatureVersion, StandardRetryer,
};
use ossreq_core::{Body, Error, ErrorKind, Result, StreamBody};
use pretty_assertions::assert_eq;
use tokio_util::sync::CancellationToken;

use super::mock::{client_builder, client_builder_with, error_xml, MockHttpSend, Recorded};

fn get_object() -> OperationInput {
    OperationInput::new(Method::GET)
        .with_bucket("bucket")
        .with_key("dir/key.txt")
}

fn put_object(body: impl Into<Body>) -> OperationInput {
    OperationInput::new(Method::PUT)
        .with_bucket("bucket")
        .with_key("dir/key.json")
        .with_body(body)
}

fn oss_date(req: &Recorded) -> NaiveDateTime {
    let v = req.header("x-oss-date").expect("x-oss-date must be set");
    NaiveDateTime::parse_from_str(v, "%Y%m%dT%H%M%SZ").expect("x-oss-date must be valid")
}

#[tokio::test]
async fn test_execute_get_object() -> Result<()> {
    let mock = MockHttpSend::new().push(
        StatusCode::OK,
        &[("x-oss-request-id", "534B371674E88A4D8906****")],
        "hello, world",
    );
    let client = client_builder(&mock).build()?;

    let output = client.execute(get_object(), ExecuteOptions::default()).await?;
    assert_eq!(output.status, StatusCode::OK);
    assert_eq!(output.body, Bytes::from_static(b"hello, world"));

    let reqs = mock.requests();
    assert_eq!(reqs.len(), 1);
    let req = &reqs[0];
    assert_eq!(req.method, Method::GET);
    assert_eq!(
        req.uri.to_string(),
        "https://bucket.oss-cn-hangzhou.aliyuncs.com/dir/key.txt"
    );
    assert_eq!(req.header("x-oss-content-sha256"), Some("UNSIGNED-PAYLOAD"));
    assert!(req
        .header("authorization")
        .expect("authorization must be set")
        .starts_with("OSS4-HMAC-SHA256 Credential=ak/"));
    assert!(req
        .header("user-agent")
        .expect("user-agent must be set")
        .starts_with("ossreq/"));
    Ok(())
}

#[tokio::test]
async fn test_execute_put_object() -> Result<()> {
    let mock = MockHttpSend::new().push(
        StatusCode::OK,
        &[("x-oss-hash-crc64ecma", "11051210869376104954")],
        "",
    );
    let client = client_builder(&mock).build()?;

    let progress = Arc::new(AtomicUsize::new(0));
    let reported = progress.clone();
    let options = ExecuteOptions::default().with_progress(move |transferred, total| {
        assert_eq!(total, Some(transferred));
        reported.fetch_add(transferred as usize, Ordering::SeqCst);
    });
    client.execute(put_object("123456789"), options).await?;

    let req = &mock.requests()[0];
    assert_eq!(req.body, Bytes::from_static(b"123456789"));
    assert_eq!(req.header("content-length"), Some("9"));
    assert_eq!(req.header("content-type"), Some("application/json"));
    assert_eq!(progress.load(Ordering::SeqCst), 9);
    Ok(())
}

#[tokio::test]
async fn test_execute_v1() -> Result<()> {
    let mock = MockHttpSend::new();
    let client = client_builder_with(
        &mock,
        Config::default()
            .with_region("cn-hangzhou")
            .with_signature_version(SignatureVersion::V1),
    )
    .build()?;

    client.execute(get_object(), ExecuteOptions::default()).await?;

    let req = &mock.requests()[0];
    assert!(req
        .header("authorization")
        .expect("authorization must be set")
        .starts_with("OSS ak:"));
    assert!(req.header("date").is_some());
    assert!(req.header("x-oss-date").is_none());
    Ok(())
}

#[tokio::test]
async fn test_execute_anonymous() -> Result<()> {
    let mock = MockHttpSend::new();
    let client = client_builder(&mock)
        .with_credential_provider(AnonymousCredentialProvider::new())
        .build()?;

    client.execute(get_object(), ExecuteOptions::default()).await?;

    let req = &mock.requests()[0];
    assert!(req.header("authorization").is_none());
    Ok(())
}

#[tokio::test]
async fn test_execute_ip_endpoint_uses_path_style() -> Result<()> {
    let mock = MockHttpSend::new();
    let client = client_builder_with(
        &mock,
        Config::default()
            .with_region("cn-hangzhou")
            .with_endpoint("http://127.0.0.1:8080"),
    )
    .build()?;

    client.execute(get_object(), ExecuteOptions::default()).await?;

    assert_eq!(
        mock.requests()[0].uri.to_string(),
        "http://127.0.0.1:8080/bucket/dir/key.txt"
    );
    Ok(())
}

#[tokio::test]
async fn test_retry_server_error_until_max_attempts() -> Result<()> {
    let mock = MockHttpSend::new().push(
        StatusCode::INTERNAL_SERVER_ERROR,
        &[],
        &error_xml("InternalError", "We encountered an internal error.", ""),
    );
    let client = client_builder(&mock).build()?;

    let err = client
        .execute(get_object(), ExecuteOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Service);
    let se = err.service_error().expect("must be service error");
    assert_eq!(se.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(se.code, "InternalError");
    assert_eq!(se.request_id, "5C3D9175B6FC201293AD****");
    assert_eq!(se.ec, "0002-00000040");
    assert_eq!(mock.attempts(), 3);

    // Per call options override the retryer.
    let mock = MockHttpSend::new().push(StatusCode::SERVICE_UNAVAILABLE, &[], "");
    let client = client_builder(&mock).build()?;
    let _ = client
        .execute(
            get_object(),
            ExecuteOptions::default().with_retry_max_attempts(5),
        )
        .await
        .unwrap_err();
    assert_eq!(mock.attempts(), 5);
    Ok(())
}

#[tokio::test]
async fn test_retry_then_succeed() -> Result<()> {
    let mock = MockHttpSend::new()
        .push(StatusCode::SERVICE_UNAVAILABLE, &[], "")
        .push(StatusCode::OK, &[], "ok");
    let client = client_builder(&mock).build()?;

    let output = client.execute(get_object(), ExecuteOptions::default()).await?;
    assert_eq!(output.body, Bytes::from_static(b"ok"));

    let reqs = mock.requests();
    assert_eq!(reqs.len(), 2);
    // Every attempt is signed afresh.
    assert!(reqs.iter().all(|r| r.header("authorization").is_some()));
    Ok(())
}

#[tokio::test]
async fn test_no_retry_on_client_error() -> Result<()> {
    let mock = MockHttpSend::new().push(
        StatusCode::FORBIDDEN,
        &[],
        &error_xml("AccessDenied", "You have no right to access this object.", ""),
    );
    let client = client_builder(&mock).build()?;

    let err = client
        .execute(get_object(), ExecuteOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.service_error().map(|v| v.code.as_str()), Some("AccessDenied"));
    assert_eq!(mock.attempts(), 1);
    Ok(())
}

#[tokio::test]
async fn test_no_retry_with_stream_body() -> Result<()> {
    let mock = MockHttpSend::new().push(StatusCode::INTERNAL_SERVER_ERROR, &[], "");
    let client = client_builder(&mock).build()?;

    let stream = futures::stream::iter(vec![Ok(Bytes::from_static(b"streamed"))]).boxed();
    let err = client
        .execute(
            put_object(StreamBody::new(stream, Some(8))),
            ExecuteOptions::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Service);
    assert_eq!(mock.attempts(), 1);
    assert_eq!(mock.requests()[0].body, Bytes::from_static(b"streamed"));
    Ok(())
}

#[tokio::test]
async fn test_file_body_is_replayed() -> Result<()> {
    use std::io::Write;

    let mut f = tempfile::NamedTempFile::new()?;
    f.write_all(b"file content")?;

    let mock = MockHttpSend::new()
        .push(StatusCode::INTERNAL_SERVER_ERROR, &[], "")
        .push(StatusCode::OK, &[], "");
    let client = client_builder(&mock).build()?;

    client
        .execute(
            put_object(Body::File(f.path().to_path_buf())),
            ExecuteOptions::default(),
        )
        .await?;

    let reqs = mock.requests();
    assert_eq!(reqs.len(), 2);
    for req in reqs {
        assert_eq!(req.body, Bytes::from_static(b"file content"));
        assert_eq!(req.header("content-length"), Some("12"));
    }
    Ok(())
}

#[tokio::test]
async fn test_clock_skew_correction() -> Result<()> {
    let server_time = (Utc::now() + TimeDelta::hours(2)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let mock = MockHttpSend::new()
        .push(
            StatusCode::FORBIDDEN,
            &[],
            &error_xml(
                "RequestTimeTooSkewed",
                "The difference between the request time and the current time is too large.",
                &format!("\n  <ServerTime>{server_time}</ServerTime>"),
            ),
        )
        .push(StatusCode::OK, &[], "");
    let client = client_builder(&mock).build()?;

    client.execute(get_object(), ExecuteOptions::default()).await?;

    let reqs = mock.requests();
    assert_eq!(reqs.len(), 2);
    let skew = oss_date(&reqs[1]) - oss_date(&reqs[0]);
    assert!(
        skew > TimeDelta::minutes(110) && skew < TimeDelta::minutes(130),
        "second attempt must be signed with the server clock, got {skew}"
    );
    Ok(())
}

#[tokio::test]
async fn test_clock_skew_correction_from_date_header() -> Result<()> {
    let server_date = (Utc::now() + TimeDelta::hours(2))
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string();
    let mock = MockHttpSend::new()
        .push(
            StatusCode::FORBIDDEN,
            &[("date", server_date.as_str())],
            &error_xml(
                "InvalidArgument",
                "Invalid signing date in Authorization header.",
                "",
            ),
        )
        .push(StatusCode::OK, &[], "");
    let client = client_builder(&mock).build()?;

    client.execute(get_object(), ExecuteOptions::default()).await?;

    let reqs = mock.requests();
    assert_eq!(reqs.len(), 2);
    let skew = oss_date(&reqs[1]) - oss_date(&reqs[0]);
    assert!(
        skew > TimeDelta::minutes(110) && skew < TimeDelta::minutes(130),
        "second attempt must be signed with the server clock, got {skew}"
    );
    Ok(())
}

#[tokio::test]
async fn test_clock_skew_correction_keeps_backoff_time() -> Result<()> {
    let server_time = (Utc::now() + TimeDelta::hours(2)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let mock = MockHttpSend::new()
        .push(
            StatusCode::FORBIDDEN,
            &[],
            &error_xml(
                "RequestTimeTooSkewed",
                "The difference between the request time and the current time is too large.",
                &format!("\n  <ServerTime>{server_time}</ServerTime>"),
            ),
        )
        .push(StatusCode::OK, &[], "");
    let client = client_builder(&mock)
        .with_retryer(
            StandardRetryer::new().with_backoff(FixedDelayBackoff::new(Duration::from_secs(2))),
        )
        .build()?;

    client.execute(get_object(), ExecuteOptions::default()).await?;

    // The server clock kept running while we slept before the retry.
    let reqs = mock.requests();
    assert_eq!(reqs.len(), 2);
    let server_time = NaiveDateTime::parse_from_str(&server_time, "%Y-%m-%dT%H:%M:%SZ")
        .expect("server time must be valid");
    let ahead = oss_date(&reqs[1]) - server_time;
    assert!(
        ahead >= TimeDelta::seconds(1) && ahead < TimeDelta::seconds(10),
        "retry must be signed at server time plus the backoff, got {ahead}"
    );
    Ok(())
}

#[tokio::test]
async fn test_clock_skew_correction_disabled() -> Result<()> {
    let server_time = (Utc::now() + TimeDelta::hours(2)).to_rfc3339_opts(SecondsFormat::Secs, true);
    let mock = MockHttpSend::new()
        .push(
            StatusCode::FORBIDDEN,
            &[],
            &error_xml(
                "RequestTimeTooSkewed",
                "The difference between the request time and the current time is too large.",
                &format!("\n  <ServerTime>{server_time}</ServerTime>"),
            ),
        )
        .push(StatusCode::OK, &[], "");
    let mut config = Config::default().with_region("cn-hangzhou");
    config.feature_flags.correct_clock_skew = false;
    let client = client_builder_with(&mock, config).build()?;

    client.execute(get_object(), ExecuteOptions::default()).await?;

    let reqs = mock.requests();
    assert_eq!(reqs.len(), 2);
    let skew = oss_date(&reqs[1]) - oss_date(&reqs[0]);
    assert!(skew < TimeDelta::minutes(1), "clock must not be corrected, got {skew}");
    Ok(())
}

#[tokio::test]
async fn test_download_crc_mismatch() -> Result<()> {
    let mock = MockHttpSend::new().push(
        StatusCode::OK,
        &[("x-oss-hash-crc64ecma", "1")],
        "123456789",
    );
    let client = client_builder(&mock)
        .with_retryer(ossreq_aliyun_oss::retry::NopRetryer)
        .build()?;

    let err = client
        .execute(get_object(), ExecuteOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ChecksumMismatch);
    assert_eq!(err.checksum_values(), Some((11051210869376104954, 1)));
    Ok(())
}

#[tokio::test]
async fn test_download_crc_skipped_for_partial_content() -> Result<()> {
    let mock = MockHttpSend::new().push(
        StatusCode::PARTIAL_CONTENT,
        &[("x-oss-hash-crc64ecma", "1")],
        "1234",
    );
    let client = client_builder(&mock).build()?;

    let output = client.execute(get_object(), ExecuteOptions::default()).await?;
    assert_eq!(output.status, StatusCode::PARTIAL_CONTENT);

    // Disabled checks ignore the header too.
    let mock = MockHttpSend::new().push(
        StatusCode::OK,
        &[("x-oss-hash-crc64ecma", "1")],
        "123456789",
    );
    let mut config = Config::default().with_region("cn-hangzhou");
    config.feature_flags.enable_crc64_check_download = false;
    let client = client_builder_with(&mock, config).build()?;
    client.execute(get_object(), ExecuteOptions::default()).await?;
    Ok(())
}

#[tokio::test]
async fn test_upload_crc_mismatch() -> Result<()> {
    let mock = MockHttpSend::new().push(
        StatusCode::OK,
        &[("x-oss-hash-crc64ecma", "42")],
        "",
    );
    let client = client_builder(&mock).build()?;

    let err = client
        .execute(put_object("123456789"), ExecuteOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ChecksumMismatch);
    assert_eq!(err.checksum_values(), Some((11051210869376104954, 42)));
    // Checksum mismatches are retried.
    assert_eq!(mock.attempts(), 3);
    Ok(())
}

#[tokio::test]
async fn test_response_handlers() -> Result<()> {
    let mock = MockHttpSend::new().push(StatusCode::OK, &[("etag", "\"abc\"")], "");
    let client = client_builder(&mock)
        .with_retryer(ossreq_aliyun_oss::retry::NopRetryer)
        .build()?;

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    let options = ExecuteOptions::default()
        .push_response_handler(move |resp| {
            assert_eq!(resp.header("etag"), Some("\"abc\""));
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
        .push_response_handler(|resp| match resp.header("x-oss-version-id") {
            Some(_) => Ok(()),
            None => Err(Error::unexpected("version id is missing")),
        });

    let err = client.execute(get_object(), options).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unexpected);
    assert_eq!(seen.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_credential_fetch_error() -> Result<()> {
    let mock = MockHttpSend::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let client = client_builder(&mock)
        .with_credential_provider(ClosureCredentialProvider::new(move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err::<Credential, _>(Error::unexpected("sts is down"))
            }
        }))
        .build()?;

    let err = client
        .execute(get_object(), ExecuteOptions::default())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CredentialFetch);
    assert_eq!(mock.attempts(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    Ok(())
}

#[tokio::test]
async fn test_cancel_before_execute() -> Result<()> {
    let mock = MockHttpSend::new();
    let client = client_builder(&mock).build()?;

    let token = CancellationToken::new();
    token.cancel();
    let err = client
        .execute(get_object(), ExecuteOptions::default().with_cancellation(token))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Canceled);
    assert_eq!(mock.attempts(), 0);
    Ok(())
}

#[tokio::test]
async fn test_cancel_during_backoff() -> Result<()> {
    let mock = MockHttpSend::new().push(StatusCode::INTERNAL_SERVER_ERROR, &[], "");
    let client = client_builder(&mock)
        .with_retryer(StandardRetryer::new().with_backoff(FixedDelayBackoff::new(
            Duration::from_secs(30),
        )))
        .build()?;

    let token = CancellationToken::new();
    let canceler = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceler.cancel();
    });

    let start = Instant::now();
    let err = client
        .execute(get_object(), ExecuteOptions::default().with_cancellation(token))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Canceled);
    assert_eq!(mock.attempts(), 1);
    assert!(start.elapsed() < Duration::from_secs(10));
    Ok(())
}

#[tokio::test]
async fn test_transport_timeout() -> Result<()> {
    let mock = MockHttpSend::new().with_delay(Duration::from_secs(5));
    let client = client_builder(&mock)
        .with_retryer(ossreq_aliyun_oss::retry::NopRetryer)
        .build()?;

    let err = client
        .execute(
            get_object(),
            ExecuteOptions::default().with_timeout(Duration::from_millis(50)),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    Ok(())
}

#[tokio::test]
async fn test_invalid_input() -> Result<()> {
    let mock = MockHttpSend::new();
    let client = client_builder(&mock).build()?;

    let err = client
        .execute(
            OperationInput::new(Method::GET).with_bucket("-bad-"),
            ExecuteOptions::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RequestInvalid);
    assert_eq!(mock.attempts(), 0);
    Ok(())
}
