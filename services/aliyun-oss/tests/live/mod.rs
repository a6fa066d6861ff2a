use std::env;

use http::{Method, StatusCode};
use log::warn;
use ossreq_aliyun_oss::{
    Client, Config, ExecuteOptions, OperationInput, PresignOptions, StaticCredentialProvider,
};
use ossreq_core::{Context, Result};
use ossreq_http_send_reqwest::ReqwestHttpSend;

use super::mock::init_logger;

fn init_client() -> Option<(Client, String)> {
    init_logger();

    if env::var("OSSREQ_ALIYUN_OSS_TEST").ok().as_deref() != Some("on") {
        return None;
    }

    let access_key_id =
        env::var("OSSREQ_ALIYUN_OSS_ACCESS_KEY").expect("env OSSREQ_ALIYUN_OSS_ACCESS_KEY must set");
    let access_key_secret =
        env::var("OSSREQ_ALIYUN_OSS_SECRET_KEY").expect("env OSSREQ_ALIYUN_OSS_SECRET_KEY must set");
    let region =
        env::var("OSSREQ_ALIYUN_OSS_REGION").expect("env OSSREQ_ALIYUN_OSS_REGION must set");
    let bucket =
        env::var("OSSREQ_ALIYUN_OSS_BUCKET").expect("env OSSREQ_ALIYUN_OSS_BUCKET must set");

    let client = Client::builder(Config::default().with_region(&region))
        .with_context(Context::new().with_http_send(ReqwestHttpSend::default()))
        .with_credential_provider(StaticCredentialProvider::new(
            &access_key_id,
            &access_key_secret,
        ))
        .build()
        .expect("client must be built");
    Some((client, bucket))
}

#[tokio::test]
async fn test_live_put_get_object() -> Result<()> {
    let Some((client, bucket)) = init_client() else {
        warn!("OSSREQ_ALIYUN_OSS_TEST is not set, skipped");
        return Ok(());
    };

    client
        .execute(
            OperationInput::new(Method::PUT)
                .with_bucket(&bucket)
                .with_key("ossreq/hello.txt")
                .with_body("hello, oss"),
            ExecuteOptions::default(),
        )
        .await?;

    let output = client
        .execute(
            OperationInput::new(Method::GET)
                .with_bucket(&bucket)
                .with_key("ossreq/hello.txt"),
            ExecuteOptions::default(),
        )
        .await?;
    assert_eq!(output.body.as_ref(), b"hello, oss");
    Ok(())
}

#[tokio::test]
async fn test_live_get_not_exist_object() -> Result<()> {
    let Some((client, bucket)) = init_client() else {
        warn!("OSSREQ_ALIYUN_OSS_TEST is not set, skipped");
        return Ok(());
    };

    let err = client
        .execute(
            OperationInput::new(Method::GET)
                .with_bucket(&bucket)
                .with_key("ossreq/not_exist_file"),
            ExecuteOptions::default(),
        )
        .await
        .unwrap_err();
    let se = err.service_error().expect("must be service error");
    assert_eq!(se.status, StatusCode::NOT_FOUND);
    assert_eq!(se.code, "NoSuchKey");
    Ok(())
}

#[tokio::test]
async fn test_live_presigned_get() -> Result<()> {
    let Some((client, bucket)) = init_client() else {
        warn!("OSSREQ_ALIYUN_OSS_TEST is not set, skipped");
        return Ok(());
    };

    let presigned = client
        .presign(
            OperationInput::new(Method::GET)
                .with_bucket(&bucket)
                .with_key("ossreq/not_exist_file"),
            PresignOptions::default(),
        )
        .await?;

    let resp = reqwest::get(&presigned.url)
        .await
        .expect("request must be sent");
    // A valid signature reaches the object lookup.
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    Ok(())
}
