use criterion::criterion_group;
use criterion::criterion_main;
use criterion::{BenchmarkId, Criterion, Throughput};
use http::Method;
use ossreq_aliyun_oss::{Credential, SignRequest, SigningContext, V1Signer, V4Signer};
use ossreq_core::crc64;
use ossreq_core::RequestMessage;

criterion_group!(benches, bench_sign, bench_crc64);
criterion_main!(benches);

fn request() -> RequestMessage {
    RequestMessage::new(
        Method::GET,
        "https://test.oss-cn-hangzhou.aliyuncs.com/dir/hello?acl"
            .parse()
            .expect("url must be valid"),
    )
}

fn context() -> SigningContext {
    SigningContext::new("cn-hangzhou")
        .with_bucket("test")
        .with_key("dir/hello")
        .with_credential(Credential::new("access_key_id", "secret_access_key"))
}

pub fn bench_sign(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("runtime must be created");
    let mut group = c.benchmark_group("oss_sign");

    group.bench_function("v4_header", |b| {
        b.to_async(&rt).iter(|| async {
            let mut req = request();
            let mut ctx = context();
            V4Signer::new()
                .sign_request(&mut req, &mut ctx)
                .await
                .expect("must success")
        })
    });

    group.bench_function("v4_query", |b| {
        b.to_async(&rt).iter(|| async {
            let mut req = request();
            let mut ctx = context().with_query(None);
            V4Signer::new()
                .sign_request(&mut req, &mut ctx)
                .await
                .expect("must success")
        })
    });

    group.bench_function("v1_header", |b| {
        b.to_async(&rt).iter(|| async {
            let mut req = request();
            let mut ctx = context();
            V1Signer::new()
                .sign_request(&mut req, &mut ctx)
                .await
                .expect("must success")
        })
    });

    group.finish()
}

pub fn bench_crc64(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc64");

    for size in [4 * 1024, 1024 * 1024] {
        let data = vec![0x5a_u8; size];
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::new("checksum", size), &data, |b, data| {
            b.iter(|| crc64::checksum(data))
        });
    }

    group.bench_function("combine", |b| {
        let crc1 = crc64::checksum(b"hello, ");
        let crc2 = crc64::checksum(b"world");
        b.iter(|| crc64::combine(crc1, crc2, 5))
    });

    group.finish()
}
