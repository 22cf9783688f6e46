//! Client round-trip benchmarks against an in-process fake server.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use easydb_client::{Client, Connection};
use easydb_protocol::{Status, Value};
use easydb_schema::{ColumnType, Schema};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::runtime::Runtime;

const BUFFER_SIZE: usize = 4096;

fn bench_schema() -> Schema {
    Schema::builder()
        .table(
            "Users",
            [("name", ColumnType::String), ("age", ColumnType::Integer)],
        )
        .build()
        .unwrap()
}

/// Answers every request with the same canned response.
async fn fake_server(mut socket: DuplexStream, response: Vec<u8>) {
    let mut buf = vec![0u8; BUFFER_SIZE];
    loop {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                if socket.write_all(&response).await.is_err() {
                    break;
                }
            }
        }
    }
}

fn setup_client(rt: &Runtime, response: Vec<u8>) -> Client<DuplexStream> {
    let (client, server) = tokio::io::duplex(BUFFER_SIZE);
    rt.spawn(fake_server(server, response));
    Client::with_connection(bench_schema(), Connection::from_stream(client, BUFFER_SIZE))
}

fn bench_insert_round_trip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut response = Status::Ok.code().to_be_bytes().to_vec();
    response.extend_from_slice(&1i64.to_be_bytes());
    response.extend_from_slice(&1i64.to_be_bytes());
    let client = setup_client(&rt, response);
    let row = [Value::from("Alice"), Value::Integer(30)];

    let mut group = c.benchmark_group("client_insert");
    group.throughput(Throughput::Elements(1));
    group.bench_function("insert", |b| {
        b.to_async(&rt)
            .iter(|| async { black_box(client.insert("Users", &row).await.unwrap()) });
    });
    group.finish();
}

fn bench_scan_round_trip(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut response = Status::Ok.code().to_be_bytes().to_vec();
    response.extend_from_slice(&100i32.to_be_bytes());
    for id in 0..100i64 {
        response.extend_from_slice(&id.to_be_bytes());
    }
    let client = setup_client(&rt, response);

    let mut group = c.benchmark_group("client_scan");
    group.throughput(Throughput::Elements(100));
    group.bench_function("scan_100_ids", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(
                client
                    .scan(
                        "Users",
                        easydb_protocol::Operator::Gt,
                        Some("age"),
                        Some(Value::Integer(18)),
                    )
                    .await
                    .unwrap(),
            )
        });
    });
    group.finish();
}

criterion_group!(benches, bench_insert_round_trip, bench_scan_round_trip);
criterion_main!(benches);
