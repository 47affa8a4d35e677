//! Integration tests for the trip file fetcher against a local server

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use fare_data::{DataError, NycTaxiFetcher};
use polars::prelude::*;

fn parquet_bytes() -> Vec<u8> {
    let mut df = df!(
        "id" => [1i64, 2, 3],
        "name" => ["Alice", "Bob", "Charlie"],
    )
    .unwrap();
    let mut buf = Vec::new();
    ParquetWriter::new(&mut buf).finish(&mut df).unwrap();
    buf
}

/// Serve one month of green trips and 404 for everything else.
async fn serve() -> String {
    let body = parquet_bytes();
    let app = Router::new().route(
        "/trip-data/green_tripdata_2023-01.parquet",
        get(move || {
            let body = body.clone();
            async move { body }
        }),
    );
    let app = app.fallback(|| async { StatusCode::NOT_FOUND });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/trip-data/")
}

#[tokio::test]
async fn test_fetch_decodes_parquet() {
    let base = serve().await;
    let fetcher = NycTaxiFetcher::new("green").unwrap().with_base_url(base);

    let df = fetcher.fetch(2023, 1).await.unwrap();
    assert_eq!(df.height(), 3);
    assert!(df.column("id").is_ok());
}

#[tokio::test]
async fn test_fetch_fails_on_http_error() {
    let base = serve().await;
    let fetcher = NycTaxiFetcher::new("green").unwrap().with_base_url(base);

    let err = fetcher.fetch(2023, 2).await.unwrap_err();
    assert!(matches!(err, DataError::Http { status: 404, .. }));
}
