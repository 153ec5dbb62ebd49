//! Retry decorator behaviour around structured generation.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use common::*;
use platewise::providers::StructuredGenerator;
use platewise::{
    GenerateOptions, Message, OutputSchema, Platewise, PlatewiseError, RecordingSink, Result,
    RetryConfig, RetryingGenerator,
};

/// Fails a fixed number of times, then answers with a one-item meal.
struct FailThenSucceed {
    fail_count: AtomicU32,
    fail_with: fn() -> PlatewiseError,
    total_calls: AtomicU32,
}

impl FailThenSucceed {
    fn new(failures: u32, fail_with: fn() -> PlatewiseError) -> Self {
        Self {
            fail_count: AtomicU32::new(failures),
            fail_with,
            total_calls: AtomicU32::new(0),
        }
    }

    fn call_count(&self) -> u32 {
        self.total_calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl StructuredGenerator for FailThenSucceed {
    fn name(&self) -> &str {
        "mock-retry"
    }

    async fn generate_structured(
        &self,
        _messages: &[Message],
        _schema: &OutputSchema,
        _options: &GenerateOptions,
    ) -> Result<serde_json::Value> {
        self.total_calls.fetch_add(1, Ordering::Relaxed);
        let remaining = self.fail_count.load(Ordering::Relaxed);
        if remaining > 0 {
            self.fail_count.fetch_sub(1, Ordering::Relaxed);
            return Err((self.fail_with)());
        }
        Ok(serde_json::json!({
            "foodItems": [{"foodName": "apple", "quantity": "1 medium"}]
        }))
    }
}

fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig::new()
        .max_attempts(max_attempts)
        .initial_delay(Duration::from_millis(1))
        .max_delay(Duration::from_millis(5))
        .jitter(false)
}

async fn call(generator: &dyn StructuredGenerator) -> Result<serde_json::Value> {
    generator
        .generate_structured(
            &[Message::user("hi")],
            &OutputSchema::new("food_items", serde_json::json!({"type": "object"})),
            &GenerateOptions::default().model("test"),
        )
        .await
}

#[tokio::test]
async fn transient_errors_are_retried_until_success() {
    let inner = Arc::new(FailThenSucceed::new(2, || {
        PlatewiseError::Http("connection reset".into())
    }));
    let retrying = RetryingGenerator::new(inner.clone(), fast_retry(3));

    let value = call(&retrying).await.unwrap();
    assert_eq!(value["foodItems"][0]["foodName"], "apple");
    assert_eq!(inner.call_count(), 3);
}

#[tokio::test]
async fn server_errors_are_transient() {
    let inner = Arc::new(FailThenSucceed::new(1, || PlatewiseError::Api {
        status: 503,
        message: "unavailable".into(),
    }));
    let retrying = RetryingGenerator::new(inner.clone(), fast_retry(3));

    assert!(call(&retrying).await.is_ok());
    assert_eq!(inner.call_count(), 2);
}

#[tokio::test]
async fn gives_up_after_max_attempts() {
    let inner = Arc::new(FailThenSucceed::new(10, || {
        PlatewiseError::Http("connection reset".into())
    }));
    let retrying = RetryingGenerator::new(inner.clone(), fast_retry(3));

    let err = call(&retrying).await.unwrap_err();
    assert!(matches!(err, PlatewiseError::Http(_)));
    assert_eq!(inner.call_count(), 3);
}

#[tokio::test]
async fn permanent_errors_are_not_retried() {
    let cases: [fn() -> PlatewiseError; 4] = [
        || PlatewiseError::AuthenticationFailed,
        || PlatewiseError::InvalidInput("bad".into()),
        || PlatewiseError::MalformedResponse("garbage".into()),
        || PlatewiseError::Api {
            status: 400,
            message: "bad request".into(),
        },
    ];

    for fail_with in cases {
        let inner = Arc::new(FailThenSucceed::new(1, fail_with));
        let retrying = RetryingGenerator::new(inner.clone(), fast_retry(5));
        assert!(call(&retrying).await.is_err());
        assert_eq!(inner.call_count(), 1);
    }
}

#[tokio::test(start_paused = true)]
async fn retry_after_hint_is_honoured() {
    let inner = Arc::new(FailThenSucceed::new(1, || PlatewiseError::RateLimited {
        retry_after: Some(Duration::from_secs(3)),
    }));
    let retrying = RetryingGenerator::new(inner.clone(), fast_retry(2));

    let start = tokio::time::Instant::now();
    assert!(call(&retrying).await.is_ok());
    assert!(start.elapsed() >= Duration::from_secs(3));
    assert_eq!(inner.call_count(), 2);
}

#[tokio::test]
async fn name_passes_through() {
    let inner = Arc::new(FailThenSucceed::new(0, || PlatewiseError::EmptyResponse));
    let retrying = RetryingGenerator::new(inner, RetryConfig::default());
    assert_eq!(retrying.name(), "mock-retry");
}

#[tokio::test]
async fn analyzer_retries_vision_when_configured() {
    let inner = Arc::new(FailThenSucceed::new(1, || {
        PlatewiseError::Http("connection reset".into())
    }));
    let database = Arc::new(StubDatabase::new().candidates(
        "apple",
        vec![full_record(
            "Apples, raw",
            platewise::DataType::Foundation,
            52.0,
            0.3,
            13.8,
            0.2,
        )],
    ));
    let analyzer = Platewise::builder()
        .generator(inner.clone())
        .database(database.clone())
        .retry(fast_retry(3))
        .event_sink(Arc::new(RecordingSink::new()))
        .build()
        .unwrap();

    let foods = analyzer.analyze(&test_image()).await.unwrap();
    assert_eq!(foods.len(), 1);
    assert_eq!(inner.call_count(), 2);
    // lookups are never retried
    assert_eq!(database.calls_made(), 1);
}

#[tokio::test]
async fn analyzer_without_retry_fails_fast() {
    let inner = Arc::new(FailThenSucceed::new(1, || {
        PlatewiseError::Http("connection reset".into())
    }));
    let analyzer = Platewise::builder()
        .generator(inner.clone())
        .event_sink(Arc::new(RecordingSink::new()))
        .build()
        .unwrap();

    let err = analyzer.analyze(&test_image()).await.unwrap_err();
    assert!(matches!(err, PlatewiseError::VisionExtraction(_)));
    assert_eq!(inner.call_count(), 1);
}
