use rdkafka::error::KafkaError;
use thiserror::Error;

/// Per-record failures while decoding a sensor record. None of these stop the
/// pipeline: the offending record is logged and skipped.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record is not a JSON object")]
    NotAnObject,
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
    #[error("wrong type for fields: {}", .0.join(", "))]
    TypeMismatch(Vec<&'static str>),
}

/// Errors that stop the worker. Stream errors are fatal by policy: librdkafka
/// owns broker reconnects below us, so an error surfacing from the consumer
/// means the stream is not coming back.
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("failed to create Kafka consumer: {0}")]
    ConsumerCreation(#[source] KafkaError),
    #[error("failed to subscribe to topic {topic}: {error}")]
    Subscribe {
        topic: String,
        #[source]
        error: KafkaError,
    },
    #[error("error reading from stream: {0}")]
    Stream(#[from] KafkaError),
    #[error("invalid proxy url {url}: {error}")]
    InvalidProxy {
        url: String,
        #[source]
        error: reqwest::Error,
    },
    #[error("failed to construct HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}
