use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::{ClientConfig, Message};
use tracing::{info, warn};

use crate::config::Config;
use crate::dedup::ReplayedTargets;
use crate::error::WorkerError;
use crate::metrics_consts::{
    DUPLICATE_TARGETS, INVALID_TARGETS, NON_GET_RECORDS, RECORDS_RECEIVED,
    RECORDS_WITHOUT_CONNECTION, RECORD_PARSE_ERRORS, REPLAYS_COMPLETED, REPLAY_TRANSPORT_ERRORS,
    TRACKED_TARGETS,
};
use crate::record::{parse_record, ParsedRecord};
use crate::replay::{build_client, replay, ReplayOutcome};

/// Drives the stream end to end, one record at a time: Kafka record ->
/// descriptor -> dedup claim -> replay.
pub struct ReplayWorker {
    consumer: StreamConsumer,
    client: reqwest::Client,
    targets: ReplayedTargets,
}

impl ReplayWorker {
    pub fn new(config: &Config) -> Result<Self, WorkerError> {
        let kafka_config: ClientConfig = (&config.kafka).into();
        let consumer: StreamConsumer = kafka_config
            .create()
            .map_err(WorkerError::ConsumerCreation)?;
        consumer
            .subscribe(&[config.kafka.kafka_topic.as_str()])
            .map_err(|error| WorkerError::Subscribe {
                topic: config.kafka.kafka_topic.clone(),
                error,
            })?;

        Ok(Self {
            consumer,
            client: build_client(config)?,
            targets: ReplayedTargets::new(config.dedup_max_targets),
        })
    }

    /// Process records in arrival order until the stream fails. A replay for
    /// record N always finishes before record N+1 is read. Stream errors are
    /// fatal: librdkafka handles broker reconnects below us, so an error
    /// surfacing here means the consumer is not coming back.
    pub async fn run(&self) -> Result<(), WorkerError> {
        info!("starting replay loop");
        loop {
            let message = self.consumer.recv().await?;
            let Some(payload) = message.payload() else {
                warn!("received record with no payload");
                continue;
            };
            process_record(&self.client, &self.targets, payload).await;
        }
    }
}

/// Run one record through the pipeline. Every failure here is per-record:
/// log, count, skip, and the stream moves on.
async fn process_record(client: &reqwest::Client, targets: &ReplayedTargets, payload: &[u8]) {
    metrics::counter!(RECORDS_RECEIVED).increment(1);

    let descriptor = match parse_record(payload) {
        Ok(ParsedRecord::Request(descriptor)) => descriptor,
        Ok(ParsedRecord::NoConnection) => {
            metrics::counter!(RECORDS_WITHOUT_CONNECTION).increment(1);
            return;
        }
        Err(error) => {
            metrics::counter!(RECORD_PARSE_ERRORS).increment(1);
            warn!("failed to parse record: {}", error);
            return;
        }
    };

    // Only GETs are replayed; everything else is dropped without touching
    // the dedup index.
    if descriptor.method != "GET" {
        metrics::counter!(NON_GET_RECORDS).increment(1);
        return;
    }

    let key = match descriptor.target_key() {
        Ok(key) => key,
        Err(error) => {
            metrics::counter!(INVALID_TARGETS).increment(1);
            warn!(url = %descriptor.url, "skipping record with malformed url: {}", error);
            return;
        }
    };

    // Claim before dispatch, so a concurrent dispatcher could never send the
    // same target twice.
    if !targets.claim(&key) {
        metrics::counter!(DUPLICATE_TARGETS).increment(1);
        return;
    }
    metrics::gauge!(TRACKED_TARGETS).set(targets.len() as f64);

    match replay(client, &descriptor).await {
        ReplayOutcome::Completed(status) => {
            metrics::counter!(REPLAYS_COMPLETED).increment(1);
            info!(url = %descriptor.url, status = status.as_u16(), "replayed request");
        }
        ReplayOutcome::InvalidTarget(reason) => {
            metrics::counter!(INVALID_TARGETS).increment(1);
            warn!(url = %descriptor.url, "replay target invalid: {}", reason);
        }
        ReplayOutcome::TransportError(error) => {
            metrics::counter!(REPLAY_TRANSPORT_ERRORS).increment(1);
            warn!(url = %descriptor.url, "replay failed in transport: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use httpmock::MockServer;
    use serde_json::{json, Value};

    use super::*;

    // A sensor record whose Host header points at the mock server, so the
    // reconstructed URL resolves to it.
    fn sensor_record(server: &MockServer, uri: &str) -> Value {
        json!({
            "host": "10.0.0.5",
            "agentId": "a1",
            "t": 1700000000,
            "method": "GET",
            "resp_p": "8080",
            "uri": uri,
            "Content-Type": "-",
            "Accept-Encoding": "-",
            "Referer": "-",
            "Cookie": "-",
            "Origin": "-",
            "Host": server.address().to_string(),
            "Accept-Language": "-",
            "Accept": "-",
            "Accept-Charset": "-",
            "Connection": "-",
            "User-Agent": "replay-probe/1.0",
        })
    }

    async fn feed(targets: &ReplayedTargets, record: &Value) {
        let client = reqwest::Client::new();
        process_record(&client, targets, record.to_string().as_bytes()).await;
    }

    #[tokio::test]
    async fn repeated_records_replay_once() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET")
                .path("/x")
                .header("User-Agent", "replay-probe/1.0");
            then.status(200);
        });

        let targets = ReplayedTargets::new(0);
        let record = sensor_record(&server, "/x");
        feed(&targets, &record).await;
        feed(&targets, &record).await;

        mock.assert_hits(1);
        assert_eq!(targets.len(), 1);
    }

    #[tokio::test]
    async fn same_endpoint_with_other_query_is_a_duplicate() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET").path("/x");
            then.status(200);
        });

        let targets = ReplayedTargets::new(0);
        feed(&targets, &sensor_record(&server, "/x?a=1")).await;
        feed(&targets, &sensor_record(&server, "/x?b=2")).await;

        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn non_get_records_never_dispatch_or_claim() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET").path("/x");
            then.status(200);
        });

        let targets = ReplayedTargets::new(0);
        let mut record = sensor_record(&server, "/x");
        record["method"] = json!("POST");
        feed(&targets, &record).await;

        mock.assert_hits(0);
        assert!(targets.is_empty());

        // The same target over GET still gets its first replay.
        feed(&targets, &sensor_record(&server, "/x")).await;
        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn sentinel_port_never_dispatches() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET").path("/x");
            then.status(200);
        });

        let targets = ReplayedTargets::new(0);
        let mut record = sensor_record(&server, "/x");
        record["resp_p"] = json!("-");
        feed(&targets, &record).await;

        mock.assert_hits(0);
        assert!(targets.is_empty());
    }

    #[tokio::test]
    async fn malformed_records_are_skipped_and_the_pipeline_continues() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method("GET").path("/x");
            then.status(200);
        });

        let targets = ReplayedTargets::new(0);
        let client = reqwest::Client::new();
        process_record(&client, &targets, b"{ definitely not json").await;

        let mut incomplete = sensor_record(&server, "/x");
        incomplete.as_object_mut().unwrap().remove("uri");
        feed(&targets, &incomplete).await;

        feed(&targets, &sensor_record(&server, "/x")).await;
        mock.assert_hits(1);
    }

    #[tokio::test]
    async fn absent_host_header_never_dispatches() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.any_request();
            then.status(200);
        });

        let targets = ReplayedTargets::new(0);
        let mut record = sensor_record(&server, "/x");
        record["Host"] = json!("-");
        feed(&targets, &record).await;

        mock.assert_hits(0);
        assert!(targets.is_empty());
    }
}
