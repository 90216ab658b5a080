use std::str::FromStr;
use std::time;

use envconfig::Envconfig;
use rdkafka::ClientConfig;

#[derive(Envconfig, Clone)]
pub struct Config {
    #[envconfig(nested = true)]
    pub kafka: KafkaConfig,

    /// Egress proxy all replayed requests are routed through. Empty means
    /// connect directly.
    #[envconfig(default = "")]
    pub proxy_url: String,

    #[envconfig(default = "30000")]
    pub request_timeout: EnvMsDuration,

    /// How many replayed target keys to remember. 0 keeps every target for
    /// the lifetime of the process; a non-zero value bounds the index with
    /// LRU eviction, at the cost of occasionally replaying an evicted target
    /// a second time.
    #[envconfig(default = "0")]
    pub dedup_max_targets: usize,
}

#[derive(Envconfig, Clone)]
pub struct KafkaConfig {
    #[envconfig(default = "kafka:9092")]
    pub kafka_hosts: String,
    #[envconfig(default = "zeek_http_records")]
    pub kafka_topic: String,
    #[envconfig(default = "replay-worker")]
    pub kafka_consumer_group: String,
    #[envconfig(default = "false")]
    pub kafka_tls: bool,
    #[envconfig(default = "false")]
    pub verify_ssl_certificate: bool,
}

impl From<&KafkaConfig> for ClientConfig {
    fn from(config: &KafkaConfig) -> Self {
        let mut client_config = ClientConfig::new();
        client_config
            .set("bootstrap.servers", &config.kafka_hosts)
            .set("statistics.interval.ms", "10000")
            .set("group.id", config.kafka_consumer_group.clone());

        if config.kafka_tls {
            client_config.set("security.protocol", "ssl").set(
                "enable.ssl.certificate.verification",
                config.verify_ssl_certificate.to_string(),
            );
        };
        client_config
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvMsDuration(pub time::Duration);

#[derive(Debug, PartialEq, Eq)]
pub struct ParseEnvMsDurationError;

impl FromStr for EnvMsDuration {
    type Err = ParseEnvMsDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let ms = s.parse::<u64>().map_err(|_| ParseEnvMsDurationError)?;

        Ok(EnvMsDuration(time::Duration::from_millis(ms)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_ms_duration() {
        let duration: EnvMsDuration = "2500".parse().expect("failed to parse duration");
        assert_eq!(duration.0, time::Duration::from_millis(2500));

        assert_eq!(
            "not a number".parse::<EnvMsDuration>(),
            Err(ParseEnvMsDurationError)
        );
    }

    #[test]
    fn test_kafka_client_config() {
        let kafka = KafkaConfig {
            kafka_hosts: "broker-1:9092,broker-2:9092".to_string(),
            kafka_topic: "zeek_http_records".to_string(),
            kafka_consumer_group: "replay-worker".to_string(),
            kafka_tls: false,
            verify_ssl_certificate: false,
        };

        let client_config: ClientConfig = (&kafka).into();
        assert_eq!(
            client_config.get("bootstrap.servers"),
            Some("broker-1:9092,broker-2:9092")
        );
        assert_eq!(client_config.get("group.id"), Some("replay-worker"));
        assert_eq!(client_config.get("security.protocol"), None);
    }
}
