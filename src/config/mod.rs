//! Startup configuration.
//!
//! Every value has a default matching the local development cluster, so an
//! empty (or absent) config file yields a working setup. A TOML file overrides any subset of fields:
//!
//! ```toml
//! [kafka]
//! brokers = ["kafka-1:9092", "kafka-2:9092"]
//!
//! [classification]
//! high_value_threshold = "2500.00"
//!
//! [consumer]
//! poll_timeout = "500ms"
//!
//! [groups]
//! reporting = "reporting-service-eu"
//! ```

pub mod duration;

use anyhow::{Context, Result};
use bank_pipeline_kafka_producer::ProducerConfig;
use bank_pipeline_kafka_source::ConsumerConfig;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use transaction_types::TopicNames;

use crate::services::Service;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub kafka: KafkaConfig,
    pub topics: TopicNames,
    pub classification: ClassificationConfig,
    pub consumer: ConsumerSettings,
    pub groups: GroupIds,
}

/// Broker connection settings shared by the router and the services
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KafkaConfig {
    pub brokers: Vec<String>,
    /// Client id the router reports to the broker
    pub client_id: String,
    pub message_timeout_ms: u64,
    pub session_timeout_ms: u64,
    /// Where a consumer group with no committed offset starts ("earliest" or "latest")
    pub auto_offset_reset: String,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: vec![
                "localhost:9092".to_string(),
                "localhost:9093".to_string(),
                "localhost:9094".to_string(),
            ],
            client_id: "banking-api".to_string(),
            message_timeout_ms: 5000,
            session_timeout_ms: 30000,
            auto_offset_reset: "earliest".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassificationConfig {
    /// Amounts strictly above this are high-value
    pub high_value_threshold: Decimal,
}

impl Default for ClassificationConfig {
    fn default() -> Self {
        Self {
            high_value_threshold: Decimal::new(100000, 2),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ConsumerSettings {
    #[serde(deserialize_with = "duration::deserialize")]
    pub poll_timeout: Duration,
    pub max_batch_size: usize,
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(1),
            max_batch_size: 500,
        }
    }
}

/// Consumer group id per service. Groups must be distinct.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GroupIds {
    pub account_manager: String,
    pub high_value: String,
    pub reporting: String,
    pub user_notification: String,
}

impl Default for GroupIds {
    fn default() -> Self {
        Self {
            account_manager: "account-manager-service".to_string(),
            high_value: "high-value-service".to_string(),
            reporting: "reporting-service".to_string(),
            user_notification: "user-notification-service".to_string(),
        }
    }
}

impl GroupIds {
    pub fn for_service(&self, service: Service) -> &str {
        match service {
            Service::AccountManager => &self.account_manager,
            Service::HighValue => &self.high_value,
            Service::Reporting => &self.reporting,
            Service::UserNotification => &self.user_notification,
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or use the defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file {}", path.display()))?;
                Self::from_toml_str(&content)
                    .with_context(|| format!("Invalid config file {}", path.display()))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to deserialize configuration")
    }

    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(!self.kafka.brokers.is_empty(), "at least one broker is required");
        anyhow::ensure!(
            self.consumer.max_batch_size > 0,
            "consumer.max_batch_size must be at least 1"
        );

        let topics = self.topics.all();
        for (i, topic) in topics.iter().enumerate() {
            anyhow::ensure!(
                !topics[..i].contains(topic),
                "topic '{topic}' is configured for more than one label"
            );
        }

        let groups: Vec<&str> = Service::ALL
            .iter()
            .map(|service| self.groups.for_service(*service))
            .collect();
        for (i, group) in groups.iter().enumerate() {
            anyhow::ensure!(
                !groups[..i].contains(group),
                "consumer group '{group}' is shared by more than one service"
            );
        }

        Ok(())
    }

    pub fn brokers(&self) -> String {
        self.kafka.brokers.join(",")
    }

    pub fn producer_config(&self) -> ProducerConfig {
        ProducerConfig {
            brokers: self.brokers(),
            client_id: self.kafka.client_id.clone(),
            message_timeout_ms: self.kafka.message_timeout_ms,
        }
    }

    pub fn consumer_config(&self, group_id: &str) -> ConsumerConfig {
        ConsumerConfig {
            brokers: self.brokers(),
            group_id: group_id.to_string(),
            auto_offset_reset: self.kafka.auto_offset_reset.clone(),
            session_timeout_ms: self.kafka.session_timeout_ms.to_string(),
            max_batch_size: self.consumer.max_batch_size,
        }
    }
}
