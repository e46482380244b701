//! Log entry structure and its flattened document form

use super::error::Result;
use super::fields::Fields;
use super::log_level::LogLevel;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// A single log record
///
/// The timestamp is fixed when the entry is created. Optional parts are
/// attached with the `with_*` builders before the entry enters the pipeline;
/// after that it is only read.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    timestamp: DateTime<Utc>,
    level: LogLevel,
    message: String,
    logger: Option<String>,
    caller: Option<String>,
    stack: Option<String>,
    fields: Fields,
    service_name: String,
    environment: String,
    host_name: Option<String>,
    host_ip: Option<String>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>, fields: Fields) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            logger: None,
            caller: None,
            stack: None,
            fields,
            service_name: String::new(),
            environment: String::new(),
            host_name: None,
            host_ip: None,
        }
    }

    /// Override the creation time (front ends replaying records)
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    #[must_use]
    pub fn with_logger(mut self, logger: impl Into<String>) -> Self {
        self.logger = Some(logger.into());
        self
    }

    #[must_use]
    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    #[must_use]
    pub fn with_service(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = service_name.into();
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    #[must_use]
    pub fn with_host(mut self, host_name: Option<String>, host_ip: Option<String>) -> Self {
        self.host_name = host_name;
        self.host_ip = host_ip;
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn logger(&self) -> Option<&str> {
        self.logger.as_deref()
    }

    pub fn caller(&self) -> Option<&str> {
        self.caller.as_deref()
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Mutable access to the field map of this copy only
    pub fn fields_mut(&mut self) -> &mut Fields {
        &mut self.fields
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn host_name(&self) -> Option<&str> {
        self.host_name.as_deref()
    }

    pub fn host_ip(&self) -> Option<&str> {
        self.host_ip.as_deref()
    }

    /// Flattened document: fixed keys first, then every custom field.
    ///
    /// Custom fields are applied last, so a custom `level` or `message`
    /// replaces the fixed value. Empty optional attributes are omitted.
    pub fn to_document(&self) -> Map<String, Value> {
        let mut doc = Map::new();

        doc.insert(
            "@timestamp".to_string(),
            Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)),
        );
        doc.insert("level".to_string(), Value::from(self.level.as_str()));
        doc.insert("message".to_string(), Value::from(self.message.as_str()));

        let optional = [
            ("logger", self.logger.as_deref()),
            ("caller", self.caller.as_deref()),
            ("stack", self.stack.as_deref()),
            ("service.name", Some(self.service_name.as_str())),
            ("environment", Some(self.environment.as_str())),
            ("host.name", self.host_name.as_deref()),
            ("host.ip", self.host_ip.as_deref()),
        ];
        for (key, value) in optional {
            if let Some(value) = value.filter(|v| !v.is_empty()) {
                doc.insert(key.to_string(), Value::from(value));
            }
        }

        for (key, value) in self.fields.iter() {
            doc.insert(key.clone(), value.to_json_value());
        }

        doc
    }

    /// Serialize the flattened document as one JSON line (no trailing newline)
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.to_document())?)
    }
}
