// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Topic-based publish/subscribe broker with declared-type validation.
//!
//! Registration and subscription happen during engine wire-up, before any
//! module runs; from then on the tables are only read. Delivery is
//! synchronous from the publisher's point of view: `publish` awaits every
//! subscriber callback in subscription order before returning.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use parking_lot::RwLock;
use thiserror::Error;
use tracing::{debug, warn};

use wr_core::{Envelope, TypeName, Value};

use crate::translate::TypeTranslator;

/// Async subscriber callback invoked once per delivery.
pub type SubscriberCallback = Arc<dyn Fn(Envelope) -> BoxFuture<'static, ()> + Send + Sync>;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("no subscribers for topic '{0}'")]
    NoSubscribers(String),

    #[error("value of type '{actual}' on topic '{topic}' does not satisfy '{expected}' and cannot be translated")]
    TypeMismatch {
        topic: String,
        expected: TypeName,
        actual: TypeName,
    },

    #[error("topic '{topic}' already declared as '{existing_type}' by '{existing}', conflicting '{requested}' from '{module}'")]
    OutputConflict {
        topic: String,
        existing: String,
        existing_type: TypeName,
        module: String,
        requested: TypeName,
    },

    #[error("conflicting expected types for topic '{topic}': '{existing}' vs '{requested}' from '{module}'")]
    SubscriptionConflict {
        topic: String,
        existing: TypeName,
        module: String,
        requested: TypeName,
    },
}

/// Declared producer of a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRegistration {
    pub type_name: TypeName,
    pub description: Option<String>,
    pub source: String,
}

/// Declared consumer of a topic (bookkeeping for diagnostics).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRegistration {
    pub type_name: TypeName,
    pub subscriber: String,
}

#[derive(Clone)]
struct Subscription {
    module: String,
    expected: Option<TypeName>,
    callback: SubscriberCallback,
}

#[derive(Default)]
struct Tables {
    subscribers: HashMap<String, Vec<Subscription>>,
    outputs: HashMap<String, OutputRegistration>,
    inputs: HashMap<String, Vec<InputRegistration>>,
    /// Per-topic expected type agreed by all subscriptions.
    expected: HashMap<String, TypeName>,
}

pub struct MessageBus {
    translator: TypeTranslator,
    tables: RwLock<Tables>,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBus {
    pub fn new() -> Self {
        Self::with_translator(TypeTranslator::new())
    }

    pub fn with_translator(translator: TypeTranslator) -> Self {
        Self {
            translator,
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Declare a topic's output type. A topic has at most one declared type;
    /// a second producer is accepted only if its type matches.
    pub fn register_output(
        &self,
        topic: &str,
        type_name: TypeName,
        description: Option<String>,
        source: &str,
    ) -> Result<(), BusError> {
        let mut tables = self.tables.write();
        if let Some(existing) = tables.outputs.get(topic) {
            if existing.type_name.shape() != type_name.shape() {
                return Err(BusError::OutputConflict {
                    topic: topic.to_string(),
                    existing: existing.source.clone(),
                    existing_type: existing.type_name.clone(),
                    module: source.to_string(),
                    requested: type_name,
                });
            }
            debug!(topic, source, "output re-registered with matching type");
            return Ok(());
        }
        tables.outputs.insert(
            topic.to_string(),
            OutputRegistration {
                type_name,
                description,
                source: source.to_string(),
            },
        );
        Ok(())
    }

    /// Record a subscriber's expected type for a topic.
    pub fn register_input(&self, topic: &str, type_name: TypeName, subscriber: &str) {
        self.tables
            .write()
            .inputs
            .entry(topic.to_string())
            .or_default()
            .push(InputRegistration {
                type_name,
                subscriber: subscriber.to_string(),
            });
    }

    /// Append a callback to the topic's subscriber list.
    ///
    /// Duplicate subscriptions are allowed and deliver twice. An expected
    /// type that conflicts with an earlier subscription's fails.
    pub fn subscribe(
        &self,
        topic: &str,
        module: &str,
        expected: Option<TypeName>,
        callback: SubscriberCallback,
    ) -> Result<(), BusError> {
        let mut tables = self.tables.write();
        if let Some(requested) = &expected {
            if !requested.is_any() {
                match tables.expected.get(topic) {
                    Some(existing) if existing.shape() != requested.shape() => {
                        return Err(BusError::SubscriptionConflict {
                            topic: topic.to_string(),
                            existing: existing.clone(),
                            module: module.to_string(),
                            requested: requested.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        tables
                            .expected
                            .insert(topic.to_string(), requested.clone());
                    }
                }
            }
        }
        tables
            .subscribers
            .entry(topic.to_string())
            .or_default()
            .push(Subscription {
                module: module.to_string(),
                expected,
                callback,
            });
        Ok(())
    }

    pub fn declared_type(&self, topic: &str) -> Option<TypeName> {
        self.tables
            .read()
            .outputs
            .get(topic)
            .map(|o| o.type_name.clone())
    }

    pub fn output_registration(&self, topic: &str) -> Option<OutputRegistration> {
        self.tables.read().outputs.get(topic).cloned()
    }

    pub fn input_registrations(&self, topic: &str) -> Vec<InputRegistration> {
        self.tables
            .read()
            .inputs
            .get(topic)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has_subscribers(&self, topic: &str) -> bool {
        self.subscriber_count(topic) > 0
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.tables
            .read()
            .subscribers
            .get(topic)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn translator(&self) -> &TypeTranslator {
        &self.translator
    }

    /// Publish a value with no source attribution.
    pub async fn publish(&self, topic: &str, value: Value) -> Result<(), BusError> {
        self.publish_from(topic, value, None).await
    }

    /// Publish a value to every subscriber of `topic`, in subscription
    /// order, awaiting each delivery.
    pub async fn publish_from(
        &self,
        topic: &str,
        value: Value,
        source: Option<&str>,
    ) -> Result<(), BusError> {
        // Snapshot under the read lock; deliveries happen outside it.
        let (declared, subscriptions) = {
            let tables = self.tables.read();
            let subscriptions = match tables.subscribers.get(topic) {
                Some(subs) if !subs.is_empty() => subs.clone(),
                _ => return Err(BusError::NoSubscribers(topic.to_string())),
            };
            let declared = tables.outputs.get(topic).map(|o| o.type_name.clone());
            (declared, subscriptions)
        };

        let mut value = value;
        if let Some(declared) = &declared {
            if !value.satisfies(declared) {
                let actual = value.type_name();
                let (converted, ok) = self.translator.convert(&value, &actual, declared);
                if !ok {
                    return Err(BusError::TypeMismatch {
                        topic: topic.to_string(),
                        expected: declared.clone(),
                        actual,
                    });
                }
                value = converted;
            }
        }

        if value.is_empty_payload() {
            warn!(topic, "empty payload published");
        }

        let declared_type = declared.unwrap_or_else(|| value.type_name());
        for subscription in subscriptions {
            let mut envelope = Envelope::new(topic, value.clone(), source.map(String::from))
                .with_declared_type(declared_type.clone());
            if let Some(expected) = &subscription.expected {
                if !envelope.data.satisfies(expected)
                    && !self.translator.translate_envelope(&mut envelope, expected)
                {
                    return Err(BusError::TypeMismatch {
                        topic: topic.to_string(),
                        expected: expected.clone(),
                        actual: envelope.data.type_name(),
                    });
                }
            }
            debug!(topic, subscriber = %subscription.module, "delivering");
            (subscription.callback)(envelope).await;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
