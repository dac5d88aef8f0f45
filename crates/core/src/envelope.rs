// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message envelope delivered to bus subscribers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value::{TypeName, Value};

/// One published message: payload plus its declared type and provenance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub topic: String,
    pub data: Value,
    /// Declared type of `data`; rewritten when the translator converts the
    /// payload for a subscriber.
    pub data_type: TypeName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    pub fn new(topic: impl Into<String>, data: Value, source: Option<String>) -> Self {
        let data_type = data.type_name();
        Self {
            topic: topic.into(),
            data,
            data_type,
            source,
            timestamp: Utc::now(),
        }
    }

    /// Override the declared type (the topic's registered output type wins
    /// over the payload's runtime type).
    pub fn with_declared_type(mut self, data_type: TypeName) -> Self {
        self.data_type = data_type;
        self
    }
}
