// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wiring modules to the bus.
//!
//! Topic connection policy: outputs are registered first under the topic
//! the pipeline names (declared output name, or its `mapped` rename). Each
//! declared input subscribes to the topic its mapping resolves to: the
//! source module's output topic for qualified refs, the bare output name
//! for unqualified refs, or a topic named like the input when unmapped.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use wr_bus::{BusError, MessageBus};
use wr_core::PipelineModule;
use wr_runtime::ModuleHost;

/// One pipeline entry paired with its instantiated host.
pub struct EngineModule {
    pub host: Arc<ModuleHost>,
    pub spec: PipelineModule,
}

impl EngineModule {
    pub fn id(&self) -> String {
        self.spec.effective_id()
    }
}

#[derive(Debug, Error)]
pub enum WireError {
    #[error(transparent)]
    Bus(#[from] BusError),

    #[error("module '{module}' subscribes to its own output topic '{topic}'")]
    SelfSubscription { module: String, topic: String },
}

/// Wiring summary: recorded dependency edges and subscriptions.
#[derive(Debug, Default)]
pub struct WireReport {
    /// module id -> ids it depends on (declared plus mapping-implied).
    pub dependencies: HashMap<String, Vec<String>>,
    /// (module id, topic) subscription pairs.
    pub subscriptions: Vec<(String, String)>,
}

/// Register every output, then subscribe every input. Any failure here is
/// fatal to start-up.
pub fn wire_modules(
    bus: &Arc<MessageBus>,
    modules: &[EngineModule],
) -> Result<WireReport, WireError> {
    let by_id: HashMap<String, &EngineModule> =
        modules.iter().map(|m| (m.id(), m)).collect();

    // Outputs first, so input subscriptions can be type-checked against
    // the declared producer types.
    let mut own_topics: HashMap<String, HashSet<String>> = HashMap::new();
    for module in modules {
        for port in &module.host.manifest().outputs {
            let topic = module.spec.output_topic(&port.name).to_string();
            bus.register_output(
                &topic,
                port.type_name.clone(),
                port.description.clone(),
                module.host.name(),
            )?;
            debug!(module = %module.id(), topic = %topic, "output registered");
            own_topics.entry(module.id()).or_default().insert(topic);
        }
    }

    let mut report = WireReport::default();
    for module in modules {
        report
            .dependencies
            .insert(module.id(), module.spec.depends_on.clone());

        for port in &module.host.manifest().inputs {
            let topic = match module.spec.input_mappings.get(&port.name) {
                Some(source_ref) => match &source_ref.source {
                    Some(source_id) => by_id
                        .get(source_id)
                        .map(|source| source.spec.output_topic(&source_ref.output).to_string())
                        .unwrap_or_else(|| source_ref.output.clone()),
                    None => source_ref.output.clone(),
                },
                None => port.name.clone(),
            };

            if own_topics
                .get(&module.id())
                .is_some_and(|topics| topics.contains(&topic))
            {
                return Err(WireError::SelfSubscription {
                    module: module.id(),
                    topic,
                });
            }

            bus.register_input(&topic, port.type_name.clone(), module.host.name());
            bus.subscribe(
                &topic,
                module.host.name(),
                Some(port.type_name.clone()),
                module.host.subscriber(),
            )?;
            debug!(module = %module.id(), input = %port.name, topic = %topic, "input subscribed");
            report.subscriptions.push((module.id(), topic));
        }
    }
    Ok(report)
}

#[cfg(test)]
#[path = "wiring_tests.rs"]
mod tests;
