// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Device probe record returned by the module command interface.
//!
//! Out-of-band tooling sends single-character commands to a running module
//! and gets one of these back; it is not part of the pipeline data path.

use serde::{Deserialize, Serialize};

/// Firmware word reported by the built-in command handlers.
pub const DEVICE_FIRMWARE: u32 = 0x0001_0000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub firmware: u32,
    pub protocol: String,
    pub errors: Vec<String>,
}

impl Device {
    fn reply(name: &str, protocol: &str, errors: Vec<String>) -> Self {
        Self {
            name: name.to_string(),
            firmware: DEVICE_FIRMWARE,
            protocol: protocol.to_string(),
            errors,
        }
    }

    pub fn status(name: &str) -> Self {
        Self::reply(name, "STATUS", vec![])
    }

    pub fn reset(name: &str) -> Self {
        Self::reply(name, "RESET", vec![])
    }

    pub fn process(name: &str) -> Self {
        Self::reply(name, "PROCESS", vec![])
    }

    pub fn unknown(name: &str, command: char) -> Self {
        Self::reply(
            name,
            "UNKNOWN",
            vec![format!("unrecognized command: {}", command)],
        )
    }

    pub fn error(name: &str, message: impl Into<String>) -> Self {
        Self::reply(name, "ERROR", vec![message.into()])
    }

    pub fn is_error(&self) -> bool {
        self.protocol == "ERROR"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[yare::parameterized(
        status  = { Device::status("m"), "STATUS", 0 },
        reset   = { Device::reset("m"), "RESET", 0 },
        process = { Device::process("m"), "PROCESS", 0 },
        unknown = { Device::unknown("m", 'X'), "UNKNOWN", 1 },
        error   = { Device::error("m", "boom"), "ERROR", 1 },
    )]
    fn builtin_replies(device: Device, protocol: &str, error_count: usize) {
        assert_eq!(device.protocol, protocol);
        assert_eq!(device.errors.len(), error_count);
        assert_eq!(device.firmware, DEVICE_FIRMWARE);
        assert_eq!(device.is_error(), protocol == "ERROR");
    }
}
