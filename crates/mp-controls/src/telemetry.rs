//! Named properties for live inspection and tuning.
//!
//! A dashboard binds to a controller through [`Inspectable`]: it lists the
//! properties, reads any of them, and writes the editable ones. Writes go
//! through the controller's own setters, so retuning from a dashboard fires
//! the change notifier exactly like retuning from code.

use std::collections::BTreeMap;

use mp_core::Clock;
use serde::{Deserialize, Serialize};

use crate::control_loop::ControlLoop;
use crate::error::{ControlError, ControlResult};
use crate::io::FeedbackSource;

/// Value of a single property.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Number(f64),
    Bool(bool),
}

impl PropertyValue {
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::Number(_) => PropertyKind::Number,
            Self::Bool(_) => PropertyKind::Bool,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            Self::Bool(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::Number(_) => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyKind {
    Number,
    Bool,
}

impl PropertyKind {
    fn label(self) -> &'static str {
        match self {
            Self::Number => "number",
            Self::Bool => "boolean",
        }
    }
}

/// Whether a dashboard may edit a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Access {
    ReadOnly,
    ReadWrite,
}

/// Describes one property of an inspectable controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PropertyDescriptor {
    pub key: &'static str,
    pub kind: PropertyKind,
    pub access: Access,
}

impl PropertyDescriptor {
    pub const fn number(key: &'static str, access: Access) -> Self {
        Self {
            key,
            kind: PropertyKind::Number,
            access,
        }
    }

    pub const fn boolean(key: &'static str, access: Access) -> Self {
        Self {
            key,
            kind: PropertyKind::Bool,
            access,
        }
    }

    pub fn is_editable(&self) -> bool {
        self.access == Access::ReadWrite
    }
}

/// Point-in-time view of every property, ready to serialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    #[serde(rename = "type")]
    pub type_name: String,
    pub name: String,
    pub subsystem: String,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl TelemetrySnapshot {
    pub fn get(&self, key: &str) -> Option<PropertyValue> {
        self.properties.get(key).copied()
    }

    pub fn to_json_pretty(&self) -> ControlResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A controller whose properties can be listed, read and edited by key.
pub trait Inspectable {
    /// Dashboard widget type.
    fn type_name(&self) -> &'static str;

    fn instance_name(&self) -> &str;

    fn subsystem_name(&self) -> &str;

    fn properties(&self) -> &'static [PropertyDescriptor];

    /// Read a property listed in [`properties`](Self::properties).
    fn read_property(&self, key: &str) -> Option<PropertyValue>;

    /// Apply a write. Anything [`check_write`](Self::check_write) rejects
    /// must be rejected here too, without side effects.
    fn write_property(&mut self, key: &str, value: PropertyValue) -> ControlResult<()>;

    fn descriptor(&self, key: &str) -> ControlResult<&'static PropertyDescriptor> {
        self.properties()
            .iter()
            .find(|d| d.key == key)
            .ok_or_else(|| ControlError::UnknownProperty {
                key: key.to_string(),
            })
    }

    fn get_property(&self, key: &str) -> ControlResult<PropertyValue> {
        let descriptor = self.descriptor(key)?;
        self.read_property(descriptor.key)
            .ok_or_else(|| ControlError::UnknownProperty {
                key: key.to_string(),
            })
    }

    /// Check a write against the property table: the key must be listed,
    /// editable, and take values of `value`'s kind.
    fn check_write(
        &self,
        key: &str,
        value: PropertyValue,
    ) -> ControlResult<&'static PropertyDescriptor> {
        let descriptor = self.descriptor(key)?;
        if !descriptor.is_editable() {
            return Err(ControlError::ReadOnlyProperty {
                key: descriptor.key,
            });
        }
        if value.kind() != descriptor.kind {
            return Err(ControlError::PropertyType {
                key: descriptor.key,
                expected: descriptor.kind.label(),
            });
        }
        Ok(descriptor)
    }

    /// Write an editable property. Read-only keys, unknown keys and values
    /// of the wrong kind are rejected without side effects.
    fn set_property(&mut self, key: &str, value: PropertyValue) -> ControlResult<()> {
        let descriptor = self.check_write(key, value)?;
        self.write_property(descriptor.key, value)
    }

    fn snapshot(&self) -> TelemetrySnapshot {
        let properties = self
            .properties()
            .iter()
            .filter_map(|d| self.read_property(d.key).map(|v| (d.key.to_string(), v)))
            .collect();
        TelemetrySnapshot {
            type_name: self.type_name().to_string(),
            name: self.instance_name().to_string(),
            subsystem: self.subsystem_name().to_string(),
            properties,
        }
    }
}

const CONTROL_LOOP_PROPERTIES: &[PropertyDescriptor] = &[
    PropertyDescriptor::number("p", Access::ReadWrite),
    PropertyDescriptor::number("i", Access::ReadWrite),
    PropertyDescriptor::number("d", Access::ReadWrite),
    PropertyDescriptor::number("f", Access::ReadWrite),
    PropertyDescriptor::number("errZone", Access::ReadWrite),
    PropertyDescriptor::number("targetZone", Access::ReadWrite),
    PropertyDescriptor::number("targetTime", Access::ReadWrite),
    PropertyDescriptor::number("setpoint", Access::ReadWrite),
    PropertyDescriptor::boolean("enabled", Access::ReadWrite),
    PropertyDescriptor::number("current", Access::ReadOnly),
    PropertyDescriptor::number("output", Access::ReadOnly),
];

impl<S: FeedbackSource, C: Clock> Inspectable for ControlLoop<S, C> {
    fn type_name(&self) -> &'static str {
        "MomentumPIDController"
    }

    fn instance_name(&self) -> &str {
        self.name()
    }

    fn subsystem_name(&self) -> &str {
        self.subsystem()
    }

    fn properties(&self) -> &'static [PropertyDescriptor] {
        CONTROL_LOOP_PROPERTIES
    }

    fn read_property(&self, key: &str) -> Option<PropertyValue> {
        let value: PropertyValue = match key {
            "p" => self.p().into(),
            "i" => self.i().into(),
            "d" => self.d().into(),
            "f" => self.f().into(),
            "errZone" => self.err_zone().into(),
            "targetZone" => self.target_zone().into(),
            "targetTime" => self.target_time().into(),
            "setpoint" => self.setpoint().into(),
            "enabled" => self.is_enabled().into(),
            "current" => self.current().into(),
            "output" => self.get().into(),
            _ => return None,
        };
        Some(value)
    }

    fn write_property(&mut self, key: &str, value: PropertyValue) -> ControlResult<()> {
        match (key, value) {
            ("p", PropertyValue::Number(v)) => self.set_p(v),
            ("i", PropertyValue::Number(v)) => self.set_i(v),
            ("d", PropertyValue::Number(v)) => self.set_d(v),
            ("f", PropertyValue::Number(v)) => self.set_f(v),
            ("errZone", PropertyValue::Number(v)) => self.set_err_zone(v),
            ("targetZone", PropertyValue::Number(v)) => self.set_target_zone(v),
            ("targetTime", PropertyValue::Number(v)) => self.set_target_time(v),
            ("setpoint", PropertyValue::Number(v)) => self.set_setpoint(v),
            ("enabled", PropertyValue::Bool(v)) => self.set_enabled(v),
            _ => {
                self.check_write(key, value)?;
                return Err(ControlError::UnknownProperty {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }
}
