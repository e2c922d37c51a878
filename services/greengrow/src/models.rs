//! Wire types for the greenhouse backend API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A monitored greenhouse site
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Greenhouse {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl Greenhouse {
    /// Label shown in the greenhouse selector.
    pub fn label(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("Greenhouse {}", self.id),
        }
    }
}

/// The most recent value known for a sensor
///
/// Replaced wholesale by each poll, never patched field-by-field, so plain
/// equality is enough to decide whether a sensor changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestReading {
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// A device producing periodic numeric readings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub sensor_type: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub latest_reading: Option<LatestReading>,
}

impl Sensor {
    /// Display name, falling back to the type code.
    pub fn display_name(&self) -> &str {
        match &self.name {
            Some(name) if !name.is_empty() => name,
            _ => &self.sensor_type,
        }
    }

    /// Measurement unit for this sensor's type code.
    pub fn unit(&self) -> &'static str {
        unit_for(&self.sensor_type)
    }
}

/// The most recent status token known for an actuator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestStatus {
    pub status_value: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// A device with an on/off/variable status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actuator {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub actuator_type: String,
    #[serde(default)]
    pub latest_status: Option<LatestStatus>,
}

impl Actuator {
    /// Display name, falling back to the type code.
    pub fn display_name(&self) -> &str {
        match &self.name {
            Some(name) if !name.is_empty() => name,
            _ => &self.actuator_type,
        }
    }
}

/// Overview payload for a greenhouse: info, actuator statuses, and alerts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Overview {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub actuators: Vec<Actuator>,
    #[serde(default)]
    pub alerts: Vec<String>,
}

/// Measurement unit for a sensor type code, empty when unknown.
pub fn unit_for(sensor_type: &str) -> &'static str {
    match sensor_type {
        "TEMP" => "°C",
        "AIR_HUM" => "%RH",
        "CO2" => "ppm",
        "LIGHT" => "Lux",
        "SOIL_MOIST" => "%VWC",
        "SOIL_TEMP" => "°C",
        "WATER_LVL" => "L",
        "SOLAR_VOLT" => "V",
        _ => "",
    }
}
