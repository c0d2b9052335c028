//! Control surface state
//!
//! Operating mode, emergency scenario and time acceleration. The engine owns
//! the canonical [`ControlState`]; models only ever see a copy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SimError};

/// Operating mode of the whole plant simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// All models advance on every tick
    #[default]
    Live,
    /// All models are frozen (emergency-drill exercises)
    Training,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Live => write!(f, "live"),
            Mode::Training => write!(f, "training"),
        }
    }
}

/// Injected fault scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EmergencyKind {
    Loca,        // Loss of coolant accident
    Blackout,    // Station blackout
    Overpressure,
    Cyber,
}

impl EmergencyKind {
    pub const ALL: [EmergencyKind; 4] = [
        EmergencyKind::Loca,
        EmergencyKind::Blackout,
        EmergencyKind::Overpressure,
        EmergencyKind::Cyber,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EmergencyKind::Loca => "LOCA",
            EmergencyKind::Blackout => "BLACKOUT",
            EmergencyKind::Overpressure => "OVERPRESSURE",
            EmergencyKind::Cyber => "CYBER",
        }
    }
}

impl fmt::Display for EmergencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmergencyKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self> {
        EmergencyKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SimError::InvalidArgument(format!("unknown emergency scenario: {s:?}")))
    }
}

/// Emergency status as reported to consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyStatus {
    pub active: bool,
    pub kind: Option<EmergencyKind>,
}

/// Read-only flags handed to every model update
///
/// On the wire the emergency is split into `emergencyActive` and
/// `emergencyKind`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "ControlRecord", from = "ControlRecord")]
pub struct ControlState {
    pub mode: Mode,
    pub emergency: Option<EmergencyKind>,
    pub time_multiplier: f64,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ControlRecord {
    mode: Mode,
    emergency_active: bool,
    emergency_kind: Option<EmergencyKind>,
    time_multiplier: f64,
}

impl From<ControlState> for ControlRecord {
    fn from(control: ControlState) -> Self {
        Self {
            mode: control.mode,
            emergency_active: control.emergency.is_some(),
            emergency_kind: control.emergency,
            time_multiplier: control.time_multiplier,
        }
    }
}

// A kind without the active flag is an inactive scenario
impl From<ControlRecord> for ControlState {
    fn from(record: ControlRecord) -> Self {
        Self {
            mode: record.mode,
            emergency: record.emergency_kind.filter(|_| record.emergency_active),
            time_multiplier: record.time_multiplier,
        }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            mode: Mode::Live,
            emergency: None,
            time_multiplier: 1.0,
        }
    }
}

impl ControlState {
    pub fn is_frozen(&self) -> bool {
        self.mode == Mode::Training
    }

    pub fn emergency_active(&self) -> bool {
        self.emergency.is_some()
    }

    /// True only while a loss-of-coolant scenario is running.
    pub fn is_loca(&self) -> bool {
        self.emergency == Some(EmergencyKind::Loca)
    }

    pub fn emergency_status(&self) -> EmergencyStatus {
        EmergencyStatus {
            active: self.emergency.is_some(),
            kind: self.emergency,
        }
    }
}

/// Check a time multiplier supplied from outside the engine.
pub fn validate_time_multiplier(value: f64) -> Result<f64> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(SimError::InvalidArgument(format!(
            "time multiplier must be a positive finite number, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_emergency_kind() {
        assert_eq!("LOCA".parse::<EmergencyKind>().unwrap(), EmergencyKind::Loca);
        assert_eq!("blackout".parse::<EmergencyKind>().unwrap(), EmergencyKind::Blackout);
        assert_eq!(" Cyber ".parse::<EmergencyKind>().unwrap(), EmergencyKind::Cyber);
        assert!(matches!(
            "MELTDOWN".parse::<EmergencyKind>(),
            Err(SimError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_emergency_kind_wire_names() {
        let json = serde_json::to_string(&EmergencyKind::Overpressure).unwrap();
        assert_eq!(json, "\"OVERPRESSURE\"");
        let status = EmergencyStatus { active: true, kind: Some(EmergencyKind::Loca) };
        let json = serde_json::to_value(status).unwrap();
        assert_eq!(json["kind"], "LOCA");
        assert_eq!(json["active"], true);
    }

    #[test]
    fn test_control_state_wire_shape() {
        let control = ControlState {
            emergency: Some(EmergencyKind::Loca),
            ..ControlState::default()
        };
        let json = serde_json::to_value(control).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "mode": "live",
                "emergencyActive": true,
                "emergencyKind": "LOCA",
                "timeMultiplier": 1.0,
            })
        );
        assert_eq!(serde_json::from_value::<ControlState>(json).unwrap(), control);

        let json = serde_json::to_value(ControlState::default()).unwrap();
        assert_eq!(json["emergencyActive"], false);
        assert!(json["emergencyKind"].is_null());
        assert!(json.get("emergency").is_none());
    }

    #[test]
    fn test_mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Training).unwrap(), "\"training\"");
        assert_eq!(Mode::Live.to_string(), "live");
    }

    #[test]
    fn test_loca_flag() {
        let mut control = ControlState::default();
        assert!(!control.emergency_active());
        control.emergency = Some(EmergencyKind::Blackout);
        assert!(control.emergency_active());
        assert!(!control.is_loca());
        control.emergency = Some(EmergencyKind::Loca);
        assert!(control.is_loca());
    }

    #[test]
    fn test_time_multiplier_validation() {
        assert_eq!(validate_time_multiplier(5.0).unwrap(), 5.0);
        assert!(validate_time_multiplier(0.0).is_err());
        assert!(validate_time_multiplier(-1.0).is_err());
        assert!(validate_time_multiplier(f64::NAN).is_err());
        assert!(validate_time_multiplier(f64::INFINITY).is_err());
    }
}
