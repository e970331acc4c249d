//! Toggle state model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::errors::ToggleError;

/// The state the user last asked for. Authoritative over whatever the page
/// currently renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    On,
    #[default]
    Off,
}

impl DesiredState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }

    /// The affordance that has to be clicked to move the control into this state.
    pub const fn control_to_reach(self) -> ControlKind {
        match self {
            Self::On => ControlKind::Enable,
            Self::Off => ControlKind::Disable,
        }
    }

    /// Whether the rendered state already matches.
    pub fn is_satisfied_by(self, live: LiveState) -> bool {
        live.as_desired() == Some(self)
    }
}

impl fmt::Display for DesiredState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DesiredState {
    type Err = ToggleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            other => Err(ToggleError::InvalidStoredValue {
                key: String::new(),
                value: other.to_string(),
            }),
        }
    }
}

/// What the page renders right now. Computed on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LiveState {
    On,
    Off,
    Absent,
}

impl LiveState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Absent => "absent",
        }
    }

    pub const fn as_desired(self) -> Option<DesiredState> {
        match self {
            Self::On => Some(DesiredState::On),
            Self::Off => Some(DesiredState::Off),
            Self::Absent => None,
        }
    }
}

impl fmt::Display for LiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<DesiredState> for LiveState {
    fn from(state: DesiredState) -> Self {
        match state {
            DesiredState::On => Self::On,
            DesiredState::Off => Self::Off,
        }
    }
}

/// One of the two mutually exclusive affordances.
///
/// The page offers `Enable` while the feature is off and `Disable` while it
/// is on, so the affordance on screen is always the opposite of the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlKind {
    Enable,
    Disable,
}

impl ControlKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::Disable => "disable",
        }
    }

    /// State the control ends up in once this affordance is clicked.
    pub const fn target_state(self) -> DesiredState {
        match self {
            Self::Enable => DesiredState::On,
            Self::Disable => DesiredState::Off,
        }
    }
}

impl fmt::Display for ControlKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which of the two controls exists in the DOM at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlSnapshot {
    pub enable_present: bool,
    pub disable_present: bool,
}

impl ControlSnapshot {
    pub const fn absent() -> Self {
        Self {
            enable_present: false,
            disable_present: false,
        }
    }

    pub const fn rendering(live: LiveState) -> Self {
        match live {
            LiveState::On => Self {
                enable_present: false,
                disable_present: true,
            },
            LiveState::Off => Self {
                enable_present: true,
                disable_present: false,
            },
            LiveState::Absent => Self::absent(),
        }
    }

    /// Derive the live state, rejecting snapshots that break mutual exclusivity.
    pub fn live_state(&self) -> Result<LiveState, ToggleError> {
        match (self.enable_present, self.disable_present) {
            (true, true) => Err(ToggleError::AmbiguousControlState),
            (false, true) => Ok(LiveState::On),
            (true, false) => Ok(LiveState::Off),
            (false, false) => Ok(LiveState::Absent),
        }
    }

    pub const fn contains(&self, control: ControlKind) -> bool {
        match control {
            ControlKind::Enable => self.enable_present,
            ControlKind::Disable => self.disable_present,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_desired_default_is_off() {
        assert_eq!(DesiredState::default(), DesiredState::Off);
    }

    #[test]
    fn test_desired_parse() {
        assert_eq!("on".parse::<DesiredState>().unwrap(), DesiredState::On);
        assert_eq!(" OFF ".parse::<DesiredState>().unwrap(), DesiredState::Off);
        assert!("maybe".parse::<DesiredState>().is_err());
    }

    #[test]
    fn test_desired_serde_uses_lowercase() {
        assert_eq!(serde_json::to_string(&DesiredState::On).unwrap(), "\"on\"");
        let parsed: DesiredState = serde_json::from_str("\"off\"").unwrap();
        assert_eq!(parsed, DesiredState::Off);
    }

    #[test]
    fn test_control_kind_targets() {
        assert_eq!(ControlKind::Enable.target_state(), DesiredState::On);
        assert_eq!(ControlKind::Disable.target_state(), DesiredState::Off);
        assert_eq!(DesiredState::On.control_to_reach(), ControlKind::Enable);
        assert_eq!(DesiredState::Off.control_to_reach(), ControlKind::Disable);
    }

    #[test]
    fn test_snapshot_live_state() {
        assert_eq!(
            ControlSnapshot::rendering(LiveState::On).live_state(),
            Ok(LiveState::On)
        );
        assert_eq!(
            ControlSnapshot::rendering(LiveState::Off).live_state(),
            Ok(LiveState::Off)
        );
        assert_eq!(ControlSnapshot::absent().live_state(), Ok(LiveState::Absent));

        let both = ControlSnapshot {
            enable_present: true,
            disable_present: true,
        };
        assert_eq!(both.live_state(), Err(ToggleError::AmbiguousControlState));
    }

    #[test]
    fn test_is_satisfied_by() {
        assert!(DesiredState::On.is_satisfied_by(LiveState::On));
        assert!(!DesiredState::On.is_satisfied_by(LiveState::Off));
        assert!(!DesiredState::Off.is_satisfied_by(LiveState::Absent));
    }
}
