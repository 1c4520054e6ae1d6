use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Lifecycle state of a migration as reported by the management service.
///
/// The service has added and renamed states over time, so anything not in
/// the known set is kept verbatim in [`MigrationState::Unknown`] instead of
/// failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MigrationState {
    Deploying,
    NotAssigned,
    Waiting,
    Starting,
    Restarting,
    InProgress,
    InProgressCanceling,
    Stopping,
    Stopped,
    Canceled,
    Succeeded,
    Failed,
    NoConnectionToEngine,
    Unknown(String),
}

impl MigrationState {
    /// Every state the service is known to emit, in lifecycle order.
    #[cfg(test)]
    pub const KNOWN: [MigrationState; 13] = [
        MigrationState::Deploying,
        MigrationState::NotAssigned,
        MigrationState::Waiting,
        MigrationState::Starting,
        MigrationState::Restarting,
        MigrationState::InProgress,
        MigrationState::InProgressCanceling,
        MigrationState::Stopping,
        MigrationState::Stopped,
        MigrationState::Canceled,
        MigrationState::Succeeded,
        MigrationState::Failed,
        MigrationState::NoConnectionToEngine,
    ];

    /// Parse the wire name. Never fails.
    pub fn from_wire(raw: &str) -> Self {
        match raw {
            "DEPLOYING" => MigrationState::Deploying,
            "NOT_ASSIGNED" => MigrationState::NotAssigned,
            "WAITING" => MigrationState::Waiting,
            "STARTING" => MigrationState::Starting,
            "RESTARTING" => MigrationState::Restarting,
            "IN_PROGRESS" => MigrationState::InProgress,
            "IN_PROGRESS_CANCELING" => MigrationState::InProgressCanceling,
            "STOPPING" => MigrationState::Stopping,
            "STOPPED" => MigrationState::Stopped,
            "CANCELED" => MigrationState::Canceled,
            "SUCCEEDED" => MigrationState::Succeeded,
            "FAILED" => MigrationState::Failed,
            "NO_CONNECTION_TO_ENGINE" => MigrationState::NoConnectionToEngine,
            other => MigrationState::Unknown(other.to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            MigrationState::Deploying => "DEPLOYING",
            MigrationState::NotAssigned => "NOT_ASSIGNED",
            MigrationState::Waiting => "WAITING",
            MigrationState::Starting => "STARTING",
            MigrationState::Restarting => "RESTARTING",
            MigrationState::InProgress => "IN_PROGRESS",
            MigrationState::InProgressCanceling => "IN_PROGRESS_CANCELING",
            MigrationState::Stopping => "STOPPING",
            MigrationState::Stopped => "STOPPED",
            MigrationState::Canceled => "CANCELED",
            MigrationState::Succeeded => "SUCCEEDED",
            MigrationState::Failed => "FAILED",
            MigrationState::NoConnectionToEngine => "NO_CONNECTION_TO_ENGINE",
            MigrationState::Unknown(raw) => raw,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, MigrationState::Unknown(_))
    }
}

impl fmt::Display for MigrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

impl Serialize for MigrationState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire())
    }
}

impl<'de> Deserialize<'de> for MigrationState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(MigrationState::from_wire(&raw))
    }
}

/// What the poller should do after observing a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Not terminal: sleep and poll again.
    Continue,
    /// Terminal: no further progress updates will come.
    Stop,
}

/// Maps every [`MigrationState`] to exactly one [`Verdict`].
///
/// The only policy knob is `NO_CONNECTION_TO_ENGINE`: the service may
/// recover from it after an engine restart, so callers can choose to keep
/// polling instead of treating it as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classifier {
    pub no_connection_is_terminal: bool,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            no_connection_is_terminal: true,
        }
    }
}

impl Classifier {
    pub fn new(no_connection_is_terminal: bool) -> Self {
        Self {
            no_connection_is_terminal,
        }
    }

    /// Classify a state. Unknown states continue; the caller logs them.
    pub fn classify(&self, state: &MigrationState) -> Verdict {
        match state {
            MigrationState::Deploying
            | MigrationState::NotAssigned
            | MigrationState::Waiting
            | MigrationState::Starting
            | MigrationState::Restarting
            | MigrationState::InProgress
            | MigrationState::InProgressCanceling
            | MigrationState::Stopping => Verdict::Continue,

            MigrationState::Stopped
            | MigrationState::Canceled
            | MigrationState::Succeeded
            | MigrationState::Failed => Verdict::Stop,

            MigrationState::NoConnectionToEngine => {
                if self.no_connection_is_terminal {
                    Verdict::Stop
                } else {
                    Verdict::Continue
                }
            }

            MigrationState::Unknown(_) => Verdict::Continue,
        }
    }

    /// True when polling should stop at `state`.
    pub fn is_terminal(&self, state: &MigrationState) -> bool {
        self.classify(state) == Verdict::Stop
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_roundtrip_for_known_states() {
        for state in MigrationState::KNOWN.iter() {
            assert_eq!(&MigrationState::from_wire(state.as_wire()), state);
            assert!(!state.is_unknown());
        }
    }

    #[test]
    fn unrecognised_wire_name_is_kept() {
        let state = MigrationState::from_wire("PAUSED");
        assert_eq!(state, MigrationState::Unknown("PAUSED".into()));
        assert_eq!(state.to_string(), "PAUSED");
    }

    #[test]
    fn deserialize_never_fails_on_new_states() {
        let state: MigrationState = serde_json::from_str(r#""VERIFYING""#).unwrap();
        assert!(state.is_unknown());

        let state: MigrationState = serde_json::from_str(r#""IN_PROGRESS""#).unwrap();
        assert_eq!(state, MigrationState::InProgress);
    }

    #[test]
    fn serialize_uses_wire_name() {
        let json = serde_json::to_string(&MigrationState::NoConnectionToEngine).unwrap();
        assert_eq!(json, r#""NO_CONNECTION_TO_ENGINE""#);
    }

    #[test]
    fn classification_is_total_and_stable() {
        let classifier = Classifier::default();
        for state in MigrationState::KNOWN.iter() {
            let first = classifier.classify(state);
            assert_eq!(classifier.classify(state), first);
            assert_eq!(classifier.is_terminal(state), first == Verdict::Stop);
        }
    }

    #[test]
    fn default_terminal_set() {
        let classifier = Classifier::default();
        let known = MigrationState::KNOWN;
        let terminal: Vec<&MigrationState> = known
            .iter()
            .filter(|s| classifier.is_terminal(s))
            .collect();
        assert_eq!(
            terminal,
            vec![
                &MigrationState::Stopped,
                &MigrationState::Canceled,
                &MigrationState::Succeeded,
                &MigrationState::Failed,
                &MigrationState::NoConnectionToEngine,
            ]
        );
    }

    #[test]
    fn draining_states_keep_polling() {
        let classifier = Classifier::default();
        assert_eq!(
            classifier.classify(&MigrationState::InProgressCanceling),
            Verdict::Continue
        );
        assert_eq!(classifier.classify(&MigrationState::Stopping), Verdict::Continue);
    }

    #[test]
    fn no_connection_policy_is_configurable() {
        let strict = Classifier::new(true);
        let lenient = Classifier::new(false);
        assert_eq!(
            strict.classify(&MigrationState::NoConnectionToEngine),
            Verdict::Stop
        );
        assert_eq!(
            lenient.classify(&MigrationState::NoConnectionToEngine),
            Verdict::Continue
        );
    }

    #[test]
    fn unknown_state_continues() {
        let classifier = Classifier::default();
        assert_eq!(
            classifier.classify(&MigrationState::Unknown("ARCHIVING".into())),
            Verdict::Continue
        );
    }
}
