use crate::locale::Locale;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workflow state of an admission. Serialized with the stored value
/// (`"Registration submitted"`), which doubles as the English label. Parsing
/// and deserializing both ignore ASCII case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AdmissionState {
    Draft,
    Submitted,
    Waiting,
    Accepted,
    #[serde(rename = "Accepted (no registration required)")]
    AcceptedNoRegistrationRequired,
    Rejected,
    #[serde(rename = "Registration submitted")]
    RegistrationSubmitted,
    Validated,
    Cancelled,
}

impl AdmissionState {
    pub const fn ordered() -> [Self; 9] {
        [
            Self::Draft,
            Self::Submitted,
            Self::Waiting,
            Self::Accepted,
            Self::AcceptedNoRegistrationRequired,
            Self::Rejected,
            Self::RegistrationSubmitted,
            Self::Validated,
            Self::Cancelled,
        ]
    }

    pub const fn value(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Submitted => "Submitted",
            Self::Waiting => "Waiting",
            Self::Accepted => "Accepted",
            Self::AcceptedNoRegistrationRequired => "Accepted (no registration required)",
            Self::Rejected => "Rejected",
            Self::RegistrationSubmitted => "Registration submitted",
            Self::Validated => "Validated",
            Self::Cancelled => "Cancelled",
        }
    }

    pub const fn label(self, locale: Locale) -> &'static str {
        match locale {
            Locale::En => self.value(),
            Locale::Fr => match self {
                Self::Draft => "Brouillon",
                Self::Submitted => "Soumise",
                Self::Waiting => "En attente",
                Self::Accepted => "Acceptée",
                Self::AcceptedNoRegistrationRequired => "Acceptée (inscription non requise)",
                Self::Rejected => "Refusée",
                Self::RegistrationSubmitted => "Inscription soumise",
                Self::Validated => "Validée",
                Self::Cancelled => "Annulée",
            },
        }
    }

    /// Accepted, registration submitted and validated admissions are tracked
    /// as registrations.
    pub const fn is_registration(self) -> bool {
        matches!(
            self,
            Self::Accepted | Self::RegistrationSubmitted | Self::Validated
        )
    }

    /// Snake-case fragment used in notification template names.
    pub fn template_key(self) -> String {
        self.value()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == ' ')
            .collect::<String>()
            .to_ascii_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl fmt::Display for AdmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.value())
    }
}

impl FromStr for AdmissionState {
    type Err = TransitionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ordered()
            .into_iter()
            .find(|state| state.value().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| TransitionError::UnknownState(value.to_string()))
    }
}

impl<'de> Deserialize<'de> for AdmissionState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("no transition defined from state '{0}'")]
    NoTransitionDefined(AdmissionState),
    #[error("unknown admission state '{0}'")]
    UnknownState(String),
    #[error("transition from '{from}' to '{to}' is not allowed")]
    NotAllowed {
        from: AdmissionState,
        to: AdmissionState,
    },
}

/// States an admission may move to from `state`.
///
/// Cancelled and accepted-without-registration admissions have no entry and
/// yield [`TransitionError::NoTransitionDefined`].
pub fn allowed_next(state: AdmissionState) -> Result<&'static [AdmissionState], TransitionError> {
    use AdmissionState::*;

    match state {
        Draft => Ok(&[Submitted]),
        Submitted => Ok(&[Accepted, Rejected, Waiting, Draft]),
        Waiting | Rejected => Ok(&[Accepted, Rejected, Waiting]),
        Accepted | Validated => Ok(&[RegistrationSubmitted]),
        RegistrationSubmitted => Ok(&[Validated]),
        Cancelled | AcceptedNoRegistrationRequired => Err(TransitionError::NoTransitionDefined(state)),
    }
}

pub fn allowed_next_for_value(value: &str) -> Result<&'static [AdmissionState], TransitionError> {
    allowed_next(value.parse()?)
}

pub fn check_transition(from: AdmissionState, to: AdmissionState) -> Result<(), TransitionError> {
    if allowed_next(from)?.contains(&to) {
        Ok(())
    } else {
        Err(TransitionError::NotAllowed { from, to })
    }
}

/// A selectable next state with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateChoice {
    pub state: AdmissionState,
    pub label: &'static str,
}

pub fn choices(state: AdmissionState, locale: Locale) -> Result<Vec<StateChoice>, TransitionError> {
    Ok(allowed_next(state)?
        .iter()
        .map(|next| StateChoice {
            state: *next,
            label: next.label(locale),
        })
        .collect())
}
