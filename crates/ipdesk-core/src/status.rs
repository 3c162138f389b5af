//! Filing status: a closed set of automatic and manual states, plus any
//! free-form text an administrator chooses to set.
//!
//! Parsing is ASCII case-insensitive; known states always render in their
//! canonical spelling (`"GRANTED"`, `"Under Review"`, ...).

use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

// ─── Automatic states ────────────────────────────────────────────────────────

/// States the deriver computes from dates alone.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum AutoStatus {
  #[strum(serialize = "FILED")]
  Filed,
  #[strum(serialize = "EXPIRING SOON")]
  ExpiringSoon,
  #[strum(serialize = "EXPIRED")]
  Expired,
  #[strum(serialize = "GRANTED")]
  Granted,
}

// ─── Manual states ───────────────────────────────────────────────────────────

/// States set by an administrator or by the resubmission workflow.
///
/// Manual states are sticky: date-based derivation never replaces them, only
/// a grant date or an explicit workflow transition does.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum ManualStatus {
  #[strum(serialize = "Under Examination")]
  UnderExamination,
  #[strum(serialize = "Under Review")]
  UnderReview,
  #[strum(serialize = "Pending Response")]
  PendingResponse,
  #[strum(serialize = "APPROVED")]
  Approved,
  #[strum(serialize = "REJECTED")]
  Rejected,
  #[strum(serialize = "Withdrawn")]
  Withdrawn,
}

// ─── FilingStatus ────────────────────────────────────────────────────────────

/// The stored and reported status of a filing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilingStatus {
  Automatic(AutoStatus),
  Manual(ManualStatus),
  /// Admin-supplied text matching no known state. Kept verbatim and treated
  /// as overridable by derivation.
  Custom(String),
}

impl FilingStatus {
  pub const FILED: Self = Self::Automatic(AutoStatus::Filed);
  pub const EXPIRING_SOON: Self = Self::Automatic(AutoStatus::ExpiringSoon);
  pub const EXPIRED: Self = Self::Automatic(AutoStatus::Expired);
  pub const GRANTED: Self = Self::Automatic(AutoStatus::Granted);
  pub const UNDER_REVIEW: Self = Self::Manual(ManualStatus::UnderReview);
  pub const PENDING_RESPONSE: Self =
    Self::Manual(ManualStatus::PendingResponse);
  pub const REJECTED: Self = Self::Manual(ManualStatus::Rejected);

  /// Total parse: unknown text becomes [`FilingStatus::Custom`].
  pub fn parse(s: &str) -> Self {
    if let Ok(auto) = s.parse::<AutoStatus>() {
      Self::Automatic(auto)
    } else if let Ok(manual) = s.parse::<ManualStatus>() {
      Self::Manual(manual)
    } else {
      Self::Custom(s.to_owned())
    }
  }

  pub fn as_str(&self) -> &str {
    match self {
      Self::Automatic(a) => <&'static str>::from(*a),
      Self::Manual(m) => <&'static str>::from(*m),
      Self::Custom(s) => s,
    }
  }

  pub fn is_manual(&self) -> bool { matches!(self, Self::Manual(_)) }
}

impl Default for FilingStatus {
  fn default() -> Self { Self::FILED }
}

impl fmt::Display for FilingStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl From<String> for FilingStatus {
  fn from(s: String) -> Self { Self::parse(&s) }
}

impl From<FilingStatus> for String {
  fn from(s: FilingStatus) -> Self {
    match s {
      FilingStatus::Custom(text) => text,
      other => other.as_str().to_owned(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_is_case_insensitive() {
    assert_eq!(FilingStatus::parse("granted"), FilingStatus::GRANTED);
    assert_eq!(FilingStatus::parse("Expiring Soon"), FilingStatus::EXPIRING_SOON);
    assert_eq!(FilingStatus::parse("UNDER REVIEW"), FilingStatus::UNDER_REVIEW);
    assert_eq!(
      FilingStatus::parse("withdrawn"),
      FilingStatus::Manual(ManualStatus::Withdrawn)
    );
  }

  #[test]
  fn known_states_render_canonically() {
    assert_eq!(FilingStatus::parse("pending response").to_string(), "Pending Response");
    assert_eq!(FilingStatus::parse("approved").to_string(), "APPROVED");
    assert_eq!(FilingStatus::FILED.as_str(), "FILED");
  }

  #[test]
  fn unknown_text_is_kept_verbatim() {
    let s = FilingStatus::parse("Awaiting Fee");
    assert_eq!(s, FilingStatus::Custom("Awaiting Fee".into()));
    assert!(!s.is_manual());
    assert_eq!(String::from(s), "Awaiting Fee");
  }

  #[test]
  fn serde_uses_plain_strings() {
    let json = serde_json::to_string(&FilingStatus::EXPIRING_SOON).unwrap();
    assert_eq!(json, "\"EXPIRING SOON\"");
    let back: FilingStatus = serde_json::from_str("\"under examination\"").unwrap();
    assert_eq!(back, FilingStatus::Manual(ManualStatus::UnderExamination));
  }
}
