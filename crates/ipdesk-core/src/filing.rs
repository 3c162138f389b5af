//! Filing types: one user's patent application and its submission form.
//!
//! A [`Filing`] is the stored record. A [`FilingRequest`] is what the
//! applicant submits on create and on every resubmission. A [`FilingView`] is
//! the read model handed back to callers, with the status re-derived live.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error, Result, UserId,
  derive::{FilingFacts, derive_status},
  status::FilingStatus,
};

// ─── Addresses ───────────────────────────────────────────────────────────────

/// The applicant's postal address. Every line is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
  pub street:      String,
  pub city:        String,
  pub state:       String,
  pub postal_code: String,
}

/// A correspondence address; each line may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrespondenceAddress {
  pub street:      Option<String>,
  pub city:        Option<String>,
  pub state:       Option<String>,
  pub postal_code: Option<String>,
}

impl From<&Address> for CorrespondenceAddress {
  fn from(a: &Address) -> Self {
    Self {
      street:      Some(a.street.clone()),
      city:        Some(a.city.clone()),
      state:       Some(a.state.clone()),
      postal_code: Some(a.postal_code.clone()),
    }
  }
}

// ─── Payment ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  #[default]
  Unpaid,
  Paid,
}

// ─── Inventor directory ──────────────────────────────────────────────────────

/// A row in the shared inventor directory. Rows are matched by exact name;
/// `"Ada Lovelace"` and `"ada lovelace"` are two different inventors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventor {
  pub inventor_id: i64,
  pub name:        String,
}

// ─── Filing content ──────────────────────────────────────────────────────────

/// Everything the applicant fills in on the submission form, apart from the
/// inventor list and lifecycle dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilingContent {
  // Applicant
  pub applicant_name:      String,
  /// Individual, Startup, Company, University, ...
  pub applicant_type:      String,
  pub nationality:         String,
  pub address:             Address,
  pub correspondence_same: bool,
  pub correspondence:      CorrespondenceAddress,
  pub email:               String,
  pub phone:               String,
  /// Inventor, Assignee, Agent, ...
  pub filing_role:         String,
  pub is_inventor:         bool,
  pub id_type:             String,
  pub id_number:           String,

  // Patent
  pub patent_type:                 String,
  pub jurisdiction:                String,
  pub technical_field:             String,
  pub title:                       String,
  pub abstract_text:               String,
  pub problem_statement:           Option<String>,
  pub novelty:                     Option<String>,
  pub priority_claim:              bool,
  pub priority_application_number: Option<String>,
  pub priority_date:               Option<NaiveDate>,

  // Artifacts, stored as paths; uploads live elsewhere.
  pub specification_path: Option<String>,
  pub claims_path:        Option<String>,
  pub drawing_paths:      Vec<String>,

  // Payment
  pub payment_method: Option<String>,
  pub payment_status: PaymentStatus,
  pub total_fee:      Option<f64>,
}

impl FilingContent {
  /// Build fresh content from a submission, applying form defaults.
  pub fn from_request(req: &FilingRequest) -> Self {
    Self {
      applicant_name:      req.applicant_name.clone(),
      applicant_type:      req.applicant_type.clone(),
      nationality:         req.nationality.clone(),
      address:             req.address(),
      correspondence_same: req.correspondence_same.unwrap_or(true),
      correspondence:      req.correspondence(),
      email:               req.email.clone(),
      phone:               req.phone.clone(),
      filing_role:         req.filing_role.clone(),
      is_inventor:         req.is_inventor.unwrap_or(true),
      id_type:             req.id_type.clone(),
      id_number:           req.id_number.clone(),

      patent_type:                 req.patent_type.clone(),
      jurisdiction:                req.jurisdiction.clone(),
      technical_field:             req.technical_field.clone(),
      title:                       req.title.clone(),
      abstract_text:               req.abstract_text.clone(),
      problem_statement:           req.problem_statement.clone(),
      novelty:                     req.novelty.clone(),
      priority_claim:              req.priority_claim.unwrap_or(false),
      priority_application_number: req.priority_application_number.clone(),
      priority_date:               req.priority_date,

      specification_path: req.specification_path.clone(),
      claims_path:        req.claims_path.clone(),
      drawing_paths:      req.drawing_paths.clone().unwrap_or_default(),

      payment_method: req.payment_method.clone(),
      payment_status: req.payment_status.unwrap_or_default(),
      total_fee:      req.total_fee,
    }
  }

  /// Overwrite from a resubmission.
  ///
  /// Required text fields and the correspondence lines are always replaced.
  /// Flags, the priority date, artifacts and payment details are only
  /// replaced when the request carries them.
  pub fn apply_request(&mut self, req: &FilingRequest) {
    self.applicant_name = req.applicant_name.clone();
    self.applicant_type = req.applicant_type.clone();
    self.nationality = req.nationality.clone();
    self.address = req.address();
    if let Some(same) = req.correspondence_same {
      self.correspondence_same = same;
    }
    self.correspondence = req.correspondence();
    self.email = req.email.clone();
    self.phone = req.phone.clone();
    self.filing_role = req.filing_role.clone();
    if let Some(is_inventor) = req.is_inventor {
      self.is_inventor = is_inventor;
    }
    self.id_type = req.id_type.clone();
    self.id_number = req.id_number.clone();

    self.patent_type = req.patent_type.clone();
    self.jurisdiction = req.jurisdiction.clone();
    self.technical_field = req.technical_field.clone();
    self.title = req.title.clone();
    self.abstract_text = req.abstract_text.clone();
    self.problem_statement = req.problem_statement.clone();
    self.novelty = req.novelty.clone();
    if let Some(claim) = req.priority_claim {
      self.priority_claim = claim;
    }
    self.priority_application_number = req.priority_application_number.clone();
    if req.priority_date.is_some() {
      self.priority_date = req.priority_date;
    }

    if req.specification_path.is_some() {
      self.specification_path = req.specification_path.clone();
    }
    if req.claims_path.is_some() {
      self.claims_path = req.claims_path.clone();
    }
    if let Some(paths) = &req.drawing_paths {
      self.drawing_paths = paths.clone();
    }

    if req.payment_method.is_some() {
      self.payment_method = req.payment_method.clone();
    }
    if let Some(status) = req.payment_status {
      self.payment_status = status;
    }
    if req.total_fee.is_some() {
      self.total_fee = req.total_fee;
    }
  }

  /// The address correspondence should go to, honouring
  /// `correspondence_same`.
  pub fn mailing_address(&self) -> CorrespondenceAddress {
    if self.correspondence_same {
      CorrespondenceAddress::from(&self.address)
    } else {
      self.correspondence.clone()
    }
  }
}

// ─── Filing ──────────────────────────────────────────────────────────────────

/// A persisted patent filing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filing {
  pub filing_id:               i64,
  /// Owner; never changes after creation.
  pub user_id:                 UserId,
  /// `APP-<unix millis>`; assigned once by the store, globally unique.
  pub application_number:      String,
  #[serde(flatten)]
  pub content:                 FilingContent,
  pub inventors:               Vec<Inventor>,
  pub filing_date:             NaiveDate,
  pub expiry_date:             Option<NaiveDate>,
  pub grant_date:              Option<NaiveDate>,
  /// The stored status. May lag behind [`Filing::derived_status`].
  pub status:                  FilingStatus,
  pub admin_feedback:          Option<String>,
  pub requested_update_fields: Vec<String>,
  pub created_at:              DateTime<Utc>,
  pub updated_at:              DateTime<Utc>,
}

impl Filing {
  pub fn facts(&self) -> FilingFacts<'_> {
    FilingFacts {
      grant_date:    self.grant_date,
      expiry_date:   self.expiry_date,
      stored_status: &self.status,
    }
  }

  pub fn derived_status(&self, today: NaiveDate) -> FilingStatus {
    derive_status(&self.facts(), today)
  }
}

// ─── Read model ──────────────────────────────────────────────────────────────

/// What callers see: the stored filing with `status` replaced by the live
/// derivation, plus the effective mailing address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilingView {
  #[serde(flatten)]
  pub filing:          Filing,
  pub mailing_address: CorrespondenceAddress,
}

impl FilingView {
  pub fn from_filing(mut filing: Filing, today: NaiveDate) -> Self {
    filing.status = filing.derived_status(today);
    let mailing_address = filing.content.mailing_address();
    Self { filing, mailing_address }
  }
}

// ─── Submission ──────────────────────────────────────────────────────────────

/// A filing submission, accepted on create and update.
///
/// Missing text fields deserialise as empty strings so [`validate`] can name
/// the offending field.
///
/// [`validate`]: FilingRequest::validate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilingRequest {
  pub applicant_name:            String,
  pub applicant_type:            String,
  pub nationality:               String,
  pub address_street:            String,
  pub address_city:              String,
  pub address_state:             String,
  pub address_postal_code:       String,
  pub correspondence_same:       Option<bool>,
  pub correspondence_street:     Option<String>,
  pub correspondence_city:       Option<String>,
  pub correspondence_state:      Option<String>,
  pub correspondence_postal_code: Option<String>,
  pub email:                     String,
  pub phone:                     String,
  pub filing_role:               String,
  pub is_inventor:               Option<bool>,
  pub id_type:                   String,
  pub id_number:                 String,

  pub patent_type:                 String,
  pub jurisdiction:                String,
  pub technical_field:             String,
  pub title:                       String,
  pub abstract_text:               String,
  pub problem_statement:           Option<String>,
  pub novelty:                     Option<String>,
  /// Inventor names. An empty list on update leaves the linked inventors
  /// untouched.
  pub inventors:                   Vec<String>,
  pub priority_claim:              Option<bool>,
  pub priority_application_number: Option<String>,
  pub priority_date:               Option<NaiveDate>,

  pub specification_path: Option<String>,
  pub claims_path:        Option<String>,
  pub drawing_paths:      Option<Vec<String>>,

  pub payment_method: Option<String>,
  pub payment_status: Option<PaymentStatus>,
  pub total_fee:      Option<f64>,

  /// Defaults to the creation date.
  pub filing_date: Option<NaiveDate>,
  /// Defaults to twenty years after the filing date.
  pub expiry_date: Option<NaiveDate>,
  pub grant_date:  Option<NaiveDate>,
}

impl FilingRequest {
  /// Check required fields and simple formats. The first failure wins.
  pub fn validate(&self) -> Result<()> {
    let required: [(&'static str, &str); 16] = [
      ("applicant_name", self.applicant_name.as_str()),
      ("applicant_type", self.applicant_type.as_str()),
      ("nationality", self.nationality.as_str()),
      ("address_street", self.address_street.as_str()),
      ("address_city", self.address_city.as_str()),
      ("address_state", self.address_state.as_str()),
      ("address_postal_code", self.address_postal_code.as_str()),
      ("email", self.email.as_str()),
      ("phone", self.phone.as_str()),
      ("filing_role", self.filing_role.as_str()),
      ("id_type", self.id_type.as_str()),
      ("id_number", self.id_number.as_str()),
      ("patent_type", self.patent_type.as_str()),
      ("jurisdiction", self.jurisdiction.as_str()),
      ("technical_field", self.technical_field.as_str()),
      ("title", self.title.as_str()),
    ];
    for (field, value) in required {
      if value.trim().is_empty() {
        return Err(Error::invalid(field, "is required"));
      }
    }

    if !looks_like_email(&self.email) {
      return Err(Error::invalid("email", "is not a valid email address"));
    }

    if self.inventors.iter().any(|name| name.trim().is_empty()) {
      return Err(Error::invalid("inventors", "inventor name is required"));
    }

    if let Some(fee) = self.total_fee
      && !(fee.is_finite() && fee >= 0.0)
    {
      return Err(Error::invalid("total_fee", "must be a non-negative amount"));
    }

    if let (Some(filing), Some(expiry)) = (self.filing_date, self.expiry_date)
      && expiry < filing
    {
      return Err(Error::invalid("expiry_date", "precedes the filing date"));
    }

    Ok(())
  }

  /// Inventor names to link, or `None` to keep the current links.
  pub fn inventor_names(&self) -> Option<&[String]> {
    (!self.inventors.is_empty()).then_some(self.inventors.as_slice())
  }

  fn address(&self) -> Address {
    Address {
      street:      self.address_street.clone(),
      city:        self.address_city.clone(),
      state:       self.address_state.clone(),
      postal_code: self.address_postal_code.clone(),
    }
  }

  fn correspondence(&self) -> CorrespondenceAddress {
    CorrespondenceAddress {
      street:      self.correspondence_street.clone(),
      city:        self.correspondence_city.clone(),
      state:       self.correspondence_state.clone(),
      postal_code: self.correspondence_postal_code.clone(),
    }
  }
}

fn looks_like_email(s: &str) -> bool {
  match s.trim().split_once('@') {
    Some((local, domain)) => {
      !local.is_empty() && !domain.is_empty() && !domain.contains('@')
    }
    None => false,
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;

  pub(crate) fn sample_request() -> FilingRequest {
    FilingRequest {
      applicant_name: "Ada Lovelace".into(),
      applicant_type: "Individual".into(),
      nationality: "GB".into(),
      address_street: "12 St James's Square".into(),
      address_city: "London".into(),
      address_state: "Greater London".into(),
      address_postal_code: "SW1Y 4JH".into(),
      email: "ada@example.com".into(),
      phone: "+44 20 0000 0000".into(),
      filing_role: "Inventor".into(),
      id_type: "Passport".into(),
      id_number: "P1234567".into(),
      patent_type: "Utility".into(),
      jurisdiction: "US".into(),
      technical_field: "Computing".into(),
      title: "Analytical engine".into(),
      abstract_text: "A general-purpose mechanical computer.".into(),
      inventors: vec!["Ada Lovelace".into(), "Charles Babbage".into()],
      ..Default::default()
    }
  }

  #[test]
  fn complete_request_validates() {
    sample_request().validate().unwrap();
  }

  #[test]
  fn blank_required_field_is_named() {
    let mut req = sample_request();
    req.technical_field = "   ".into();
    let err = req.validate().unwrap_err();
    assert!(matches!(
      err,
      Error::ValidationFailed { field: "technical_field", .. }
    ));
  }

  #[test]
  fn blank_abstract_is_accepted() {
    let mut req = sample_request();
    req.abstract_text = String::new();
    req.validate().unwrap();
  }

  #[test]
  fn malformed_email_rejected() {
    let mut req = sample_request();
    req.email = "ada.example.com".into();
    assert!(matches!(
      req.validate(),
      Err(Error::ValidationFailed { field: "email", .. })
    ));
  }

  #[test]
  fn blank_inventor_name_rejected() {
    let mut req = sample_request();
    req.inventors.push(String::new());
    assert!(matches!(
      req.validate(),
      Err(Error::ValidationFailed { field: "inventors", .. })
    ));
  }

  #[test]
  fn missing_fields_deserialise_to_validation_errors() {
    let req: FilingRequest =
      serde_json::from_str(r#"{"applicant_name":"Ada"}"#).unwrap();
    assert!(matches!(
      req.validate(),
      Err(Error::ValidationFailed { field: "applicant_type", .. })
    ));
  }

  #[test]
  fn create_defaults() {
    let content = FilingContent::from_request(&sample_request());
    assert!(content.correspondence_same);
    assert!(content.is_inventor);
    assert!(!content.priority_claim);
    assert_eq!(content.payment_status, PaymentStatus::Unpaid);
    assert!(content.drawing_paths.is_empty());
  }

  #[test]
  fn update_keeps_optional_fields_that_were_not_sent() {
    let mut first = sample_request();
    first.specification_path = Some("spec.pdf".into());
    first.payment_status = Some(PaymentStatus::Paid);
    first.is_inventor = Some(false);
    first.drawing_paths = Some(vec!["fig1.png".into()]);
    let mut content = FilingContent::from_request(&first);

    let mut second = sample_request();
    second.title = "Difference engine".into();
    content.apply_request(&second);

    assert_eq!(content.title, "Difference engine");
    assert_eq!(content.specification_path.as_deref(), Some("spec.pdf"));
    assert_eq!(content.payment_status, PaymentStatus::Paid);
    assert!(!content.is_inventor);
    assert_eq!(content.drawing_paths, vec!["fig1.png".to_string()]);
  }

  #[test]
  fn mailing_address_follows_same_flag() {
    let mut req = sample_request();
    req.correspondence_same = Some(false);
    req.correspondence_city = Some("Paris".into());
    let content = FilingContent::from_request(&req);
    assert_eq!(content.mailing_address().city.as_deref(), Some("Paris"));
    assert_eq!(content.mailing_address().street, None);

    let content = FilingContent::from_request(&sample_request());
    assert_eq!(content.mailing_address().city.as_deref(), Some("London"));
  }
}
