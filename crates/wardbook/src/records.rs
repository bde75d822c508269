//! Core record types for wardbook.
//!
//! Staff is the root record; dependants and visits belong to exactly one
//! staff record and have no lifecycle of their own.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum number of dependants a staff record may own.
pub const MAX_DEPENDANTS: i64 = 10;

/// A registered staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Staff {
    /// Row identity, stable across re-registration.
    pub id: i64,
    /// Natural key.
    pub hospital_number: String,
    /// Full name.
    pub full_name: String,
    /// Date of birth as entered.
    pub dob: String,
    /// Gender as entered.
    pub gender: String,
    /// Telephone number.
    pub telephone: String,
    /// Force or file number.
    pub force_file_number: String,
    /// Duty station.
    pub station: String,
    /// Rank.
    pub rank: String,
    /// Relative path of the stored photo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// When the hospital number was first registered.
    pub created_at: DateTime<Utc>,
    /// When the record was last registered or re-registered.
    pub updated_at: DateTime<Utc>,
}

/// Fields submitted when registering or re-registering staff.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewStaff {
    /// Natural key; required.
    pub hospital_number: String,
    /// Full name; required.
    pub full_name: String,
    /// Date of birth.
    pub dob: String,
    /// Gender.
    pub gender: String,
    /// Telephone number.
    pub telephone: String,
    /// Force or file number.
    pub force_file_number: String,
    /// Duty station.
    pub station: String,
    /// Rank.
    pub rank: String,
    /// Relative path of a newly stored photo, if one was uploaded.
    pub photo: Option<String>,
}

impl NewStaff {
    /// Check the two required fields are present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] naming the first empty required field.
    pub fn validate(&self) -> Result<()> {
        if self.hospital_number.trim().is_empty() {
            return Err(Error::invalid_input("hospital_number", "must not be empty"));
        }
        if self.full_name.trim().is_empty() {
            return Err(Error::invalid_input("full_name", "must not be empty"));
        }
        Ok(())
    }
}

/// The reduced projection shown in the staff listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffSummary {
    /// Row identity.
    pub id: i64,
    /// Natural key.
    pub hospital_number: String,
    /// Full name.
    pub full_name: String,
    /// Duty station.
    pub station: String,
    /// Rank.
    pub rank: String,
}

/// How a single staff record is selected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StaffKey {
    /// By row identity.
    Id(i64),
    /// By hospital number.
    HospitalNumber(String),
}

impl fmt::Display for StaffKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id {id}"),
            Self::HospitalNumber(number) => write!(f, "hospital number {number}"),
        }
    }
}

/// A family member of a staff record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependant {
    /// Row identity.
    pub id: i64,
    /// Owning staff record.
    pub staff_id: i64,
    /// Name.
    pub name: String,
    /// Date of birth as entered.
    pub dob: String,
    /// Relation to the staff member.
    pub relation: String,
    /// Relative path of the stored photo.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

/// Fields submitted when adding a dependant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewDependant {
    /// Name.
    pub name: String,
    /// Date of birth.
    pub dob: String,
    /// Relation to the staff member.
    pub relation: String,
    /// Relative path of a stored photo.
    pub photo: Option<String>,
}

/// Result of an add-dependant request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependantAdded {
    /// The dependant was stored with this id.
    Added(i64),
    /// The staff record already owns [`MAX_DEPENDANTS`]; nothing was written.
    LimitReached,
}

/// How a visit was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    /// Patient recovered.
    Recovered,
    /// Patient was discharged.
    Discharged,
    /// Patient died.
    Died,
    /// Patient was referred elsewhere.
    Referred,
}

impl Outcome {
    /// Every outcome, in the order offered on the visit form.
    pub const ALL: [Self; 4] = [Self::Recovered, Self::Discharged, Self::Died, Self::Referred];

    /// The stored and displayed label.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Recovered => "Recovered",
            Self::Discharged => "Discharged",
            Self::Died => "Died",
            Self::Referred => "Referred",
        }
    }

    /// Parse an optional form value; blank means no outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownOutcome`] for anything outside the vocabulary.
    pub fn parse_optional(value: Option<&str>) -> Result<Option<Self>> {
        match value.map(str::trim) {
            None | Some("") => Ok(None),
            Some(label) => label.parse().map(Some),
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|outcome| outcome.as_str() == s)
            .ok_or_else(|| Error::UnknownOutcome(s.to_string()))
    }
}

/// A clinical encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    /// Row identity.
    pub id: i64,
    /// Owning staff record.
    pub staff_id: i64,
    /// Date of the visit.
    pub visit_date: NaiveDate,
    /// Reason for the visit.
    pub reason: String,
    /// Patient condition, e.g. stable or critical.
    pub condition: String,
    /// Visit type, e.g. exam, treatment, checkup.
    pub visit_type: String,
    /// Whether the patient was admitted.
    pub admitted: bool,
    /// Admission date as entered.
    pub admission_date: Option<String>,
    /// Resolution of the visit.
    pub outcome: Option<Outcome>,
    /// Where the patient was referred.
    pub referral_destination: Option<String>,
    /// Discharge date as entered.
    pub discharge_date: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
    /// When the visit was logged.
    pub created_at: DateTime<Utc>,
}

/// Fields submitted when logging a visit.
///
/// Admission and outcome fields are not cross-checked against `admitted`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVisit {
    /// Date of the visit.
    pub visit_date: NaiveDate,
    /// Reason for the visit.
    pub reason: String,
    /// Patient condition.
    pub condition: String,
    /// Visit type.
    pub visit_type: String,
    /// Whether the patient was admitted.
    pub admitted: bool,
    /// Admission date.
    pub admission_date: Option<String>,
    /// Resolution of the visit.
    pub outcome: Option<Outcome>,
    /// Referral destination.
    pub referral_destination: Option<String>,
    /// Discharge date.
    pub discharge_date: Option<String>,
    /// Free-text notes.
    pub notes: Option<String>,
}

impl NewVisit {
    /// A visit dated today with every optional field absent.
    #[must_use]
    pub fn today() -> Self {
        Self {
            visit_date: today(),
            reason: String::new(),
            condition: String::new(),
            visit_type: String::new(),
            admitted: false,
            admission_date: None,
            outcome: None,
            referral_destination: None,
            discharge_date: None,
            notes: None,
        }
    }
}

/// A staff record with everything it owns, as shown on the detail view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaffDetail {
    /// The staff record.
    pub staff: Staff,
    /// Dependants in the order they were added.
    pub dependants: Vec<Dependant>,
    /// Visits, newest visit date first.
    pub visits: Vec<Visit>,
}

impl StaffDetail {
    /// Whether another dependant may be added.
    #[must_use]
    pub fn can_add_dependant(&self) -> bool {
        i64::try_from(self.dependants.len()).is_ok_and(|n| n < MAX_DEPENDANTS)
    }
}

/// The current local date.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a submitted visit date, defaulting to today when blank.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when the value is not `YYYY-MM-DD`.
pub fn parse_visit_date(value: Option<&str>) -> Result<NaiveDate> {
    match value.map(str::trim) {
        None | Some("") => Ok(today()),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d").map_err(|_| {
            Error::invalid_input("date_visit", format!("expected YYYY-MM-DD, got '{text}'"))
        }),
    }
}

/// Collapse a blank optional form value to `None`.
#[must_use]
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_round_trip_labels() {
        for outcome in Outcome::ALL {
            assert_eq!(outcome.as_str().parse::<Outcome>().unwrap(), outcome);
        }
        assert_eq!(Outcome::Died.to_string(), "Died");
    }

    #[test]
    fn test_outcome_rejects_unknown_label() {
        let err = "Escaped".parse::<Outcome>().unwrap_err();
        assert!(matches!(err, Error::UnknownOutcome(label) if label == "Escaped"));
    }

    #[test]
    fn test_outcome_is_case_sensitive() {
        assert!("died".parse::<Outcome>().is_err());
    }

    #[test]
    fn test_parse_optional_outcome() {
        assert_eq!(Outcome::parse_optional(None).unwrap(), None);
        assert_eq!(Outcome::parse_optional(Some("")).unwrap(), None);
        assert_eq!(Outcome::parse_optional(Some("  ")).unwrap(), None);
        assert_eq!(
            Outcome::parse_optional(Some("Referred")).unwrap(),
            Some(Outcome::Referred)
        );
        assert!(Outcome::parse_optional(Some("Absconded")).is_err());
    }

    #[test]
    fn test_new_staff_requires_hospital_number() {
        let staff = NewStaff {
            full_name: "Ada Obi".to_string(),
            ..NewStaff::default()
        };
        let err = staff.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidInput { field: "hospital_number", .. }));
    }

    #[test]
    fn test_new_staff_requires_full_name() {
        let staff = NewStaff {
            hospital_number: "HN-001".to_string(),
            full_name: "   ".to_string(),
            ..NewStaff::default()
        };
        let err = staff.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidInput { field: "full_name", .. }));
    }

    #[test]
    fn test_new_staff_valid() {
        let staff = NewStaff {
            hospital_number: "HN-001".to_string(),
            full_name: "Ada Obi".to_string(),
            ..NewStaff::default()
        };
        assert!(staff.validate().is_ok());
    }

    #[test]
    fn test_parse_visit_date_defaults_to_today() {
        assert_eq!(parse_visit_date(None).unwrap(), today());
        assert_eq!(parse_visit_date(Some("")).unwrap(), today());
    }

    #[test]
    fn test_parse_visit_date_explicit() {
        assert_eq!(
            parse_visit_date(Some("2024-03-09")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
        );
    }

    #[test]
    fn test_parse_visit_date_rejects_garbage() {
        let err = parse_visit_date(Some("09/03/2024")).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some(String::new())), None);
        assert_eq!(non_blank(Some("  \t".to_string())), None);
        assert_eq!(
            non_blank(Some(" Ward 3 ".to_string())),
            Some("Ward 3".to_string())
        );
    }

    #[test]
    fn test_staff_key_display() {
        assert_eq!(StaffKey::Id(7).to_string(), "id 7");
        assert_eq!(
            StaffKey::HospitalNumber("A12".to_string()).to_string(),
            "hospital number A12"
        );
    }

    #[test]
    fn test_new_visit_today_defaults() {
        let visit = NewVisit::today();
        assert_eq!(visit.visit_date, today());
        assert!(!visit.admitted);
        assert!(visit.outcome.is_none());
        assert!(visit.notes.is_none());
    }
}
