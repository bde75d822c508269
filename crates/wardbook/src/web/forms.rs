//! Submitted forms and query strings.

use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::text::Text;
use actix_multipart::form::MultipartForm;
use serde::Deserialize;

use super::dispatch::VIEW_STAFF;
use crate::error::{Error, Result};
use crate::records::{
    non_blank, parse_visit_date, NewDependant, NewStaff, NewVisit, Outcome, StaffKey,
};

fn text(field: Option<Text<String>>) -> String {
    field.map(|t| t.0).unwrap_or_default()
}

fn parse_staff_id(value: &str) -> Result<i64> {
    value.trim().parse().map_err(|_| {
        Error::invalid_input("staff_id", format!("expected a record id, got '{value}'"))
    })
}

/// The staff registration form.
#[derive(Debug, MultipartForm)]
pub struct StaffForm {
    /// Hospital number.
    pub hospital_number: Option<Text<String>>,
    /// Full name.
    pub full_name: Option<Text<String>>,
    /// Date of birth.
    pub dob: Option<Text<String>>,
    /// Gender.
    pub gender: Option<Text<String>>,
    /// Telephone.
    pub telephone: Option<Text<String>>,
    /// Force/file number.
    pub force_file_number: Option<Text<String>>,
    /// Station.
    pub station: Option<Text<String>>,
    /// Rank.
    pub rank: Option<Text<String>>,
    /// Optional photo.
    pub photo: Option<TempFile>,
}

impl StaffForm {
    /// Split into the record fields and the uploaded photo, if any.
    #[must_use]
    pub fn into_parts(self) -> (NewStaff, Option<TempFile>) {
        let staff = NewStaff {
            hospital_number: text(self.hospital_number).trim().to_string(),
            full_name: text(self.full_name).trim().to_string(),
            dob: text(self.dob),
            gender: text(self.gender),
            telephone: text(self.telephone),
            force_file_number: text(self.force_file_number),
            station: text(self.station),
            rank: text(self.rank),
            photo: None,
        };
        (staff, self.photo)
    }
}

/// The add-dependant form.
#[derive(Debug, MultipartForm)]
pub struct DependantForm {
    /// Owning staff record.
    pub staff_id: Option<Text<String>>,
    /// Name.
    pub dep_name: Option<Text<String>>,
    /// Date of birth.
    pub dep_dob: Option<Text<String>>,
    /// Relation.
    pub dep_relation: Option<Text<String>>,
    /// Optional photo.
    pub dep_photo: Option<TempFile>,
}

impl DependantForm {
    /// Split into the owner id, the record fields and the uploaded photo.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `staff_id` is missing or not a number.
    pub fn into_parts(self) -> Result<(i64, NewDependant, Option<TempFile>)> {
        let staff_id = parse_staff_id(&text(self.staff_id))?;
        let dependant = NewDependant {
            name: text(self.dep_name),
            dob: text(self.dep_dob),
            relation: text(self.dep_relation),
            photo: None,
        };
        Ok((staff_id, dependant, self.dep_photo))
    }
}

/// The log-visit form.
#[derive(Debug, Deserialize)]
pub struct VisitForm {
    /// Owning staff record.
    pub staff_id: String,
    /// Visit date; today when blank.
    pub date_visit: Option<String>,
    /// Reason for the visit.
    pub reason: Option<String>,
    /// Patient condition.
    pub condition: Option<String>,
    /// Visit type.
    #[serde(rename = "type")]
    pub visit_type: Option<String>,
    /// Checkbox; any value means admitted.
    pub admitted: Option<String>,
    /// Admission date.
    pub date_admission: Option<String>,
    /// Outcome label.
    pub outcome: Option<String>,
    /// Referral destination.
    pub referral_destination: Option<String>,
    /// Discharge date.
    pub discharge_date: Option<String>,
    /// Notes.
    pub notes: Option<String>,
}

impl VisitForm {
    /// Validate into the owner id and the visit to log.
    ///
    /// # Errors
    ///
    /// Returns an error for a malformed staff id or visit date, or an outcome
    /// outside the vocabulary.
    pub fn into_new_visit(self) -> Result<(i64, NewVisit)> {
        let staff_id = parse_staff_id(&self.staff_id)?;
        let visit = NewVisit {
            visit_date: parse_visit_date(self.date_visit.as_deref())?,
            reason: self.reason.unwrap_or_default(),
            condition: self.condition.unwrap_or_default(),
            visit_type: self.visit_type.unwrap_or_default(),
            admitted: self.admitted.is_some(),
            admission_date: non_blank(self.date_admission),
            outcome: Outcome::parse_optional(self.outcome.as_deref())?,
            referral_destination: non_blank(self.referral_destination),
            discharge_date: non_blank(self.discharge_date),
            notes: non_blank(self.notes),
        };
        Ok((staff_id, visit))
    }
}

/// Query parameters of the page view.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Requested action.
    pub action: Option<String>,
    /// Listing filter.
    pub search: Option<String>,
    /// Staff record id for the detail view.
    pub id: Option<String>,
    /// Hospital number for the detail view.
    pub hospital_number: Option<String>,
    /// Notice to display, e.g. after a rejected dependant.
    pub error: Option<String>,
}

impl PageQuery {
    /// The staff record the detail panel should show, if one was requested.
    ///
    /// An id takes precedence over a hospital number. An id that is not a
    /// number selects nothing that can exist.
    #[must_use]
    pub fn staff_key(&self) -> Option<StaffKey> {
        if self.action.as_deref() != Some(VIEW_STAFF) {
            return None;
        }
        if let Some(id) = self.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            return Some(StaffKey::Id(id.parse().unwrap_or(0)));
        }
        self.hospital_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|number| StaffKey::HospitalNumber(number.to_string()))
    }

    /// The listing filter, empty when absent.
    #[must_use]
    pub fn search_term(&self) -> &str {
        self.search.as_deref().unwrap_or_default()
    }
}
