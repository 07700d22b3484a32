use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::utils::validation::{validate_date_of_birth, validate_nic, validate_photo, validate_sex};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
    Other,
}

impl Sex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sex::Male => "Male",
            Sex::Female => "Female",
            Sex::Other => "Other",
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Sex::Male),
            "Female" => Ok(Sex::Female),
            "Other" => Ok(Sex::Other),
            other => Err(format!("unknown sex '{}'", other)),
        }
    }
}

/// A stored employee record as returned to clients.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,
    pub full_name: String,
    pub nic_number: String,
    pub date_of_birth: NaiveDate,
    /// Fixed at write time from `date_of_birth`.
    pub age: i32,
    pub sex: Sex,
    pub district: String,
    pub permanent_address: String,
    pub temporary_address: String,
    pub contact_details: String,
    /// Base64 encoded image.
    pub photo: Option<String>,
}

/// Request body for both create and update. Every field is optional so that
/// missing fields can be reported by name and updates can be partial.
/// Unknown keys (`id`, `age`, ...) are ignored.
#[derive(Deserialize, Validate, Debug, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EmployeePayload {
    pub full_name: Option<String>,
    #[validate(custom = "validate_nic")]
    pub nic_number: Option<String>,
    #[validate(custom = "validate_date_of_birth")]
    pub date_of_birth: Option<String>,
    #[validate(custom = "validate_sex")]
    pub sex: Option<String>,
    pub district: Option<String>,
    pub permanent_address: Option<String>,
    pub temporary_address: Option<String>,
    pub contact_details: Option<String>,
    #[validate(custom = "validate_photo")]
    pub photo: Option<String>,
}

impl EmployeePayload {
    /// Field values keyed by their wire names.
    pub fn fields(&self) -> [(&'static str, Option<&str>); 9] {
        [
            ("fullName", self.full_name.as_deref()),
            ("nicNumber", self.nic_number.as_deref()),
            ("dateOfBirth", self.date_of_birth.as_deref()),
            ("sex", self.sex.as_deref()),
            ("district", self.district.as_deref()),
            ("permanentAddress", self.permanent_address.as_deref()),
            ("temporaryAddress", self.temporary_address.as_deref()),
            ("contactDetails", self.contact_details.as_deref()),
            ("photo", self.photo.as_deref()),
        ]
    }

    /// Trims every text field and upper-cases the NIC number.
    pub fn normalized(self) -> Self {
        fn trim(value: Option<String>) -> Option<String> {
            value.map(|v| v.trim().to_string())
        }

        EmployeePayload {
            full_name: trim(self.full_name),
            nic_number: self.nic_number.map(|v| normalize_nic(&v)),
            date_of_birth: trim(self.date_of_birth),
            sex: trim(self.sex),
            district: trim(self.district),
            permanent_address: trim(self.permanent_address),
            temporary_address: trim(self.temporary_address),
            contact_details: trim(self.contact_details),
            photo: trim(self.photo),
        }
    }
}

pub fn normalize_nic(nic_number: &str) -> String {
    nic_number.trim().to_uppercase()
}

/// Optional filters for listing.
#[derive(Deserialize, Debug, Default, Clone)]
pub struct EmployeeFilter {
    /// Case-insensitive substring of the NIC number.
    pub nic: Option<String>,
}

impl EmployeeFilter {
    pub fn matches(&self, employee: &Employee) -> bool {
        match self.nic.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => {
                employee.nic_number.contains(&needle.to_uppercase())
            }
            _ => true,
        }
    }
}
