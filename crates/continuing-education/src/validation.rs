//! Field-level validation of submitted forms.
//!
//! Every rule runs before anything is persisted; a form with a single failing
//! field is rejected as a whole.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::admissions::domain::AdmissionForm;
use crate::prospects::domain::ProspectForm;

const PHONE_PATTERN: &str = r"^(\+|0{1,2})\d{7,15}$";
const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

const MIN_YEAR: u16 = 1900;
const MAX_YEAR: u16 = 2100;
const MAX_FILE_NAME_CHARS: usize = 100;

fn phone_regex() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(PHONE_PATTERN).expect("phone pattern compiles"))
}

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"))
}

/// Messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, Vec<String>> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    fn required(&mut self, field: &str, value: &str) {
        if value.trim().is_empty() {
            self.add(field, "This field is required.");
        }
    }

    fn max_chars(&mut self, field: &str, value: &str, max: usize) {
        let count = value.chars().count();
        if count > max {
            self.add(
                field,
                format!("Ensure this value has at most {max} characters (it has {count})."),
            );
        }
    }

    fn email(&mut self, field: &str, value: &str) {
        if !value.is_empty() && !email_regex().is_match(value) {
            self.add(field, "Enter a valid email address.");
        }
    }

    fn alphanumeric(&mut self, field: &str, value: &str) {
        if !value.chars().all(|c| c.is_ascii_alphanumeric()) {
            self.add(field, "Only alphanumeric characters are allowed.");
        }
    }

    fn year(&mut self, field: &str, value: Option<u16>) {
        if let Some(year) = value {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                self.add(
                    field,
                    format!("Year must be between {MIN_YEAR} and {MAX_YEAR}."),
                );
            }
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.fields.keys().cloned().collect::<Vec<_>>();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

pub fn validate_admission(form: &AdmissionForm) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let person = &form.person_information.person;

    errors.required("first_name", &person.first_name);
    errors.required("last_name", &person.last_name);
    errors.email("person_email", &person.email);

    errors.required("formation", &form.formation.acronym);
    errors.alphanumeric("formation", &form.formation.acronym);

    errors.email("email", &form.email);
    if !form.phone_mobile.is_empty() && !phone_regex().is_match(&form.phone_mobile) {
        errors.add(
            "phone_mobile",
            "Phone number must start with 0 or 00 or '+' followed by at least 7 digits and up to 15 digits.",
        );
    }

    errors.year("high_school_graduation_year", form.high_school_graduation_year);
    errors.year("last_degree_graduation_year", form.last_degree_graduation_year);
    errors.year("academic_year", form.academic_year);

    errors.alphanumeric("id_card_number", &form.id_card_number);
    errors.alphanumeric("passport_number", &form.passport_number);

    errors.into_result()
}

pub fn validate_prospect(form: &ProspectForm) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    errors.required("email", &form.email);
    errors.email("email", &form.email);
    errors.max_chars("email", &form.email, 255);
    errors.max_chars("name", &form.name, 250);
    errors.max_chars("first_name", &form.first_name, 250);
    errors.max_chars("postal_code", &form.postal_code, 250);
    errors.max_chars("city", &form.city, 50);
    errors.max_chars("phone_number", &form.phone_number, 30);

    errors.into_result()
}

/// Accepts plain file names only, so a name can never escape the admission
/// directory.
pub fn validate_file_name(name: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let trimmed = name.trim();

    if trimmed.is_empty() {
        errors.add("file", "A file name is required.");
    } else if trimmed == "." || trimmed == ".." || trimmed.contains(['/', '\\', '\0']) {
        errors.add("file", "File name must not contain path components.");
    }
    errors.max_chars("file", trimmed, MAX_FILE_NAME_CHARS);

    errors.into_result()
}
