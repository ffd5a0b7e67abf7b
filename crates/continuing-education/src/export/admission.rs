use crate::admissions::domain::Admission;
use crate::admissions::state::AdmissionState;
use crate::locale::Locale;

use super::Workbook;

fn header_titles(locale: Locale) -> Vec<String> {
    let titles: [&str; 6] = match locale {
        Locale::En => ["Name", "First name", "Email", "Formation", "Faculty", "State"],
        Locale::Fr => ["Nom", "Prénom", "Email", "Formation", "Faculté", "État"],
    };
    titles.into_iter().map(str::to_string).collect()
}

const fn list_title(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Admissions list",
        Locale::Fr => "Liste des admissions",
    }
}

const fn list_filename(locale: Locale) -> &'static str {
    match locale {
        Locale::En => "Admissions_list",
        Locale::Fr => "Liste_admissions",
    }
}

/// Filter criteria of the admission search form that produced an export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdmissionExportFilters {
    pub faculty: Option<String>,
    pub formation: Option<String>,
    pub state: Option<AdmissionState>,
}

impl AdmissionExportFilters {
    /// Non-empty criteria keyed by their localized field label, in form order.
    pub fn labelled(&self, locale: Locale) -> Vec<(String, String)> {
        let (faculty, formation, state) = match locale {
            Locale::En => ("Faculty", "Formation", "State"),
            Locale::Fr => ("Faculté", "Formation", "État"),
        };

        let mut criteria = Vec::new();
        if let Some(value) = self.faculty.as_deref().filter(|v| !v.is_empty()) {
            criteria.push((faculty.to_string(), value.to_string()));
        }
        if let Some(value) = self.formation.as_deref().filter(|v| !v.is_empty()) {
            criteria.push((formation.to_string(), value.to_string()));
        }
        if let Some(value) = self.state {
            criteria.push((state.to_string(), value.label(locale).to_string()));
        }
        criteria
    }
}

/// `[last name, first name, email, formation, faculty or blank, state label]`.
pub fn admission_row(admission: &Admission, locale: Locale) -> Vec<String> {
    let person = &admission.form.person_information.person;
    vec![
        person.last_name.clone(),
        person.first_name.clone(),
        admission.form.email.clone(),
        admission.form.formation.acronym.clone(),
        admission.faculty().unwrap_or_default().to_string(),
        admission.state.label(locale).to_string(),
    ]
}

pub fn admission_rows(admissions: &[Admission], locale: Locale) -> Vec<Vec<String>> {
    admissions
        .iter()
        .map(|admission| admission_row(admission, locale))
        .collect()
}

pub fn admission_workbook(
    username: &str,
    admissions: &[Admission],
    filters: &AdmissionExportFilters,
    locale: Locale,
) -> Workbook {
    Workbook {
        description: list_title(locale).to_string(),
        username: username.to_string(),
        filename: list_filename(locale).to_string(),
        worksheet_title: list_title(locale).to_string(),
        header_titles: header_titles(locale),
        content: admission_rows(admissions, locale),
        filters: filters.labelled(locale),
    }
}
