use serde::{Deserialize, Serialize};
use std::fmt;

/// Numeric identifier assigned on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProspectId(pub u64);

impl fmt::Display for ProspectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Contact details of someone interested in a formation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProspectForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub formation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prospect {
    pub id: ProspectId,
    #[serde(flatten)]
    pub form: ProspectForm,
}

/// Exact-match filters plus a free-text search over the same fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProspectFilter {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

impl ProspectFilter {
    pub fn matches(&self, prospect: &Prospect) -> bool {
        let form = &prospect.form;
        let exact = [
            (&self.first_name, &form.first_name),
            (&self.name, &form.name),
            (&self.email, &form.email),
            (&self.postal_code, &form.postal_code),
        ]
        .into_iter()
        .all(|(wanted, actual)| {
            wanted
                .as_deref()
                .filter(|value| !value.is_empty())
                .map_or(true, |value| value == actual)
        });

        let search = match self.search.as_deref().map(str::trim) {
            Some(term) if !term.is_empty() => {
                let term = term.to_lowercase();
                [&form.first_name, &form.name, &form.email, &form.postal_code]
                    .into_iter()
                    .any(|field| field.to_lowercase().contains(&term))
            }
            _ => true,
        };

        exact && search
    }
}
