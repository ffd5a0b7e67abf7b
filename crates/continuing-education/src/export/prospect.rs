use crate::locale::Locale;
use crate::prospects::domain::Prospect;

use super::Workbook;

fn header_titles(locale: Locale) -> Vec<String> {
    let titles: [&str; 6] = match locale {
        Locale::En => ["Name", "First name", "City", "Email", "Phone number", "Formation"],
        Locale::Fr => ["Nom", "Prénom", "Ville", "Email", "Numéro de téléphone", "Formation"],
    };
    titles.into_iter().map(str::to_string).collect()
}

pub fn prospect_rows(prospects: &[Prospect]) -> Vec<Vec<String>> {
    prospects
        .iter()
        .map(|prospect| {
            let form = &prospect.form;
            vec![
                form.name.clone(),
                form.first_name.clone(),
                form.city.clone(),
                form.email.clone(),
                form.phone_number.clone(),
                form.formation.clone(),
            ]
        })
        .collect()
}

pub fn prospect_workbook(username: &str, prospects: &[Prospect], locale: Locale) -> Workbook {
    let (title, filename) = match locale {
        Locale::En => ("Prospects list", "Prospects_list"),
        Locale::Fr => ("Liste des prospects", "Liste_prospects"),
    };

    Workbook {
        description: title.to_string(),
        username: username.to_string(),
        filename: filename.to_string(),
        worksheet_title: title.to_string(),
        header_titles: header_titles(locale),
        content: prospect_rows(prospects),
        filters: Vec::new(),
    }
}
