use super::ContactRecord;
use crate::portal::CONTACT_GRID_ID;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static TABLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table").unwrap());
static ROW_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL_SELECTOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());

/// Parses the contact grid out of a school submit response.
///
/// Grid columns are: serial number, school, contact name, mobile, email,
/// application number. Missing cells become empty strings, an empty school
/// cell falls back to `school_name`, and rows without any name, mobile or
/// email are dropped. A response without the grid yields no records.
///
/// # Arguments
/// * `text` - Raw submit response (delta or full page)
/// * `state` - State name to stamp on each record
/// * `district` - District name to stamp on each record
/// * `school_name` - Name of the submitted school, from the dropdown
pub fn extract_contacts(
    text: &str,
    state: &str,
    district: &str,
    school_name: &str,
) -> Vec<ContactRecord> {
    let document = Html::parse_document(text);

    let Some(grid) = document
        .select(&TABLE_SELECTOR)
        .find(|el| el.value().id() == Some(CONTACT_GRID_ID))
    else {
        return Vec::new();
    };

    grid.select(&ROW_SELECTOR)
        .filter_map(|row| parse_row(&row))
        .map(|cells| {
            let cell = |i: usize| cells.get(i).cloned().unwrap_or_default();
            let school = cell(1);

            ContactRecord {
                state: state.to_string(),
                district: district.to_string(),
                school: if school.is_empty() {
                    school_name.to_string()
                } else {
                    school
                },
                contact_name: cell(2),
                mobile_number: cell(3),
                email: cell(4),
                application_number: cell(5),
            }
        })
        .filter(ContactRecord::has_contact)
        .collect()
}

/// Trimmed `<td>` texts of a row; `None` for header rows made of `<th>`.
fn parse_row(row: &ElementRef) -> Option<Vec<String>> {
    let cells: Vec<String> = row
        .select(&CELL_SELECTOR)
        .map(|td| td.text().collect::<String>().trim().to_string())
        .collect();

    if cells.is_empty() {
        None
    } else {
        Some(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &str) -> String {
        format!(
            r#"1|#||4|900|updatePanel|ctl00_ContentPlaceHolder1_UpdatePanel1|
            <table id="ctl00_ContentPlaceHolder1_grdContactDtl">
                <tr><th>S.No</th><th>School</th><th>Name</th><th>Mobile</th><th>Email</th><th>Application No</th></tr>
                {rows}
            </table>|"#
        )
    }

    #[test]
    fn test_extracts_rows_in_order() {
        let text = grid(
            "<tr><td>1</td><td>ZPHS Amberpet</td><td> R. Rao </td><td>9000000001</td><td>rao@example.in</td><td>2024TS001</td></tr>
             <tr><td>2</td><td>ZPHS Amberpet</td><td>S. Devi</td><td>9000000002</td><td></td><td>2024TS002</td></tr>",
        );

        let records = extract_contacts(&text, "Telangana", "Hyderabad", "ZPHS Amberpet");
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            ContactRecord {
                state: "Telangana".into(),
                district: "Hyderabad".into(),
                school: "ZPHS Amberpet".into(),
                contact_name: "R. Rao".into(),
                mobile_number: "9000000001".into(),
                email: "rao@example.in".into(),
                application_number: "2024TS001".into(),
            }
        );
        assert_eq!(records[1].contact_name, "S. Devi");
        assert_eq!(records[1].email, "");
    }

    #[test]
    fn test_missing_cells_become_empty() {
        let text = grid("<tr><td>1</td><td></td><td>K. Reddy</td></tr>");

        let records = extract_contacts(&text, "Telangana", "Hyderabad", "GHS Nampally");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].school, "GHS Nampally");
        assert_eq!(records[0].contact_name, "K. Reddy");
        assert_eq!(records[0].mobile_number, "");
        assert_eq!(records[0].application_number, "");
    }

    #[test]
    fn test_rows_without_contact_are_dropped() {
        let text = grid("<tr><td>1</td><td>GHS</td><td></td><td></td><td></td><td>2024TS009</td></tr>");
        assert!(extract_contacts(&text, "Telangana", "Hyderabad", "GHS").is_empty());
    }

    #[test]
    fn test_no_grid_means_no_records() {
        let text = "1|#||4|20|updatePanel|panel|<p>No Record Found</p>|";
        assert!(extract_contacts(text, "Telangana", "Hyderabad", "GHS").is_empty());
    }
}
