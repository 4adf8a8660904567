/// Contact records: extraction from portal responses and CSV output
mod extract;
mod sink;

pub use extract::extract_contacts;
pub use sink::{district_file_path, sanitize_file_name, CsvSink, CSV_HEADER};

use serde::{Deserialize, Serialize};

/// One row of school contact data, as written to the district CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "District")]
    pub district: String,
    #[serde(rename = "School")]
    pub school: String,
    #[serde(rename = "Contact Name")]
    pub contact_name: String,
    #[serde(rename = "Mobile Number")]
    pub mobile_number: String,
    #[serde(rename = "Email")]
    pub email: String,
    #[serde(rename = "Application Number")]
    pub application_number: String,
}

impl ContactRecord {
    /// A record with no way to reach anyone is not worth keeping.
    pub fn has_contact(&self) -> bool {
        !(self.contact_name.is_empty() && self.mobile_number.is_empty() && self.email.is_empty())
    }
}
