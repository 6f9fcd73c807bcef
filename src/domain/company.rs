use std::fmt;

use serde::Serialize;

pub const DEFAULT_SEARCH_URL: &str = "https://www.thomasnet.com/nsearch.html?act=C&cov=NA&heading=30772305&navsec=modify&what=Food+Products&which=prod";

pub const COLUMNS: [&str; 6] = [
    "name",
    "address",
    "website",
    "thomasnet_company_url",
    "business_description",
    "phone_number",
];

/// URL of a search-results page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery(String);

impl SearchQuery {
    pub fn new(url: impl Into<String>) -> Self {
        SearchQuery(url.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Relative path of a company profile, as found on a profile card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CompanyLink(String);

impl CompanyLink {
    pub fn new(path: impl Into<String>) -> Self {
        CompanyLink(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Plain concatenation, the link is not normalised against the origin.
    pub fn absolute_url(&self, origin: &str) -> String {
        format!("{}{}", origin, self.0)
    }
}

impl fmt::Display for CompanyLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompanyRecord {
    pub name: String,
    pub address: String,
    pub website: String,
    pub thomasnet_company_url: String,
    pub business_description: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedProfile {
    pub link: CompanyLink,
    pub reason: String,
}

/// Rows in link discovery order, plus the links dropped under the skip policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CompanyTable {
    pub records: Vec<CompanyRecord>,
    pub skipped: Vec<SkippedProfile>,
}

impl CompanyTable {
    pub fn columns(&self) -> &'static [&'static str] {
        &COLUMNS
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn to_csv(&self) -> Result<String, csv::Error> {
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.write_record(COLUMNS)?;
        for record in self.records.iter() {
            writer.write_record([
                record.name.as_str(),
                record.address.as_str(),
                record.website.as_str(),
                record.thomasnet_company_url.as_str(),
                record.business_description.as_deref().unwrap_or(""),
                record.phone_number.as_deref().unwrap_or(""),
            ])?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| csv::Error::from(e.into_error()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, phone: Option<&str>) -> CompanyRecord {
        CompanyRecord {
            name: name.to_string(),
            address: "1 Main St, Springfield, IL".to_string(),
            website: "https://example.com".to_string(),
            thomasnet_company_url: format!("https://www.thomasnet.com/profile/{}", name),
            business_description: None,
            phone_number: phone.map(|p| p.to_string()),
        }
    }

    #[test]
    fn absolute_url_is_plain_concatenation() {
        let link = CompanyLink::new("/profile/01234/acme.html?cid=1");

        assert_eq!(
            link.absolute_url("https://www.thomasnet.com"),
            "https://www.thomasnet.com/profile/01234/acme.html?cid=1"
        );
    }

    #[test]
    fn csv_has_header_and_empty_cells_for_absent_values() {
        let table = CompanyTable {
            records: vec![record("acme", Some("555-0100")), record("beta", None)],
            skipped: vec![],
        };

        let csv = table.to_csv().unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "name,address,website,thomasnet_company_url,business_description,phone_number"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].ends_with(",,555-0100"));
        assert!(lines[2].ends_with(",,"));
        assert!(lines[1].contains("\"1 Main St, Springfield, IL\""));
    }

    #[test]
    fn record_serializes_absent_fields_as_null() {
        let json = serde_json::to_value(record("acme", None)).unwrap();

        assert!(json["phone_number"].is_null());
        assert_eq!(json["name"], "acme");
    }
}
