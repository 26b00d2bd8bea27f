//! CSV export for captured leads.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::records::Lead;

/// Byte-order mark so spreadsheet tools detect UTF-8.
pub const BOM: &str = "\u{feff}";

pub const LEAD_HEADERS: [&str; 7] = [
    "id",
    "name",
    "phone",
    "email",
    "preferred_contact",
    "note",
    "created_at",
];

/// Quote a field if it contains a comma, quote or newline.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Header row followed by one line per row, `\n`-separated. No rows means
/// an empty document, not a lone header.
pub fn to_csv<R, S>(headers: &[&str], rows: R) -> String
where
    R: IntoIterator<Item = Vec<S>>,
    S: AsRef<str>,
{
    let mut lines = Vec::new();
    for row in rows {
        let line = row
            .iter()
            .map(|field| escape(field.as_ref()))
            .collect::<Vec<_>>()
            .join(",");
        lines.push(line);
    }
    if lines.is_empty() {
        return String::new();
    }
    let mut out = headers.join(",");
    for line in lines {
        out.push('\n');
        out.push_str(&line);
    }
    out
}

pub fn leads_to_csv(leads: &[Lead]) -> String {
    let rows = leads.iter().map(|lead| {
        vec![
            lead.id.clone(),
            lead.name.clone(),
            lead.phone.clone(),
            lead.email.clone().unwrap_or_default(),
            lead.preferred_contact.as_str().to_string(),
            lead.note.clone().unwrap_or_default(),
            lead.created_at.to_rfc3339(),
        ]
    });
    to_csv(&LEAD_HEADERS, rows)
}

pub fn with_bom(csv: &str) -> String {
    format!("{BOM}{csv}")
}

/// `leads-YYYY-MM-DD.csv`
pub fn default_export_filename(now: DateTime<Utc>) -> String {
    format!("leads-{}.csv", now.format("%Y-%m-%d"))
}

/// Header plus at most `max_rows` data lines.
pub fn preview(csv: &str, max_rows: usize) -> String {
    csv.split('\n')
        .take(max_rows.saturating_add(1))
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CsvReport {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub row_count: usize,
    pub column_count: usize,
}

/// Naive column-count check: splits on every comma, quoted or not.
pub fn validate(csv: &str) -> CsvReport {
    let lines: Vec<&str> = csv.split('\n').filter(|l| !l.trim().is_empty()).collect();
    let Some(header) = lines.first() else {
        return CsvReport {
            is_valid: false,
            errors: vec!["CSV is empty".to_string()],
            row_count: 0,
            column_count: 0,
        };
    };

    let column_count = header.split(',').count();
    let errors: Vec<String> = lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| {
            let columns = line.split(',').count();
            (columns != column_count).then(|| {
                format!(
                    "Row {} has {} columns, expected {}",
                    i + 1,
                    columns,
                    column_count
                )
            })
        })
        .collect();

    CsvReport {
        is_valid: errors.is_empty(),
        errors,
        row_count: lines.len() - 1,
        column_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::ContactMethod;
    use chrono::TimeZone;

    fn lead(name: &str, note: Option<&str>) -> Lead {
        Lead {
            id: "1728138600000-abc123xyz".into(),
            name: name.into(),
            phone: "+37499000000".into(),
            email: None,
            preferred_contact: ContactMethod::Whatsapp,
            note: note.map(str::to_string),
            created_at: Utc.with_ymd_and_hms(2024, 10, 5, 14, 30, 0).unwrap(),
        }
    }

    #[test]
    fn empty_input_is_empty_document() {
        assert_eq!(leads_to_csv(&[]), "");
    }

    #[test]
    fn header_and_column_order() {
        let csv = leads_to_csv(&[lead("Anna", None)]);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("id,name,phone,email,preferred_contact,note,created_at")
        );
        assert_eq!(
            lines.next(),
            Some("1728138600000-abc123xyz,Anna,+37499000000,,whatsapp,,2024-10-05T14:30:00+00:00")
        );
    }

    #[test]
    fn special_characters_are_quoted() {
        let csv = leads_to_csv(&[lead("Smith, John", Some("said \"call me\"\nafter 6"))]);
        assert!(csv.contains("\"Smith, John\""));
        assert!(csv.contains("\"said \"\"call me\"\"\nafter 6\""));
    }

    #[test]
    fn bom_and_filename() {
        assert!(with_bom("a,b").starts_with('\u{feff}'));
        let now = Utc.with_ymd_and_hms(2024, 10, 5, 23, 0, 0).unwrap();
        assert_eq!(default_export_filename(now), "leads-2024-10-05.csv");
    }

    #[test]
    fn preview_keeps_header() {
        let csv = "h1,h2\n1,2\n3,4\n5,6";
        assert_eq!(preview(csv, 2), "h1,h2\n1,2\n3,4");
        assert_eq!(preview(csv, 10), csv);
        assert_eq!(preview(csv, usize::MAX), csv);
    }

    #[test]
    fn validate_reports_ragged_rows() {
        let report = validate("a,b,c\n1,2,3\n4,5\n");
        assert!(!report.is_valid);
        assert_eq!(report.row_count, 2);
        assert_eq!(report.column_count, 3);
        assert_eq!(report.errors, vec!["Row 3 has 2 columns, expected 3"]);

        let empty = validate("  \n");
        assert!(!empty.is_valid);
        assert_eq!(empty.errors, vec!["CSV is empty"]);
    }
}
