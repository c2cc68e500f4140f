// 📂 Dataset Loader
// Bursary records + qualification key, normalized once right after load

use crate::config::DashboardConfig;
use crate::error::DataLoadError;
use crate::normalize::{canonical_ethnic_group, strip_year_suffix};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

pub const COL_INSTITUTION: &str = "Institution";
pub const COL_QUALIFICATION: &str = "Qualification";
pub const COL_GENDER: &str = "Gender";
pub const COL_ETHNIC_GROUP: &str = "Ethnic Group";
pub const COL_TOTAL_FUNDS: &str = "Total Funds";

const RECORD_COLUMNS: [&str; 5] = [
    COL_INSTITUTION,
    COL_QUALIFICATION,
    COL_GENDER,
    COL_ETHNIC_GROUP,
    COL_TOTAL_FUNDS,
];

const KEY_COLUMNS: [&str; 2] = [COL_INSTITUTION, COL_QUALIFICATION];

// ============================================================================
// BURSARY RECORD
// ============================================================================

/// One funded student/qualification entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BursaryRecord {
    #[serde(rename = "Institution")]
    pub institution: String,

    #[serde(rename = "Qualification")]
    pub qualification: String,

    #[serde(rename = "Gender")]
    pub gender: String,

    #[serde(rename = "Ethnic Group")]
    pub ethnic_group: String,

    #[serde(rename = "Total Funds", deserialize_with = "deserialize_funds")]
    pub total_funds: f64,
}

impl BursaryRecord {
    pub fn new(
        institution: &str,
        qualification: &str,
        gender: &str,
        ethnic_group: &str,
        total_funds: f64,
    ) -> Self {
        BursaryRecord {
            institution: institution.to_string(),
            qualification: qualification.to_string(),
            gender: gender.to_string(),
            ethnic_group: ethnic_group.to_string(),
            total_funds,
        }
    }

    /// Apply the text normalization every record gets exactly once
    fn normalized(mut self) -> Self {
        self.qualification = strip_year_suffix(&self.qualification);
        self.ethnic_group = canonical_ethnic_group(&self.ethnic_group);
        self
    }
}

/// Parse a Total Funds cell: "12500", "12500.50", "R12,500.00", "R 12 500"
pub fn parse_funds(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .trim_start_matches('R')
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn deserialize_funds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    match parse_funds(&raw) {
        Some(amount) if amount < 0.0 => Err(de::Error::custom(format!(
            "negative Total Funds '{}'",
            raw.trim()
        ))),
        Some(amount) => Ok(amount),
        None => Err(de::Error::custom(format!("invalid Total Funds '{}'", raw))),
    }
}

// ============================================================================
// QUALIFICATION KEY
// ============================================================================

/// One (Institution, Qualification) row of the lookup appendix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualificationKeyEntry {
    pub institution: String,
    pub qualification: String,

    /// Remaining columns, aligned with `QualificationKeyTable::detail_columns`
    pub details: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualificationKeyTable {
    /// Header names of the non-key columns, in source order
    pub detail_columns: Vec<String>,
    pub entries: Vec<QualificationKeyEntry>,
}

impl QualificationKeyTable {
    /// Every column name, key columns first
    pub fn columns(&self) -> Vec<String> {
        KEY_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.detail_columns.iter().cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Keep the first row for each (Institution, normalized Qualification).
/// Expects qualification names to be normalized already.
pub fn dedup_qualification_key(table: QualificationKeyTable) -> QualificationKeyTable {
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let before = table.entries.len();

    let entries: Vec<QualificationKeyEntry> = table
        .entries
        .into_iter()
        .filter(|entry| seen.insert((entry.institution.clone(), entry.qualification.clone())))
        .collect();

    debug!(before, after = entries.len(), "deduplicated qualification key");

    QualificationKeyTable {
        detail_columns: table.detail_columns,
        entries,
    }
}

// ============================================================================
// READERS
// ============================================================================

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader)
}

fn check_columns(
    headers: &csv::StringRecord,
    required: &[&str],
    source: &Path,
) -> Result<(), DataLoadError> {
    for column in required {
        if !headers.iter().any(|h| h == *column) {
            return Err(DataLoadError::MissingColumn {
                path: source.to_path_buf(),
                column: column.to_string(),
            });
        }
    }
    Ok(())
}

fn open_source(path: &Path) -> Result<File, DataLoadError> {
    if !path.exists() {
        return Err(DataLoadError::MissingFile {
            path: path.to_path_buf(),
        });
    }

    File::open(path).map_err(|e| DataLoadError::Unreadable {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })
}

/// Read bursary records from any CSV source; `source` names it in errors
pub fn read_records<R: Read>(reader: R, source: &Path) -> Result<Vec<BursaryRecord>, DataLoadError> {
    let mut rdr = csv_reader(reader);

    let headers = rdr.headers().map_err(|e| DataLoadError::Unreadable {
        path: source.to_path_buf(),
        source: e,
    })?;
    check_columns(headers, &RECORD_COLUMNS, source)?;

    let mut records = Vec::new();
    for result in rdr.deserialize::<BursaryRecord>() {
        let record = result.map_err(|e| DataLoadError::InvalidRow {
            path: source.to_path_buf(),
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        records.push(record.normalized());
    }

    Ok(records)
}

/// Read the qualification key from any CSV source (not deduplicated)
pub fn read_qualification_key<R: Read>(
    reader: R,
    source: &Path,
) -> Result<QualificationKeyTable, DataLoadError> {
    let mut rdr = csv_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| DataLoadError::Unreadable {
            path: source.to_path_buf(),
            source: e,
        })?
        .clone();
    check_columns(&headers, &KEY_COLUMNS, source)?;

    let position = |name: &str| headers.iter().position(|h| h == name).unwrap_or(0);
    let institution_idx = position(COL_INSTITUTION);
    let qualification_idx = position(COL_QUALIFICATION);
    let detail_indices: Vec<usize> = (0..headers.len())
        .filter(|i| *i != institution_idx && *i != qualification_idx)
        .collect();

    let mut table = QualificationKeyTable {
        detail_columns: detail_indices
            .iter()
            .map(|i| headers[*i].to_string())
            .collect(),
        entries: Vec::new(),
    };

    for result in rdr.records() {
        let row = result.map_err(|e| DataLoadError::InvalidRow {
            path: source.to_path_buf(),
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;

        let field = |i: usize| row.get(i).unwrap_or("").to_string();
        table.entries.push(QualificationKeyEntry {
            institution: field(institution_idx),
            qualification: strip_year_suffix(&field(qualification_idx)),
            details: detail_indices.iter().map(|i| field(*i)).collect(),
        });
    }

    Ok(table)
}

pub fn load_records(path: &Path) -> Result<Vec<BursaryRecord>, DataLoadError> {
    let file = open_source(path)?;
    read_records(file, path)
}

pub fn load_qualification_key(path: &Path) -> Result<QualificationKeyTable, DataLoadError> {
    let file = open_source(path)?;
    read_qualification_key(file, path)
}

// ============================================================================
// DATASET
// ============================================================================

/// Both cleaned tables; recomputed on every render
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<BursaryRecord>,
    pub qualification_key: QualificationKeyTable,
}

impl Dataset {
    pub fn new(records: Vec<BursaryRecord>, qualification_key: QualificationKeyTable) -> Self {
        Dataset {
            records,
            qualification_key: dedup_qualification_key(qualification_key),
        }
    }

    pub fn load(config: &DashboardConfig) -> Result<Self, DataLoadError> {
        Self::load_paths(&config.records_path, &config.qualification_key_path)
    }

    pub fn load_paths(records_path: &Path, key_path: &Path) -> Result<Self, DataLoadError> {
        let records = load_records(records_path)?;
        info!(path = %records_path.display(), rows = records.len(), "loaded bursary records");

        let key = load_qualification_key(key_path)?;
        let raw_rows = key.len();
        let dataset = Dataset::new(records, key);
        info!(
            path = %key_path.display(),
            rows = dataset.qualification_key.len(),
            duplicates = raw_rows - dataset.qualification_key.len(),
            "loaded qualification key"
        );

        Ok(dataset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const RECORDS_CSV: &str = "\
Institution,Qualification,Gender,Ethnic Group,Total Funds
UCT,Diploma (1st Year),Female,Black/African,1000
UCT,Diploma (2nd Year),Male,Black,2500.50
Wits,BSc (3rd Year),Female,Indian,\"R12,000.00\"
";

    const KEY_CSV: &str = "\
Institution,Qualification,Description
InstX,BSc (1st Year),Bachelor of Science
InstX,BSc (2nd Year),Bachelor of Science (senior)
InstY,BSc (1st Year),Bachelor of Science
";

    fn source() -> PathBuf {
        PathBuf::from("test.csv")
    }

    #[test]
    fn test_read_records_normalizes_once() {
        let records = read_records(RECORDS_CSV.as_bytes(), &source()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].qualification, "Diploma");
        assert_eq!(records[1].qualification, "Diploma");
        assert_eq!(records[0].ethnic_group, "Black");
        assert_eq!(records[1].ethnic_group, "Black");
        assert_eq!(records[1].total_funds, 2500.50);
        assert_eq!(records[2].total_funds, 12000.0);
        assert_eq!(records[2].qualification, "BSc");
    }

    #[test]
    fn test_read_records_missing_column() {
        let csv = "Institution,Qualification,Gender,Total Funds\nUCT,BSc,Female,10\n";
        let err = read_records(csv.as_bytes(), &source()).unwrap_err();

        match err {
            DataLoadError::MissingColumn { column, .. } => assert_eq!(column, "Ethnic Group"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_records_invalid_amount() {
        let csv = "Institution,Qualification,Gender,Ethnic Group,Total Funds\n\
                   UCT,BSc,Female,White,10\n\
                   UCT,BSc,Male,White,lots\n";
        let err = read_records(csv.as_bytes(), &source()).unwrap_err();

        match err {
            DataLoadError::InvalidRow { line, message, .. } => {
                assert_eq!(line, 3);
                assert!(message.contains("lots"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_records_rejects_negative_amount() {
        let csv = "Institution,Qualification,Gender,Ethnic Group,Total Funds\n\
                   UCT,BSc,Female,White,10\n\
                   UCT,BSc,Female,Black,-500\n";
        let err = read_records(csv.as_bytes(), &source()).unwrap_err();

        match err {
            DataLoadError::InvalidRow { line, message, .. } => {
                assert_eq!(line, 3);
                assert!(message.contains("negative Total Funds '-500'"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_read_records_invalid_utf8_header() {
        let mut csv = b"Institution,Qualification,Gender,Ethnic Group,Total Funds\xff\n".to_vec();
        csv.extend_from_slice(b"UCT,BSc,Female,White,10\n");
        let err = read_records(&csv[..], &source()).unwrap_err();

        assert!(matches!(err, DataLoadError::Unreadable { .. }));
        assert_eq!(err.path(), &source());
    }

    #[test]
    fn test_read_records_empty_table() {
        let csv = "Institution,Qualification,Gender,Ethnic Group,Total Funds\n";
        let records = read_records(csv.as_bytes(), &source()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_funds() {
        assert_eq!(parse_funds("1500"), Some(1500.0));
        assert_eq!(parse_funds(" 1500.25 "), Some(1500.25));
        assert_eq!(parse_funds("R1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_funds("R 12 500"), Some(12_500.0));
        assert_eq!(parse_funds(""), None);
        assert_eq!(parse_funds("R"), None);
        assert_eq!(parse_funds("n/a"), None);
        assert_eq!(parse_funds("NaN"), None);
    }

    #[test]
    fn test_read_qualification_key_keeps_details() {
        let table = read_qualification_key(KEY_CSV.as_bytes(), &source()).unwrap();

        assert_eq!(table.detail_columns, vec!["Description"]);
        assert_eq!(table.columns(), vec!["Institution", "Qualification", "Description"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.entries[0].qualification, "BSc");
        assert_eq!(table.entries[1].details, vec!["Bachelor of Science (senior)"]);
    }

    #[test]
    fn test_read_qualification_key_missing_column() {
        let csv = "Institution,Description\nInstX,Something\n";
        let err = read_qualification_key(csv.as_bytes(), &source()).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn { ref column, .. } if column == "Qualification"));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence() {
        let table = read_qualification_key(KEY_CSV.as_bytes(), &source()).unwrap();
        let deduped = dedup_qualification_key(table);

        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped.entries[0].institution, "InstX");
        assert_eq!(deduped.entries[0].qualification, "BSc");
        assert_eq!(deduped.entries[0].details, vec!["Bachelor of Science"]);
        assert_eq!(deduped.entries[1].institution, "InstY");
    }

    #[test]
    fn test_dedup_year_variants_collapse_to_one_row() {
        let csv = "Institution,Qualification\nInstX,BSc (1st Year)\nInstX,BSc (2nd Year)\n";
        let table = read_qualification_key(csv.as_bytes(), &source()).unwrap();
        let deduped = dedup_qualification_key(table);

        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped.entries[0].qualification, "BSc");
        assert!(deduped.detail_columns.is_empty());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_records(Path::new("/nonexistent/bursary.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingFile { .. }));
        assert_eq!(err.path(), &PathBuf::from("/nonexistent/bursary.csv"));

        let err = load_qualification_key(Path::new("/nonexistent/key.csv")).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingFile { .. }));
    }

    #[test]
    fn test_dataset_load_missing_records_is_fatal() {
        let config = DashboardConfig {
            records_path: PathBuf::from("/nonexistent/records.csv"),
            qualification_key_path: PathBuf::from("/nonexistent/key.csv"),
            ..DashboardConfig::default()
        };
        assert!(Dataset::load(&config).is_err());
    }

    #[test]
    fn test_dataset_new_dedups_key() {
        let key = read_qualification_key(KEY_CSV.as_bytes(), &source()).unwrap();
        let dataset = Dataset::new(Vec::new(), key);
        assert_eq!(dataset.qualification_key.len(), 2);
    }
}
