//! CSV observation reader with full input validation.

use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ObservationSet;

/// Reads site observations from a CSV file.
///
/// Expected CSV format:
/// - Header row required, holding a timestamp column, a site-label column,
///   a numeric target column, and one or more numeric feature columns
/// - Named columns are located by header name; every remaining column is a
///   feature, in header order
/// - One row per observation, rows in chronological order, all rows with the
///   same number of columns
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumn`] | A named column is absent from the header |
/// | [`IoError::NoFeatureColumns`] | No columns left over after the named ones |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
pub struct ObservationReader {
    path: PathBuf,
    timestamp_column: String,
    site_column: String,
    target_column: String,
}

impl ObservationReader {
    /// Create a new reader for the given CSV file path with default column
    /// names (`date`, `site`, `cyanobacteria`).
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            timestamp_column: "date".to_string(),
            site_column: "site".to_string(),
            target_column: "cyanobacteria".to_string(),
        }
    }

    /// Override the timestamp column name.
    #[must_use]
    pub fn with_timestamp_column(mut self, name: &str) -> Self {
        self.timestamp_column = name.to_string();
        self
    }

    /// Override the site-label column name.
    #[must_use]
    pub fn with_site_column(mut self, name: &str) -> Self {
        self.site_column = name.to_string();
        self
    }

    /// Override the target column name.
    #[must_use]
    pub fn with_target_column(mut self, name: &str) -> Self {
        self.target_column = name.to_string();
        self
    }

    /// Read and validate the CSV file, returning an [`ObservationSet`].
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<ObservationSet, IoError> {
        // 1. Open file (FileNotFound on failure)
        let file = std::fs::File::open(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        // 2. Build CSV reader with headers.
        // flexible(true) allows rows with varying column counts so that our own
        // InconsistentRowLength check fires instead of a low-level CsvParse error.
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        // 3. Read header and locate the named columns
        let header = rdr.headers().map_err(|e| IoError::CsvParse {
            path: self.path.clone(),
            offset: e.position().map_or(0, |p| p.byte()),
            source: e,
        })?;
        let expected_cols = header.len();
        debug!(expected_cols, "read CSV header");

        let locate = |name: &str| -> Result<usize, IoError> {
            header
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| IoError::MissingColumn {
                    path: self.path.clone(),
                    column: name.to_string(),
                })
        };
        let timestamp_col = locate(&self.timestamp_column)?;
        let site_col = locate(&self.site_column)?;
        let target_col = locate(&self.target_column)?;

        // Every column that is not one of the named three is a feature,
        // in header order.
        let feature_cols: Vec<usize> = (0..expected_cols)
            .filter(|&i| i != timestamp_col && i != site_col && i != target_col)
            .collect();
        if feature_cols.is_empty() {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        }
        let feature_names: Vec<String> = feature_cols
            .iter()
            .map(|&i| header[i].to_string())
            .collect();
        let column_names: Vec<String> = header.iter().map(String::from).collect();

        // 4. Iterate rows with validation
        let mut timestamps = Vec::new();
        let mut sites = Vec::new();
        let mut features = Vec::new();
        let mut targets = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| IoError::CsvParse {
                path: self.path.clone(),
                offset: e.position().map_or(0, |p| p.byte()),
                source: e,
            })?;

            // Check column count consistency
            if record.len() != expected_cols {
                return Err(IoError::InconsistentRowLength {
                    path: self.path.clone(),
                    row_index,
                    expected: expected_cols,
                    got: record.len(),
                });
            }

            let parse_cell = |col: usize| -> Result<f64, IoError> {
                let raw = record.get(col).unwrap_or("");
                let non_finite = || IoError::NonFiniteValue {
                    path: self.path.clone(),
                    row_index,
                    column: column_names[col].clone(),
                    raw: raw.to_string(),
                };
                let value: f64 = raw.parse().map_err(|_| non_finite())?;
                if !value.is_finite() {
                    return Err(non_finite());
                }
                Ok(value)
            };

            let mut row_features = Vec::with_capacity(feature_cols.len());
            for &col in &feature_cols {
                row_features.push(parse_cell(col)?);
            }
            let target = parse_cell(target_col)?;

            timestamps.push(record.get(timestamp_col).unwrap_or("").to_string());
            sites.push(record.get(site_col).unwrap_or("").to_string());
            features.push(row_features);
            targets.push(target);
        }

        // 5. Check for empty dataset
        if targets.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(
            n_samples = targets.len(),
            n_features = feature_names.len(),
            "observation dataset loaded"
        );

        Ok(ObservationSet::new(
            timestamps,
            sites,
            feature_names,
            features,
            targets,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn read_valid_observations() {
        let csv = "date,site,temp,ph,cyanobacteria\n\
                   2020-01,LK01,4.5,7.2,120.0\n\
                   2020-02,LK01,5.1,7.3,180.5\n\
                   2020-03,LK01,8.0,7.1,450.0\n";
        let f = write_csv(csv);
        let set = ObservationReader::new(f.path()).read().unwrap();
        assert_eq!(set.n_samples(), 3);
        assert_eq!(set.n_features(), 2);
        assert_eq!(set.feature_names(), &["temp", "ph"]);
        assert_eq!(set.timestamps()[0], "2020-01");
        assert_eq!(set.sites()[2], "LK01");
        assert!((set.features()[1][0] - 5.1).abs() < f64::EPSILON);
        assert!((set.targets()[2] - 450.0).abs() < f64::EPSILON);
    }

    #[test]
    fn named_columns_can_sit_anywhere() {
        // Target first, timestamp last; features are whatever is left over.
        let csv = "cyanobacteria,temp,site,ph,date\n\
                   120.0,4.5,LK01,7.2,2020-01\n\
                   180.5,5.1,LK01,7.3,2020-02\n";
        let f = write_csv(csv);
        let set = ObservationReader::new(f.path()).read().unwrap();
        assert_eq!(set.feature_names(), &["temp", "ph"]);
        assert_eq!(set.timestamps(), &["2020-01", "2020-02"]);
        assert!((set.targets()[0] - 120.0).abs() < f64::EPSILON);
    }

    #[test]
    fn row_order_preserved() {
        let csv = "date,site,x,cyanobacteria\n\
                   2021-03,B,1.0,3.0\n\
                   2021-01,A,2.0,1.0\n\
                   2021-02,C,3.0,2.0\n";
        let f = write_csv(csv);
        let set = ObservationReader::new(f.path()).read().unwrap();
        assert_eq!(set.timestamps(), &["2021-03", "2021-01", "2021-02"]);
        assert_eq!(set.targets(), &[3.0, 1.0, 2.0]);
    }

    #[test]
    fn custom_column_names() {
        let csv = "month,station,chla,biovolume\n\
                   2020-01,S1,3.2,99.0\n";
        let f = write_csv(csv);
        let set = ObservationReader::new(f.path())
            .with_timestamp_column("month")
            .with_site_column("station")
            .with_target_column("biovolume")
            .read()
            .unwrap();
        assert_eq!(set.feature_names(), &["chla"]);
        assert!((set.targets()[0] - 99.0).abs() < f64::EPSILON);
    }

    #[test]
    fn error_file_not_found() {
        let result = ObservationReader::new(Path::new("/nonexistent/file.csv")).read();
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn error_missing_target_column() {
        let csv = "date,site,temp\n2020-01,LK01,4.5\n";
        let f = write_csv(csv);
        let err = ObservationReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::MissingColumn { column, .. } if column == "cyanobacteria"));
    }

    #[test]
    fn error_no_feature_columns() {
        let csv = "date,site,cyanobacteria\n2020-01,LK01,120.0\n";
        let f = write_csv(csv);
        let err = ObservationReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::NoFeatureColumns { .. }));
    }

    #[test]
    fn error_empty_dataset() {
        let csv = "date,site,temp,cyanobacteria\n";
        let f = write_csv(csv);
        let err = ObservationReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::EmptyDataset { .. }));
    }

    #[test]
    fn error_inconsistent_row_length() {
        let csv = "date,site,temp,cyanobacteria\n\
                   2020-01,LK01,4.5,120.0\n\
                   2020-02,LK01,5.1\n";
        let f = write_csv(csv);
        let err = ObservationReader::new(f.path()).read().unwrap_err();
        assert!(matches!(
            err,
            IoError::InconsistentRowLength { row_index: 1, .. }
        ));
    }

    #[test]
    fn error_non_finite_feature() {
        let csv = "date,site,temp,cyanobacteria\n2020-01,LK01,NaN,120.0\n";
        let f = write_csv(csv);
        let err = ObservationReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::NonFiniteValue { column, .. } if column == "temp"));
    }

    #[test]
    fn error_non_finite_target() {
        let csv = "date,site,temp,cyanobacteria\n2020-01,LK01,4.5,Inf\n";
        let f = write_csv(csv);
        let err = ObservationReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::NonFiniteValue { column, .. } if column == "cyanobacteria"));
    }

    #[test]
    fn error_unparseable_value() {
        let csv = "date,site,temp,cyanobacteria\n2020-01,LK01,abc,120.0\n";
        let f = write_csv(csv);
        let err = ObservationReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::NonFiniteValue { .. }));
    }
}
