use std::{fs::File, io, path::PathBuf, str::FromStr};

use splitsettle_application::{ExpenseRecord, RecordPayer, RecordSource, RecordSourceError};
use splitsettle_domain::{CASH_POOL_SENTINEL, Money, Payer, RecordError};

pub const PAYER_COLUMN: &str = "Payer";
pub const AMOUNT_COLUMN: &str = "Amount";
pub const INVOLVED_COLUMN: &str = "Involved";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvOptions {
    /// Payer value meaning the whole group paid (matched case-insensitively).
    pub cash_sentinel: String,
    /// Splits the `Involved` cell; names are trimmed afterwards.
    pub involved_separator: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            cash_sentinel: CASH_POOL_SENTINEL.to_owned(),
            involved_separator: ",".to_owned(),
        }
    }
}

/// Reads `Payer,Amount,Involved` rows from a CSV file.
pub struct CsvRecordSource {
    path: PathBuf,
    options: CsvOptions,
}

impl CsvRecordSource {
    pub fn new(path: impl Into<PathBuf>, options: CsvOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }
}

impl RecordSource for CsvRecordSource {
    fn read_records(&self) -> Result<Vec<ExpenseRecord>, RecordSourceError> {
        let file = File::open(&self.path).map_err(|err| RecordSourceError::Unreadable {
            path: self.path.display().to_string(),
            detail: err.to_string(),
        })?;
        let records = parse_records(file, &self.options)?;
        tracing::debug!(
            path = %self.path.display(),
            record_count = records.len(),
            "CSV records parsed"
        );
        Ok(records)
    }
}

struct Columns {
    payer: usize,
    amount: usize,
    involved: usize,
}

pub fn parse_records<R: io::Read>(
    reader: R,
    options: &CsvOptions,
) -> Result<Vec<ExpenseRecord>, RecordSourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().map_err(|err| csv_row_error(1, &err))?;
    let column = |name: &'static str| {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or(RecordSourceError::MissingColumn(name))
    };
    let columns = Columns {
        payer: column(PAYER_COLUMN)?,
        amount: column(AMOUNT_COLUMN)?,
        involved: column(INVOLVED_COLUMN)?,
    };

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|err| csv_row_error(records.len() + 2, &err))?;
        let line = row
            .position()
            .map_or(records.len() + 2, |position| position.line() as usize);
        records.push(parse_row(&row, line, &columns, options)?);
    }

    Ok(records)
}

fn parse_row(
    row: &csv::StringRecord,
    line: usize,
    columns: &Columns,
    options: &CsvOptions,
) -> Result<ExpenseRecord, RecordSourceError> {
    let payer_field = row.get(columns.payer).unwrap_or_default();
    if payer_field.is_empty() {
        return Err(invalid_row(line, format!("missing {PAYER_COLUMN}")));
    }
    let payer = match Payer::from_field(payer_field, &options.cash_sentinel) {
        Payer::CashPool => RecordPayer::CashPool,
        Payer::Person(name) => RecordPayer::Person(name.to_owned()),
    };

    let amount_field = row.get(columns.amount).unwrap_or_default();
    if amount_field.is_empty() {
        return Err(invalid_row(line, format!("missing {AMOUNT_COLUMN}")));
    }
    let amount = Money::from_str(amount_field)
        .map_err(|err| invalid_row(line, format!("invalid amount '{amount_field}': {err}")))?;

    let involved_field = row.get(columns.involved).unwrap_or_default();
    let names: Vec<String> = involved_field
        .split(options.involved_separator.as_str())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect();
    if let Some(name) = names
        .iter()
        .find(|name| name.eq_ignore_ascii_case(&options.cash_sentinel))
    {
        return Err(RecordSourceError::MalformedRecord {
            line,
            source: RecordError::CashPoolInvolved(name.clone()),
        });
    }
    let involved = if names.is_empty() { None } else { Some(names) };

    Ok(ExpenseRecord {
        line,
        payer,
        amount,
        involved,
    })
}

fn invalid_row(line: usize, detail: String) -> RecordSourceError {
    RecordSourceError::InvalidRow { line, detail }
}

fn csv_row_error(fallback_line: usize, err: &csv::Error) -> RecordSourceError {
    let line = err
        .position()
        .map_or(fallback_line, |position| position.line() as usize);
    invalid_row(line, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write as _;

    fn parse(content: &str) -> Result<Vec<ExpenseRecord>, RecordSourceError> {
        parse_records(content.as_bytes(), &CsvOptions::default())
    }

    fn person(name: &str) -> RecordPayer {
        RecordPayer::Person(name.to_owned())
    }

    fn names(list: &[&str]) -> Option<Vec<String>> {
        Some(list.iter().map(|name| (*name).to_owned()).collect())
    }

    #[test]
    fn parses_rows_with_line_numbers() {
        let records = parse(
            "Payer,Amount,Involved\n\
             Ana,90,\"Ana, Ben, Cy\"\n\
             Cash,30.50,\n\
             Ben,12.25,Cy\n",
        )
        .expect("valid csv");

        assert_eq!(
            records,
            vec![
                ExpenseRecord {
                    line: 2,
                    payer: person("Ana"),
                    amount: Money::from_i64(90),
                    involved: names(&["Ana", "Ben", "Cy"]),
                },
                ExpenseRecord {
                    line: 3,
                    payer: RecordPayer::CashPool,
                    amount: Money::new(3050, 2),
                    involved: None,
                },
                ExpenseRecord {
                    line: 4,
                    payer: person("Ben"),
                    amount: Money::new(1225, 2),
                    involved: names(&["Cy"]),
                },
            ]
        );
    }

    #[test]
    fn column_order_and_extra_columns_do_not_matter() {
        let records = parse(
            "Note,Involved,Amount,Payer\n\
             dinner,\"Ben,Cy\",40,Ana\n",
        )
        .expect("valid csv");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payer, person("Ana"));
        assert_eq!(records[0].involved, names(&["Ben", "Cy"]));
    }

    #[test]
    fn short_rows_mean_everyone_is_involved() {
        let records = parse("Payer,Amount,Involved\nAna,10\n").expect("valid csv");

        assert_eq!(records[0].involved, None);
    }

    #[rstest]
    #[case::payer("Amount,Involved\n10,Ana\n", "Payer")]
    #[case::amount("Payer,Involved\nAna,Ana\n", "Amount")]
    #[case::involved("Payer,Amount\nAna,10\n", "Involved")]
    fn missing_column_is_reported(#[case] content: &str, #[case] column: &str) {
        let result = parse(content);

        assert!(matches!(
            result,
            Err(RecordSourceError::MissingColumn(name)) if name == column
        ));
    }

    #[rstest]
    #[case::missing_payer("Payer,Amount,Involved\nAna,10,\n,5,Ana\n", 3)]
    #[case::missing_amount("Payer,Amount,Involved\nAna,,Ben\n", 2)]
    #[case::bad_amount("Payer,Amount,Involved\nAna,ten,Ben\n", 2)]
    fn invalid_rows_name_their_line(#[case] content: &str, #[case] expected_line: usize) {
        match parse(content) {
            Err(RecordSourceError::InvalidRow { line, .. }) => assert_eq!(line, expected_line),
            other => panic!("expected invalid row, got {other:?}"),
        }
    }

    #[test]
    fn cash_pool_cannot_benefit() {
        let result = parse("Payer,Amount,Involved\nAna,10,\"Ben, cash\"\n");

        match result {
            Err(RecordSourceError::MalformedRecord { line, source }) => {
                assert_eq!(line, 2);
                assert_eq!(source, RecordError::CashPoolInvolved("cash".to_owned()));
            }
            other => panic!("expected malformed record, got {other:?}"),
        }
    }

    #[test]
    fn custom_sentinel_and_separator() {
        let options = CsvOptions {
            cash_sentinel: "Kitty".to_owned(),
            involved_separator: ";".to_owned(),
        };

        let records = parse_records(
            "Payer,Amount,Involved\nkitty,10,Ana; Ben\nCash,5,Ana\n".as_bytes(),
            &options,
        )
        .expect("valid csv");

        assert_eq!(records[0].payer, RecordPayer::CashPool);
        assert_eq!(records[0].involved, names(&["Ana", "Ben"]));
        assert_eq!(records[1].payer, person("Cash"));
    }

    #[test]
    fn reads_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "Payer,Amount,Involved").expect("write header");
        writeln!(file, "Ana,100,\"Ana, Ben\"").expect("write row");

        let source = CsvRecordSource::new(file.path(), CsvOptions::default());
        let records = source.read_records().expect("readable file");

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, Money::from_i64(100));
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("absent.csv");

        let result = CsvRecordSource::new(&path, CsvOptions::default()).read_records();

        match result {
            Err(RecordSourceError::Unreadable { path: reported, .. }) => {
                assert_eq!(reported, path.display().to_string());
            }
            other => panic!("expected unreadable error, got {other:?}"),
        }
    }
}
