//! CSV dataset reading and writing
//!
//! Reads the processed match dataset produced by the scraper and writes the
//! rolling-feature augmented table back out.

use crate::data::MatchTable;
use crate::features::AugmentedTable;
use crate::{FormError, MatchRecord, Result, TeamId, Venue};
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use csv::{ReaderBuilder, StringRecord, Trim, Writer};
use regex::Regex;
use std::collections::BTreeMap;
use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::OnceLock;

/// Fixed (non-statistic) columns written ahead of the statistics
const FIXED_COLUMNS: [&str; 8] = [
    "date",
    "home_team",
    "away_team",
    "home_team_code",
    "away_team_code",
    "hour",
    "day_code",
    "result",
];

/// Load the match dataset from a CSV file
pub fn load_matches<P: AsRef<Path>>(path: P) -> Result<MatchTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        FormError::InvalidInput(format!("Failed to open dataset {}: {}", path.display(), e))
    })?;
    let table = read_matches(file)?;
    log::info!(
        "Loaded {} matches with {} statistic columns from {}",
        table.len(),
        table.stat_columns().len(),
        path.display()
    );
    Ok(table)
}

/// Read the match dataset from any CSV source
pub fn read_matches<R: io::Read>(reader: R) -> Result<MatchTable> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let layout = Layout::from_headers(&headers)?;
    let mut rows = Vec::new();

    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // Header is line 1
        let line = i + 2;
        rows.push(layout.parse_row(&record, line)?);
    }

    let stat_columns = layout.stats.iter().map(|(name, _)| name.clone()).collect();
    MatchTable::with_columns(rows, stat_columns)
}

/// Column positions resolved from the header row
struct Layout {
    date: usize,
    home_code: usize,
    away_code: usize,
    home_name: Option<usize>,
    away_name: Option<usize>,
    hour: Option<usize>,
    day_code: Option<usize>,
    result: Option<usize>,
    stats: Vec<(String, usize)>,
}

impl Layout {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |names: &[&str]| {
            headers
                .iter()
                .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
        };
        let require = |names: &[&str]| {
            find(names).ok_or_else(|| {
                FormError::InvalidInput(format!("dataset is missing required column {}", names[0]))
            })
        };

        let stats = headers
            .iter()
            .enumerate()
            .filter(|(_, h)| {
                Venue::ALL
                    .iter()
                    .any(|v| h.ends_with(v.column_suffix()) && h.len() > v.column_suffix().len())
            })
            .map(|(i, h)| (h.to_string(), i))
            .collect();

        Ok(Layout {
            date: require(&["date"])?,
            home_code: require(&["home_team_code", "home_team_id"])?,
            away_code: require(&["away_team_code", "away_team_id"])?,
            home_name: find(&["home_team"]),
            away_name: find(&["away_team"]),
            hour: find(&["hour"]),
            day_code: find(&["day_code"]),
            result: find(&["result"]),
            stats,
        })
    }

    fn parse_row(&self, record: &StringRecord, line: usize) -> Result<MatchRecord> {
        let cell = |idx: usize| record.get(idx).unwrap_or("");
        let optional = |idx: Option<usize>| idx.map(cell).filter(|c| !is_absent(c));

        let (date, kickoff_hour) = parse_date(cell(self.date)).ok_or_else(|| {
            FormError::InvalidInput(format!(
                "line {}: missing or unparseable date '{}'",
                line,
                cell(self.date)
            ))
        })?;

        let home_team = TeamId(parse_integer(cell(self.home_code), "home_team_code", line)?);
        let away_team = TeamId(parse_integer(cell(self.away_code), "away_team_code", line)?);

        let hour = match optional(self.hour) {
            Some(c) => Some(parse_small(c, "hour", line)?),
            None => kickoff_hour,
        };
        let day_code = optional(self.day_code)
            .map(|c| parse_small(c, "day_code", line))
            .transpose()?;
        let result = optional(self.result)
            .map(|c| parse_integer(c, "result", line))
            .transpose()?;

        let mut stats = BTreeMap::new();
        for (name, idx) in &self.stats {
            let value = parse_stat_cell(cell(*idx)).map_err(|e| {
                FormError::InvalidInput(format!("line {}, column {}: {}", line, name, e))
            })?;
            stats.insert(name.clone(), value);
        }

        Ok(MatchRecord {
            date,
            home_team,
            away_team,
            home_name: optional(self.home_name).map(str::to_string),
            away_name: optional(self.away_name).map(str::to_string),
            hour,
            day_code,
            result,
            stats,
        })
    }
}

fn is_absent(cell: &str) -> bool {
    let cell = cell.trim();
    cell.is_empty() || cell == "-" || cell.eq_ignore_ascii_case("nan") || cell.eq_ignore_ascii_case("none")
}

/// Parse a date cell, keeping the kickoff hour when a time is present
fn parse_date(cell: &str) -> Option<(NaiveDate, Option<u8>)> {
    let cell = cell.trim();
    if let Ok(date) = NaiveDate::parse_from_str(cell, "%Y-%m-%d") {
        return Some((date, None));
    }
    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cell, fmt).ok())
        .map(|dt| (dt.date(), Some(dt.hour() as u8)))
}

/// Integer cell; pandas often writes integral columns as `3.0`
fn parse_integer(cell: &str, column: &str, line: usize) -> Result<i64> {
    let cell = cell.trim();
    let invalid = || {
        FormError::InvalidInput(format!(
            "line {}: invalid {} value '{}'",
            line, column, cell
        ))
    };

    if let Ok(v) = cell.parse::<i64>() {
        return Ok(v);
    }
    let v: f64 = cell.parse().map_err(|_| invalid())?;
    if v.fract() == 0.0 && v.is_finite() {
        Ok(v as i64)
    } else {
        Err(invalid())
    }
}

fn parse_small(cell: &str, column: &str, line: usize) -> Result<u8> {
    let v = parse_integer(cell, column, line)?;
    u8::try_from(v).map_err(|_| {
        FormError::InvalidInput(format!("line {}: {} out of range: {}", line, column, v))
    })
}

fn percent_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(-?\d+(?:\.\d+)?)\s*%(?:\s*\(\s*\d+\s*/\s*\d+\s*\))?$")
            .expect("percentage cell pattern is valid")
    })
}

/// Parse a statistic cell.
///
/// Accepts plain numbers (`12`, `0.75`, `1e-05`), percentages (`58%` -> 0.58)
/// and the scraped compound form `85% (400/470)` (-> 0.85). Empty, `-` and
/// `nan` cells are absent values. Anything else is rejected.
pub fn parse_stat_cell(cell: &str) -> Result<Option<f64>> {
    let cell = cell.trim();
    if is_absent(cell) {
        return Ok(None);
    }
    let invalid = || FormError::InvalidInput(format!("not a statistic value: '{}'", cell));

    if let Ok(value) = cell.parse::<f64>() {
        return if value.is_finite() {
            Ok(Some(value))
        } else {
            Err(invalid())
        };
    }

    let caps = percent_pattern().captures(cell).ok_or_else(invalid)?;
    let value: f64 = caps[1].parse().map_err(|_| invalid())?;
    Ok(Some(value / 100.0))
}

/// Write the augmented table to a CSV file
pub fn save_augmented<P: AsRef<Path>>(path: P, table: &AugmentedTable) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    write_augmented(file, table)?;
    log::info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Write the augmented table: original columns, then one column per feature
pub fn write_augmented<W: io::Write>(writer: W, table: &AugmentedTable) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);

    let header: Vec<&str> = FIXED_COLUMNS
        .iter()
        .copied()
        .chain(table.stat_columns().iter().map(String::as_str))
        .chain(table.feature_columns().iter().map(String::as_str))
        .collect();
    wtr.write_record(&header)?;

    let format_value = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_default();

    for row in table.rows() {
        let m = &row.record;
        let mut fields = vec![
            m.date.format("%Y-%m-%d").to_string(),
            m.home_name.clone().unwrap_or_default(),
            m.away_name.clone().unwrap_or_default(),
            m.home_team.0.to_string(),
            m.away_team.0.to_string(),
            m.hour.map(|h| h.to_string()).unwrap_or_default(),
            m.day_code.map(|d| d.to_string()).unwrap_or_default(),
            m.result.map(|r| r.to_string()).unwrap_or_default(),
        ];
        fields.extend(table.stat_columns().iter().map(|c| format_value(m.stat(c))));
        fields.extend(
            table
                .feature_columns()
                .iter()
                .map(|c| format_value(row.features.value(c))),
        );
        wtr.write_record(&fields)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::compute_rolling_features;

    const SAMPLE: &str = "\
date,home_team,away_team,home_team_code,away_team_code,hour,day_code,result,Total_shots_home,Total_shots_away,Ball_possession_home
2023-08-19,AC Milan,Bologna,0,1,20,5,1,14,8,58%
2023-08-26 18:30:00,Juventus,AC Milan,2,0,,5,-1,10,,45%
2023-09-02,AC Milan,Roma,0.0,3,20.0,5,0,9,11,-
";

    #[test]
    fn test_read_matches() {
        let table = read_matches(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.stat_columns(),
            &["Total_shots_home", "Total_shots_away", "Ball_possession_home"]
        );

        let first = &table.rows()[0];
        assert_eq!(first.home_name.as_deref(), Some("AC Milan"));
        assert_eq!(first.home_team, TeamId(0));
        assert_eq!(first.hour, Some(20));
        assert_eq!(first.result, Some(1));
        assert_eq!(first.stat("Ball_possession_home"), Some(0.58));

        let second = &table.rows()[1];
        assert_eq!(second.date, NaiveDate::from_ymd_opt(2023, 8, 26).unwrap());
        // Hour taken from the timestamp when the column is empty
        assert_eq!(second.hour, Some(18));
        assert_eq!(second.stat("Total_shots_away"), None);

        let third = &table.rows()[2];
        assert_eq!(third.home_team, TeamId(0));
        assert_eq!(third.stat("Ball_possession_home"), None);
    }

    #[test]
    fn test_bad_date_is_invalid_input() {
        let csv = "date,home_team_code,away_team_code,Total_shots_home\n,0,1,12\n";
        match read_matches(csv.as_bytes()) {
            Err(FormError::InvalidInput(msg)) => assert!(msg.contains("line 2")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }

        let csv = "date,home_team_code,away_team_code,Total_shots_home\n19/08/2023,0,1,12\n";
        assert!(matches!(
            read_matches(csv.as_bytes()),
            Err(FormError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "date,home_team_code,Total_shots_home\n2023-08-19,0,12\n";
        assert!(matches!(
            read_matches(csv.as_bytes()),
            Err(FormError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_parse_stat_cell() {
        assert_eq!(parse_stat_cell("12").unwrap(), Some(12.0));
        assert_eq!(parse_stat_cell("0.75").unwrap(), Some(0.75));
        assert_eq!(parse_stat_cell("58%").unwrap(), Some(0.58));
        assert_eq!(parse_stat_cell("85% (400/470)").unwrap(), Some(0.85));
        assert_eq!(parse_stat_cell("").unwrap(), None);
        assert_eq!(parse_stat_cell("NaN").unwrap(), None);
        assert!(parse_stat_cell("lots").is_err());
    }

    #[test]
    fn test_parse_stat_cell_rejects_partial_numbers() {
        assert_eq!(parse_stat_cell("1e-05").unwrap(), Some(1e-5));
        assert_eq!(parse_stat_cell("1.5e-3").unwrap(), Some(0.0015));
        assert_eq!(parse_stat_cell("1e5").unwrap(), Some(100000.0));
        assert!(parse_stat_cell("12abc").is_err());
        assert!(parse_stat_cell("3.5.2").is_err());
        assert!(parse_stat_cell("58% of play").is_err());
        assert!(parse_stat_cell("inf").is_err());
    }

    #[test]
    fn test_write_augmented() {
        let table = read_matches(SAMPLE.as_bytes()).unwrap();
        let augmented = compute_rolling_features(
            &table,
            &["Total_shots_home".to_string()],
            &["Total_shots_away".to_string()],
            2,
        )
        .unwrap();

        let mut out = Vec::new();
        write_augmented(&mut out, &augmented).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("home_Total_shots_home_rolling_2,away_Total_shots_away_rolling_2"));
        // Milan's second home match sees the first one's 14 shots
        assert!(lines[3].starts_with("2023-09-02,AC Milan,Roma,0,3,20,5,0,9,11,,14,"));
    }
}
