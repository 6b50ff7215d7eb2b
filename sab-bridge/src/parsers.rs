//! Measurement file parsers
//!
//! Three best-effort formats are recognized:
//! - CSV with a header row (comma-separated, one row per line)
//! - Key/value text (`key: value` or `key = value` per line)
//! - Generic numeric text (whitespace- or comma-separated number pairs)
//!
//! Parsing yields [`ParsedContent`], which [`to_measurement_data`] converts
//! into a typed [`MeasurementData`] for the requested kind. Nothing here
//! touches the filesystem.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::dsp;
use crate::generator::phase_points;
use crate::measurement::{
    ImpulsePoint, MeasurementData, MeasurementKind, SpectrumPoint, TransferPoint,
};

/// Value used for a missing phase column
const DEFAULT_PHASE: f64 = 0.0;
/// Value used for a missing coherence column
const DEFAULT_COHERENCE: f64 = 1.0;

/// Conversion failure for one candidate file
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    /// Not UTF-8, or no rows/pairs recognized
    #[error("no parsable content")]
    NoContent,

    /// Content parsed but no usable axis column was found
    #[error("no {0} axis found")]
    MissingAxis(&'static str),

    /// File content does not hold the requested kind's axes
    #[error("file holds {found} data, not {requested}")]
    WrongShape {
        requested: MeasurementKind,
        found: &'static str,
    },

    /// Every row was dropped during normalization
    #[error("no valid {0} points")]
    Empty(MeasurementKind),
}

/// File format, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Csv,
    Text,
    Generic,
}

impl FileFormat {
    /// `.csv` is CSV, `.txt` is key/value text, anything else is generic
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => FileFormat::Csv,
            Some("txt") => FileFormat::Text,
            _ => FileFormat::Generic,
        }
    }
}

/// Format-level parse result, before any kind-specific interpretation
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedContent {
    /// Header names and numeric rows; unparsable cells are `None`
    Table {
        headers: Vec<String>,
        rows: Vec<Vec<Option<f64>>>,
    },
    /// Ordered key/value pairs
    KeyValues(Vec<(String, String)>),
    /// Ordered numeric pairs
    Points(Vec<(f64, f64)>),
}

/// Parse `bytes` according to `format`
pub fn parse(format: FileFormat, bytes: &[u8]) -> Option<ParsedContent> {
    let text = std::str::from_utf8(bytes).ok()?;
    match format {
        FileFormat::Csv => parse_csv(text),
        FileFormat::Text => parse_key_values(text),
        FileFormat::Generic => parse_generic(text),
    }
}

/// First line is the header row; subsequent lines are data rows
pub fn parse_csv(text: &str) -> Option<ParsedContent> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let headers: Vec<String> = lines
        .next()?
        .split(',')
        .map(|h| h.trim().trim_matches('"').to_string())
        .collect();

    let rows: Vec<Vec<Option<f64>>> = lines
        .map(|line| line.split(',').map(|cell| parse_number(cell)).collect())
        .collect();

    if rows.is_empty() {
        return None;
    }
    Some(ParsedContent::Table { headers, rows })
}

/// `key: value` or `key = value` lines; comments and other lines are skipped
pub fn parse_key_values(text: &str) -> Option<ParsedContent> {
    let pairs: Vec<(String, String)> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once(':').or_else(|| line.split_once('='))?;
            let key = key.trim();
            let value = value.trim();
            (!key.is_empty() && !value.is_empty()).then(|| (key.to_string(), value.to_string()))
        })
        .collect();

    (!pairs.is_empty()).then_some(ParsedContent::KeyValues(pairs))
}

/// First two numbers of each line that has at least two
pub fn parse_generic(text: &str) -> Option<ParsedContent> {
    let points: Vec<(f64, f64)> = text
        .lines()
        .filter_map(|line| {
            let mut numbers = line
                .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
                .filter(|token| !token.is_empty())
                .filter_map(parse_number);
            Some((numbers.next()?, numbers.next()?))
        })
        .collect();

    (!points.is_empty()).then_some(ParsedContent::Points(points))
}

fn parse_number(cell: &str) -> Option<f64> {
    let value: f64 = cell.trim().trim_matches('"').parse().ok()?;
    value.is_finite().then_some(value)
}

/// Leading numeric prefix of a string, e.g. `"-3.5 dB"` gives `-3.5`
fn leading_number(text: &str) -> Option<f64> {
    let text = text.trim();
    let end = text
        .char_indices()
        .take_while(|(i, c)| {
            c.is_ascii_digit() || *c == '.' || ((*c == '-' || *c == '+') && *i == 0)
        })
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    parse_number(&text[..end])
}

/// Key that is a frequency, e.g. `"1000"` or `"1000 Hz"`
fn frequency_key(key: &str) -> Option<f64> {
    let trimmed = key.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let numeric = lowered.strip_suffix("hz").unwrap_or(&lowered).trim();
    parse_number(numeric)
}

/// Column roles recognized in a CSV header
#[derive(Debug, Default)]
struct Columns {
    frequency: Option<usize>,
    level: Option<usize>,
    magnitude: Option<usize>,
    phase: Option<usize>,
    coherence: Option<usize>,
    time: Option<usize>,
    amplitude: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &[String]) -> Self {
        let find = |needles: &[&str]| {
            headers.iter().position(|h| {
                let h = h.to_ascii_lowercase();
                needles.iter().any(|n| h.contains(n))
            })
        };
        let level = find(&["level", "spl", "db"]);
        Self {
            frequency: find(&["freq", "hz"]),
            level,
            magnitude: find(&["mag"]).or(level),
            phase: find(&["phase"]),
            coherence: find(&["coh"]),
            time: find(&["time"]),
            amplitude: find(&["amp", "value"]),
        }
    }

    fn any_recognized(&self) -> bool {
        self.frequency.is_some()
            || self.level.is_some()
            || self.magnitude.is_some()
            || self.phase.is_some()
            || self.coherence.is_some()
            || self.time.is_some()
            || self.amplitude.is_some()
    }
}

/// Frequency-indexed row common to the three frequency kinds
#[derive(Debug, Clone, Copy)]
struct FrequencyRow {
    frequency: f64,
    value: f64,
    phase: f64,
    coherence: f64,
}

/// Convert parsed content into data of the requested kind
///
/// Rows are sorted along their axis. Non-positive frequencies and negative
/// times are dropped, duplicate axis values keep their first occurrence,
/// missing phase defaults to 0 and missing coherence to 1.
pub fn to_measurement_data(
    kind: MeasurementKind,
    content: &ParsedContent,
) -> Result<MeasurementData, ParseError> {
    if kind == MeasurementKind::ImpulseResponse {
        let samples = normalize_axis(time_rows(content)?, |&(t, _)| t, |t| t >= 0.0);
        if samples.is_empty() {
            return Err(ParseError::Empty(kind));
        }
        return Ok(MeasurementData::ImpulseResponse(
            samples
                .into_iter()
                .map(|(time, amplitude)| ImpulsePoint { time, amplitude })
                .collect(),
        ));
    }

    let rows = normalize_axis(frequency_rows(kind, content)?, |r| r.frequency, |f| f > 0.0);
    if rows.is_empty() {
        return Err(ParseError::Empty(kind));
    }

    Ok(match kind {
        MeasurementKind::Spectrum => MeasurementData::Spectrum(
            rows.into_iter()
                .map(|r| SpectrumPoint {
                    frequency: r.frequency,
                    level: r.value,
                    phase: r.phase,
                    coherence: r.coherence,
                })
                .collect(),
        ),
        MeasurementKind::TransferFunction => MeasurementData::TransferFunction(
            rows.into_iter()
                .map(|r| TransferPoint {
                    frequency: r.frequency,
                    magnitude: r.value,
                    phase: r.phase,
                    coherence: r.coherence,
                })
                .collect(),
        ),
        MeasurementKind::Phase => {
            let frequencies: Vec<f64> = rows.iter().map(|r| r.frequency).collect();
            let raw: Vec<f64> = rows.iter().map(|r| r.value).collect();
            MeasurementData::Phase(phase_points(&frequencies, &raw))
        }
        MeasurementKind::ImpulseResponse => unreachable!("handled above"),
    })
}

/// Sort by axis, keep rows inside the domain, drop repeated axis values
fn normalize_axis<T>(
    mut rows: Vec<T>,
    axis: impl Fn(&T) -> f64,
    in_domain: impl Fn(f64) -> bool,
) -> Vec<T> {
    rows.retain(|r| {
        let x = axis(r);
        x.is_finite() && in_domain(x)
    });
    // Stable sort keeps the first occurrence of each axis value in front
    rows.sort_by(|a, b| axis(a).total_cmp(&axis(b)));
    rows.dedup_by(|later, earlier| axis(later) == axis(earlier));
    rows
}

fn frequency_rows(
    kind: MeasurementKind,
    content: &ParsedContent,
) -> Result<Vec<FrequencyRow>, ParseError> {
    let plain = |(frequency, value): (f64, f64)| FrequencyRow {
        frequency,
        value,
        phase: DEFAULT_PHASE,
        coherence: DEFAULT_COHERENCE,
    };

    match content {
        ParsedContent::Table { headers, rows } => {
            let columns = Columns::from_headers(headers);
            if columns.frequency.is_none() && columns.time.is_some() {
                return Err(ParseError::WrongShape {
                    requested: kind,
                    found: "time-indexed",
                });
            }

            let (x_col, y_col) = if columns.any_recognized() {
                let value_col = match kind {
                    MeasurementKind::Spectrum => columns.level,
                    MeasurementKind::TransferFunction => columns.magnitude,
                    _ => columns.phase,
                };
                (
                    columns.frequency.ok_or(ParseError::MissingAxis("frequency"))?,
                    value_col.ok_or(ParseError::MissingAxis("value"))?,
                )
            } else {
                (0, 1)
            };

            Ok(rows
                .iter()
                .filter_map(|row| {
                    let cell = |col: Option<usize>| col.and_then(|c| row.get(c).copied().flatten());
                    Some(FrequencyRow {
                        frequency: cell(Some(x_col))?,
                        value: cell(Some(y_col))?,
                        phase: cell(columns.phase).unwrap_or(DEFAULT_PHASE),
                        coherence: cell(columns.coherence).unwrap_or(DEFAULT_COHERENCE),
                    })
                })
                .collect())
        }
        ParsedContent::KeyValues(pairs) => Ok(pairs
            .iter()
            .filter_map(|(key, value)| Some((frequency_key(key)?, leading_number(value)?)))
            .map(plain)
            .collect()),
        // Generic scans hold level pairs, never phase
        ParsedContent::Points(_) if kind == MeasurementKind::Phase => Err(ParseError::WrongShape {
            requested: kind,
            found: "frequency/level",
        }),
        ParsedContent::Points(points) => Ok(points.iter().copied().map(plain).collect()),
    }
}

fn time_rows(content: &ParsedContent) -> Result<Vec<(f64, f64)>, ParseError> {
    match content {
        ParsedContent::Table { headers, rows } => {
            let columns = Columns::from_headers(headers);
            if columns.frequency.is_some() {
                return Err(ParseError::WrongShape {
                    requested: MeasurementKind::ImpulseResponse,
                    found: "frequency-indexed",
                });
            }

            let (x_col, y_col) = if columns.any_recognized() {
                (
                    columns.time.ok_or(ParseError::MissingAxis("time"))?,
                    columns.amplitude.ok_or(ParseError::MissingAxis("amplitude"))?,
                )
            } else {
                (0, 1)
            };

            Ok(rows
                .iter()
                .filter_map(|row| {
                    let time = row.get(x_col).copied().flatten()?;
                    let amplitude = row.get(y_col).copied().flatten()?;
                    Some((time, amplitude))
                })
                .collect())
        }
        ParsedContent::KeyValues(pairs) => Ok(pairs
            .iter()
            .filter_map(|(key, value)| Some((parse_number(key)?, leading_number(value)?)))
            .collect()),
        ParsedContent::Points(points) => Ok(points.clone()),
    }
}

/// One-line description for log messages
pub fn describe(content: &ParsedContent) -> String {
    match content {
        ParsedContent::Table { headers, rows } => {
            format!("table with {} columns, {} rows", headers.len(), rows.len())
        }
        ParsedContent::KeyValues(pairs) => format!("{} key/value pairs", pairs.len()),
        ParsedContent::Points(points) => {
            let span = dsp::min_max(points.iter().map(|p| p.0));
            match span {
                Some((lo, hi)) => format!("{} points spanning {}..{}", points.len(), lo, hi),
                None => "no points".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv(text: &str) -> ParsedContent {
        parse(FileFormat::Csv, text.as_bytes()).expect("csv parses")
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(FileFormat::from_path(Path::new("a.CSV")), FileFormat::Csv);
        assert_eq!(FileFormat::from_path(Path::new("a.txt")), FileFormat::Text);
        assert_eq!(FileFormat::from_path(Path::new("a.smaart")), FileFormat::Generic);
        assert_eq!(FileFormat::from_path(Path::new("noext")), FileFormat::Generic);
    }

    #[test]
    fn test_invalid_utf8_is_no_content() {
        assert!(parse(FileFormat::Csv, &[0xff, 0xfe, 0x00]).is_none());
    }

    #[test]
    fn test_header_only_csv_is_no_content() {
        assert!(parse(FileFormat::Csv, b"Frequency,Level\n").is_none());
    }

    #[test]
    fn test_csv_spectrum_with_headers() {
        let content = csv("Frequency (Hz),Level (dB),Phase,Coherence\n100,-3,10,0.8\n50,-1,5,0.9\n");
        let data = to_measurement_data(MeasurementKind::Spectrum, &content).unwrap();
        let MeasurementData::Spectrum(points) = data else {
            panic!("expected spectrum");
        };
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].frequency, 50.0);
        assert_eq!(points[0].level, -1.0);
        assert_eq!(points[1].phase, 10.0);
        assert_eq!(points[1].coherence, 0.8);
    }

    #[test]
    fn test_csv_defaults_phase_and_coherence() {
        let content = csv("freq,spl\n100,80\n");
        let MeasurementData::Spectrum(points) =
            to_measurement_data(MeasurementKind::Spectrum, &content).unwrap()
        else {
            panic!("expected spectrum");
        };
        assert_eq!(points[0].phase, 0.0);
        assert_eq!(points[0].coherence, 1.0);
    }

    #[test]
    fn test_transfer_falls_back_to_level_column() {
        let content = csv("Freq,Level\n100,4\n200,5\n");
        let MeasurementData::TransferFunction(points) =
            to_measurement_data(MeasurementKind::TransferFunction, &content).unwrap()
        else {
            panic!("expected transfer");
        };
        assert_eq!(points[1].magnitude, 5.0);
    }

    #[test]
    fn test_unrecognized_headers_use_first_two_columns() {
        let content = csv("a,b\n100,1\n200,2\n");
        let data = to_measurement_data(MeasurementKind::Spectrum, &content).unwrap();
        assert_eq!(data.len(), 2);
    }

    #[test]
    fn test_non_positive_and_duplicate_frequencies_dropped() {
        let content = csv("freq,level\n0,1\n-5,1\n100,1\n100,9\n200,2\n");
        let MeasurementData::Spectrum(points) =
            to_measurement_data(MeasurementKind::Spectrum, &content).unwrap()
        else {
            panic!("expected spectrum");
        };
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].frequency, 100.0);
        assert_eq!(points[0].level, 1.0);
    }

    #[test]
    fn test_all_rows_invalid_is_empty_error() {
        let content = csv("freq,level\n0,1\nabc,2\n");
        assert_eq!(
            to_measurement_data(MeasurementKind::Spectrum, &content).unwrap_err(),
            ParseError::Empty(MeasurementKind::Spectrum)
        );
    }

    #[test]
    fn test_impulse_from_frequency_table_is_rejected() {
        let content = csv("freq,level\n100,1\n");
        assert!(matches!(
            to_measurement_data(MeasurementKind::ImpulseResponse, &content),
            Err(ParseError::WrongShape { .. })
        ));
    }

    #[test]
    fn test_impulse_csv() {
        let content = csv("Time,Amplitude\n0.002,0.5\n0,1\n-0.001,7\n");
        let MeasurementData::ImpulseResponse(points) =
            to_measurement_data(MeasurementKind::ImpulseResponse, &content).unwrap()
        else {
            panic!("expected impulse");
        };
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].time, 0.0);
        assert_eq!(points[0].amplitude, 1.0);
    }

    #[test]
    fn test_phase_kind_computes_unwrapped_and_delay() {
        let content = csv("freq,phase\n100,170\n200,-175\n300,-160\n");
        let MeasurementData::Phase(points) =
            to_measurement_data(MeasurementKind::Phase, &content).unwrap()
        else {
            panic!("expected phase");
        };
        assert_eq!(points.len(), 3);
        assert!((points[1].unwrapped_phase - 185.0).abs() < 1e-9);
        assert!(points[1].group_delay.is_some());
        assert!(points[0].group_delay.is_none());
    }

    #[test]
    fn test_key_value_text() {
        let text = "# export\nDevice: Mic 1\n100 Hz: -3.5 dB\n1000Hz = 0.0\n50: 2\n";
        let content = parse(FileFormat::Text, text.as_bytes()).unwrap();
        let MeasurementData::Spectrum(points) =
            to_measurement_data(MeasurementKind::Spectrum, &content).unwrap()
        else {
            panic!("expected spectrum");
        };
        let freqs: Vec<f64> = points.iter().map(|p| p.frequency).collect();
        assert_eq!(freqs, vec![50.0, 100.0, 1000.0]);
        assert_eq!(points[1].level, -3.5);
    }

    #[test]
    fn test_generic_pairs() {
        let text = "header line\n20 -1.5 extra\n40\t-2.0\n80,-2.5\n";
        let content = parse(FileFormat::Generic, text.as_bytes()).unwrap();
        assert_eq!(
            content,
            ParsedContent::Points(vec![(20.0, -1.5), (40.0, -2.0), (80.0, -2.5)])
        );
    }

    #[test]
    fn test_generic_pairs_are_not_phase() {
        let content = parse(FileFormat::Generic, b"20 -3\n100 2\n1000 0\n").unwrap();
        assert!(to_measurement_data(MeasurementKind::Spectrum, &content).is_ok());
        assert_eq!(
            to_measurement_data(MeasurementKind::Phase, &content).unwrap_err(),
            ParseError::WrongShape {
                requested: MeasurementKind::Phase,
                found: "frequency/level"
            }
        );
    }

    #[test]
    fn test_generic_without_pairs_is_no_content() {
        assert!(parse(FileFormat::Generic, b"just words\n1\n").is_none());
    }

    #[test]
    fn test_leading_number() {
        assert_eq!(leading_number("-3.5 dB"), Some(-3.5));
        assert_eq!(leading_number("+2"), Some(2.0));
        assert_eq!(leading_number("dB 3"), None);
    }
}
