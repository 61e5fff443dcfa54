use crate::batch::{FrameKind, InMemoryDataset};
use crate::error::{GxError, Result};
use flate2::read::GzDecoder;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// 확장자로 reader method 추측
///
/// 이 crate가 읽을 수 있는 형식만 추측합니다. `.gz`는 읽을 때 압축을 풉니다.
pub fn guess_reader_method(path: &str) -> Option<&'static str> {
    let lower = path.to_lowercase();
    let lower = lower.strip_suffix(".gz").unwrap_or(&lower);

    if lower.ends_with(".csv") || lower.ends_with(".tsv") {
        Some("read_csv")
    } else if lower.ends_with(".json") {
        Some("read_json")
    } else {
        None
    }
}

/// 파일을 읽어 인메모리 프레임으로 변환
///
/// # Arguments
/// * `path` - 읽을 파일
/// * `reader_method` - `read_csv` 또는 `read_json`
/// * `reader_options` - `{"sep": "\t"}` 같은 추가 옵션
/// * `kind` - 결과 프레임 종류
pub fn read_path(
    path: &Path,
    reader_method: &str,
    reader_options: Option<&Value>,
    kind: FrameKind,
) -> Result<InMemoryDataset> {
    match reader_method {
        "read_csv" => {
            let content = read_file(path)?;
            let sep = match reader_options.and_then(|o| o.get("sep")).and_then(Value::as_str) {
                Some(sep) => separator_byte(sep)?,
                None => default_separator(path),
            };
            parse_csv(&content, sep, kind)
        }
        "read_json" => {
            let content = read_file(path)?;
            parse_json_records(&content, kind)
        }
        other => Err(GxError::DataContext(format!(
            "reader_method `{}` is not supported for path batches",
            other
        ))),
    }
}

/// 파일 읽기, gzip이면 압축 해제
fn read_file(path: &Path) -> Result<String> {
    let unreadable = |e: std::io::Error| {
        GxError::DataContext(format!("Unable to read `{}`: {}", path.display(), e))
    };

    let bytes = std::fs::read(path).map_err(unreadable)?;
    if !bytes.starts_with(&GZIP_MAGIC) {
        return String::from_utf8(bytes).map_err(|e| {
            GxError::DataContext(format!("Unable to read `{}`: {}", path.display(), e))
        });
    }

    let mut content = String::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_string(&mut content)
        .map_err(unreadable)?;
    Ok(content)
}

fn default_separator(path: &Path) -> u8 {
    let is_tsv = path
        .to_str()
        .map(|p| p.to_lowercase().trim_end_matches(".gz").ends_with(".tsv"))
        .unwrap_or(false);
    if is_tsv {
        b'\t'
    } else {
        b','
    }
}

/// `sep` 옵션은 ASCII 한 글자
fn separator_byte(sep: &str) -> Result<u8> {
    match sep.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(GxError::DataContext(format!(
            "read_csv `sep` must be a single ASCII character, got `{}`",
            sep
        ))),
    }
}

fn csv_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::from(i);
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::from(f),
        _ => Value::String(raw.to_string()),
    }
}

fn parse_csv(content: &str, sep: u8, kind: FrameKind) -> Result<InMemoryDataset> {
    let malformed = |e: csv::Error| GxError::DataContext(format!("Malformed CSV: {}", e));

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(sep)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(malformed)?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(malformed)?;
        rows.push(record.iter().map(csv_value).collect());
    }

    Ok(InMemoryDataset::new(kind, columns, rows))
}

/// 레코드 배열 JSON (`[{"a": 1}, {"a": 2}]`)
fn parse_json_records(content: &str, kind: FrameKind) -> Result<InMemoryDataset> {
    let records: Vec<Map<String, Value>> = serde_json::from_str(content).map_err(|e| {
        GxError::DataContext(format!("read_json expects an array of records: {}", e))
    })?;

    let mut columns: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|c| record.get(c).cloned().unwrap_or(Value::Null))
                .collect()
        })
        .collect();

    Ok(InMemoryDataset::new(kind, columns, rows))
}
