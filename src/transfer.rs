//! Plain-text and CSV import/export of the roster.
//!
//! Import produces candidate names for [`RosterStore::add_names`]; export
//! writes [`RosterStore::list_names`] as-is.

use crate::error::{Result, RosterError};
use crate::store::RosterStore;
use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

const UTF8_BOM: &str = "\u{feff}";

/// Header written on CSV export.
const CSV_HEADER: &str = "Name";

/// Supported file formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// One name per line.
    Txt,
    /// First column of a headed CSV table.
    Csv,
}

impl Format {
    /// Pick a format from a file extension. Anything but `.csv` is text.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Format::Csv,
            _ => Format::Txt,
        }
    }
}

/// Read names, one per line. Lines are trimmed and blanks skipped.
pub fn read_txt<R: Read>(reader: R) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line?;
        let line = line.trim_start_matches(UTF8_BOM).trim();
        if !line.is_empty() {
            names.push(line.to_string());
        }
    }
    Ok(names)
}

/// Read the first column of every CSV row after the header.
pub fn read_csv<R: Read>(mut reader: R) -> Result<Vec<String>> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    let text = text.trim_start_matches(UTF8_BOM);

    let mut names = Vec::new();
    for (row, record) in parse_csv(text)?.into_iter().enumerate() {
        if row == 0 {
            continue;
        }
        if let Some(first) = record.into_iter().next() {
            let first = first.trim();
            if !first.is_empty() {
                names.push(first.to_string());
            }
        }
    }
    Ok(names)
}

/// Write names joined by newlines.
pub fn write_txt<W: Write>(mut writer: W, names: &[String]) -> Result<()> {
    writer.write_all(names.join("\n").as_bytes())?;
    writer.flush()?;
    Ok(())
}

/// Write names as a one-column CSV with a BOM and a `Name` header.
pub fn write_csv<W: Write>(mut writer: W, names: &[String]) -> Result<()> {
    writer.write_all(UTF8_BOM.as_bytes())?;
    writeln!(writer, "{CSV_HEADER}")?;
    for name in names {
        writeln!(writer, "{}", quote_csv(name))?;
    }
    writer.flush()?;
    Ok(())
}

/// Import a file into the store. Returns how many names were added.
pub fn import_file(store: &RosterStore, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let file = fs::File::open(path)?;

    let candidates = match Format::from_path(path) {
        Format::Txt => read_txt(file)?,
        Format::Csv => read_csv(file)?,
    };

    let added = store.add_names(&candidates);
    tracing::info!(
        path = %path.display(),
        candidates = candidates.len(),
        added,
        "Imported names"
    );
    Ok(added)
}

/// Export the roster to a file. Returns how many names were written.
pub fn export_file(store: &RosterStore, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let names = store.list_names();
    if names.is_empty() {
        return Err(RosterError::EmptyRoster);
    }

    let file = fs::File::create(path)?;
    match Format::from_path(path) {
        Format::Txt => write_txt(file, &names)?,
        Format::Csv => write_csv(file, &names)?,
    }

    tracing::info!(path = %path.display(), count = names.len(), "Exported names");
    Ok(names.len())
}

fn quote_csv(field: &str) -> String {
    if field.contains(&[',', '"', '\n', '\r'][..]) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Split CSV text into records. Handles quoted fields with embedded
/// separators, doubled quotes and line breaks.
fn parse_csv(text: &str) -> Result<Vec<Vec<String>>> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                _ => field.push(c),
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(RosterError::InvalidFormat("Unterminated quoted CSV field".into()));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_txt_trims_and_skips_blanks() {
        let input = "\u{feff}Alice\n  Bob  \n\n\t\nCarol\r\n";
        let names = read_txt(input.as_bytes()).unwrap();
        assert_eq!(names, vec!["Alice", "Bob", "Carol"]);
    }

    #[test]
    fn test_read_csv_first_column_after_header() {
        let input = "Name,Class\nAlice,3A\n\"Smith, Bob\",3B\n\"Say \"\"Hi\"\"\",3C\n,3D\n";
        let names = read_csv(input.as_bytes()).unwrap();
        assert_eq!(names, vec!["Alice", "Smith, Bob", "Say \"Hi\""]);
    }

    #[test]
    fn test_read_csv_without_trailing_newline() {
        let names = read_csv("\u{feff}Name\r\nAlice\r\nBob".as_bytes()).unwrap();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    #[test]
    fn test_read_csv_unterminated_quote() {
        let result = read_csv("Name\n\"Alice\n".as_bytes());
        assert!(matches!(result, Err(RosterError::InvalidFormat(_))));
    }

    #[test]
    fn test_write_csv_quotes_when_needed() {
        let mut out = Vec::new();
        write_csv(&mut out, &["Alice".to_string(), "Smith, Bob".to_string()]).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "\u{feff}Name\nAlice\n\"Smith, Bob\"\n");
    }

    #[test]
    fn test_csv_round_trip() {
        let names = vec![
            "Alice".to_string(),
            "O\"Brien".to_string(),
            "Smith, Bob".to_string(),
        ];
        let mut out = Vec::new();
        write_csv(&mut out, &names).unwrap();
        assert_eq!(read_csv(out.as_slice()).unwrap(), names);
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path(Path::new("class.CSV")), Format::Csv);
        assert_eq!(Format::from_path(Path::new("class.txt")), Format::Txt);
        assert_eq!(Format::from_path(Path::new("class")), Format::Txt);
    }
}
