//! Headerless CSV input with strict line accounting
//!
//! Leaf files, trial logs and reshaped files all go through [`LineRecords`].
//! The `csv` reader skips empty lines on its own; here an empty line anywhere
//! in the input is a [`AnalysisError::MalformedLine`] at that line, because a
//! hole in a sample file means it was cut short or corrupted. The newline that
//! ends the last record is not an empty line.

use std::io::{self, Read};
use std::path::{Path, PathBuf};

use csv::{StringRecord, Terminator, Trim};

use crate::error::{AnalysisError, Result};

/// Records of one input, each with its 1-based line number.
pub(crate) struct LineRecords<R> {
    reader: csv::Reader<LastByte<R>>,
    origin: PathBuf,
    /// Reader line before and after the most recent record
    last: Option<(u64, u64)>,
    done: bool,
}

impl<R: Read> LineRecords<R> {
    pub(crate) fn new(reader: R, origin: &Path) -> Self {
        // Only `\n` ends a record, so line numbers advance inside the read
        // that produced the record; a `\r` before it is trimmed away.
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .terminator(Terminator::Any(b'\n'))
            .from_reader(LastByte {
                inner: reader,
                last: None,
            });

        Self {
            reader,
            origin: origin.to_path_buf(),
            last: None,
            done: false,
        }
    }

    fn empty_line(&mut self, line: u64) -> Option<Result<(u64, StringRecord)>> {
        self.done = true;
        Some(Err(AnalysisError::MalformedLine {
            path: self.origin.clone(),
            line,
            message: "empty line".to_string(),
        }))
    }

    fn finish(&mut self) -> Option<Result<(u64, StringRecord)>> {
        self.done = true;
        let (start, end) = self.last?;

        if self.reader.position().line() > end {
            return self.empty_line(end);
        }
        // One newline consumed by an unterminated final record came before it
        if end == start + 1 && self.reader.get_ref().last != Some(b'\n') {
            return self.empty_line(start);
        }
        None
    }
}

impl<R: Read> Iterator for LineRecords<R> {
    type Item = Result<(u64, StringRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let start = self.reader.position().line();
        let mut record = StringRecord::new();
        match self.reader.read_record(&mut record) {
            Err(source) => {
                self.done = true;
                Some(Err(AnalysisError::Csv {
                    path: self.origin.clone(),
                    source,
                }))
            }
            Ok(false) => self.finish(),
            Ok(true) => {
                let end = self.reader.position().line();
                self.last = Some((start, end));

                let line = if end > start { end - 1 } else { start };
                if line > start {
                    return self.empty_line(start);
                }
                Some(Ok((line, record)))
            }
        }
    }
}

/// Remembers the final byte of the input.
struct LastByte<R> {
    inner: R,
    last: Option<u8>,
}

impl<R: Read> Read for LastByte<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if let Some(&byte) = buf[..n].last() {
            self.last = Some(byte);
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(input: &str) -> Result<Vec<(u64, Vec<String>)>> {
        LineRecords::new(input.as_bytes(), Path::new("in.csv"))
            .map(|result| {
                result.map(|(line, record)| (line, record.iter().map(str::to_string).collect()))
            })
            .collect()
    }

    fn empty_line_at(input: &str) -> u64 {
        match lines(input) {
            Err(AnalysisError::MalformedLine { line, message, .. }) => {
                assert_eq!(message, "empty line");
                line
            }
            other => panic!("expected an empty-line error, got {other:?}"),
        }
    }

    #[test]
    fn test_line_numbers() {
        let parsed = lines("a,1\nb,2\r\nc,3").unwrap();
        let numbers: Vec<u64> = parsed.iter().map(|(line, _)| *line).collect();

        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(parsed[1].1, vec!["b", "2"]);
    }

    #[test]
    fn test_final_newline_is_not_a_line() {
        assert_eq!(lines("10,20\n11,21\n").unwrap().len(), 2);
        assert_eq!(lines("10,20\r\n").unwrap().len(), 1);
    }

    #[test]
    fn test_empty_input_has_no_records() {
        assert!(lines("").unwrap().is_empty());
    }

    #[test]
    fn test_interior_empty_line() {
        assert_eq!(empty_line_at("10,20\n\n11,21\n\n"), 2);
        assert_eq!(empty_line_at("10,20\n11,21\n\n\n12,22\n"), 3);
        assert_eq!(empty_line_at("\n10,20\n"), 1);
    }

    #[test]
    fn test_empty_line_before_unterminated_last_record() {
        assert_eq!(empty_line_at("10,20\n\n11,21"), 2);
    }

    #[test]
    fn test_trailing_empty_lines() {
        assert_eq!(empty_line_at("10,20\n11,21\n\n"), 3);
    }

    #[test]
    fn test_whitespace_line_is_a_record() {
        // Not empty: callers reject it as a line without the expected fields
        let parsed = lines("10,20\n   \n").unwrap();
        assert_eq!(parsed[1], (2, vec![String::new()]));
    }
}
