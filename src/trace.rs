use std::collections::VecDeque;
use std::io::BufRead;

use num_traits::FromPrimitive;
use regex::Regex;

use crate::error::TraceError;
use crate::instruction::UnitClass;

/// Raw fields of one trace record, before the pipeline assigns it a tag.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceInst {
    pub address: u64,
    pub class: Option<UnitClass>,
    pub src: [Option<u32>; 2],
    pub dest: Option<u32>,
}

/// Seam between the pipeline and trace I/O: one record per call, `None` once
/// the trace is exhausted. The pipeline assigns tags and timestamps, never
/// the source.
pub trait TraceSource {
    fn next_inst(&mut self) -> Result<Option<TraceInst>, TraceError>;
}

/// In-memory traces, mostly for tests and embedding.
impl TraceSource for VecDeque<TraceInst> {
    fn next_inst(&mut self) -> Result<Option<TraceInst>, TraceError> {
        Ok(self.pop_front())
    }
}

/// Line-oriented trace reader. Each record is
/// `<address-hex> <class> <dest> <src0> <src1>` with `-1` meaning "none" for
/// the class and register fields; blank lines are skipped.
pub struct TraceReader<R> {
    input: R,
    line_re: Regex,
    line_no: usize,
}
impl<R: BufRead> TraceReader<R> {
    pub fn new(input: R) -> Self {
        let line_re = Regex::new(r"^\s*([0-9a-fA-F]+)\s+(-?\d+)\s+(-?\d+)\s+(-?\d+)\s+(-?\d+)\s*$")
            .expect("literal regex");
        Self {
            input,
            line_re,
            line_no: 0,
        }
    }

    fn malformed(&self, text: &str) -> TraceError {
        TraceError::Malformed {
            line: self.line_no,
            text: text.trim().to_string(),
        }
    }

    fn parse_class(&self, field: &str, text: &str) -> Result<Option<UnitClass>, TraceError> {
        let raw: i64 = field.parse().map_err(|_| self.malformed(text))?;
        if raw == -1 {
            return Ok(None);
        }
        match UnitClass::from_i64(raw) {
            Some(class) => Ok(Some(class)),
            None => Err(TraceError::BadClass {
                line: self.line_no,
                found: raw,
            }),
        }
    }

    fn parse_reg(&self, field: &str, text: &str) -> Result<Option<u32>, TraceError> {
        let raw: i64 = field.parse().map_err(|_| self.malformed(text))?;
        match raw {
            -1 => Ok(None),
            r if r >= 0 && r <= i64::from(u32::MAX) => Ok(Some(r as u32)),
            _ => Err(self.malformed(text)),
        }
    }
}
impl<R: BufRead> TraceSource for TraceReader<R> {
    fn next_inst(&mut self) -> Result<Option<TraceInst>, TraceError> {
        let mut text = String::new();
        loop {
            text.clear();
            self.line_no += 1;
            let read = self.input.read_line(&mut text).map_err(|source| TraceError::Io {
                line: self.line_no,
                source,
            })?;
            if read == 0 {
                return Ok(None);
            }
            if !text.trim().is_empty() {
                break;
            }
        }

        let caps = self
            .line_re
            .captures(&text)
            .ok_or_else(|| self.malformed(&text))?;

        let address = u64::from_str_radix(&caps[1], 16).map_err(|_| self.malformed(&text))?;
        let class = self.parse_class(&caps[2], &text)?;
        let dest = self.parse_reg(&caps[3], &text)?;
        let src0 = self.parse_reg(&caps[4], &text)?;
        let src1 = self.parse_reg(&caps[5], &text)?;

        Ok(Some(TraceInst {
            address,
            class,
            src: [src0, src1],
            dest,
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn read_all(text: &str) -> Result<Vec<TraceInst>, TraceError> {
        let mut reader = TraceReader::new(Cursor::new(text));
        let mut records = Vec::new();
        while let Some(record) = reader.next_inst()? {
            records.push(record);
        }
        Ok(records)
    }

    #[test]
    fn parses_a_full_record() {
        let records = read_all("ab120024 2 1 2 3\n").unwrap();
        assert_eq!(
            records,
            vec![TraceInst {
                address: 0xab120024,
                class: Some(UnitClass::K2),
                src: [Some(2), Some(3)],
                dest: Some(1),
            }]
        );
    }

    #[test]
    fn minus_one_fields_mean_none() {
        let records = read_all("10 -1 -1 -1 -1\n").unwrap();
        assert_eq!(
            records,
            vec![TraceInst {
                address: 0x10,
                class: None,
                src: [None, None],
                dest: None,
            }]
        );
    }

    #[test]
    fn blank_lines_are_skipped() {
        let records = read_all("\n1a 0 1 -1 -1\n\n\n2b 1 2 1 -1\n").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].address, 0x2b);
        assert_eq!(records[1].class, Some(UnitClass::K1));
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let err = read_all("1a 0 1 -1 -1\nnot a record\n").unwrap_err();
        match err {
            TraceError::Malformed { line, text } => {
                assert_eq!(line, 2);
                assert_eq!(text, "not a record");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn class_outside_range_is_rejected() {
        let err = read_all("1a 5 1 -1 -1\n").unwrap_err();
        assert!(matches!(err, TraceError::BadClass { line: 1, found: 5 }));
    }

    #[test]
    fn vecdeque_source_drains_in_order() {
        let mut source: VecDeque<TraceInst> = VecDeque::from(vec![
            TraceInst {
                address: 1,
                class: None,
                src: [None, None],
                dest: None,
            },
            TraceInst {
                address: 2,
                class: None,
                src: [None, None],
                dest: None,
            },
        ]);
        assert_eq!(source.next_inst().unwrap().map(|r| r.address), Some(1));
        assert_eq!(source.next_inst().unwrap().map(|r| r.address), Some(2));
        assert_eq!(source.next_inst().unwrap(), None);
    }
}
