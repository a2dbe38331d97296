// Reading ballots from lines of text.
//
// Each line is one ballot. Ranks are separated by `,` and candidates sharing the same
// rank are separated by `=`:
//
//     TOM,SALLY=DAN,BOB
//
// Both levels follow the CSV quoting rules, so a candidate name can contain a comma
// when it is quoted.

use std::collections::HashSet;
use std::io::BufRead;

use log::{debug, warn};

use crate::config::*;

/// Turns a candidate name, as written in a ballot, into a candidate identifier.
///
/// This is implemented for `DiscoveringNormalizer`, `RegisteredCandidates` and for
/// any function `FnMut(&str) -> Result<CandidateId, NormalizeError>`.
pub trait CandidateNormalizer {
    fn parse_candidate(&mut self, raw: &str) -> Result<CandidateId, NormalizeError>;
}

impl<F> CandidateNormalizer for F
where
    F: FnMut(&str) -> Result<CandidateId, NormalizeError>,
{
    fn parse_candidate(&mut self, raw: &str) -> Result<CandidateId, NormalizeError> {
        self(raw)
    }
}

/// Trims the surrounding whitespace and upper-cases the name.
pub fn trim_upper(raw: &str) -> CandidateId {
    CandidateId::new(raw.trim().to_uppercase())
}

/// The default normalizer: trims and upper-cases the names (see [trim_upper]).
///
/// It never fails. It also remembers all the distinct identifiers it produced,
/// in the order in which they were first seen.
#[derive(Debug, Clone, Default)]
pub struct DiscoveringNormalizer {
    seen: HashSet<CandidateId>,
    discovered: Vec<CandidateId>,
}

impl DiscoveringNormalizer {
    pub fn new() -> DiscoveringNormalizer {
        DiscoveringNormalizer::default()
    }

    pub fn normalize(&mut self, raw: &str) -> CandidateId {
        let cid = trim_upper(raw);
        if self.seen.insert(cid.clone()) {
            self.discovered.push(cid.clone());
        }
        cid
    }

    /// All the identifiers produced so far, without duplicates.
    pub fn discovered(&self) -> &[CandidateId] {
        &self.discovered
    }

    pub fn into_discovered(self) -> Vec<CandidateId> {
        self.discovered
    }
}

impl CandidateNormalizer for DiscoveringNormalizer {
    fn parse_candidate(&mut self, raw: &str) -> Result<CandidateId, NormalizeError> {
        Ok(self.normalize(raw))
    }
}

pub fn default_normalizer() -> DiscoveringNormalizer {
    DiscoveringNormalizer::new()
}

/// Only accepts a fixed list of candidates.
///
/// Names are trimmed and upper-cased before being compared to the registered candidates,
/// which are normalized the same way.
#[derive(Debug, Clone)]
pub struct RegisteredCandidates {
    known: HashSet<CandidateId>,
}

impl RegisteredCandidates {
    pub fn new<I, S>(names: I) -> RegisteredCandidates
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        RegisteredCandidates {
            known: names.into_iter().map(|n| trim_upper(n.as_ref())).collect(),
        }
    }
}

impl CandidateNormalizer for RegisteredCandidates {
    fn parse_candidate(&mut self, raw: &str) -> Result<CandidateId, NormalizeError> {
        let cid = trim_upper(raw);
        if self.known.contains(&cid) {
            Ok(cid)
        } else {
            Err(NormalizeError::new(format!("unknown candidate {}", cid)))
        }
    }
}

/// What came out of one line of input.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ParsedLine {
    Ballot(Ballot),
    /// The line did not mention any candidate.
    Blank,
    Invalid(InvalidBallot),
}

/// Reads the ballots one line at a time.
///
/// Iterating yields one `ParsedLine` per line of input. A line that is not valid
/// UTF-8 is an invalid ballot. A failure of the underlying source is returned as
/// an error, after which the reader should not be used anymore.
pub struct BallotReader<'n, R, N: ?Sized> {
    source: R,
    normalizer: &'n mut N,
    line: usize,
    buf: Vec<u8>,
}

impl<'n, R: BufRead, N: CandidateNormalizer + ?Sized> BallotReader<'n, R, N> {
    pub fn new(source: R, normalizer: &'n mut N) -> BallotReader<'n, R, N> {
        BallotReader {
            source,
            normalizer,
            line: 0,
            buf: Vec::new(),
        }
    }

    /// The number of the last line read, starting at 1.
    pub fn line_number(&self) -> usize {
        self.line
    }

    /// Reads until the end of the input.
    ///
    /// Lines which can't be parsed are returned as invalid ballots.
    pub fn read_all(self) -> Result<(Vec<Ballot>, Vec<InvalidBallot>), ReadError> {
        let mut valid: Vec<Ballot> = Vec::new();
        let mut invalid: Vec<InvalidBallot> = Vec::new();
        for parsed in self {
            match parsed? {
                ParsedLine::Ballot(b) => valid.push(b),
                ParsedLine::Invalid(ib) => invalid.push(ib),
                ParsedLine::Blank => {}
            }
        }
        debug!(
            "read_all: {:?} valid ballots, {:?} invalid ballots",
            valid.len(),
            invalid.len()
        );
        Ok((valid, invalid))
    }
}

impl<'n, R: BufRead, N: CandidateNormalizer + ?Sized> Iterator for BallotReader<'n, R, N> {
    type Item = Result<ParsedLine, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buf.clear();
        match self.source.read_until(b'\n', &mut self.buf) {
            Ok(0) => return None,
            Ok(_) => {}
            Err(source) => {
                return Some(Err(ReadError::Io {
                    line: self.line + 1,
                    source,
                }))
            }
        }
        self.line += 1;
        let lineno = self.line;

        let mut bytes: &[u8] = &self.buf;
        if let Some(rest) = bytes.strip_suffix(b"\n") {
            bytes = rest.strip_suffix(b"\r").unwrap_or(rest);
        }
        let res = match std::str::from_utf8(bytes) {
            Ok(text) => parse_ballot(text, &mut *self.normalizer),
            Err(_) => Err(BallotError::InvalidEncoding),
        };

        let parsed = match res {
            Ok(Some(ballot)) => {
                debug!("line {}: ballot {:?}", lineno, ballot);
                ParsedLine::Ballot(ballot)
            }
            Ok(None) => ParsedLine::Blank,
            Err(e) => {
                warn!("line {}: invalid ballot: {}", lineno, e);
                ParsedLine::Invalid(InvalidBallot {
                    line: lineno,
                    reason: e.to_string(),
                })
            }
        };
        Some(Ok(parsed))
    }
}

/// Reads all the ballots of the source until the end of the input.
///
/// Returns the valid ballots, in input order, and the lines that could not be parsed.
/// An I/O error of the source stops the reading and is returned as an error.
pub fn read_all<R, N>(
    source: R,
    normalizer: &mut N,
) -> Result<(Vec<Ballot>, Vec<InvalidBallot>), ReadError>
where
    R: BufRead,
    N: CandidateNormalizer + ?Sized,
{
    BallotReader::new(source, normalizer).read_all()
}

/// Parses a single line into a ballot.
///
/// Returns `None` if the line does not contain any candidate.
pub fn parse_ballot<N>(line: &str, normalizer: &mut N) -> Result<Option<Ballot>, BallotError>
where
    N: CandidateNormalizer + ?Sized,
{
    let mut ballot = Ballot::new();
    let mut pref: Preference = 0;
    for field in split_quoted(line, b',')?.iter() {
        let names: Vec<String> = split_quoted(field, b'=')?
            .into_iter()
            .filter(|s| !s.trim().is_empty())
            .collect();
        // An empty rank does not count.
        if names.is_empty() {
            continue;
        }
        for name in names.iter() {
            let cid = normalizer.parse_candidate(name)?;
            ballot.insert(cid, pref)?;
        }
        pref += 1;
    }

    if ballot.is_empty() {
        Ok(None)
    } else {
        Ok(Some(ballot))
    }
}

// Splits one record of text on the delimiter, following the CSV quoting rules.
fn split_quoted(text: &str, delimiter: u8) -> Result<Vec<String>, BallotError> {
    check_quotes(text, delimiter)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());
    match rdr.records().next() {
        Some(Ok(record)) => Ok(record.iter().map(|s| s.to_string()).collect()),
        Some(Err(e)) => Err(BallotError::Malformed(e.to_string())),
        None => Ok(Vec::new()),
    }
}

// The csv reader silently accepts a quoted field that is never closed and
// swallows the rest of the line into it.
fn check_quotes(text: &str, delimiter: u8) -> Result<(), BallotError> {
    let mut in_quotes = false;
    let mut field_start = true;
    let mut bytes = text.as_bytes().iter().peekable();
    while let Some(&b) = bytes.next() {
        if in_quotes {
            if b == b'"' {
                if bytes.peek() == Some(&&b'"') {
                    bytes.next();
                } else {
                    in_quotes = false;
                }
            }
        } else if field_start && b == b'"' {
            in_quotes = true;
            field_start = false;
        } else {
            field_start = b == delimiter;
        }
    }
    if in_quotes {
        Err(BallotError::Malformed(
            "missing closing \" in quoted field".to_string(),
        ))
    } else {
        Ok(())
    }
}
