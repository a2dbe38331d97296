// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

/// The identifier of a candidate, after normalization.
///
/// Two identifiers are the same candidate if and only if their strings are equal.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new(name: impl Into<String>) -> CandidateId {
        CandidateId(name.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for CandidateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CandidateId {
    fn from(s: &str) -> CandidateId {
        CandidateId(s.to_string())
    }
}

impl From<String> for CandidateId {
    fn from(s: String) -> CandidateId {
        CandidateId(s)
    }
}

/// The rank given to a candidate in a ballot. 0 is the most preferred.
pub type Preference = u32;

/// The preferences of one voter.
///
/// Candidates may share the same preference. Candidates that are not in the ballot
/// are ranked after all the candidates of the ballot.
///
/// A candidate can only be present once: `insert` refuses a second entry for the
/// same candidate, even with the same preference.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct Ballot {
    preferences: HashMap<CandidateId, Preference>,
}

impl Ballot {
    pub fn new() -> Ballot {
        Ballot::default()
    }

    /// Builds a ballot from (candidate, preference) pairs.
    pub fn from_preferences<I, C>(prefs: I) -> Result<Ballot, BallotError>
    where
        I: IntoIterator<Item = (C, Preference)>,
        C: Into<CandidateId>,
    {
        let mut ballot = Ballot::new();
        for (cid, pref) in prefs {
            ballot.insert(cid.into(), pref)?;
        }
        Ok(ballot)
    }

    pub fn insert(&mut self, cid: CandidateId, pref: Preference) -> Result<(), BallotError> {
        if self.preferences.contains_key(&cid) {
            return Err(BallotError::DuplicateCandidate(cid));
        }
        self.preferences.insert(cid, pref);
        Ok(())
    }

    pub fn preference(&self, cid: &CandidateId) -> Option<Preference> {
        self.preferences.get(cid).copied()
    }

    pub fn contains(&self, cid: &CandidateId) -> bool {
        self.preferences.contains_key(cid)
    }

    pub fn candidates(&self) -> impl Iterator<Item = &CandidateId> {
        self.preferences.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CandidateId, Preference)> {
        self.preferences.iter().map(|(cid, p)| (cid, *p))
    }

    pub fn len(&self) -> usize {
        self.preferences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.preferences.is_empty()
    }
}

// ******** Output data structures *********

/// The outcome of an election: all the candidates, the most preferred first.
pub type Ranking = Vec<CandidateId>;

/// A square table of counts between ordered pairs of candidates.
///
/// Pairs involving a candidate that was not part of the election read as 0.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PairTable {
    pub(crate) candidates: Vec<CandidateId>,
    pub(crate) index: HashMap<CandidateId, usize>,
    pub(crate) values: Vec<Vec<u64>>,
}

impl PairTable {
    pub fn get(&self, a: &CandidateId, b: &CandidateId) -> u64 {
        match (self.index.get(a), self.index.get(b)) {
            (Some(&i), Some(&j)) => self.values[i][j],
            _ => 0,
        }
    }

    /// The candidates of the table, in sorted order.
    pub fn candidates(&self) -> &[CandidateId] {
        &self.candidates
    }
}

/// All the intermediate steps of a Schulze evaluation.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SchulzeResult {
    pub ranking: Ranking,
    /// For each candidate of the ranking (same order), the number of candidates it beats
    /// through the strongest paths.
    pub scores: Vec<(CandidateId, u32)>,
    /// Number of ballots preferring the first candidate over the second one.
    pub pairwise: PairTable,
    /// Strength of the strongest path from the first candidate to the second one.
    pub strongest_paths: PairTable,
}

/// A line of input that could not be turned into a ballot.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct InvalidBallot {
    /// Line number, starting at 1.
    pub line: usize,
    pub reason: String,
}

// ******** Errors *********

/// Errors when constructing a ballot.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum BallotError {
    /// The candidate was already given a preference in this ballot.
    DuplicateCandidate(CandidateId),
    /// The candidate name could not be normalized.
    InvalidCandidate(NormalizeError),
    /// The line does not follow the quoting rules.
    Malformed(String),
    /// The line is not valid UTF-8 text.
    InvalidEncoding,
}

impl Error for BallotError {}

impl Display for BallotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BallotError::DuplicateCandidate(cid) => write!(
                f,
                "cyclic vote detected: cannot reference candidate {} twice in a vote",
                cid
            ),
            BallotError::InvalidCandidate(e) => write!(f, "could not parse candidate ID: {}", e),
            BallotError::Malformed(msg) => write!(f, "could not read record: {}", msg),
            BallotError::InvalidEncoding => write!(f, "line is not valid UTF-8"),
        }
    }
}

impl From<NormalizeError> for BallotError {
    fn from(e: NormalizeError) -> BallotError {
        BallotError::InvalidCandidate(e)
    }
}

/// A candidate name that a normalizer refused.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct NormalizeError {
    pub reason: String,
}

impl NormalizeError {
    pub fn new(reason: impl Into<String>) -> NormalizeError {
        NormalizeError {
            reason: reason.into(),
        }
    }
}

impl Error for NormalizeError {}

impl Display for NormalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reason)
    }
}

/// Errors that stop the reading of ballots.
#[derive(Debug)]
pub enum ReadError {
    /// The source failed before reaching the end of the input.
    Io {
        /// The line that was being read.
        line: usize,
        source: std::io::Error,
    },
}

impl Error for ReadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReadError::Io { source, .. } => Some(source),
        }
    }
}

impl Display for ReadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadError::Io { line, source } => {
                write!(f, "failed to read line {}: {}", line, source)
            }
        }
    }
}
