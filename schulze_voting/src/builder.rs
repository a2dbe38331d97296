pub use crate::config::*;

use crate::reader::CandidateNormalizer;

/// A builder for adding ballots.
///
/// Each ballot is given as a list of ranks, the first rank being the most preferred.
/// Each rank contains one or more candidates that are equally preferred.
///
/// ```
/// pub use schulze_voting::builder::Builder;
/// # use schulze_voting::{BallotError, CandidateId};
///
/// let mut builder = Builder::new();
///
/// builder.add_vote_simple(&["Anna", "Bob"])?;
/// builder.add_vote(&[vec!["Bob"], vec!["Anna", "Clara"]], 2)?;
///
/// let result = builder.evaluate();
/// assert_eq!(result.ranking[0], CandidateId::from("Bob"));
///
/// # Ok::<(), BallotError>(())
/// ```
#[derive(Clone, Default)]
pub struct Builder {
    pub(crate) normalizer_fn: Option<fn(&str) -> CandidateId>,
    pub(crate) votes: Vec<(Ballot, u64)>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder::default()
    }

    /// Applies the given function to all the candidate names added afterwards.
    pub fn normalizer(self, f: fn(&str) -> CandidateId) -> Builder {
        Builder {
            normalizer_fn: Some(f),
            votes: self.votes,
        }
    }

    /// Adds a ballot in which every candidate has a distinct rank.
    ///
    /// It is the simplest use case for most cases.
    pub fn add_vote_simple<S: AsRef<str>>(&mut self, candidates: &[S]) -> Result<(), BallotError> {
        let ranks: Vec<Vec<&str>> = candidates.iter().map(|c| vec![c.as_ref()]).collect();
        self.add_vote(&ranks, 1)
    }

    /// Adds a ballot, with a potential weight attached to it.
    ///
    /// candidates: the ranks chosen by the voter, in order. Empty ranks are skipped, and
    /// a candidate may not appear twice in the same ballot.
    pub fn add_vote<S: AsRef<str>>(
        &mut self,
        candidates: &[Vec<S>],
        count: u64,
    ) -> Result<(), BallotError> {
        let mut ballot = Ballot::new();
        let non_empty_ranks = candidates.iter().filter(|rank| !rank.is_empty());
        for (pref, rank) in non_empty_ranks.enumerate() {
            for name in rank.iter() {
                let name: &str = name.as_ref();
                let cid = match self.normalizer_fn {
                    Some(f) => f(name),
                    None => CandidateId::new(name),
                };
                ballot.insert(cid, pref as Preference)?;
            }
        }
        self.add_ballot(ballot, count);
        Ok(())
    }

    /// Adds a ballot whose names go through a normalizer first.
    pub fn add_vote_normalized<N, S>(
        &mut self,
        normalizer: &mut N,
        candidates: &[Vec<S>],
        count: u64,
    ) -> Result<(), BallotError>
    where
        N: CandidateNormalizer + ?Sized,
        S: AsRef<str>,
    {
        let mut ballot = Ballot::new();
        let non_empty_ranks = candidates.iter().filter(|rank| !rank.is_empty());
        for (pref, rank) in non_empty_ranks.enumerate() {
            for name in rank.iter() {
                let cid = normalizer.parse_candidate(name.as_ref())?;
                ballot.insert(cid, pref as Preference)?;
            }
        }
        self.add_ballot(ballot, count);
        Ok(())
    }

    /// Adds a ballot that was already built, repeated `count` times.
    pub fn add_ballot(&mut self, ballot: Ballot, count: u64) {
        self.votes.push((ballot, count));
    }

    pub fn num_ballots(&self) -> u64 {
        self.votes.iter().map(|(_, count)| *count).sum()
    }

    /// Runs the election on all the ballots added so far.
    pub fn evaluate(&self) -> SchulzeResult {
        crate::evaluate_weighted(&self.votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::*;

    #[test]
    fn builder_matches_evaluate() {
        let mut builder = Builder::new();
        builder.add_vote_simple(&["A", "C", "B"]).unwrap();
        builder.add_vote(&[vec!["B"], vec![], vec!["A", "C"]], 3).unwrap();
        assert_eq!(builder.num_ballots(), 4);

        let mut ballots = vec![Ballot::from_preferences([("A", 0), ("C", 1), ("B", 2)]).unwrap()];
        for _ in 0..3 {
            ballots.push(Ballot::from_preferences([("B", 0), ("A", 1), ("C", 1)]).unwrap());
        }
        assert_eq!(builder.evaluate(), crate::evaluate_detailed(&ballots));
    }

    #[test]
    fn prebuilt_ballots() {
        let mut builder = Builder::new();
        builder.add_ballot(Ballot::from_preferences([("X", 0), ("Y", 1)]).unwrap(), 2);
        builder.add_ballot(Ballot::from_preferences([("Y", 0)]).unwrap(), 1);
        assert_eq!(builder.num_ballots(), 3);
        assert_eq!(
            builder.evaluate().ranking,
            vec![CandidateId::from("X"), CandidateId::from("Y")]
        );
    }

    #[test]
    fn duplicate_candidates_are_refused() {
        let mut builder = Builder::new().normalizer(trim_upper);
        let res = builder.add_vote(&[vec!["bob"], vec![" BOB"]], 1);
        assert_eq!(
            res,
            Err(BallotError::DuplicateCandidate(CandidateId::from("BOB")))
        );
        assert_eq!(builder.num_ballots(), 0);
    }

    #[test]
    fn normalized_votes() {
        let mut builder = Builder::new();
        let mut registered = RegisteredCandidates::new(["alice", "bob"]);
        builder
            .add_vote_normalized(&mut registered, &[vec!["Bob"], vec!["alice "]], 1)
            .unwrap();
        let res = builder.add_vote_normalized(&mut registered, &[vec!["carol"]], 1);
        assert!(matches!(res, Err(BallotError::InvalidCandidate(_))));
        assert_eq!(
            builder.evaluate().ranking,
            vec![CandidateId::from("BOB"), CandidateId::from("ALICE")]
        );
    }
}
