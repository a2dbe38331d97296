pub mod builder;
mod config;
pub mod manual;
mod reader;
use log::{debug, info};

use std::{
    collections::{BTreeSet, HashMap},
    ops::AddAssign,
};

pub use crate::config::*;
pub use crate::reader::*;

// **** Private structures ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord, Hash)]
struct VoteCount(u64);

impl VoteCount {
    const EMPTY: VoteCount = VoteCount(0);
}

impl AddAssign for VoteCount {
    fn add_assign(&mut self, rhs: VoteCount) {
        self.0 += rhs.0;
    }
}

// The place of a candidate in a ballot.
// The derived order puts every ranked candidate before the unranked ones, whatever
// the preference values used in the ballot.
#[derive(Eq, PartialEq, Debug, Clone, Copy, PartialOrd, Ord)]
enum Standing {
    Ranked(Preference),
    Unranked,
}

// Dense square matrix, indexed by the position of the candidates in the sorted
// candidate list.
type Matrix = Vec<Vec<VoteCount>>;

fn empty_matrix(n: usize) -> Matrix {
    vec![vec![VoteCount::EMPTY; n]; n]
}

/// Runs a Schulze election and returns the candidates, the most preferred first.
///
/// All the candidates that appear in at least one ballot are in the ranking, exactly once.
/// Candidates with the same number of wins are ordered by their identifier.
///
/// ```
/// use schulze_voting::{evaluate, Ballot, CandidateId};
///
/// let ballots = vec![
///     Ballot::from_preferences([("DAN", 0), ("ALICE", 1), ("SALLY", 2)])?,
///     Ballot::from_preferences([("SALLY", 5), ("DAN", 5), ("ALICE", 5)])?,
///     Ballot::from_preferences([("BOB", 0)])?,
/// ];
/// let ranking = evaluate(&ballots);
/// assert_eq!(
///     ranking,
///     vec![
///         CandidateId::from("DAN"),
///         CandidateId::from("ALICE"),
///         CandidateId::from("SALLY"),
///         CandidateId::from("BOB"),
///     ]
/// );
/// # Ok::<(), schulze_voting::BallotError>(())
/// ```
pub fn evaluate(ballots: &[Ballot]) -> Ranking {
    evaluate_detailed(ballots).ranking
}

/// Same as [evaluate], but also returns the pairwise preferences, the strongest paths and
/// the scores that led to the ranking.
pub fn evaluate_detailed(ballots: &[Ballot]) -> SchulzeResult {
    let coll: Vec<(&Ballot, VoteCount)> = ballots.iter().map(|b| (b, VoteCount(1))).collect();
    run_schulze(&coll)
}

/// Runs a Schulze election in which each ballot is repeated a number of times.
///
/// A ballot with a count of zero does not change the tally, but its candidates
/// are still part of the ranking.
pub fn evaluate_weighted(ballots: &[(Ballot, u64)]) -> SchulzeResult {
    let coll: Vec<(&Ballot, VoteCount)> = ballots
        .iter()
        .map(|(b, count)| (b, VoteCount(*count)))
        .collect();
    run_schulze(&coll)
}

fn run_schulze(coll: &[(&Ballot, VoteCount)]) -> SchulzeResult {
    let candidates = find_candidates(coll);
    info!(
        "Processing {:?} ballots, {:?} candidates",
        coll.len(),
        candidates.len()
    );

    let pairwise = find_pairwise_preferences(coll, &candidates);
    debug!("run_schulze: pairwise preferences: {:?}", pairwise);

    let strongest_paths = find_strongest_paths(&pairwise);
    debug!("run_schulze: strongest paths: {:?}", strongest_paths);

    let scores = find_scores(&strongest_paths);
    let order = rank_candidates(&scores, &candidates);
    debug!("run_schulze: scores: {:?} order: {:?}", scores, order);

    let ranking: Ranking = order.iter().map(|&idx| candidates[idx].clone()).collect();
    info!("Ranking: {:?}", ranking);

    let index: HashMap<CandidateId, usize> = candidates
        .iter()
        .enumerate()
        .map(|(idx, cid)| (cid.clone(), idx))
        .collect();
    let to_table = |m: &Matrix| PairTable {
        candidates: candidates.clone(),
        index: index.clone(),
        values: m
            .iter()
            .map(|row| row.iter().map(|vc| vc.0).collect())
            .collect(),
    };

    SchulzeResult {
        scores: order
            .iter()
            .map(|&idx| (candidates[idx].clone(), scores[idx]))
            .collect(),
        pairwise: to_table(&pairwise),
        strongest_paths: to_table(&strongest_paths),
        ranking,
    }
}

// The candidates are returned in sorted order. This order is only used for indexing.
fn find_candidates(coll: &[(&Ballot, VoteCount)]) -> Vec<CandidateId> {
    let set: BTreeSet<&CandidateId> = coll.iter().flat_map(|(b, _)| b.candidates()).collect();
    set.into_iter().cloned().collect()
}

fn find_pairwise_preferences(coll: &[(&Ballot, VoteCount)], candidates: &[CandidateId]) -> Matrix {
    let n = candidates.len();
    let mut res = empty_matrix(n);
    for (ballot, count) in coll.iter() {
        if *count == VoteCount::EMPTY || ballot.is_empty() {
            continue;
        }
        let standings: Vec<Standing> = candidates
            .iter()
            .map(|cid| match ballot.preference(cid) {
                Some(p) => Standing::Ranked(p),
                None => Standing::Unranked,
            })
            .collect();
        for i in 0..n {
            for j in 0..n {
                // If I is preferred to J, that is its standing is strictly lower.
                if i != j && standings[i] < standings[j] {
                    res[i][j] += *count;
                }
            }
        }
    }
    res
}

fn find_strongest_paths(pairwise: &Matrix) -> Matrix {
    let n = pairwise.len();
    let mut p = empty_matrix(n);
    for i in 0..n {
        for j in 0..n {
            if i != j && pairwise[i][j] > pairwise[j][i] {
                p[i][j] = pairwise[i][j];
            }
        }
    }

    // Widening over the intermediate candidate I, in Floyd-Warshall order.
    for i in 0..n {
        for j in 0..n {
            if j == i {
                continue;
            }
            for k in 0..n {
                if k == i || k == j {
                    continue;
                }
                let through_i = std::cmp::min(p[j][i], p[i][k]);
                if through_i > p[j][k] {
                    p[j][k] = through_i;
                }
            }
        }
    }
    p
}

// For each candidate, the number of other candidates it beats through the strongest paths.
fn find_scores(strongest_paths: &Matrix) -> Vec<u32> {
    let n = strongest_paths.len();
    (0..n)
        .map(|i| {
            (0..n)
                .filter(|&j| i != j && strongest_paths[i][j] > strongest_paths[j][i])
                .count() as u32
        })
        .collect()
}

// Highest score first. Equal scores are ordered by candidate identifier.
fn rank_candidates(scores: &[u32], candidates: &[CandidateId]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..candidates.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .cmp(&scores[a])
            .then_with(|| candidates[a].cmp(&candidates[b]))
    });
    order
}
