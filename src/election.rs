use log::{debug, info, warn};

use schulze_voting::*;
use snafu::{prelude::*, Snafu};

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::election::config_reader::*;

pub mod config_reader;

#[derive(Debug, Snafu)]
pub enum CliError {
    #[snafu(display("Error opening file {path}"))]
    OpeningInput { source: io::Error, path: String },
    #[snafu(display("Error opening JSON file {path}"))]
    OpeningJson { source: io::Error, path: String },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error reading the ballots"))]
    ReadingBallots { source: ReadError },
    #[snafu(display("Error writing the output"))]
    WritingOutput { source: io::Error },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type CliResult<T> = Result<T, CliError>;

/// The outcome of reading and evaluating one set of ballots.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Tabulation {
    pub num_ballots: usize,
    pub invalid: Vec<InvalidBallot>,
    pub result: SchulzeResult,
}

/// Reads all the ballots and runs the election.
///
/// If candidates are provided, ballots that mention other candidates are invalid.
pub fn tabulate<R: BufRead>(input: R, candidates: Option<&[String]>) -> CliResult<Tabulation> {
    let (ballots, invalid) = match candidates {
        Some(names) => {
            let mut normalizer = RegisteredCandidates::new(names);
            read_all(input, &mut normalizer)
        }
        None => {
            let mut normalizer = default_normalizer();
            let res = read_all(input, &mut normalizer);
            debug!("tabulate: discovered candidates: {:?}", normalizer.discovered());
            res
        }
    }
    .context(ReadingBallotsSnafu {})?;
    info!(
        "Read {:?} ballots, {:?} invalid lines",
        ballots.len(),
        invalid.len()
    );

    let result = evaluate_detailed(&ballots);
    Ok(Tabulation {
        num_ballots: ballots.len(),
        invalid,
        result,
    })
}

fn write_invalid<W: Write>(invalid: &[InvalidBallot], err_output: &mut W) -> CliResult<()> {
    for ib in invalid.iter() {
        writeln!(err_output, "ERROR [Line {}]: {}", ib.line, ib.reason)
            .context(WritingOutputSnafu {})?;
    }
    Ok(())
}

fn write_ranking<W: Write>(ranking: &[CandidateId], output: &mut W) -> CliResult<()> {
    for cid in ranking.iter() {
        writeln!(output, "{}", cid).context(WritingOutputSnafu {})?;
    }
    Ok(())
}

/// Reports the invalid lines on `err_output`, and writes on `output` either the
/// JSON summary when it goes to the standard output, or the ranking.
fn write_results<W: Write, E: Write>(
    tab: &Tabulation,
    stdout_summary: Option<&str>,
    output: &mut W,
    err_output: &mut E,
) -> CliResult<()> {
    write_invalid(&tab.invalid, err_output)?;
    match stdout_summary {
        Some(summary) => writeln!(output, "{}", summary).context(WritingOutputSnafu {}),
        None => write_ranking(&tab.result.ranking, output),
    }
}

/// Reads the ballots, reports the invalid lines on `err_output` and writes the ranking,
/// one candidate per line, on `output`.
pub fn run<R: BufRead, W: Write, E: Write>(
    input: R,
    candidates: Option<&[String]>,
    output: &mut W,
    err_output: &mut E,
) -> CliResult<Tabulation> {
    let tab = tabulate(input, candidates)?;
    write_results(&tab, None, output, err_output)?;
    Ok(tab)
}

fn pair_table_to_json(table: &PairTable) -> JSValue {
    let mut rows: JSMap<String, JSValue> = JSMap::new();
    for a in table.candidates() {
        let mut row: JSMap<String, JSValue> = JSMap::new();
        for b in table.candidates().iter().filter(|b| *b != a) {
            row.insert(b.to_string(), json!(table.get(a, b)));
        }
        rows.insert(a.to_string(), JSValue::Object(row));
    }
    JSValue::Object(rows)
}

fn build_summary_js(contest: &str, tab: &Tabulation) -> JSValue {
    let c = OutputConfig {
        contest: contest.to_string(),
        candidates: tab.result.ranking.len(),
        ballots: tab.num_ballots,
        invalid_ballots: tab.invalid.len(),
    };
    let ranking: Vec<String> = tab.result.ranking.iter().map(|c| c.to_string()).collect();
    let mut scores: JSMap<String, JSValue> = JSMap::new();
    for (cid, score) in tab.result.scores.iter() {
        scores.insert(cid.to_string(), json!(score));
    }
    let invalid: Vec<JSValue> = tab
        .invalid
        .iter()
        .map(|ib| json!({"line": ib.line, "reason": ib.reason}))
        .collect();
    json!({
        "config": c,
        "results": {
            "ranking": ranking,
            "scores": scores,
            "pairwise": pair_table_to_json(&tab.result.pairwise),
            "strongestPaths": pair_table_to_json(&tab.result.strongest_paths)
        },
        "invalid": invalid
    })
}

// Compares the summary with the reference, ignoring the formatting.
fn check_summary(summary: &JSValue, reference_path: &str) -> CliResult<()> {
    let summary_ref = read_summary(reference_path)?;
    if summary_ref != *summary {
        warn!("Found differences with the reference summary");
        let pretty_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        let pretty = serde_json::to_string_pretty(summary).context(ParsingJsonSnafu {})?;
        print_diff(pretty_ref.as_str(), pretty.as_str(), "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

/// Runs the election described by the command line arguments.
pub fn run_election(args: &Args) -> CliResult<()> {
    let config_path = args.config.as_deref();
    let config: ElectionConfig = match config_path {
        Some(p) => read_config(p)?,
        None => ElectionConfig::default(),
    };
    info!("config: {:?}", config);

    let input_path: Option<String> = match (&args.input, &config.input) {
        (Some(p), _) => Some(p.clone()),
        (None, Some(p)) => Some(resolve_path(config_path, p)),
        (None, None) => None,
    };
    let out_path: Option<String> = match (&args.out, &config.out) {
        (Some(p), _) => Some(p.clone()),
        (None, Some(p)) => Some(resolve_path(config_path, p)),
        (None, None) => None,
    };

    let candidates = config.candidates.as_deref();
    let tab = match input_path {
        Some(path) => {
            info!("Attempting to read ballot file {:?}", path);
            let file = File::open(&path).context(OpeningInputSnafu { path })?;
            tabulate(BufReader::new(file), candidates)?
        }
        None => {
            info!("Reading ballots from the standard input");
            tabulate(io::stdin().lock(), candidates)?
        }
    };

    let contest = config.contest_name.unwrap_or_default();
    let summary = build_summary_js(&contest, &tab);
    let pretty = serde_json::to_string_pretty(&summary).context(ParsingJsonSnafu {})?;

    // The summary replaces the ranking on the standard output.
    let stdout_summary = match out_path.as_deref() {
        Some("stdout") => Some(pretty.as_str()),
        Some(out) => {
            info!("Writing summary to {:?}", out);
            fs::write(out, &pretty).context(WritingOutputSnafu {})?;
            None
        }
        None => None,
    };
    write_results(
        &tab,
        stdout_summary,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )?;

    if let Some(reference) = args.reference.as_deref() {
        check_summary(&summary, reference)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const ELECTOWIKI_BALLOTS: &str = include_str!("../testdata/electowiki_ballots.txt");

    fn testdata(name: &str) -> String {
        format!("{}/testdata/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn args_for(config: Option<String>, reference: Option<String>) -> Args {
        Args {
            config,
            reference,
            out: None,
            input: None,
            verbose: false,
        }
    }

    #[test]
    fn prints_invalid_ballots_and_ranking() {
        let mut output: Vec<u8> = Vec::new();
        let mut err_output: Vec<u8> = Vec::new();

        let tab = run(
            Cursor::new(ELECTOWIKI_BALLOTS),
            None,
            &mut output,
            &mut err_output,
        )
        .unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "E\nA\nC\nB\nD\n");
        assert_eq!(
            String::from_utf8(err_output).unwrap(),
            "ERROR [Line 12]: cyclic vote detected: cannot reference candidate A twice in a vote\n"
        );
        assert_eq!(tab.num_ballots, 45);
    }

    #[test]
    fn registered_candidates_reject_unknown_names() {
        let candidates = vec!["alice".to_string(), "bob".to_string()];
        let mut output: Vec<u8> = Vec::new();
        let mut err_output: Vec<u8> = Vec::new();

        run(
            Cursor::new("bob,alice\nalice,zoe\n\nbob\n"),
            Some(candidates.as_slice()),
            &mut output,
            &mut err_output,
        )
        .unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "BOB\nALICE\n");
        assert_eq!(
            String::from_utf8(err_output).unwrap(),
            "ERROR [Line 2]: could not parse candidate ID: unknown candidate ZOE\n"
        );
    }

    #[test]
    fn empty_input() {
        let mut output: Vec<u8> = Vec::new();
        let mut err_output: Vec<u8> = Vec::new();
        let tab = run(Cursor::new(""), None, &mut output, &mut err_output).unwrap();
        assert!(output.is_empty());
        assert!(err_output.is_empty());
        assert!(tab.result.ranking.is_empty());
    }

    #[test]
    fn summary_on_stdout_replaces_the_ranking() {
        let tab = tabulate(Cursor::new("a,b\nb,b\na\n"), None).unwrap();
        let summary = serde_json::to_string_pretty(&build_summary_js("Test", &tab)).unwrap();
        let mut output: Vec<u8> = Vec::new();
        let mut err_output: Vec<u8> = Vec::new();

        write_results(&tab, Some(&summary), &mut output, &mut err_output).unwrap();

        let printed: JSValue = serde_json::from_slice(&output).unwrap();
        assert_eq!(printed["results"]["ranking"], json!(["A", "B"]));
        assert_eq!(
            String::from_utf8(err_output).unwrap(),
            "ERROR [Line 2]: cyclic vote detected: cannot reference candidate B twice in a vote\n"
        );
    }

    #[test]
    fn summary_matches_reference() {
        let tab = tabulate(Cursor::new(ELECTOWIKI_BALLOTS), None).unwrap();
        let summary = build_summary_js("Electowiki example", &tab);
        assert_eq!(summary["results"]["ranking"], json!(["E", "A", "C", "B", "D"]));
        assert_eq!(summary["results"]["pairwise"]["E"]["D"], json!(31));
        assert_eq!(summary["results"]["strongestPaths"]["A"]["B"], json!(28));
        assert!(check_summary(&summary, &testdata("electowiki_summary.json")).is_ok());

        let other = build_summary_js("Another contest", &tab);
        assert!(check_summary(&other, &testdata("electowiki_summary.json")).is_err());
    }

    #[test]
    fn election_from_config() {
        let args = args_for(
            Some(testdata("electowiki_config.json")),
            Some(testdata("electowiki_summary.json")),
        );
        let res = run_election(&args);
        assert!(res.is_ok(), "{:?}", res);
    }

    #[test]
    fn missing_config() {
        let args = args_for(Some(testdata("no_such_config.json")), None);
        assert!(matches!(
            run_election(&args),
            Err(CliError::OpeningJson { .. })
        ));
    }
}
