use crate::election::*;

use snafu::prelude::*;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

/// The configuration of an election, as written in the JSON configuration file.
#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElectionConfig {
    #[serde(rename = "contestName")]
    pub contest_name: Option<String>,
    /// If provided, only these candidates are accepted in the ballots.
    pub candidates: Option<Vec<String>>,
    /// The file with the ballots, relative to the configuration file.
    pub input: Option<String>,
    /// Where to write the summary ('stdout' or a path relative to the configuration file).
    pub out: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub candidates: usize,
    pub ballots: usize,
    #[serde(rename = "invalidBallots")]
    pub invalid_ballots: usize,
}

pub fn read_config(path: &str) -> CliResult<ElectionConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ElectionConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

pub fn read_summary(path: &str) -> CliResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read content: {:?}", contents);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// Resolves a path of the configuration file against the directory of this file.
pub fn resolve_path(config_path: Option<&str>, path: &str) -> String {
    if path == "stdout" || Path::new(path).is_absolute() {
        return path.to_string();
    }
    match config_path.and_then(|p| Path::new(p).parent()) {
        Some(dir) => {
            let p: PathBuf = [dir, Path::new(path)].iter().collect();
            p.display().to_string()
        }
        None => path.to_string(),
    }
}
