use clap::Parser;

/// This is a Condorcet election tabulation program, using the Schulze method.
///
/// The ballots are read from the standard input (or from the file given with --input),
/// one ballot per line. The ranking is printed with one candidate per line.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the election: contest name, registered
    /// candidates, input and output files.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the summary of an election in JSON format. If provided,
    /// condorcli will check that the tabulated summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. With 'stdout', the summary is printed instead of the ranking. Setting this option
    /// overrides the path that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The file containing the ballots. If not specified, the ballots are read
    /// from the standard input. Setting this option overrides what may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
