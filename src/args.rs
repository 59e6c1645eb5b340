use clap::Parser;

/// This is a survey tabulation and charting program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON survey export to analyze. Defaults to Encuesta.json
    /// in the working directory.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (list of comma-separated question identifiers) The questions for which a
    /// chart image is produced. Every question is always printed to the console.
    #[clap(long, value_parser, use_value_delimiter = true)]
    pub charts: Option<Vec<String>>,

    /// (directory path) The directory where the chart images are written. It is
    /// created if missing. Defaults to 'graficos'.
    #[clap(long, value_parser)]
    pub output_dir: Option<String>,

    /// If passed as an argument, no chart images are produced.
    #[clap(long, takes_value = false)]
    pub no_charts: bool,

    /// (file path, 'stdout' or empty) If specified, the summary of the survey will
    /// be written in JSON format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing a survey summary in JSON format. If
    /// provided, surveyrpt will check that the tabulated output matches the
    /// reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
