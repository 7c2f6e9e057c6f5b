use clap::Subcommand;

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Start the configured mode: the push loop or the pull server
    Run,
    /// Load and validate the settings, then print what was derived from them
    CheckConfig,
    /// Connect to the configured source and run a trivial query
    TestConn,
    /// Print the query text one extraction would run
    RenderQuery {
        /// Window start: YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS[.fff] or RFC 3339
        #[arg(long)]
        date_from: String,

        /// Window end, same forms as --date-from
        #[arg(long)]
        date_to: String,

        #[arg(long, default_value_t = 0, help = "Row offset")]
        from: usize,

        #[arg(long, help = "Page size; defaults to the configured pageSize")]
        count: Option<usize>,
    },
}
