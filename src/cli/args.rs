use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "riskroster",
    version,
    about = "terminal roster for client credit scoring",
    long_about = "riskroster browses a paginated client roster, scores the selected client and explains the score with its top attribution factors.\n\nExamples:\n  riskroster -u http://scoring.internal:8080\n  riskroster -u http://scoring.internal:8080 --page-size 50 --locale en\n  riskroster --config ~/.riskroster/config.yml\n\nTip: Use --config to persist the service URL and field labels."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv). RUST_LOG takes precedence."
    )]
    pub verbose: u8,

    #[arg(
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        long = "lc",
        visible_alias = "locale",
        value_name = "LOCALE",
        help_heading = "Output",
        help = "Number and currency locale (ru, en)."
    )]
    pub locale: Option<String>,

    #[arg(
        short = 'u',
        long = "u",
        visible_alias = "url",
        value_name = "URL",
        help_heading = "Service",
        help = "Base URL of the scoring service."
    )]
    pub url: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Service",
        help = "Path to config file (defaults to ~/.riskroster/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "Service",
        help = "Request timeout in seconds (0 = no timeout)."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "Service",
        help = "HTTP proxy for service requests."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'H',
        long = "hd",
        visible_alias = "header",
        value_name = "HEADER",
        help_heading = "Service",
        help = "Extra request header as \"Key: Value\"."
    )]
    pub header: Option<String>,

    #[arg(
        short = 's',
        long = "ps",
        visible_alias = "page-size",
        value_name = "N",
        help_heading = "Roster",
        help = "Clients per page."
    )]
    pub page_size: Option<u32>,

    #[arg(
        long = "hf",
        visible_alias = "history-file",
        value_name = "FILE",
        help_heading = "Roster",
        help = "Where recently viewed clients are kept (defaults to ~/.riskroster/history.json)."
    )]
    pub history_file: Option<String>,
}
