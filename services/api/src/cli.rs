use crate::demo::{run_demo, DemoArgs};
use crate::infra::load_candidates;
use crate::server;
use clap::{Args, Parser, Subcommand};
use rewear_pos::config::{load_matching, parse_match_limit, parse_min_score};
use rewear_pos::error::AppError;
use rewear_pos::export::format_amount;
use rewear_pos::matching::{LevenshteinMatcher, MatchOptions, NameMatcher};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ReWear POS",
    about = "Run the ReWear second-hand point of sale or try its customer matcher",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Rank customers from a JSON file against a name
    Match(MatchArgs),
    /// Walk through digitizing a receipt against a seeded customer list
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

#[derive(Args, Debug)]
pub(crate) struct MatchArgs {
    /// First name as read from the receipt
    #[arg(long)]
    pub(crate) first: String,
    /// Last name as read from the receipt
    #[arg(long)]
    pub(crate) last: String,
    /// JSON array of customers with id, first_name, last_name and current_balance
    #[arg(long)]
    pub(crate) customers: PathBuf,
    /// Lowest score still listed (0.0 to 1.0); defaults to REWEAR_MATCH_MIN_SCORE
    #[arg(long, value_parser = min_score_arg)]
    pub(crate) min_score: Option<f64>,
    /// Maximum number of matches listed; defaults to REWEAR_MATCH_LIMIT
    #[arg(long, value_parser = limit_arg)]
    pub(crate) limit: Option<usize>,
}

fn min_score_arg(raw: &str) -> Result<f64, String> {
    parse_min_score(raw).ok_or_else(|| format!("'{raw}' is not a score between 0 and 1"))
}

fn limit_arg(raw: &str) -> Result<usize, String> {
    parse_match_limit(raw).ok_or_else(|| format!("'{raw}' is not a limit of at least 1"))
}

fn match_options(args: &MatchArgs, configured: MatchOptions) -> MatchOptions {
    MatchOptions {
        min_score: args.min_score.unwrap_or(configured.min_score),
        limit: args.limit.unwrap_or(configured.limit),
    }
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Match(args) => run_match(args),
        Command::Demo(args) => run_demo(args),
    }
}

fn run_match(args: MatchArgs) -> Result<(), AppError> {
    let candidates = load_candidates(&args.customers)?;

    let matcher = LevenshteinMatcher::new(match_options(&args, load_matching()?));
    let results = matcher.rank_matches(&args.first, &args.last, &candidates);

    println!(
        "{} {} against {} customers",
        args.first,
        args.last,
        candidates.len()
    );
    if results.is_empty() {
        println!("- no customer above {:.2}", matcher.options().min_score);
        return Ok(());
    }
    for result in &results {
        println!(
            "- {} {} ({}) | score {:.3} | {} | balance {}",
            result.first_name,
            result.last_name,
            result.customer_id,
            result.score,
            result.label().label(),
            format_amount(result.current_balance)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Cli, clap::Error> {
        let mut argv = vec![
            "rewear-pos",
            "match",
            "--first",
            "Maria",
            "--last",
            "Muster",
            "--customers",
            "kunden.json",
        ];
        argv.extend_from_slice(extra);
        Cli::try_parse_from(argv)
    }

    fn match_args(cli: Cli) -> MatchArgs {
        match cli.command {
            Some(Command::Match(args)) => args,
            other => panic!("expected match command, got {other:?}"),
        }
    }

    #[test]
    fn match_flags_are_range_checked() {
        assert!(parse(&["--limit", "0"]).is_err());
        assert!(parse(&["--min-score", "1.5"]).is_err());
        assert!(parse(&["--min-score", "-0.1"]).is_err());

        let args = match_args(parse(&["--limit", "3", "--min-score", "0.9"]).expect("valid flags"));
        assert_eq!(args.limit, Some(3));
        assert_eq!(args.min_score, Some(0.9));
    }

    #[test]
    fn configured_options_fill_missing_flags() {
        let configured = MatchOptions {
            min_score: 0.55,
            limit: 4,
        };

        let args = match_args(parse(&[]).expect("no flags"));
        assert_eq!(match_options(&args, configured), configured);

        let args = match_args(parse(&["--limit", "2"]).expect("limit flag"));
        let options = match_options(&args, configured);
        assert_eq!(options.limit, 2);
        assert_eq!(options.min_score, 0.55);
    }
}
