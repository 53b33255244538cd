use anyhow::{Context, bail};
use clap::Parser;
use core::time::Duration;
use docket::{AllocatorConfig, MAX_SEQUENCE, MIN_SEQUENCE, RetryPolicy};

/// Command-line and environment configuration for `docket-preview`.
///
/// Every option can also be set through the environment (or a `.env` file),
/// which makes it easy to replay a production configuration locally.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "docket-preview",
    version,
    about = "Preview and claim YYYYSSS case numbers against an in-memory store"
)]
pub struct CliArgs {
    /// Sequence numbers already in use this year, as a comma separated list
    /// of numbers and inclusive ranges.
    ///
    /// Example: "1-41,43,45-50"
    ///
    /// Environment variable: `DOCKET_USED`
    #[arg(long, env = "DOCKET_USED", default_value_t = String::new())]
    pub used: String,

    /// Number of cases to claim after the first preview.
    ///
    /// Environment variable: `DOCKET_CLAIMS`
    #[arg(long, env = "DOCKET_CLAIMS", default_value_t = 0)]
    pub claims: usize,

    /// Pretend the calendar says this year instead of reading the clock.
    ///
    /// Environment variable: `DOCKET_YEAR`
    #[arg(long, env = "DOCKET_YEAR")]
    pub year: Option<u16>,

    /// First accepted case year.
    ///
    /// Environment variable: `DOCKET_MIN_YEAR`
    #[arg(long, env = "DOCKET_MIN_YEAR", default_value_t = docket::DEFAULT_MIN_YEAR)]
    pub min_year: u16,

    /// Last accepted case year.
    ///
    /// Environment variable: `DOCKET_MAX_YEAR`
    #[arg(long, env = "DOCKET_MAX_YEAR", default_value_t = docket::DEFAULT_MAX_YEAR)]
    pub max_year: u16,

    /// Lifetime of a cached preview, in seconds.
    ///
    /// Environment variable: `DOCKET_CACHE_TTL_SECS`
    #[arg(long, env = "DOCKET_CACHE_TTL_SECS", default_value_t = 30)]
    pub cache_ttl_secs: u64,

    /// Numbers point-read after the watermark before falling back to a full
    /// scan.
    ///
    /// Environment variable: `DOCKET_PROBE_BUDGET`
    #[arg(long, env = "DOCKET_PROBE_BUDGET", default_value_t = docket::DEFAULT_PROBE_BUDGET)]
    pub probe_budget: u16,

    /// Attempts per storage call before giving up.
    ///
    /// Environment variable: `DOCKET_RETRY_ATTEMPTS`
    #[arg(long, env = "DOCKET_RETRY_ATTEMPTS", default_value_t = docket::DEFAULT_MAX_ATTEMPTS)]
    pub retry_attempts: u32,

    /// Backoff unit between attempts, in milliseconds. Attempt `n` waits
    /// `n` units.
    ///
    /// Environment variable: `DOCKET_RETRY_BASE_DELAY_MS`
    #[arg(long, env = "DOCKET_RETRY_BASE_DELAY_MS", default_value_t = 1000)]
    pub retry_base_delay_ms: u64,

    /// Rely on the change subscription alone instead of re-querying the
    /// watermark on every preview.
    #[arg(long, default_value_t = false)]
    pub watch_only: bool,

    /// Skip the record count that detects gaps below the watermark.
    #[arg(long, default_value_t = false)]
    pub no_gap_check: bool,
}

#[derive(Debug, Clone)]
pub struct PreviewConfig {
    pub allocator: AllocatorConfig,
    pub year: Option<u16>,
    pub used: Vec<u16>,
    pub claims: usize,
}

impl TryFrom<CliArgs> for PreviewConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.min_year > args.max_year {
            bail!(
                "DOCKET_MIN_YEAR ({}) must not exceed DOCKET_MAX_YEAR ({})",
                args.min_year,
                args.max_year
            );
        }
        if !(1000..=9999).contains(&args.min_year) || !(1000..=9999).contains(&args.max_year) {
            bail!("case years must have four digits");
        }
        if let Some(year) = args.year {
            if !(args.min_year..=args.max_year).contains(&year) {
                bail!(
                    "DOCKET_YEAR ({year}) is outside {}..={}",
                    args.min_year,
                    args.max_year
                );
            }
        }
        if args.probe_budget == 0 {
            bail!("DOCKET_PROBE_BUDGET must be greater than 0");
        }
        if args.retry_attempts == 0 {
            bail!("DOCKET_RETRY_ATTEMPTS must be greater than 0");
        }

        let used = parse_used(&args.used).context("invalid DOCKET_USED")?;
        let allocator = AllocatorConfig::default()
            .with_years(args.min_year..=args.max_year)
            .with_cache_ttl(Duration::from_secs(args.cache_ttl_secs))
            .with_probe_budget(args.probe_budget)
            .with_retry(RetryPolicy::new(
                args.retry_attempts,
                Duration::from_millis(args.retry_base_delay_ms),
            ))
            .with_refresh_on_preview(!args.watch_only)
            .with_detect_gaps(!args.no_gap_check);

        Ok(Self {
            allocator,
            year: args.year,
            used,
            claims: args.claims,
        })
    }
}

/// Parses `"1-41,43"` into the listed sequence numbers, sorted and without
/// duplicates.
pub fn parse_used(list: &str) -> anyhow::Result<Vec<u16>> {
    let mut used = Vec::new();
    for item in list.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        let (first, last) = match item.split_once('-') {
            Some((first, last)) => (parse_sequence(first)?, parse_sequence(last)?),
            None => {
                let sequence = parse_sequence(item)?;
                (sequence, sequence)
            }
        };
        if first > last {
            bail!("range {item:?} is reversed");
        }
        used.extend(first..=last);
    }
    used.sort_unstable();
    used.dedup();
    Ok(used)
}

fn parse_sequence(s: &str) -> anyhow::Result<u16> {
    let sequence: u16 = s
        .trim()
        .parse()
        .with_context(|| format!("{s:?} is not a sequence number"))?;
    if !(MIN_SEQUENCE..=MAX_SEQUENCE).contains(&sequence) {
        bail!("sequence {sequence} is outside {MIN_SEQUENCE}..={MAX_SEQUENCE}");
    }
    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["docket-preview"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn parses_numbers_and_ranges() {
        assert_eq!(parse_used("").unwrap(), Vec::<u16>::new());
        assert_eq!(parse_used("3, 1-2 ,2").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_used("1-41,43").unwrap().len(), 42);
    }

    #[test]
    fn rejects_bad_lists() {
        for bad in ["0", "1000", "5-3", "a", "1-", "-4", "1-2-3"] {
            assert!(parse_used(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn defaults_match_the_library() {
        let config = PreviewConfig::try_from(args(&[])).unwrap();
        assert_eq!(config.allocator, AllocatorConfig::default());
        assert_eq!(config.claims, 0);
        assert!(config.used.is_empty());
    }

    #[test]
    fn validates_years() {
        assert!(PreviewConfig::try_from(args(&["--min-year", "2030", "--max-year", "2024"])).is_err());
        assert!(PreviewConfig::try_from(args(&["--year", "2031"])).is_err());
        let config = PreviewConfig::try_from(args(&["--year", "2025", "--watch-only"])).unwrap();
        assert_eq!(config.year, Some(2025));
        assert!(!config.allocator.refresh_on_preview());
    }
}
