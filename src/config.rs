use clap::Parser;
use std::path::PathBuf;

/// Load-tests a real-time-bidding endpoint and validates every response
/// against the protocol's semantic rules.
#[derive(Debug, Clone, Parser)]
#[command(name = "bidprobe")]
pub struct Cli {
    /// URL of the bidder under test.
    #[arg(long)]
    pub url: String,

    /// Maximum overall queries per second.
    #[arg(long)]
    pub max_qps: u32,

    /// Total run duration in seconds. Specify exactly one of --seconds
    /// or --requests.
    #[arg(long)]
    pub seconds: Option<u64>,

    /// Total number of requests to send. Specify exactly one of
    /// --seconds or --requests.
    #[arg(long)]
    pub requests: Option<u64>,

    /// Maximum number of sender tasks; the actual count may be lower.
    #[arg(long, default_value_t = 20)]
    pub num_tasks: u32,

    /// Seconds to wait between task startups, for a gradual ramp-up.
    #[arg(long, default_value_t = 0.2)]
    pub task_interval: f64,

    /// Opaque encrypted price substituted for the winning-price macros
    /// when rendering snippets.
    #[arg(long)]
    pub sample_encrypted_price: Option<String>,

    /// Proportion of requests that are for in-stream video slots.
    #[arg(long, default_value_t = 0.1)]
    pub video_proportion: f64,

    /// Proportion of requests that are pings.
    #[arg(long, default_value_t = 0.01)]
    pub ping_proportion: f64,

    /// Directory the per-bucket log files are written into.
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

impl Cli {
    pub fn validate(&self) -> anyhow::Result<()> {
        match (self.seconds, self.requests) {
            (Some(_), Some(_)) | (None, None) => {
                anyhow::bail!("exactly one of --seconds and --requests must be given")
            }
            _ => {}
        }
        if self.max_qps == 0 {
            anyhow::bail!("--max-qps must be positive");
        }
        if !(0.0..=1.0).contains(&self.video_proportion)
            || !(0.0..=1.0).contains(&self.ping_proportion)
            || self.video_proportion + self.ping_proportion > 1.0
        {
            anyhow::bail!("--video-proportion and --ping-proportion must sum to at most 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(
            ["bidprobe", "--url", "http://bidder.test/bid", "--max-qps", "50"]
                .iter()
                .chain(args)
                .copied(),
        )
    }

    #[test]
    fn requires_exactly_one_stop_condition() {
        assert!(cli(&[]).validate().is_err());
        assert!(cli(&["--seconds", "10"]).validate().is_ok());
        assert!(cli(&["--requests", "100"]).validate().is_ok());
        assert!(cli(&["--seconds", "10", "--requests", "100"]).validate().is_err());
    }

    #[test]
    fn proportions_must_sum_to_at_most_one() {
        assert!(cli(&["--seconds", "10", "--video-proportion", "0.9", "--ping-proportion", "0.2"])
            .validate()
            .is_err());
    }
}
