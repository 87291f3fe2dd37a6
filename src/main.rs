use bidprobe::capture::sealed::RequestLog;
use bidprobe::config::Cli;
use bidprobe::generator::RequestGenerator;
use bidprobe::render::snippet::SnippetRenderer;
use bidprobe::report::Reporter;
use bidprobe::requester::{plan_tasks, Requester, StopCondition};
use bidprobe::sender::HttpSender;
use bidprobe::validate::classifier::Classifier;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    cli.validate()?;

    let sender = HttpSender::new(&cli.url)?;
    let log = Arc::new(RequestLog::new());
    let (tasks, interval) = plan_tasks(cli.num_tasks, cli.max_qps);
    tracing::info!(tasks, ?interval, url = %cli.url, "starting run");

    let mut handles = Vec::new();
    for _ in 0..tasks {
        let stop = match (cli.requests, cli.seconds) {
            (Some(requests), _) => StopCondition::Requests(requests / u64::from(tasks)),
            (None, Some(seconds)) => StopCondition::Deadline(Duration::from_secs(seconds)),
            (None, None) => unreachable!("validated by Cli::validate"),
        };
        let requester = Requester {
            generator: RequestGenerator::new(
                StdRng::from_entropy(),
                cli.video_proportion,
                cli.ping_proportion,
            ),
            sender: sender.clone(),
            log: Arc::clone(&log),
            interval,
            stop,
        };
        handles.push(tokio::spawn(requester.run()));
        if cli.task_interval > 0.0 {
            tokio::time::sleep(Duration::from_secs_f64(cli.task_interval)).await;
        }
    }
    for handle in handles {
        handle.await?;
    }

    log.seal();
    let records = log.snapshot()?;
    tracing::info!(records = records.len(), "run finished, classifying");

    let renderer = SnippetRenderer::new(StdRng::from_entropy(), cli.sample_encrypted_price.clone());
    let classification = Classifier::new(renderer).classify(records);

    let reporter = Reporter {
        output_dir: cli.output_dir.clone(),
    };
    let written = reporter.write_logs(&classification)?;
    for path in &written {
        tracing::info!(path = %path.display(), "wrote log file");
    }
    reporter.print_summary(&classification);
    Ok(())
}
