use crate::capture::record::Record;
use crate::validate::classifier::Classification;
use crate::validate::issue::{IssueKind, ValidationIssue};
use anyhow::Context;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Renders one issue as a human-readable line. The engine itself only
/// records tagged issues; all presentation lives here.
pub fn issue_message(issue: &ValidationIssue) -> String {
    let text = match issue.kind {
        IssueKind::NonOkStatus => "the HTTP response code was not 200/OK",
        IssueKind::EmptyPayload => "response is empty (0 bytes)",
        IssueKind::DecodeFailure => "response could not be decoded",
        IssueKind::IncompleteResponse => "response did not contain all required fields",
        IssueKind::NoProcessingTime => "response contains no processing time information",
        IssueKind::AdsInPingResponse => "response for ping message contains ads",
        IssueKind::NoCreativeType => {
            "none of html_snippet, video_url or snippet_template are set, exactly one must be set"
        }
        IssueKind::MultipleCreativeTypes => {
            "more than one of html_snippet, video_url and snippet_template are set, exactly one must be set"
        }
        IssueKind::InvalidVideoUrl => "invalid video_url",
        IssueKind::VideoAdForNonVideoRequest => {
            "returned a video ad when the request did not contain a video submessage"
        }
        IssueKind::HtmlAdForVideoRequest => {
            "returned an HTML ad when the request contained a video submessage"
        }
        IssueKind::TemplateAdForVideoRequest => {
            "returned a template ad when the request contained a video submessage"
        }
        IssueKind::EmptySnippet => "snippet is empty",
        IssueKind::NoAdslotsTargeted => "ad does not target any adslots",
        IssueKind::NoClickThroughUrls => "ad does not contain any click-through URLs",
        IssueKind::InvalidClickThroughUrl => "invalid click-through URL",
        IssueKind::InvalidSlotId => "adslot id is not present in the bid request",
        IssueKind::ZeroBid => "0 max CPM bid",
        IssueKind::ZeroMinBid => "0 min CPM bid",
        IssueKind::MinNotBelowMax => "min CPM >= max CPM",
        IssueKind::TemplateAndParametersRequired => {
            "template ads must declare both snippet_template and template_parameter"
        }
        IssueKind::TooFewPlaceholders => "template must have at least 2 placeholders, given",
        IssueKind::TooManyPlaceholders => "template must have at most 4 placeholders, given",
        IssueKind::NonIntegerPlaceholder => {
            "template placeholders must be %%PN%% where N is an integer, invalid"
        }
        IssueKind::NonConsecutivePlaceholders => {
            "template placeholders must be numbered 0..N-1, where N is the placeholder count"
        }
        IssueKind::ParameterCountMismatch => {
            "number of placeholders in the template must match the parameter count"
        }
        IssueKind::BackupNotAtEnd => "backup template parameters must be at the end",
        IssueKind::InvalidBackupReference => {
            "backup template parameters must reference a valid index, invalid"
        }
        IssueKind::CreativeIdInAd => "template ads must not declare a top-level buyer_creative_id",
        IssueKind::ClickUrlInAd => "template ads must not declare a top-level click_through_url",
        IssueKind::MissingParameterCreativeId => {
            "template parameters must declare buyer_creative_id"
        }
        IssueKind::MissingParameterValue => "template parameters must declare parameter_value",
        IssueKind::MissingBounds => {
            "template parameters must declare bounds (left, right, top, bottom)"
        }
        IssueKind::InvalidDimensions => {
            "template parameters must be at least 10 units long and wide and inside the slot, invalid given left/right/bottom/top"
        }
        IssueKind::MustStackInOneDimension => {
            "template parameters should stack either vertically or horizontally"
        }
        IssueKind::ClickMacroMissing => {
            "click URL macros missing (CLICK_URL_UNESC or CLICK_URL_ESC)"
        }
    };

    let mut line = match (issue.ad_index, issue.adslot_index) {
        (Some(ad), Some(slot)) => format!("Ad {ad}, adslot {slot}: {text}"),
        (Some(ad), None) => format!("Ad {ad}: {text}"),
        _ => text.to_string(),
    };
    if let Some(detail) = &issue.detail {
        line.push_str(": ");
        line.push_str(detail);
    }
    line
}

/// Writes per-bucket log files plus an HTML file of rendered snippets,
/// and prints the run summary.
pub struct Reporter {
    pub output_dir: PathBuf,
}

impl Reporter {
    /// Writes a file per non-empty bucket, named by the run timestamp.
    /// Returns the paths written.
    pub fn write_logs(&self, classification: &Classification) -> anyhow::Result<Vec<PathBuf>> {
        let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
        let mut written = Vec::new();

        if !classification.good.is_empty() {
            let path = self.output_dir.join(format!("good-{stamp}.log"));
            let mut out = String::from("=== Successful responses ===\n");
            for record in &classification.good {
                push_record(&mut out, record, false);
            }
            write_file(&path, &out)?;
            written.push(path);
        }

        if !classification.problematic.is_empty() {
            let path = self.output_dir.join(format!("problematic-{stamp}.log"));
            let mut out = String::from("=== Responses that decoded but had problems ===\n");
            for record in &classification.problematic {
                push_record(&mut out, record, true);
            }
            write_file(&path, &out)?;
            written.push(path);
        }

        if !classification.invalid.is_empty() {
            let path = self.output_dir.join(format!("invalid-{stamp}.log"));
            let mut out = String::from("=== Responses that failed to decode ===\n");
            for record in &classification.invalid {
                push_raw_record(&mut out, record);
            }
            write_file(&path, &out)?;
            written.push(path);
        }

        if !classification.error.is_empty() {
            let path = self.output_dir.join(format!("error-{stamp}.log"));
            let mut out =
                String::from("=== Requests that received a non-200 HTTP response ===\n");
            for record in &classification.error {
                push_raw_record(&mut out, record);
            }
            write_file(&path, &out)?;
            written.push(path);
        }

        let snippets = snippet_page(classification);
        if let Some(html) = snippets {
            let path = self.output_dir.join(format!("snippets-{stamp}.html"));
            write_file(&path, &html)?;
            written.push(path);
        }

        Ok(written)
    }

    pub fn print_summary(&self, classification: &Classification) {
        let stats = &classification.stats;
        println!("=== Summary of real-time bidding test ===");
        println!("Requests sent: {}", stats.requests_sent);
        println!("Responses with a 200/OK HTTP status: {}", stats.responses_ok);
        println!(
            "Responses with a non-200 HTTP status: {}",
            classification.error.len()
        );
        println!("Good responses (no problems found): {}", classification.good.len());
        println!(
            "Invalid (undecodable) responses with a 200/OK HTTP status: {}",
            classification.invalid.len()
        );
        println!(
            "Decodable responses with problems: {}",
            classification.problematic.len()
        );
        if let Some(average) = stats.average_processing_time_ms() {
            println!("Average processing time in milliseconds: {average:.1}");
        }
        if stats.requests_sent > 0 && stats.no_bid_responses == stats.requests_sent {
            println!("ERROR: none of the responses had bids!");
        }
    }
}

fn push_record(out: &mut String, record: &Record, with_problems: bool) {
    out.push_str("BidRequest:\n");
    out.push_str(&to_pretty_json(&record.request));
    out.push_str("\nBidResponse:\n");
    match &record.response {
        Some(response) => out.push_str(&to_pretty_json(response)),
        None => out.push_str("(none)"),
    }
    out.push('\n');
    if with_problems {
        out.push_str("Problems:\n");
        for problem in &record.problems {
            out.push('\t');
            out.push_str(&issue_message(problem));
            out.push('\n');
        }
    }
}

fn push_raw_record(out: &mut String, record: &Record) {
    out.push_str("BidRequest:\n");
    out.push_str(&to_pretty_json(&record.request));
    out.push_str(&format!("\nHTTP status: {}\n", record.status));
    out.push_str(&format!("Raw payload bytes: {:?}\n", record.payload));
}

fn to_pretty_json<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "(unserializable)".to_string())
}

/// Builds the snippet preview page, or None when no record rendered
/// anything. Each snippet is embedded as a base64 data iframe sized to
/// the matched request adslot.
fn snippet_page(classification: &Classification) -> Option<String> {
    let mut items = String::new();
    for record in classification
        .good
        .iter()
        .chain(classification.problematic.iter())
    {
        push_snippet_items(&mut items, record);
    }
    if items.is_empty() {
        return None;
    }

    let mut page = String::new();
    page.push_str("<html><head><title>Rendered snippets</title></head>\n");
    page.push_str("<body><h1>Rendered snippets</h1>\n");
    page.push_str("<p>The server returned the following renderable snippets:</p>\n<ul>\n");
    page.push_str(&items);
    page.push_str("</ul></body></html>\n");
    Some(page)
}

fn push_snippet_items(out: &mut String, record: &Record) {
    let Some(response) = &record.response else {
        return;
    };
    for (ad_index, snippet) in &record.rendered_snippets {
        let slot = response
            .ad
            .get(*ad_index)
            .and_then(|ad| ad.adslot.first())
            .and_then(|slot| slot.id)
            .and_then(|id| record.request.find_adslot(id));
        let Some(slot) = slot else {
            continue;
        };
        let (Some(width), Some(height)) = (slot.width, slot.height) else {
            continue;
        };
        out.push_str("<li>\n<h3>Bid request</h3>\n<pre>");
        out.push_str(&escape_html(&to_pretty_json(&record.request)));
        out.push_str("</pre>\n<h3>Bid response</h3>\n<pre>");
        out.push_str(&escape_html(&to_pretty_json(response)));
        out.push_str("</pre>\n<h3>Rendered snippet</h3>\n");
        out.push_str(&format!(
            "<iframe src=\"data:text/html;base64,\n{}\" width={} height={} \
             scrolling=no marginwidth=0 marginheight=0></iframe>\n</li>\n",
            BASE64.encode(snippet),
            width,
            height,
        ));
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("creating {}", path.display()))?;
    file.write_all(contents.as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}
