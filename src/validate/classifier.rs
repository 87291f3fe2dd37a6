use crate::capture::record::Record;
use crate::proto::bid::BidResponse;
use crate::render::snippet::SnippetRenderer;
use crate::validate::ad::validate_ad;
use crate::validate::issue::{IssueKind, ValidationIssue};
use rand::Rng;

const OK_STATUS: u16 = 200;

/// The complete severity taxonomy. Every record lands in exactly one
/// bucket, assigned once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Good,
    Problematic,
    Invalid,
    Error,
}

#[derive(Debug, Default, Clone)]
pub struct RunStats {
    pub requests_sent: usize,
    pub responses_ok: usize,
    pub no_bid_responses: usize,
    pub processing_time_sum_ms: i64,
    pub processing_time_count: usize,
}

impl RunStats {
    /// Average over the records that declared the metric; None when no
    /// record did.
    pub fn average_processing_time_ms(&self) -> Option<f64> {
        if self.processing_time_count == 0 {
            return None;
        }
        Some(self.processing_time_sum_ms as f64 / self.processing_time_count as f64)
    }
}

pub struct Classification {
    pub good: Vec<Record>,
    pub problematic: Vec<Record>,
    pub invalid: Vec<Record>,
    pub error: Vec<Record>,
    pub stats: RunStats,
}

/// Drives the per-record decision sequence over a sealed snapshot:
/// transport status, payload decode, schema completeness, then field
/// validation. Runs synchronously over however many records were logged.
pub struct Classifier<R: Rng> {
    renderer: SnippetRenderer<R>,
}

impl<R: Rng> Classifier<R> {
    pub fn new(renderer: SnippetRenderer<R>) -> Self {
        Self { renderer }
    }

    pub fn classify(mut self, records: Vec<Record>) -> Classification {
        let mut classification = Classification {
            good: Vec::new(),
            problematic: Vec::new(),
            invalid: Vec::new(),
            error: Vec::new(),
            stats: RunStats::default(),
        };
        for mut record in records {
            let bucket = self.classify_record(&mut record, &mut classification.stats);
            match bucket {
                Bucket::Good => classification.good.push(record),
                Bucket::Problematic => classification.problematic.push(record),
                Bucket::Invalid => classification.invalid.push(record),
                Bucket::Error => classification.error.push(record),
            }
        }
        classification
    }

    fn classify_record(&mut self, record: &mut Record, stats: &mut RunStats) -> Bucket {
        stats.requests_sent += 1;

        if record.status != OK_STATUS {
            record
                .problems
                .push(ValidationIssue::response(IssueKind::NonOkStatus));
            return Bucket::Error;
        }
        stats.responses_ok += 1;

        if record.payload.is_empty() {
            record
                .problems
                .push(ValidationIssue::response(IssueKind::EmptyPayload));
            return Bucket::Invalid;
        }

        let response = match BidResponse::decode(&record.payload) {
            Ok(response) => response,
            Err(_) => {
                record
                    .problems
                    .push(ValidationIssue::response(IssueKind::DecodeFailure));
                return Bucket::Invalid;
            }
        };

        if !response.is_complete() {
            record
                .problems
                .push(ValidationIssue::response(IssueKind::IncompleteResponse));
            return Bucket::Invalid;
        }

        let mut problems = Vec::new();
        match response.processing_time_ms {
            Some(ms) => {
                stats.processing_time_sum_ms += ms;
                stats.processing_time_count += 1;
            }
            None => problems.push(ValidationIssue::response(IssueKind::NoProcessingTime)),
        }

        if record.request.is_ping {
            if !response.ad.is_empty() {
                problems.push(ValidationIssue::response(IssueKind::AdsInPingResponse));
            }
        } else if response.ad.is_empty() {
            stats.no_bid_responses += 1;
        } else {
            for (ad_index, ad) in response.ad.iter().enumerate() {
                let verdict = validate_ad(ad, ad_index, &record.request, &mut problems);
                if verdict.targets_no_adslots {
                    stats.no_bid_responses += 1;
                }

                let renderable = ad
                    .html_snippet
                    .as_deref()
                    .is_some_and(|snippet| !snippet.is_empty())
                    && !verdict.adslot_problems;
                if renderable {
                    if let Some(rendered) =
                        self.renderer
                            .render(ad, ad_index, &record.request, &mut problems)
                    {
                        record.rendered_snippets.insert(ad_index, rendered);
                    }
                }
            }
        }

        record.response = Some(response);
        record.problems = problems;
        if record.problems.is_empty() {
            Bucket::Good
        } else {
            Bucket::Problematic
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::bid::{BidRequest, RequestAdSlot};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn classifier() -> Classifier<StdRng> {
        Classifier::new(SnippetRenderer::new(StdRng::seed_from_u64(1), None))
    }

    fn request() -> BidRequest {
        BidRequest {
            id: "r".to_string(),
            url: "http://www.publisher.test/".to_string(),
            adslot: vec![RequestAdSlot {
                id: 1,
                width: Some(300),
                height: Some(250),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn non_ok_status_is_error_with_one_problem() {
        let record = Record::new(request(), 503, b"ignored".to_vec());
        let result = classifier().classify(vec![record]);
        assert_eq!(result.error.len(), 1);
        assert_eq!(result.error[0].problems.len(), 1);
        assert_eq!(result.error[0].problems[0].kind, IssueKind::NonOkStatus);
        assert_eq!(result.stats.responses_ok, 0);
    }

    #[test]
    fn empty_payload_is_invalid_with_one_problem() {
        let record = Record::new(request(), 200, Vec::new());
        let result = classifier().classify(vec![record]);
        assert_eq!(result.invalid.len(), 1);
        assert_eq!(result.invalid[0].problems.len(), 1);
        assert_eq!(result.invalid[0].problems[0].kind, IssueKind::EmptyPayload);
    }

    #[test]
    fn undecodable_payload_is_invalid() {
        let record = Record::new(request(), 200, b"\xffnot json".to_vec());
        let result = classifier().classify(vec![record]);
        assert_eq!(result.invalid.len(), 1);
        assert_eq!(result.invalid[0].problems[0].kind, IssueKind::DecodeFailure);
    }

    #[test]
    fn incomplete_response_is_invalid() {
        let payload = br#"{"processing_time_ms":3,"ad":[{"adslot":[{"id":1}]}]}"#.to_vec();
        let record = Record::new(request(), 200, payload);
        let result = classifier().classify(vec![record]);
        assert_eq!(result.invalid.len(), 1);
        assert_eq!(
            result.invalid[0].problems[0].kind,
            IssueKind::IncompleteResponse
        );
    }

    #[test]
    fn no_bid_response_is_good_and_counted() {
        let payload = br#"{"processing_time_ms":4,"ad":[]}"#.to_vec();
        let record = Record::new(request(), 200, payload);
        let result = classifier().classify(vec![record]);
        assert_eq!(result.good.len(), 1);
        assert!(result.good[0].problems.is_empty());
        assert_eq!(result.stats.no_bid_responses, 1);
    }

    #[test]
    fn ads_in_ping_response_are_problematic() {
        let mut request = request();
        request.is_ping = true;
        let payload = br#"{"processing_time_ms":4,"ad":[{"adslot":[{"id":1,"max_cpm_micros":100}]}]}"#
            .to_vec();
        let record = Record::new(request, 200, payload);
        let result = classifier().classify(vec![record]);
        assert_eq!(result.problematic.len(), 1);
        assert!(result.problematic[0]
            .problems
            .iter()
            .any(|p| p.kind == IssueKind::AdsInPingResponse));
    }

    #[test]
    fn missing_processing_time_is_a_soft_problem() {
        let payload = br#"{"ad":[]}"#.to_vec();
        let record = Record::new(request(), 200, payload);
        let result = classifier().classify(vec![record]);
        assert_eq!(result.problematic.len(), 1);
        assert_eq!(
            result.problematic[0].problems[0].kind,
            IssueKind::NoProcessingTime
        );
        assert_eq!(result.stats.processing_time_count, 0);
    }

    #[test]
    fn processing_time_averages_over_declaring_records_only() {
        let declared = |ms: i64| {
            Record::new(
                request(),
                200,
                format!(r#"{{"processing_time_ms":{ms},"ad":[]}}"#).into_bytes(),
            )
        };
        let silent = Record::new(request(), 200, br#"{"ad":[]}"#.to_vec());
        let result = classifier().classify(vec![declared(10), declared(20), silent]);
        assert_eq!(result.stats.processing_time_count, 2);
        assert_eq!(result.stats.average_processing_time_ms(), Some(15.0));
    }

    #[test]
    fn valid_html_ad_is_good_and_rendered() {
        let payload = br#"{
            "processing_time_ms": 7,
            "ad": [{
                "html_snippet": "<a href=\"%%CLICK_URL_UNESC%%https://advertiser.test/\">go</a>",
                "click_through_url": ["https://advertiser.test/"],
                "adslot": [{"id": 1, "max_cpm_micros": 20000}]
            }]
        }"#
        .to_vec();
        let record = Record::new(request(), 200, payload);
        let result = classifier().classify(vec![record]);
        assert_eq!(result.good.len(), 1, "problems: {:?}", result.good.first());
        assert!(result.good[0].rendered_snippets.contains_key(&0));
    }

    #[test]
    fn snippet_is_rendered_even_when_click_macro_missing() {
        let payload = br#"{
            "processing_time_ms": 7,
            "ad": [{
                "html_snippet": "<b>static creative</b>",
                "click_through_url": ["https://advertiser.test/"],
                "adslot": [{"id": 1, "max_cpm_micros": 20000}]
            }]
        }"#
        .to_vec();
        let record = Record::new(request(), 200, payload);
        let result = classifier().classify(vec![record]);
        assert_eq!(result.problematic.len(), 1);
        let record = &result.problematic[0];
        assert!(record
            .problems
            .iter()
            .any(|p| p.kind == IssueKind::ClickMacroMissing));
        assert!(record.rendered_snippets.contains_key(&0));
    }

    #[test]
    fn adslot_problems_suppress_rendering() {
        let payload = br#"{
            "processing_time_ms": 7,
            "ad": [{
                "html_snippet": "%%CLICK_URL_UNESC%%",
                "click_through_url": ["https://advertiser.test/"],
                "adslot": [{"id": 1, "max_cpm_micros": 0}]
            }]
        }"#
        .to_vec();
        let record = Record::new(request(), 200, payload);
        let result = classifier().classify(vec![record]);
        assert_eq!(result.problematic.len(), 1);
        assert!(result.problematic[0].rendered_snippets.is_empty());
    }
}
