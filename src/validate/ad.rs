use crate::proto::bid::{Ad, AdSlot, BidRequest};
use crate::validate::issue::{IssueKind, ValidationIssue};
use crate::validate::template::validate_template_ad;
use url::Url;

/// What the classifier needs to know after validating one ad.
pub struct AdVerdict {
    pub targets_no_adslots: bool,
    pub adslot_problems: bool,
}

/// Validates one returned ad against the originating request, appending
/// any rule violations. Violations are additive; none stops the rest of
/// the ad from being checked.
pub fn validate_ad(
    ad: &Ad,
    ad_index: usize,
    request: &BidRequest,
    problems: &mut Vec<ValidationIssue>,
) -> AdVerdict {
    let creative_forms = [
        ad.html_snippet.is_some(),
        ad.video_url.is_some(),
        ad.snippet_template.is_some(),
    ]
    .iter()
    .filter(|set| **set)
    .count();

    if creative_forms == 0 {
        problems.push(ValidationIssue::ad(IssueKind::NoCreativeType, ad_index));
    } else if creative_forms > 1 {
        problems.push(ValidationIssue::ad(IssueKind::MultipleCreativeTypes, ad_index));
    }

    if let Some(video_url) = ad.video_url.as_deref() {
        validate_video_ad(video_url, ad_index, request, problems);
    }

    if ad.html_snippet.is_some() {
        validate_html_ad(ad, ad_index, request, problems);
    }

    if ad.snippet_template.is_some() || !ad.template_parameter.is_empty() {
        validate_template_ad(ad, ad_index, request, problems);
    }

    let targets_no_adslots = ad.adslot.is_empty();
    if targets_no_adslots {
        problems.push(ValidationIssue::ad(IssueKind::NoAdslotsTargeted, ad_index));
    }

    let mut adslot_problems = false;
    for (adslot_index, adslot) in ad.adslot.iter().enumerate() {
        adslot_problems |= validate_adslot(adslot, ad_index, adslot_index, request, problems);
    }

    AdVerdict {
        targets_no_adslots,
        adslot_problems,
    }
}

fn validate_video_ad(
    video_url: &str,
    ad_index: usize,
    request: &BidRequest,
    problems: &mut Vec<ValidationIssue>,
) {
    if !is_valid_http_url(video_url) {
        problems.push(ValidationIssue::ad_detail(
            IssueKind::InvalidVideoUrl,
            ad_index,
            video_url,
        ));
    }
    if request.video.is_none() {
        problems.push(ValidationIssue::ad(
            IssueKind::VideoAdForNonVideoRequest,
            ad_index,
        ));
    }
}

fn validate_html_ad(
    ad: &Ad,
    ad_index: usize,
    request: &BidRequest,
    problems: &mut Vec<ValidationIssue>,
) {
    if ad.html_snippet.as_deref().is_some_and(str::is_empty) {
        problems.push(ValidationIssue::ad(IssueKind::EmptySnippet, ad_index));
    }
    validate_click_through_urls(
        ad.click_through_url.iter().map(String::as_str),
        ad_index,
        problems,
    );
    if request.video.is_some() {
        problems.push(ValidationIssue::ad(IssueKind::HtmlAdForVideoRequest, ad_index));
    }
}

/// At least one click-through URL, each with an http/https scheme and a
/// non-empty host. One issue per malformed URL, carrying the value.
pub fn validate_click_through_urls<'a, I>(
    urls: I,
    ad_index: usize,
    problems: &mut Vec<ValidationIssue>,
) where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = 0;
    for url in urls {
        seen += 1;
        if !is_valid_http_url(url) {
            problems.push(ValidationIssue::ad_detail(
                IssueKind::InvalidClickThroughUrl,
                ad_index,
                url,
            ));
        }
    }
    if seen == 0 {
        problems.push(ValidationIssue::ad(IssueKind::NoClickThroughUrls, ad_index));
    }
}

pub fn is_valid_http_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(parsed) => {
            (parsed.scheme() == "http" || parsed.scheme() == "https")
                && parsed.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

fn validate_adslot(
    adslot: &AdSlot,
    ad_index: usize,
    adslot_index: usize,
    request: &BidRequest,
    problems: &mut Vec<ValidationIssue>,
) -> bool {
    let mut found = false;

    if adslot.max_cpm_micros.unwrap_or(0) == 0 {
        problems.push(ValidationIssue::adslot(IssueKind::ZeroBid, ad_index, adslot_index));
        found = true;
    }

    if let Some(min) = adslot.min_cpm_micros {
        if min == 0 {
            problems.push(ValidationIssue::adslot(
                IssueKind::ZeroMinBid,
                ad_index,
                adslot_index,
            ));
            found = true;
        } else if min >= adslot.max_cpm_micros.unwrap_or(0) {
            problems.push(ValidationIssue::adslot(
                IssueKind::MinNotBelowMax,
                ad_index,
                adslot_index,
            ));
            found = true;
        }
    }

    let known = adslot
        .id
        .is_some_and(|id| request.find_adslot(id).is_some());
    if !known {
        problems.push(ValidationIssue::adslot(
            IssueKind::InvalidSlotId,
            ad_index,
            adslot_index,
        ));
        found = true;
    }

    found
}
