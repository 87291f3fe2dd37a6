use crate::proto::bid::{Ad, BidRequest, TemplateParameter};
use crate::render::macros::tokens;
use crate::validate::ad::validate_click_through_urls;
use crate::validate::issue::{IssueKind, ValidationIssue};
use std::collections::BTreeSet;

const MIN_PLACEHOLDERS: usize = 2;
const MAX_PLACEHOLDERS: usize = 4;
const MIN_EXTENT: i32 = 10;

/// Validates a template ad: placeholder grammar, parameter layout and
/// rectangle geometry against the targeted slot's dimensions.
pub fn validate_template_ad(
    ad: &Ad,
    ad_index: usize,
    request: &BidRequest,
    problems: &mut Vec<ValidationIssue>,
) {
    if ad.snippet_template.is_none() || ad.template_parameter.is_empty() {
        problems.push(ValidationIssue::ad(
            IssueKind::TemplateAndParametersRequired,
            ad_index,
        ));
    }

    let template = ad.snippet_template.as_deref().unwrap_or("");
    let placeholder_count = validate_placeholders(template, ad_index, problems);
    validate_parameter_layout(&ad.template_parameter, placeholder_count, ad_index, problems);

    if ad.buyer_creative_id.is_some() {
        problems.push(ValidationIssue::ad(IssueKind::CreativeIdInAd, ad_index));
    }
    if !ad.click_through_url.is_empty() {
        problems.push(ValidationIssue::ad(IssueKind::ClickUrlInAd, ad_index));
    }

    // Slot dimensions come from the first targeted adslot only.
    let dimensions = ad
        .adslot
        .first()
        .and_then(|slot| slot.id)
        .and_then(|id| request.find_adslot(id))
        .and_then(|slot| match (slot.width, slot.height) {
            (Some(w), Some(h)) if w != 0 && h != 0 => Some((w, h)),
            _ => None,
        });

    validate_parameters(&ad.template_parameter, dimensions, ad_index, problems);

    if request.video.is_some() {
        problems.push(ValidationIssue::ad(
            IssueKind::TemplateAdForVideoRequest,
            ad_index,
        ));
    }
}

/// Checks the `%%P<digits>%%` grammar and returns the distinct
/// placeholder count, which the parameter list must match.
fn validate_placeholders(
    template: &str,
    ad_index: usize,
    problems: &mut Vec<ValidationIssue>,
) -> usize {
    let mut indices = BTreeSet::new();
    let mut non_integer = Vec::new();
    for token in tokens(template) {
        let Some(rest) = token.name.strip_prefix('P') else {
            continue;
        };
        match rest.parse::<usize>() {
            Ok(index) => {
                indices.insert(index);
            }
            Err(_) => non_integer.push(token.raw.to_string()),
        }
    }

    let count = indices.len() + non_integer.len();
    if count < MIN_PLACEHOLDERS {
        problems.push(ValidationIssue::ad_detail(
            IssueKind::TooFewPlaceholders,
            ad_index,
            count.to_string(),
        ));
    }
    if count > MAX_PLACEHOLDERS {
        problems.push(ValidationIssue::ad_detail(
            IssueKind::TooManyPlaceholders,
            ad_index,
            count.to_string(),
        ));
    }

    if !non_integer.is_empty() {
        for literal in non_integer {
            problems.push(ValidationIssue::ad_detail(
                IssueKind::NonIntegerPlaceholder,
                ad_index,
                literal,
            ));
        }
    } else if indices.iter().enumerate().any(|(expected, &index)| expected != index) {
        problems.push(ValidationIssue::ad(
            IssueKind::NonConsecutivePlaceholders,
            ad_index,
        ));
    }

    indices.len()
}

/// Regular parameters must form a contiguous prefix and match the
/// placeholder count; backup references must point at a real index.
fn validate_parameter_layout(
    parameters: &[TemplateParameter],
    placeholder_count: usize,
    ad_index: usize,
    problems: &mut Vec<ValidationIssue>,
) {
    let mut seen_backup = false;
    let mut regular = 0usize;
    for parameter in parameters {
        match parameter.backup_index {
            Some(reference) => {
                seen_backup = true;
                if reference < 0 || reference as usize >= placeholder_count {
                    problems.push(ValidationIssue::ad_detail(
                        IssueKind::InvalidBackupReference,
                        ad_index,
                        reference.to_string(),
                    ));
                }
            }
            None => {
                regular += 1;
                if seen_backup {
                    problems.push(ValidationIssue::ad(IssueKind::BackupNotAtEnd, ad_index));
                }
            }
        }
    }

    if regular != placeholder_count {
        problems.push(ValidationIssue::ad(IssueKind::ParameterCountMismatch, ad_index));
    }
}

fn validate_parameters(
    parameters: &[TemplateParameter],
    dimensions: Option<(i32, i32)>,
    ad_index: usize,
    problems: &mut Vec<ValidationIssue>,
) {
    let mut overlap_reported = false;
    for (index, parameter) in parameters.iter().enumerate() {
        if parameter.buyer_creative_id.is_none() {
            problems.push(ValidationIssue::ad(
                IssueKind::MissingParameterCreativeId,
                ad_index,
            ));
        }
        if parameter.parameter_value.is_none() {
            problems.push(ValidationIssue::ad(IssueKind::MissingParameterValue, ad_index));
        }

        validate_click_through_urls(
            std::iter::once(parameter.click_through_url.as_deref().unwrap_or("")),
            ad_index,
            problems,
        );

        if !parameter.has_bounds() {
            problems.push(ValidationIssue::ad(IssueKind::MissingBounds, ad_index));
        } else if out_of_bounds(parameter, dimensions) {
            problems.push(ValidationIssue::ad_detail(
                IssueKind::InvalidDimensions,
                ad_index,
                format!(
                    "{}/{}/{}/{}",
                    parameter.left.unwrap_or(0),
                    parameter.right.unwrap_or(0),
                    parameter.bottom.unwrap_or(0),
                    parameter.top.unwrap_or(0),
                ),
            ));
        } else if !parameter.is_backup() && !overlap_reported {
            // One conflict is enough; stop the pairwise scan for this ad.
            if parameters[..index]
                .iter()
                .filter(|other| !other.is_backup())
                .any(|other| rectangles_overlap(parameter, other))
            {
                problems.push(ValidationIssue::ad(
                    IssueKind::MustStackInOneDimension,
                    ad_index,
                ));
                overlap_reported = true;
            }
        }
    }
}

fn out_of_bounds(parameter: &TemplateParameter, dimensions: Option<(i32, i32)>) -> bool {
    let Some((width, height)) = dimensions else {
        return false;
    };
    let left = parameter.left.unwrap_or(0);
    let right = parameter.right.unwrap_or(0);
    let top = parameter.top.unwrap_or(0);
    let bottom = parameter.bottom.unwrap_or(0);
    left < 0
        || right > width
        || top > height
        || bottom < 0
        || right - left < MIN_EXTENT
        || top - bottom < MIN_EXTENT
}

/// Axis-aligned intersection; touching edges do not overlap.
fn rectangles_overlap(a: &TemplateParameter, b: &TemplateParameter) -> bool {
    a.right.unwrap_or(0) > b.left.unwrap_or(0)
        && b.right.unwrap_or(0) > a.left.unwrap_or(0)
        && a.top.unwrap_or(0) > b.bottom.unwrap_or(0)
        && b.top.unwrap_or(0) > a.bottom.unwrap_or(0)
}
