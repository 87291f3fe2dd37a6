use crate::proto::bid::{Ad, BidRequest};
use crate::render::escape::escape_url;
use crate::render::macros::{substitute, tokens};
use crate::validate::issue::{IssueKind, ValidationIssue};
use rand::Rng;
use url::Url;

/// Redirect prefix substituted for the click-URL macros.
pub const CLICK_URL: &str = "http://ad.click.test/url?sa=D&q=";

/// Winning-price notifications are priced per impression, not per mille.
const WINNING_PRICE_RATIO: f64 = 0.33;

const CLICK_MACROS: &[&str] = &["CLICK_URL_UNESC", "CLICK_URL_ESC", "CLICK_URL_ESC_ESC"];

/// Macro-substitutes an HTML snippet into a human-inspectable preview.
/// The RNG is injected so cache-buster values are reproducible in tests.
pub struct SnippetRenderer<R: Rng> {
    rng: R,
    sample_encrypted_price: Option<String>,
}

impl<R: Rng> SnippetRenderer<R> {
    pub fn new(rng: R, sample_encrypted_price: Option<String>) -> Self {
        Self {
            rng,
            sample_encrypted_price,
        }
    }

    /// Renders the ad's snippet, or returns None when the ad's declared
    /// adslot cannot be matched back to a request adslot with known
    /// dimensions. The caller has already confirmed every targeted adslot
    /// is otherwise valid.
    pub fn render(
        &mut self,
        ad: &Ad,
        ad_index: usize,
        request: &BidRequest,
        problems: &mut Vec<ValidationIssue>,
    ) -> Option<String> {
        let snippet = ad.html_snippet.as_deref()?;
        let first_slot = ad.adslot.first()?;

        let has_click_macro = tokens(snippet)
            .iter()
            .any(|token| CLICK_MACROS.contains(&token.name));
        if !has_click_macro {
            problems.push(ValidationIssue::ad(IssueKind::ClickMacroMissing, ad_index));
        }

        let slot = request.find_adslot(first_slot.id?)?;
        let (width, height) = (slot.width.unwrap_or(0), slot.height.unwrap_or(0));
        if width == 0 || height == 0 {
            // No resolvable dimensions, nothing to preview.
            return None;
        }

        let winning_price = first_slot.max_cpm_micros.unwrap_or(0) as f64 * WINNING_PRICE_RATIO / 1000.0;
        let cachebuster: i64 = self.rng.gen_range(0..=i64::MAX);
        let site = Url::parse(&request.url)
            .ok()
            .and_then(|u| u.host_str().map(escape_url));

        let rendered = substitute(snippet, |token| match token.name {
            "CLICK_URL_UNESC" => Some(CLICK_URL.to_string()),
            "CLICK_URL_ESC" | "CLICK_URL_ESC_ESC" => Some(escape_url(CLICK_URL)),
            // An encrypted price is opaque ciphertext and is substituted
            // verbatim for both macro forms.
            "WINNING_PRICE" | "WINNING_PRICE_ESC" => Some(
                self.sample_encrypted_price
                    .clone()
                    .unwrap_or_else(|| winning_price.to_string()),
            ),
            "CACHEBUSTER" => Some(cachebuster.to_string()),
            "SITE" => site.clone(),
            _ => None,
        });
        Some(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::bid::{AdSlot, RequestAdSlot};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn renderer(price: Option<&str>) -> SnippetRenderer<StdRng> {
        SnippetRenderer::new(StdRng::seed_from_u64(7), price.map(str::to_string))
    }

    fn request() -> BidRequest {
        BidRequest {
            id: "r1".to_string(),
            url: "http://www.publisher.test:8080/section/front".to_string(),
            adslot: vec![RequestAdSlot {
                id: 4,
                width: Some(300),
                height: Some(250),
            }],
            ..Default::default()
        }
    }

    fn ad(snippet: &str) -> Ad {
        Ad {
            html_snippet: Some(snippet.to_string()),
            adslot: vec![AdSlot {
                id: Some(4),
                max_cpm_micros: Some(33_000),
                min_cpm_micros: None,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn substitutes_click_and_site_macros() {
        let mut problems = Vec::new();
        let out = renderer(None)
            .render(
                &ad("<a href=\"%%CLICK_URL_UNESC%%\">x</a> on %%SITE%%"),
                0,
                &request(),
                &mut problems,
            )
            .expect("renders");
        assert!(out.contains(CLICK_URL));
        // Port stripped from the host, dots pass the allowlist.
        assert!(out.contains("www.publisher.test"));
        assert!(!out.contains("8080"));
        assert!(problems.is_empty());
    }

    #[test]
    fn escaped_click_macro_uses_escaped_constant() {
        let mut problems = Vec::new();
        let out = renderer(None)
            .render(&ad("%%CLICK_URL_ESC%%"), 0, &request(), &mut problems)
            .expect("renders");
        assert_eq!(out, escape_url(CLICK_URL));
    }

    #[test]
    fn clear_text_price_is_ratio_of_max_cpm() {
        let mut problems = Vec::new();
        let out = renderer(None)
            .render(
                &ad("%%CLICK_URL_UNESC%% p=%%WINNING_PRICE%%"),
                0,
                &request(),
                &mut problems,
            )
            .expect("renders");
        // 33_000 micros * 0.33 / 1000
        assert!(out.contains("p=10.89"));
    }

    #[test]
    fn encrypted_price_is_used_verbatim_for_both_forms() {
        let mut problems = Vec::new();
        let out = renderer(Some("CIPHER=="))
            .render(
                &ad("%%CLICK_URL_UNESC%% %%WINNING_PRICE%%/%%WINNING_PRICE_ESC%%"),
                0,
                &request(),
                &mut problems,
            )
            .expect("renders");
        assert!(out.contains("CIPHER==/CIPHER=="));
    }

    #[test]
    fn missing_click_macro_flags_but_still_renders() {
        let mut problems = Vec::new();
        let out = renderer(None).render(&ad("<b>no macros</b>"), 2, &request(), &mut problems);
        assert!(out.is_some());
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].kind, IssueKind::ClickMacroMissing);
        assert_eq!(problems[0].ad_index, Some(2));
    }

    #[test]
    fn unresolvable_adslot_is_a_silent_no_op() {
        let mut request = request();
        request.adslot[0].width = None;
        let mut problems = Vec::new();
        let out = renderer(None).render(&ad("%%CLICK_URL_UNESC%%"), 0, &request, &mut problems);
        assert!(out.is_none());
        assert!(problems.is_empty());
    }

    #[test]
    fn cachebuster_is_deterministic_under_a_seeded_rng() {
        let mut problems = Vec::new();
        let first = renderer(None)
            .render(&ad("%%CLICK_URL_UNESC%%%%CACHEBUSTER%%"), 0, &request(), &mut problems)
            .expect("renders");
        let second = renderer(None)
            .render(&ad("%%CLICK_URL_UNESC%%%%CACHEBUSTER%%"), 0, &request(), &mut problems)
            .expect("renders");
        assert_eq!(first, second);
    }
}
