/// Everything the engine can flag about a response. Human-readable text
/// lives in the reporter; the engine only records what happened and where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    // Transport / payload.
    NonOkStatus,
    EmptyPayload,
    DecodeFailure,
    IncompleteResponse,
    NoProcessingTime,
    AdsInPingResponse,
    // Ad level.
    NoCreativeType,
    MultipleCreativeTypes,
    InvalidVideoUrl,
    VideoAdForNonVideoRequest,
    HtmlAdForVideoRequest,
    TemplateAdForVideoRequest,
    EmptySnippet,
    NoAdslotsTargeted,
    NoClickThroughUrls,
    InvalidClickThroughUrl,
    // Adslot level.
    InvalidSlotId,
    ZeroBid,
    ZeroMinBid,
    MinNotBelowMax,
    // Template ads.
    TemplateAndParametersRequired,
    TooFewPlaceholders,
    TooManyPlaceholders,
    NonIntegerPlaceholder,
    NonConsecutivePlaceholders,
    ParameterCountMismatch,
    BackupNotAtEnd,
    InvalidBackupReference,
    CreativeIdInAd,
    ClickUrlInAd,
    MissingParameterCreativeId,
    MissingParameterValue,
    MissingBounds,
    InvalidDimensions,
    MustStackInOneDimension,
    // Snippet rendering.
    ClickMacroMissing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub kind: IssueKind,
    pub ad_index: Option<usize>,
    pub adslot_index: Option<usize>,
    pub detail: Option<String>,
}

impl ValidationIssue {
    pub fn response(kind: IssueKind) -> Self {
        Self {
            kind,
            ad_index: None,
            adslot_index: None,
            detail: None,
        }
    }

    pub fn ad(kind: IssueKind, ad_index: usize) -> Self {
        Self {
            kind,
            ad_index: Some(ad_index),
            adslot_index: None,
            detail: None,
        }
    }

    pub fn ad_detail(kind: IssueKind, ad_index: usize, detail: impl Into<String>) -> Self {
        Self {
            kind,
            ad_index: Some(ad_index),
            adslot_index: None,
            detail: Some(detail.into()),
        }
    }

    pub fn adslot(kind: IssueKind, ad_index: usize, adslot_index: usize) -> Self {
        Self {
            kind,
            ad_index: Some(ad_index),
            adslot_index: Some(adslot_index),
            detail: None,
        }
    }
}
