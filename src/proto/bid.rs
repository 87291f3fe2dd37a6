use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BidRequest {
    pub id: String,
    #[serde(default)]
    pub is_ping: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub user_agent: String,
    #[serde(default)]
    pub adslot: Vec<RequestAdSlot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoInfo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestAdSlot {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub min_ad_duration_ms: i32,
    #[serde(default)]
    pub max_ad_duration_ms: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BidResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processing_time_ms: Option<i64>,
    #[serde(default)]
    pub ad: Vec<Ad>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Ad {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet_template: Option<String>,
    #[serde(default)]
    pub template_parameter: Vec<TemplateParameter>,
    #[serde(default)]
    pub click_through_url: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_creative_id: Option<String>,
    #[serde(default)]
    pub adslot: Vec<AdSlot>,
}

/// An adslot targeted by a returned ad. `id` and `max_cpm_micros` are
/// required by the wire schema; decode stays lenient so that a missing
/// field surfaces as an incomplete message rather than a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdSlot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cpm_micros: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_cpm_micros: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateParameter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameter_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buyer_creative_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub click_through_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottom: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup_index: Option<i32>,
}

impl BidRequest {
    pub fn find_adslot(&self, id: i64) -> Option<&RequestAdSlot> {
        self.adslot.iter().find(|slot| slot.id == id)
    }
}

impl BidResponse {
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Schema completeness: every returned adslot must carry both its id
    /// and a max CPM bid. A response that decodes but fails this check is
    /// treated as incomplete, not as a rule violation.
    pub fn is_complete(&self) -> bool {
        self.ad.iter().all(|ad| {
            ad.adslot
                .iter()
                .all(|slot| slot.id.is_some() && slot.max_cpm_micros.is_some())
        })
    }
}

impl TemplateParameter {
    pub fn is_backup(&self) -> bool {
        self.backup_index.is_some()
    }

    pub fn has_bounds(&self) -> bool {
        self.left.is_some() && self.right.is_some() && self.top.is_some() && self.bottom.is_some()
    }
}
