use crate::proto::bid::{BidRequest, BidResponse};
use crate::validate::issue::ValidationIssue;
use std::collections::BTreeMap;

/// One request/response exchange. The request, status and payload are set
/// when the exchange completes; everything else is filled in by a single
/// classification pass and never revisited.
#[derive(Debug, Clone)]
pub struct Record {
    pub request: BidRequest,
    pub status: u16,
    pub payload: Vec<u8>,
    pub problems: Vec<ValidationIssue>,
    pub response: Option<BidResponse>,
    pub rendered_snippets: BTreeMap<usize, String>,
}

impl Record {
    pub fn new(request: BidRequest, status: u16, payload: Vec<u8>) -> Self {
        Self {
            request,
            status,
            payload,
            problems: Vec::new(),
            response: None,
            rendered_snippets: BTreeMap::new(),
        }
    }
}
