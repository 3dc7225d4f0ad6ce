use serde::{Deserialize, Serialize};

use super::wire::lenient_f64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CdnEndpoint {
    pub url: String,
    #[serde(deserialize_with = "lenient_f64")]
    pub rate: f64,
}

/// Highest `rate` wins; ties go to the endpoint listed first.
pub fn select_best_cdn(endpoints: &[CdnEndpoint]) -> Option<&CdnEndpoint> {
    endpoints.iter().fold(None, |best: Option<&CdnEndpoint>, candidate| match best {
        Some(current) if current.rate >= candidate.rate => Some(current),
        _ => Some(candidate),
    })
}
