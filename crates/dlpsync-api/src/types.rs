// Wire shapes of the DLP API that are not entity payloads.
//
// Entity bodies themselves stay as raw JSON: the sync engine must carry
// fields it does not know about verbatim.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Listing response. Data patterns come wrapped in `{"resources": [...]}`,
/// data profiles usually come back as a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListEnvelope {
    Bare(Vec<Value>),
    Wrapped {
        #[serde(default)]
        resources: Vec<Value>,
    },
}

impl ListEnvelope {
    pub(crate) fn into_resources(self) -> Vec<Value> {
        match self {
            Self::Bare(items) | Self::Wrapped { resources: items } => items,
        }
    }
}

/// Profile create/update bodies are wrapped in a `dataProfile` envelope.
#[derive(Debug, Serialize)]
pub(crate) struct ProfileEnvelope<'a> {
    #[serde(rename = "dataProfile")]
    pub(crate) data_profile: &'a Value,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wrapped_listing_yields_resources() {
        let env: ListEnvelope =
            serde_json::from_value(json!({"resources": [{"name": "SSN"}], "total": 1})).unwrap();
        assert_eq!(env.into_resources(), vec![json!({"name": "SSN"})]);
    }

    #[test]
    fn bare_listing_yields_items() {
        let env: ListEnvelope = serde_json::from_value(json!([{"name": "PCI"}])).unwrap();
        assert_eq!(env.into_resources().len(), 1);
    }

    #[test]
    fn wrapped_listing_without_resources_is_empty() {
        let env: ListEnvelope = serde_json::from_value(json!({"count": 0})).unwrap();
        assert!(env.into_resources().is_empty());
    }

    #[test]
    fn profile_envelope_wraps_body() {
        let body = json!({"name": "PCI"});
        let wrapped = serde_json::to_value(ProfileEnvelope { data_profile: &body }).unwrap();
        assert_eq!(wrapped, json!({"dataProfile": {"name": "PCI"}}));
    }
}
