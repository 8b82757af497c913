use serde::{Deserialize, Serialize};

/// Option label the server treats as consent to read browser history.
pub const ENABLE_HISTORY_ACCESS: &str = "Enable history access";
/// Option label the server treats as "answer without history".
pub const PROCEED_NORMALLY: &str = "Proceed with normal response";

/// Body of `POST /search`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    #[serde(rename = "historyAccess")]
    pub history_access: bool,
}

/// Reply to `POST /search`. `options` may be absent or `null`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SearchResponse {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

/// Body of `POST /privacy`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PrivacyRequest {
    pub option: String,
}

/// Reply to `POST /privacy` and `POST /enable-history`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PrivacyResponse {
    pub response: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_request_uses_camel_case_flag() {
        let req = SearchRequest {
            query: "hello".to_string(),
            history_access: false,
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json, serde_json::json!({"query": "hello", "historyAccess": false}));
    }

    #[test]
    fn test_search_response_options_optional() {
        let plain: SearchResponse = serde_json::from_str(r#"{"response":"Hi there!"}"#).unwrap();
        assert_eq!(plain.options, None);

        let null: SearchResponse =
            serde_json::from_str(r#"{"response":"x","options":null}"#).unwrap();
        assert_eq!(null.options, None);

        let with: SearchResponse =
            serde_json::from_str(r#"{"response":"x","options":["a","b"]}"#).unwrap();
        assert_eq!(with.options, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn test_missing_response_field_is_an_error() {
        assert!(serde_json::from_str::<PrivacyResponse>(r#"{"message":"nope"}"#).is_err());
    }
}
