//! Request body and query-string types shared by handlers.

use serde::Deserialize;

/// `GET /global-search?filter=`
#[derive(Debug, Default, Deserialize)]
pub struct GlobalSearchParams {
    #[serde(default)]
    pub filter: Option<String>,
}

/// `POST /inputs/option_list` body.
#[derive(Debug, Deserialize)]
pub struct OptionListRequest {
    pub model: String,
}
