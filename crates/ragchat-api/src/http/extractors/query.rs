//! Query parameter extractors for list endpoints.

use serde::Deserialize;

/// Query parameters for the session list endpoint.
#[derive(Debug, Deserialize, Default)]
pub struct SessionListQuery {
    /// Maximum results.
    pub limit: Option<i64>,
    /// Offset for pagination.
    pub offset: Option<i64>,
}
