use serde::{Deserialize, Serialize};

/// `{"success": true, "id": <int>}` returned by `action=create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub success: bool,
    pub id: i64,
}

/// `{"success": true}` returned by `action=update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatedResponse {
    pub success: bool,
}

/// Error body shared by every failing response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default)]
    pub code: Option<String>,
}
