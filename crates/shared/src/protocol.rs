use serde::{Deserialize, Serialize};

use crate::domain::{Session, UserBranding, UserId};

/// `GET /users/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserLookupResponse {
    pub user: Session,
}

/// `GET /users/{owner_id}/branding`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrandingLookupResponse {
    pub owner_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branding: Option<UserBranding>,
}
