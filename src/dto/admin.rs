use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::User;

/// The value must name one of the closed roles; anything else is a 400.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    pub items: Vec<User>,
}
