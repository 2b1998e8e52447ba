use serde::Serialize;

use crate::store::UpdateOutcome;

#[derive(Debug, Serialize)]
pub struct UpsertUserResponse {
    pub result: UpdateOutcome,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct AdminStatus {
    pub admin: bool,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub result: UpdateOutcome,
}
