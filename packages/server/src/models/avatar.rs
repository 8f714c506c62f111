use serde::Serialize;
use uuid::Uuid;

/// An avatar image, base64 encoded.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AvatarResponse {
    /// Owner of the avatar.
    pub user_id: Uuid,
    /// Standard base64 encoding of the image bytes.
    #[schema(example = "aGVsbG8=")]
    pub data: String,
}
