use serde::Serialize;
use utoipa::ToSchema;

/// Greeting returned by the root route. The wording is part of the public
/// contract and must stay byte-for-byte identical.
pub const ROOT_MESSAGE: &str = "This is a Custoer Service Platform in making";

pub const SERVICE_TITLE: &str = "Customer Service Platform";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RootMessage {
    #[schema(example = "This is a Custoer Service Platform in making")]
    pub message: String,
}

impl RootMessage {
    pub fn greeting() -> Self {
        Self {
            message: ROOT_MESSAGE.to_string(),
        }
    }
}
