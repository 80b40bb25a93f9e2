use serde::Serialize;

/// Validated body of `POST /api/v1/users`. The password is still plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub password: String,
}

/// Validated body of `PUT /api/v1/users/:id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Success envelope shared by every user endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            error: false,
            message: None,
            data,
        }
    }

    pub fn with_message(message: &'static str, data: T) -> Self {
        Self {
            error: false,
            message: Some(message),
            data,
        }
    }
}
