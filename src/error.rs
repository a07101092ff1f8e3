use serde::Serialize;

/// 应用内所有错误
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Email already exists.")]
    DuplicateEmail,

    #[error("No account found. Please register.")]
    UnknownAccount,

    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("Correct index {index} out of range for {len} option(s).")]
    InvalidAnswerIndex { index: i64, len: usize },

    #[error("{0} not found.")]
    NotFound(&'static str),

    #[error("{0} is required.")]
    MissingField(&'static str),

    #[error("Please enter a valid email address.")]
    InvalidEmail,

    #[error("Action is not available on this page.")]
    UnsupportedAction,

    #[error("Please log in first.")]
    NotAuthenticated,

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// 可以直接提示给用户、停留在当前页面的错误
    pub fn is_user_facing(&self) -> bool {
        !matches!(
            self,
            AppError::Storage(_) | AppError::Serialization(_) | AppError::Io(_) | AppError::Internal(_)
        )
    }
}

// Tauri IPC 需要错误类型可序列化
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
