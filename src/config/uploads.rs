use std::env;

#[derive(Clone, Debug)]
pub struct UploadConfig {
    /// Directory bootcamp photos are written to.
    pub file_upload_path: String,
    /// Maximum accepted upload size in bytes.
    pub max_file_upload: usize,
}

impl UploadConfig {
    pub fn from_env() -> Self {
        Self {
            file_upload_path: env::var("FILE_UPLOAD_PATH")
                .unwrap_or_else(|_| "./public/uploads".to_string()),
            max_file_upload: env::var("MAX_FILE_UPLOAD")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1_000_000), // 1MB
        }
    }
}
