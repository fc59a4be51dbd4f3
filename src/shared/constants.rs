/// The only MIME type accepted for uploads
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// MIME type assumed when a file part declares none
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

/// Multipart field that carries the uploaded file
pub const FILE_FIELD_NAME: &str = "file";

/// Leading bytes of every PDF file
pub const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Longest file name most filesystems accept (NAME_MAX)
pub const MAX_STORED_NAME_LEN: usize = 255;

/// Extra request body allowance for multipart boundaries and headers
pub const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Format used for `created_at` in API responses
pub const DISPLAY_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
