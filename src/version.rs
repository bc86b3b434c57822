// Version information for the lab test registry

/// Full version string with feature description
pub const VERSION: &str = "v0.1.0-csv-kv-registry-2026-10-17";

/// Semantic version number
pub const VERSION_NUMBER: &str = "0.1.0";

/// Build date
pub const BUILD_DATE: &str = "2026-10-17";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "csv-file-store",
    "kv-blob-store",
    "atomic-rewrite",
    "single-writer-lock",
    "lossy-row-recovery",
    "denormalized-export",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Lab Test Registry {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
