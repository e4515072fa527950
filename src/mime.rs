// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! File extension to MIME type lookup.

/// Returned for any extension not in the table
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

const MAPPINGS: &[(&str, &str)] = &[
    ("css", "text/css"),
    ("gif", "image/gif"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("jpg", "image/jpeg"),
    ("png", "image/png"),
    ("js", "text/javascript"),
    ("oga", "audio/ogg"),
    ("ogg", "audio/ogg"),
    ("ogv", "video/ogg"),
    ("swf", "application/x-shockwave-flash"),
    ("mp4", "video/mp4"),
    ("mv4", "video/mp4"),
    ("mp3", "audio/mp3"),
    ("webm", "video/webm"),
];

/// Look up the MIME type for a file extension (without the dot).
///
/// Matching is exact and case-sensitive.
pub fn extension_to_type(extension: &str) -> &'static str {
    MAPPINGS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_MIME_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audio_types() {
        assert_eq!(extension_to_type("ogg"), "audio/ogg");
        assert_eq!(extension_to_type("oga"), "audio/ogg");
        assert_eq!(extension_to_type("mp3"), "audio/mp3");
    }

    #[test]
    fn test_other_types() {
        assert_eq!(extension_to_type("html"), "text/html");
        assert_eq!(extension_to_type("htm"), "text/html");
        assert_eq!(extension_to_type("mv4"), "video/mp4");
        assert_eq!(extension_to_type("swf"), "application/x-shockwave-flash");
    }

    #[test]
    fn test_fallback() {
        assert_eq!(extension_to_type("wav"), DEFAULT_MIME_TYPE);
        assert_eq!(extension_to_type(""), DEFAULT_MIME_TYPE);
        // Case-sensitive
        assert_eq!(extension_to_type("MP3"), DEFAULT_MIME_TYPE);
    }
}
