//! Attachment classification.

use crate::types::AttachmentKind;

/// Classify a MIME type into the coarse attachment categories both
/// platforms understand. Anything unrecognized is a document.
#[must_use]
pub fn classify_mime(mime: &str) -> AttachmentKind {
    if mime.starts_with("video/") {
        AttachmentKind::Video
    } else if mime.starts_with("image/") {
        AttachmentKind::Photo
    } else if mime.starts_with("audio/") {
        AttachmentKind::Audio
    } else {
        AttachmentKind::Document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_by_prefix() {
        assert_eq!(classify_mime("video/mp4"), AttachmentKind::Video);
        assert_eq!(classify_mime("image/png"), AttachmentKind::Photo);
        assert_eq!(classify_mime("audio/ogg"), AttachmentKind::Audio);
        assert_eq!(classify_mime("application/pdf"), AttachmentKind::Document);
        assert_eq!(classify_mime("text/plain"), AttachmentKind::Document);
    }
}
