use tgcord_common::{AttachmentKind, Platform, media::classify_mime};

/// Pure-function collaborator that converts message bodies between the
/// platforms' text dialects and classifies attachment MIME types.
///
/// The orchestrator transcodes every body toward its destination before
/// handing it to an adapter; adapters call
/// [`ContentTranscoder::classify_attachment`] equivalents while
/// normalizing inbound events.
pub trait ContentTranscoder: Send + Sync {
    /// Convert `text` from `source`'s dialect to `dest`'s.
    fn transcode(&self, text: &str, source: Platform, dest: Platform) -> String;

    /// Coarse attachment category for a MIME type.
    fn classify_attachment(&self, mime: &str) -> AttachmentKind {
        classify_mime(mime)
    }
}

/// Identity transcoder: passes text through untouched. Used in tests and
/// wherever no dialect conversion is wanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTranscoder;

impl ContentTranscoder for PlainTranscoder {
    fn transcode(&self, text: &str, _source: Platform, _dest: Platform) -> String {
        text.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[test]
    fn plain_transcoder_is_identity() {
        let t = PlainTranscoder;
        assert_eq!(
            t.transcode("**hi**", Platform::Discord, Platform::Telegram),
            "**hi**"
        );
    }

    #[rstest]
    #[case("image/webp", AttachmentKind::Photo)]
    #[case("video/mp4", AttachmentKind::Video)]
    #[case("audio/ogg", AttachmentKind::Audio)]
    #[case("application/zip", AttachmentKind::Document)]
    fn default_classification_delegates(#[case] mime: &str, #[case] expected: AttachmentKind) {
        assert_eq!(PlainTranscoder.classify_attachment(mime), expected);
    }
}
