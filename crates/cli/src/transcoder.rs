use {
    tgcord_common::Platform, tgcord_relay::ContentTranscoder,
    tgcord_telegram::markdown::discord_markdown_to_html,
};

/// Production transcoder wiring.
///
/// Discord markdown becomes Telegram HTML on the way in. Telegram text
/// passes through untouched: `Message::text()` already strips entity
/// markup, and Discord renders plain text as-is.
pub struct RelayTranscoder;

impl ContentTranscoder for RelayTranscoder {
    fn transcode(&self, text: &str, source: Platform, _dest: Platform) -> String {
        match source {
            Platform::Discord => discord_markdown_to_html(text),
            Platform::Telegram => text.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discord_markdown_becomes_html() {
        let t = RelayTranscoder;
        assert_eq!(
            t.transcode("**hi** <3", Platform::Discord, Platform::Telegram),
            "<b>hi</b> &lt;3"
        );
    }

    #[test]
    fn telegram_text_passes_through() {
        let t = RelayTranscoder;
        assert_eq!(
            t.transcode("**not markdown**", Platform::Telegram, Platform::Discord),
            "**not markdown**"
        );
    }
}
