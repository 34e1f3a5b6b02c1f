//! Caption prompts and tolerant parsing of free-form model replies.

use reel_models::caption::file_stem;
use reel_models::CaptionResult;

/// Wrap a user prompt into the caption instruction.
pub fn build_caption_prompt(language: &str, prompt: &str) -> String {
    format!(
        "Write 1 short caption (in {}) and 6 relevant hashtags for: {}",
        language, prompt
    )
}

/// Prompt suggested for a processed video, derived from its file name.
pub fn caption_prompt_for_file(filename: &str) -> String {
    format!("video: {}", file_stem(filename))
}

/// Split a model reply into a caption and hashtags.
///
/// Lines are trimmed and blank lines dropped, then classified in order:
/// - `caption:` / `caption-` (any case) sets the caption to the remainder
/// - `hashtag:` / `hashtags:` (any case) replaces the hashtags with the
///   whitespace-separated remainder
/// - the first other line becomes the caption; later ones contribute their
///   `#`-prefixed words to the hashtags
pub fn parse_caption_reply(reply: &str) -> CaptionResult {
    let mut result = CaptionResult::default();

    for line in reply.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = strip_caption_label(line) {
            result.caption = rest.trim().to_string();
        } else if let Some(rest) = strip_hashtag_label(line) {
            result.hashtags = rest.split_whitespace().map(str::to_string).collect();
        } else if result.caption.is_empty() {
            result.caption = line.to_string();
        } else {
            result.hashtags.extend(
                line.split_whitespace()
                    .filter(|w| w.starts_with('#'))
                    .map(str::to_string),
            );
        }
    }

    result
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then(|| &line[prefix.len()..])
}

fn strip_caption_label(line: &str) -> Option<&str> {
    strip_prefix_ignore_case(line, "caption:").or_else(|| strip_prefix_ignore_case(line, "caption-"))
}

fn strip_hashtag_label(line: &str) -> Option<&str> {
    strip_prefix_ignore_case(line, "hashtags:").or_else(|| strip_prefix_ignore_case(line, "hashtag:"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labelled_reply() {
        let reply = "Caption: Senja di pantai\nHashtags: #senja #pantai #travel";
        let result = parse_caption_reply(reply);
        assert_eq!(result.caption, "Senja di pantai");
        assert_eq!(result.hashtags, vec!["#senja", "#pantai", "#travel"]);
    }

    #[test]
    fn test_unlabelled_reply() {
        let reply = "\n  Sunset vibes only  \n\n#sunset #beach\nmore words #golden hour\n";
        let result = parse_caption_reply(reply);
        assert_eq!(result.caption, "Sunset vibes only");
        assert_eq!(result.hashtags, vec!["#sunset", "#beach", "#golden"]);
    }

    #[test]
    fn test_label_variants_and_case() {
        let result = parse_caption_reply("CAPTION- Hello\nhashtag: #one");
        assert_eq!(result.caption, "Hello");
        assert_eq!(result.hashtags, vec!["#one"]);
    }

    #[test]
    fn test_hashtag_label_replaces_earlier_tags() {
        let reply = "First line\n#a #b\nHashtags: #c";
        let result = parse_caption_reply(reply);
        assert_eq!(result.hashtags, vec!["#c"]);
    }

    #[test]
    fn test_later_caption_label_wins() {
        let result = parse_caption_reply("Intro text\nCaption: Real caption");
        assert_eq!(result.caption, "Real caption");
    }

    #[test]
    fn test_first_line_hashtags_become_caption() {
        // An unlabelled first line is the caption even if it looks like tags
        let result = parse_caption_reply("#only #tags");
        assert_eq!(result.caption, "#only #tags");
        assert!(result.hashtags.is_empty());
    }

    #[test]
    fn test_empty_reply() {
        let result = parse_caption_reply("   \n\n");
        assert_eq!(result, CaptionResult::default());
    }

    #[test]
    fn test_multibyte_line_shorter_than_label() {
        let result = parse_caption_reply("é\nhé #x");
        assert_eq!(result.caption, "é");
        assert_eq!(result.hashtags, vec!["#x"]);
    }

    #[test]
    fn test_prompts() {
        assert_eq!(
            build_caption_prompt("Indonesian", "video: beach"),
            "Write 1 short caption (in Indonesian) and 6 relevant hashtags for: video: beach"
        );
        assert_eq!(caption_prompt_for_file("my.trip.mp4"), "video: my.trip");
    }
}
