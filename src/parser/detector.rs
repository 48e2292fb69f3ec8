use lazy_static::lazy_static;
use regex::Regex;

use super::{errors::ParseError, models::Platform};

lazy_static! {
    static ref YOUTUBE_HOST: Regex = Regex::new(r"youtube\.com|youtu\.be").unwrap();
    static ref INSTAGRAM_HOST: Regex = Regex::new(r"instagram").unwrap();
}

pub fn detect_platform(input: &str) -> Result<Platform, ParseError> {
    let url = input.trim();
    if url.is_empty() {
        return Err(ParseError::InvalidUrl("链接为空".to_string()));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ParseError::InvalidUrl(url.to_string()));
    }

    // YouTube 优先，和输入里出现的顺序无关
    if YOUTUBE_HOST.is_match(url) {
        Ok(Platform::YouTube)
    } else if INSTAGRAM_HOST.is_match(url) {
        Ok(Platform::Instagram)
    } else {
        Ok(Platform::Direct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_platform() {
        assert_eq!(
            detect_platform("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap(),
            Platform::YouTube
        );
        assert_eq!(
            detect_platform("  https://youtu.be/dQw4w9WgXcQ  ").unwrap(),
            Platform::YouTube
        );
        assert_eq!(
            detect_platform("https://www.instagram.com/reel/Cx1/").unwrap(),
            Platform::Instagram
        );
        assert_eq!(
            detect_platform("https://cdn.example.com/file.mp4").unwrap(),
            Platform::Direct
        );
    }

    #[test]
    fn test_detect_rejects_non_http() {
        assert!(matches!(detect_platform(""), Err(ParseError::InvalidUrl(_))));
        assert!(matches!(
            detect_platform("ftp://example.com/a.mp4"),
            Err(ParseError::InvalidUrl(_))
        ));
        assert!(matches!(
            detect_platform("youtube.com/watch?v=abc"),
            Err(ParseError::InvalidUrl(_))
        ));
    }
}
