use lazy_static::lazy_static;
use regex::Regex;

use super::models::YOUTUBE_THUMBNAIL_BASE;

const THUMBNAIL_NAMES: [&str; 3] = ["maxresdefault", "hqdefault", "mqdefault"];

pub fn extract_youtube_id(url: &str) -> Option<String> {
    lazy_static! {
        static ref ID_PATTERNS: Vec<Regex> = vec![
            // 标准播放页
            Regex::new(r"watch\?v=([^&]+)").unwrap(),
            // 短链接
            Regex::new(r"youtu\.be/([^&?]+)").unwrap(),
            // 嵌入式播放器
            Regex::new(r"embed/([^&?]+)").unwrap(),
        ];
    }

    ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .map(|caps| caps[1].to_string())
}

/// 按清晰度从高到低排列的封面地址
pub fn youtube_thumbnail_candidates(id: &str) -> Vec<String> {
    youtube_thumbnail_candidates_from(YOUTUBE_THUMBNAIL_BASE, id)
}

pub fn youtube_thumbnail_candidates_from(base: &str, id: &str) -> Vec<String> {
    let base = base.trim_end_matches('/');
    THUMBNAIL_NAMES
        .iter()
        .map(|name| format!("{}/{}/{}.jpg", base, id, name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_youtube_id() {
        assert_eq!(
            extract_youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_youtube_id("https://youtu.be/dQw4w9WgXcQ?si=abc").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(
            extract_youtube_id("https://www.youtube.com/embed/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
        assert_eq!(extract_youtube_id("https://www.youtube.com/feed/trending"), None);
    }

    #[test]
    fn test_thumbnail_candidates_order() {
        let candidates = youtube_thumbnail_candidates("abc");
        assert_eq!(
            candidates,
            vec![
                "https://img.youtube.com/vi/abc/maxresdefault.jpg",
                "https://img.youtube.com/vi/abc/hqdefault.jpg",
                "https://img.youtube.com/vi/abc/mqdefault.jpg",
            ]
        );
    }
}
