//! Cleanup of image-search titles for display.
//!
//! Search results for historic photos are dominated by Wikimedia Commons and
//! Flickr pages whose titles look like `File:Eiffel_tower_1889.JPG - Wikimedia Commons`.

use std::sync::LazyLock;

use regex::Regex;

static FILE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(File:|Image:)").expect("valid regex"));
static IMAGE_EXTENSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.(jpg|jpeg|png|gif)$").expect("valid regex"));
static COMMONS_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"- Wikimedia Commons$").expect("valid regex"));
static HOSTING_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[|-].*?(flickr|commons|wikimedia).*$").expect("valid regex")
});
static WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z0-9_]\S*").expect("valid regex"));

/// Strip hosting noise from a search-result title and capitalize each word.
pub fn clean_title(title: &str) -> String {
    let title = FILE_PREFIX.replace(title, "");
    let title = IMAGE_EXTENSION.replace(title.trim(), "");
    let title = COMMONS_SUFFIX.replace(title.trim(), "");
    let title = HOSTING_SUFFIX.replace(title.trim(), "");

    WORD.replace_all(title.trim(), |caps: &regex::Captures| capitalize(&caps[0]))
        .into_owned()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_commons_noise() {
        assert_eq!(
            clean_title("File:Eiffel tower in 1889 - Wikimedia Commons"),
            "Eiffel Tower In 1889"
        );
        assert_eq!(clean_title("File:Eiffel tower 1889.JPG"), "Eiffel Tower 1889");
    }

    #[test]
    fn test_strips_flickr_suffix() {
        assert_eq!(
            clean_title("old paris street | Flickr - Photo Sharing!"),
            "Old Paris Street"
        );
    }

    #[test]
    fn test_capitalizes_each_word() {
        assert_eq!(clean_title("BIG ben AT night"), "Big Ben At Night");
    }

    #[test]
    fn test_plain_title_only_capitalized() {
        assert_eq!(clean_title("Construction of the tower"), "Construction Of The Tower");
    }

    #[test]
    fn test_image_prefix_and_extension() {
        assert_eq!(clean_title("Image:colosseum.png"), "Colosseum");
    }

    #[test]
    fn test_empty_title() {
        assert_eq!(clean_title(""), "");
    }
}
