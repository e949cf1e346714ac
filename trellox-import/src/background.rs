//! Board background resolution
//!
//! Trello spreads a board's background across several preference fields. The
//! first usable image wins:
//!
//! 1. curated large image
//! 2. curated full size image
//! 3. standard image URL
//! 4. largest scaled variant by area
//! 5. generic image field
//! 6. `background` query parameter of the board URL
//!
//! Without an image a top/bottom color pair becomes a gradient, and otherwise
//! the solid color (or the default blue) is used.

use crate::types::BoardPrefs;
use tracing::debug;
use trellox_board::types::Background;
use url::Url;

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn largest_scaled(prefs: &BoardPrefs) -> Option<&str> {
    prefs
        .background_image_scaled
        .iter()
        .filter(|image| !image.url.trim().is_empty())
        .max_by(|a, b| a.area().total_cmp(&b.area()))
        .map(|image| image.url.trim())
}

/// The `background` query parameter of a board URL, when it holds an http URL
fn background_from_board_url(board_url: &str) -> Option<String> {
    let url = Url::parse(board_url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "background")
        .map(|(_, value)| value.into_owned())
        .filter(|value| value.starts_with("http"))
}

pub fn resolve_background(prefs: &BoardPrefs, board_url: &str, backgrounds_base: &str) -> Background {
    let mut color = present(&prefs.background_color).map(str::to_string);

    let candidate = present(&prefs.background_large_url)
        .or_else(|| present(&prefs.background_full_url))
        .or_else(|| present(&prefs.background_url))
        .or_else(|| largest_scaled(prefs))
        .or_else(|| present(&prefs.background_image));

    let mut image = match candidate {
        Some(value) if value.starts_with("http") => Some(value.to_string()),
        Some(value) if value.starts_with('#') => {
            debug!("background image field holds a color: {}", value);
            color = Some(value.to_string());
            None
        }
        Some(value) if value.starts_with('/') => Some(format!(
            "{}{}",
            backgrounds_base.trim_end_matches('/'),
            value
        )),
        Some(value) => Some(value.to_string()),
        None => None,
    };

    if image.is_none() {
        image = background_from_board_url(board_url);
    }

    if let Some(url) = image {
        return Background::image(url);
    }

    if let (Some(top), Some(bottom)) = (
        present(&prefs.background_top_color),
        present(&prefs.background_bottom_color),
    ) {
        return Background::Gradient {
            top: top.to_string(),
            bottom: bottom.to_string(),
        };
    }

    color.map(Background::color).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ScaledImage;
    use trellox_board::types::DEFAULT_BACKGROUND_COLOR;

    const S3: &str = "https://trello-backgrounds.s3.amazonaws.com";

    fn prefs() -> BoardPrefs {
        BoardPrefs::default()
    }

    fn scaled(width: f64, height: f64, url: &str) -> ScaledImage {
        ScaledImage {
            width,
            height,
            url: url.into(),
        }
    }

    #[test]
    fn test_large_url_wins() {
        let p = BoardPrefs {
            background_large_url: Some("https://img/large.jpg".into()),
            background_full_url: Some("https://img/full.jpg".into()),
            background_image: Some("https://img/plain.jpg".into()),
            background_color: Some("#123456".into()),
            ..prefs()
        };
        assert_eq!(
            resolve_background(&p, "", S3),
            Background::image("https://img/large.jpg")
        );
    }

    #[test]
    fn test_largest_scaled_variant() {
        let p = BoardPrefs {
            background_image_scaled: vec![
                scaled(100.0, 100.0, "https://img/small.jpg"),
                scaled(1920.0, 1080.0, "https://img/big.jpg"),
                scaled(640.0, 480.0, "https://img/mid.jpg"),
            ],
            background_image: Some("https://img/plain.jpg".into()),
            ..prefs()
        };
        assert_eq!(
            resolve_background(&p, "", S3),
            Background::image("https://img/big.jpg")
        );
    }

    #[test]
    fn test_color_code_in_image_field_moves_to_color() {
        let p = BoardPrefs {
            background_image: Some("#FF0000".into()),
            background_color: Some("#00FF00".into()),
            ..prefs()
        };
        assert_eq!(resolve_background(&p, "", S3), Background::color("#FF0000"));
    }

    #[test]
    fn test_relative_path_resolved_against_backgrounds_host() {
        let p = BoardPrefs {
            background_image: Some("/9/green.jpg".into()),
            ..prefs()
        };
        assert_eq!(
            resolve_background(&p, "", S3),
            Background::image(format!("{S3}/9/green.jpg"))
        );
    }

    #[test]
    fn test_board_url_parameter_beats_gradient() {
        let p = BoardPrefs {
            background_top_color: Some("#000".into()),
            background_bottom_color: Some("#fff".into()),
            ..prefs()
        };
        let board_url = "https://trello.com/b/abc/roadmap?background=https%3A%2F%2Fimg%2Fq.jpg";
        assert_eq!(
            resolve_background(&p, board_url, S3),
            Background::image("https://img/q.jpg")
        );
    }

    #[test]
    fn test_gradient_overrides_color() {
        let p = BoardPrefs {
            background_top_color: Some("#000".into()),
            background_bottom_color: Some("#fff".into()),
            background_color: Some("#123".into()),
            ..prefs()
        };
        assert_eq!(
            resolve_background(&p, "https://trello.com/b/abc", S3),
            Background::Gradient {
                top: "#000".into(),
                bottom: "#fff".into()
            }
        );
    }

    #[test]
    fn test_single_gradient_color_falls_back_to_color() {
        let p = BoardPrefs {
            background_top_color: Some("#000".into()),
            background_color: Some("#123".into()),
            ..prefs()
        };
        assert_eq!(resolve_background(&p, "", S3), Background::color("#123"));
    }

    #[test]
    fn test_nothing_gives_default_color() {
        assert_eq!(
            resolve_background(&prefs(), "not a url", S3),
            Background::color(DEFAULT_BACKGROUND_COLOR)
        );
    }
}
