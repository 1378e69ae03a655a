// Content module: turns plain post text into the HTML body that gets
// published, with the rehosted images dropped in between paragraphs.

use once_cell::sync::Lazy;
use regex::Regex;

static PARAGRAPH_BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\r?\n){2,}").unwrap());

static LINE_BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\r\n|\n|\r").unwrap());

/// Where the two images go: each is emitted right after the paragraph
/// with the given index. Only non-empty paragraphs are counted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImagePlacement {
    pub first_after: usize,
    pub second_after: usize,
}

impl Default for ImagePlacement {
    fn default() -> Self {
        ImagePlacement {
            first_after: 0,
            second_after: 2,
        }
    }
}

/// Title, paragraphs and final HTML of the post about to be published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostContent {
    pub title: String,
    pub paragraphs: Vec<String>,
    pub body_html: String,
}

impl PostContent {
    pub fn build(
        title: &str,
        text: &str,
        image1: Option<&str>,
        image2: Option<&str>,
        placement: ImagePlacement,
    ) -> Self {
        PostContent {
            title: title.to_string(),
            paragraphs: split_paragraphs(text),
            body_html: assemble_with(text, image1, image2, placement),
        }
    }
}

/// Split on blank-line boundaries, trimming each paragraph and dropping
/// the ones left empty.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_BREAK_RE
        .split(text)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Assemble the post body with the default placement (after the first
/// and the third paragraph).
pub fn assemble(text: &str, image1: Option<&str>, image2: Option<&str>) -> String {
    assemble_with(text, image1, image2, ImagePlacement::default())
}

pub fn assemble_with(
    text: &str,
    image1: Option<&str>,
    image2: Option<&str>,
    placement: ImagePlacement,
) -> String {
    let mut html = String::new();
    for (index, paragraph) in split_paragraphs(text).iter().enumerate() {
        html.push_str("<p>");
        html.push_str(&line_breaks_to_br(paragraph));
        html.push_str("</p>\n");

        if index == placement.first_after {
            if let Some(url) = image1.filter(|u| !u.is_empty()) {
                html.push_str(&image_tag(url, "Image1"));
            }
        }
        if index == placement.second_after {
            if let Some(url) = image2.filter(|u| !u.is_empty()) {
                html.push_str(&image_tag(url, "Image2"));
            }
        }
    }
    html
}

fn image_tag(url: &str, alt: &str) -> String {
    format!("<img src=\"{}\" alt=\"{}\" />\n", url, alt)
}

// "<br />" goes in front of every line break, the break itself is kept.
fn line_breaks_to_br(paragraph: &str) -> String {
    LINE_BREAK_RE.replace_all(paragraph, "<br />$0").into_owned()
}
