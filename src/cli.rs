use std::path::PathBuf;

use clap::Parser;

pub const DEFAULT_KEYWORD: &str = "television";

#[derive(Parser, Debug)]
#[command(
    name = "blogpub",
    version,
    about = "Illustrate a post with stock images and publish it to Blogger"
)]
pub struct Cli {
    #[arg(long, default_value = DEFAULT_KEYWORD, help = "Keyword used for the image search")]
    pub keyword: String,
    #[arg(long, help = "Title of the post")]
    pub title: String,
    #[arg(long, help = "File holding the post text, paragraphs separated by blank lines (- for stdin)")]
    pub content: PathBuf,
    #[arg(long, help = "Authorization code returned by the consent page")]
    pub code: Option<String>,
    #[arg(
        long,
        default_value_t = false,
        conflicts_with = "code",
        help = "Ask for the authorization code instead of stopping"
    )]
    pub prompt_code: bool,
    #[arg(short, long, default_value_t = false, help = "Log debug details to stderr")]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn keyword_defaults_to_television() {
        let cli = Cli::try_parse_from(["blogpub", "--title", "T", "--content", "post.txt"]).unwrap();
        assert_eq!(cli.keyword, "television");
        assert!(cli.code.is_none());
        assert!(!cli.prompt_code);
    }

    #[test]
    fn code_and_prompt_are_exclusive() {
        let res = Cli::try_parse_from([
            "blogpub", "--title", "T", "--content", "p.txt", "--code", "4/abc", "--prompt-code",
        ]);
        assert!(res.is_err());
    }
}
