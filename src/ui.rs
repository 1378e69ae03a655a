// UI layer: wires the real clients into the pipeline and talks to the
// terminal. Progress goes through an `indicatif` spinner, the optional
// authorization prompt through `dialoguer`.

use std::cell::Cell;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};

use crate::auth::{Authorizer, ClientSecret, GoogleTokenEndpoint, PendingAuthorization, TokenStore};
use crate::blogger::BloggerClient;
use crate::cli::Cli;
use crate::config::Config;
use crate::content::split_paragraphs;
use crate::pipeline::{AuthorizationPrompt, Pipeline, PostRequest, RunOutcome};
use crate::search::PexelsClient;
use crate::storage::{HttpFetcher, S3Store};

/// Asks for the code on the terminal. An empty answer stops the run.
struct TerminalPrompt<'a> {
    spinner: &'a ProgressBar,
    url_shown: Cell<bool>,
}

impl AuthorizationPrompt for TerminalPrompt<'_> {
    fn ask_code(&self, pending: &PendingAuthorization) -> crate::error::Result<Option<String>> {
        let answer = self.spinner.suspend(|| {
            print!("{}", authorization_url_text(pending));
            Input::<String>::new()
                .with_prompt("Authorization code (empty to stop)")
                .allow_empty(true)
                .interact_text()
        });
        self.url_shown.set(true);
        let code = answer
            .map_err(|e| crate::error::PipelineError::OAuth(format!("could not read code: {}", e)))?;
        Ok(Some(code).filter(|c| !c.trim().is_empty()))
    }
}

/// Run the whole publication from parsed arguments.
pub fn run(cli: Cli) -> Result<()> {
    let text = read_content(&cli.content)?;
    if split_paragraphs(&text).is_empty() {
        anyhow::bail!("post content in {} is empty", cli.content.display());
    }
    let config = Config::from_env().context("Failed to load configuration")?;

    let search = PexelsClient::new(&config.pexels_api_url, &config.pexels_api_key)?;
    let fetcher = HttpFetcher::new()?;
    let store = S3Store::new(&config.storage)?;
    let secret = ClientSecret::load(&config.client_secret_path).with_context(|| {
        format!(
            "Failed to read OAuth client secret {}",
            config.client_secret_path.display()
        )
    })?;
    let endpoint = GoogleTokenEndpoint::new(secret.clone())?;
    let authorizer = Authorizer::new(&endpoint, &secret, TokenStore::new(&config.token_path));
    let publisher = BloggerClient::new(&config.blogger_api_url, &config.blog_id)?;

    // spinner for the network stages; cleared before the summary
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());

    let prompt = TerminalPrompt {
        spinner: &spinner,
        url_shown: Cell::new(false),
    };
    let mut pipeline = Pipeline::new(&search, &fetcher, &store, &authorizer, &publisher);
    if cli.prompt_code {
        pipeline = pipeline.with_prompt(&prompt);
    }

    let request = PostRequest {
        keyword: cli.keyword,
        title: cli.title,
        text,
        authorization_code: cli.code,
    };

    let outcome = pipeline.run_with(&request, &mut |stage| {
        spinner.set_message(stage.to_string());
        spinner.tick();
    });
    spinner.finish_and_clear();

    match outcome.context("Publishing failed")? {
        RunOutcome::Published { post, .. } => {
            println!("A new post has been published on Blogger.");
            println!("Post ID: {}", post.id);
            println!("URL: {}", post.url);
            println!("Process completed successfully!");
        }
        RunOutcome::AwaitingAuthorization(pending) => {
            print!("{}", awaiting_message(&pending, prompt.url_shown.get()));
        }
    }
    Ok(())
}

fn authorization_url_text(pending: &PendingAuthorization) -> String {
    format!(
        "Please open the following URL in your browser to authorize:\n{}\n",
        pending.authorization_url
    )
}

/// What to tell the user when the run stops for authorization. The URL is
/// left out when the code prompt already printed it.
fn awaiting_message(pending: &PendingAuthorization, url_shown: bool) -> String {
    let mut message = String::new();
    if !url_shown {
        message.push_str(&authorization_url_text(pending));
    }
    message.push_str("Then run again with --code <CODE> to publish.\n");
    message
}

fn read_content(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read post content from stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read post content {}", path.display()))
}
