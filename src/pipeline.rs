// Pipeline module: runs the five stages in order, each one feeding the
// next. Every collaborator comes in through a trait so tests can stand
// in for the network.

use crate::auth::{AuthOutcome, Authorizer, PendingAuthorization};
use crate::blogger::{NewPost, PostPublisher, PublishedPost};
use crate::content::{ImagePlacement, PostContent};
use crate::error::{PipelineError, Result};
use crate::search::ImageSearch;
use crate::storage::{rehost, ImageFetcher, ObjectStore, RehostedImage};

pub const REQUIRED_IMAGES: usize = 2;

/// What to publish.
#[derive(Clone, Debug)]
pub struct PostRequest {
    pub keyword: String,
    pub title: String,
    pub text: String,
    /// Code brought back from the consent page by a previous run.
    pub authorization_code: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    Search,
    Rehost { index: usize, total: usize },
    Assemble,
    Authorize,
    Publish,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Search => write!(f, "Searching images..."),
            Stage::Rehost { index, total } => write!(f, "Uploading image {}/{}...", index + 1, total),
            Stage::Assemble => write!(f, "Assembling content..."),
            Stage::Authorize => write!(f, "Authorizing..."),
            Stage::Publish => write!(f, "Publishing..."),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    Published {
        post: PublishedPost,
        content: PostContent,
        images: Vec<RehostedImage>,
    },
    /// Stopped before publishing; the user must authorize first.
    AwaitingAuthorization(PendingAuthorization),
}

/// Asks the user for the authorization code during the same run. `None`
/// means the run should stop and wait instead.
pub trait AuthorizationPrompt {
    fn ask_code(&self, pending: &PendingAuthorization) -> Result<Option<String>>;
}

pub struct Pipeline<'a> {
    search: &'a dyn ImageSearch,
    fetcher: &'a dyn ImageFetcher,
    store: &'a dyn ObjectStore,
    authorizer: &'a Authorizer<'a>,
    publisher: &'a dyn PostPublisher,
    prompt: Option<&'a dyn AuthorizationPrompt>,
    placement: ImagePlacement,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        search: &'a dyn ImageSearch,
        fetcher: &'a dyn ImageFetcher,
        store: &'a dyn ObjectStore,
        authorizer: &'a Authorizer<'a>,
        publisher: &'a dyn PostPublisher,
    ) -> Self {
        Pipeline {
            search,
            fetcher,
            store,
            authorizer,
            publisher,
            prompt: None,
            placement: ImagePlacement::default(),
        }
    }

    pub fn with_prompt(mut self, prompt: &'a dyn AuthorizationPrompt) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn with_placement(mut self, placement: ImagePlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn run(&self, request: &PostRequest) -> Result<RunOutcome> {
        self.run_with(request, &mut |_| {})
    }

    /// Run every stage, reporting each one to `on_stage` before it starts.
    pub fn run_with(
        &self,
        request: &PostRequest,
        on_stage: &mut dyn FnMut(Stage),
    ) -> Result<RunOutcome> {
        on_stage(Stage::Search);
        let found = self.search.search(&request.keyword, REQUIRED_IMAGES)?;
        tracing::info!(keyword = %request.keyword, found = found.len(), "image search done");
        if found.len() < REQUIRED_IMAGES {
            return Err(PipelineError::InsufficientImages {
                keyword: request.keyword.clone(),
                found: found.len(),
                required: REQUIRED_IMAGES,
            });
        }

        let mut images = Vec::with_capacity(REQUIRED_IMAGES);
        for (index, image) in found.iter().take(REQUIRED_IMAGES).enumerate() {
            on_stage(Stage::Rehost {
                index,
                total: REQUIRED_IMAGES,
            });
            let rehosted = rehost(self.fetcher, self.store, &image.source_url)?;
            tracing::info!(source = %image.source_url, url = %rehosted.public_url, "image rehosted");
            images.push(rehosted);
        }

        on_stage(Stage::Assemble);
        let content = PostContent::build(
            &request.title,
            &request.text,
            images.first().map(|i| i.public_url.as_str()),
            images.get(1).map(|i| i.public_url.as_str()),
            self.placement,
        );
        tracing::debug!(paragraphs = content.paragraphs.len(), "content assembled");

        on_stage(Stage::Authorize);
        let state = self.authorizer.state()?;
        tracing::info!(?state, "checking authorization");
        let token = match self.authorizer.authorize(request.authorization_code.as_deref())? {
            AuthOutcome::Authorized(token) => token,
            AuthOutcome::Pending(pending) => {
                let code = match self.prompt {
                    Some(prompt) => prompt.ask_code(&pending)?,
                    None => None,
                };
                match code.filter(|c| !c.trim().is_empty()) {
                    Some(code) => self.authorizer.exchange(code.trim())?,
                    None => return Ok(RunOutcome::AwaitingAuthorization(pending)),
                }
            }
        };

        on_stage(Stage::Publish);
        let post = self
            .publisher
            .publish(&token.access_token, &NewPost::published(&content.title, &content.body_html))?;
        tracing::info!(id = %post.id, url = %post.url, "post published");

        Ok(RunOutcome::Published {
            post,
            content,
            images,
        })
    }
}
