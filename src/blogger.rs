// Blogger module: inserts a post into one blog through the Blogger v3
// REST API, authenticated with an OAuth bearer token.

use reqwest::blocking::{Client, Request};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Post resource sent to the insert call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NewPost {
    pub kind: &'static str,
    pub title: String,
    pub content: String,
    /// Not part of the resource, sent as the `isDraft` query parameter.
    #[serde(skip)]
    pub is_draft: bool,
}

impl NewPost {
    /// A post that goes live as soon as it is inserted.
    pub fn published(title: &str, content: &str) -> Self {
        NewPost {
            kind: "blogger#post",
            title: title.to_string(),
            content: content.to_string(),
            is_draft: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PublishedPost {
    pub id: String,
    #[serde(default)]
    pub url: String,
}

pub trait PostPublisher {
    fn publish(&self, access_token: &str, post: &NewPost) -> Result<PublishedPost>;
}

#[derive(Clone)]
pub struct BloggerClient {
    client: Client,
    base_url: String,
    blog_id: String,
}

impl BloggerClient {
    pub fn new(base_url: &str, blog_id: &str) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| PipelineError::Publish(format!("failed to build HTTP client: {}", e)))?;
        Ok(BloggerClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            blog_id: blog_id.to_string(),
        })
    }

    fn posts_url(&self) -> String {
        format!("{}/blogs/{}/posts/", self.base_url, self.blog_id)
    }

    /// The `posts.insert` call, ready to be executed.
    fn insert_request(&self, access_token: &str, post: &NewPost) -> Result<Request> {
        let bearer = HeaderValue::from_str(&format!("Bearer {}", access_token))
            .map_err(|e| PipelineError::Publish(format!("unusable access token: {}", e)))?;
        self.client
            .post(self.posts_url())
            .header(AUTHORIZATION, bearer)
            .query(&[("isDraft", post.is_draft)])
            .json(post)
            .build()
            .map_err(|e| PipelineError::Publish(format!("invalid request: {}", e)))
    }
}

impl PostPublisher for BloggerClient {
    fn publish(&self, access_token: &str, post: &NewPost) -> Result<PublishedPost> {
        let request = self.insert_request(access_token, post)?;
        let res = self
            .client
            .execute(request)
            .map_err(|e| PipelineError::Publish(e.to_string()))?;
        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            return Err(PipelineError::Publish(format!("{} - {}", status, txt)));
        }
        res.json()
            .map_err(|e| PipelineError::Publish(format!("unreadable response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_post_is_not_a_draft() {
        let post = NewPost::published("Title", "<p>x</p>\n");
        assert!(!post.is_draft);
        let body = serde_json::to_value(&post).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"kind": "blogger#post", "title": "Title", "content": "<p>x</p>\n"})
        );
    }

    #[test]
    fn posts_url_targets_the_blog() {
        let client = BloggerClient::new("https://www.googleapis.com/blogger/v3/", "42").unwrap();
        assert_eq!(
            client.posts_url(),
            "https://www.googleapis.com/blogger/v3/blogs/42/posts/"
        );
    }

    #[test]
    fn insert_request_publishes_immediately_with_bearer_token() {
        let client = BloggerClient::new("https://www.googleapis.com/blogger/v3", "42").unwrap();
        let post = NewPost::published("Title", "<p>x</p>\n");
        let request = client.insert_request("ya29.token", &post).unwrap();

        assert_eq!(request.method(), &reqwest::Method::POST);
        assert_eq!(request.url().path(), "/blogger/v3/blogs/42/posts/");
        assert_eq!(request.url().query(), Some("isDraft=false"));
        assert_eq!(request.headers()[AUTHORIZATION], "Bearer ya29.token");
        let body: serde_json::Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body["title"], "Title");
        assert_eq!(body["kind"], "blogger#post");
    }

    #[test]
    fn access_token_with_newline_is_rejected() {
        let client = BloggerClient::new("https://www.googleapis.com/blogger/v3", "42").unwrap();
        let post = NewPost::published("Title", "body");
        assert!(client.insert_request("bad\ntoken", &post).is_err());
    }

    #[test]
    fn reads_id_and_url_from_response() {
        let post: PublishedPost = serde_json::from_str(
            r#"{"kind":"blogger#post","id":"987","url":"http://blog.example/2026/10/post.html","title":"t"}"#,
        )
        .unwrap();
        assert_eq!(post.id, "987");
        assert_eq!(post.url, "http://blog.example/2026/10/post.html");
    }
}
