use crate::support::{action, object, require_str, unsupported, SeededStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use weavecore::{IntegrationAdapter, IntegrationResult, JsonMap};

const SOURCE: &str = "social-store";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Post {
    id: String,
    author: String,
    text: String,
    likes: u64,
}

struct SocialState {
    posts: Vec<Post>,
    next: u32,
}

fn seed() -> SocialState {
    let post = |id: &str, author: &str, text: &str, likes: u64| Post {
        id: id.to_string(),
        author: author.to_string(),
        text: text.to_string(),
        likes,
    };
    SocialState {
        posts: vec![
            post("post-1", "acme_hq", "Announcing our fall product line!", 120),
            post("post-2", "globex", "We are hiring platform engineers.", 44),
            post("post-3", "initech", "Quarterly report is out.", 18),
        ],
        next: 4,
    }
}

enum SocialAction {
    ListPosts,
    CreatePost,
    SearchPosts,
}

/// Social feed over a seeded local store
pub struct SocialAdapter {
    store: SeededStore<SocialState>,
}

impl SocialAdapter {
    pub fn new() -> Self {
        Self {
            store: SeededStore::new(),
        }
    }
}

impl Default for SocialAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntegrationAdapter for SocialAdapter {
    fn id(&self) -> &str {
        "social"
    }

    fn name(&self) -> &str {
        "Social Media"
    }

    fn description(&self) -> &str {
        "Browse, search and publish social posts"
    }

    fn category(&self) -> &str {
        "communication"
    }

    fn keywords(&self) -> &[&str] {
        &["social", "post", "tweet", "publish", "feed", "share"]
    }

    async fn execute(&self, input: JsonMap) -> IntegrationResult {
        let parsed = match action(&input).unwrap_or("list-posts") {
            "list-posts" => SocialAction::ListPosts,
            "create-post" => SocialAction::CreatePost,
            "search-posts" => SocialAction::SearchPosts,
            other => return unsupported(SOURCE, other),
        };

        self.store.with(seed, |state| match parsed {
            SocialAction::ListPosts => IntegrationResult::ok(
                SOURCE,
                object(json!({ "posts": state.posts, "count": state.posts.len() })),
            ),
            SocialAction::CreatePost => {
                let text = match require_str(&input, "text") {
                    Ok(text) => text,
                    Err(reason) => return IntegrationResult::fail(SOURCE, reason),
                };
                let post = Post {
                    id: format!("post-{}", state.next),
                    author: "workspace".to_string(),
                    text: text.to_string(),
                    likes: 0,
                };
                state.next += 1;
                state.posts.push(post.clone());
                IntegrationResult::ok(SOURCE, object(json!({ "post": post })))
            }
            SocialAction::SearchPosts => {
                let query = match require_str(&input, "query") {
                    Ok(query) => query.to_lowercase(),
                    Err(reason) => return IntegrationResult::fail(SOURCE, reason),
                };
                let matches: Vec<&Post> = state
                    .posts
                    .iter()
                    .filter(|p| p.text.to_lowercase().contains(&query))
                    .collect();
                IntegrationResult::ok(
                    SOURCE,
                    object(json!({ "posts": matches, "count": matches.len() })),
                )
            }
        })
    }
}
