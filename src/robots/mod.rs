//! Per-origin robots.txt discipline: an origin-keyed fetch-and-memoize
//! cache wrapping a [`texting_robots::Robot`] with a retrieval timestamp.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use texting_robots::Robot;

/// A single origin's robots state.
enum CachedRobots {
    Parsed { robot: Robot, retrieved_at: Instant },
    Empty { retrieved_at: Instant },
}

impl CachedRobots {
    fn allowed(&self, user_agent: &str, url: &str) -> bool {
        match self {
            CachedRobots::Parsed { robot, .. } => robot.allowed(url),
            CachedRobots::Empty { .. } => {
                let _ = user_agent;
                true
            }
        }
    }

    fn crawl_delay(&self) -> Option<f64> {
        match self {
            CachedRobots::Parsed { robot, .. } => robot.delay,
            CachedRobots::Empty { .. } => None,
        }
    }

    fn sitemaps(&self) -> Vec<String> {
        match self {
            CachedRobots::Parsed { robot, .. } => robot.sitemaps.clone(),
            CachedRobots::Empty { .. } => Vec::new(),
        }
    }
}

/// Memoized robots.txt authority shared by all crawl workers.
pub struct RobotsCache {
    user_agent: String,
    enabled: bool,
    client: reqwest::Client,
    cache: DashMap<String, Arc<CachedRobots>>,
}

impl RobotsCache {
    #[must_use]
    pub fn new(user_agent: impl Into<String>, enabled: bool, client: reqwest::Client) -> Self {
        Self {
            user_agent: user_agent.into(),
            enabled,
            client,
            cache: DashMap::new(),
        }
    }

    /// Fetches (if not already cached) and returns whether `url` may be
    /// crawled by the configured user agent.
    pub async fn is_allowed(&self, url: &url::Url) -> bool {
        if !self.enabled {
            return true;
        }
        let entry = self.entry_for(url).await;
        entry.allowed(&self.user_agent, url.as_str())
    }

    /// Returns the crawl-delay rule for `url`'s origin, in seconds, if any.
    pub async fn crawl_delay(&self, url: &url::Url) -> Option<f64> {
        if !self.enabled {
            return None;
        }
        self.entry_for(url).await.crawl_delay()
    }

    /// Returns any sitemap URLs declared in `url`'s origin's robots.txt.
    pub async fn sitemaps(&self, url: &url::Url) -> Vec<String> {
        if !self.enabled {
            return Vec::new();
        }
        self.entry_for(url).await.sitemaps()
    }

    async fn entry_for(&self, url: &url::Url) -> Arc<CachedRobots> {
        let origin = url.origin().ascii_serialization();
        if let Some(existing) = self.cache.get(&origin) {
            return existing.clone();
        }
        let fetched = Arc::new(self.fetch(&origin).await);
        self.cache.insert(origin, fetched.clone());
        fetched
    }

    async fn fetch(&self, origin: &str) -> CachedRobots {
        let robots_url = format!("{origin}/robots.txt");
        let retrieved_at = Instant::now();
        match self.client.get(&robots_url).send().await {
            Ok(resp) if resp.status().is_success() => match resp.bytes().await {
                Ok(body) => match Robot::new(&self.user_agent, &body) {
                    Ok(robot) => CachedRobots::Parsed { robot, retrieved_at },
                    Err(_) => CachedRobots::Empty { retrieved_at },
                },
                Err(_) => CachedRobots::Empty { retrieved_at },
            },
            _ => CachedRobots::Empty { retrieved_at },
        }
    }
}
