//! Crawl Engine: the orchestrator (SPEC_FULL §4.8) and the ambient
//! robustness layers it is built on (circuit breaker, per-domain
//! concurrency limiting, page timeouts, retry queue).

pub mod circuit_breaker;
pub mod cleanup;
pub mod crawl_types;
pub mod domain_limiter;
pub mod observer;
pub mod orchestrator;
pub mod page_enhancer;
pub mod page_timeout;
pub mod retry_queue;

pub use circuit_breaker::{extract_domain, CircuitBreaker, CircuitState, DomainHealth};
pub use crawl_types::{CrawlError, CrawlQueue, CrawlResult, FailureKind};
pub use domain_limiter::DomainLimiter;
pub use observer::{NoOpObserver, Observer};
pub use orchestrator::run as crawl_pages;
pub use retry_queue::RetryQueue;
