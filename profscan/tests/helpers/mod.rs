//! Shared test fixtures: scripted fetcher, page builders, failing ledger

#![allow(dead_code)]

use async_trait::async_trait;
use profscan::db::{Ledger, LedgerSummary};
use profscan::error::FetchError;
use profscan::models::{ResolvedRecord, SkipReason, SkippedName};
use profscan::services::page_fetcher::{selector_present, FetcherFactory, PageFetcher};
use profscan::services::CandidateMatcher;
use profscan::workflow::{PipelineSettings, ResolutionPipeline};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const BASE_URL: &str = "https://directory.test";
pub const UTA: &str = "University of Texas at Arlington";

// ============================================================================
// Scripted site
// ============================================================================

#[derive(Debug, Clone)]
enum Page {
    Html(String),
    Fail(String),
}

/// URL -> page map shared by every fetcher a [`FakeFactory`] creates
#[derive(Default)]
pub struct FakeSite {
    pages: Mutex<HashMap<String, Page>>,
    fetch_delay: Mutex<Duration>,
    fail_create: Mutex<bool>,
    pub created: AtomicUsize,
    pub closed: AtomicUsize,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub fetches: Mutex<Vec<String>>,
}

impl FakeSite {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn page(&self, url: impl Into<String>, html: impl Into<String>) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.into(), Page::Html(html.into()));
    }

    pub fn fail(&self, url: impl Into<String>, message: impl Into<String>) {
        self.pages
            .lock()
            .unwrap()
            .insert(url.into(), Page::Fail(message.into()));
    }

    pub fn set_fetch_delay(&self, delay: Duration) {
        *self.fetch_delay.lock().unwrap() = delay;
    }

    pub fn set_fail_create(&self, fail: bool) {
        *self.fail_create.lock().unwrap() = fail;
    }

    pub fn fetched_urls(&self) -> Vec<String> {
        self.fetches.lock().unwrap().clone()
    }

    fn lookup(&self, url: &str) -> Option<Page> {
        self.pages.lock().unwrap().get(url).cloned()
    }
}

pub struct FakeFetcher {
    site: Arc<FakeSite>,
    current: Option<String>,
    closed: bool,
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&mut self, url: &str) -> Result<String, FetchError> {
        self.site.fetches.lock().unwrap().push(url.to_string());

        let delay = *self.site.fetch_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        // Unscripted URLs load as a blank page, so waits on them time out
        let body = match self.site.lookup(url) {
            Some(Page::Html(html)) => html,
            Some(Page::Fail(message)) => {
                self.current = None;
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    message,
                });
            }
            None => "<html><body></body></html>".to_string(),
        };

        self.current = Some(body.clone());
        Ok(body)
    }

    async fn wait_for(&mut self, selector: &str, _timeout: Duration) -> Result<bool, FetchError> {
        let body = self.current.as_deref().ok_or(FetchError::NoPage)?;
        selector_present(body, selector)
    }

    fn content(&self) -> Result<&str, FetchError> {
        self.current.as_deref().ok_or(FetchError::NoPage)
    }

    async fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.site.closed.fetch_add(1, Ordering::SeqCst);
            self.site.active.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

pub struct FakeFactory {
    pub site: Arc<FakeSite>,
}

impl FakeFactory {
    pub fn new(site: Arc<FakeSite>) -> Arc<Self> {
        Arc::new(Self { site })
    }
}

impl FetcherFactory for FakeFactory {
    type Fetcher = FakeFetcher;

    fn create(&self) -> Result<FakeFetcher, FetchError> {
        if *self.site.fail_create.lock().unwrap() {
            return Err(FetchError::Setup("no browser available".to_string()));
        }

        self.site.created.fetch_add(1, Ordering::SeqCst);
        let now_active = self.site.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.site.max_active.fetch_max(now_active, Ordering::SeqCst);

        Ok(FakeFetcher {
            site: Arc::clone(&self.site),
            current: None,
            closed: false,
        })
    }
}

// ============================================================================
// Page builders
// ============================================================================

pub fn settings() -> PipelineSettings {
    PipelineSettings::new(
        BASE_URL,
        1343,
        UTA,
        Duration::from_millis(50),
        Duration::from_millis(50),
    )
    .unwrap()
}

pub fn search_url(name: &str) -> String {
    settings().search_url(name).unwrap()
}

pub fn profile_url(href: &str) -> String {
    settings().profile_url(href).unwrap()
}

pub fn pipeline(ledger: Arc<dyn Ledger>) -> ResolutionPipeline {
    ResolutionPipeline::new(settings(), CandidateMatcher::bookend(), ledger)
}

/// Search page listing `(displayed name, href, school)` cards
pub fn search_page(cards: &[(&str, &str, Option<&str>)]) -> String {
    let mut html = String::from("<html><body>");
    for (name, href, school) in cards {
        html.push_str(&format!(
            r#"<a class="TeacherCard__StyledTeacherCard-syjs0d-0" href="{}">
                 <div class="CardName__StyledCardName-sc-1gyrgim-0">{}</div>"#,
            href, name
        ));
        if let Some(school) = school {
            html.push_str(&format!(
                r#"<div class="CardSchool__School-sc-19lmz2k-1">{}</div>"#,
                school
            ));
        }
        html.push_str("</a>");
    }
    html.push_str("</body></html>");
    html
}

/// Profile page with every field present
pub fn full_profile_page() -> String {
    r##"
    <html><body>
      <div class="RatingValue__Numerator-qw8sqy-2">4.2</div>
      <div class="RatingValue__NumRatings-qw8sqy-0"><div><a href="#ratingsList">37 ratings</a></div></div>
      <a class="TeacherDepartment__StyledDepartmentLink-fl79e8-0" href="#"><b>Mathematics department</b></a>
      <div class="FeedbackItem__StyledFeedbackItem-uof32n-0">
        <div class="FeedbackItem__FeedbackNumber-uof32n-1">85%</div>
        <div class="FeedbackItem__FeedbackDescription-uof32n-2">Would take again</div>
      </div>
      <div class="FeedbackItem__StyledFeedbackItem-uof32n-0">
        <div class="FeedbackItem__FeedbackNumber-uof32n-1">2.1</div>
        <div class="FeedbackItem__FeedbackDescription-uof32n-2">Level of Difficulty</div>
      </div>
      <div class="TeacherTags__TagsContainer-sc-16vmh1y-0">
        <span class="Tag-bs9vf4-0">Clear grading</span>
        <span class="Tag-bs9vf4-0">Caring</span>
      </div>
    </body></html>
    "##
    .to_string()
}

/// Profile page with only the quality anchor
pub fn minimal_profile_page(quality: &str) -> String {
    format!(
        r#"<html><body><div class="RatingValue__Numerator-qw8sqy-2">{}</div></body></html>"#,
        quality
    )
}

/// Script a search hit plus profile for `name` at `href`
pub fn script_resolvable(site: &FakeSite, name: &str, href: &str) {
    site.page(search_url(name), search_page(&[(name, href, Some(UTA))]));
    site.page(profile_url(href), minimal_profile_page("3.5"));
}

pub fn names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("Person{} Test", i)).collect()
}

// ============================================================================
// Ledger that cannot write
// ============================================================================

#[derive(Default)]
pub struct FailingLedger;

fn unavailable() -> profscan_common::Error {
    profscan_common::Error::Internal("ledger unavailable".to_string())
}

#[async_trait]
impl Ledger for FailingLedger {
    async fn upsert_resolved(&self, _record: &ResolvedRecord) -> profscan_common::Result<()> {
        Err(unavailable())
    }

    async fn upsert_skipped(&self, _name: &str, _reason: SkipReason) -> profscan_common::Result<()> {
        Err(unavailable())
    }

    async fn last_processed_name(&self) -> profscan_common::Result<Option<String>> {
        Ok(None)
    }

    async fn load_resolved(&self, _lookup: &str) -> profscan_common::Result<Option<ResolvedRecord>> {
        Ok(None)
    }

    async fn list_skipped(&self) -> profscan_common::Result<Vec<SkippedName>> {
        Ok(Vec::new())
    }

    async fn mark_pending(&self, _name: &str, _last_error: &str) -> profscan_common::Result<()> {
        Err(unavailable())
    }

    async fn clear_pending(&self, _name: &str) -> profscan_common::Result<()> {
        Err(unavailable())
    }

    async fn list_pending(&self) -> profscan_common::Result<Vec<String>> {
        Ok(Vec::new())
    }

    async fn summary(&self) -> profscan_common::Result<LedgerSummary> {
        Ok(LedgerSummary::default())
    }
}
