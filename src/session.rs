use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, error, info};

use crate::browser::{BrowserDriver, DriverLauncher, Locator};
use crate::config::{BrowserConfig, VendorConfig};
use crate::site::{LoginSelectors, SiteAdapter};
use crate::utils::diagnostics;
use crate::utils::error::{AppError, Result};

/// Externally visible session status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum SessionState {
    Uninitialized,
    Authenticated,
    /// Terminal until the process restarts.
    Failed(String),
}

impl SessionState {
    pub fn is_usable(&self) -> bool {
        matches!(self, SessionState::Authenticated)
    }
}

/// What the lookup service needs from a session: a usable login and rendered pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Initializes and signs in on first use. True if the session can serve pages.
    async fn ensure_session(&self) -> bool;

    /// Navigates to `url` and returns the HTML once search results have rendered.
    async fn fetch_page(&self, url: &str) -> Result<String>;

    async fn state(&self) -> SessionState;
}

enum Slot {
    Uninitialized,
    Authenticated(Box<dyn BrowserDriver>),
    Failed(String),
}

/// Owns the single browser session.
///
/// The driver sits behind an async mutex held for the full duration of every
/// browser operation, so concurrent requests run one after another.
pub struct SessionManager {
    slot: Arc<Mutex<Slot>>,
    state: Arc<RwLock<SessionState>>,
    launcher: Arc<dyn DriverLauncher>,
    site: Arc<dyn SiteAdapter>,
    vendor: VendorConfig,
    browser: BrowserConfig,
}

impl SessionManager {
    pub fn new(
        launcher: Arc<dyn DriverLauncher>,
        site: Arc<dyn SiteAdapter>,
        vendor: VendorConfig,
        browser: BrowserConfig,
    ) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot::Uninitialized)),
            state: Arc::new(RwLock::new(SessionState::Uninitialized)),
            launcher,
            site,
            vendor,
            browser,
        }
    }

    async fn lock(&self) -> OwnedMutexGuard<Slot> {
        Arc::clone(&self.slot).lock_owned().await
    }

    async fn publish(&self, state: SessionState) {
        *self.state.write().await = state;
    }
}

#[async_trait]
impl PageFetcher for SessionManager {
    async fn ensure_session(&self) -> bool {
        let mut slot = self.lock().await;

        match &*slot {
            Slot::Authenticated(_) => return true,
            Slot::Failed(_) => return false,
            Slot::Uninitialized => {}
        }

        let launcher = Arc::clone(&self.launcher);
        let site = Arc::clone(&self.site);
        let vendor = self.vendor.clone();
        let browser = self.browser.clone();

        let initialized = tokio::task::spawn_blocking(move || {
            initialize(launcher.as_ref(), site.as_ref(), &vendor, &browser)
        })
        .await;

        *slot = match initialized {
            Ok(next) => next,
            Err(e) => {
                error!("Session initialization task failed: {}", e);
                Slot::Failed(format!("initialization task failed: {}", e))
            }
        };

        let (usable, state) = match &*slot {
            Slot::Authenticated(_) => (true, SessionState::Authenticated),
            Slot::Failed(reason) => (false, SessionState::Failed(reason.clone())),
            Slot::Uninitialized => (false, SessionState::Uninitialized),
        };
        self.publish(state).await;
        usable
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let slot = self.lock().await;
        let ready = self.site.results_ready();
        let timeout = self.browser.search_timeout();
        let url = url.to_string();

        tokio::task::spawn_blocking(move || match &*slot {
            Slot::Authenticated(driver) => load_results(driver.as_ref(), &url, &ready, timeout),
            Slot::Uninitialized | Slot::Failed(_) => Err(AppError::SessionUnavailable),
        })
        .await
        .map_err(|e| AppError::Internal(format!("Browser task failed: {}", e)))?
    }

    async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }
}

fn initialize(
    launcher: &dyn DriverLauncher,
    site: &dyn SiteAdapter,
    vendor: &VendorConfig,
    browser: &BrowserConfig,
) -> Slot {
    info!(site = site.name(), "Initializing browser session");

    let driver = match launcher.launch(browser) {
        Ok(driver) => driver,
        Err(e) => {
            error!("Browser failed to start: {}", e);
            return Slot::Failed(e.to_string());
        }
    };

    match authenticate(driver.as_ref(), site.login(), vendor, browser) {
        Ok(()) => {
            info!(user = %vendor.username, "Session authenticated");
            Slot::Authenticated(driver)
        }
        Err(e) => {
            match e.snapshot() {
                Some(path) => error!(snapshot = %path.display(), "{}", e),
                None => error!("{}", e),
            }
            Slot::Failed(e.to_string())
        }
    }
}

/// Runs the login flow and turns any failure into [`AppError::Login`] with a
/// snapshot of the page as it was when the flow stopped.
pub fn authenticate(
    driver: &dyn BrowserDriver,
    login: &LoginSelectors,
    vendor: &VendorConfig,
    browser: &BrowserConfig,
) -> Result<()> {
    sign_in(driver, login, vendor, browser).map_err(|e| {
        let html = driver.page_source().unwrap_or_default();
        debug!("Page source at login failure:\n{}", html);
        AppError::Login {
            message: e.to_string(),
            snapshot: diagnostics::capture(&browser.diagnostics_dir(), &html),
        }
    })
}

fn sign_in(
    driver: &dyn BrowserDriver,
    login: &LoginSelectors,
    vendor: &VendorConfig,
    browser: &BrowserConfig,
) -> Result<()> {
    info!(user = %vendor.username, url = %vendor.home_page_url, "Signing in");
    driver.navigate(&vendor.home_page_url)?;

    match driver.wait_for(&login.cookie_consent, browser.consent_timeout()) {
        Ok(()) => {
            driver.click_via_script(&login.cookie_consent)?;
            info!("Cookie banner accepted");
        }
        Err(_) => info!("No cookie banner"),
    }

    driver.wait_for(&login.open_login, browser.login_timeout())?;
    click_with_fallback(driver, &login.open_login)?;
    debug!("Login dialog opened");

    driver.wait_for(&login.login_form, browser.login_timeout())?;
    driver.type_into(&login.username_field, &vendor.username)?;
    driver.type_into(&login.password_field, &vendor.password)?;
    debug!("Credentials filled");

    driver.click_via_script(&login.submit)?;
    debug!("Login submitted");

    wait_until_signed_in(
        driver,
        login,
        browser.login_settle_timeout(),
        browser.poll_interval(),
    )
}

fn click_with_fallback(driver: &dyn BrowserDriver, locator: &Locator) -> Result<()> {
    driver.click(locator).or_else(|e| {
        debug!("Direct click on {} failed ({}), clicking via script", locator, e);
        driver.click_via_script(locator)
    })
}

/// Polls until neither the login form nor the signed-out marker is on the page.
fn wait_until_signed_in(
    driver: &dyn BrowserDriver,
    login: &LoginSelectors,
    timeout: Duration,
    poll_interval: Duration,
) -> Result<()> {
    let started = Instant::now();
    loop {
        if !driver.is_present(&login.login_form) && !driver.is_present(&login.signed_out_marker) {
            return Ok(());
        }
        if started.elapsed() >= timeout {
            return Err(AppError::WaitTimeout {
                locator: "signed-in state".to_string(),
                timeout,
            });
        }
        std::thread::sleep(poll_interval);
    }
}

fn load_results(
    driver: &dyn BrowserDriver,
    url: &str,
    ready: &Locator,
    timeout: Duration,
) -> Result<String> {
    debug!(url = %url, "Loading search page");
    driver.navigate(url)?;
    driver.wait_for(ready, timeout)?;
    driver.page_source()
}
