use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::BrowserConfig;
use crate::utils::error::{AppError, Result};

/// Chrome drops the DevTools connection after this much silence; the session
/// lives for the whole process, so keep it well beyond any realistic idle gap.
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(60 * 60 * 24 * 365);

const SCRIPT_CLICK: &str = "function() { this.click(); }";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        Locator::XPath(expression.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css:{}", s),
            Locator::XPath(s) => write!(f, "xpath:{}", s),
        }
    }
}

/// The browser operations the session manager relies on.
///
/// Calls block; callers run them off the async executor.
#[cfg_attr(test, mockall::automock)]
pub trait BrowserDriver: Send {
    fn navigate(&self, url: &str) -> Result<()>;

    /// Waits until `locator` matches an element or `timeout` elapses.
    fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()>;

    /// Immediate check, no waiting.
    fn is_present(&self, locator: &Locator) -> bool;

    fn click(&self, locator: &Locator) -> Result<()>;

    /// Clicks through `element.click()` in page script, for elements covered by overlays.
    fn click_via_script(&self, locator: &Locator) -> Result<()>;

    fn type_into(&self, locator: &Locator, text: &str) -> Result<()>;

    /// Rendered HTML of the current page.
    fn page_source(&self) -> Result<String>;
}

/// Creates browser drivers. The session manager calls it once per process.
pub trait DriverLauncher: Send + Sync {
    fn launch(&self, config: &BrowserConfig) -> Result<Box<dyn BrowserDriver>>;
}

pub struct ChromeLauncher;

impl DriverLauncher for ChromeLauncher {
    fn launch(&self, config: &BrowserConfig) -> Result<Box<dyn BrowserDriver>> {
        Ok(Box::new(ChromeDriver::launch(config)?))
    }
}

/// One Chrome process with a single tab, driven over DevTools.
pub struct ChromeDriver {
    // Owns the process; dropping it closes Chrome.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeDriver {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false) // Often needed in containerized environments
            .window_size(Some((config.window_width, config.window_height)))
            .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
            ])
            .build()
            .map_err(|e| AppError::Browser(format!("Failed to create launch options: {}", e)))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(std::path::PathBuf::from(chrome_path));
        }

        let browser = Browser::new(launch_options)
            .map_err(|e| AppError::Browser(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| AppError::Browser(format!("Failed to create tab: {}", e)))?;

        info!(
            headless = config.headless,
            width = config.window_width,
            height = config.window_height,
            "Browser launched"
        );

        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    fn find(&self, locator: &Locator) -> Result<Element<'_>> {
        let found = match locator {
            Locator::Css(selector) => self.tab.find_element(selector),
            Locator::XPath(expression) => self.tab.find_element_by_xpath(expression),
        };
        found.map_err(|e| AppError::Browser(format!("Element {} not found: {}", locator, e)))
    }
}

impl BrowserDriver for ChromeDriver {
    fn navigate(&self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .map_err(|e| AppError::Browser(format!("Navigation to {} failed: {}", url, e)))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| AppError::Browser(format!("Page load failed for {}: {}", url, e)))?;
        Ok(())
    }

    fn wait_for(&self, locator: &Locator, timeout: Duration) -> Result<()> {
        let waited = match locator {
            Locator::Css(selector) => self
                .tab
                .wait_for_element_with_custom_timeout(selector, timeout)
                .map(|_| ()),
            Locator::XPath(expression) => self
                .tab
                .wait_for_xpath_with_custom_timeout(expression, timeout)
                .map(|_| ()),
        };

        waited.map_err(|e| {
            debug!("Wait for {} ended with: {}", locator, e);
            AppError::WaitTimeout {
                locator: locator.to_string(),
                timeout,
            }
        })
    }

    fn is_present(&self, locator: &Locator) -> bool {
        self.find(locator).is_ok()
    }

    fn click(&self, locator: &Locator) -> Result<()> {
        self.find(locator)?
            .click()
            .map_err(|e| AppError::Browser(format!("Click on {} failed: {}", locator, e)))?;
        Ok(())
    }

    fn click_via_script(&self, locator: &Locator) -> Result<()> {
        self.find(locator)?
            .call_js_fn(SCRIPT_CLICK, vec![], false)
            .map_err(|e| AppError::Browser(format!("Script click on {} failed: {}", locator, e)))?;
        Ok(())
    }

    fn type_into(&self, locator: &Locator, text: &str) -> Result<()> {
        self.find(locator)?
            .type_into(text)
            .map_err(|e| AppError::Browser(format!("Typing into {} failed: {}", locator, e)))?;
        Ok(())
    }

    fn page_source(&self) -> Result<String> {
        self.tab
            .get_content()
            .map_err(|e| AppError::Browser(format!("Failed to get page content: {}", e)))
    }
}
