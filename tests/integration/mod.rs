// Integration tests for the price bridge
// These tests drive the real router, lookup service and session manager
// against a scripted in-memory browser.

pub mod session_tests;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    http::{Method, Request, Response},
    Router,
};
use price_bridge::{
    browser::{BrowserDriver, DriverLauncher, Locator},
    config::BrowserConfig,
    site::TrioSite,
    web::{create_router, AppState},
    AppConfig, AppError, MatchExtractor, PriceLookup, SessionManager,
};
use tower::ServiceExt;

pub const SEARCH_PAGE_URL: &str = "https://shop.test/produtos?pagina=1&busca=";

/// Test configuration for integration tests
pub fn get_test_config(diagnostics: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.vendor.home_page_url = "https://shop.test/".to_string();
    config.vendor.search_page_url = SEARCH_PAGE_URL.to_string();
    config.vendor.username = "buyer@example.com".to_string();
    config.vendor.password = "secret".to_string();
    config.browser.consent_timeout_secs = 1;
    config.browser.login_settle_timeout_secs = 1;
    config.browser.search_timeout_secs = 1;
    config.browser.poll_interval_ms = 10;
    config.browser.diagnostics_dir = diagnostics.to_string_lossy().to_string();
    config
}

/// One product card in the vendor's markup.
pub fn product_card(name: &str, price: &str, in_stock: bool) -> String {
    let quantity = if in_stock {
        r#"<input type="number" class="QuantidadeMaisMenos_input__Xy12" value="1">"#
    } else {
        ""
    };
    format!(
        r#"<div class="card-produto-grid">
             <a href="/produto/1"><img class="Produto_imagemProduto__Ab34 lazy" alt="{name}" src="/img/1.png"></a>
             <div><span class="Produto_textoPrecos__Cd56">{price}</span></div>
             {quantity}
           </div>"#
    )
}

pub fn results_page(cards: &[String]) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>Busca</title></head><body><section>{}</section></body></html>",
        cards.concat()
    )
}

/// Search results keyed by the decoded query.
pub fn catalog() -> HashMap<String, String> {
    let mut pages = HashMap::new();
    pages.insert(
        "parafuso 10mm".to_string(),
        results_page(&[
            product_card("Parafuso 10mm Phillips", "R$ 1.234,56", true),
            product_card("Martelo", "R$ 45,00", true),
        ]),
    );
    pages.insert(
        "martelo unha".to_string(),
        results_page(&[
            product_card("Serrote 18 pol", "R$ 59,90", true),
            product_card("Martelo Unha", "R$ 45,00", false),
        ]),
    );
    pages.insert(
        "furadeira".to_string(),
        results_page(&[product_card("Alicate Universal", "R$ 32,00", true)]),
    );
    pages.insert("vazio".to_string(), results_page(&[]));
    pages
}

/// In-memory browser. Serves catalog pages for search URLs and records any
/// overlap between two search navigations.
pub struct FakeBrowser {
    pages: Arc<HashMap<String, String>>,
    current: Mutex<Option<String>>,
    busy: Arc<AtomicBool>,
    overlaps: Arc<AtomicUsize>,
}

impl FakeBrowser {
    fn current_query(&self) -> Option<String> {
        let current = self.current.lock().unwrap().clone()?;
        let url = url::Url::parse(&current).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "busca")
            .map(|(_, value)| value.into_owned())
    }
}

impl BrowserDriver for FakeBrowser {
    fn navigate(&self, url: &str) -> price_bridge::Result<()> {
        if url.contains("busca=") {
            if self.busy.swap(true, Ordering::SeqCst) {
                self.overlaps.fetch_add(1, Ordering::SeqCst);
            }
            // Widen the window in which an unserialized caller would interleave.
            std::thread::sleep(Duration::from_millis(25));
        }
        *self.current.lock().unwrap() = Some(url.to_string());
        Ok(())
    }

    fn wait_for(&self, locator: &Locator, timeout: Duration) -> price_bridge::Result<()> {
        match self.current_query() {
            Some(query) if !self.pages.contains_key(&query) => {
                self.busy.store(false, Ordering::SeqCst);
                Err(AppError::WaitTimeout {
                    locator: locator.to_string(),
                    timeout,
                })
            }
            _ => Ok(()),
        }
    }

    fn is_present(&self, _locator: &Locator) -> bool {
        false
    }

    fn click(&self, _locator: &Locator) -> price_bridge::Result<()> {
        Ok(())
    }

    fn click_via_script(&self, _locator: &Locator) -> price_bridge::Result<()> {
        Ok(())
    }

    fn type_into(&self, _locator: &Locator, _text: &str) -> price_bridge::Result<()> {
        Ok(())
    }

    fn page_source(&self) -> price_bridge::Result<String> {
        let html = self
            .current_query()
            .and_then(|query| self.pages.get(&query).cloned())
            .unwrap_or_else(|| "<html><body>home</body></html>".to_string());
        self.busy.store(false, Ordering::SeqCst);
        Ok(html)
    }
}

pub struct FakeLauncher {
    pub launches: Arc<AtomicUsize>,
    pub overlaps: Arc<AtomicUsize>,
    pub fail: bool,
}

impl FakeLauncher {
    pub fn new(fail: bool) -> Self {
        Self {
            launches: Arc::new(AtomicUsize::new(0)),
            overlaps: Arc::new(AtomicUsize::new(0)),
            fail,
        }
    }
}

impl DriverLauncher for FakeLauncher {
    fn launch(&self, _config: &BrowserConfig) -> price_bridge::Result<Box<dyn BrowserDriver>> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Browser("Failed to launch browser: no chrome".to_string()));
        }
        Ok(Box::new(FakeBrowser {
            pages: Arc::new(catalog()),
            current: Mutex::new(None),
            busy: Arc::new(AtomicBool::new(false)),
            overlaps: Arc::clone(&self.overlaps),
        }))
    }
}

pub struct TestApp {
    pub router: Router,
    pub session: Arc<SessionManager>,
    pub lookup: Arc<PriceLookup>,
    pub launches: Arc<AtomicUsize>,
    pub overlaps: Arc<AtomicUsize>,
    _diagnostics: tempfile::TempDir,
}

/// Create test app state with all components wired as in `main`
pub fn create_test_app(launch_fails: bool) -> TestApp {
    let diagnostics = tempfile::tempdir().expect("tempdir");
    let config = get_test_config(diagnostics.path());

    let launcher = FakeLauncher::new(launch_fails);
    let launches = Arc::clone(&launcher.launches);
    let overlaps = Arc::clone(&launcher.overlaps);

    let site = Arc::new(TrioSite::new());
    let session = Arc::new(SessionManager::new(
        Arc::new(launcher),
        site.clone(),
        config.vendor.clone(),
        config.browser.clone(),
    ));
    let lookup = Arc::new(PriceLookup::new(
        session.clone(),
        MatchExtractor::new(site, config.matching.confidence_threshold),
        config.vendor.search_page_url.clone(),
    ));

    TestApp {
        router: create_router(AppState::new(lookup.clone())),
        session,
        lookup,
        launches,
        overlaps,
        _diagnostics: diagnostics,
    }
}

/// Helper function to make HTTP requests in tests
pub async fn make_request(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<String>,
) -> anyhow::Result<Response<Body>> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.map(Body::from).unwrap_or_else(Body::empty))?;

    Ok(app.clone().oneshot(request).await?)
}

pub async fn json_body(response: Response<Body>) -> anyhow::Result<serde_json::Value> {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}
