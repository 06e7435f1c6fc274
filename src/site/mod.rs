//! Everything that depends on the vendor's markup.
//!
//! The extractor and the session manager only talk to [`SiteAdapter`], so a
//! change in the site's HTML or login flow is confined to one implementation.

use scraper::{ElementRef, Html};

use crate::browser::Locator;
use crate::models::ProductCandidate;

pub mod trio;

pub use trio::TrioSite;

/// Locators used while signing in.
#[derive(Debug, Clone, PartialEq)]
pub struct LoginSelectors {
    /// Optional cookie-consent button; its absence is not an error.
    pub cookie_consent: Locator,
    /// Opens the login dialog.
    pub open_login: Locator,
    /// The login form, identified by its shape rather than an id.
    pub login_form: Locator,
    pub username_field: Locator,
    pub password_field: Locator,
    pub submit: Locator,
    /// Present only while signed out; login is complete once it disappears.
    pub signed_out_marker: Locator,
}

pub trait SiteAdapter: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Element whose presence means the results page has rendered.
    fn results_ready(&self) -> Locator;

    /// Product cards in document order.
    fn product_cards<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>>;

    /// Reads one card. Returns `None` when the card has no usable name.
    fn candidate(&self, card: ElementRef<'_>) -> Option<ProductCandidate>;

    fn login(&self) -> &LoginSelectors;
}

/// True when any class token of `element` matches `pattern`.
///
/// Generated CSS-module names such as `Produto_textoPrecos__a1b2c` carry a
/// build-specific suffix, so exact class selectors cannot be used.
pub fn has_class_matching(element: &ElementRef<'_>, pattern: &regex::Regex) -> bool {
    element.value().classes().any(|class| pattern.is_match(class))
}
