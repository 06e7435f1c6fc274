//! Markup of the Trio Distribuidora storefront.
//!
//! Update this file when the site changes its HTML structure.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use super::{LoginSelectors, SiteAdapter, has_class_matching};
use crate::browser::Locator;
use crate::models::ProductCandidate;

/// Product card container on the results grid.
const CARD_CSS: &str = "div.card-produto-grid";

/// Price shown when a card has no price element.
const DEFAULT_PRICE_TEXT: &str = "0,00";

static CARD: LazyLock<Selector> = LazyLock::new(|| Selector::parse(CARD_CSS).unwrap());
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img").unwrap());
static SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static INPUT: LazyLock<Selector> = LazyLock::new(|| Selector::parse("input").unwrap());

/// Product image; its `alt` carries the display name.
static NAME_IMAGE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Produto_imagemProduto__\w+").unwrap());

static PRICE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Produto_textoPrecos__\w+").unwrap());

/// Quantity stepper, rendered only for purchasable items.
static QUANTITY_INPUT_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"QuantidadeMaisMenos_input__\w+").unwrap());

const LOGIN_FORM_XPATH: &str = "//form[.//input[@name='email']]";

pub struct TrioSite {
    login: LoginSelectors,
}

impl TrioSite {
    pub fn new() -> Self {
        Self {
            login: LoginSelectors {
                cookie_consent: Locator::xpath("//button[contains(., 'Aceitar')]"),
                open_login: Locator::xpath("//button[contains(., 'Entre ou cadastre-se')]"),
                login_form: Locator::xpath(LOGIN_FORM_XPATH),
                username_field: Locator::xpath(format!("{LOGIN_FORM_XPATH}//input[@name='email']")),
                password_field: Locator::xpath(format!("{LOGIN_FORM_XPATH}//input[@name='senha']")),
                submit: Locator::xpath(format!("{LOGIN_FORM_XPATH}//button[@type='submit']")),
                signed_out_marker: Locator::xpath("//button[contains(., 'Entre ou cadastre-se')]"),
            },
        }
    }

    fn name_of(card: &ElementRef<'_>) -> Option<String> {
        card.select(&IMG)
            .find(|img| has_class_matching(img, &NAME_IMAGE_CLASS))
            .and_then(|img| img.value().attr("alt"))
            .map(|alt| alt.trim().to_string())
            .filter(|name| !name.is_empty())
    }

    fn price_text_of(card: &ElementRef<'_>) -> String {
        card.select(&SPAN)
            .find(|span| has_class_matching(span, &PRICE_CLASS))
            .map(|span| span.text().collect::<String>().trim().to_string())
            .unwrap_or_else(|| DEFAULT_PRICE_TEXT.to_string())
    }

    fn has_quantity_control(card: &ElementRef<'_>) -> bool {
        card.select(&INPUT)
            .any(|input| has_class_matching(&input, &QUANTITY_INPUT_CLASS))
    }
}

impl Default for TrioSite {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteAdapter for TrioSite {
    fn name(&self) -> &str {
        "trio"
    }

    fn results_ready(&self) -> Locator {
        Locator::css(CARD_CSS)
    }

    fn product_cards<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        document.select(&CARD).collect()
    }

    fn candidate(&self, card: ElementRef<'_>) -> Option<ProductCandidate> {
        let name = Self::name_of(&card)?;
        Some(ProductCandidate {
            name,
            price_text: Self::price_text_of(&card),
            stock_present: Self::has_quantity_control(&card),
        })
    }

    fn login(&self) -> &LoginSelectors {
        &self.login
    }
}
