//! Per-retailer extraction rules.
//!
//! Each supported source is one [`SourceKind`] variant carrying its three
//! CSS locators and display label. Adding a retailer means adding a variant
//! here; nothing else branches on the source.

use scraper::Selector;
use shelfscan_core::Error;

/// Supported retailers, in registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Carrefour,
    Dia,
}

impl SourceKind {
    /// Every supported source. Results are concatenated in this order.
    pub const ALL: [SourceKind; 2] = [SourceKind::Carrefour, SourceKind::Dia];

    /// Registry key for this source.
    pub fn id(self) -> &'static str {
        match self {
            SourceKind::Carrefour => "carrefour",
            SourceKind::Dia => "dia",
        }
    }

    /// Store name shown to users.
    pub fn label(self) -> &'static str {
        match self {
            SourceKind::Carrefour => "Carrefour",
            SourceKind::Dia => "Día",
        }
    }

    /// The source registered under `id`, if any.
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    /// Name, price and image locators, in that order.
    pub fn locators(self) -> [&'static str; 3] {
        match self {
            SourceKind::Carrefour => [
                "span.vtex-store-components-3-x-productBrand",
                "span.valtech-carrefourar-product-price-0-x-currencyContainer",
                "img.vtex-store-components-3-x-productImageTag",
            ],
            SourceKind::Dia => [
                "span.vtex-store-components-3-x-productBrand",
                "span.vtex-product-price-1-x-sellingPriceValue",
                "img.vtex-store-components-3-x-productImageTag",
            ],
        }
    }

    /// Compile this source's locators.
    pub fn rule(self) -> Result<ExtractionRule, Error> {
        let [name, price, image] = self.locators();
        ExtractionRule::new(self.id(), self.label(), name, price, image)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Compiled locators plus the display label for one source.
#[derive(Debug, Clone)]
pub struct ExtractionRule {
    pub source: String,
    pub label: String,
    pub(crate) name: Selector,
    pub(crate) price: Selector,
    pub(crate) image: Selector,
}

impl ExtractionRule {
    /// Build a rule from raw CSS locators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSelector`] naming the first locator that does
    /// not parse.
    pub fn new(source: &str, label: &str, name: &str, price: &str, image: &str) -> Result<Self, Error> {
        let compile = |selector: &str| {
            Selector::parse(selector)
                .map_err(|_| Error::InvalidSelector { source_name: source.to_string(), selector: selector.to_string() })
        };

        Ok(Self {
            source: source.to_string(),
            label: label.to_string(),
            name: compile(name)?,
            price: compile(price)?,
            image: compile(image)?,
        })
    }
}

/// The compiled rules for every supported source, in registration order.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<ExtractionRule>,
}

impl RuleSet {
    /// Compile the rules of every [`SourceKind`].
    pub fn builtin() -> Result<Self, Error> {
        let rules = SourceKind::ALL
            .into_iter()
            .map(SourceKind::rule)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExtractionRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
