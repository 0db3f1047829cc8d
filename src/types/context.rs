use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDateTime;

use super::rule_type::Dimension;

static EMPTY: BTreeSet<String> = BTreeSet::new();

/// A postal address as far as rules care about it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub city: String,
    /// ISO country code, e.g. `"US"`.
    pub country: String,
}

impl Address {
    #[must_use]
    pub fn new(city: &str, country: &str) -> Self {
        Self {
            city: city.to_owned(),
            country: country.to_owned(),
        }
    }
}

/// The customer placing the order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Customer {
    /// Platform user id; `None` for guests.
    pub id: Option<String>,
    pub logged_in: bool,
    pub billing: Address,
    pub shipping: Address,
}

/// One line of the cart, as read from the platform.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: u32,
    pub line_subtotal: f64,
    /// Weight of a single unit.
    pub unit_weight: f64,
    pub shipping_class: Option<String>,
    /// Term ids of the product, per taxonomy.
    pub terms: HashMap<String, Vec<String>>,
}

impl CartLine {
    #[must_use]
    pub fn new(product_id: impl ToString, quantity: u32) -> Self {
        Self {
            product_id: product_id.to_string(),
            quantity,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn subtotal(mut self, line_subtotal: f64) -> Self {
        self.line_subtotal = line_subtotal;
        self
    }

    #[must_use]
    pub fn weight(mut self, unit_weight: f64) -> Self {
        self.unit_weight = unit_weight;
        self
    }

    #[must_use]
    pub fn shipping_class(mut self, class_id: impl ToString) -> Self {
        self.shipping_class = Some(class_id.to_string());
        self
    }

    #[must_use]
    pub fn term(mut self, taxonomy: &str, term_id: impl ToString) -> Self {
        self.terms
            .entry(taxonomy.to_owned())
            .or_default()
            .push(term_id.to_string());
        self
    }
}

/// Immutable facts about one rate-calculation pass.
///
/// Assembled once by [`ContextBuilder`] before any rule runs; evaluators only
/// read from it. `now` is captured once so every rule of a pass sees the
/// same instant.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextSnapshot {
    subtotal: f64,
    item_count: u64,
    total_weight: f64,
    coupons: BTreeSet<String>,
    coupon_codes: HashMap<String, String>,
    products: BTreeSet<String>,
    terms: HashMap<String, BTreeSet<String>>,
    shipping_classes: BTreeSet<String>,
    customer: Customer,
    now: NaiveDateTime,
}

impl ContextSnapshot {
    /// Start assembling a snapshot taken at `now` (store-local time).
    pub fn builder(now: NaiveDateTime) -> ContextBuilder {
        ContextBuilder::new(now)
    }

    #[must_use]
    pub fn subtotal(&self) -> f64 {
        self.subtotal
    }

    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.item_count
    }

    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Codes of the coupons applied to the cart.
    #[must_use]
    pub fn coupons(&self) -> &BTreeSet<String> {
        &self.coupons
    }

    /// Code of the coupon with platform id `id`, if known.
    #[must_use]
    pub fn coupon_code(&self, id: &str) -> Option<&str> {
        self.coupon_codes.get(id).map(String::as_str)
    }

    #[must_use]
    pub fn products(&self) -> &BTreeSet<String> {
        &self.products
    }

    /// Term ids attached to cart products in `taxonomy`.
    #[must_use]
    pub fn terms(&self, taxonomy: &str) -> &BTreeSet<String> {
        self.terms.get(taxonomy).unwrap_or(&EMPTY)
    }

    #[must_use]
    pub fn shipping_classes(&self) -> &BTreeSet<String> {
        &self.shipping_classes
    }

    /// The identifier set a set-membership rule of `dimension` inspects.
    #[must_use]
    pub fn dimension(&self, dimension: &Dimension) -> &BTreeSet<String> {
        match dimension {
            Dimension::Products => &self.products,
            Dimension::Terms(taxonomy) => self.terms(taxonomy),
            Dimension::ShippingClasses => &self.shipping_classes,
        }
    }

    #[must_use]
    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    #[must_use]
    pub fn now(&self) -> NaiveDateTime {
        self.now
    }
}

/// Builder for [`ContextSnapshot`].
///
/// Cart totals are derived from the added lines unless set explicitly.
#[derive(Debug, Clone)]
#[must_use]
pub struct ContextBuilder {
    now: NaiveDateTime,
    lines: Vec<CartLine>,
    subtotal: Option<f64>,
    item_count: Option<u64>,
    total_weight: Option<f64>,
    coupons: BTreeSet<String>,
    coupon_codes: HashMap<String, String>,
    customer: Customer,
}

impl ContextBuilder {
    fn new(now: NaiveDateTime) -> Self {
        Self {
            now,
            lines: Vec::new(),
            subtotal: None,
            item_count: None,
            total_weight: None,
            coupons: BTreeSet::new(),
            coupon_codes: HashMap::new(),
            customer: Customer::default(),
        }
    }

    pub fn line(mut self, line: CartLine) -> Self {
        self.lines.push(line);
        self
    }

    pub fn subtotal(mut self, subtotal: f64) -> Self {
        self.subtotal = Some(subtotal);
        self
    }

    pub fn item_count(mut self, count: u64) -> Self {
        self.item_count = Some(count);
        self
    }

    pub fn total_weight(mut self, weight: f64) -> Self {
        self.total_weight = Some(weight);
        self
    }

    /// Record an applied coupon code.
    pub fn coupon(mut self, code: &str) -> Self {
        self.coupons.insert(code.to_owned());
        self
    }

    /// Record the code of a coupon by platform id, so rules configured with
    /// coupon ids can be matched against applied codes.
    pub fn coupon_code(mut self, id: impl ToString, code: &str) -> Self {
        self.coupon_codes.insert(id.to_string(), code.to_owned());
        self
    }

    pub fn customer(mut self, customer: Customer) -> Self {
        self.customer = customer;
        self
    }

    pub fn build(self) -> ContextSnapshot {
        let mut products = BTreeSet::new();
        let mut terms: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut shipping_classes = BTreeSet::new();
        let mut subtotal = 0.0;
        let mut item_count = 0_u64;
        let mut total_weight = 0.0;

        for line in self.lines {
            subtotal += line.line_subtotal;
            item_count += u64::from(line.quantity);
            total_weight += line.unit_weight * f64::from(line.quantity);

            if is_present(&line.product_id) {
                products.insert(line.product_id);
            }
            if let Some(class) = line.shipping_class.filter(|c| is_present(c)) {
                shipping_classes.insert(class);
            }
            for (taxonomy, ids) in line.terms {
                terms.entry(taxonomy).or_default().extend(ids);
            }
        }

        ContextSnapshot {
            subtotal: self.subtotal.unwrap_or(subtotal),
            item_count: self.item_count.unwrap_or(item_count),
            total_weight: self.total_weight.unwrap_or(total_weight),
            coupons: self.coupons,
            coupon_codes: self.coupon_codes,
            products,
            terms,
            shipping_classes,
            customer: self.customer,
            now: self.now,
        }
    }
}

/// Platform ids of `0` or `""` mean "none".
fn is_present(id: &str) -> bool {
    !id.is_empty() && id != "0"
}
