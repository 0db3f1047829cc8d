use std::collections::HashMap;

use super::error::RegistryError;
use super::operator::{
    Operator, MEMBERSHIP_OPERATORS, NUMERIC_OPERATORS, SET_OPERATORS, TEMPORAL_OPERATORS,
};

/// Taxonomy whose "terms" are the shipping classes of cart line items.
pub const SHIPPING_CLASS_TAXONOMY: &str = "product_shipping_class";

/// Product taxonomies exposed as rule types unless configured otherwise.
pub const DEFAULT_TAXONOMIES: &[&str] = &["product_cat", "product_tag", SHIPPING_CLASS_TAXONOMY];

/// Which set of cart identifiers a set-membership rule inspects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Product ids of cart lines.
    Products,
    /// Term ids attached to cart products in the named taxonomy.
    Terms(String),
    /// Shipping-class ids of cart lines.
    ShippingClasses,
}

impl Dimension {
    /// Dimension backing the `cart_products:<taxonomy>` rule type.
    #[must_use]
    pub fn for_taxonomy(taxonomy: &str) -> Self {
        if taxonomy == SHIPPING_CLASS_TAXONOMY {
            Dimension::ShippingClasses
        } else {
            Dimension::Terms(taxonomy.to_owned())
        }
    }

    /// Parameter holding the configured identifiers.
    #[must_use]
    pub fn param_key(&self) -> String {
        match self {
            Dimension::Products => "products".to_owned(),
            Dimension::Terms(taxonomy) => format!("cart_products_{taxonomy}"),
            Dimension::ShippingClasses => format!("cart_products_{SHIPPING_CLASS_TAXONOMY}"),
        }
    }
}

/// Catalog entry for one rule type, e.g. `cart:subtotal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleType {
    pub id: String,
    pub group: String,
    /// Display order within the group; lowest first.
    pub priority: u32,
    /// Legal operators. Empty means the type takes no operator.
    pub operators: Vec<Operator>,
    /// Parameter the operator is stored under.
    pub operator_field: String,
    pub dimension: Option<Dimension>,
}

impl RuleType {
    #[must_use]
    pub fn new(id: &str, group: &str, priority: u32, operators: &[Operator]) -> Self {
        Self {
            id: id.to_owned(),
            group: group.to_owned(),
            priority,
            operators: operators.to_vec(),
            operator_field: "operator".to_owned(),
            dimension: None,
        }
    }

    #[must_use]
    pub fn operator_field(mut self, field: &str) -> Self {
        field.clone_into(&mut self.operator_field);
        self
    }

    #[must_use]
    pub fn dimension(mut self, dimension: Dimension) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Whether a rule of this type may use `op`.
    #[must_use]
    pub fn accepts(&self, op: Option<Operator>) -> bool {
        self.operators.is_empty() || op.is_some_and(|op| self.operators.contains(&op))
    }
}

/// Process-wide catalog of rule types.
///
/// Registration is additive: ids can neither be removed nor overwritten.
#[derive(Debug, Clone, Default)]
pub struct RuleTypeRegistry {
    types: Vec<RuleType>,
    index: HashMap<String, usize>,
    groups: Vec<(String, String)>,
}

impl RuleTypeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in catalog with one `cart_products:<taxonomy>` type per entry
    /// of `taxonomies`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateRuleType`] if `taxonomies` repeats
    /// an entry or names the reserved `products` type.
    pub fn with_builtin_types<S: AsRef<str>>(taxonomies: &[S]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for (group, label) in [
            ("cart", "Cart"),
            ("cart_products", "Cart Products"),
            ("date", "Date"),
            ("billing", "Billing"),
            ("shipping", "Shipping"),
            ("user", "Customer"),
            ("order_history", "Order History"),
            ("others", "Others"),
        ] {
            registry.register_group(group, label)?;
        }

        let date = |id: &str, priority: u32, ops: &[Operator]| {
            RuleType::new(id, "date", priority, ops).operator_field("date_operator")
        };

        for ty in [
            RuleType::new("cart:subtotal", "cart", 10, NUMERIC_OPERATORS),
            RuleType::new("cart:total_quantity", "cart", 15, NUMERIC_OPERATORS),
            RuleType::new("cart:total_weight", "cart", 20, NUMERIC_OPERATORS),
            RuleType::new("cart:coupons", "cart", 25, MEMBERSHIP_OPERATORS),
            RuleType::new("cart_products:products", "cart_products", 5, SET_OPERATORS)
                .dimension(Dimension::Products),
            date("date:time", 5, TEMPORAL_OPERATORS),
            date("date:date", 10, TEMPORAL_OPERATORS),
            date("date:weekly_days", 15, MEMBERSHIP_OPERATORS),
            RuleType::new("billing:city", "billing", 10, MEMBERSHIP_OPERATORS),
            RuleType::new("billing:zipcode", "billing", 20, MEMBERSHIP_OPERATORS),
            RuleType::new("billing:state", "billing", 25, MEMBERSHIP_OPERATORS),
            RuleType::new("billing:country", "billing", 30, MEMBERSHIP_OPERATORS),
            RuleType::new("shipping:city", "shipping", 10, MEMBERSHIP_OPERATORS),
            RuleType::new("shipping:zipcode", "shipping", 15, MEMBERSHIP_OPERATORS),
            RuleType::new("shipping:state", "shipping", 20, MEMBERSHIP_OPERATORS),
            RuleType::new("shipping:country", "shipping", 25, MEMBERSHIP_OPERATORS),
            RuleType::new("user:users", "user", 10, MEMBERSHIP_OPERATORS),
            RuleType::new("user:roles", "user", 15, MEMBERSHIP_OPERATORS),
            RuleType::new("user:logged_in", "user", 20, &[]),
            RuleType::new("order_history:first_purchase", "order_history", 10, &[]),
        ] {
            registry.register(ty)?;
        }

        for (priority, taxonomy) in (21..).zip(taxonomies) {
            let taxonomy = taxonomy.as_ref();
            registry.register(
                RuleType::new(
                    &format!("cart_products:{taxonomy}"),
                    "cart_products",
                    priority,
                    SET_OPERATORS,
                )
                .dimension(Dimension::for_taxonomy(taxonomy)),
            )?;
        }

        Ok(registry)
    }

    /// Add a rule type.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateRuleType`] if the id is taken. The
    /// registry is left unchanged.
    pub fn register(&mut self, ty: RuleType) -> Result<(), RegistryError> {
        if self.index.contains_key(&ty.id) {
            return Err(RegistryError::DuplicateRuleType { id: ty.id });
        }
        self.index.insert(ty.id.clone(), self.types.len());
        self.types.push(ty);
        Ok(())
    }

    /// Add a display group.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateGroup`] if the group exists.
    pub fn register_group(&mut self, group: &str, label: &str) -> Result<(), RegistryError> {
        if self.groups.iter().any(|(g, _)| g == group) {
            return Err(RegistryError::DuplicateGroup {
                group: group.to_owned(),
            });
        }
        self.groups.push((group.to_owned(), label.to_owned()));
        Ok(())
    }

    /// Look up a rule type by id.
    #[must_use]
    pub fn lookup(&self, id: &str) -> Option<&RuleType> {
        self.index.get(id).map(|&idx| &self.types[idx])
    }

    /// Types of `group`, ordered by priority, ties by registration order.
    #[must_use]
    pub fn list_by_group(&self, group: &str) -> Vec<&RuleType> {
        let mut types: Vec<&RuleType> = self.types.iter().filter(|t| t.group == group).collect();
        types.sort_by_key(|t| t.priority);
        types
    }

    /// Registered groups as `(id, label)` pairs, in registration order.
    #[must_use]
    pub fn groups(&self) -> &[(String, String)] {
        &self.groups
    }

    /// All rule types in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RuleType> {
        self.types.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
