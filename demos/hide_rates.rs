use chrono::Local;
use rategate::{
    Address, CartLine, ContextSnapshot, Customer, Engine, PricedOption, RatePass,
};
use tracing_subscriber::EnvFilter;

struct ShippingRate {
    id: &'static str,
    label: &'static str,
    cost: f64,
    rules: Option<&'static str>,
}

impl PricedOption for ShippingRate {
    fn option_id(&self) -> &str {
        self.id
    }

    fn rule_settings(&self) -> Option<&str> {
        self.rules
    }
}

fn rates() -> Vec<ShippingRate> {
    vec![
        ShippingRate {
            id: "flat_rate:1",
            label: "Standard",
            cost: 4.99,
            rules: Some(
                r#"{"rules":[{"type":"cart:subtotal","operator":"greater_than_or_equal","value":"75"}]}"#,
            ),
        },
        ShippingRate {
            id: "free_shipping:2",
            label: "Free shipping",
            cost: 0.0,
            rules: Some(
                r#"{"match_type":"any","rules":[
                    {"type":"cart:subtotal","operator":"less_than","value":"75"},
                    {"type":"cart_products:product_shipping_class","operator":"any_in_list","cart_products_product_shipping_class":["21"]}
                ]}"#,
            ),
        },
        ShippingRate {
            id: "local_pickup:3",
            label: "Local pickup",
            cost: 0.0,
            rules: Some(
                r#"{"rules":[{"type":"shipping:city","operator":"not_in_list","shipping_cities":"Portland, Beaverton"}]}"#,
            ),
        },
        ShippingRate {
            id: "express:4",
            label: "Express",
            cost: 19.0,
            rules: None,
        },
    ]
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let engine = Engine::with_defaults().expect("failed to build engine");

    let ctx = ContextSnapshot::builder(Local::now().naive_local())
        .line(CartLine::new(31, 2).subtotal(48.0).weight(1.2).term("product_cat", 10))
        .line(CartLine::new(44, 1).subtotal(39.5).weight(3.0).shipping_class(21))
        .customer(Customer {
            id: Some("17".into()),
            logged_in: true,
            shipping: Address::new("Portland", "US"),
            ..Customer::default()
        })
        .build();

    println!(
        "Cart: {} items, subtotal {:.2}, weight {:.1}",
        ctx.item_count(),
        ctx.subtotal(),
        ctx.total_weight()
    );

    let pass = RatePass::new(&engine, &ctx, &false);
    for rate in &rates() {
        println!("  {:<16} {}", rate.id, pass.decide_option(rate));
    }

    println!();
    println!("Offered:");
    for rate in pass.filter(rates()) {
        println!("  {:<16} {:>6.2}", rate.label, rate.cost);
    }
}
