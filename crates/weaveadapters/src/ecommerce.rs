use crate::support::{action, object, opt_u64, require_str, unsupported, SeededStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use weavecore::{IntegrationAdapter, IntegrationResult, JsonMap};

const SOURCE: &str = "commerce-store";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Product {
    id: String,
    name: String,
    price: f64,
    stock: u64,
    category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Order {
    id: String,
    product_id: String,
    quantity: u64,
    total: f64,
}

struct CommerceState {
    products: Vec<Product>,
    orders: Vec<Order>,
    next_order: u32,
}

fn seed() -> CommerceState {
    let product = |id: &str, name: &str, price: f64, stock: u64, category: &str| Product {
        id: id.to_string(),
        name: name.to_string(),
        price,
        stock,
        category: category.to_string(),
    };
    CommerceState {
        products: vec![
            product("prod-1", "Wireless keyboard", 59.0, 24, "peripherals"),
            product("prod-2", "USB-C dock", 129.0, 11, "peripherals"),
            product("prod-3", "27\" monitor", 249.0, 6, "displays"),
            product("prod-4", "Laptop stand", 39.0, 40, "accessories"),
            product("prod-5", "Noise-cancelling headset", 199.0, 9, "audio"),
        ],
        orders: Vec::new(),
        next_order: 1,
    }
}

enum CommerceAction {
    ListProducts,
    SearchProducts,
    CreateOrder,
    ListOrders,
}

/// Product catalog and order placement over a seeded local store
pub struct EcommerceAdapter {
    store: SeededStore<CommerceState>,
}

impl EcommerceAdapter {
    pub fn new() -> Self {
        Self {
            store: SeededStore::new(),
        }
    }
}

impl Default for EcommerceAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntegrationAdapter for EcommerceAdapter {
    fn id(&self) -> &str {
        "ecommerce"
    }

    fn name(&self) -> &str {
        "E-commerce"
    }

    fn description(&self) -> &str {
        "Browse the product catalog and place orders"
    }

    fn category(&self) -> &str {
        "commerce"
    }

    fn keywords(&self) -> &[&str] {
        &["shop", "product", "order", "buy", "cart", "price", "catalog", "store"]
    }

    async fn execute(&self, input: JsonMap) -> IntegrationResult {
        let parsed = match action(&input).unwrap_or("list-products") {
            "list-products" => CommerceAction::ListProducts,
            "search-products" => CommerceAction::SearchProducts,
            "create-order" => CommerceAction::CreateOrder,
            "list-orders" => CommerceAction::ListOrders,
            other => return unsupported(SOURCE, other),
        };

        self.store.with(seed, |state| match parsed {
            CommerceAction::ListProducts => IntegrationResult::ok(
                SOURCE,
                object(json!({ "products": state.products, "count": state.products.len() })),
            ),
            CommerceAction::SearchProducts => {
                let query = match require_str(&input, "query") {
                    Ok(query) => query.to_lowercase(),
                    Err(reason) => return IntegrationResult::fail(SOURCE, reason),
                };
                let matches: Vec<&Product> = state
                    .products
                    .iter()
                    .filter(|p| {
                        p.name.to_lowercase().contains(&query)
                            || p.category.to_lowercase().contains(&query)
                    })
                    .collect();
                IntegrationResult::ok(
                    SOURCE,
                    object(json!({ "products": matches, "count": matches.len() })),
                )
            }
            CommerceAction::CreateOrder => {
                let product_id = match require_str(&input, "productId") {
                    Ok(id) => id,
                    Err(reason) => return IntegrationResult::fail(SOURCE, reason),
                };
                let quantity = opt_u64(&input, "quantity").unwrap_or(1);
                let Some(product) = state.products.iter_mut().find(|p| p.id == product_id) else {
                    return IntegrationResult::fail(SOURCE, "Product not found");
                };
                if product.stock < quantity {
                    return IntegrationResult::fail(
                        SOURCE,
                        format!("Insufficient stock: {} available", product.stock),
                    );
                }
                product.stock -= quantity;
                let order = Order {
                    id: format!("order-{}", state.next_order),
                    product_id: product.id.clone(),
                    quantity,
                    total: product.price * quantity as f64,
                };
                state.next_order += 1;
                state.orders.push(order.clone());
                IntegrationResult::ok(SOURCE, object(json!({ "order": order })))
            }
            CommerceAction::ListOrders => IntegrationResult::ok(
                SOURCE,
                object(json!({ "orders": state.orders, "count": state.orders.len() })),
            ),
        })
    }
}
