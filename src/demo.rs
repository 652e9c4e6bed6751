// Demo product catalogue for the e-commerce search page

use serde_json::json;
use tracing::{info, warn};

use crate::embeddings::{EmbeddingInput, VectorSearch};
use crate::models::{AppState, DemoSetupResponse};

pub struct DemoProduct {
    pub name: &'static str,
    pub description: &'static str,
}

pub const DEMO_PRODUCTS: [DemoProduct; 10] = [
    DemoProduct { name: "Red Summer Dress", description: "Flowing red dress perfect for summer occasions" },
    DemoProduct { name: "Black Leather Boots", description: "Genuine leather boots with sturdy sole" },
    DemoProduct { name: "Blue Denim Jacket", description: "Classic denim jacket in vintage blue" },
    DemoProduct { name: "White Sneakers", description: "Comfortable white sneakers for everyday wear" },
    DemoProduct { name: "Green Backpack", description: "Durable green backpack for outdoor adventures" },
    DemoProduct { name: "Silver Watch", description: "Elegant silver watch with leather strap" },
    DemoProduct { name: "Pink Floral Blouse", description: "Delicate pink blouse with floral patterns" },
    DemoProduct { name: "Brown Leather Wallet", description: "Classic brown leather wallet with multiple compartments" },
    DemoProduct { name: "Navy Blue Jeans", description: "Comfortable navy blue jeans with modern fit" },
    DemoProduct { name: "Black Sunglasses", description: "Stylish black sunglasses with UV protection" },
];

impl DemoProduct {
    /// `product_<n>`, 1-based.
    pub fn content_id(index: usize) -> String {
        format!("product_{}", index + 1)
    }

    pub fn content(&self) -> String {
        format!("{} - {}", self.name, self.description)
    }
}

/// Embed and store every demo product. Failures are collected, not fatal.
pub async fn seed_demo_products(state: &AppState) -> DemoSetupResponse {
    let search = VectorSearch::new(&state.pool, state.embedder.as_ref());
    let mut success_count = 0;
    let mut errors = Vec::new();

    for (index, product) in DEMO_PRODUCTS.iter().enumerate() {
        let content = product.content();
        let metadata = json!({
            "type": "product",
            "name": product.name,
            "description": product.description,
        });

        match search
            .index(
                &DemoProduct::content_id(index),
                &content,
                &EmbeddingInput::Text(content.clone()),
                metadata,
            )
            .await
        {
            Ok(_) => success_count += 1,
            Err(e) => {
                warn!(product = product.name, "Failed to store demo product: {}", e);
                errors.push(format!("Error with {}: {}", product.name, e));
            }
        }
    }

    info!(success_count, total = DEMO_PRODUCTS.len(), "Demo setup complete");

    DemoSetupResponse {
        success: errors.is_empty(),
        message: format!(
            "Demo setup complete! {}/{} products added.",
            success_count,
            DEMO_PRODUCTS.len()
        ),
        success_count,
        total_products: DEMO_PRODUCTS.len(),
        errors,
    }
}
