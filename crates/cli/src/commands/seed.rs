//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! products:
//!   - name: Turmeric Powder
//!     price: "4.50"
//!     category: Spices
//!     sizes: ["100g", "250g"]
//!     stock: 40
//! ```
//!
//! Every entry is validated before anything is inserted.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use lakshmi_api::models::NewProduct;
use lakshmi_api::store::{CatalogStore, StoreError};

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Product #{index} ({name}): {message}")]
    InvalidProduct {
        index: usize,
        name: String,
        message: String,
    },

    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Deserialize)]
struct SeedFile {
    products: Vec<NewProduct>,
}

/// Parse and validate a seed file's contents.
fn parse(content: &str) -> Result<Vec<NewProduct>, SeedError> {
    let file: SeedFile = serde_yaml::from_str(content)?;

    file.products
        .into_iter()
        .enumerate()
        .map(|(i, product)| {
            let name = product.name.clone();
            product.normalized().map_err(|message| SeedError::InvalidProduct {
                index: i + 1,
                name,
                message,
            })
        })
        .collect()
}

/// Insert every product in `file_path`.
///
/// # Errors
///
/// Returns an error if the file is missing or invalid, or an insert fails.
pub async fn products(file_path: &str) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_owned()));
    }

    info!(path = %file_path, "Loading products from file");
    let content = tokio::fs::read_to_string(path).await?;
    let products = parse(&content)?;
    info!(products = products.len(), "Parsed and validated");

    let store = connect().await?;
    for product in products {
        let created = store.create_product(product).await?;
        info!(id = %created.id, name = %created.name, "Inserted product");
    }

    info!("Seeding complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use lakshmi_core::Price;

    use super::*;

    #[test]
    fn test_parse_valid_file() {
        let products = parse(
            r#"
products:
  - name: " Turmeric Powder "
    price: "4.50"
    category: Spices
    sizes: ["100g", " 250g "]
    stock: 40
  - name: Ghee
    price: 12
    category: Dairy
    sizes: ["500ml"]
"#,
        )
        .unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].name, "Turmeric Powder");
        assert_eq!(products[0].sizes, vec!["100g", "250g"]);
        assert_eq!(products[1].price, Price::from_units(12));
        assert_eq!(products[1].stock, 0);
    }

    #[test]
    fn test_parse_reports_invalid_entry() {
        let err = parse(
            r#"
products:
  - name: Clove
    price: 3
    category: Spices
    sizes: []
"#,
        )
        .unwrap_err();

        assert!(matches!(err, SeedError::InvalidProduct { index: 1, .. }));
    }

    #[test]
    fn test_parse_rejects_negative_price() {
        let err = parse(
            r#"
products:
  - name: Clove
    price: -3
    category: Spices
    sizes: ["10g"]
"#,
        )
        .unwrap_err();

        assert!(matches!(err, SeedError::Yaml(_)));
    }
}
