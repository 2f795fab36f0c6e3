//! Admin analytics computed from stored orders.
//!
//! Cancelled orders are excluded from revenue and units everywhere.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use lakshmi_core::{Price, ProductId};

use crate::error::Result;
use crate::models::{Order, ProductSummary};
use crate::state::AppState;
use crate::store::{CatalogStore, OrderStore, Store, UserStore};

/// Headline numbers for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_orders: u64,
    pub revenue: Price,
    pub units_sold: u64,
    pub product_count: u64,
    pub customer_count: u64,
}

/// Revenue bucket granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    #[default]
    Day,
    Month,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RevenueBucket {
    /// `YYYY-MM-DD` or `YYYY-MM`, UTC.
    pub period: String,
    pub revenue: Price,
    pub orders: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub name: String,
    pub units: u64,
    pub revenue: Price,
}

fn counted(orders: &[Order]) -> impl Iterator<Item = &Order> {
    orders
        .iter()
        .filter(|o| o.status != lakshmi_core::OrderStatus::Cancelled)
}

/// Analytics service.
pub struct AnalyticsService<'a> {
    store: &'a dyn Store,
}

impl<'a> AnalyticsService<'a> {
    #[must_use]
    pub fn new(state: &'a AppState) -> Self {
        Self {
            store: state.store(),
        }
    }

    /// # Errors
    ///
    /// Returns `AppError::StoreUnavailable` if the store fails.
    pub async fn summary(&self) -> Result<Summary> {
        let orders = self.store.all_orders().await?;

        Ok(Summary {
            total_orders: orders.len() as u64,
            revenue: counted(&orders).map(|o| o.total).sum(),
            units_sold: counted(&orders)
                .flat_map(|o| &o.items)
                .map(|i| u64::from(i.quantity))
                .sum(),
            product_count: self.store.count_products().await?,
            customer_count: self.store.count_customers().await?,
        })
    }

    /// Revenue and order count per day or month, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::StoreUnavailable` if the store fails.
    pub async fn revenue_by_period(&self, period: Period) -> Result<Vec<RevenueBucket>> {
        let orders = self.store.all_orders().await?;

        let format = match period {
            Period::Day => "%Y-%m-%d",
            Period::Month => "%Y-%m",
        };
        let mut buckets: BTreeMap<String, (Price, u64)> = BTreeMap::new();
        for order in counted(&orders) {
            let key = order.created_at.format(format).to_string();
            let entry = buckets.entry(key).or_insert((Price::ZERO, 0));
            entry.0 = entry.0 + order.total;
            entry.1 += 1;
        }

        Ok(buckets
            .into_iter()
            .map(|(period, (revenue, orders))| RevenueBucket {
                period,
                revenue,
                orders,
            })
            .collect())
    }

    /// Best sellers by units, then revenue.
    ///
    /// # Errors
    ///
    /// Returns `AppError::StoreUnavailable` if the store fails.
    pub async fn top_products(&self, limit: usize) -> Result<Vec<TopProduct>> {
        let orders = self.store.all_orders().await?;

        let mut totals: HashMap<ProductId, TopProduct> = HashMap::new();
        for item in counted(&orders).flat_map(|o| &o.items) {
            let entry = totals.entry(item.product_id).or_insert_with(|| TopProduct {
                product_id: item.product_id,
                name: item.name.clone(),
                units: 0,
                revenue: Price::ZERO,
            });
            entry.units += u64::from(item.quantity);
            entry.revenue = entry.revenue + item.line_total();
        }

        let mut ranked: Vec<TopProduct> = totals.into_values().collect();
        ranked.sort_by(|a, b| {
            b.units
                .cmp(&a.units)
                .then(b.revenue.cmp(&a.revenue))
                .then(a.product_id.cmp(&b.product_id))
        });
        ranked.truncate(limit);
        Ok(ranked)
    }

    /// Products at or below `threshold`, lowest stock first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::StoreUnavailable` if the store fails.
    pub async fn low_stock(&self, threshold: u32) -> Result<Vec<ProductSummary>> {
        Ok(self.store.low_stock(threshold).await?)
    }
}
