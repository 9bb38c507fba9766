use crate::application::ports::repositories::{OrderRepository, SortDir};
use crate::shared::error::AppError;
use chrono::Datelike;
use std::sync::Arc;

/// Headline numbers for the dashboard cards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SalesOverview {
    pub total_orders: usize,
    pub total_revenue: f64,
    pub average_order: f64,
}

/// One month of aggregated order activity.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPoint {
    pub year: i32,
    pub month: u32,
    pub orders: usize,
    pub revenue: f64,
}

impl MonthlyPoint {
    /// Short label for chart axes, e.g. `2026-08`.
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

pub struct AnalyticsService {
    orders: Arc<dyn OrderRepository>,
}

impl AnalyticsService {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn overview(&self) -> Result<SalesOverview, AppError> {
        let orders = self.orders.list(SortDir::Ascending).await?;
        let total_orders = orders.len();
        let total_revenue: f64 = orders.iter().map(|order| order.price).sum();
        let average_order = if total_orders == 0 {
            0.0
        } else {
            total_revenue / total_orders as f64
        };

        Ok(SalesOverview {
            total_orders,
            total_revenue,
            average_order,
        })
    }

    /// Order counts and revenue bucketed per calendar month, oldest first.
    /// Months with no orders do not appear.
    pub async fn monthly_series(&self) -> Result<Vec<MonthlyPoint>, AppError> {
        let orders = self.orders.list(SortDir::Ascending).await?;

        let mut series: Vec<MonthlyPoint> = Vec::new();
        for order in orders {
            let (year, month) = (order.created_at.year(), order.created_at.month());
            match series
                .iter_mut()
                .find(|point| point.year == year && point.month == month)
            {
                Some(point) => {
                    point.orders += 1;
                    point.revenue += order.price;
                }
                None => series.push(MonthlyPoint {
                    year,
                    month,
                    orders: 1,
                    revenue: order.price,
                }),
            }
        }

        series.sort_by_key(|point| (point.year, point.month));
        Ok(series)
    }
}
