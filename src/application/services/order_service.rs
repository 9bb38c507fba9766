use crate::application::live::{LiveQuery, SnapshotFn};
use crate::application::ports::realtime::RealtimeGateway;
use crate::application::ports::repositories::{ClientRepository, OrderRepository, SortDir};
use crate::domain::entities::{NewOrder, Order, OrderChanges};
use crate::domain::value_objects::RecordId;
use crate::shared::error::AppError;
use crate::shared::validation::{require_field, validate_price};
use std::sync::Arc;
use tracing::info;

pub struct OrderService {
    orders: Arc<dyn OrderRepository>,
    clients: Arc<dyn ClientRepository>,
    realtime: Arc<dyn RealtimeGateway>,
    page_size: usize,
}

impl OrderService {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        clients: Arc<dyn ClientRepository>,
        realtime: Arc<dyn RealtimeGateway>,
        page_size: usize,
    ) -> Self {
        Self {
            orders,
            clients,
            realtime,
            page_size,
        }
    }

    /// Inserts an order on behalf of the signed-in user. The user must have a
    /// client record, which sign-in creates.
    pub async fn create_order(
        &self,
        user_id: &RecordId,
        fields: NewOrder,
    ) -> Result<Order, AppError> {
        validate_new_order(&fields)?;

        let client = self
            .clients
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(
                    "Could not find client record. Please ensure you have signed up.".to_string(),
                )
            })?;

        let order = Order::new(client.id, fields);
        let inserted = self.orders.insert(&order).await?;
        info!(order_id = %inserted.id, "order created");
        Ok(inserted)
    }

    pub async fn update_order(
        &self,
        id: &RecordId,
        changes: OrderChanges,
    ) -> Result<Order, AppError> {
        if let Some(price) = changes.price {
            validate_price(price)?;
        }

        let mut order = self
            .orders
            .get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Order not found: {id}")))?;
        order.apply_changes(changes);
        self.orders.update(&order).await
    }

    pub async fn delete_order(&self, id: &RecordId) -> Result<(), AppError> {
        self.orders.delete(id).await?;
        info!(order_id = %id, "order deleted");
        Ok(())
    }

    /// First order for a given customer name, as the dashboard's demo update
    /// and delete actions look orders up.
    pub async fn find_order_by_name(&self, name: &str) -> Result<Option<Order>, AppError> {
        self.orders.find_by_name(name).await
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        self.orders.list(SortDir::Descending).await
    }

    /// Opens the reconciled live view over the orders table: bulk fetch plus
    /// the change feed, paged for the list view.
    pub async fn live_orders(&self) -> Result<LiveQuery<Order>, AppError> {
        let repo = Arc::clone(&self.orders);
        let fetch: SnapshotFn<Order> = Arc::new(move || {
            let repo = Arc::clone(&repo);
            Box::pin(async move { repo.list(SortDir::Descending).await })
        });

        let stream = self.realtime.subscribe_orders().await?;
        LiveQuery::open(fetch, stream, self.page_size).await
    }
}

fn validate_new_order(fields: &NewOrder) -> Result<(), AppError> {
    require_field(&fields.name, "name")?;
    require_field(&fields.address, "address")?;
    require_field(&fields.city, "city")?;
    require_field(&fields.zip_code, "zip_code")?;
    validate_price(fields.price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ClientRecord;
    use crate::infrastructure::memory::MemoryBackend;
    use std::time::Duration;
    use tokio::time::sleep;

    fn sample_fields() -> NewOrder {
        NewOrder {
            name: "Emily Williams".to_string(),
            address: "324 Main Avenue".to_string(),
            city: "New York".to_string(),
            zip_code: "11990".to_string(),
            price: 34.0,
        }
    }

    async fn setup() -> (OrderService, Arc<MemoryBackend>, RecordId) {
        let backend = MemoryBackend::new();
        let user_id = RecordId::new("user-1");
        let client = ClientRecord::new(user_id.clone(), "emily@example.com".to_string());
        backend
            .upsert_by_email(&client)
            .await
            .expect("seed client record");

        let service = OrderService::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
            10,
        );
        (service, backend, user_id)
    }

    #[tokio::test]
    async fn create_order_links_the_client_record() {
        let (service, backend, user_id) = setup().await;

        let order = service
            .create_order(&user_id, sample_fields())
            .await
            .expect("order created");

        let client = backend
            .find_by_user_id(&user_id)
            .await
            .expect("lookup")
            .expect("client exists");
        assert_eq!(order.client_id, client.id);
        assert_eq!(order.price, 34.0);
    }

    #[tokio::test]
    async fn create_order_without_a_client_record_fails() {
        let backend = MemoryBackend::new();
        let service = OrderService::new(backend.clone(), backend.clone(), backend, 10);

        let err = service
            .create_order(&RecordId::new("stranger"), sample_fields())
            .await
            .expect_err("no client record");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn create_order_rejects_bad_fields() {
        let (service, _backend, user_id) = setup().await;

        let mut missing_name = sample_fields();
        missing_name.name = "  ".to_string();
        assert!(matches!(
            service.create_order(&user_id, missing_name).await,
            Err(AppError::Validation(_))
        ));

        let mut bad_price = sample_fields();
        bad_price.price = -1.0;
        assert!(matches!(
            service.create_order(&user_id, bad_price).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn update_order_applies_partial_changes() {
        let (service, _backend, user_id) = setup().await;
        let order = service
            .create_order(&user_id, sample_fields())
            .await
            .expect("order created");

        let updated = service
            .update_order(
                &order.id,
                OrderChanges {
                    address: Some("456 Oak Street".to_string()),
                    city: Some("Los Angeles".to_string()),
                    price: Some(75.0),
                    ..OrderChanges::default()
                },
            )
            .await
            .expect("update succeeds");

        assert_eq!(updated.name, "Emily Williams");
        assert_eq!(updated.city, "Los Angeles");
        assert_eq!(updated.price, 75.0);
    }

    #[tokio::test]
    async fn update_of_missing_order_is_not_found() {
        let (service, _backend, _user_id) = setup().await;
        let err = service
            .update_order(&RecordId::new("missing"), OrderChanges::default())
            .await
            .expect_err("missing order");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn find_by_name_returns_the_oldest_match() {
        let (service, _backend, user_id) = setup().await;
        let first = service
            .create_order(&user_id, sample_fields())
            .await
            .expect("first order");
        sleep(Duration::from_millis(5)).await;
        service
            .create_order(&user_id, sample_fields())
            .await
            .expect("second order");

        let found = service
            .find_order_by_name("Emily Williams")
            .await
            .expect("lookup")
            .expect("match exists");
        assert_eq!(found.id, first.id);
    }

    #[tokio::test]
    async fn live_orders_reflects_later_mutations() {
        let (service, _backend, user_id) = setup().await;
        service
            .create_order(&user_id, sample_fields())
            .await
            .expect("seed order");

        let live = service.live_orders().await.expect("open live view");
        assert_eq!(live.len().await, 1);

        let second = service
            .create_order(&user_id, sample_fields())
            .await
            .expect("second order");
        sleep(Duration::from_millis(50)).await;
        assert_eq!(live.len().await, 2);

        service.delete_order(&second.id).await.expect("delete");
        sleep(Duration::from_millis(50)).await;
        assert_eq!(live.len().await, 1);
    }
}
