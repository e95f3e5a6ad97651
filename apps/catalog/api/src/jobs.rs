//! Background jobs.

use domain_products::{DeletedSkuRepository, ProductRepository, ProductService, ProductSource};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::info;

/// Start a scheduler that runs a product sync on `cron_expr`.
///
/// Sync failures are logged by the service and never stop the scheduler.
/// The caller owns the returned scheduler and shuts it down on exit.
pub async fn start_sync_scheduler<P, D, S>(
    service: ProductService<P, D, S>,
    cron_expr: &str,
) -> eyre::Result<JobScheduler>
where
    P: ProductRepository + 'static,
    D: DeletedSkuRepository + 'static,
    S: ProductSource + 'static,
{
    let job = Job::new_async(cron_expr, move |_uuid, _l| {
        let service = service.clone();
        Box::pin(async move {
            service.run_scheduled_sync().await;
        })
    })
    .map_err(|e| eyre::eyre!("Invalid SYNC_CRON expression {cron_expr:?}: {e}"))?;

    let sched = JobScheduler::new().await?;
    sched.add(job).await?;
    sched.start().await?;

    info!(cron = cron_expr, "Product sync scheduled");
    Ok(sched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_SYNC_CRON;
    use domain_products::{
        ContentfulClient, ContentfulConfig, MongoDeletedSkuRepository, MongoProductRepository,
    };

    async fn service() -> crate::state::CatalogService {
        // The driver connects lazily, so nothing here touches the network.
        let client = mongodb::Client::with_uri_str("mongodb://127.0.0.1:1").await.unwrap();
        let db = client.database("catalog_test");
        let source = ContentfulClient::new(ContentfulConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            space_id: "space".to_string(),
            environment: "master".to_string(),
            access_token: "token".to_string(),
            content_type: "product".to_string(),
            timeout_secs: 1,
        })
        .unwrap();
        ProductService::new(
            MongoProductRepository::new(&db),
            MongoDeletedSkuRepository::new(&db),
            source,
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_rejects_invalid_cron() {
        let err = start_sync_scheduler(service().await, "every hour")
            .await
            .err()
            .expect("invalid cron should be rejected");
        assert!(err.to_string().contains("SYNC_CRON"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_starts_and_shuts_down_with_default_cron() {
        let mut sched = start_sync_scheduler(service().await, DEFAULT_SYNC_CRON)
            .await
            .unwrap();
        sched.shutdown().await.unwrap();
    }
}
