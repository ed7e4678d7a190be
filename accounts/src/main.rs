//! Account service binary.
//!
//! Wires the Postgres stores, the Redis customer cache, the HTTP clients and
//! the Redpanda bus, then runs the inbound consumers until Ctrl-C.

use account_service::clients::{
    http_client, HttpCreditClient, HttpCustomerClient, HttpEligibilityClient,
};
use account_service::consumers::{
    AccountConsumers, CardLinkConsumer, CustomerEventConsumer, WalletAssociationConsumer,
};
use account_service::stores::{
    postgres, PostgresAccountRepository, PostgresDebitCardRepository, RedisCustomerCache,
};
use account_service::{
    AccountEventPublisher, AccountPolicyEngine, Config, CustomerGateway, CustomerResolver,
    DebitCardLifecycle, DependencyBreakers, EligibilityGate,
};
use account_service_core::environment::{Clock, SystemClock};
use account_service_core::event_bus::EventBus;
use account_service_redpanda::RedpandaEventBus;
use account_service_runtime::metrics::MetricsServer;
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut metrics = MetricsServer::new(config.metrics_addr);
    metrics.start().context("failed to start metrics exporter")?;

    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .connect(&config.postgres.url)
        .await
        .context("failed to connect to PostgreSQL")?;
    postgres::migrate(&pool).await?;

    let cache = Arc::new(
        RedisCustomerCache::new(&config.redis_url)
            .await
            .context("failed to connect to Redis")?,
    );

    let bus: Arc<dyn EventBus> = Arc::new(
        RedpandaEventBus::builder()
            .brokers(config.redpanda.brokers.clone())
            .consumer_group(config.redpanda.consumer_group.clone())
            .producer_acks(config.redpanda.producer_acks.clone())
            .compression(config.redpanda.compression.clone())
            .timeout(config.redpanda.send_timeout)
            .buffer_size(config.redpanda.buffer_size)
            .auto_offset_reset(config.redpanda.auto_offset_reset.clone())
            .build()
            .context("failed to create Redpanda event bus")?,
    );

    let http = http_client(config.services.request_timeout)?;
    let breakers = DependencyBreakers::new(&config.breakers);
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let accounts = Arc::new(PostgresAccountRepository::new(pool.clone()));
    let cards = Arc::new(PostgresDebitCardRepository::new(pool));

    let gateway = CustomerGateway::new(
        Arc::new(HttpCustomerClient::new(
            http.clone(),
            &config.services.customer_url,
        )),
        breakers.customer.clone(),
    );
    let resolver = CustomerResolver::new(cache.clone(), gateway.clone());
    let gate = EligibilityGate::new(
        Arc::new(HttpEligibilityClient::new(
            http.clone(),
            &config.services.eligibility_url,
        )),
        Arc::new(HttpCreditClient::new(http, &config.services.credit_url)),
        &breakers,
    );

    let engine = AccountPolicyEngine::new(
        accounts.clone(),
        resolver,
        gate.clone(),
        AccountEventPublisher::new(bus.clone(), &config.topics),
        clock.clone(),
        config.policy.clone(),
    );
    let lifecycle = DebitCardLifecycle::new(cards, accounts, gate, clock);

    let topics = config.topics.clone();
    let consumers = AccountConsumers::new(
        CustomerEventConsumer::new(cache),
        WalletAssociationConsumer::new(
            gateway.clone(),
            engine.clone(),
            bus.clone(),
            &topics.wallet_association_response,
        ),
        CardLinkConsumer::new(
            gateway,
            engine,
            lifecycle,
            bus.clone(),
            &topics.card_link_confirmed,
            &topics.card_link_rejected,
        ),
        topics,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, shutting down");
        }
        shutdown_tx.send(true).ok();
    });

    tracing::info!(brokers = %config.redpanda.brokers, "Account service started");
    consumers.run(bus.as_ref(), shutdown_rx).await?;
    tracing::info!("Account service stopped");

    Ok(())
}
