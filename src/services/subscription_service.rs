use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use super::billing_service::BillingService;
use super::error::{ServiceError, ServiceResult};
use super::validation::{is_valid_amount, is_valid_slug, FieldErrors};
use crate::database::SubscriptionStore;
use crate::models::{BillingInterval, Subscription, SubscriptionPlan};
use crate::payment::{PaymentDispatcher, PaymentRequest};

/// Plans are always charged in this currency.
const PLAN_CURRENCY: &str = "USD";

/// (name, slug, price in whole dollars, features)
const DEFAULT_PLANS: &[(&str, &str, i64, &str)] = &[
    ("Free Tier", "free", 0, "Basic features, 10 products"),
    ("Basic Plan", "basic", 29, "Standard features, 100 products"),
    ("Pro Plan", "pro", 79, "Advanced features, unlimited products"),
    ("Enterprise", "enterprise", 299, "All features, priority support"),
];

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanInput {
    pub name: String,
    pub slug: String,
    pub price: Decimal,
    pub billing_interval: BillingInterval,
    #[serde(default)]
    pub features: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequest {
    pub plan_id: Uuid,
    pub payment_method: Option<String>,
    pub payment_token: Option<String>,
}

#[derive(Clone)]
pub struct SubscriptionService {
    subscriptions: Arc<dyn SubscriptionStore>,
    billing: BillingService,
    payments: Arc<PaymentDispatcher>,
}

impl SubscriptionService {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionStore>,
        billing: BillingService,
        payments: Arc<PaymentDispatcher>,
    ) -> Self {
        Self {
            subscriptions,
            billing,
            payments,
        }
    }

    pub async fn list_active_plans(&self) -> ServiceResult<Vec<SubscriptionPlan>> {
        Ok(self.subscriptions.list_plans(true).await?)
    }

    pub async fn list_all_plans(&self) -> ServiceResult<Vec<SubscriptionPlan>> {
        Ok(self.subscriptions.list_plans(false).await?)
    }

    pub async fn create_plan(&self, input: PlanInput) -> ServiceResult<SubscriptionPlan> {
        validate_plan(&input)?;
        if self.subscriptions.find_plan_by_slug(input.slug.trim()).await?.is_some() {
            return Err(ServiceError::duplicate(format!(
                "Plan with slug '{}' already exists",
                input.slug.trim()
            )));
        }

        let plan = SubscriptionPlan {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            slug: input.slug.trim().to_string(),
            price: input.price,
            billing_interval: input.billing_interval,
            features: input.features,
            active: true,
        };
        self.subscriptions.insert_plan(&plan).await?;
        tracing::info!(plan_id = %plan.id, slug = %plan.slug, "plan created");
        Ok(plan)
    }

    pub async fn update_plan(&self, id: Uuid, input: PlanInput) -> ServiceResult<SubscriptionPlan> {
        validate_plan(&input)?;
        let mut plan = self.plan(id).await?;

        let slug = input.slug.trim();
        if slug != plan.slug {
            if let Some(existing) = self.subscriptions.find_plan_by_slug(slug).await? {
                if existing.id != id {
                    return Err(ServiceError::duplicate(format!(
                        "Plan with slug '{}' already exists",
                        slug
                    )));
                }
            }
        }

        plan.name = input.name.trim().to_string();
        plan.slug = slug.to_string();
        plan.price = input.price;
        plan.billing_interval = input.billing_interval;
        plan.features = input.features;
        self.subscriptions.update_plan(&plan).await?;
        Ok(plan)
    }

    /// Soft delete: the plan stays for existing subscriptions but is no
    /// longer offered.
    pub async fn deactivate_plan(&self, id: Uuid) -> ServiceResult<SubscriptionPlan> {
        let mut plan = self.plan(id).await?;
        plan.active = false;
        self.subscriptions.update_plan(&plan).await?;
        tracing::info!(plan_id = %id, "plan deactivated");
        Ok(plan)
    }

    /// Create any default plan whose slug is not taken yet. Returns the plans
    /// that were created.
    pub async fn seed_default_plans(&self) -> ServiceResult<Vec<SubscriptionPlan>> {
        let mut created = Vec::new();
        for &(name, slug, dollars, features) in DEFAULT_PLANS {
            if self.subscriptions.find_plan_by_slug(slug).await?.is_some() {
                continue;
            }
            let plan = self
                .create_plan(PlanInput {
                    name: name.to_string(),
                    slug: slug.to_string(),
                    price: Decimal::new(dollars, 0),
                    billing_interval: BillingInterval::Monthly,
                    features: features.to_string(),
                })
                .await?;
            created.push(plan);
        }
        Ok(created)
    }

    pub async fn current_subscription(&self, tenant_id: Uuid) -> ServiceResult<Option<Subscription>> {
        Ok(self.subscriptions.find_active(tenant_id).await?)
    }

    /// Switch the tenant to `plan_id`. Paid plans are charged first; the
    /// previous ACTIVE subscription is cancelled when the new one is stored.
    pub async fn subscribe(&self, tenant_id: Uuid, request: SubscribeRequest) -> ServiceResult<Subscription> {
        let plan = self
            .subscriptions
            .find_plan(request.plan_id)
            .await?
            .filter(|plan| plan.active)
            .ok_or_else(|| ServiceError::not_found(format!("Plan not found with id: {}", request.plan_id)))?;

        if plan.price > Decimal::ZERO {
            let description = format!("Subscription to {}", plan.name);
            let outcome = self
                .payments
                .process(&PaymentRequest {
                    amount: plan.price,
                    currency: PLAN_CURRENCY.to_string(),
                    payment_method: request.payment_method,
                    description: description.clone(),
                    payment_token: request.payment_token,
                })
                .await?;

            self.billing
                .settle(tenant_id, plan.price, PLAN_CURRENCY, &description, &outcome)
                .await?;

            if !outcome.success {
                let reason = outcome
                    .failure_reason
                    .unwrap_or_else(|| "Payment was declined".to_string());
                tracing::warn!(%tenant_id, plan = %plan.slug, %reason, "subscription payment failed");
                return Err(ServiceError::PaymentFailed(reason));
            }
        }

        let subscription = Subscription::start(tenant_id, &plan);
        self.subscriptions.activate(&subscription).await?;
        tracing::info!(
            %tenant_id,
            plan = %plan.slug,
            subscription_id = %subscription.id,
            end_date = %subscription.end_date,
            "subscription activated"
        );
        Ok(subscription)
    }

    /// Stop auto-renewal. The subscription stays ACTIVE until its end date.
    pub async fn cancel_subscription(&self, tenant_id: Uuid) -> ServiceResult<Subscription> {
        let mut subscription = self
            .subscriptions
            .find_active(tenant_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("No active subscription found"))?;
        subscription.auto_renew = false;
        self.subscriptions.update(&subscription).await?;
        tracing::info!(%tenant_id, subscription_id = %subscription.id, "subscription auto-renew cancelled");
        Ok(subscription)
    }

    async fn plan(&self, id: Uuid) -> ServiceResult<SubscriptionPlan> {
        self.subscriptions
            .find_plan(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(format!("Plan not found with id: {}", id)))
    }
}

fn validate_plan(input: &PlanInput) -> ServiceResult<()> {
    let mut errors = FieldErrors::new();
    errors
        .require(&input.name, "name")
        .check(
            is_valid_slug(input.slug.trim()),
            "slug",
            "Slug must contain only lowercase letters, numbers, and hyphens",
        )
        .check(
            is_valid_amount(input.price),
            "price",
            "Price must be between 0 and 1000000000 with at most 2 decimal places",
        );
    errors.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Stores;
    use crate::models::SubscriptionStatus;

    fn service(stores: &Stores) -> SubscriptionService {
        SubscriptionService::new(
            stores.subscriptions.clone(),
            BillingService::new(stores.billing.clone()),
            Arc::new(PaymentDispatcher::with_defaults()),
        )
    }

    fn subscribe_to(plan: &SubscriptionPlan) -> SubscribeRequest {
        SubscribeRequest {
            plan_id: plan.id,
            payment_method: None,
            payment_token: None,
        }
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let stores = Stores::memory();
        let service = service(&stores);
        assert_eq!(service.seed_default_plans().await.unwrap().len(), 4);
        assert!(service.seed_default_plans().await.unwrap().is_empty());
        assert_eq!(service.list_active_plans().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn duplicate_plan_slug() {
        let stores = Stores::memory();
        let service = service(&stores);
        let plans = service.seed_default_plans().await.unwrap();
        let pro = plans.iter().find(|p| p.slug == "pro").unwrap();

        let err = service
            .update_plan(
                pro.id,
                PlanInput {
                    name: "Pro Plan".into(),
                    slug: "basic".into(),
                    price: Decimal::new(79, 0),
                    billing_interval: BillingInterval::Monthly,
                    features: String::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Duplicate(_)));
    }

    #[tokio::test]
    async fn subscribing_twice_leaves_one_active() {
        let stores = Stores::memory();
        let service = service(&stores);
        let plans = service.seed_default_plans().await.unwrap();
        let tenant = Uuid::new_v4();

        let first = service.subscribe(tenant, subscribe_to(&plans[1])).await.unwrap();
        let second = service.subscribe(tenant, subscribe_to(&plans[2])).await.unwrap();
        assert_ne!(first.id, second.id);

        let current = service.current_subscription(tenant).await.unwrap().unwrap();
        assert_eq!(current.id, second.id);
        assert_eq!(current.status, SubscriptionStatus::Active);
        assert!(current.auto_renew);

        // both paid plans produced a PAID invoice
        assert_eq!(stores.billing.list_invoices(tenant).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn free_plan_is_not_charged() {
        let stores = Stores::memory();
        let service = service(&stores);
        let plans = service.seed_default_plans().await.unwrap();
        let free = plans.iter().find(|p| p.price.is_zero()).unwrap();
        let tenant = Uuid::new_v4();

        service.subscribe(tenant, subscribe_to(free)).await.unwrap();
        assert!(stores.billing.list_invoices(tenant).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inactive_plan_cannot_be_chosen() {
        let stores = Stores::memory();
        let service = service(&stores);
        let plans = service.seed_default_plans().await.unwrap();
        service.deactivate_plan(plans[0].id).await.unwrap();

        assert!(matches!(
            service.subscribe(Uuid::new_v4(), subscribe_to(&plans[0])).await,
            Err(ServiceError::NotFound(_))
        ));
        assert_eq!(service.list_active_plans().await.unwrap().len(), 3);
        assert_eq!(service.list_all_plans().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn cancel_turns_off_renewal() {
        let stores = Stores::memory();
        let service = service(&stores);
        let plans = service.seed_default_plans().await.unwrap();
        let tenant = Uuid::new_v4();

        assert!(matches!(
            service.cancel_subscription(tenant).await,
            Err(ServiceError::NotFound(_))
        ));

        service.subscribe(tenant, subscribe_to(&plans[0])).await.unwrap();
        let cancelled = service.cancel_subscription(tenant).await.unwrap();
        assert!(!cancelled.auto_renew);
        assert_eq!(cancelled.status, SubscriptionStatus::Active);
    }
}
