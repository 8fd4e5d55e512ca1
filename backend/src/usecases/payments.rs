use std::{collections::HashMap, sync::Arc};

use anyhow::{Result as AnyResult, anyhow};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use crates::{
    domain::{
        entities::{
            clubs::ClubEntity,
            payments::{InsertPaymentEntity, PaymentEntity},
            students::InsertStudentEntity,
            subscriptions::InsertSubscriptionEntity,
        },
        errors::{CoreError, CoreResult},
        repositories::{
            clubs::ClubRepository, groups::GroupRepository, payments::PaymentRepository,
            students::StudentRepository, subscriptions::SubscriptionRepository,
            unit_of_work::UnitOfWork,
        },
        value_objects::{
            enums::{
                payment_methods::PaymentMethod, payment_statuses::PaymentStatus,
                subscription_statuses::SubscriptionStatus,
            },
            payments::{
                CheckoutRequestModel, CheckoutResponse, CheckoutStudent, ManualPaymentModel,
                ProviderEventKind, ProviderMetadata, ReconcileOutcome,
            },
        },
    },
    payments::stripe_client::{
        StripeCharge, StripeCheckoutHandle, StripeCheckoutRequest, StripeCheckoutSession,
        StripeClient, StripeEvent,
    },
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{access::GroupAccess, subscription_ledger::SubscriptionLedger};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_checkout_session(
        &self,
        request: StripeCheckoutRequest,
    ) -> AnyResult<StripeCheckoutHandle>;

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<StripeEvent>;
}

#[async_trait]
impl PaymentGateway for StripeClient {
    async fn create_checkout_session(
        &self,
        request: StripeCheckoutRequest,
    ) -> AnyResult<StripeCheckoutHandle> {
        StripeClient::create_checkout_session(self, &request).await
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> AnyResult<StripeEvent> {
        StripeClient::verify_webhook_signature(self, payload, signature)
    }
}

#[derive(Debug, Clone)]
pub struct PaymentSettings {
    /// Used when a club has no currency of its own.
    pub default_currency: String,
    /// Validity window granted when a payment activates a subscription.
    pub activation_days: i64,
}

pub struct PaymentUseCase<G, C, St, Sub, P, U, Gw>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    St: StudentRepository + Send + Sync + 'static,
    Sub: SubscriptionRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    access: GroupAccess<G, C>,
    student_repo: Arc<St>,
    subscription_repo: Arc<Sub>,
    payment_repo: Arc<P>,
    unit_of_work: Arc<U>,
    gateway: Arc<Gw>,
    settings: PaymentSettings,
}

impl<G, C, St, Sub, P, U, Gw> PaymentUseCase<G, C, St, Sub, P, U, Gw>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    St: StudentRepository + Send + Sync + 'static,
    Sub: SubscriptionRepository + Send + Sync + 'static,
    P: PaymentRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
    Gw: PaymentGateway + Send + Sync + 'static,
{
    pub fn new(
        access: GroupAccess<G, C>,
        student_repo: Arc<St>,
        subscription_repo: Arc<Sub>,
        payment_repo: Arc<P>,
        unit_of_work: Arc<U>,
        gateway: Arc<Gw>,
        settings: PaymentSettings,
    ) -> Self {
        Self {
            access,
            student_repo,
            subscription_repo,
            payment_repo,
            unit_of_work,
            gateway,
            settings,
        }
    }

    /// Public checkout. Creates (or reuses) the student, a pending subscription and a
    /// pending payment, and returns the hosted checkout URL.
    pub async fn create_checkout(&self, model: CheckoutRequestModel) -> CoreResult<CheckoutResponse> {
        let student_ref = model.validate().map_err(|reason| {
            warn!(group_id = %model.group_id, %reason, "payments: invalid checkout request");
            CoreError::BadRequest(reason)
        })?;
        let scope = self.access.scope(model.group_id).await?;

        let student = match student_ref {
            CheckoutStudent::Existing(student_id) => {
                let student = self.student_repo.find_by_id(student_id).await?;
                if student.club_id != scope.club.id {
                    warn!(%student_id, club_id = %scope.club.id, "payments: student belongs to another club");
                    return Err(CoreError::NotFound("student"));
                }
                student
            }
            CheckoutStudent::New(new_student) => {
                let parent_contact = new_student
                    .parent_contact
                    .as_ref()
                    .map(serde_json::to_value)
                    .transpose()
                    .map_err(|err| CoreError::Internal(err.into()))?;
                let created = self
                    .student_repo
                    .create(InsertStudentEntity {
                        club_id: scope.club.id,
                        name: new_student.name.trim().to_string(),
                        parent_contact,
                        notes: None,
                    })
                    .await
                    .map_err(|err| {
                        error!(club_id = %scope.club.id, db_error = ?err, "payments: failed to create student");
                        err
                    })?;
                info!(student_id = %created.id, "payments: student created for checkout");
                created
            }
        };

        let terms = model.subscription;
        let subscription = self
            .subscription_repo
            .create(InsertSubscriptionEntity {
                student_id: student.id,
                group_id: scope.group.id,
                total_sessions: terms.total_sessions,
                remaining_sessions: terms.total_sessions,
                price_minor: terms.price_minor,
                starts_at: None,
                expires_at: None,
                status: SubscriptionStatus::Pending.as_str().to_string(),
            })
            .await
            .map_err(|err| {
                error!(student_id = %student.id, db_error = ?err, "payments: failed to create pending subscription");
                err
            })?;

        let currency = self.currency_for(&scope.club);
        let metadata = HashMap::from([
            ("subscription_id".to_string(), subscription.id.to_string()),
            ("student_id".to_string(), student.id.to_string()),
            ("group_id".to_string(), scope.group.id.to_string()),
            ("club_id".to_string(), scope.club.id.to_string()),
        ]);
        let request = StripeCheckoutRequest {
            product_name: format!(
                "{}: {} sessions",
                scope.group.title, terms.total_sessions
            ),
            currency: currency.clone(),
            unit_amount_minor: terms.price_minor,
            success_url: model.success_url.clone(),
            cancel_url: model.cancel_url.clone(),
            customer_email: student
                .parent_contact
                .as_ref()
                .and_then(|contact| contact.email.clone()),
            metadata,
        };

        let handle = self
            .gateway
            .create_checkout_session(request)
            .await
            .map_err(|err| {
                error!(subscription_id = %subscription.id, error = ?err, "payments: failed to create stripe checkout session");
                CoreError::Internal(err)
            })?;

        let pending = InsertPaymentEntity {
            subscription_id: subscription.id,
            amount_minor: terms.price_minor,
            currency,
            method: PaymentMethod::Stripe.as_str().to_string(),
            status: PaymentStatus::Pending.as_str().to_string(),
            provider_payment_id: Some(handle.id.clone()),
            provider_metadata: ProviderMetadata {
                checkout_session_id: Some(handle.id.clone()),
                student_name: Some(student.name.clone()),
                group_title: Some(scope.group.title.clone()),
                ..ProviderMetadata::default()
            }
            .to_json(),
            paid_at: None,
        };
        // The provider session already exists; a lost row only delays reconciliation.
        if let Err(err) = self.payment_repo.create(pending).await {
            error!(
                subscription_id = %subscription.id,
                checkout_session_id = %handle.id,
                db_error = ?err,
                "payments: failed to store pending payment"
            );
        }

        info!(
            subscription_id = %subscription.id,
            checkout_session_id = %handle.id,
            "payments: checkout session created"
        );
        Ok(CheckoutResponse {
            checkout_url: handle.url,
            session_id: handle.id,
            subscription_id: subscription.id,
        })
    }

    /// Verifies and applies one provider notification. Only an unverifiable or unreadable
    /// payload is an error; reconciliation problems are logged so the provider stops
    /// retrying.
    pub async fn handle_provider_event(&self, payload: &[u8], signature: &str) -> CoreResult<()> {
        let event = self
            .gateway
            .verify_webhook_signature(payload, signature)
            .map_err(|err| {
                warn!(error = %err, "payments: stripe webhook verification failed");
                CoreError::Unverified
            })?;
        info!(event_id = ?event.id, event_type = %event.type_, "payments: stripe webhook verified");

        let result = match ProviderEventKind::from(event.type_.as_str()) {
            ProviderEventKind::CheckoutCompleted => {
                let session = checkout_session_of(&event)?;
                self.reconcile_checkout_completed(&session)
            }
            ProviderEventKind::CheckoutExpired => {
                let session = checkout_session_of(&event)?;
                self.reconcile_checkout_expired(&session)
            }
            ProviderEventKind::ChargeRefunded => {
                let charge = StripeClient::extract_charge(&event).ok_or_else(|| {
                    CoreError::BadRequest("charge.refunded without a charge object".to_string())
                })?;
                self.reconcile_refund(&charge)
            }
            ProviderEventKind::Unknown(event_type) => {
                debug!(%event_type, "payments: ignoring stripe event");
                return Ok(());
            }
        };

        match result {
            Ok(outcome) => {
                info!(event_type = %event.type_, ?outcome, "payments: stripe webhook reconciled")
            }
            Err(err) => error!(
                event_type = %event.type_,
                error = ?err,
                "payments: stripe webhook reconciliation failed"
            ),
        }
        Ok(())
    }

    /// Pending payment to succeeded and its subscription to active, atomically.
    pub fn reconcile_checkout_completed(
        &self,
        session: &StripeCheckoutSession,
    ) -> CoreResult<ReconcileOutcome> {
        let now = Utc::now();
        let expires_at = now + Duration::days(self.settings.activation_days);

        self.unit_of_work.transaction(|tx| {
            let Some(payment) = tx.lock_payment_by_provider_ref(&session.id)? else {
                warn!(checkout_session_id = %session.id, "payments: no payment for completed checkout");
                return Ok(ReconcileOutcome::UnknownPayment);
            };
            let status = known_status(&payment)?;
            if status == PaymentStatus::Succeeded {
                info!(payment_id = %payment.id, "payments: checkout already reconciled");
                return Ok(ReconcileOutcome::AlreadyProcessed);
            }
            ensure_transition(status, PaymentStatus::Succeeded)?;

            let mut metadata = payment.provider_metadata.clone();
            if session.payment_intent.is_some() {
                metadata.payment_intent = session.payment_intent.clone();
            }
            tx.set_payment_status(payment.id, PaymentStatus::Succeeded, Some(now), &metadata)?;
            let subscription = SubscriptionLedger::new(&mut *tx).activate(
                payment.subscription_id,
                None,
                Some(expires_at),
            )?;

            info!(
                payment_id = %payment.id,
                subscription_id = %subscription.id,
                "payments: checkout completed, subscription active"
            );
            Ok(ReconcileOutcome::Applied)
        })
    }

    /// Pending payment to failed; a still-pending subscription is cancelled with it.
    pub fn reconcile_checkout_expired(
        &self,
        session: &StripeCheckoutSession,
    ) -> CoreResult<ReconcileOutcome> {
        self.unit_of_work.transaction(|tx| {
            let Some(payment) = tx.lock_payment_by_provider_ref(&session.id)? else {
                warn!(checkout_session_id = %session.id, "payments: no payment for expired checkout");
                return Ok(ReconcileOutcome::UnknownPayment);
            };
            let status = known_status(&payment)?;
            if status != PaymentStatus::Pending {
                info!(payment_id = %payment.id, %status, "payments: expired checkout already settled");
                return Ok(ReconcileOutcome::AlreadyProcessed);
            }

            tx.set_payment_status(
                payment.id,
                PaymentStatus::Failed,
                None,
                &payment.provider_metadata,
            )?;
            let subscription = tx.lock_subscription(payment.subscription_id)?;
            if subscription.status() == Some(SubscriptionStatus::Pending) {
                SubscriptionLedger::new(&mut *tx).cancel(subscription.id)?;
            }

            info!(payment_id = %payment.id, "payments: checkout expired");
            Ok(ReconcileOutcome::Applied)
        })
    }

    /// Marks the payment refunded. The subscription and its credits stay as they are.
    pub fn reconcile_refund(&self, charge: &StripeCharge) -> CoreResult<ReconcileOutcome> {
        let Some(payment_intent) = charge.payment_intent.as_deref() else {
            info!(charge_id = %charge.id, "payments: refunded charge has no payment intent");
            return Ok(ReconcileOutcome::Ignored);
        };

        self.unit_of_work.transaction(|tx| {
            let Some(payment) = tx.lock_payment_by_payment_intent(payment_intent)? else {
                warn!(%payment_intent, "payments: no payment for refunded charge");
                return Ok(ReconcileOutcome::UnknownPayment);
            };
            let status = known_status(&payment)?;
            if status == PaymentStatus::Refunded {
                return Ok(ReconcileOutcome::AlreadyProcessed);
            }
            if !status.can_transition_to(PaymentStatus::Refunded) {
                warn!(payment_id = %payment.id, %status, "payments: refund for a payment that never succeeded");
                return Ok(ReconcileOutcome::Ignored);
            }

            tx.set_payment_status(
                payment.id,
                PaymentStatus::Refunded,
                payment.paid_at,
                &payment.provider_metadata,
            )?;
            info!(
                payment_id = %payment.id,
                charge_id = %charge.id,
                subscription_id = %payment.subscription_id,
                "payments: refund recorded, subscription left unchanged"
            );
            Ok(ReconcileOutcome::Applied)
        })
    }

    /// Cash or manual payment recorded by the club owner. Activates a pending subscription.
    pub async fn create_manual(
        &self,
        actor_id: Uuid,
        model: ManualPaymentModel,
    ) -> CoreResult<PaymentEntity> {
        let method = PaymentMethod::from_str(model.method.trim())
            .filter(PaymentMethod::is_offline)
            .ok_or_else(|| {
                CoreError::UnprocessableEntity("method must be cash or manual".to_string())
            })?;
        if model.amount_minor < 0 {
            return Err(CoreError::BadRequest(
                "amount must not be negative".to_string(),
            ));
        }

        let subscription = self.subscription_repo.find_by_id(model.subscription_id).await?;
        let scope = self
            .access
            .ensure_owner(actor_id, subscription.group_id)
            .await?;
        let currency = self.currency_for(&scope.club);

        let now = Utc::now();
        let expires_at = now + Duration::days(self.settings.activation_days);
        let notes = model
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
            .map(str::to_string);

        let payment = self.unit_of_work.transaction(|tx| {
            let locked = tx.lock_subscription(subscription.id)?;
            let payment = tx.insert_payment(InsertPaymentEntity {
                subscription_id: locked.id,
                amount_minor: model.amount_minor,
                currency,
                method: method.as_str().to_string(),
                status: PaymentStatus::Succeeded.as_str().to_string(),
                provider_payment_id: None,
                provider_metadata: ProviderMetadata {
                    notes,
                    ..ProviderMetadata::default()
                }
                .to_json(),
                paid_at: Some(now),
            })?;

            if locked.status() == Some(SubscriptionStatus::Pending) {
                SubscriptionLedger::new(&mut *tx).activate(locked.id, None, Some(expires_at))?;
            }
            Ok(payment)
        })?;

        info!(
            payment_id = %payment.id,
            subscription_id = %subscription.id,
            %method,
            "payments: manual payment recorded"
        );
        Ok(payment)
    }

    pub async fn list_by_subscription(
        &self,
        actor_id: Uuid,
        subscription_id: Uuid,
    ) -> CoreResult<Vec<PaymentEntity>> {
        let subscription = self.subscription_repo.find_by_id(subscription_id).await?;
        self.access
            .ensure_owner(actor_id, subscription.group_id)
            .await?;

        self.payment_repo.list_by_subscription(subscription_id).await
    }

    pub async fn get(&self, actor_id: Uuid, payment_id: Uuid) -> CoreResult<PaymentEntity> {
        let payment = self.payment_repo.find_by_id(payment_id).await?;
        let subscription = self
            .subscription_repo
            .find_by_id(payment.subscription_id)
            .await?;
        self.access
            .ensure_owner(actor_id, subscription.group_id)
            .await?;
        Ok(payment)
    }

    fn currency_for(&self, club: &ClubEntity) -> String {
        let currency = club.currency.trim();
        if currency.is_empty() {
            self.settings.default_currency.clone()
        } else {
            currency.to_lowercase()
        }
    }
}

fn checkout_session_of(event: &StripeEvent) -> CoreResult<StripeCheckoutSession> {
    StripeClient::extract_checkout_session(event).ok_or_else(|| {
        CoreError::BadRequest(format!("{} without a checkout session object", event.type_))
    })
}

fn known_status(payment: &PaymentEntity) -> CoreResult<PaymentStatus> {
    payment.status().ok_or_else(|| {
        CoreError::Internal(anyhow!(
            "payment {} has unknown status {:?}",
            payment.id,
            payment.status
        ))
    })
}

fn ensure_transition(from: PaymentStatus, to: PaymentStatus) -> CoreResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(CoreError::InvalidTransition {
            from: from.as_str(),
            to: to.as_str(),
        })
    }
}
