use std::sync::Arc;

use chrono::{DateTime, Utc};
use crates::domain::{
    entities::{
        attendances::{AttendanceEntity, InsertAttendanceEntity},
        sessions::SessionEntity,
    },
    errors::{CoreError, CoreResult, ErrorKind},
    repositories::{
        attendances::AttendanceRepository,
        clubs::ClubRepository,
        groups::GroupRepository,
        sessions::SessionRepository,
        unit_of_work::{TxStore, UnitOfWork},
    },
    value_objects::{
        attendances::{BulkAttendanceModel, BulkAttendanceResult, MarkAttendanceModel},
        enums::attendance_statuses::AttendanceStatus,
    },
};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{access::GroupAccess, subscription_ledger::SubscriptionLedger};

const NO_ACTIVE_SUBSCRIPTION: &str = "no active subscription";

pub struct AttendanceUseCase<Ses, G, C, A, U>
where
    Ses: SessionRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    session_repo: Arc<Ses>,
    access: GroupAccess<G, C>,
    attendance_repo: Arc<A>,
    unit_of_work: Arc<U>,
    restore_credit_on_delete: bool,
}

impl<Ses, G, C, A, U> AttendanceUseCase<Ses, G, C, A, U>
where
    Ses: SessionRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    pub fn new(
        session_repo: Arc<Ses>,
        access: GroupAccess<G, C>,
        attendance_repo: Arc<A>,
        unit_of_work: Arc<U>,
        restore_credit_on_delete: bool,
    ) -> Self {
        Self {
            session_repo,
            access,
            attendance_repo,
            unit_of_work,
            restore_credit_on_delete,
        }
    }

    /// Records one attendance. A `present` mark consumes a credit in the same transaction.
    pub async fn mark(
        &self,
        actor_id: Uuid,
        model: MarkAttendanceModel,
    ) -> CoreResult<AttendanceEntity> {
        let MarkAttendanceModel {
            session_id,
            student_id,
            status,
        } = model;
        info!(%actor_id, %session_id, %student_id, %status, "attendance: mark requested");

        let session = self.session_repo.find_by_id(session_id).await?;

        if self.attendance_repo.exists(session_id, student_id).await? {
            warn!(%session_id, %student_id, "attendance: already marked");
            return Err(already_marked());
        }

        self.access.ensure_staff(actor_id, session.group_id).await?;

        let noted_at = Utc::now();
        let attendance = self
            .unit_of_work
            .transaction(|tx| record(tx, &session, student_id, status, actor_id, noted_at))
            .map_err(|err| {
                if err.is(ErrorKind::Internal) {
                    error!(%session_id, %student_id, db_error = ?err, "attendance: failed to record");
                } else {
                    warn!(%session_id, %student_id, reason = %err, "attendance: mark rejected");
                }
                err
            })?;

        info!(
            attendance_id = %attendance.id,
            subscription_id = ?attendance.subscription_id,
            "attendance: recorded"
        );
        Ok(attendance)
    }

    /// Marks several students for one session. Each item runs in its own savepoint, so a
    /// failing item never undoes the others.
    pub async fn mark_bulk(
        &self,
        actor_id: Uuid,
        model: BulkAttendanceModel,
    ) -> CoreResult<Vec<BulkAttendanceResult>> {
        let BulkAttendanceModel {
            session_id,
            attendances,
        } = model;
        if attendances.is_empty() {
            return Err(CoreError::BadRequest(
                "attendances must not be empty".to_string(),
            ));
        }
        info!(%actor_id, %session_id, items = attendances.len(), "attendance: bulk mark requested");

        let session = self.session_repo.find_by_id(session_id).await?;
        self.access.ensure_staff(actor_id, session.group_id).await?;

        let noted_at = Utc::now();
        let results = self.unit_of_work.transaction(|tx| {
            let mut results = Vec::with_capacity(attendances.len());

            for item in &attendances {
                let Ok(student_id) = Uuid::parse_str(item.student_id.trim()) else {
                    results.push(BulkAttendanceResult::failed(
                        item.student_id.clone(),
                        "invalid student_id",
                    ));
                    continue;
                };

                let mut recorded: Option<AttendanceEntity> = None;
                let outcome = tx.savepoint(&mut |tx| {
                    recorded = Some(record(tx, &session, student_id, item.status, actor_id, noted_at)?);
                    Ok(())
                });

                let result = match (outcome, recorded) {
                    (Ok(()), Some(attendance)) => {
                        BulkAttendanceResult::recorded(item.student_id.clone(), attendance.id)
                    }
                    (Ok(()), None) => BulkAttendanceResult::failed(
                        item.student_id.clone(),
                        "failed to record attendance",
                    ),
                    (Err(err), _) => {
                        warn!(%session_id, %student_id, reason = %err, "attendance: bulk item rejected");
                        BulkAttendanceResult::failed(item.student_id.clone(), bulk_item_error(&err))
                    }
                };
                results.push(result);
            }

            Ok(results)
        })?;

        let recorded = results.iter().filter(|r| r.success).count();
        info!(
            %session_id,
            recorded,
            failed = results.len() - recorded,
            "attendance: bulk mark finished"
        );
        Ok(results)
    }

    /// Changes the status only. Credits are left as they are.
    pub async fn update(
        &self,
        actor_id: Uuid,
        attendance_id: Uuid,
        status: AttendanceStatus,
    ) -> CoreResult<AttendanceEntity> {
        let existing = self.attendance_repo.find_by_id(attendance_id).await?;
        let session = self.session_repo.find_by_id(existing.session_id).await?;
        self.access.ensure_staff(actor_id, session.group_id).await?;

        let updated = self
            .attendance_repo
            .update_status(attendance_id, status, actor_id, Utc::now())
            .await?;

        info!(%attendance_id, from = %existing.status, to = %status, "attendance: status updated");
        Ok(updated)
    }

    /// Removes a record. With credit restoration enabled, a record that consumed a credit
    /// gives it back to its subscription while that subscription is still active.
    pub async fn delete(&self, actor_id: Uuid, attendance_id: Uuid) -> CoreResult<()> {
        let existing = self.attendance_repo.find_by_id(attendance_id).await?;
        let session = self.session_repo.find_by_id(existing.session_id).await?;
        self.access.ensure_staff(actor_id, session.group_id).await?;

        let restore = self.restore_credit_on_delete;
        let restored = self.unit_of_work.transaction(|tx| {
            let locked = tx.lock_attendance(attendance_id)?;
            tx.delete_attendance(locked.id)?;

            match locked.subscription_id {
                Some(subscription_id) if restore => {
                    SubscriptionLedger::new(&mut *tx).restore_credit(subscription_id)
                }
                _ => Ok(None),
            }
        })?;

        info!(
            %attendance_id,
            credit_restored = restored.is_some(),
            "attendance: deleted"
        );
        Ok(())
    }

    pub async fn list_by_session(
        &self,
        actor_id: Uuid,
        session_id: Uuid,
    ) -> CoreResult<Vec<AttendanceEntity>> {
        let session = self.session_repo.find_by_id(session_id).await?;
        self.access.ensure_staff(actor_id, session.group_id).await?;

        self.attendance_repo.list_by_session(session_id).await
    }
}

fn record(
    tx: &mut dyn TxStore,
    session: &SessionEntity,
    student_id: Uuid,
    status: AttendanceStatus,
    noted_by: Uuid,
    noted_at: DateTime<Utc>,
) -> CoreResult<AttendanceEntity> {
    if tx.attendance_exists(session.id, student_id)? {
        return Err(already_marked());
    }

    let subscription_id = if status.consumes_credit() {
        let mut ledger = SubscriptionLedger::new(&mut *tx);
        let eligible = ledger
            .find_eligible(student_id, session.group_id, session.start_at)
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => {
                    CoreError::UnprocessableEntity(NO_ACTIVE_SUBSCRIPTION.to_string())
                }
                _ => err,
            })?;
        ledger.decrement(eligible.id)?;
        Some(eligible.id)
    } else {
        None
    };

    tx.insert_attendance(InsertAttendanceEntity {
        session_id: session.id,
        student_id,
        subscription_id,
        status: status.as_str().to_string(),
        noted_by,
        noted_at,
    })
}

fn already_marked() -> CoreError {
    CoreError::Conflict("attendance already marked for this student and session".to_string())
}

fn bulk_item_error(err: &CoreError) -> String {
    match err.kind() {
        ErrorKind::Conflict => "already marked".to_string(),
        ErrorKind::UnprocessableEntity => NO_ACTIVE_SUBSCRIPTION.to_string(),
        ErrorKind::Internal => "failed to record attendance".to_string(),
        _ => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::test_support::{
        MemoryState, MemoryUnitOfWork, club, group, session, subscription,
    };
    use chrono::Duration;
    use crates::domain::{
        entities::{clubs::ClubEntity, groups::GroupEntity, subscriptions::SubscriptionEntity},
        repositories::{
            attendances::MockAttendanceRepository, clubs::MockClubRepository,
            groups::MockGroupRepository, sessions::MockSessionRepository,
        },
        value_objects::{
            attendances::BulkAttendanceItemModel,
            enums::subscription_statuses::SubscriptionStatus,
        },
    };
    use std::collections::HashMap;

    type TestUseCase = AttendanceUseCase<
        MockSessionRepository,
        MockGroupRepository,
        MockClubRepository,
        MockAttendanceRepository,
        MemoryUnitOfWork,
    >;

    struct Fixture {
        owner: Uuid,
        coach: Uuid,
        student: Uuid,
        club: ClubEntity,
        group: GroupEntity,
        sessions: Vec<SessionEntity>,
    }

    impl Fixture {
        fn new(session_count: usize) -> Self {
            let owner = Uuid::new_v4();
            let coach = Uuid::new_v4();
            let club = club(owner);
            let group = group(club.id, Some(coach));
            let now = Utc::now();
            let sessions = (0..session_count)
                .map(|i| session(group.id, now + Duration::hours(i as i64 + 1)))
                .collect();
            Self {
                owner,
                coach,
                student: Uuid::new_v4(),
                club,
                group,
                sessions,
            }
        }

        fn active_subscription(&self, remaining: i32) -> SubscriptionEntity {
            subscription(self.student, self.group.id, SubscriptionStatus::Active, remaining, 8)
        }

        fn usecase(&self, uow: Arc<MemoryUnitOfWork>, restore_credit_on_delete: bool) -> TestUseCase {
            let by_id: HashMap<Uuid, SessionEntity> =
                self.sessions.iter().map(|s| (s.id, s.clone())).collect();
            let mut session_repo = MockSessionRepository::new();
            session_repo.expect_find_by_id().returning(move |id| {
                by_id
                    .get(&id)
                    .cloned()
                    .ok_or(CoreError::NotFound("session"))
            });

            let group = self.group.clone();
            let mut group_repo = MockGroupRepository::new();
            group_repo
                .expect_find_by_id()
                .returning(move |_| Ok(group.clone()));

            let club = self.club.clone();
            let mut club_repo = MockClubRepository::new();
            club_repo
                .expect_find_by_id()
                .returning(move |_| Ok(club.clone()));

            let snapshot_source = Arc::clone(&uow);
            let mut attendance_repo = MockAttendanceRepository::new();
            attendance_repo
                .expect_exists()
                .returning(|_, _| Ok(false));
            attendance_repo.expect_find_by_id().returning(move |id| {
                snapshot_source
                    .snapshot()
                    .attendances
                    .get(&id)
                    .cloned()
                    .ok_or(CoreError::NotFound("attendance"))
            });

            AttendanceUseCase::new(
                Arc::new(session_repo),
                GroupAccess::new(Arc::new(group_repo), Arc::new(club_repo)),
                Arc::new(attendance_repo),
                uow,
                restore_credit_on_delete,
            )
        }
    }

    fn seeded(subscriptions: Vec<SubscriptionEntity>) -> Arc<MemoryUnitOfWork> {
        let mut state = MemoryState::default();
        for sub in subscriptions {
            state.subscriptions.insert(sub.id, sub);
        }
        Arc::new(MemoryUnitOfWork::with_state(state))
    }

    fn mark(fixture: &Fixture, session: usize, status: AttendanceStatus) -> MarkAttendanceModel {
        MarkAttendanceModel {
            session_id: fixture.sessions[session].id,
            student_id: fixture.student,
            status,
        }
    }

    #[tokio::test]
    async fn present_mark_consumes_one_credit() {
        let fixture = Fixture::new(1);
        let sub = fixture.active_subscription(5);
        let uow = seeded(vec![sub.clone()]);
        let usecase = fixture.usecase(Arc::clone(&uow), false);

        let attendance = usecase
            .mark(fixture.coach, mark(&fixture, 0, AttendanceStatus::Present))
            .await
            .unwrap();

        assert_eq!(attendance.subscription_id, Some(sub.id));
        assert_eq!(attendance.noted_by, fixture.coach);
        let state = uow.snapshot();
        assert_eq!(state.subscriptions[&sub.id].remaining_sessions, 4);
        assert_eq!(state.attendances.len(), 1);
    }

    #[tokio::test]
    async fn absent_mark_leaves_credit_alone() {
        let fixture = Fixture::new(1);
        let sub = fixture.active_subscription(5);
        let uow = seeded(vec![sub.clone()]);
        let usecase = fixture.usecase(Arc::clone(&uow), false);

        let attendance = usecase
            .mark(fixture.owner, mark(&fixture, 0, AttendanceStatus::Absent))
            .await
            .unwrap();

        assert_eq!(attendance.subscription_id, None);
        assert_eq!(uow.snapshot().subscriptions[&sub.id].remaining_sessions, 5);
    }

    #[tokio::test]
    async fn last_credit_marks_subscription_used() {
        let fixture = Fixture::new(1);
        let sub = fixture.active_subscription(1);
        let uow = seeded(vec![sub.clone()]);
        let usecase = fixture.usecase(Arc::clone(&uow), false);

        usecase
            .mark(fixture.coach, mark(&fixture, 0, AttendanceStatus::Present))
            .await
            .unwrap();

        let stored = &uow.snapshot().subscriptions[&sub.id];
        assert_eq!(stored.remaining_sessions, 0);
        assert_eq!(stored.status(), Some(SubscriptionStatus::Used));
    }

    #[tokio::test]
    async fn present_without_subscription_is_unprocessable_and_writes_nothing() {
        let fixture = Fixture::new(1);
        let uow = seeded(vec![]);
        let usecase = fixture.usecase(Arc::clone(&uow), false);

        let err = usecase
            .mark(fixture.coach, mark(&fixture, 0, AttendanceStatus::Present))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnprocessableEntity);
        assert!(uow.snapshot().attendances.is_empty());
    }

    #[tokio::test]
    async fn second_mark_for_same_session_is_a_conflict() {
        let fixture = Fixture::new(1);
        let sub = fixture.active_subscription(5);
        let uow = seeded(vec![sub.clone()]);
        let usecase = fixture.usecase(Arc::clone(&uow), false);

        usecase
            .mark(fixture.coach, mark(&fixture, 0, AttendanceStatus::Present))
            .await
            .unwrap();
        let err = usecase
            .mark(fixture.coach, mark(&fixture, 0, AttendanceStatus::Present))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        let state = uow.snapshot();
        assert_eq!(state.attendances.len(), 1);
        assert_eq!(state.subscriptions[&sub.id].remaining_sessions, 4);
    }

    #[tokio::test]
    async fn strangers_cannot_mark() {
        let fixture = Fixture::new(1);
        let uow = seeded(vec![fixture.active_subscription(5)]);
        let usecase = fixture.usecase(Arc::clone(&uow), false);

        let err = usecase
            .mark(Uuid::new_v4(), mark(&fixture, 0, AttendanceStatus::Present))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Forbidden);
        assert!(uow.snapshot().attendances.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_marks_never_overdraw_the_last_credit() {
        let fixture = Fixture::new(2);
        let sub = fixture.active_subscription(1);
        let uow = seeded(vec![sub.clone()]);
        let usecase = Arc::new(fixture.usecase(Arc::clone(&uow), false));

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let usecase = Arc::clone(&usecase);
                let model = mark(&fixture, i, AttendanceStatus::Present);
                let coach = fixture.coach;
                tokio::spawn(async move { usecase.mark(coach, model).await })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(err) => assert_eq!(err.kind(), ErrorKind::UnprocessableEntity),
            }
        }

        assert_eq!(succeeded, 1);
        let state = uow.snapshot();
        assert_eq!(state.subscriptions[&sub.id].remaining_sessions, 0);
        assert_eq!(state.subscriptions[&sub.id].status(), Some(SubscriptionStatus::Used));
        assert_eq!(state.attendances.len(), 1);
    }

    #[tokio::test]
    async fn bulk_reports_each_item_and_keeps_the_good_ones() {
        let fixture = Fixture::new(1);
        let sub = fixture.active_subscription(5);
        let uow = seeded(vec![sub.clone()]);
        let usecase = fixture.usecase(Arc::clone(&uow), false);
        let unpaid_student = Uuid::new_v4();

        let results = usecase
            .mark_bulk(
                fixture.coach,
                BulkAttendanceModel {
                    session_id: fixture.sessions[0].id,
                    attendances: vec![
                        BulkAttendanceItemModel {
                            student_id: fixture.student.to_string(),
                            status: AttendanceStatus::Present,
                        },
                        BulkAttendanceItemModel {
                            student_id: "not-a-uuid".to_string(),
                            status: AttendanceStatus::Present,
                        },
                        BulkAttendanceItemModel {
                            student_id: unpaid_student.to_string(),
                            status: AttendanceStatus::Present,
                        },
                        BulkAttendanceItemModel {
                            student_id: fixture.student.to_string(),
                            status: AttendanceStatus::Absent,
                        },
                    ],
                },
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 4);
        assert!(results[0].success);
        assert_eq!(results[1].error.as_deref(), Some("invalid student_id"));
        assert_eq!(results[2].error.as_deref(), Some(NO_ACTIVE_SUBSCRIPTION));
        assert_eq!(results[3].error.as_deref(), Some("already marked"));

        let state = uow.snapshot();
        assert_eq!(state.attendances.len(), 1);
        assert_eq!(state.subscriptions[&sub.id].remaining_sessions, 4);
    }

    #[tokio::test]
    async fn delete_restores_credit_only_when_enabled() {
        for (restore, expected_remaining) in [(false, 4), (true, 5)] {
            let fixture = Fixture::new(1);
            let sub = fixture.active_subscription(5);
            let uow = seeded(vec![sub.clone()]);
            let usecase = fixture.usecase(Arc::clone(&uow), restore);

            let attendance = usecase
                .mark(fixture.coach, mark(&fixture, 0, AttendanceStatus::Present))
                .await
                .unwrap();
            usecase.delete(fixture.owner, attendance.id).await.unwrap();

            let state = uow.snapshot();
            assert!(state.attendances.is_empty());
            assert_eq!(
                state.subscriptions[&sub.id].remaining_sessions,
                expected_remaining
            );
        }
    }
}
