use std::sync::Arc;

use chrono::FixedOffset;
use crates::domain::{
    entities::sessions::SessionEntity,
    errors::CoreResult,
    repositories::{clubs::ClubRepository, groups::GroupRepository, unit_of_work::UnitOfWork},
    value_objects::schedules::{RecurrenceRule, RecurringSessionsModel},
};
use tracing::{info, warn};
use uuid::Uuid;

use super::access::GroupAccess;

pub struct ScheduleUseCase<G, C, U>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    access: GroupAccess<G, C>,
    unit_of_work: Arc<U>,
    club_offset: FixedOffset,
}

impl<G, C, U> ScheduleUseCase<G, C, U>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    U: UnitOfWork + Send + Sync + 'static,
{
    pub fn new(access: GroupAccess<G, C>, unit_of_work: Arc<U>, club_offset: FixedOffset) -> Self {
        Self {
            access,
            unit_of_work,
            club_offset,
        }
    }

    /// Expands a weekly rule into concrete sessions and stores them all or none.
    pub async fn create_recurring(
        &self,
        actor_id: Uuid,
        group_id: Uuid,
        model: RecurringSessionsModel,
    ) -> CoreResult<Vec<SessionEntity>> {
        self.access.ensure_staff(actor_id, group_id).await?;

        let rule = RecurrenceRule::parse(&model).map_err(|err| {
            warn!(%group_id, reason = %err, "schedule: invalid recurrence rule");
            err
        })?;
        let rows = rule.expand(group_id, &self.club_offset)?;

        let created = self
            .unit_of_work
            .transaction(|tx| tx.insert_sessions(&rows))?;

        info!(%group_id, count = created.len(), "schedule: recurring sessions created");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecases::test_support::{MemoryUnitOfWork, club, group};
    use crates::domain::{
        errors::ErrorKind,
        repositories::{clubs::MockClubRepository, groups::MockGroupRepository},
    };

    fn model(weekdays: Vec<i32>, from: &str, to: &str) -> RecurringSessionsModel {
        RecurringSessionsModel {
            start_time: "18:30".to_string(),
            weekdays,
            from_date: from.to_string(),
            to_date: to.to_string(),
            duration_minutes: 90,
            location: Some("Hall A".to_string()),
        }
    }

    fn usecase(coach: Uuid, uow: Arc<MemoryUnitOfWork>) -> (ScheduleUseCase<MockGroupRepository, MockClubRepository, MemoryUnitOfWork>, Uuid) {
        let club = club(Uuid::new_v4());
        let group = group(club.id, Some(coach));
        let group_id = group.id;

        let mut group_repo = MockGroupRepository::new();
        group_repo
            .expect_find_by_id()
            .returning(move |_| Ok(group.clone()));
        let mut club_repo = MockClubRepository::new();
        club_repo
            .expect_find_by_id()
            .returning(move |_| Ok(club.clone()));

        let offset = FixedOffset::east_opt(5 * 3600).unwrap();
        (
            ScheduleUseCase::new(
                GroupAccess::new(Arc::new(group_repo), Arc::new(club_repo)),
                uow,
                offset,
            ),
            group_id,
        )
    }

    #[tokio::test]
    async fn coach_creates_a_week_of_sessions() {
        let coach = Uuid::new_v4();
        let uow = Arc::new(MemoryUnitOfWork::default());
        let (usecase, group_id) = usecase(coach, Arc::clone(&uow));

        let created = usecase
            .create_recurring(coach, group_id, model(vec![1, 3, 5], "2025-12-01", "2025-12-07"))
            .await
            .unwrap();

        assert_eq!(created.len(), 3);
        assert!(created.iter().all(|s| s.group_id == group_id && s.duration_minutes == 90));
        assert_eq!(uow.snapshot().sessions.len(), 3);
    }

    #[tokio::test]
    async fn empty_expansion_stores_nothing() {
        let coach = Uuid::new_v4();
        let uow = Arc::new(MemoryUnitOfWork::default());
        let (usecase, group_id) = usecase(coach, Arc::clone(&uow));

        // 2025-12-01 is a Monday; Saturday never falls in range.
        let err = usecase
            .create_recurring(coach, group_id, model(vec![6], "2025-12-01", "2025-12-02"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::BadRequest);
        assert!(uow.snapshot().sessions.is_empty());
    }

    #[tokio::test]
    async fn strangers_cannot_schedule() {
        let uow = Arc::new(MemoryUnitOfWork::default());
        let (usecase, group_id) = usecase(Uuid::new_v4(), Arc::clone(&uow));

        let err = usecase
            .create_recurring(Uuid::new_v4(), group_id, model(vec![1], "2025-12-01", "2025-12-07"))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }
}
