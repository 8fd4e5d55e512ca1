use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use crates::domain::{
    entities::sessions::SessionEntity,
    errors::{CoreError, CoreResult},
    repositories::{
        attendances::AttendanceRepository, clubs::ClubRepository, groups::GroupRepository,
        sessions::SessionRepository,
    },
    value_objects::schedules::{InsertSessionModel, SessionRangeQuery, UpdateSessionModel},
};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::access::GroupAccess;

pub struct SessionUseCase<Ses, G, C, A>
where
    Ses: SessionRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
{
    access: GroupAccess<G, C>,
    session_repo: Arc<Ses>,
    attendance_repo: Arc<A>,
    club_offset: FixedOffset,
}

impl<Ses, G, C, A> SessionUseCase<Ses, G, C, A>
where
    Ses: SessionRepository + Send + Sync + 'static,
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
    A: AttendanceRepository + Send + Sync + 'static,
{
    pub fn new(
        access: GroupAccess<G, C>,
        session_repo: Arc<Ses>,
        attendance_repo: Arc<A>,
        club_offset: FixedOffset,
    ) -> Self {
        Self {
            access,
            session_repo,
            attendance_repo,
            club_offset,
        }
    }

    pub async fn create(
        &self,
        actor_id: Uuid,
        group_id: Uuid,
        model: InsertSessionModel,
    ) -> CoreResult<SessionEntity> {
        let row = model.into_entity(group_id)?;
        self.access.ensure_staff(actor_id, group_id).await?;

        let session = self.session_repo.create(row).await.map_err(|err| {
            error!(%group_id, db_error = ?err, "sessions: failed to create session");
            err
        })?;

        info!(session_id = %session.id, %group_id, %actor_id, "sessions: session created");
        Ok(session)
    }

    pub async fn list_by_group(
        &self,
        actor_id: Uuid,
        group_id: Uuid,
        range: SessionRangeQuery,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<SessionEntity>> {
        let (from, to) = range.window(now, &self.club_offset)?;
        self.access.ensure_staff(actor_id, group_id).await?;
        self.session_repo.list_by_group(group_id, from, to).await
    }

    pub async fn get(&self, actor_id: Uuid, session_id: Uuid) -> CoreResult<SessionEntity> {
        let session = self.session_repo.find_by_id(session_id).await?;
        self.access.ensure_staff(actor_id, session.group_id).await?;
        Ok(session)
    }

    pub async fn update(
        &self,
        actor_id: Uuid,
        session_id: Uuid,
        model: UpdateSessionModel,
    ) -> CoreResult<SessionEntity> {
        let changes = model.into_changeset()?;
        let session = self.get(actor_id, session_id).await?;

        let updated = self.session_repo.update(session.id, changes).await?;
        info!(%session_id, %actor_id, "sessions: session updated");
        Ok(updated)
    }

    /// Sessions with recorded attendance stay, their records back the credit ledger.
    pub async fn delete(&self, actor_id: Uuid, session_id: Uuid) -> CoreResult<()> {
        let session = self.get(actor_id, session_id).await?;

        let recorded = self.attendance_repo.list_by_session(session.id).await?;
        if !recorded.is_empty() {
            warn!(%session_id, records = recorded.len(), "sessions: refusing to delete a session with attendance");
            return Err(CoreError::Conflict(
                "session has attendance records".to_string(),
            ));
        }

        self.session_repo.delete(session.id).await?;
        info!(%session_id, %actor_id, "sessions: session deleted");
        Ok(())
    }
}
