use std::sync::Arc;

use crates::domain::{
    entities::{clubs::ClubEntity, groups::GroupEntity},
    errors::{CoreError, CoreResult},
    repositories::{clubs::ClubRepository, groups::GroupRepository},
};
use tracing::warn;
use uuid::Uuid;

/// A group together with the club that owns it.
#[derive(Debug, Clone)]
pub struct GroupScope {
    pub group: GroupEntity,
    pub club: ClubEntity,
}

impl GroupScope {
    pub fn is_owner(&self, user_id: Uuid) -> bool {
        self.club.owner_user_id == user_id
    }

    pub fn is_staff(&self, user_id: Uuid) -> bool {
        self.is_owner(user_id) || self.group.is_coached_by(user_id)
    }
}

/// Resolves a group to its club and answers "may this user act here".
pub struct GroupAccess<G, C>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
{
    group_repo: Arc<G>,
    club_repo: Arc<C>,
}

impl<G, C> GroupAccess<G, C>
where
    G: GroupRepository + Send + Sync + 'static,
    C: ClubRepository + Send + Sync + 'static,
{
    pub fn new(group_repo: Arc<G>, club_repo: Arc<C>) -> Self {
        Self {
            group_repo,
            club_repo,
        }
    }

    pub async fn scope(&self, group_id: Uuid) -> CoreResult<GroupScope> {
        let group = self.group_repo.find_by_id(group_id).await?;
        let club = self.club_repo.find_by_id(group.club_id).await?;
        Ok(GroupScope { group, club })
    }

    /// Club owner or the group's coach.
    pub async fn ensure_staff(&self, actor_id: Uuid, group_id: Uuid) -> CoreResult<GroupScope> {
        let scope = self.scope(group_id).await?;
        if !scope.is_staff(actor_id) {
            warn!(%actor_id, %group_id, "access: actor is neither owner nor coach");
            return Err(CoreError::Forbidden(
                "you don't have access to this group".to_string(),
            ));
        }
        Ok(scope)
    }

    pub async fn ensure_owner(&self, actor_id: Uuid, group_id: Uuid) -> CoreResult<GroupScope> {
        let scope = self.scope(group_id).await?;
        if !scope.is_owner(actor_id) {
            warn!(%actor_id, %group_id, "access: actor is not the club owner");
            return Err(CoreError::Forbidden(
                "only the club owner can do this".to_string(),
            ));
        }
        Ok(scope)
    }

    pub async fn ensure_club_owner(&self, actor_id: Uuid, club_id: Uuid) -> CoreResult<ClubEntity> {
        let club = self.club_repo.find_by_id(club_id).await?;
        if club.owner_user_id != actor_id {
            warn!(%actor_id, %club_id, "access: actor is not the club owner");
            return Err(CoreError::Forbidden(
                "only the club owner can do this".to_string(),
            ));
        }
        Ok(club)
    }

    /// Club owner, or the coach of any group in the club.
    pub async fn ensure_club_staff(&self, actor_id: Uuid, club_id: Uuid) -> CoreResult<ClubEntity> {
        let club = self.club_repo.find_by_id(club_id).await?;
        if club.owner_user_id == actor_id {
            return Ok(club);
        }

        let groups = self.group_repo.list_by_club(club_id).await?;
        if !groups.iter().any(|group| group.is_coached_by(actor_id)) {
            warn!(%actor_id, %club_id, "access: actor has no role in the club");
            return Err(CoreError::Forbidden(
                "you don't have access to this club".to_string(),
            ));
        }
        Ok(club)
    }
}
