//! Organization-category handlers.

use async_trait::async_trait;
use cat_catalog::ActionParams;
use cat_core::{ActorId, UserId};
use serde_json::json;

use crate::handler::{ActionHandler, HandlerError, HandlerResult};
use crate::store::AppStore;

/// `create_organization` - found an organization with the user as founder.
pub struct CreateOrganizationHandler;

#[async_trait]
impl ActionHandler for CreateOrganizationHandler {
    async fn handle(
        &self,
        store: &dyn AppStore,
        user: &UserId,
        _actor: &ActorId,
        params: ActionParams,
    ) -> HandlerResult {
        let ActionParams::CreateOrganization(p) = params else {
            return Err(HandlerError::ParameterMismatch);
        };
        let organization_id = store
            .insert_organization(user, &p.name, p.about.as_deref())
            .await?;
        Ok(json!({ "organization_id": organization_id, "name": p.name }))
    }
}

/// `invite_organization_member` - add a member on the user's behalf.
pub struct InviteOrganizationMemberHandler;

#[async_trait]
impl ActionHandler for InviteOrganizationMemberHandler {
    async fn handle(
        &self,
        store: &dyn AppStore,
        user: &UserId,
        _actor: &ActorId,
        params: ActionParams,
    ) -> HandlerResult {
        let ActionParams::InviteOrganizationMember(p) = params else {
            return Err(HandlerError::ParameterMismatch);
        };
        let role = p.role.as_deref().unwrap_or("member");
        store
            .insert_organization_member(&p.organization_id, user, &p.invitee_id, role)
            .await?;
        Ok(json!({
            "organization_id": p.organization_id,
            "invitee_id": p.invitee_id,
            "role": role,
        }))
    }
}
