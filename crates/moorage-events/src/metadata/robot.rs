//! Robot account and role binding resolvers.
//!
//! Both prefix the entity name with the configured robot/role prefix so
//! downstream consumers see the externally visible name.

use moorage_core::events::topic;
use moorage_core::events::{Event, EventData, RobotEvent, RoleEvent};
use moorage_core::result::AppResult;

use super::{Metadata, ResolveContext, envelope};

/// A robot account was created.
#[derive(Debug, Clone)]
pub struct CreateRobotMetadata {
    /// The owning project.
    pub project_id: i64,
    /// The unprefixed robot account name.
    pub name: String,
}

impl Metadata for CreateRobotMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::CREATE_ROBOT,
            ctx.request.principal.clone().unwrap_or_default(),
            EventData::RobotCreated(RobotEvent {
                project_id: self.project_id,
                name: format!("{}{}", ctx.config.robot_prefix, self.name),
            }),
        ))
    }
}

/// A robot account was deleted.
#[derive(Debug, Clone)]
pub struct DeleteRobotMetadata {
    /// The owning project.
    pub project_id: i64,
    /// The unprefixed robot account name.
    pub name: String,
}

impl Metadata for DeleteRobotMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::DELETE_ROBOT,
            ctx.request.principal.clone().unwrap_or_default(),
            EventData::RobotDeleted(RobotEvent {
                project_id: self.project_id,
                name: format!("{}{}", ctx.config.robot_prefix, self.name),
            }),
        ))
    }
}

/// A role binding was created.
#[derive(Debug, Clone)]
pub struct CreateRoleMetadata {
    /// The owning project.
    pub project_id: i64,
    /// The unprefixed role name.
    pub role: String,
    /// The user or group the role was granted to.
    pub grantee: String,
}

impl Metadata for CreateRoleMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::CREATE_ROLE,
            ctx.request.principal.clone().unwrap_or_default(),
            EventData::RoleCreated(RoleEvent {
                project_id: self.project_id,
                role: format!("{}{}", ctx.config.role_prefix, self.role),
                grantee: self.grantee.clone(),
            }),
        ))
    }
}

/// A role binding was deleted.
#[derive(Debug, Clone)]
pub struct DeleteRoleMetadata {
    /// The owning project.
    pub project_id: i64,
    /// The unprefixed role name.
    pub role: String,
    /// The user or group the role was revoked from.
    pub grantee: String,
}

impl Metadata for DeleteRoleMetadata {
    fn resolve(&self, ctx: &ResolveContext<'_>) -> AppResult<Event> {
        Ok(envelope(
            ctx,
            topic::DELETE_ROLE,
            ctx.request.principal.clone().unwrap_or_default(),
            EventData::RoleDeleted(RoleEvent {
                project_id: self.project_id,
                role: format!("{}{}", ctx.config.role_prefix, self.role),
                grantee: self.grantee.clone(),
            }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::test_support::TestContext;

    use moorage_core::context::RequestContext;

    #[test]
    fn robot_and_role_names_are_prefixed() {
        let ctx = TestContext::new(RequestContext::new("admin"));

        let robot = CreateRobotMetadata {
            project_id: 1,
            name: "builder".into(),
        };
        let event = robot.resolve(&ctx.resolve_ctx()).unwrap();
        match event.data {
            EventData::RobotCreated(r) => assert_eq!(r.name, "robot$builder"),
            other => panic!("unexpected data: {other:?}"),
        }

        let role = DeleteRoleMetadata {
            project_id: 1,
            role: "maintainer".into(),
            grantee: "alice".into(),
        };
        let event = role.resolve(&ctx.resolve_ctx()).unwrap();
        match event.data {
            EventData::RoleDeleted(r) => assert_eq!(r.role, "role$maintainer"),
            other => panic!("unexpected data: {other:?}"),
        }
    }
}
