use crate::db::models::Role;

/// The authenticated identity performing an operation. Resolved by the
/// transport layer; the repository trusts these fields and nothing else.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub company_id: String,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Every action the repository can be asked to perform. Target-dependent
/// conditions (ownership, tenant scope, terminal state) are enforced by the
/// repository queries themselves; this table answers only "may this role
/// attempt the action at all".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateCompany,
    CreateUser,
    AssignTask,
    ViewAllCompanyTasks,
    ViewOwnTasks,
    UpdateOwnTaskStatus,
    AdminUpdateTask,
    AdminDeleteTask,
    ManageUsers,
    ManageReminders,
    ViewCompanyMessages,
    ViewAllMessages,
    SendPrivateMessage,
}

const ALL_ROLES: &[Role] = &[Role::Admin, Role::Manager, Role::Employee];
const ADMIN_ONLY: &[Role] = &[Role::Admin];
const NON_ADMIN: &[Role] = &[Role::Manager, Role::Employee];

impl Action {
    /// The roles permitted to attempt this action. The match is exhaustive,
    /// so adding an action without deciding its roles fails to compile.
    pub const fn allowed_roles(self) -> &'static [Role] {
        match self {
            Action::CreateCompany
            | Action::CreateUser
            | Action::AssignTask
            | Action::ViewAllCompanyTasks
            | Action::AdminUpdateTask
            | Action::AdminDeleteTask
            | Action::ManageUsers
            | Action::ManageReminders
            | Action::ViewAllMessages => ADMIN_ONLY,
            Action::UpdateOwnTaskStatus => NON_ADMIN,
            Action::ViewOwnTasks
            | Action::ViewCompanyMessages
            | Action::SendPrivateMessage => ALL_ROLES,
        }
    }
}

pub fn can_perform(actor: &Actor, action: Action) -> bool {
    action.allowed_roles().contains(&actor.role)
}

/// Shorthand used at the top of every repository operation.
pub fn require(actor: &Actor, action: Action) -> crate::error::Result<()> {
    if can_perform(actor, action) {
        Ok(())
    } else {
        Err(crate::error::AppError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(role: Role) -> Actor {
        Actor {
            id: "u1".to_string(),
            username: "someone".to_string(),
            role,
            company_id: "c1".to_string(),
        }
    }

    const ACTIONS: &[Action] = &[
        Action::CreateCompany,
        Action::CreateUser,
        Action::AssignTask,
        Action::ViewAllCompanyTasks,
        Action::ViewOwnTasks,
        Action::UpdateOwnTaskStatus,
        Action::AdminUpdateTask,
        Action::AdminDeleteTask,
        Action::ManageUsers,
        Action::ManageReminders,
        Action::ViewCompanyMessages,
        Action::ViewAllMessages,
        Action::SendPrivateMessage,
    ];

    #[test]
    fn admin_matrix() {
        let admin = actor(Role::Admin);
        for &action in ACTIONS {
            let expected = action != Action::UpdateOwnTaskStatus;
            assert_eq!(can_perform(&admin, action), expected, "{action:?}");
        }
    }

    #[test]
    fn manager_and_employee_matrix() {
        let shared = [
            Action::ViewOwnTasks,
            Action::UpdateOwnTaskStatus,
            Action::ViewCompanyMessages,
            Action::SendPrivateMessage,
        ];
        for role in [Role::Manager, Role::Employee] {
            let actor = actor(role);
            for &action in ACTIONS {
                let expected = shared.contains(&action);
                assert_eq!(can_perform(&actor, action), expected, "{role:?} {action:?}");
            }
        }
    }

    #[test]
    fn require_maps_denial_to_unauthorized() {
        let employee = actor(Role::Employee);
        assert!(require(&employee, Action::ViewOwnTasks).is_ok());
        assert!(matches!(
            require(&employee, Action::CreateCompany),
            Err(crate::error::AppError::Unauthorized)
        ));
    }
}
