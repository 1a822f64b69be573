//! Caller identity as resolved by the authentication provider

use crate::infrastructure::entities::Role;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub role: Role,
}

impl Session {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Session { user_id, role }
    }

    /// Client sessions are restricted to their own records; staff sessions are not restricted.
    pub fn client_scope(&self) -> Option<Uuid> {
        (!self.role.is_staff()).then_some(self.user_id)
    }
}
