use diesel::prelude::*;
use uuid::Uuid;

/// User row, read from and inserted into the `users` table.
///
/// The identifier is generated by the service layer before insertion and
/// never changes afterwards.
#[derive(Debug, Queryable, Selectable, Identifiable, Insertable, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role_type: Option<i32>,
}

/// Full replacement of a user's scalar fields.
///
/// `None` values are written as NULL, so an update clears optional fields
/// the caller left out.
#[derive(Debug, AsChangeset, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::users)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub role_type: Option<i32>,
}

impl UpdateUser {
    /// Overwrites every scalar field of `user` in place.
    pub fn apply_to(self, user: &mut User) {
        user.email = self.email;
        user.first_name = self.first_name;
        user.last_name = self.last_name;
        user.phone_number = self.phone_number;
        user.role_type = self.role_type;
    }
}
