pub mod admin;
pub mod applications;
pub mod health;
pub mod internships;
pub mod profiles;

use axum::Extension;

use crate::middleware::auth::Identity;

/// Identity attached by the auth middleware, if the request carried one.
pub type Caller = Option<Extension<Identity>>;

pub(crate) fn identity(caller: &Caller) -> Option<&Identity> {
    caller.as_ref().map(|Extension(identity)| identity)
}
