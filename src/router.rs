use tracing::debug;

use crate::auth::IdentityState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AdminRoute {
    Bookings,
    Dashboard,
    CreateClass,
    CreateMentor,
}

impl AdminRoute {
    pub fn path(self) -> &'static str {
        match self {
            AdminRoute::Bookings => "/admin/bookings",
            AdminRoute::Dashboard => "/admin/dashboard",
            AdminRoute::CreateClass => "/admin/create-class",
            AdminRoute::CreateMentor => "/admin/create-mentor",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    Classes,
    Dashboard,
    MentorProfile(i64),
    Admin(AdminRoute),
    NotFound(String),
}

impl Route {
    /// Maps a location path to a route. Query strings, fragments and trailing slashes are ignored.
    pub fn parse(path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [] => Route::Home,
            ["classes"] => Route::Classes,
            ["dashboard"] => Route::Dashboard,
            ["mentor", id] => match id.parse::<i64>() {
                Ok(id) => Route::MentorProfile(id),
                Err(_) => Route::NotFound(path.to_string()),
            },
            ["admin"] | ["admin", "bookings"] => Route::Admin(AdminRoute::Bookings),
            ["admin", "dashboard"] => Route::Admin(AdminRoute::Dashboard),
            ["admin", "create-class"] => Route::Admin(AdminRoute::CreateClass),
            ["admin", "create-mentor"] => Route::Admin(AdminRoute::CreateMentor),
            _ => Route::NotFound(path.to_string()),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".into(),
            Route::Classes => "/classes".into(),
            Route::Dashboard => "/dashboard".into(),
            Route::MentorProfile(id) => format!("/mentor/{id}"),
            Route::Admin(section) => section.path().into(),
            Route::NotFound(path) => path.clone(),
        }
    }

    pub fn requires_sign_in(&self) -> bool {
        !matches!(self, Route::Home)
    }

    pub fn requires_admin(&self) -> bool {
        matches!(self, Route::Admin(_))
    }
}

/// Outcome of passing a route through the access gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    /// Identity is still being resolved; render nothing yet.
    Waiting,
    Redirect(Route),
    SignIn,
}

pub fn resolve(route: Route, identity: &IdentityState) -> Navigation {
    if !route.requires_sign_in() {
        return Navigation::Render(route);
    }
    let user = match identity {
        IdentityState::Loading => return Navigation::Waiting,
        IdentityState::SignedOut => return Navigation::SignIn,
        IdentityState::SignedIn(user) => user,
    };
    if route.requires_admin() && !user.is_admin() {
        debug!(subject = %user.subject, path = %route.path(), "non-admin redirected");
        return Navigation::Redirect(Route::Dashboard);
    }
    Navigation::Render(route)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Role, UserIdentity};

    fn signed_in(role: Role) -> IdentityState {
        IdentityState::SignedIn(UserIdentity {
            subject: "user_1".into(),
            display_name: None,
            role,
        })
    }

    #[test]
    fn parses_known_paths() {
        assert_eq!(Route::parse("/"), Route::Home);
        assert_eq!(Route::parse(""), Route::Home);
        assert_eq!(Route::parse("/classes/"), Route::Classes);
        assert_eq!(Route::parse("/mentor/42"), Route::MentorProfile(42));
        assert_eq!(Route::parse("/admin"), Route::Admin(AdminRoute::Bookings));
        assert_eq!(
            Route::parse("/admin/create-mentor?x=1"),
            Route::Admin(AdminRoute::CreateMentor)
        );
        assert_eq!(
            Route::parse("/mentor/abc"),
            Route::NotFound("/mentor/abc".into())
        );
        assert_eq!(Route::parse("/nope"), Route::NotFound("/nope".into()));
    }

    #[test]
    fn path_round_trips_for_admin_sections() {
        for section in [
            AdminRoute::Bookings,
            AdminRoute::Dashboard,
            AdminRoute::CreateClass,
            AdminRoute::CreateMentor,
        ] {
            assert_eq!(Route::parse(section.path()), Route::Admin(section));
        }
    }

    #[test]
    fn home_is_public() {
        assert_eq!(
            resolve(Route::Home, &IdentityState::SignedOut),
            Navigation::Render(Route::Home)
        );
    }

    #[test]
    fn signed_out_users_are_sent_to_sign_in() {
        for route in [
            Route::Classes,
            Route::Admin(AdminRoute::Dashboard),
            Route::NotFound("/x".into()),
        ] {
            assert_eq!(resolve(route, &IdentityState::SignedOut), Navigation::SignIn);
        }
    }

    #[test]
    fn nothing_renders_while_identity_loads() {
        assert_eq!(
            resolve(Route::Admin(AdminRoute::Bookings), &IdentityState::Loading),
            Navigation::Waiting
        );
        assert_eq!(
            resolve(Route::Dashboard, &IdentityState::Loading),
            Navigation::Waiting
        );
    }

    #[test]
    fn students_are_kept_out_of_admin() {
        assert_eq!(
            resolve(Route::Admin(AdminRoute::CreateClass), &signed_in(Role::Student)),
            Navigation::Redirect(Route::Dashboard)
        );
        assert_eq!(
            resolve(Route::Admin(AdminRoute::CreateClass), &signed_in(Role::Admin)),
            Navigation::Render(Route::Admin(AdminRoute::CreateClass))
        );
        assert_eq!(
            resolve(Route::Classes, &signed_in(Role::Student)),
            Navigation::Render(Route::Classes)
        );
    }
}
