//! Action-keyed routing.

use actix_web::guard::{self, Guard};

/// Register or re-register a staff record.
pub const CREATE_STAFF: &str = "create_staff";
/// Add a dependant to a staff record.
pub const ADD_DEPENDANT: &str = "add_dependant";
/// Log a visit against a staff record.
pub const LOG_VISIT: &str = "log_visit";
/// Download the staff roster as CSV.
pub const EXPORT_CSV: &str = "export_csv";
/// Show one staff record alongside the listing.
pub const VIEW_STAFF: &str = "view_staff";

/// The `action` parameter of a raw query string, if any.
#[must_use]
pub fn action_of(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(key, _)| key == "action")
        .map(|(_, value)| value.into_owned())
}

/// A route guard matching requests whose `action` parameter is `name`.
pub fn action(name: &'static str) -> impl Guard {
    guard::fn_guard(move |ctx| action_of(ctx.head().uri.query()).as_deref() == Some(name))
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;

    use super::*;

    #[test]
    fn test_action_of() {
        assert_eq!(action_of(None), None);
        assert_eq!(action_of(Some("")), None);
        assert_eq!(action_of(Some("search=a12")), None);
        assert_eq!(
            action_of(Some("action=view_staff&id=3")).as_deref(),
            Some("view_staff")
        );
        assert_eq!(
            action_of(Some("id=3&action=log_visit")).as_deref(),
            Some("log_visit")
        );
    }

    #[test]
    fn test_action_of_decodes() {
        assert_eq!(action_of(Some("action=export%5Fcsv")).as_deref(), Some("export_csv"));
    }

    #[test]
    fn test_guard_matches_action() {
        let guard = action(EXPORT_CSV);

        let req = TestRequest::get().uri("/?action=export_csv").to_srv_request();
        assert!(guard.check(&req.guard_ctx()));

        let req = TestRequest::get().uri("/?action=view_staff").to_srv_request();
        assert!(!guard.check(&req.guard_ctx()));

        let req = TestRequest::get().uri("/").to_srv_request();
        assert!(!guard.check(&req.guard_ctx()));
    }
}
