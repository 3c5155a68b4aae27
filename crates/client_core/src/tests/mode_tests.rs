use super::*;
use crate::test_fakes::session;
use shared::domain::Role;

#[test]
fn fragment_parsing() {
    assert_eq!(NavigationFragment::parse(""), NavigationFragment::default());
    assert_eq!(
        NavigationFragment::parse("#/history"),
        NavigationFragment::default()
    );
    assert_eq!(
        NavigationFragment::parse("#/validate?id=abc%20123"),
        NavigationFragment {
            validate: true,
            record_id: Some("abc 123".to_string()),
        }
    );
    assert_eq!(
        NavigationFragment::parse("#?validate&id=r-1"),
        NavigationFragment {
            validate: true,
            record_id: Some("r-1".to_string()),
        }
    );
    assert_eq!(
        NavigationFragment::parse("#validate?id="),
        NavigationFragment {
            validate: true,
            record_id: None,
        }
    );
    // An id alone does not open the validator.
    assert_eq!(
        NavigationFragment::parse("#/?id=r-1"),
        NavigationFragment::default()
    );
}

#[test]
fn validator_link_wins_over_any_session() {
    let router = ModeRouter::new();
    let fragment = NavigationFragment::parse("#/validate?id=r-7");
    let expected = Mode::ExternalValidator {
        record_id: Some("r-7".to_string()),
    };

    assert_eq!(router.select(&fragment, None), expected);
    for role in [Role::Employee, Role::Admin, Role::SuperAdmin] {
        assert_eq!(router.select(&fragment, Some(&session("u", role))), expected);
    }
}

#[test]
fn mode_follows_session_and_overview_flag() {
    let mut router = ModeRouter::new();
    let plain = NavigationFragment::default();
    let admin = session("a1", Role::Admin);
    let employee = session("e1", Role::Employee);

    assert_eq!(router.select(&plain, None), Mode::Unauthenticated);
    assert_eq!(router.select(&plain, Some(&employee)), Mode::InspectionDraft);
    assert_eq!(router.select(&plain, Some(&admin)), Mode::AdminOverview);

    router.open_draft();
    assert_eq!(router.select(&plain, Some(&admin)), Mode::InspectionDraft);

    router.return_to_overview();
    assert_eq!(router.select(&plain, Some(&admin)), Mode::AdminOverview);
}

#[test]
fn edit_entry_leaves_overview_only_for_elevated_users() {
    let mut router = ModeRouter::new();
    router.on_edit_entry(Some(&session("e1", Role::Employee)));
    assert!(router.overview_active());

    router.on_edit_entry(None);
    assert!(router.overview_active());

    router.on_edit_entry(Some(&session("sa", Role::SuperAdmin)));
    assert!(!router.overview_active());

    router.on_login();
    assert!(router.overview_active());
}

#[tokio::test]
async fn navigation_signal_wakes_only_on_change() {
    let signal = NavigationSignal::new("#/home");
    let mut rx = signal.subscribe();
    assert!(!rx.borrow().validate);

    // Different raw text, same parsed meaning.
    signal.set_fragment("#/settings");
    assert!(!rx.has_changed().expect("sender alive"));

    signal.set_fragment("#/validate?id=r-2");
    rx.changed().await.expect("change");
    assert_eq!(
        rx.borrow_and_update().record_id.as_deref(),
        Some("r-2")
    );
    assert!(!rx.has_changed().expect("sender alive"));
}

#[test]
fn reset_restores_overview() {
    let mut router = ModeRouter::new();
    router.open_draft();
    assert!(!router.overview_active());

    router.reset();
    assert!(router.overview_active());
    assert_eq!(router, ModeRouter::default());
}
