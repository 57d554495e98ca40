//! Authorization evaluator behaviour

use hackrbac::*;

fn acl() -> AccessControl {
    AccessControl::hackathon().unwrap()
}

fn q(resource: Resource, actions: &[Action]) -> PermissionQuery {
    PermissionQuery::on(resource, actions.iter().copied())
}

// === Scenario ===

#[test]
fn admin_bypasses_configuration() {
    let acl = acl();
    assert!(acl.authorize(Held::Role("admin"), &q(Resource::Configuration, &[Action::View])).success);
}

#[test]
fn admin_anywhere_in_set_bypasses() {
    let acl = acl();
    assert!(acl.authorize(Held::Roles("verifiedUser,admin"), &q(Resource::Configuration, &[Action::View])).success);
}

#[test]
fn verified_user_cannot_view_configuration() {
    let acl = acl();
    let res = acl.authorize(Held::Roles("verifiedUser"), &q(Resource::Configuration, &[Action::View]));
    assert!(!res.success);
    assert_eq!(
        res.shortfalls,
        vec![Shortfall::Missing {
            role: "verifiedUser".into(),
            resource: Resource::Configuration,
            action: Action::View,
        }]
    );
}

#[test]
fn verified_user_creates_and_updates_profile() {
    let acl = acl();
    assert!(acl.authorize(Held::Roles("verifiedUser"), &q(Resource::Profile, &[Action::Create, Action::Update])).success);
}

// === Properties ===

#[test]
fn every_role_satisfies_its_own_grants() {
    let acl = acl();
    for role in acl.roles().iter() {
        for (resource, actions) in role.grants() {
            let query = PermissionQuery::on(*resource, actions.iter().copied());
            assert!(acl.authorize(Held::Role(role.name()), &query).success, "{} {}", role.name(), resource);
        }
    }
}

#[test]
fn ungranted_actions_are_denied_except_for_admin() {
    let acl = acl();
    let st = acl.statements().clone();
    for role in acl.roles().iter() {
        for resource in st.resources() {
            for action in st.actions(resource).unwrap() {
                if role.allows(resource, *action) {
                    continue;
                }
                let allowed = acl.authorize(Held::Role(role.name()), &q(resource, &[*action])).success;
                assert_eq!(allowed, role.name() == SUPER_ROLE, "{} {}:{}", role.name(), resource, action);
            }
        }
    }
}

#[test]
fn admin_passes_pairs_outside_the_statements() {
    let st = Statements::new([(Resource::Profile, vec![Action::View])]);
    let roles = Roles::new(&st, [Role::builder("admin"), Role::builder("viewer").grant(Resource::Profile, [Action::View])]).unwrap();
    let acl = AccessControl::new(st, roles);
    let q = q(Resource::Judging, &[Action::Score]).and(Resource::Configuration, [Action::Delete]);
    assert!(acl.authorize(Held::Role("admin"), &q).success);
    assert!(!acl.authorize(Held::Role("viewer"), &q).success);
}

#[test]
fn grants_are_not_merged_across_roles() {
    let st = Statements::hackathon();
    let roles = Roles::new(
        &st,
        [
            Role::builder("a").grant(Resource::Profile, [Action::View]),
            Role::builder("b").grant(Resource::Profile, [Action::Update]),
        ],
    )
    .unwrap();
    let acl = AccessControl::new(st, roles);
    let both = q(Resource::Profile, &[Action::View, Action::Update]);
    let res = acl.authorize(Held::Roles("a,b"), &both);
    assert!(!res.success);
    assert_eq!(res.shortfalls.len(), 2);
    // each half on its own passes
    assert!(acl.authorize(Held::Roles("a,b"), &q(Resource::Profile, &[Action::View])).success);
    assert!(acl.authorize(Held::Roles("a,b"), &q(Resource::Profile, &[Action::Update])).success);
}

#[test]
fn multi_resource_query_needs_one_covering_role() {
    let acl = acl();
    let query = q(Resource::Judging, &[Action::Score]).and(Resource::AnyTicket, [Action::Update]);
    // judge scores, mentor triages tickets; neither does both
    assert!(!acl.authorize(Held::Roles("judge,mentor"), &query).success);
    assert!(acl.authorize(Held::Roles("judge,mentor"), &q(Resource::Judging, &[Action::Score])).success);
}

// === Edge cases ===

#[test]
fn no_roles_is_denied() {
    let acl = acl();
    let res = acl.authorize(Held::Roles(""), &q(Resource::Profile, &[Action::View]));
    assert!(!res.success);
    assert_eq!(res.shortfalls, vec![Shortfall::NoRoles]);
    assert!(!acl.authorize(&RoleSet::new(), &PermissionQuery::new()).success);
}

#[test]
fn unknown_roles_are_inert() {
    let acl = acl();
    let query = q(Resource::Profile, &[Action::View]);
    let res = acl.authorize(Held::Roles("wizard"), &query);
    assert!(!res.success);
    assert_eq!(res.shortfalls, vec![Shortfall::UnknownRole { role: "wizard".into() }]);
    assert!(acl.authorize(Held::Roles("wizard,verifiedUser"), &query).success);
}

#[test]
fn resource_missing_from_role_is_a_denial_not_an_error() {
    let acl = acl();
    let res = acl.authorize(Held::Role("verifiedUser"), &q(Resource::Judging, &[Action::View]));
    assert!(!res.success);
}

#[test]
fn first_matching_role_wins_in_held_order() {
    let acl = acl();
    let query = q(Resource::Team, &[Action::Join]);
    let res = acl.authorize(Held::Roles("wizard,mentor,judge"), &query);
    assert!(res.success);
    assert!(res.shortfalls.is_empty());
}

#[test]
fn single_role_name_is_not_split() {
    let acl = acl();
    assert!(!acl.authorize(Held::Role("wizard,admin"), &q(Resource::Profile, &[Action::View])).success);
    assert!(acl.authorize(Held::Roles("wizard,admin"), &q(Resource::Profile, &[Action::View])).success);
}

#[test]
fn raw_strings_are_normalized_before_evaluation() {
    let acl = acl();
    assert!(acl.authorize(" , verifiedUser ,", &q(Resource::Ticket, &[Action::Create])).success);
}

#[test]
fn query_deserializes_from_resource_map() {
    let query: PermissionQuery = serde_json::from_str(r#"{"configuration":["view","update"]}"#).unwrap();
    assert_eq!(query, q(Resource::Configuration, &[Action::Update, Action::View]));
    assert!(serde_json::from_str::<PermissionQuery>(r#"{"configurations":["view"]}"#).is_err());
}

#[test]
fn result_serializes_without_empty_shortfalls() {
    let acl = acl();
    let ok = acl.authorize(Held::Role("admin"), &PermissionQuery::new());
    assert_eq!(serde_json::to_value(&ok).unwrap(), serde_json::json!({"success": true}));
    let denied = acl.authorize(Held::Roles(""), &PermissionQuery::new());
    assert_eq!(
        serde_json::to_value(&denied).unwrap(),
        serde_json::json!({"success": false, "shortfalls": [{"reason": "noRoles"}]})
    );
}

#[test]
fn access_control_is_shareable_across_threads() {
    let acl = std::sync::Arc::new(acl());
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let acl = acl.clone();
            std::thread::spawn(move || acl.authorize(Held::Role("judge"), &q(Resource::Judging, &[Action::Score])).success)
        })
        .collect();
    for h in handles {
        assert!(h.join().unwrap());
    }
}
