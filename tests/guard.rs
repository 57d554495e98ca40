//! Guard composition

use hackrbac::*;

fn principal(id: u64, roles: &str) -> Principal {
    Principal { id, name: format!("user{id}"), roles: RoleSet::decode(roles) }
}

fn update_tickets() -> Require {
    Require(PermissionQuery::on(Resource::AnyTicket, [Action::Update]))
}

#[test]
fn missing_principal_is_unauthenticated_not_forbidden() {
    let acl = AccessControl::hackathon().unwrap();
    let cx = RequestContext::new(&acl, None);
    assert_eq!(Authenticated.check(&cx), Err(GuardError::Unauthenticated));
    assert_eq!(update_tickets().check(&cx), Err(GuardError::Unauthenticated));
}

#[test]
fn require_maps_denial_to_forbidden() {
    let acl = AccessControl::hackathon().unwrap();
    let p = principal(1, "verifiedUser");
    let cx = RequestContext::new(&acl, Some(&p));
    assert!(Authenticated.check(&cx).is_ok());
    assert!(matches!(update_tickets().check(&cx), Err(GuardError::Forbidden(_))));

    let mentor = principal(2, "verifiedUser,mentor");
    assert!(update_tickets().check(&RequestContext::new(&acl, Some(&mentor))).is_ok());
}

#[test]
fn guarded_runs_operation_only_on_success() {
    let acl = AccessControl::hackathon().unwrap();
    let p = principal(7, "judge");
    let cx = RequestContext::new(&acl, Some(&p));

    let mut ran = false;
    let r = cx.guarded(&update_tickets(), |_| ran = true);
    assert!(r.is_err());
    assert!(!ran);

    let score = Require(PermissionQuery::on(Resource::Judging, [Action::Score]));
    assert_eq!(cx.guarded(&score, |p| p.id), Ok(7));
}

#[test]
fn guards_compose_in_sequence() {
    let acl = AccessControl::hackathon().unwrap();
    let team_members = [1u64, 2];
    let on_team = Check::new("not a member of this team", |p: &Principal| team_members.contains(&p.id));
    let guard = Authenticated.and(on_team).and(Require(PermissionQuery::on(Resource::Team, [Action::Invite])));

    let member = principal(1, "verifiedUser");
    assert!(guard.check(&RequestContext::new(&acl, Some(&member))).is_ok());

    let outsider = principal(3, "verifiedUser");
    assert_eq!(
        guard.check(&RequestContext::new(&acl, Some(&outsider))),
        Err(GuardError::Forbidden("not a member of this team".into()))
    );

    let roleless_member = principal(2, "");
    assert!(matches!(guard.check(&RequestContext::new(&acl, Some(&roleless_member))), Err(GuardError::Forbidden(_))));

    assert_eq!(guard.check(&RequestContext::new(&acl, None)), Err(GuardError::Unauthenticated));
}

#[test]
fn guards_work_through_references() {
    let acl = AccessControl::hackathon().unwrap();
    let p = principal(1, "admin");
    let g = update_tickets();
    let chained = (&g).and(&Authenticated);
    assert!(chained.check(&RequestContext::new(&acl, Some(&p))).is_ok());
}
