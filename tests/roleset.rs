//! Role-set codec

use hackrbac::{add_role, remove_role, RoleSet};

fn names(s: &RoleSet) -> Vec<&str> {
    s.iter().collect()
}

#[test]
fn empty_string_is_no_roles() {
    assert!(RoleSet::decode("").is_empty());
    assert_eq!(RoleSet::decode("").encode(), "");
}

#[test]
fn decode_splits_in_order() {
    let s = RoleSet::decode("verifiedUser,mentor,judge");
    assert_eq!(names(&s), vec!["verifiedUser", "mentor", "judge"]);
}

#[test]
fn decode_normalizes_malformed_input() {
    let s = RoleSet::decode(" mentor, ,judge,,mentor ,");
    assert_eq!(names(&s), vec!["mentor", "judge"]);
    assert_eq!(s.encode(), "mentor,judge");
    assert!(RoleSet::decode(",,, ").is_empty());
}

#[test]
fn unknown_names_pass_through() {
    let s = RoleSet::decode("wizard,mentor");
    assert!(s.contains("wizard"));
}

#[test]
fn add_role_appends_once() {
    let s = add_role("verifiedUser", "mentor");
    assert_eq!(s.encode(), "verifiedUser,mentor");
    let again = add_role(&s.encode(), "mentor");
    assert_eq!(again, s);
    assert_eq!(add_role("", "judge").encode(), "judge");
}

#[test]
fn add_existing_role_keeps_order() {
    let s = add_role("mentor,verifiedUser,judge", "verifiedUser");
    assert_eq!(s.encode(), "mentor,verifiedUser,judge");
}

#[test]
fn remove_role_is_idempotent() {
    let once = remove_role("mentor,judge,verifiedUser", "judge");
    assert_eq!(once.encode(), "mentor,verifiedUser");
    let twice = remove_role(&once.encode(), "judge");
    assert_eq!(twice, once);
    assert_eq!(remove_role("", "judge").encode(), "");
    assert_eq!(remove_role("mentor", "admin").encode(), "mentor");
}

#[test]
fn decode_encode_decode_is_stable() {
    for raw in ["", "a", "a,b,a", " b , a ,", "x,,y,x,z"] {
        let first = RoleSet::decode(raw);
        let second = RoleSet::decode(&first.encode());
        assert_eq!(first, second, "{raw:?}");
        let mut seen = std::collections::HashSet::new();
        assert!(second.iter().all(|r| seen.insert(r)));
    }
}

#[test]
fn serializes_as_stored_string() {
    let s = RoleSet::decode("verifiedUser,mentor");
    assert_eq!(serde_json::to_string(&s).unwrap(), "\"verifiedUser,mentor\"");
    let back: RoleSet = serde_json::from_str("\"mentor,,mentor\"").unwrap();
    assert_eq!(back.encode(), "mentor");
}
