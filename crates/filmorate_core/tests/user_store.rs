mod common;

use common::{date, user, with_backends};
use filmorate_core::{EntityKind, RepoError, User, UserPatch};
use std::collections::BTreeSet;

#[test]
fn blank_name_falls_back_to_login_on_create() {
    with_backends(|_, users| {
        let mut unnamed = user("neo");
        unnamed.name = "  ".to_string();
        let created = users.create_user(&unnamed).unwrap();
        assert_eq!(created.name, "neo");

        let loaded = users.find_user(created.id).unwrap().unwrap();
        assert_eq!(loaded, created);
        assert!(loaded.friends.is_empty());
    });
}

#[test]
fn invalid_user_is_not_persisted() {
    with_backends(|_, users| {
        let mut spaced = user("bad");
        spaced.login = "bad login".to_string();
        let err = users.create_user(&spaced).unwrap_err();
        assert!(matches!(err, RepoError::InvalidUser(_)));

        let mut no_at = user("mail");
        no_at.email = "mail.example.com".to_string();
        assert!(users.create_user(&no_at).is_err());

        assert!(users.list_users().unwrap().is_empty());
    });
}

#[test]
fn update_keeps_fields_sent_blank_and_applies_the_rest() {
    with_backends(|_, users| {
        let created = users.create_user(&user("trinity")).unwrap();

        let patch = UserPatch {
            email: Some(String::new()),
            name: Some("Bob".to_string()),
            birthday: Some(date(1985, 6, 15)),
            ..UserPatch::new(created.id)
        };
        let updated = users.update_user(&patch).unwrap();

        assert_eq!(updated.email, created.email);
        assert_eq!(updated.login, created.login);
        assert_eq!(updated.name, "Bob");
        assert_eq!(updated.birthday, date(1985, 6, 15));
        assert_eq!(users.find_user(created.id).unwrap().unwrap(), updated);
    });
}

#[test]
fn update_keeps_friend_set() {
    with_backends(|_, users| {
        let owner = users.create_user(&user("owner")).unwrap();
        let target = users.create_user(&user("target")).unwrap();
        users.add_friend(owner.id, target.id).unwrap();

        let updated = users
            .update_user(&UserPatch {
                login: Some("renamed".to_string()),
                ..UserPatch::new(owner.id)
            })
            .unwrap();
        assert_eq!(updated.login, "renamed");
        assert_eq!(updated.friends, BTreeSet::from([target.id]));
    });
}

#[test]
fn update_of_unknown_user_is_not_found() {
    with_backends(|_, users| {
        let err = users.update_user(&UserPatch::new(404)).unwrap_err();
        assert!(matches!(
            err,
            RepoError::NotFound {
                entity: EntityKind::User,
                id: 404
            }
        ));
    });
}

#[test]
fn update_rejects_merged_user_that_breaks_invariants() {
    with_backends(|_, users| {
        let created = users.create_user(&user("morpheus")).unwrap();
        let err = users
            .update_user(&UserPatch {
                email: Some("no-at-sign".to_string()),
                ..UserPatch::new(created.id)
            })
            .unwrap_err();
        assert!(matches!(err, RepoError::InvalidUser(_)));
        assert_eq!(users.find_user(created.id).unwrap().unwrap(), created);
    });
}

#[test]
fn friendship_is_directed() {
    with_backends(|_, users| {
        let a = users.create_user(&user("a")).unwrap();
        let b = users.create_user(&user("b")).unwrap();

        assert!(users.add_friend(a.id, b.id).unwrap());

        assert_eq!(users.friends_of(a.id).unwrap(), BTreeSet::from([b.id]));
        assert!(users.friends_of(b.id).unwrap().is_empty());

        let reloaded_b = users.find_user(b.id).unwrap().unwrap();
        assert!(reloaded_b.friends.is_empty());
        let reloaded_a = users.find_user(a.id).unwrap().unwrap();
        assert_eq!(reloaded_a.friends, BTreeSet::from([b.id]));
    });
}

#[test]
fn friend_link_is_idempotent_and_unlink_of_absent_is_false() {
    with_backends(|_, users| {
        let a = users.create_user(&user("a")).unwrap();
        let b = users.create_user(&user("b")).unwrap();

        assert!(!users.delete_friend(a.id, b.id).unwrap());
        assert!(users.add_friend(a.id, b.id).unwrap());
        assert!(!users.add_friend(a.id, b.id).unwrap());
        assert_eq!(users.friends_of(a.id).unwrap().len(), 1);

        assert!(users.delete_friend(a.id, b.id).unwrap());
        assert!(!users.delete_friend(a.id, b.id).unwrap());
        assert!(users.friends_of(a.id).unwrap().is_empty());
    });
}

#[test]
fn common_friends_intersect_outgoing_sets() {
    with_backends(|_, users| {
        let ids: Vec<i64> = ["one", "two", "three", "four"]
            .iter()
            .map(|login| users.create_user(&user(login)).unwrap().id)
            .collect();
        let (one, two, three, four) = (ids[0], ids[1], ids[2], ids[3]);

        users.add_friend(one, three).unwrap();
        users.add_friend(one, four).unwrap();
        users.add_friend(two, three).unwrap();
        // Incoming edges do not count.
        users.add_friend(four, two).unwrap();

        assert_eq!(
            users.common_friends(one, two).unwrap(),
            BTreeSet::from([three])
        );
        assert_eq!(
            users.common_friends(two, one).unwrap(),
            BTreeSet::from([three])
        );
        assert!(users.common_friends(three, four).unwrap().is_empty());
    });
}

#[test]
fn list_users_hydrates_each_friend_set_in_id_order() {
    with_backends(|_, users| {
        let created: Vec<User> = ["x", "y", "z"]
            .iter()
            .map(|login| users.create_user(&user(login)).unwrap())
            .collect();
        users.add_friend(created[0].id, created[1].id).unwrap();
        users.add_friend(created[0].id, created[2].id).unwrap();
        users.add_friend(created[2].id, created[0].id).unwrap();

        let listed = users.list_users().unwrap();
        let ids: Vec<i64> = listed.iter().map(|u| u.id).collect();
        assert_eq!(ids, created.iter().map(|u| u.id).collect::<Vec<_>>());
        assert_eq!(
            listed[0].friends,
            BTreeSet::from([created[1].id, created[2].id])
        );
        assert!(listed[1].friends.is_empty());
        assert_eq!(listed[2].friends, BTreeSet::from([created[0].id]));
    });
}
