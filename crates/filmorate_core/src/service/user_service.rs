//! User use-case service.
//!
//! # Responsibility
//! - User create/update/get/list with typed not-found errors.
//! - Directed friendship changes after existence and self-link checks.
//! - Friend and common-friend lists hydrated into users.

use super::{ServiceError, ServiceResult};
use crate::model::user::{User, UserPatch};
use crate::model::UserId;
use crate::repo::user_repo::UserRepository;
use log::{debug, info};
use std::collections::BTreeSet;

/// User service facade over a user repository.
pub struct UserService<U: UserRepository> {
    users: U,
}

impl<U: UserRepository> UserService<U> {
    pub fn new(users: U) -> Self {
        Self { users }
    }

    pub fn create_user(&self, user: &User) -> ServiceResult<User> {
        Ok(self.users.create_user(user)?)
    }

    pub fn update_user(&self, patch: &UserPatch) -> ServiceResult<User> {
        Ok(self.users.update_user(patch)?)
    }

    pub fn get_user(&self, id: UserId) -> ServiceResult<User> {
        self.users
            .find_user(id)?
            .ok_or(ServiceError::UserNotFound(id))
    }

    pub fn list_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.users.list_users()?)
    }

    /// Adds `friend` to `user`'s friend set. Only `user -> friend` is stored.
    pub fn add_friend(&self, user: UserId, friend: UserId) -> ServiceResult<()> {
        self.ensure_pair(user, friend)?;
        if self.users.add_friend(user, friend)? {
            info!("event=friend_add module=service status=ok user_id={user} friend_id={friend}");
        }
        Ok(())
    }

    /// Removes `friend` from `user`'s friend set. Returns whether it was there.
    pub fn delete_friend(&self, user: UserId, friend: UserId) -> ServiceResult<bool> {
        self.ensure_pair(user, friend)?;
        let removed = self.users.delete_friend(user, friend)?;
        if removed {
            info!(
                "event=friend_delete module=service status=ok user_id={user} friend_id={friend}"
            );
        }
        Ok(removed)
    }

    pub fn friends_of(&self, user: UserId) -> ServiceResult<Vec<User>> {
        self.get_user(user)?;
        let friends = self.users.friends_of(user)?;
        debug!(
            "event=friends_list module=service status=ok user_id={user} count={}",
            friends.len()
        );
        self.hydrate(&friends)
    }

    pub fn common_friends(&self, user: UserId, other: UserId) -> ServiceResult<Vec<User>> {
        self.get_user(user)?;
        self.get_user(other)?;
        let common = self.users.common_friends(user, other)?;
        self.hydrate(&common)
    }

    fn ensure_pair(&self, user: UserId, friend: UserId) -> ServiceResult<()> {
        self.get_user(user)?;
        self.get_user(friend)?;
        if user == friend {
            return Err(ServiceError::SelfFriendship(user));
        }
        Ok(())
    }

    fn hydrate(&self, ids: &BTreeSet<UserId>) -> ServiceResult<Vec<User>> {
        ids.iter().map(|id| self.get_user(*id)).collect()
    }
}
