use crate::models::*;
use dispatch_core::prelude::*;
use serde::de::IgnoredAny;

facade! {
    /// `/users` resource.
    UserService, "/users"
}

impl<T: Transport> UserService<T> {
    pub async fn list_users(&self, query: &ListQuery) -> Result<Page<User>, ApiError> {
        self.client.get(Self::BASE, query.to_options()).await
    }

    pub async fn get_user_by_id(&self, id: Id) -> Result<User, ApiError> {
        self.client.get(&Self::item(id), RequestOptions::new()).await
    }

    pub async fn create_user(&self, user: &CreateUser) -> Result<User, ApiError> {
        self.client.post(Self::BASE, user, RequestOptions::new()).await
    }

    pub async fn update_user(&self, id: Id, patch: &UpdateUser) -> Result<User, ApiError> {
        self.client
            .put(&Self::item(id), patch, RequestOptions::new())
            .await
    }

    pub async fn delete_user(&self, id: Id) -> Result<(), ApiError> {
        self.client
            .delete::<IgnoredAny>(&Self::item(id), RequestOptions::new())
            .await?;
        Ok(())
    }

    pub async fn batch_delete_users(&self, ids: &[Id]) -> Result<(), ApiError> {
        self.client
            .delete_with::<_, IgnoredAny>(
                &Self::batch(),
                &BatchDelete { ids },
                RequestOptions::new(),
            )
            .await?;
        Ok(())
    }

    pub async fn update_user_status(&self, id: Id, status: EntityStatus) -> Result<User, ApiError> {
        self.client
            .patch(
                &Self::sub(id, "status"),
                &StatusUpdate { status },
                RequestOptions::new(),
            )
            .await
    }

    pub async fn get_user_roles(&self, id: Id) -> Result<Vec<Role>, ApiError> {
        self.client
            .get(&Self::sub(id, "roles"), RequestOptions::new())
            .await
    }

    /// Replaces the user's role set.
    pub async fn assign_user_roles(&self, id: Id, role_ids: &[Id]) -> Result<(), ApiError> {
        self.client
            .put::<_, IgnoredAny>(
                &Self::sub(id, "roles"),
                &AssignRoles { role_ids },
                RequestOptions::new(),
            )
            .await?;
        Ok(())
    }
}
