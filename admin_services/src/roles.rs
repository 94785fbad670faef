use crate::models::*;
use dispatch_core::prelude::*;
use serde::de::IgnoredAny;

facade! {
    /// `/roles` resource.
    RoleService, "/roles"
}

impl<T: Transport> RoleService<T> {
    pub async fn list_roles(&self, query: &ListQuery) -> Result<Page<Role>, ApiError> {
        self.client.get(Self::BASE, query.to_options()).await
    }

    /// Every role, unpaged. Used by selection widgets.
    pub async fn get_all_roles(&self) -> Result<Vec<Role>, ApiError> {
        self.client
            .get(&format!("{}/all", Self::BASE), RequestOptions::new())
            .await
    }

    pub async fn get_role_by_id(&self, id: Id) -> Result<Role, ApiError> {
        self.client.get(&Self::item(id), RequestOptions::new()).await
    }

    pub async fn create_role(&self, role: &CreateRole) -> Result<Role, ApiError> {
        self.client.post(Self::BASE, role, RequestOptions::new()).await
    }

    pub async fn update_role(&self, id: Id, patch: &UpdateRole) -> Result<Role, ApiError> {
        self.client
            .put(&Self::item(id), patch, RequestOptions::new())
            .await
    }

    pub async fn delete_role(&self, id: Id) -> Result<(), ApiError> {
        self.client
            .delete::<IgnoredAny>(&Self::item(id), RequestOptions::new())
            .await?;
        Ok(())
    }

    pub async fn batch_delete_roles(&self, ids: &[Id]) -> Result<(), ApiError> {
        self.client
            .delete_with::<_, IgnoredAny>(
                &Self::batch(),
                &BatchDelete { ids },
                RequestOptions::new(),
            )
            .await?;
        Ok(())
    }

    pub async fn update_role_status(&self, id: Id, status: EntityStatus) -> Result<Role, ApiError> {
        self.client
            .patch(
                &Self::sub(id, "status"),
                &StatusUpdate { status },
                RequestOptions::new(),
            )
            .await
    }

    pub async fn get_role_permissions(&self, id: Id) -> Result<Vec<Permission>, ApiError> {
        self.client
            .get(&Self::sub(id, "permissions"), RequestOptions::new())
            .await
    }

    /// Replaces the role's permission set.
    pub async fn assign_role_permissions(
        &self,
        id: Id,
        permission_ids: &[Id],
    ) -> Result<(), ApiError> {
        self.client
            .put::<_, IgnoredAny>(
                &Self::sub(id, "permissions"),
                &AssignPermissions { permission_ids },
                RequestOptions::new(),
            )
            .await?;
        Ok(())
    }
}
