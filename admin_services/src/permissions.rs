use crate::models::*;
use dispatch_core::prelude::*;
use serde::de::IgnoredAny;

facade! {
    /// `/permissions` resource.
    PermissionService, "/permissions"
}

impl<T: Transport> PermissionService<T> {
    pub async fn list_permissions(&self, query: &ListQuery) -> Result<Page<Permission>, ApiError> {
        self.client.get(Self::BASE, query.to_options()).await
    }

    /// Root permissions with `children` filled recursively.
    pub async fn get_permission_tree(&self) -> Result<Vec<Permission>, ApiError> {
        self.client
            .get(&format!("{}/tree", Self::BASE), RequestOptions::new())
            .await
    }

    pub async fn get_permission_by_id(&self, id: Id) -> Result<Permission, ApiError> {
        self.client.get(&Self::item(id), RequestOptions::new()).await
    }

    pub async fn create_permission(
        &self,
        permission: &CreatePermission,
    ) -> Result<Permission, ApiError> {
        self.client
            .post(Self::BASE, permission, RequestOptions::new())
            .await
    }

    pub async fn update_permission(
        &self,
        id: Id,
        patch: &UpdatePermission,
    ) -> Result<Permission, ApiError> {
        self.client
            .put(&Self::item(id), patch, RequestOptions::new())
            .await
    }

    pub async fn delete_permission(&self, id: Id) -> Result<(), ApiError> {
        self.client
            .delete::<IgnoredAny>(&Self::item(id), RequestOptions::new())
            .await?;
        Ok(())
    }

    pub async fn batch_delete_permissions(&self, ids: &[Id]) -> Result<(), ApiError> {
        self.client
            .delete_with::<_, IgnoredAny>(
                &Self::batch(),
                &BatchDelete { ids },
                RequestOptions::new(),
            )
            .await?;
        Ok(())
    }

    pub async fn update_permission_status(
        &self,
        id: Id,
        status: EntityStatus,
    ) -> Result<Permission, ApiError> {
        self.client
            .patch(
                &Self::sub(id, "status"),
                &StatusUpdate { status },
                RequestOptions::new(),
            )
            .await
    }
}
