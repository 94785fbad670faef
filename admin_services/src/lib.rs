//! User, role and permission facades for the admin shell.
//!
//! Every facade owns one [`ApiClient`] and nothing else: endpoint strings
//! and payload shapes live here, routing (relay or direct), interceptors,
//! deadlines and error normalization live in `dispatch_core`.

use dispatch_core::prelude::*;
use std::sync::Arc;

macro_rules! facade {
    ($(#[$meta:meta])* $name:ident, $base:literal) => {
        $(#[$meta])*
        pub struct $name<T: Transport = ReqwestTransport> {
            client: ApiClient<T>,
        }

        impl $name<ReqwestTransport> {
            pub fn new(config: ServiceConfig) -> Self {
                Self::from_client(ApiClient::new(config))
            }
        }

        impl<T: Transport> $name<T> {
            const BASE: &'static str = $base;

            pub fn from_client(client: ApiClient<T>) -> Self {
                Self { client }
            }

            fn item(id: Id) -> String {
                format!("{}/{}", Self::BASE, id)
            }

            fn sub(id: Id, rel: &str) -> String {
                format!("{}/{}/{}", Self::BASE, id, rel)
            }

            fn batch() -> String {
                format!("{}/batch", Self::BASE)
            }
        }

        impl<T: Transport> Facade<T> for $name<T> {
            fn client(&self) -> &ApiClient<T> {
                &self.client
            }

            fn client_mut(&mut self) -> &mut ApiClient<T> {
                &mut self.client
            }
        }
    };
}

mod envelope;
pub mod models;
mod permissions;
mod roles;
mod settings;
mod users;

pub use envelope::unwrap_envelope;
pub use permissions::PermissionService;
pub use roles::RoleService;
pub use settings::{Settings, SettingsError};
pub use users::UserService;

/// The three facades, built once at startup over one configuration.
pub struct AdminServices<T: Transport = ReqwestTransport> {
    pub users: UserService<T>,
    pub roles: RoleService<T>,
    pub permissions: PermissionService<T>,
}

impl AdminServices<ReqwestTransport> {
    pub fn new(config: ServiceConfig, relay: Option<Arc<dyn RelayChannel>>) -> Self {
        Self::with_transport(config, ReqwestTransport::default(), relay)
    }
}

impl<T: Transport + Clone> AdminServices<T> {
    pub fn with_transport(
        config: ServiceConfig,
        transport: T,
        relay: Option<Arc<dyn RelayChannel>>,
    ) -> Self {
        let client = || {
            let c = ApiClient::with_transport(config.clone(), transport.clone());
            match relay.as_ref() {
                Some(r) => c.with_relay(r.clone()),
                None => c,
            }
        };
        Self {
            users: UserService::from_client(client()),
            roles: RoleService::from_client(client()),
            permissions: PermissionService::from_client(client()),
        }
    }
}

impl<T: Transport> AdminServices<T> {
    /// Registers one interceptor per facade, built by `make`.
    pub fn add_request_interceptor<I: RequestInterceptor>(&mut self, make: impl Fn() -> I) {
        self.users.add_request_interceptor(make());
        self.roles.add_request_interceptor(make());
        self.permissions.add_request_interceptor(make());
    }

    pub fn add_response_interceptor<I: ResponseInterceptor>(&mut self, make: impl Fn() -> I) {
        self.users.add_response_interceptor(make());
        self.roles.add_response_interceptor(make());
        self.permissions.add_response_interceptor(make());
    }
}

pub mod prelude {
    pub use crate::models::*;
    pub use crate::{
        AdminServices, PermissionService, RoleService, Settings, SettingsError, UserService,
        unwrap_envelope,
    };
}
