mod client;
mod codec;
pub mod config;
mod debug;
mod dispatch;
pub mod error;
pub mod interceptor;
mod policy;
pub mod relay;
mod request;
mod secret;
mod timeout;
pub mod transport;
mod types;

pub mod prelude {
    pub use crate::client::{ApiClient, Facade};
    pub use crate::codec::{ContentType, Decodes, Encodes, Json};
    pub use crate::config::{ServiceConfig, ServiceConfigBuilder};
    pub use crate::debug::RedactedHeaders;
    pub use crate::dispatch::Dispatcher;
    pub use crate::error::{ApiError, ConfigError, ErrorKind, FxError};
    pub use crate::interceptor::{
        InterceptorChain, RequestInterceptor, ResponseInterceptor, bearer_auth, map_request,
        map_response,
    };
    pub use crate::policy::Policy;
    pub use crate::relay::{
        ChannelRelay, RelayCall, RelayChannel, RelayEnvelope, RelayError, RelayOutcome,
        RelayResult,
    };
    pub use crate::request::{RequestDescriptor, RequestOptions};
    pub use crate::secret::SecretString;
    pub use crate::timeout::{Deadline, DeadlineElapsed, TimeoutOverride};
    pub use crate::transport::{ReqwestTransport, Transport};
    pub use crate::types::{RequestMethod, ResponseMeta};
}
