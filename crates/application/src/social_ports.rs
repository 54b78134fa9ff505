mod connector;
mod registry;

pub use connector::{OAuthToken, SocialConnector, is_email_allowed};
pub use registry::SocialConnectorRegistry;
