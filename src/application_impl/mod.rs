mod auth_service_impl;
mod clock_impl;
mod credential_hasher_impl;
mod refresh_generator_impl;
mod token_codec_impl;

pub use auth_service_impl::*;
pub use clock_impl::*;
pub use credential_hasher_impl::*;
pub use refresh_generator_impl::*;
pub use token_codec_impl::*;
