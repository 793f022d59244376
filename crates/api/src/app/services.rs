use std::sync::Arc;

use oncologic_auth::{TokenCodec, UserDirectory};

/// What the handlers need: the codec to issue tokens and the directory to check credentials.
#[derive(Clone)]
pub struct AuthServices {
    pub codec: Arc<TokenCodec>,
    pub directory: Arc<dyn UserDirectory>,
}
