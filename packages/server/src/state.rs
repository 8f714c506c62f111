use std::sync::Arc;

use crate::avatar::AvatarManager;
use crate::config::AppConfig;
use crate::registration::RegistrationService;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub users: Arc<RegistrationService>,
    pub avatars: Arc<AvatarManager>,
}
