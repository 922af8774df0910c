use crate::auth::domain::AuthService;
use crate::auth::domain::service::AuthServiceImpl;
use crate::core::clock::SystemClock;
use crate::core::domain::Configuration;
use crate::core::repository::RepositoryStore;
use crate::users::factory::create_user_repository;

pub(crate) async fn create_auth_service(config: &Configuration, store: RepositoryStore) -> Box<dyn AuthService> {
    let user_repo = create_user_repository(store).await;
    Box::new(AuthServiceImpl::new(config, user_repo, Box::new(SystemClock)))
}
