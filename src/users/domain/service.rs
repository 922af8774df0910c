use std::collections::HashMap;
use async_trait::async_trait;
use tracing::info;
use crate::auth::domain::Principal;
use crate::core::clock::Clock;
use crate::core::domain::Configuration;
use crate::core::library::{LibraryError, LibraryResult, LoanStatus, PaginatedResult, Role};
use crate::loans::repository::LoanRepository;
use crate::users::domain::UserService;
use crate::users::domain::model::UserEntity;
use crate::users::dto::{UserChanges, UserDto};
use crate::users::repository::UserRepository;

const MIN_PASSWORD_LEN: usize = 6;
const LOAN_PAGE_SIZE: usize = 100;

pub(crate) struct UserServiceImpl {
    user_repository: Box<dyn UserRepository>,
    loan_repository: Box<dyn LoanRepository>,
    clock: Box<dyn Clock>,
    bcrypt_cost: u32,
}

impl UserServiceImpl {
    pub(crate) fn new(config: &Configuration, user_repository: Box<dyn UserRepository>,
                      loan_repository: Box<dyn LoanRepository>, clock: Box<dyn Clock>) -> Self {
        UserServiceImpl {
            user_repository,
            loan_repository,
            clock,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    // NotFound before Forbidden so callers learn nothing they could not learn anyway
    async fn load_accessible(&self, id: &str, requester: &Principal) -> LibraryResult<UserEntity> {
        let user = self.user_repository.get(id).await?;
        if !requester.can_access(user.user_id.as_str()) {
            return Err(LibraryError::forbidden("access denied", None));
        }
        Ok(user)
    }

    // A filtered page can be empty while later pages still match, so every page is read.
    async fn has_active_loans(&self, user_id: &str) -> LibraryResult<bool> {
        let predicate = HashMap::from([
            ("user_id".to_string(), user_id.to_string()),
            ("loan_status".to_string(), LoanStatus::Active.to_string()),
        ]);
        let mut page: Option<String> = None;
        loop {
            let res = self.loan_repository.query(&predicate, page.as_deref(), LOAN_PAGE_SIZE).await?;
            if !res.records.is_empty() {
                return Ok(true);
            }
            match res.next_page {
                Some(next) => page = Some(next),
                None => return Ok(false),
            }
        }
    }
}

fn validate_password(password: &str) -> LibraryResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(LibraryError::validation(
            format!("password must be at least {} characters", MIN_PASSWORD_LEN).as_str(), Some("password".to_string())));
    }
    Ok(())
}

#[async_trait]
impl UserService for UserServiceImpl {
    async fn register(&self, username: &str, email: &str, password: &str, role: Option<Role>) -> LibraryResult<UserDto> {
        if username.trim().is_empty() || email.trim().is_empty() || password.is_empty() {
            return Err(LibraryError::validation("username, email and password are required", None));
        }
        if !email.contains('@') {
            return Err(LibraryError::validation("email is not valid", Some("email".to_string())));
        }
        validate_password(password)?;
        if self.user_repository.find_by_email(email).await?.is_some() {
            return Err(LibraryError::conflict("email is already registered"));
        }
        let hash = bcrypt::hash(password, self.bcrypt_cost)?;
        let user = UserEntity::new(username.trim(), email, hash.as_str(), role.unwrap_or(Role::User), self.clock.now());
        self.user_repository.create(&user).await?;
        info!(user_id = user.user_id.as_str(), role = %user.role, "registered user");
        Ok(UserDto::from(&user))
    }

    async fn find_user_by_id(&self, id: &str, requester: &Principal) -> LibraryResult<UserDto> {
        self.load_accessible(id, requester).await.map(|u| UserDto::from(&u))
    }

    async fn query_users(&self, requester: &Principal, page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<UserDto>> {
        if !requester.is_admin() {
            return Err(LibraryError::forbidden("only admins may list users", None));
        }
        let res = self.user_repository.query(&HashMap::new(), page, page_size).await?;
        let records = res.records.iter().map(UserDto::from).collect();
        Ok(PaginatedResult::new(page, page_size, res.next_page, records))
    }

    async fn update_user(&self, id: &str, changes: &UserChanges, requester: &Principal) -> LibraryResult<UserDto> {
        let mut user = self.load_accessible(id, requester).await?;
        if let Some(role) = changes.role {
            if role != user.role && !requester.is_admin() {
                return Err(LibraryError::forbidden("only admins may change roles", None));
            }
            user.role = role;
        }
        if let Some(username) = &changes.username {
            if username.trim().is_empty() {
                return Err(LibraryError::validation("username must not be blank", Some("username".to_string())));
            }
            user.username = username.trim().to_string();
        }
        if let Some(password) = &changes.password {
            validate_password(password)?;
            user.password_hash = bcrypt::hash(password, self.bcrypt_cost)?;
        }
        user.updated_at = self.clock.now();
        self.user_repository.update(&user).await?;
        info!(user_id = id, "updated user");
        self.user_repository.get(id).await.map(|u| UserDto::from(&u))
    }

    async fn remove_user(&self, id: &str, requester: &Principal) -> LibraryResult<()> {
        let user = self.load_accessible(id, requester).await?;
        if self.has_active_loans(user.user_id.as_str()).await? {
            return Err(LibraryError::conflict("user still has active loans"));
        }
        self.user_repository.delete(id).await?;
        info!(user_id = id, "removed user");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use async_trait::async_trait;
    use chrono::{Duration, Utc};
    use crate::auth::domain::Principal;
    use crate::core::clock::testing::FixedClock;
    use crate::core::domain::Configuration;
    use crate::core::library::{LibraryError, LibraryResult, LoanStatus, PaginatedResult, Role};
    use crate::core::repository::Repository;
    use crate::loans::domain::model::LoanEntity;
    use crate::loans::repository::LoanRepository;
    use crate::loans::repository::memory_loan_repository::MemoryLoanRepository;
    use crate::users::domain::UserService;
    use crate::users::domain::service::UserServiceImpl;
    use crate::users::dto::UserChanges;
    use crate::users::repository::memory_user_repository::MemoryUserRepository;
    use crate::utils::memory::{matches_predicate, MemoryDatabase};

    // Reads a page of the user's loans and filters it afterwards, the way a DynamoDB
    // query applies its limit before the filter expression.
    struct LimitBeforeFilter(MemoryLoanRepository);

    #[async_trait]
    impl Repository<LoanEntity> for LimitBeforeFilter {
        async fn create(&self, entity: &LoanEntity) -> LibraryResult<usize> {
            self.0.create(entity).await
        }

        async fn update(&self, entity: &LoanEntity) -> LibraryResult<usize> {
            self.0.update(entity).await
        }

        async fn get(&self, id: &str) -> LibraryResult<LoanEntity> {
            self.0.get(id).await
        }

        async fn delete(&self, id: &str) -> LibraryResult<usize> {
            self.0.delete(id).await
        }

        async fn query(&self, predicate: &HashMap<String, String>,
                       page: Option<&str>, page_size: usize) -> LibraryResult<PaginatedResult<LoanEntity>> {
            let key: HashMap<String, String> = predicate.iter()
                .filter(|(k, _)| k.as_str() == "user_id")
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            let res = self.0.query(&key, page, page_size).await?;
            let mut records = vec![];
            for loan in res.records {
                if matches_predicate(&loan, predicate)? {
                    records.push(loan);
                }
            }
            Ok(PaginatedResult::new(page, page_size, res.next_page, records))
        }
    }

    #[async_trait]
    impl LoanRepository for LimitBeforeFilter {
        async fn create_with_checkout(&self, loan: &LoanEntity) -> LibraryResult<()> {
            self.0.create_with_checkout(loan).await
        }

        async fn update_with_return(&self, loan: &LoanEntity) -> LibraryResult<()> {
            self.0.update_with_return(loan).await
        }
    }

    fn build_service(db: &MemoryDatabase) -> UserServiceImpl {
        let mut config = Configuration::new("test");
        config.bcrypt_cost = 4;
        UserServiceImpl::new(&config,
                             Box::new(MemoryUserRepository::new(db.clone())),
                             Box::new(MemoryLoanRepository::new(db.clone())),
                             Box::new(FixedClock::new()))
    }

    #[tokio::test]
    async fn test_should_register_user() {
        let svc = build_service(&MemoryDatabase::new());
        let user = svc.register("ana", "ana@example.com", "secret-pw", None).await.expect("should register");
        assert_eq!(Role::User, user.role);
        let dup = svc.register("other", "ANA@example.com", "secret-pw", None).await;
        assert!(matches!(dup, Err(LibraryError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_should_validate_registration() {
        let svc = build_service(&MemoryDatabase::new());
        for (username, email, password) in [("", "a@b.c", "secret-pw"), ("ana", "not-an-email", "secret-pw"), ("ana", "a@b.c", "short")] {
            let res = svc.register(username, email, password, None).await;
            assert!(matches!(res, Err(LibraryError::Validation { .. })), "{} {} {}", username, email, password);
        }
    }

    #[tokio::test]
    async fn test_should_guard_user_access() {
        let svc = build_service(&MemoryDatabase::new());
        let ana = svc.register("ana", "ana@example.com", "secret-pw", None).await.unwrap();
        let bob = svc.register("bob", "bob@example.com", "secret-pw", None).await.unwrap();
        let as_ana = Principal::new(ana.user_id.as_str(), Role::User);
        let admin = Principal::new("admin", Role::Admin);

        assert!(svc.find_user_by_id(ana.user_id.as_str(), &as_ana).await.is_ok());
        assert!(matches!(svc.find_user_by_id(bob.user_id.as_str(), &as_ana).await, Err(LibraryError::Forbidden { .. })));
        assert!(matches!(svc.find_user_by_id("missing", &as_ana).await, Err(LibraryError::NotFound { .. })));
        assert!(svc.find_user_by_id(bob.user_id.as_str(), &admin).await.is_ok());

        assert!(matches!(svc.query_users(&as_ana, None, 10).await, Err(LibraryError::Forbidden { .. })));
        assert_eq!(2, svc.query_users(&admin, None, 10).await.unwrap().records.len());
    }

    #[tokio::test]
    async fn test_should_update_user() {
        let svc = build_service(&MemoryDatabase::new());
        let ana = svc.register("ana", "ana@example.com", "secret-pw", None).await.unwrap();
        let as_ana = Principal::new(ana.user_id.as_str(), Role::User);

        let promote = UserChanges { role: Some(Role::Admin), ..UserChanges::default() };
        assert!(matches!(svc.update_user(ana.user_id.as_str(), &promote, &as_ana).await, Err(LibraryError::Forbidden { .. })));

        let rename = UserChanges { username: Some("ana maria".to_string()), ..UserChanges::default() };
        let updated = svc.update_user(ana.user_id.as_str(), &rename, &as_ana).await.expect("should update");
        assert_eq!("ana maria", updated.username.as_str());
        assert_eq!(1, updated.version);

        let admin = Principal::new("admin", Role::Admin);
        let updated = svc.update_user(ana.user_id.as_str(), &promote, &admin).await.expect("should promote");
        assert_eq!(Role::Admin, updated.role);
    }

    #[tokio::test]
    async fn test_should_not_remove_user_with_active_loan() {
        let db = MemoryDatabase::new();
        let svc = build_service(&db);
        let ana = svc.register("ana", "ana@example.com", "secret-pw", None).await.unwrap();
        let as_ana = Principal::new(ana.user_id.as_str(), Role::User);
        let now = Utc::now().naive_utc();
        let loan = LoanEntity::new(ana.user_id.as_str(), "book-1", now, now + Duration::days(14));
        MemoryLoanRepository::new(db.clone()).create(&loan).await.unwrap();

        assert!(matches!(svc.remove_user(ana.user_id.as_str(), &as_ana).await, Err(LibraryError::Conflict { .. })));
        let bob = svc.register("bob", "bob@example.com", "secret-pw", None).await.unwrap();
        svc.remove_user(bob.user_id.as_str(), &Principal::new(bob.user_id.as_str(), Role::User)).await.expect("should remove");
    }

    #[tokio::test]
    async fn test_should_find_active_loan_behind_returned_ones() {
        let db = MemoryDatabase::new();
        let mut config = Configuration::new("test");
        config.bcrypt_cost = 4;
        let svc = UserServiceImpl::new(&config,
                                       Box::new(MemoryUserRepository::new(db.clone())),
                                       Box::new(LimitBeforeFilter(MemoryLoanRepository::new(db.clone()))),
                                       Box::new(FixedClock::new()));
        let ana = svc.register("ana", "ana@example.com", "secret-pw", None).await.unwrap();
        let as_ana = Principal::new(ana.user_id.as_str(), Role::User);
        let loans = MemoryLoanRepository::new(db.clone());
        let now = Utc::now().naive_utc();
        // several pages of returned loans come first in index order
        for i in 0..250 {
            let loan_date = now - Duration::days(400 - i);
            let mut returned = LoanEntity::new(ana.user_id.as_str(), format!("book-{}", i).as_str(), loan_date, loan_date + Duration::days(14));
            returned.loan_status = LoanStatus::Returned;
            returned.return_date = Some(loan_date + Duration::days(7));
            loans.create(&returned).await.unwrap();
        }
        let active = LoanEntity::new(ana.user_id.as_str(), "book-active", now, now + Duration::days(14));
        loans.create(&active).await.unwrap();

        assert!(matches!(svc.remove_user(ana.user_id.as_str(), &as_ana).await, Err(LibraryError::Conflict { .. })));
        assert!(svc.find_user_by_id(ana.user_id.as_str(), &as_ana).await.is_ok());
    }
}
