use crate::domain::repository::UserRepository;
use crate::domain::types::{NewUser, UserProfile};
use crate::error::AuthServiceError;
use crate::usecase::credential::{CredentialHasher, parse_date_of_birth};

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub nickname: String,
    pub email: String,
    pub password: String,
    pub date_of_birth: String,
}

pub struct RegisterUseCase<U>
where
    U: UserRepository,
{
    pub users: U,
    pub hasher: CredentialHasher,
}

impl<U> RegisterUseCase<U>
where
    U: UserRepository,
{
    pub async fn execute(&self, input: RegisterInput) -> Result<UserProfile, AuthServiceError> {
        // 1. Identity must be free; email is checked first.
        if self.users.email_exists(&input.email).await? {
            return Err(AuthServiceError::EmailTaken);
        }
        if self.users.nickname_exists(&input.nickname).await? {
            return Err(AuthServiceError::NicknameTaken);
        }

        // 2. Validate before paying for the hash.
        let date_of_birth = parse_date_of_birth(&input.date_of_birth)?;
        let password_hash = self.hasher.hash(&input.password).await?;

        // 3. The store enforces uniqueness again; a lost race surfaces as *Taken.
        let user = self
            .users
            .create(&NewUser {
                nickname: input.nickname,
                email: input.email,
                password_hash,
                date_of_birth,
            })
            .await?;

        tracing::info!(user_id = user.id, "user registered");
        Ok(user.to_profile())
    }
}
