//! 会话与认证
//! 密码使用 SHA-256（UTF-8 字节，十六进制小写）存储；会话为全局单槽

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

use crate::error::{AppError, Result};
use crate::models::{Role, Session, User};
use crate::services::store::DomainStore;

/// 认证服务
#[derive(Clone)]
pub struct AuthManager {
    store: DomainStore,
}

impl AuthManager {
    pub fn new(store: DomainStore) -> Self {
        Self { store }
    }

    /// 注册并立即登录
    pub async fn register(&self, name: &str, email: &str, password: &str, role: Role) -> Result<User> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::MissingField("Name"));
        }
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(AppError::MissingField("Password"));
        }

        // 先查重，避免无意义的哈希计算
        if self.store.dataset()?.user_by_email(&email).is_some() {
            return Err(AppError::DuplicateEmail);
        }

        let pass_hash = digest(password.to_string()).await?;
        let user = User::new(name, &email, pass_hash, role);
        self.store.mutate(|db| {
            if db.user_by_email(&user.email).is_some() {
                return Err(AppError::DuplicateEmail);
            }
            db.users.push(user.clone());
            Ok(())
        })?;

        self.store.storage().save_session(&Session::from(&user))?;
        log::info!("registered {} as {}", user.id, user.role);
        Ok(user)
    }

    /// 登录
    ///
    /// 种子账号没有密码哈希：首次登录时用输入的密码设置哈希，之后按该密码校验。
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let email = email.trim().to_lowercase();
        if email.is_empty() {
            return Err(AppError::MissingField("Email"));
        }
        // 空密码不能认领种子账号
        if password.is_empty() {
            return Err(AppError::MissingField("Password"));
        }
        let dataset = self.store.dataset()?;
        let user = dataset.user_by_email(&email).ok_or(AppError::UnknownAccount)?;
        let user_id = user.id.clone();

        let supplied = digest(password.to_string()).await?;

        let stored = match &user.pass_hash {
            Some(hash) if !hash.is_empty() => hash.clone(),
            _ => {
                self.store.mutate(|db| {
                    let user = db.user_mut(&user_id).ok_or(AppError::UnknownAccount)?;
                    user.pass_hash = Some(supplied.clone());
                    Ok(())
                })?;
                log::info!("password set on first login for {}", user_id);
                supplied.clone()
            }
        };

        if stored != supplied {
            log::warn!("invalid credentials for {}", user_id);
            return Err(AppError::InvalidCredentials);
        }

        let session = Session::from(user);
        self.store.storage().save_session(&session)?;
        log::info!("{} logged in as {}", session.user_id, session.role);
        Ok(session)
    }

    pub fn logout(&self) -> Result<()> {
        self.store.storage().clear_session()?;
        log::info!("logged out");
        Ok(())
    }

    pub fn current_session(&self) -> Result<Option<Session>> {
        self.store.storage().load_session()
    }
}

/// SHA-256 十六进制摘要
pub fn hash_password(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// 在阻塞线程池上计算摘要
async fn digest(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(format!("password hashing failed: {}", e)))
}

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+$").expect("valid email pattern"))
}

/// 去空白、转小写并校验格式
fn normalize_email(email: &str) -> Result<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::MissingField("Email"));
    }
    if !email_pattern().is_match(&email) {
        return Err(AppError::InvalidEmail);
    }
    Ok(email)
}
