//! # 시작 시 초기화
//!
//! 서버가 뜰 때 한 번 실행됩니다.
//! - 관리자 계정이 하나도 없으면 설정의 계정으로 만듭니다 (여러 번 실행해도 한 번만 생성)
//! - 현재 계정/분반/학생/스냅샷 수를 로그로 남깁니다

use crate::{config::Config, db, db::users as db_users, error::AppError};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use sqlx::SqlitePool;

pub const ADMIN_ROLE: &str = "admin";

/// Argon2id 해시 문자열(PHC 형식)을 만듭니다.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// 계정이 하나도 없을 때만 관리자 계정을 만듭니다. 만들었으면 `true`.
pub async fn seed_admin(pool: &SqlitePool, username: &str, password: &str) -> Result<bool, AppError> {
    if db_users::count_users(pool).await? > 0 {
        return Ok(false);
    }

    // 평문 비밀번호는 저장하지 않습니다
    let password_hash = hash_password(password)?;
    let user_id = uuid::Uuid::now_v7().to_string();
    db_users::create_user(pool, &user_id, username, &password_hash, ADMIN_ROLE).await?;

    tracing::info!(username, "initial admin account created");
    Ok(true)
}

async fn log_status(pool: &SqlitePool) -> Result<(), AppError> {
    let users = db_users::count_users(pool).await?;
    let sections = db::count_sections(pool).await?;
    let students = db::count_students(pool).await?;
    let snapshots = db::count_snapshots(pool).await?;

    tracing::info!(users, sections, students, snapshots, "database status");
    Ok(())
}

/// 시드 후 상태 로그. 실패하면 호출한 쪽(main)이 로그만 남깁니다.
pub async fn run(pool: &SqlitePool, config: &Config) -> Result<(), AppError> {
    seed_admin(pool, &config.seed_admin_username, &config.seed_admin_password).await?;
    log_status(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use argon2::password_hash::{PasswordHash, PasswordVerifier};

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let pool = db::test_pool().await;

        assert!(seed_admin(&pool, "admin", "admin123").await.unwrap());
        assert!(!seed_admin(&pool, "other", "secret").await.unwrap());
        assert_eq!(db_users::count_users(&pool).await.unwrap(), 1);

        let admin = db_users::find_by_username(&pool, "admin").await.unwrap().unwrap();
        assert_eq!(admin.role, ADMIN_ROLE);
        assert_ne!(admin.password_hash, "admin123");

        let parsed = PasswordHash::new(&admin.password_hash).unwrap();
        assert!(Argon2::default()
            .verify_password(b"admin123", &parsed)
            .is_ok());
    }
}
