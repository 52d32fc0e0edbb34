//! Identity provider for the Sitrep platform.
//!
//! Email/password accounts backed by the `users` table, and opaque bearer
//! session tokens recorded in the `sessions` table. Sign-in verifies
//! credentials and issues a token with a bounded lifetime; sign-out revokes
//! it. Every protected request resolves its token back to a
//! [`SessionUser`], which is passed explicitly to the handler rather than
//! held as process-global state.
//!
//! Passwords are stored as salted SHA-256 digests. Credential failures are
//! deliberately indistinguishable: an unknown email and a wrong password
//! both surface [`AuthError::InvalidCredentials`].

use rand::RngCore;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use sitrep_types::SessionUser;
use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("session not found or expired")]
    SessionNotFound,
    #[error("an account with this email already exists")]
    EmailTaken,
}

/// An issued session: the bearer token plus the identity it authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: SessionUser,
}

fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Creates an operator account.
///
/// Returns [`AuthError::EmailTaken`] if the email is already registered.
pub fn create_user(conn: &Connection, email: &str, password: &str) -> Result<i64, AuthError> {
    let mut salt_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut salt_bytes);
    let salt = hex::encode(salt_bytes);
    let password_hash = hash_password(password, &salt);

    let result = conn.query_row(
        "INSERT INTO users (email, password_hash, salt) VALUES (?1, ?2, ?3) RETURNING id",
        params![email, password_hash, salt],
        |row| row.get(0),
    );

    match result {
        Ok(id) => Ok(id),
        Err(rusqlite::Error::SqliteFailure(e, msg))
            if e.code == rusqlite::ffi::ErrorCode::ConstraintViolation =>
        {
            tracing::debug!(email, detail = ?msg, "user creation hit unique constraint");
            Err(AuthError::EmailTaken)
        }
        Err(e) => Err(AuthError::Database(e)),
    }
}

/// Checks whether any operator account exists. Used at startup to decide
/// whether the bootstrap account from configuration should be created.
pub fn any_user_exists(conn: &Connection) -> Result<bool, AuthError> {
    let exists: bool = conn.query_row("SELECT EXISTS(SELECT 1 FROM users)", [], |row| row.get(0))?;
    Ok(exists)
}

/// Verifies credentials and issues a bearer session token.
///
/// The token is a fresh UUID, valid for `ttl_minutes` from now.
pub fn sign_in(
    conn: &Connection,
    email: &str,
    password: &str,
    ttl_minutes: u32,
) -> Result<Session, AuthError> {
    let row: Option<(i64, String, String)> = conn
        .query_row(
            "SELECT id, password_hash, salt FROM users WHERE email = ?1",
            [email],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    let (user_id, stored_hash, salt) = row.ok_or(AuthError::InvalidCredentials)?;

    if hash_password(password, &salt) != stored_hash {
        return Err(AuthError::InvalidCredentials);
    }

    let token = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO sessions (token, user_id, expires_at)
         VALUES (?1, ?2, datetime('now', '+' || ?3 || ' minutes'))",
        params![token, user_id, ttl_minutes],
    )?;

    Ok(Session {
        token,
        user: SessionUser {
            user_id,
            email: email.to_string(),
        },
    })
}

/// Resolves a bearer token to the identity it authenticates.
///
/// Expired sessions are rejected the same way as unknown tokens.
pub fn session_for_token(conn: &Connection, token: &str) -> Result<SessionUser, AuthError> {
    conn.query_row(
        "SELECT u.id, u.email
         FROM sessions s JOIN users u ON u.id = s.user_id
         WHERE s.token = ?1 AND s.expires_at > datetime('now')",
        [token],
        |row| {
            Ok(SessionUser {
                user_id: row.get(0)?,
                email: row.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or(AuthError::SessionNotFound)
}

/// Revokes a session. Signing out an already-revoked or unknown token is
/// not an error.
pub fn sign_out(conn: &Connection, token: &str) -> Result<(), AuthError> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", [token])?;
    Ok(())
}

/// Deletes sessions whose expiry has passed. Returns the number removed.
pub fn prune_expired_sessions(conn: &Connection) -> Result<usize, AuthError> {
    let count = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= datetime('now')",
        [],
    )?;
    Ok(count)
}
