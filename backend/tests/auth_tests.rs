//! Authentication tests
//!
//! Tests for session and invite semantics:
//! - Invite code format
//! - Session expiry
//! - Password hashing round trip

use chrono::{DateTime, Duration, Utc};

// ============================================================================
// Invite Code Tests
// ============================================================================

#[cfg(test)]
mod invite_tests {
    use shared::validation::validate_invite_code;

    #[test]
    fn test_valid_invite_codes() {
        assert!(validate_invite_code("A1B2C3D4").is_ok());
        assert!(validate_invite_code("ZZZZZZZZ").is_ok());
        assert!(validate_invite_code("12345678").is_ok());
    }

    #[test]
    fn test_invalid_invite_codes() {
        assert!(validate_invite_code("A1B2C3D").is_err()); // Too short
        assert!(validate_invite_code("A1B2C3D45").is_err()); // Too long
        assert!(validate_invite_code("a1b2c3d4").is_err()); // Lowercase
        assert!(validate_invite_code("A1B2 3D4").is_err()); // Whitespace
        assert!(validate_invite_code("").is_err());
    }
}

// ============================================================================
// Session Expiry Tests
// ============================================================================

#[cfg(test)]
mod session_tests {
    use super::*;

    fn is_live(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        expires_at > now
    }

    #[test]
    fn test_fresh_session_is_live() {
        let now = Utc::now();
        let expires_at = now + Duration::seconds(86400);
        assert!(is_live(expires_at, now));
    }

    #[test]
    fn test_expired_session_is_dead() {
        let now = Utc::now();
        let expires_at = now - Duration::seconds(1);
        assert!(!is_live(expires_at, now));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        // A session expiring exactly now is already dead
        assert!(!is_live(now, now));
    }

    #[test]
    fn test_invite_outlives_session() {
        let now = Utc::now();
        let session_expiry = now + Duration::seconds(86400);
        let invite_expiry = now + Duration::seconds(604800);

        // Default config: invites last a week, sessions a day
        assert!(invite_expiry > session_expiry);
    }
}

// ============================================================================
// Password Hashing Tests
// ============================================================================

#[cfg(test)]
mod password_tests {
    use bcrypt::{hash, verify, DEFAULT_COST};

    #[test]
    fn test_hash_round_trip() {
        let hashed = hash("duka-salama-2024", DEFAULT_COST).unwrap();
        assert!(verify("duka-salama-2024", &hashed).unwrap());
        assert!(!verify("wrong-password", &hashed).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash("same-password", DEFAULT_COST).unwrap();
        let second = hash("same-password", DEFAULT_COST).unwrap();
        assert_ne!(first, second);
    }
}
