use crate::error::SyncError;

use super::policy::RetryPolicy;

/// Outcome of classifying a failed attempt.
///
/// `Unknown` is treated like `Permanent` by the executor; classification
/// fails closed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    /// Retrying cannot help (validation failures, auth, 4xx business rules)
    Permanent,
    /// Worth another attempt (rate limits, 5xx, network blips)
    Transient,
    /// Matches neither signature set; not retried
    Unknown,
}

/// Message fragments that identify business-rule validation failures.
/// These take precedence over everything else: a 500 whose body says
/// "handle already exists" is still a permanent failure.
const PERMANENT_SIGNATURES: &[&str] = &[
    "not found",
    "already exists",
    "already taken",
    "has already been taken",
    "required field",
    "can't be blank",
    "cannot be blank",
    "invalid format",
    "is invalid",
    "exceeds",
    "limit exceeded",
    "unprocessable",
];

/// Classifies a failed attempt as permanent, transient, or unknown.
///
/// Permanent signatures are checked first, then the structured variants
/// (auth, validation, not-found), then the policy's retryable status codes
/// and transient-network vocabulary.
pub fn classify(err: &SyncError, policy: &RetryPolicy) -> ErrorClass {
    let message = err.to_string();
    if matches_permanent_signature(&message) {
        return ErrorClass::Permanent;
    }

    match err {
        SyncError::Auth(_) | SyncError::Validation(_) | SyncError::NotFound(_) => {
            ErrorClass::Permanent
        }
        SyncError::Config(_) => ErrorClass::Permanent,
        SyncError::Http { status, .. } => classify_status(*status, &message, policy),
        SyncError::Network(msg) => {
            // reqwest only surfaces this variant for transport-level
            // failures, but an unrecognized message still fails closed.
            if policy.message_is_retryable(msg) || is_transport_vocabulary(msg) {
                ErrorClass::Transient
            } else {
                ErrorClass::Unknown
            }
        }
        SyncError::Generic(msg) => {
            if policy.message_is_retryable(msg) {
                ErrorClass::Transient
            } else {
                ErrorClass::Unknown
            }
        }
        SyncError::Json(_) | SyncError::Yaml(_) | SyncError::Io(_) => ErrorClass::Unknown,
    }
}

fn classify_status(status: u16, message: &str, policy: &RetryPolicy) -> ErrorClass {
    if policy.status_is_retryable(status) {
        return ErrorClass::Transient;
    }
    match status {
        401 | 403 => ErrorClass::Permanent,
        // 408/429 are in the retryable set; remaining 4xx are
        // business-rule rejections that retrying cannot fix.
        400..=499 => ErrorClass::Permanent,
        _ => {
            if policy.message_is_retryable(message) {
                ErrorClass::Transient
            } else {
                ErrorClass::Unknown
            }
        }
    }
}

fn matches_permanent_signature(message: &str) -> bool {
    let lower = message.to_lowercase();
    PERMANENT_SIGNATURES.iter().any(|sig| lower.contains(sig))
}

fn is_transport_vocabulary(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("connect") || lower.contains("network") || lower.contains("timeout")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn policy() -> RetryPolicy {
        RetryPolicy::default()
    }

    #[rstest]
    #[case(SyncError::Http { status: 429, message: "throttled".into() }, ErrorClass::Transient)]
    #[case(SyncError::Http { status: 503, message: "upstream".into() }, ErrorClass::Transient)]
    #[case(SyncError::Http { status: 408, message: "request timeout".into() }, ErrorClass::Transient)]
    #[case(SyncError::Http { status: 401, message: "bad token".into() }, ErrorClass::Permanent)]
    #[case(SyncError::Http { status: 422, message: "unprocessable entity".into() }, ErrorClass::Permanent)]
    #[case(SyncError::Auth("invalid credentials".into()), ErrorClass::Permanent)]
    #[case(SyncError::Validation("title can't be blank".into()), ErrorClass::Permanent)]
    #[case(SyncError::NotFound("page gone".into()), ErrorClass::Permanent)]
    #[case(SyncError::Network("connection reset by peer".into()), ErrorClass::Transient)]
    #[case(SyncError::Network("dns error: failed to lookup".into()), ErrorClass::Transient)]
    #[case(SyncError::Generic("operation timed out".into()), ErrorClass::Transient)]
    fn classification_table(#[case] err: SyncError, #[case] expected: ErrorClass) {
        assert_eq!(classify(&err, &policy()), expected);
    }

    #[test]
    fn permanent_signature_wins_over_retryable_status() {
        let err = SyncError::Http {
            status: 500,
            message: "handle already exists".into(),
        };
        assert_eq!(classify(&err, &policy()), ErrorClass::Permanent);
    }

    #[test]
    fn unrecognized_errors_fail_closed() {
        let err = SyncError::Generic("something odd happened".into());
        assert_eq!(classify(&err, &policy()), ErrorClass::Unknown);

        let err = SyncError::Http {
            status: 501,
            message: "not implemented".into(),
        };
        assert_eq!(classify(&err, &policy()), ErrorClass::Unknown);
    }
}
