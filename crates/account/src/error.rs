use ethers::types::Address;
use thiserror::Error;
use valise_bundler::BundlerError;
use valise_primitives::UserOperationHash;

/// Errors surfaced by the account pipeline
///
/// The taxonomy mirrors the pipeline stages: configuration problems are caught before
/// any network call, estimation and submission failures carry the relay's message
/// verbatim (plus the offending paymaster when one can be identified), and waiting for
/// inclusion past the deadline is a distinct `Timeout`.
#[derive(Debug, Error)]
pub enum AccountError {
    /// The request or the account configuration is invalid; nothing was sent
    #[error("invalid configuration: {inner}")]
    Config {
        /// The inner error message
        inner: String,
    },

    /// Gas estimation or sponsorship negotiation failed
    #[error("gas estimation failed: {inner}")]
    Estimation {
        /// The inner error message, verbatim from the relay
        inner: String,
        /// The paymaster involved in the failure, if one could be identified
        paymaster: Option<Address>,
    },

    /// The bundler refused the signed operation
    #[error("submission failed: {inner}")]
    Submission {
        /// The inner error message, verbatim from the relay
        inner: String,
        /// The paymaster involved in the failure, if one could be identified
        paymaster: Option<Address>,
    },

    /// The operation was not included before the deadline
    ///
    /// The operation may still land later; the hash can be polled again.
    #[error("user operation {hash:?} not included after {seconds}s")]
    Timeout {
        /// The hash under which the bundler tracks the operation
        hash: UserOperationHash,
        /// The deadline that elapsed
        seconds: u64,
    },

    /// A freshly produced signature failed on-chain verification
    #[error("signature verification failed for account {account:?}")]
    Verification {
        /// The smart account the signature was checked against
        account: Address,
    },

    /// The RPC node returned an error
    #[error("provider error: {inner}")]
    Provider {
        /// The inner error message
        inner: String,
    },

    /// The signer could not produce a signature
    #[error("signer error: {inner}")]
    Signer {
        /// The inner error message
        inner: String,
    },
}

impl AccountError {
    /// Shorthand for a configuration error
    pub fn config<T: Into<String>>(inner: T) -> Self {
        AccountError::Config { inner: inner.into() }
    }

    /// Shorthand for a provider error
    pub fn provider<T: ToString>(inner: T) -> Self {
        AccountError::Provider { inner: inner.to_string() }
    }

    /// Wrap a relay error from the estimation stage
    pub fn from_estimation(err: BundlerError) -> Self {
        AccountError::Estimation { paymaster: err.paymaster(), inner: err.to_string() }
    }

    /// Wrap a relay error from the submission stage
    pub fn from_submission(err: BundlerError) -> Self {
        AccountError::Submission { paymaster: err.paymaster(), inner: err.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_message_kept_verbatim() {
        let err = AccountError::from_submission(BundlerError::Rejected {
            message: "sender balance and deposit together is 0".into(),
        });
        assert!(err.to_string().contains("sender balance and deposit together is 0"));
        assert!(matches!(err, AccountError::Submission { paymaster: None, .. }));
    }

    #[test]
    fn estimation_error_carries_paymaster() {
        let err = AccountError::from_estimation(BundlerError::Rejected {
            message: "AA31 paymaster deposit too low: 0x0265Ab8884E9BB9DA3302a0F251B8158C5e8a0cf"
                .into(),
        });
        match err {
            AccountError::Estimation { paymaster, .. } => {
                assert_eq!(
                    paymaster,
                    Some("0x0265Ab8884E9BB9DA3302a0F251B8158C5e8a0cf".parse().unwrap())
                );
            }
            _ => panic!("expected estimation error"),
        }
    }
}
