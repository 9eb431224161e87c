use ethers::types::Address;
use thiserror::Error;
use valise_contracts::{extract_address, FailedOp};

/// Errors surfaced by the bundler relay
///
/// Two rejection shapes exist: the relay may refuse an operation before simulating it
/// (`Rejected`), or the entry point simulation may revert with a structured `FailedOp`.
/// Both carry the relay's message verbatim; nothing here is retried automatically.
#[derive(Debug, Error, Clone)]
pub enum BundlerError {
    /// The bundler refused the operation before simulation
    #[error("user operation rejected: {message}")]
    Rejected {
        /// The bundler's message, verbatim
        message: String,
    },

    /// The entry point simulation of the operation reverted
    #[error("{0}")]
    FailedOp(FailedOp),

    /// The request could not be delivered
    #[error("bundler request failed: {inner}")]
    Request {
        /// The inner error message
        inner: String,
    },

    /// The response could not be decoded
    #[error("decode error: {inner}")]
    Decode {
        /// The inner error message
        inner: String,
    },
}

impl BundlerError {
    /// The paymaster address embedded in the rejection message, if any
    pub fn paymaster(&self) -> Option<Address> {
        match self {
            BundlerError::Rejected { message } => extract_address(message),
            BundlerError::FailedOp(op) => extract_address(&op.reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::types::U256;

    #[test]
    fn paymaster_from_failed_op() {
        let err = BundlerError::FailedOp(FailedOp {
            op_index: U256::zero(),
            reason: "AA33 reverted: 0x0265Ab8884E9BB9DA3302a0F251B8158C5e8a0cf".into(),
        });
        assert_eq!(
            err.paymaster(),
            Some("0x0265Ab8884E9BB9DA3302a0F251B8158C5e8a0cf".parse().unwrap())
        );

        let err = BundlerError::Rejected { message: "replacement underpriced".into() };
        assert_eq!(err.paymaster(), None);
    }
}
