//! Contract bindings, generated from human-readable ABI fragments
//!
//! Only the functions and custom errors the pipeline actually calls are declared.

use ethers::prelude::abigen;

abigen!(
    EntryPointApi,
    r#"[
        function getNonce(address sender, uint192 key) external view returns (uint256 nonce)
        function balanceOf(address account) external view returns (uint256)
        error FailedOp(uint256 opIndex, string reason)
        error SenderAddressResult(address sender)
    ]"#;

    AccountFactoryApi,
    r#"[
        function createAccount(address admin, bytes calldata data) external returns (address)
        function getAddress(address admin, bytes calldata data) external view returns (address)
        function accountImplementation() external view returns (address)
    ]"#;

    AccountApi,
    r#"[
        function execute(address target, uint256 value, bytes calldata data) external
        function executeBatch(address[] calldata target, uint256[] calldata value, bytes[] calldata data) external
        function getMessageHash(bytes32 message) external view returns (bytes32)
        function isValidSignature(bytes32 hash, bytes memory signature) external view returns (bytes4)
    ]"#;

    Erc20Api,
    r#"[
        function allowance(address owner, address spender) external view returns (uint256)
        function approve(address spender, uint256 amount) external returns (bool)
        function balanceOf(address account) external view returns (uint256)
    ]"#
);

pub use account_api::{ExecuteBatchCall, ExecuteCall, GetMessageHashCall, IsValidSignatureCall};
pub use account_factory_api::{CreateAccountCall, GetAddressCall};
pub use entry_point_api::{EntryPointApiErrors, FailedOp, GetNonceCall, SenderAddressResult};
pub use erc_20_api::{AllowanceCall, ApproveCall};
