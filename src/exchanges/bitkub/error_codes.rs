pub use crate::core::errors::ErrorCategory;
use crate::core::errors::ExchangeError;
use std::fmt;

/// Text returned for codes missing from the table.
pub const UNRECOGNIZED_MESSAGE: &str = "Unrecognized error code";

/// Exchange error codes. The numbers are part of the wire contract and are
/// never renumbered; new codes are only appended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i64)]
pub enum BitkubErrorCode {
    NoError = 0,
    InvalidJsonPayload = 1,
    MissingApiKey = 2,
    InvalidApiKey = 3,
    ApiPendingForActivation = 4,
    IpNotAllowed = 5,
    MissingOrInvalidSignature = 6,
    MissingTimestamp = 7,
    InvalidTimestamp = 8,
    InvalidUser = 9,
    InvalidParameter = 10,
    InvalidSymbol = 11,
    InvalidAmount = 12,
    InvalidRate = 13,
    ImproperRate = 14,
    AmountTooLow = 15,
    FailedToGetBalance = 16,
    WalletIsEmpty = 17,
    InsufficientBalance = 18,
    FailedToInsertOrder = 19,
    FailedToDeductBalance = 20,
    InvalidOrderForCancellation = 21,
    InvalidSide = 22,
    FailedToUpdateOrderStatus = 23,
    InvalidOrderForLookup = 24,
    KycLevel1Required = 25,
    LimitExceeds = 30,
    PendingWithdrawalExists = 40,
    InvalidCurrencyForWithdrawal = 41,
    AddressNotInWhitelist = 42,
    FailedToDeductCrypto = 43,
    FailedToCreateWithdrawalRecord = 44,
    NonceHasToBeNumeric = 45,
    InvalidNonce = 46,
    WithdrawalLimitExceeds = 47,
    InvalidBankAccount = 48,
    BankLimitExceeds = 49,
    PendingWithdrawalExistsFiat = 50,
    WithdrawalUnderMaintenance = 51,
    InvalidPermission = 52,
    InvalidInternalAddress = 53,
    AddressDeprecated = 54,
    CancelOnlyMode = 55,
    SuspendedFromPurchasing = 56,
    SuspendedFromSelling = 57,
    ServerError = 90,
}

impl BitkubErrorCode {
    pub const ALL: [Self; 46] = [
        Self::NoError,
        Self::InvalidJsonPayload,
        Self::MissingApiKey,
        Self::InvalidApiKey,
        Self::ApiPendingForActivation,
        Self::IpNotAllowed,
        Self::MissingOrInvalidSignature,
        Self::MissingTimestamp,
        Self::InvalidTimestamp,
        Self::InvalidUser,
        Self::InvalidParameter,
        Self::InvalidSymbol,
        Self::InvalidAmount,
        Self::InvalidRate,
        Self::ImproperRate,
        Self::AmountTooLow,
        Self::FailedToGetBalance,
        Self::WalletIsEmpty,
        Self::InsufficientBalance,
        Self::FailedToInsertOrder,
        Self::FailedToDeductBalance,
        Self::InvalidOrderForCancellation,
        Self::InvalidSide,
        Self::FailedToUpdateOrderStatus,
        Self::InvalidOrderForLookup,
        Self::KycLevel1Required,
        Self::LimitExceeds,
        Self::PendingWithdrawalExists,
        Self::InvalidCurrencyForWithdrawal,
        Self::AddressNotInWhitelist,
        Self::FailedToDeductCrypto,
        Self::FailedToCreateWithdrawalRecord,
        Self::NonceHasToBeNumeric,
        Self::InvalidNonce,
        Self::WithdrawalLimitExceeds,
        Self::InvalidBankAccount,
        Self::BankLimitExceeds,
        Self::PendingWithdrawalExistsFiat,
        Self::WithdrawalUnderMaintenance,
        Self::InvalidPermission,
        Self::InvalidInternalAddress,
        Self::AddressDeprecated,
        Self::CancelOnlyMode,
        Self::SuspendedFromPurchasing,
        Self::SuspendedFromSelling,
        Self::ServerError,
    ];

    pub fn from_code(code: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|known| known.code() == code)
    }

    pub const fn code(self) -> i64 {
        self as i64
    }

    pub const fn message(self) -> &'static str {
        match self {
            Self::NoError => "No error",
            Self::InvalidJsonPayload => "Invalid JSON payload",
            Self::MissingApiKey => "Missing X-BTK-APIKEY",
            Self::InvalidApiKey => "Invalid API key",
            Self::ApiPendingForActivation => "API pending for activation",
            Self::IpNotAllowed => "IP not allowed",
            Self::MissingOrInvalidSignature => "Missing / invalid signature",
            Self::MissingTimestamp => "Missing timestamp",
            Self::InvalidTimestamp => "Invalid timestamp",
            Self::InvalidUser => "Invalid user",
            Self::InvalidParameter => "Invalid parameter",
            Self::InvalidSymbol => "Invalid symbol",
            Self::InvalidAmount => "Invalid amount",
            Self::InvalidRate => "Invalid rate",
            Self::ImproperRate => "Improper rate",
            Self::AmountTooLow => "Amount too low",
            Self::FailedToGetBalance => "Failed to get balance",
            Self::WalletIsEmpty => "Wallet is empty",
            Self::InsufficientBalance => "Insufficient balance",
            Self::FailedToInsertOrder => "Failed to insert order into db",
            Self::FailedToDeductBalance => "Failed to deduct balance",
            Self::InvalidOrderForCancellation => "Invalid order for cancellation",
            Self::InvalidSide => "Invalid side",
            Self::FailedToUpdateOrderStatus => "Failed to update order status",
            Self::InvalidOrderForLookup => "Invalid order for lookup",
            Self::KycLevel1Required => "KYC level 1 is required to proceed",
            Self::LimitExceeds => "Limit exceeds",
            Self::PendingWithdrawalExists | Self::PendingWithdrawalExistsFiat => {
                "Pending withdrawal exists"
            }
            Self::InvalidCurrencyForWithdrawal => "Invalid currency for withdrawal",
            Self::AddressNotInWhitelist => "Address is not in whitelist",
            Self::FailedToDeductCrypto => "Failed to deduct crypto",
            Self::FailedToCreateWithdrawalRecord => "Failed to create withdrawal record",
            Self::NonceHasToBeNumeric => "Nonce has to be numeric",
            Self::InvalidNonce => "Invalid nonce",
            Self::WithdrawalLimitExceeds => "Withdrawal limit exceeds",
            Self::InvalidBankAccount => "Invalid bank account",
            Self::BankLimitExceeds => "Bank limit exceeds",
            Self::WithdrawalUnderMaintenance => "Withdrawal is under maintenance",
            Self::InvalidPermission => "Invalid permission",
            Self::InvalidInternalAddress => "Invalid internal address",
            Self::AddressDeprecated => "Address has been deprecated",
            Self::CancelOnlyMode => "Cancel only mode",
            Self::SuspendedFromPurchasing => "User has been suspended from purchasing",
            Self::SuspendedFromSelling => "User has been suspended from selling",
            Self::ServerError => "Server error (please contact support)",
        }
    }

    pub const fn category(self) -> ErrorCategory {
        match self {
            Self::NoError => ErrorCategory::NoError,
            Self::InvalidJsonPayload
            | Self::MissingApiKey
            | Self::MissingOrInvalidSignature
            | Self::MissingTimestamp
            | Self::InvalidTimestamp => ErrorCategory::MalformedInput,
            Self::InvalidApiKey
            | Self::ApiPendingForActivation
            | Self::IpNotAllowed
            | Self::InvalidUser
            | Self::InvalidPermission => ErrorCategory::Authorization,
            Self::InvalidParameter
            | Self::InvalidSymbol
            | Self::InvalidAmount
            | Self::InvalidRate
            | Self::ImproperRate
            | Self::AmountTooLow
            | Self::InvalidSide
            | Self::InvalidCurrencyForWithdrawal
            | Self::NonceHasToBeNumeric
            | Self::InvalidNonce
            | Self::InvalidBankAccount
            | Self::InvalidInternalAddress
            | Self::AddressDeprecated => ErrorCategory::Validation,
            Self::WalletIsEmpty
            | Self::InsufficientBalance
            | Self::InvalidOrderForCancellation
            | Self::InvalidOrderForLookup
            | Self::PendingWithdrawalExists
            | Self::PendingWithdrawalExistsFiat => ErrorCategory::ResourceState,
            Self::KycLevel1Required
            | Self::LimitExceeds
            | Self::AddressNotInWhitelist
            | Self::WithdrawalLimitExceeds
            | Self::BankLimitExceeds
            | Self::WithdrawalUnderMaintenance
            | Self::CancelOnlyMode
            | Self::SuspendedFromPurchasing
            | Self::SuspendedFromSelling => ErrorCategory::Policy,
            Self::FailedToGetBalance
            | Self::FailedToInsertOrder
            | Self::FailedToDeductBalance
            | Self::FailedToUpdateOrderStatus
            | Self::FailedToDeductCrypto
            | Self::FailedToCreateWithdrawalRecord
            | Self::ServerError => ErrorCategory::Server,
        }
    }
}

impl fmt::Display for BitkubErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Category and text for any code, tolerating codes the table does not know.
pub fn describe(code: i64) -> (ErrorCategory, &'static str) {
    BitkubErrorCode::from_code(code).map_or(
        (ErrorCategory::Unrecognized, UNRECOGNIZED_MESSAGE),
        |known| (known.category(), known.message()),
    )
}

/// Build the application-level error for a non-zero envelope code.
pub fn api_error(code: i64) -> ExchangeError {
    let (category, message) = describe(code);
    ExchangeError::ApiError {
        code,
        category,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn codes_are_unique_and_within_wire_range() {
        let codes: HashSet<i64> = BitkubErrorCode::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(codes.len(), BitkubErrorCode::ALL.len());
        assert!(codes.iter().all(|code| (0..=90).contains(code)));
    }

    #[test]
    fn table_round_trips_every_code() {
        for known in BitkubErrorCode::ALL {
            assert_eq!(BitkubErrorCode::from_code(known.code()), Some(known));
        }
    }

    #[test]
    fn pinned_codes_keep_their_numbers() {
        assert_eq!(BitkubErrorCode::InsufficientBalance.code(), 18);
        assert_eq!(BitkubErrorCode::LimitExceeds.code(), 30);
        assert_eq!(BitkubErrorCode::CancelOnlyMode.code(), 55);
        assert_eq!(BitkubErrorCode::ServerError.code(), 90);
    }

    #[test]
    fn insufficient_balance_is_resource_state() {
        assert_eq!(
            describe(18),
            (ErrorCategory::ResourceState, "Insufficient balance")
        );
    }

    #[test]
    fn categories_follow_the_taxonomy() {
        assert_eq!(describe(1).0, ErrorCategory::MalformedInput);
        assert_eq!(describe(6).0, ErrorCategory::MalformedInput);
        assert_eq!(describe(5).0, ErrorCategory::Authorization);
        assert_eq!(describe(22).0, ErrorCategory::Validation);
        assert_eq!(describe(21).0, ErrorCategory::ResourceState);
        assert_eq!(describe(55).0, ErrorCategory::Policy);
        assert_eq!(describe(90).0, ErrorCategory::Server);
    }

    #[test]
    fn unknown_codes_fall_back() {
        assert_eq!(
            describe(9999),
            (ErrorCategory::Unrecognized, UNRECOGNIZED_MESSAGE)
        );
        assert_eq!(describe(-1).0, ErrorCategory::Unrecognized);
        assert_eq!(describe(26).0, ErrorCategory::Unrecognized);
    }

    #[test]
    fn api_error_carries_code_and_text() {
        match api_error(18) {
            ExchangeError::ApiError {
                code,
                category,
                message,
            } => {
                assert_eq!(code, 18);
                assert_eq!(category, ErrorCategory::ResourceState);
                assert_eq!(message, "Insufficient balance");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
