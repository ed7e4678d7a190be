//! Domain model: accounts, debit cards and the external customer record.
//!
//! Bus and HTTP payloads use camelCase JSON, matching the other services on
//! the platform.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an existing id.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the id as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns `true` if the id is empty or only whitespace.
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Account identifier.
    AccountId
);
string_id!(
    /// Debit card identifier.
    CardId
);
string_id!(
    /// Customer identifier, issued by the customer service.
    CustomerId
);

impl AccountId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl CardId {
    /// Generate a fresh random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Error returned when parsing one of the string-coded enums fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: '{value}'")]
pub struct ParseEnumError {
    kind: &'static str,
    value: String,
}

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident, $label:literal { $($(#[$vmeta:meta])* $variant:ident => $code:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $code)]
                $variant,
            )+
        }

        impl $name {
            /// Wire and storage representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(ParseEnumError { kind: $label, value: s.to_string() }),
                }
            }
        }
    };
}

string_enum!(
    /// Kind of bank account.
    AccountType, "account type" {
        /// Savings account (may carry VIP status)
        Savings => "SAVINGS",
        /// Checking account (may carry PYM status)
        Checking => "CHECKING",
        /// Fixed-term deposit
        FixedTerm => "FIXED_TERM",
    }
);

string_enum!(
    /// Kind of customer.
    CustomerType, "customer type" {
        /// Individual
        Personal => "PERSONAL",
        /// Company
        Business => "BUSINESS",
    }
);

string_enum!(
    /// Debit card status. `Deleted` is a soft delete.
    CardStatus, "card status" {
        /// Usable
        Active => "ACTIVE",
        /// Temporarily unusable
        Blocked => "BLOCKED",
        /// Soft-deleted
        Deleted => "DELETED",
    }
);

string_enum!(
    /// Customer-level elevation flag pushed to the customer service.
    StatusKind, "status kind" {
        /// Savings elevation
        Vip => "VIP",
        /// Checking elevation
        Pym => "PYM",
    }
);

/// A bank account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Account id
    pub id: AccountId,
    /// Owning customer
    pub customer_id: CustomerId,
    /// Account type
    pub account_type: AccountType,
    /// Current balance, never negative
    pub balance: Decimal,
    /// VIP flag (SAVINGS only)
    pub is_vip: bool,
    /// Minimum balance, set iff `is_vip`
    pub min_balance_requirement: Option<Decimal>,
    /// PYM flag (CHECKING only)
    pub is_pym: bool,
    /// Monthly maintenance fee, zero iff `is_pym`
    pub maintenance_fee: Option<Decimal>,
    /// Holder names, owner first
    pub holders: Vec<String>,
    /// Authorised signers
    pub signers: Vec<String>,
    /// Free transactions per period
    pub max_free_transaction: i32,
    /// Cost of each transaction beyond the free ones
    pub transaction_cost: Decimal,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time, `None` until the first update
    pub modified_at: Option<DateTime<Utc>>,
}

/// Requested account, before policy is applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountDraft {
    /// Requested type
    pub account_type: AccountType,
    /// Opening balance
    pub balance: Decimal,
    /// Requested holders (may be empty)
    #[serde(default)]
    pub holders: Vec<String>,
    /// Requested signers
    #[serde(default)]
    pub signers: Vec<String>,
}

impl AccountDraft {
    /// Draft with no holders or signers.
    #[must_use]
    pub const fn new(account_type: AccountType, balance: Decimal) -> Self {
        Self {
            account_type,
            balance,
            holders: Vec::new(),
            signers: Vec::new(),
        }
    }

    /// Set requested holders.
    #[must_use]
    pub fn with_holders<I, S>(mut self, holders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.holders = holders.into_iter().map(Into::into).collect();
        self
    }

    /// Set requested signers.
    #[must_use]
    pub fn with_signers<I, S>(mut self, signers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.signers = signers.into_iter().map(Into::into).collect();
        self
    }
}

/// Fields overwritten by an account update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountPatch {
    /// New balance
    pub balance: Decimal,
    /// New holders
    pub holders: Vec<String>,
    /// New signers
    pub signers: Vec<String>,
}

/// A debit card linked to one or more accounts of the same customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebitCard {
    /// Card id
    pub id: CardId,
    /// 16-digit, Luhn-valid card number
    pub card_number: String,
    /// Owning customer
    pub customer_id: CustomerId,
    /// Card status
    pub status: CardStatus,
    /// Account debited by default; always in `associated_account_ids`
    pub primary_account_id: AccountId,
    /// Linked accounts, in association order, without duplicates
    pub associated_account_ids: Vec<AccountId>,
    /// Expiry, four years after issue
    pub expiration_date: DateTime<Utc>,
    /// Issue time
    pub created_at: DateTime<Utc>,
    /// Last change time
    pub modified_at: Option<DateTime<Utc>>,
}

impl DebitCard {
    /// Returns `true` if `account_id` is linked to this card.
    #[must_use]
    pub fn is_associated(&self, account_id: &AccountId) -> bool {
        self.associated_account_ids.contains(account_id)
    }
}

/// Balance of the primary account behind a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimaryAccountBalance {
    /// Card id
    pub card_id: CardId,
    /// Card number
    pub card_number: String,
    /// Primary account id
    pub primary_account_id: AccountId,
    /// Primary account balance
    pub balance: Decimal,
}

/// Customer record owned by the customer service.
///
/// Also stored in the directory cache with bincode, so every field is always
/// serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Customer id
    pub id: CustomerId,
    /// Full legal name
    pub full_name: String,
    /// Personal or business
    pub customer_type: CustomerType,
    /// VIP flag
    #[serde(rename = "isVip", alias = "vip", default)]
    pub is_vip: bool,
    /// PYM flag
    #[serde(rename = "isPym", alias = "pym", default)]
    pub is_pym: bool,
    /// National id or tax document
    #[serde(default)]
    pub document_number: Option<String>,
    /// Contact email
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone
    #[serde(default)]
    pub phone_number: Option<String>,
}

impl Customer {
    /// Returns `true` if `name` matches the customer's name, ignoring case
    /// and surrounding whitespace.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        normalize_name(name) == normalize_name(&self.full_name)
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Credit card summary returned by the credit service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCard {
    /// Credit card id
    pub id: String,
    /// Owning customer
    #[serde(default)]
    pub customer_id: Option<String>,
    /// Masked or full card number
    #[serde(default)]
    pub card_number: Option<String>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)] // Tests can use unwrap

    use super::*;

    #[test]
    fn account_type_uses_wire_codes() {
        assert_eq!(AccountType::FixedTerm.as_str(), "FIXED_TERM");
        assert_eq!("CHECKING".parse::<AccountType>().unwrap(), AccountType::Checking);
        assert!("checking".parse::<AccountType>().is_err());
        assert_eq!(
            serde_json::to_string(&AccountType::Savings).unwrap(),
            "\"SAVINGS\""
        );
    }

    #[test]
    fn customer_accepts_short_flag_names() {
        let json = r#"{"id":"C-1","fullName":"Ana Diaz","customerType":"PERSONAL","vip":true}"#;
        let customer: Customer = serde_json::from_str(json).unwrap();

        assert!(customer.is_vip);
        assert!(!customer.is_pym);
        assert_eq!(customer.document_number, None);
    }

    #[test]
    fn customer_survives_bincode() {
        let customer = Customer {
            id: CustomerId::new("C-1"),
            full_name: "Ana Diaz".to_string(),
            customer_type: CustomerType::Business,
            is_vip: false,
            is_pym: true,
            document_number: Some("12345678".to_string()),
            email: None,
            phone_number: None,
        };

        let bytes = bincode::serialize(&customer).unwrap();
        let decoded: Customer = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, customer);
    }

    #[test]
    fn name_match_ignores_case_and_whitespace() {
        let customer = Customer {
            id: CustomerId::new("C-1"),
            full_name: "Ana Diaz".to_string(),
            customer_type: CustomerType::Personal,
            is_vip: false,
            is_pym: false,
            document_number: None,
            email: None,
            phone_number: None,
        };

        assert!(customer.is_named("  ana DIAZ "));
        assert!(!customer.is_named("Ana Maria Diaz"));
    }

    #[test]
    fn account_serializes_camel_case() {
        let account = Account {
            id: AccountId::new("acc-1"),
            customer_id: CustomerId::new("C-1"),
            account_type: AccountType::Savings,
            balance: Decimal::new(100_050, 2),
            is_vip: true,
            min_balance_requirement: Some(Decimal::from(60)),
            is_pym: false,
            maintenance_fee: None,
            holders: vec!["Ana Diaz".to_string()],
            signers: vec![],
            max_free_transaction: 5,
            transaction_cost: Decimal::new(550, 2),
            created_at: Utc::now(),
            modified_at: None,
        };

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["customerId"], "C-1");
        assert_eq!(json["accountType"], "SAVINGS");
        assert_eq!(json["balance"], "1000.50");
        assert_eq!(json["isVip"], true);
        assert!(json["modifiedAt"].is_null());
    }
}
