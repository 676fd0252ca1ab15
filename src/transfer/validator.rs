//! Transfer Validator
//!
//! Read-only checks, in a fixed order that decides which error a bad request
//! surfaces first:
//!
//! 1. shape (`MalformedRequest`), before any ledger access
//! 2. caller account lookup (`AccountNotFound`)
//! 3. verification code (`VerificationCodeMismatch`)
//! 4. funds (`InsufficientFunds`)
//!
//! Checks 2-4 run against a possibly stale snapshot. They only reject early;
//! the ledger repeats 3 and 4 inside the commit.

use super::error::TransferError;
use super::types::{
    Account, AccountId, TransferApiRequest, TransferId, TransferRequest,
    VerificationCode,
};
use crate::money::{self, MinorUnits, MoneyError};
use serde_json::error::Category;

/// Longest accepted recipient id / verification code
const MAX_FIELD_LEN: usize = 128;

pub struct TransferValidator {
    max_amount: MinorUnits,
}

impl TransferValidator {
    pub fn new(max_amount: MinorUnits) -> Self {
        Self { max_amount }
    }

    /// Step 1: decode the body and check its shape.
    pub fn parse(&self, caller: &AccountId, body: &[u8]) -> Result<TransferRequest, TransferError> {
        let raw: TransferApiRequest = serde_json::from_slice(body).map_err(body_error)?;

        let recipient = required_text("recipient", raw.recipient)?;

        let amount = match raw.amount {
            None => return Err(TransferError::malformed("amount is required")),
            Some(amount) => money::parse_json_amount(&amount).map_err(amount_error)?,
        };
        if amount > self.max_amount {
            return Err(TransferError::malformed(format!(
                "amount exceeds the maximum of {}",
                self.max_amount
            )));
        }

        let code = verification_code(raw.verification_code)?;

        let recipient = AccountId::new(recipient);
        if &recipient == caller {
            return Err(TransferError::malformed("cannot transfer to the same account"));
        }

        Ok(TransferRequest {
            transfer_id: TransferId::new(),
            caller: caller.clone(),
            recipient,
            amount,
            verification_code: VerificationCode::new(code),
        })
    }

    /// Steps 2-4 against a snapshot of the caller's account.
    pub fn check(&self, req: &TransferRequest, snapshot: Option<&Account>) -> Result<(), TransferError> {
        let account = snapshot.ok_or(TransferError::AccountNotFound)?;

        if !account.code_matches(&req.verification_code) {
            return Err(TransferError::VerificationCodeMismatch);
        }

        if account.balance < req.amount {
            return Err(TransferError::InsufficientFunds);
        }

        Ok(())
    }
}

fn required_text(field: &str, value: Option<String>) -> Result<String, TransferError> {
    let value = value.unwrap_or_default();
    let value = value.trim();
    if value.is_empty() {
        return Err(TransferError::malformed(format!("{} is required", field)));
    }
    if value.len() > MAX_FIELD_LEN {
        return Err(TransferError::malformed(format!("{} is too long", field)));
    }
    Ok(value.to_string())
}

/// Codes are compared byte for byte, surrounding whitespace included.
fn verification_code(value: Option<String>) -> Result<String, TransferError> {
    let value = value.unwrap_or_default();
    if value.trim().is_empty() {
        return Err(TransferError::malformed("verificationCode is required"));
    }
    if value.len() > MAX_FIELD_LEN {
        return Err(TransferError::malformed("verificationCode is too long"));
    }
    Ok(value)
}

/// serde messages quote the offending value, which may be a verification code.
fn body_error(e: serde_json::Error) -> TransferError {
    match e.classify() {
        Category::Data => TransferError::malformed("request body has a missing or mistyped field"),
        Category::Syntax | Category::Eof | Category::Io => {
            TransferError::malformed("request body is not valid JSON")
        }
    }
}

fn amount_error(e: MoneyError) -> TransferError {
    TransferError::malformed(format!("invalid amount: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> TransferValidator {
        TransferValidator::new(MinorUnits::from_major(10_000).unwrap())
    }

    fn alice() -> AccountId {
        AccountId::from("alice")
    }

    fn parse(body: &str) -> Result<TransferRequest, TransferError> {
        validator().parse(&alice(), body.as_bytes())
    }

    fn assert_malformed(body: &str) {
        match parse(body) {
            Err(TransferError::MalformedRequest(_)) => {}
            other => panic!("expected MalformedRequest for {}, got {:?}", body, other),
        }
    }

    #[test]
    fn test_parse_valid_request() {
        let req = parse(r#"{"recipient":"bob","amount":40,"verificationCode":"493021"}"#).unwrap();
        assert_eq!(req.caller, alice());
        assert_eq!(req.recipient, AccountId::from("bob"));
        assert_eq!(req.amount, MinorUnits::new(4000));
        assert_eq!(req.verification_code.as_str(), "493021");

        let req = parse(r#"{"recipient":"bob","amount":"0.01","verificationCode":"x"}"#).unwrap();
        assert_eq!(req.amount, MinorUnits::new(1));
    }

    #[test]
    fn test_parse_rejects_bad_shape() {
        assert_malformed("not json");
        assert_malformed("[]");
        assert_malformed(r#"{"amount":40,"verificationCode":"1"}"#);
        assert_malformed(r#"{"recipient":"","amount":40,"verificationCode":"1"}"#);
        assert_malformed(r#"{"recipient":7,"amount":40,"verificationCode":"1"}"#);
        assert_malformed(r#"{"recipient":"bob","verificationCode":"1"}"#);
        assert_malformed(r#"{"recipient":"bob","amount":40}"#);
        assert_malformed(r#"{"recipient":"bob","amount":40,"verificationCode":"  "}"#);
        assert_malformed(r#"{"recipient":"bob","amount":true,"verificationCode":"1"}"#);
    }

    #[test]
    fn test_parse_rejects_non_positive_and_imprecise_amounts() {
        for amount in ["0", "-5", "\"0.00\"", "\"-1\"", "0.001", "\"abc\"", "\"1e3\""] {
            assert_malformed(&format!(
                r#"{{"recipient":"bob","amount":{},"verificationCode":"1"}}"#,
                amount
            ));
        }
    }

    #[test]
    fn test_parse_reads_amount_digits_as_sent() {
        // Both collapse to a valid f64 (40.0 and 100.0)
        assert_malformed(
            r#"{"recipient":"bob","amount":40.0000000000000001,"verificationCode":"1"}"#,
        );
        assert_malformed(r#"{"recipient":"bob","amount":1e2,"verificationCode":"1"}"#);
        assert_malformed(r#"{"recipient":"bob","amount":{"v":1},"verificationCode":"1"}"#);
        assert_malformed(r#"{"recipient":"bob","amount":null,"verificationCode":"1"}"#);

        let req = parse(r#"{"recipient":"bob","amount":40.10,"verificationCode":"1"}"#).unwrap();
        assert_eq!(req.amount, MinorUnits::new(4010));
    }

    #[test]
    fn test_malformed_message_does_not_echo_body() {
        let bodies = [
            r#"{"recipient":"bob","amount":40,"verificationCode":493021}"#,
            r#"{"recipient":"bob","amount":40,"verificationCode":[493021]}"#,
            r#"{"recipient":"bob","amount":40,"verificationCode":"493021""#,
            r#"{"recipient":493021,"amount":40,"verificationCode":"493021"}"#,
            r#"{"recipient":"bob","amount":{"code":"493021"},"verificationCode":"x"}"#,
        ];
        for body in bodies {
            let err = parse(body).unwrap_err();
            assert!(matches!(err, TransferError::MalformedRequest(_)), "{}", body);
            assert!(!err.public_message().contains("493021"), "{}", err.public_message());
            assert!(!err.to_string().contains("493021"), "{}", err);
        }
    }

    #[test]
    fn test_verification_code_is_not_trimmed() {
        let req = parse(r#"{"recipient":"bob","amount":1,"verificationCode":" 493021 "}"#).unwrap();
        assert_eq!(req.verification_code.as_str(), " 493021 ");

        let account = Account::new("alice", MinorUnits::new(5000), Some("493021"));
        assert_eq!(
            validator().check(&req, Some(&account)),
            Err(TransferError::VerificationCodeMismatch)
        );
    }

    #[test]
    fn test_parse_rejects_amount_above_limit() {
        assert_malformed(r#"{"recipient":"bob","amount":10000.01,"verificationCode":"1"}"#);
        assert!(parse(r#"{"recipient":"bob","amount":10000,"verificationCode":"1"}"#).is_ok());
    }

    #[test]
    fn test_parse_rejects_self_transfer() {
        assert_malformed(r#"{"recipient":"alice","amount":1,"verificationCode":"1"}"#);
        assert_malformed(r#"{"recipient":" alice ","amount":1,"verificationCode":"1"}"#);
    }

    #[test]
    fn test_check_order_lookup_before_code_before_funds() {
        let v = validator();
        // Wrong code AND insufficient funds
        let req = parse(r#"{"recipient":"bob","amount":500,"verificationCode":"wrong"}"#).unwrap();

        assert_eq!(v.check(&req, None), Err(TransferError::AccountNotFound));

        let poor = Account::new("alice", MinorUnits::from_major(10).unwrap(), Some("493021"));
        assert_eq!(
            v.check(&req, Some(&poor)),
            Err(TransferError::VerificationCodeMismatch)
        );

        let req = parse(r#"{"recipient":"bob","amount":500,"verificationCode":"493021"}"#).unwrap();
        assert_eq!(v.check(&req, Some(&poor)), Err(TransferError::InsufficientFunds));
    }

    #[test]
    fn test_check_exact_balance_passes() {
        let v = validator();
        let req = parse(r#"{"recipient":"bob","amount":"50.00","verificationCode":"c"}"#).unwrap();
        let account = Account::new("alice", MinorUnits::new(5000), Some("c"));
        assert_eq!(v.check(&req, Some(&account)), Ok(()));
    }

    #[test]
    fn test_check_consumed_code_is_mismatch() {
        let v = validator();
        let req = parse(r#"{"recipient":"bob","amount":1,"verificationCode":"c"}"#).unwrap();
        let account = Account::new("alice", MinorUnits::new(5000), None);
        assert_eq!(
            v.check(&req, Some(&account)),
            Err(TransferError::VerificationCodeMismatch)
        );
    }
}
