//! Lipa na M-Pesa Online (STK push) builders.

// crates.io
use serde_json::json;
// self
use crate::{
	_prelude::*,
	caller::{Executor, OperationResponse},
	services::{self, DEFAULT_COUNTRY_CODE, PasswordStamp, ValidationError},
};

/// Route of the push prompt endpoint.
pub const STK_PUSH_ROUTE: &str = "/mpesa/stkpush/v1/processrequest";
/// Route of the push status query endpoint.
pub const STK_QUERY_ROUTE: &str = "/mpesa/stkpushquery/v1/query";
/// `AccountReference` sent when none is set.
pub const DEFAULT_ACCOUNT_REFERENCE: &str = "Account";
/// `TransactionDesc` sent when none is set.
pub const DEFAULT_TRANSACTION_DESC: &str = "Transaction";

/// Prompts a customer's handset to authorize a payment.
///
/// ```no_run
/// # async fn demo(caller: &dyn mpesa_sdk::caller::Executor) -> mpesa_sdk::error::Result<()> {
/// use mpesa_sdk::services::StkPush;
///
/// let response = StkPush::new("174379", "passkey")
/// 	.with_transaction_type("CustomerPayBillOnline")
/// 	.with_amount(100)
/// 	.with_phone_number("0711223344")?
/// 	.with_callback_url("https://example.com/callback")
/// 	.push(caller)
/// 	.await?;
///
/// println!("{}", StkPush::checkout_request_id(&response)?);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct StkPush {
	short_code: String,
	passkey: String,
	transaction_type: String,
	amount: String,
	phone_number: String,
	callback_url: String,
	account_reference: String,
	transaction_desc: String,
}
impl StkPush {
	/// Starts a push for the paybill/till `short_code` and its Lipa na M-Pesa `passkey`.
	pub fn new(short_code: impl Into<String>, passkey: impl Into<String>) -> Self {
		Self {
			short_code: short_code.into(),
			passkey: passkey.into(),
			transaction_type: String::new(),
			amount: String::new(),
			phone_number: String::new(),
			callback_url: String::new(),
			account_reference: String::new(),
			transaction_desc: String::new(),
		}
	}

	/// Sets the transaction type, e.g. `CustomerPayBillOnline` or `CustomerBuyGoodsOnline`.
	pub fn with_transaction_type(mut self, transaction_type: impl Into<String>) -> Self {
		self.transaction_type = transaction_type.into();

		self
	}

	/// Sets the amount charged to the customer.
	pub fn with_amount(mut self, amount: impl Display) -> Self {
		self.amount = amount.to_string();

		self
	}

	/// Sets the paying phone number after normalizing it with the Kenyan country code.
	pub fn with_phone_number(self, phone: &str) -> Result<Self, ValidationError> {
		self.with_phone_number_in(phone, DEFAULT_COUNTRY_CODE)
	}

	/// Sets the paying phone number after normalizing it with `country_code`.
	pub fn with_phone_number_in(
		mut self,
		phone: &str,
		country_code: &str,
	) -> Result<Self, ValidationError> {
		self.phone_number = services::clean_phone_number(phone, country_code)?;

		Ok(self)
	}

	/// Sets the URL receiving the payment result.
	pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
		self.callback_url = url.into();

		self
	}

	/// Sets the account reference shown to the customer.
	pub fn with_account_reference(mut self, reference: impl Into<String>) -> Self {
		self.account_reference = reference.into();

		self
	}

	/// Sets the transaction description.
	pub fn with_transaction_desc(mut self, desc: impl Into<String>) -> Self {
		self.transaction_desc = desc.into();

		self
	}

	/// Validates the builder and renders the request body for `now`.
	pub fn payload_at(&self, now: OffsetDateTime) -> Result<Value> {
		services::require("BusinessShortCode", &self.short_code)?;
		services::require("TransactionType", &self.transaction_type)?;
		services::require("Amount", &self.amount)?;
		services::require("PhoneNumber", &self.phone_number)?;
		services::require("CallBackURL", &self.callback_url)?;

		let PasswordStamp { timestamp, password } =
			PasswordStamp::at(&self.short_code, &self.passkey, now)?;

		Ok(json!({
			"BusinessShortCode": self.short_code,
			"Password": password,
			"Timestamp": timestamp,
			"TransactionType": self.transaction_type,
			"Amount": self.amount,
			"PartyA": self.phone_number,
			"PartyB": self.short_code,
			"PhoneNumber": self.phone_number,
			"CallBackURL": self.callback_url,
			"AccountReference": or_default(&self.account_reference, DEFAULT_ACCOUNT_REFERENCE),
			"TransactionDesc": or_default(&self.transaction_desc, DEFAULT_TRANSACTION_DESC),
		}))
	}

	/// Sends the push through `executor`.
	pub async fn push(&self, executor: &dyn Executor) -> Result<OperationResponse> {
		let payload = self.payload_at(OffsetDateTime::now_utc())?;

		executor.execute(payload, STK_PUSH_ROUTE).await
	}

	/// Extracts the `CheckoutRequestID` used to query the push later.
	pub fn checkout_request_id(response: &OperationResponse) -> Result<&str, ValidationError> {
		response
			.field_str("CheckoutRequestID")
			.ok_or(ValidationError::MissingResponseField { field: "CheckoutRequestID" })
	}
}
impl Debug for StkPush {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StkPush")
			.field("short_code", &self.short_code)
			.field("passkey", &"<redacted>")
			.field("transaction_type", &self.transaction_type)
			.field("amount", &self.amount)
			.field("phone_number", &self.phone_number)
			.field("callback_url", &self.callback_url)
			.field("account_reference", &self.account_reference)
			.field("transaction_desc", &self.transaction_desc)
			.finish()
	}
}

/// Queries the status of an earlier push.
///
/// While the customer has not answered the prompt the remote API reports the pending sentinel;
/// such responses come back as successes with [`OperationResponse::is_pending`] set.
#[derive(Clone, PartialEq, Eq)]
pub struct StkQuery {
	short_code: String,
	passkey: String,
	checkout_request_id: String,
}
impl StkQuery {
	/// Queries `checkout_request_id` on behalf of `short_code`.
	pub fn new(
		short_code: impl Into<String>,
		passkey: impl Into<String>,
		checkout_request_id: impl Into<String>,
	) -> Self {
		Self {
			short_code: short_code.into(),
			passkey: passkey.into(),
			checkout_request_id: checkout_request_id.into(),
		}
	}

	/// Queries the push that produced `response`.
	pub fn for_push(push: &StkPush, response: &OperationResponse) -> Result<Self, ValidationError> {
		let checkout_request_id = StkPush::checkout_request_id(response)?;

		Ok(Self::new(push.short_code.clone(), push.passkey.clone(), checkout_request_id))
	}

	/// Validates the builder and renders the request body for `now`.
	pub fn payload_at(&self, now: OffsetDateTime) -> Result<Value> {
		services::require("BusinessShortCode", &self.short_code)?;
		services::require("CheckoutRequestID", &self.checkout_request_id)?;

		let PasswordStamp { timestamp, password } =
			PasswordStamp::at(&self.short_code, &self.passkey, now)?;

		Ok(json!({
			"BusinessShortCode": self.short_code,
			"Password": password,
			"Timestamp": timestamp,
			"CheckoutRequestID": self.checkout_request_id,
		}))
	}

	/// Sends the query through `executor`.
	pub async fn query(&self, executor: &dyn Executor) -> Result<OperationResponse> {
		let payload = self.payload_at(OffsetDateTime::now_utc())?;

		executor.execute(payload, STK_QUERY_ROUTE).await
	}
}
impl Debug for StkQuery {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StkQuery")
			.field("short_code", &self.short_code)
			.field("passkey", &"<redacted>")
			.field("checkout_request_id", &self.checkout_request_id)
			.finish()
	}
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
	if value.trim().is_empty() { default } else { value }
}
