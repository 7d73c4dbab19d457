//! Demonstrates an STK push followed by a status query against a local mock of the Daraja API,
//! using the default reqwest transport and an in-memory credential store.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use mpesa_sdk::{
	cache::CredentialCache,
	caller::AuthenticatedCaller,
	config::ClientIdentity,
	http::ReqwestTransport,
	services::{STK_PUSH_ROUTE, STK_QUERY_ROUTE, StkPush, StkQuery},
	store::MemoryStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/oauth/v1/generate").query_param("grant_type", "client_credentials");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-access\",\"expires_in\":\"3599\"}");
		})
		.await;
	let push_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(STK_PUSH_ROUTE).header("authorization", "Bearer demo-access");
			then.status(200).json_body(json!({
				"MerchantRequestID": "29115-34620561-1",
				"CheckoutRequestID": "ws_CO_191220191020363925",
				"ResponseCode": "0",
				"CustomerMessage": "Success. Request accepted for processing",
			}));
		})
		.await;
	let query_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(STK_QUERY_ROUTE);
			then.status(500).json_body(json!({
				"errorCode": "500.001.1001",
				"errorMessage": "The transaction is being processed",
			}));
		})
		.await;
	let identity = ClientIdentity::with_base_url("demo-key", "demo-secret", &server.base_url())?;
	let cache = <CredentialCache<ReqwestTransport>>::new(identity, ReqwestTransport::new()?)
		.with_store(Arc::new(MemoryStore::default()));
	let caller = AuthenticatedCaller::with_cache(Arc::new(cache));
	let push = StkPush::new("174379", "demo-passkey")
		.with_transaction_type("CustomerPayBillOnline")
		.with_amount(1)
		.with_phone_number("0708374149")?
		.with_callback_url("https://example.com/mpesa/callback")
		.with_account_reference("INV-001");
	let response = push.push(&caller).await?;

	println!("checkout request: {}", StkPush::checkout_request_id(&response)?);

	let status = StkQuery::for_push(&push, &response)?.query(&caller).await?;

	println!("pending: {} (status {})", status.is_pending(), status.status);

	token_mock.assert_calls_async(1).await;
	push_mock.assert_async().await;
	query_mock.assert_async().await;

	Ok(())
}
