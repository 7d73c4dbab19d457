// std
use std::{sync::Arc, time::Duration as StdDuration};
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use mpesa_sdk::{
	cache::CredentialCache,
	caller::{AuthenticatedCaller, Executor},
	error::Error,
	services::{STK_PUSH_ROUTE, STK_QUERY_ROUTE, StkPush, StkQuery},
	store::{CredentialStore, MemoryStore},
};

mod common;

use common::*;

const ROUTE: &str = "/mpesa/transactionstatus/v1/query";
const UNAUTHORIZED_BODY: &str =
	r#"{"requestId":"1","errorCode":"404.001.03","errorMessage":"Invalid Access Token"}"#;

async fn token_mock(server: &MockServer, token: &str) {
	let body = token_body(token, "3599");

	server
		.mock_async(|when, then| {
			when.method(GET).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(&body);
		})
		.await;
}

fn scripted_caller(
	transport: Arc<ScriptedTransport>,
) -> (AuthenticatedCaller<ScriptedTransport>, MemoryStore) {
	let store = MemoryStore::default();
	let cache: CredentialCache<ScriptedTransport> =
		CredentialCache::new(identity("https://sandbox.example.test"), transport)
			.with_store(Arc::new(store.clone()));

	(AuthenticatedCaller::with_cache(Arc::new(cache)), store)
}

#[tokio::test]
async fn call_posts_json_with_bearer_credential() {
	let server = MockServer::start_async().await;

	token_mock(&server, "bearer-1").await;

	let operation = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(ROUTE)
				.header("authorization", "Bearer bearer-1")
				.header("content-type", "application/json")
				.json_body(json!({ "TransactionID": "OEI2AK4Q16", "Occasion": "" }));
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "ResponseCode": "0", "ConversationID": "AG_1" }));
		})
		.await;
	let (cache, _store) = reqwest_cache(&server);
	let caller = AuthenticatedCaller::with_cache(cache);
	let response = caller
		.call(&json!({ "TransactionID": "OEI2AK4Q16", "Occasion": "" }), ROUTE)
		.await
		.expect("Authorized call should succeed.");

	assert_eq!(response.status, 200);
	assert_eq!(response.field_str("ConversationID"), Some("AG_1"));
	assert!(!response.is_pending());

	operation.assert_calls_async(1).await;
}

#[tokio::test]
async fn pending_sentinel_is_returned_as_success() {
	let server = MockServer::start_async().await;

	token_mock(&server, "bearer-pending").await;
	server
		.mock_async(|when, then| {
			when.method(POST).path(STK_QUERY_ROUTE);
			then.status(500).json_body(json!({
				"requestId": "ws_CO_1",
				"errorCode": "500.001.1001",
				"errorMessage": "The transaction is being processed",
			}));
		})
		.await;

	let (cache, _store) = reqwest_cache(&server);
	let caller = AuthenticatedCaller::with_cache(cache);
	let response = StkQuery::new("174379", "passkey", "ws_CO_1")
		.query(&caller)
		.await
		.expect("Pending transactions should not be errors.");

	assert!(response.is_pending());
	assert_eq!(response.status, 500);
}

#[tokio::test]
async fn error_statuses_and_bodies_are_classified() {
	let server = MockServer::start_async().await;

	token_mock(&server, "bearer-errors").await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/rejected");
			then.status(400).json_body(json!({ "errorMessage": "Bad Request - Invalid PhoneNumber" }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path("/gateway");
			then.status(502).header("content-type", "text/html").body("<html>bad gateway</html>");
		})
		.await;

	let (cache, _store) = reqwest_cache(&server);
	let caller = AuthenticatedCaller::with_cache(cache);
	let err = caller.call(&json!({}), "/rejected").await.expect_err("400 should be rejected.");

	assert!(
		matches!(
			err,
			Error::RemoteRejected { status: 400, ref message }
				if message.as_deref() == Some("Bad Request - Invalid PhoneNumber")
		),
		"Unexpected error: {err:?}."
	);

	let err = caller.call(&json!({}), "/gateway").await.expect_err("HTML should be rejected.");

	assert!(matches!(err, Error::MalformedResponse { status: 502, .. }), "Unexpected error: {err:?}.");
	assert_eq!(caller.cache().metrics().acquisitions(), 1);
}

#[tokio::test]
async fn slow_operation_endpoint_times_out() {
	let server = MockServer::start_async().await;

	token_mock(&server, "bearer-slow").await;
	server
		.mock_async(|when, then| {
			when.method(POST).path(ROUTE);
			then.status(200).delay(StdDuration::from_millis(1_500)).json_body(json!({}));
		})
		.await;

	let (cache, _store) = reqwest_cache(&server);
	let caller = AuthenticatedCaller::with_cache(cache).with_timeout(StdDuration::from_secs(5));
	let err = caller
		.call_with_timeout(&json!({}), ROUTE, StdDuration::from_millis(200))
		.await
		.expect_err("Slow endpoint should time out.");

	match err {
		Error::Transport(ref source) => assert!(source.is_timeout(), "{err:?}"),
		other => panic!("Expected a transport timeout, got {other:?}."),
	}
}

#[tokio::test]
async fn authority_failure_stops_before_the_operation() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(GET).path(TOKEN_PATH);
			then.status(500).body("{}");
		})
		.await;

	let operation = server
		.mock_async(|when, then| {
			when.method(POST).path(ROUTE);
			then.status(200).json_body(json!({}));
		})
		.await;
	let (cache, _store) = reqwest_cache(&server);
	let caller = AuthenticatedCaller::with_cache(cache);
	let err = caller.call(&json!({}), ROUTE).await.expect_err("Authority failure should propagate.");

	assert!(matches!(err, Error::AuthorityRejected { status: 500, .. }), "Unexpected error: {err:?}.");

	operation.assert_calls_async(0).await;
}

#[tokio::test]
async fn unauthorized_once_reauthenticates_and_retries() {
	let transport = ScriptedTransport::new([
		(200, token_body("token-1", "3599")),
		(401, UNAUTHORIZED_BODY.to_owned()),
		(200, token_body("token-2", "3599")),
		(200, r#"{"ResponseCode":"0"}"#.to_owned()),
	]);
	let (caller, store) = scripted_caller(transport.clone());
	let response = caller
		.call(&json!({ "Amount": "1" }), ROUTE)
		.await
		.expect("Retry with a fresh credential should succeed.");
	let requests = transport.requests();

	assert_eq!(response.field_str("ResponseCode"), Some("0"));
	assert_eq!(
		requests.iter().map(|r| r.method.as_str()).collect::<Vec<_>>(),
		["GET", "POST", "GET", "POST"]
	);
	assert_eq!(requests[1].authorization.as_deref(), Some("Bearer token-1"));
	assert_eq!(requests[3].authorization.as_deref(), Some("Bearer token-2"));
	assert_eq!(requests[1].body, requests[3].body);
	assert_eq!(requests[3].json(), json!({ "Amount": "1" }));
	assert_eq!(requests[0].authorization.as_deref(), Some(BASIC_AUTHORIZATION));
	assert!(requests[0].uri.ends_with("/oauth/v1/generate?grant_type=client_credentials"));
	assert!(requests.iter().all(|r| r.timeout == Some(caller.timeout())));
	assert_eq!(caller.cache().metrics().invalidations(), 1);
	assert_eq!(caller.cache().metrics().acquisitions(), 2);

	let persisted = store
		.load(caller.cache().key())
		.await
		.expect("Memory store load should succeed.")
		.expect("Fresh credential should be persisted.");

	assert_eq!(persisted.token.expose(), "token-2");
}

#[tokio::test]
async fn unauthorized_twice_fails_without_third_attempt() {
	let transport = ScriptedTransport::new([
		(200, token_body("token-1", "3599")),
		(401, UNAUTHORIZED_BODY.to_owned()),
		(200, token_body("token-2", "3599")),
		(401, UNAUTHORIZED_BODY.to_owned()),
		(200, r#"{"ResponseCode":"0"}"#.to_owned()),
	]);
	let (caller, _store) = scripted_caller(transport.clone());
	let err = caller.call(&json!({}), ROUTE).await.expect_err("Second 401 should be terminal.");

	assert!(
		matches!(
			err,
			Error::RemoteRejected { status: 401, ref message }
				if message.as_deref() == Some("Invalid Access Token")
		),
		"Unexpected error: {err:?}."
	);
	assert_eq!(transport.requests().len(), 4);
	assert_eq!(transport.remaining(), 1);
	assert_eq!(caller.cache().metrics().invalidations(), 1);
}

#[tokio::test]
async fn unauthorized_twice_with_html_body_is_an_auth_failure() {
	let transport = ScriptedTransport::new([
		(200, token_body("token-1", "3599")),
		(401, UNAUTHORIZED_BODY.to_owned()),
		(200, token_body("token-2", "3599")),
		(401, "<html><body>401 Authorization Required</body></html>".to_owned()),
	]);
	let (caller, _store) = scripted_caller(transport.clone());
	let err = caller.call(&json!({}), ROUTE).await.expect_err("Second 401 should be terminal.");

	assert!(
		matches!(err, Error::RemoteRejected { status: 401, message: None }),
		"Unexpected error: {err:?}."
	);
	assert_eq!(transport.remaining(), 0);
}

#[tokio::test]
async fn late_rejection_keeps_the_replacement_credential() {
	let transport = ScriptedTransport::new([
		(200, token_body("token-1", "3599")),
		(200, token_body("token-2", "3599")),
	]);
	let (caller, store) = scripted_caller(transport.clone());
	let cache = caller.cache();
	let rejected = cache.credential().await.expect("First lookup should acquire.");

	assert!(cache.invalidate_rejected(&rejected).await);
	assert!(!cache.invalidate_rejected(&rejected).await);

	let replacement = cache.credential().await.expect("Second lookup should reacquire.");

	assert_eq!(replacement.token.expose(), "token-2");
	assert!(!cache.invalidate_rejected(&rejected).await);
	assert_eq!(cache.credential().await.expect("Lookup should hit memory.").token.expose(), "token-2");
	assert_eq!(cache.metrics().invalidations(), 1);
	assert_eq!(transport.requests().len(), 2);

	let persisted = store
		.load(cache.key())
		.await
		.expect("Memory store load should succeed.")
		.expect("Replacement credential should stay persisted.");

	assert_eq!(persisted.token.expose(), "token-2");
}

#[tokio::test]
async fn failed_reacquisition_surfaces_authority_error() {
	let transport = ScriptedTransport::new([
		(200, token_body("token-1", "3599")),
		(401, UNAUTHORIZED_BODY.to_owned()),
		(400, r#"{"errorMessage":"Invalid Authentication passed"}"#.to_owned()),
	]);
	let (caller, store) = scripted_caller(transport.clone());
	let err = caller.call(&json!({}), ROUTE).await.expect_err("Reacquisition failure should surface.");

	assert!(matches!(err, Error::AuthorityRejected { status: 400, .. }), "Unexpected error: {err:?}.");
	assert!(store.is_empty());
	assert_eq!(transport.requests().len(), 3);
}

#[tokio::test]
async fn stk_push_runs_through_the_executor_seam() {
	let transport = ScriptedTransport::new([
		(200, token_body("token-stk", "3599")),
		(
			200,
			r#"{"MerchantRequestID":"29115-34620561-1","CheckoutRequestID":"ws_CO_191220191020363925","ResponseCode":"0"}"#
				.to_owned(),
		),
	]);
	let (caller, _store) = scripted_caller(transport.clone());
	let executor: &dyn Executor = &caller;
	let response = StkPush::new("174379", "passkey")
		.with_transaction_type("CustomerPayBillOnline")
		.with_amount(1)
		.with_phone_number("+254 708 374 149")
		.expect("Phone fixture should be valid.")
		.with_callback_url("https://example.com/callback")
		.push(executor)
		.await
		.expect("STK push should succeed.");

	assert_eq!(StkPush::checkout_request_id(&response), Ok("ws_CO_191220191020363925"));

	let requests = transport.requests();
	let payload = requests[1].json();

	assert!(requests[1].uri.ends_with(STK_PUSH_ROUTE));
	assert_eq!(payload["PhoneNumber"], "254708374149");
	assert_eq!(payload["PartyA"], "254708374149");
	assert_eq!(payload["PartyB"], "174379");
	assert_eq!(payload["AccountReference"], "Account");
	assert_eq!(payload["Timestamp"].as_str().map(str::len), Some(14));
}
