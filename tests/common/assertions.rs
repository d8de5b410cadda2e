//! Custom assertion macros
//!
//! Status assertions that include the response body in the panic message.

/// Assert the status of a `TestResponse`
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {{
        let response = &$response;
        assert_eq!(
            response.status, $status,
            "unexpected status, body: {}",
            response.body
        );
    }};
}

/// Assert the status and the `error` message of a `TestResponse`
#[macro_export]
macro_rules! assert_error {
    ($response:expr, $status:expr, $message:expr) => {{
        let response = &$response;
        $crate::assert_status!(response, $status);
        assert_eq!(response.body["error"], $message);
    }};
}
