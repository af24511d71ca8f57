//! Push delivery through Firebase Cloud Messaging.
//!
//! One HTTP v1 `messages:send` request per dispatch. No client-side retry:
//! any failure is handed back to the pipeline, which records it as
//! `delivery_failed`.

pub mod fcm;

pub use fcm::{AccessToken, FcmClient, FcmConfig};
