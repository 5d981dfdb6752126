//! # StudyQuest API
//!
//! JSON boundary over [`studyquest_core::ProgressionService`]: typed
//! handlers ([`QuestApi`]), camelCase request/response bodies ([`dto`]),
//! a tagged request dispatcher ([`ApiRequest`]) and bounded retry of
//! version conflicts and busy databases.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod dispatch;
pub mod dto;
pub mod error;

pub use api::QuestApi;
pub use dispatch::ApiRequest;
pub use error::{ApiError, ErrorBody};
