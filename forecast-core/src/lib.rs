//! Core library for the `forecast` CLI.
//!
//! This crate defines:
//! - The form state and the reducer behind the debounced lookup
//! - The debounce timer and the async session that drives a form
//! - Abstraction over weather providers (relay, WeatherAPI.com)
//! - Configuration and shared domain models
//!
//! It is used by `forecast-cli`, but can also back other front-ends.

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod session;
pub mod state;
pub mod timer;
pub mod view;

pub use config::{Config, ProviderConfig};
pub use error::LookupError;
pub use model::{LookupQuery, LookupResult};
pub use provider::{ProviderId, WeatherProvider};
pub use session::{Session, SessionClosed, SessionHandle};
pub use state::{Event, Field, FormSettings, FormState, SettlePolicy};
pub use view::View;
