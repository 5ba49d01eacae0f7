//! # bahi-assist: Confirmation Pipeline
//!
//! Turns free-text commands into staged, explicitly confirmed ledger
//! mutations.
//!
//! ## Module Organization
//! ```text
//! bahi_assist
//! ├── config       - AssistConfig (TOML + env)
//! ├── error        - AssistError taxonomy, ErrorResponse
//! ├── executor     - ActionExecutor (payload → store calls)
//! ├── interpreter  - IntentInterpreter port, LLM and JSON adapters
//! ├── service      - AssistService (parse_intent / execute_action)
//! ├── stage        - ConfirmationStage (atomic consume, TTL)
//! └── sweeper      - StageSweeper background task
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let db = Database::new(DbConfig::new("bahi.db")).await?;
//! let service = Arc::new(AssistService::new(db, Arc::new(JsonInterpreter)));
//! let sweeper = service.spawn_sweeper(Duration::from_secs(30));
//!
//! let parsed = service.parse_intent(&owner, text, Language::English).await?;
//! if let Some(id) = parsed.confirmation_id {
//!     let done = service.execute_action(&owner, &id, true, Language::English).await?;
//!     println!("{}", done.message());
//! }
//!
//! sweeper.shutdown().await;
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod interpreter;
pub mod service;
pub mod stage;
pub mod sweeper;

pub use config::AssistConfig;
pub use error::{AssistError, AssistResult, ErrorCode, ErrorResponse};
pub use executor::ActionExecutor;
pub use interpreter::{IntentInterpreter, Interpretation, JsonInterpreter, LlmInterpreter};
pub use service::{AssistService, ExecuteResponse, ParseResponse};
pub use stage::ConfirmationStage;
pub use sweeper::{StageSweeper, SweeperHandle};
